use std::time::Duration;

use crate::error::{Error, Result};

/// Rounds run by the binary.
pub const ROUNDS: usize = 50;
/// Bytes allocated per round by the binary (1 MB).
pub const BYTES_PER_ROUND: usize = 1_000_000;
/// How long the process is held after the last round.
pub const HOLD: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub rounds: usize,
    pub bytes_per_round: usize,
    pub hold: Duration,
}

impl Config {
    pub fn new(rounds: usize, bytes_per_round: usize) -> Self {
        Self {
            rounds,
            bytes_per_round,
            hold: HOLD,
        }
    }

    /// Checks that a round has bytes to allocate and that the total fits in `usize`.
    pub fn validate(&self) -> Result<()> {
        self.total_bytes().map(drop)
    }

    /// Total bytes retained once every round has run.
    pub fn total_bytes(&self) -> Result<usize> {
        if self.bytes_per_round == 0 {
            return Err(Error::EmptyPayload);
        }
        self.rounds
            .checked_mul(self.bytes_per_round)
            .ok_or(Error::Overflow {
                rounds: self.rounds,
                bytes_per_round: self.bytes_per_round,
            })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(ROUNDS, BYTES_PER_ROUND)
    }
}
