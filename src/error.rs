use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("bytes per round must be positive")]
    EmptyPayload,
    #[error("{rounds} rounds of {bytes_per_round} bytes overflow the address space")]
    Overflow {
        rounds: usize,
        bytes_per_round: usize,
    },
    #[error("failed to write progress marker: {0}")]
    Marker(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
