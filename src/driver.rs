//! The allocation loop and the terminal hold.
use std::io::Write;
use std::thread;
use std::time::Duration;

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::payload::Payload;

/// Append-only list of every payload built so far. Nothing is removed until the list is dropped.
#[derive(Debug, Default)]
pub struct RetentionList {
    payloads: Vec<Payload>,
    bytes: usize,
}

impl RetentionList {
    fn push(&mut self, payload: Payload) {
        self.bytes += payload.len();
        self.payloads.push(payload);
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// Sum of the payload lengths.
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn payloads(&self) -> &[Payload] {
        &self.payloads
    }
}

/// Blocks the calling thread once allocation is over.
pub trait Hold {
    fn park(&self, duration: Duration);
}

/// Plain `thread::sleep`. There is no way to wake it early.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sleep;

impl Hold for Sleep {
    fn park(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// `next` is the 1-based round that runs on the next step.
    Allocating { next: usize },
    Holding,
}

/// Summary of a finished round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Round {
    pub index: usize,
    pub retained: usize,
}

pub struct Driver {
    config: Config,
    phase: Phase,
    retention: RetentionList,
}

impl Driver {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let phase = if config.rounds == 0 {
            Phase::Holding
        } else {
            Phase::Allocating { next: 1 }
        };

        Ok(Self {
            config,
            phase,
            retention: RetentionList::default(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn retention(&self) -> &RetentionList {
        &self.retention
    }

    /// Runs one round: marker line, payload, append. Returns `None` once every round is done.
    pub fn step<W: Write>(&mut self, out: &mut W) -> Result<Option<Round>> {
        let index = match self.phase {
            Phase::Allocating { next } => next,
            Phase::Holding => return Ok(None),
        };

        writeln!(out, "=========={}==========", index)?;
        out.flush()?;

        self.retention.push(Payload::new(index, self.config.bytes_per_round));
        let round = Round {
            index,
            retained: self.retention.bytes(),
        };

        self.phase = if index == self.config.rounds {
            Phase::Holding
        } else {
            Phase::Allocating { next: index + 1 }
        };
        Ok(Some(round))
    }

    /// Runs every remaining round.
    pub fn allocate<W: Write>(&mut self, out: &mut W) -> Result<&RetentionList> {
        while self.step(out)?.is_some() {}
        Ok(&self.retention)
    }

    /// Allocates whatever is left, then parks for the configured hold.
    ///
    /// With `Sleep` this does not return for an hour; the process is expected to be killed by
    /// whatever enforces its memory limit well before that. The payloads are handed back only
    /// so a caller with a shorter hold can inspect them.
    pub fn run<W: Write, H: Hold>(mut self, out: &mut W, hold: &H) -> Result<RetentionList> {
        self.allocate(out)?;
        info!(
            retained = self.retention.bytes(),
            hold_secs = self.config.hold.as_secs(),
            "holding"
        );
        hold.park(self.config.hold);
        Ok(self.retention)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::payload::fill_byte;
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::io;

    #[derive(Default)]
    struct Recorder {
        parked: Cell<Option<Duration>>,
    }

    impl Hold for Recorder {
        fn park(&self, duration: Duration) {
            assert!(self.parked.replace(Some(duration)).is_none(), "parked twice");
        }
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn markers(out: &[u8]) -> Vec<String> {
        String::from_utf8(out.to_vec())
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn three_rounds_of_ten() {
        let mut driver = Driver::new(Config::new(3, 10)).unwrap();
        let mut out = Vec::new();
        let mut totals = Vec::new();
        while let Some(round) = driver.step(&mut out).unwrap() {
            totals.push(round.retained);
        }
        assert_eq!(totals, [10, 20, 30]);
        assert_eq!(
            markers(&out),
            [
                "==========1==========",
                "==========2==========",
                "==========3==========",
            ]
        );
        assert_eq!(driver.phase(), Phase::Holding);

        let hold = Recorder::default();
        let retained = driver.run(&mut out, &hold).unwrap();
        assert_eq!(hold.parked.get(), Some(Duration::from_secs(3600)));
        assert_eq!(retained.bytes(), 30);
        // no extra markers once holding
        assert_eq!(markers(&out).len(), 3);
    }

    #[test]
    fn zero_rounds_goes_straight_to_hold() {
        let driver = Driver::new(Config::new(0, 10)).unwrap();
        assert_eq!(driver.phase(), Phase::Holding);
        let mut out = Vec::new();
        let hold = Recorder::default();
        let retained = driver.run(&mut out, &hold).unwrap();
        assert!(out.is_empty());
        assert!(retained.is_empty());
        assert!(hold.parked.get().is_some());
    }

    #[test]
    fn step_after_hold_is_none() {
        let mut driver = Driver::new(Config::new(1, 4)).unwrap();
        let mut out = Vec::new();
        assert!(driver.step(&mut out).unwrap().is_some());
        assert!(driver.step(&mut out).unwrap().is_none());
        assert!(driver.step(&mut out).unwrap().is_none());
        assert_eq!(driver.retention().len(), 1);
    }

    #[test]
    fn many_small_rounds_grow_one_at_a_time() {
        let config = Config::new(usize::MAX / 4, 1);
        assert!(config.validate().is_ok());
        let mut driver = Driver::new(config).unwrap();
        assert_eq!(driver.phase(), Phase::Allocating { next: 1 });
        assert!(driver.retention().payloads.capacity() < 16);

        let mut out = Vec::new();
        for _ in 0..3 {
            assert!(driver.step(&mut out).unwrap().is_some());
        }
        assert_eq!(driver.retention().len(), 3);
        assert_eq!(driver.retention().bytes(), 3);
        assert_eq!(driver.phase(), Phase::Allocating { next: 4 });
    }

    #[test]
    fn invalid_config() {
        assert!(matches!(
            Driver::new(Config::new(2, 0)),
            Err(Error::EmptyPayload)
        ));
    }

    #[test]
    fn broken_marker_stream() {
        let mut driver = Driver::new(Config::new(2, 4)).unwrap();
        assert!(matches!(driver.step(&mut Broken), Err(Error::Marker(_))));
        assert!(driver.retention().is_empty());
        assert_eq!(driver.phase(), Phase::Allocating { next: 1 });
    }

    proptest! {
        #[test]
        fn retention_tracks_rounds(rounds in 0usize..300, bytes in 1usize..64) {
            let mut driver = Driver::new(Config::new(rounds, bytes)).unwrap();
            let mut out = Vec::new();
            let mut previous = 0;
            let mut i = 0;
            while let Some(round) = driver.step(&mut out).unwrap() {
                i += 1;
                prop_assert_eq!(round.index, i);
                prop_assert_eq!(driver.retention().len(), i);
                prop_assert!(round.retained >= previous);
                prop_assert_eq!(round.retained, i * bytes);
                previous = round.retained;
            }
            prop_assert_eq!(i, rounds);
            prop_assert_eq!(driver.retention().bytes(), rounds * bytes);

            for (n, payload) in driver.retention().payloads().iter().enumerate() {
                prop_assert_eq!(payload.len(), bytes);
                let fill = fill_byte(n + 1);
                prop_assert!(payload.as_bytes().iter().all(|&b| b == fill));
            }

            let lines = markers(&out);
            prop_assert_eq!(lines.len(), rounds);
            for (n, line) in lines.iter().enumerate() {
                prop_assert_eq!(line, &format!("=========={}==========", n + 1));
            }
        }
    }
}
