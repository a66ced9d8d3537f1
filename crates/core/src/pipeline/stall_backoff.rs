use std::time::Duration;

use crate::shared::error::StreamError;

const INITIAL_DELAY: Duration = Duration::from_millis(100);
const MAX_DELAY: Duration = Duration::from_secs(5);

/// Bounded exponential backoff for transient read misses.
///
/// A live source may stall momentarily, so a single miss is retried
/// rather than treated as fatal; but retrying forever would spin on a
/// dead source. Delays double from 100 ms up to a 5 s cap, and once the
/// cumulative stall for one frame exceeds `max_stall` the pipeline gives
/// up with a decode error. A successful read resets the sequence.
///
/// Delay computation is separated from sleeping so tests never wait.
pub struct StallBackoff {
    max_stall: Duration,
    next_delay: Duration,
    stalled_for: Duration,
}

impl StallBackoff {
    pub fn new(max_stall: Duration) -> Self {
        Self {
            max_stall,
            next_delay: INITIAL_DELAY,
            stalled_for: Duration::ZERO,
        }
    }

    /// Computes the next delay, or an error once the stall budget for the
    /// current frame is exhausted.
    pub fn next_delay(&mut self) -> Result<Duration, StreamError> {
        if self.stalled_for >= self.max_stall {
            return Err(StreamError::Decode(format!(
                "source stalled for {:.1}s",
                self.stalled_for.as_secs_f64()
            )));
        }
        let delay = self.next_delay.min(self.max_stall - self.stalled_for);
        self.stalled_for += delay;
        self.next_delay = (self.next_delay * 2).min(MAX_DELAY);
        Ok(delay)
    }

    /// Sleeps for the next backoff interval.
    pub fn wait(&mut self) -> Result<(), StreamError> {
        let delay = self.next_delay()?;
        log::debug!("read miss, backing off {} ms", delay.as_millis());
        std::thread::sleep(delay);
        Ok(())
    }

    /// Called after a successful read.
    pub fn reset(&mut self) {
        self.next_delay = INITIAL_DELAY;
        self.stalled_for = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_double_up_to_the_cap() {
        let mut backoff = StallBackoff::new(Duration::from_secs(3600));
        let mut delays = Vec::new();
        for _ in 0..8 {
            delays.push(backoff.next_delay().unwrap());
        }
        assert_eq!(delays[0], Duration::from_millis(100));
        assert_eq!(delays[1], Duration::from_millis(200));
        assert_eq!(delays[2], Duration::from_millis(400));
        assert_eq!(*delays.last().unwrap(), Duration::from_secs(5));
    }

    #[test]
    fn escalates_after_max_stall() {
        let mut backoff = StallBackoff::new(Duration::from_millis(500));
        let mut total = Duration::ZERO;
        loop {
            match backoff.next_delay() {
                Ok(d) => total += d,
                Err(e) => {
                    assert!(matches!(e, StreamError::Decode(_)));
                    break;
                }
            }
            assert!(total <= Duration::from_millis(500));
        }
    }

    #[test]
    fn final_delay_is_trimmed_to_the_budget() {
        // 100 + 200 exceeds 250, so the second delay is trimmed to 150.
        let mut backoff = StallBackoff::new(Duration::from_millis(250));
        assert_eq!(backoff.next_delay().unwrap(), Duration::from_millis(100));
        assert_eq!(backoff.next_delay().unwrap(), Duration::from_millis(150));
        assert!(backoff.next_delay().is_err());
    }

    #[test]
    fn reset_restores_the_full_budget() {
        let mut backoff = StallBackoff::new(Duration::from_millis(300));
        while backoff.next_delay().is_ok() {}
        backoff.reset();
        assert_eq!(backoff.next_delay().unwrap(), Duration::from_millis(100));
    }
}
