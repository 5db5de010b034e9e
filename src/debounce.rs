use std::thread;
use std::time::Duration;

use tracing::debug;

/// Confirms a reading only after it repeats on consecutive samples
///
/// Screen animations (cards sliding in, banners fading) produce partial
/// matches for a frame or two. A sample is trusted once `required`
/// consecutive samples compare equal; any differing sample starts a new run.
pub struct Debouncer<T> {
    required: u32,
    last: Option<T>,
    streak: u32,
}

impl<T: PartialEq + Clone> Debouncer<T> {
    /// `required` is clamped to at least 1 (a single sample confirms itself)
    pub fn new(required: u32) -> Self {
        Self {
            required: required.max(1),
            last: None,
            streak: 0,
        }
    }

    pub fn required(&self) -> u32 {
        self.required
    }

    /// Length of the current run of identical samples
    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn reset(&mut self) {
        self.last = None;
        self.streak = 0;
    }

    /// Feed one sample; returns it once the run reaches `required`.
    ///
    /// A confirmed run is consumed, so the next sample starts counting afresh.
    pub fn observe(&mut self, sample: T) -> Option<T> {
        match &self.last {
            Some(previous) if *previous == sample => self.streak += 1,
            _ => {
                self.last = Some(sample);
                self.streak = 1;
            }
        }

        if self.streak >= self.required {
            self.streak = 0;
            return self.last.take();
        }
        None
    }

    /// Block until `next` yields a confirmed sample, sleeping `delay` between samples.
    ///
    /// Returns `None` as soon as `next` does (frame stream lost or stop
    /// requested); nothing partial survives the abort.
    pub fn confirm_with(&mut self, mut next: impl FnMut() -> Option<T>, delay: Duration) -> Option<T> {
        self.reset();
        loop {
            let Some(sample) = next() else {
                debug!(streak = self.streak, "Confirmation aborted, frame stream unavailable");
                self.reset();
                return None;
            };
            if let Some(confirmed) = self.observe(sample) {
                return Some(confirmed);
            }
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{CardCounts, CardSymbol};

    fn five() -> CardCounts {
        [(CardSymbol::Five, 1)].into_iter().collect()
    }

    #[test]
    fn confirms_after_two_identical_samples() {
        let mut debouncer = Debouncer::new(2);
        assert_eq!(debouncer.observe(CardCounts::empty()), None);
        assert_eq!(debouncer.observe(five()), None);
        assert_eq!(debouncer.observe(five()), Some(five()));
    }

    #[test]
    fn differing_sample_restarts_the_run() {
        let mut debouncer = Debouncer::new(3);
        debouncer.observe(1);
        debouncer.observe(1);
        assert_eq!(debouncer.streak(), 2);

        assert_eq!(debouncer.observe(2), None);
        assert_eq!(debouncer.streak(), 1);
        assert_eq!(debouncer.observe(1), None);
        assert_eq!(debouncer.observe(1), None);
        assert_eq!(debouncer.observe(1), Some(1));
    }

    #[test]
    fn confirmed_run_is_consumed() {
        let mut debouncer = Debouncer::new(2);
        debouncer.observe('a');
        assert_eq!(debouncer.observe('a'), Some('a'));
        assert_eq!(debouncer.observe('a'), None);
        assert_eq!(debouncer.observe('a'), Some('a'));
    }

    #[test]
    fn single_required_confirms_immediately() {
        let mut debouncer = Debouncer::new(0);
        assert_eq!(debouncer.required(), 1);
        assert_eq!(debouncer.observe(7), Some(7));
    }

    #[test]
    fn confirm_with_waits_for_stability() {
        let mut samples = vec![(CardCounts::empty(), false), (five(), false), (five(), false)].into_iter();
        let mut debouncer = Debouncer::new(2);
        let mut calls = 0;
        let confirmed = debouncer.confirm_with(
            || {
                calls += 1;
                samples.next()
            },
            Duration::ZERO,
        );
        assert_eq!(confirmed, Some((five(), false)));
        assert_eq!(calls, 3);
    }

    #[test]
    fn confirm_with_aborts_when_stream_ends() {
        let mut samples = vec![1, 2, 3].into_iter();
        let mut debouncer = Debouncer::new(2);
        assert_eq!(debouncer.confirm_with(|| samples.next(), Duration::ZERO), None);
        assert_eq!(debouncer.streak(), 0);
    }
}
