use crate::audio::{AudioEngine, Sender};
use crate::station::Voice;
use tracing::trace;

/// Serializes every transmission onto one forward-moving timeline.
///
/// The lock is a single "busy until" timestamp shared by the trainee and all
/// simulated stations. New utterances start at `max(requested, lock)` and
/// push the lock to their end time; commands are refused while
/// [`Scheduler::is_locked`] is true.
#[derive(Debug)]
pub struct Scheduler<A: AudioEngine> {
    audio: A,
    lock: f64,
}

impl<A: AudioEngine> Scheduler<A> {
    pub fn new(audio: A) -> Self {
        Self { audio, lock: 0.0 }
    }

    pub fn now(&self) -> f64 {
        self.audio.current_time()
    }

    pub fn lock_time(&self) -> f64 {
        self.lock
    }

    /// True while audio is still scheduled to play.
    pub fn is_locked(&self) -> bool {
        self.lock > self.now()
    }

    /// Queue `text` at or after `requested`; returns the utterance end time.
    ///
    /// Empty text occupies no time and does not move the lock.
    pub fn play(&mut self, sender: Sender, voice: &Voice, text: &str, requested: f64) -> f64 {
        let start = requested.max(self.lock);
        if text.trim().is_empty() {
            return start;
        }

        let end = self.audio.play_sentence(sender, voice, text, start);
        trace!(start, end, text, "scheduled utterance");
        self.lock = end;
        end
    }

    /// Zero the lock and cancel all pending audio.
    pub fn cancel_all(&mut self) {
        self.audio.stop_all();
        self.lock = 0.0;
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{ManualClock, SimulatedAudio};
    use crate::morse;

    fn voice() -> Voice {
        Voice::new(25, 600, 1.0)
    }

    fn scheduler() -> (ManualClock, Scheduler<SimulatedAudio<ManualClock>>) {
        let clock = ManualClock::new();
        let scheduler = Scheduler::new(SimulatedAudio::new(clock.clone()));
        (clock, scheduler)
    }

    #[test]
    fn test_starts_after_lock() {
        let (_clock, mut s) = scheduler();

        let first_end = s.play(Sender::You, &voice(), "CQ TEST", 0.0);
        assert_eq!(s.lock_time(), first_end);

        // requested earlier than the lock: pushed back to it
        let second_end = s.play(Sender::Station("K1ABC".into()), &voice(), "K1ABC", 0.0);
        let tx = &s.audio().transmissions()[1];
        assert_eq!(tx.start, first_end);
        assert_eq!(second_end, tx.end);
        assert_eq!(s.lock_time(), second_end);
    }

    #[test]
    fn test_requested_start_after_lock_is_kept() {
        let (_clock, mut s) = scheduler();
        let end = s.play(Sender::You, &voice(), "E", 0.0);
        s.play(Sender::You, &voice(), "E", end + 2.0);
        assert_eq!(s.audio().transmissions()[1].start, end + 2.0);
    }

    #[test]
    fn test_lock_invariant_over_sequence() {
        let (_clock, mut s) = scheduler();
        let requests = [0.0, 0.1, 5.0, 2.0, 2.5, 30.0];

        for (i, req) in requests.iter().enumerate() {
            let lock_before = s.lock_time();
            let end = s.play(Sender::You, &voice(), "TU 5NN", *req);
            let tx = &s.audio().transmissions()[i];
            assert!(tx.start >= lock_before);
            assert_eq!(s.lock_time(), end);
            let expected = tx.start + morse::sentence_duration("TU 5NN", &voice());
            assert!((end - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_is_locked_until_audio_finishes() {
        let (clock, mut s) = scheduler();
        assert!(!s.is_locked());

        let end = s.play(Sender::You, &voice(), "CQ", 0.0);
        assert!(s.is_locked());

        clock.set(end);
        assert!(!s.is_locked());
    }

    #[test]
    fn test_cancel_all_zeroes_lock() {
        let (_clock, mut s) = scheduler();
        s.play(Sender::You, &voice(), "CQ CQ CQ", 0.0);
        assert!(s.is_locked());

        s.cancel_all();
        assert_eq!(s.lock_time(), 0.0);
        assert!(!s.is_locked());
        assert!(s.audio().transmissions().is_empty());
    }

    #[test]
    fn test_empty_text_does_not_move_lock() {
        let (_clock, mut s) = scheduler();
        let end = s.play(Sender::You, &voice(), "", 3.0);
        assert_eq!(end, 3.0);
        assert_eq!(s.lock_time(), 0.0);
        assert!(s.audio().transmissions().is_empty());
    }
}
