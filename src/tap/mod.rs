use crate::morse::{MorseBuffer, PulsePolicy};
use std::time::Instant;

/// Decodes manual press/release gestures into Morse.
///
/// Press duration picks dot vs dash; the silences after a release turn
/// into letter and word boundaries. Boundaries are deadline fields checked
/// by `poll()` rather than OS timers: the host drives `poll` periodically
/// (UI frame, event-loop tick), and a new press invalidates any pending
/// deadline. Both boundaries fire independently, each at most once per
/// release, with buffer-tail guards against duplicate separators.
pub struct TapDecoder {
    policy: PulsePolicy,
    buffer: MorseBuffer,
    pressed_at: Option<Instant>,
    released_at: Option<Instant>,
    letter_gap_marked: bool,
    word_gap_marked: bool,
}

impl TapDecoder {
    pub fn new() -> Self {
        Self::with_policy(PulsePolicy::TAP)
    }

    pub fn with_policy(policy: PulsePolicy) -> Self {
        Self {
            policy,
            buffer: MorseBuffer::new(),
            pressed_at: None,
            released_at: None,
            letter_gap_marked: false,
            word_gap_marked: false,
        }
    }

    /// Key went down. Cancels pending boundary deadlines. Re-entrant
    /// presses (OS key repeat) while already pressed are ignored.
    pub fn press(&mut self, now: Instant) {
        if self.pressed_at.is_some() {
            return;
        }
        self.released_at = None;
        self.pressed_at = Some(now);
    }

    /// Key came up: classify the press as dot or dash and arm the
    /// letter/word boundary deadlines from this instant.
    pub fn release(&mut self, now: Instant) {
        let Some(pressed_at) = self.pressed_at.take() else {
            return;
        };
        let duration_ms = now.duration_since(pressed_at).as_secs_f32() * 1000.0;
        self.buffer.push_mark(self.policy.classify_mark(duration_ms));
        self.released_at = Some(now);
        self.letter_gap_marked = false;
        self.word_gap_marked = false;
    }

    /// Fire any boundary whose deadline has passed. Call periodically.
    pub fn poll(&mut self, now: Instant) {
        let Some(released_at) = self.released_at else {
            return;
        };
        let silence_ms = now.duration_since(released_at).as_secs_f32() * 1000.0;

        if !self.letter_gap_marked && silence_ms >= self.policy.letter_gap_ms {
            self.buffer.mark_letter_gap();
            self.letter_gap_marked = true;
        }
        if !self.word_gap_marked && silence_ms >= self.policy.word_gap_ms {
            self.buffer.mark_word_gap();
            self.word_gap_marked = true;
        }
        if self.letter_gap_marked && self.word_gap_marked {
            self.released_at = None;
        }
    }

    /// True between press and release; drives the "tapping" visual state.
    pub fn is_pressed(&self) -> bool {
        self.pressed_at.is_some()
    }

    pub fn morse(&self) -> &str {
        self.buffer.morse()
    }

    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    /// Cancel pending deadlines and empty the buffer and derived text.
    pub fn clear(&mut self) {
        self.pressed_at = None;
        self.released_at = None;
        self.letter_gap_marked = false;
        self.word_gap_marked = false;
        self.buffer.clear();
    }
}

impl Default for TapDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ms(base: Instant, offset: u64) -> Instant {
        base + Duration::from_millis(offset)
    }

    #[test]
    fn short_press_is_dot_long_press_is_dash() {
        let base = Instant::now();
        let mut tap = TapDecoder::new();

        tap.press(ms(base, 0));
        tap.release(ms(base, 100));
        assert_eq!(tap.morse(), ".");

        tap.press(ms(base, 200));
        tap.release(ms(base, 500));
        assert_eq!(tap.morse(), ".-");
        assert_eq!(tap.text(), "A");
    }

    #[test]
    fn quick_taps_do_not_insert_separators() {
        let base = Instant::now();
        let mut tap = TapDecoder::new();

        // Two 100ms dots separated by 250ms, below the 700ms letter gap
        tap.press(ms(base, 0));
        tap.release(ms(base, 100));
        tap.poll(ms(base, 300));
        tap.press(ms(base, 350));
        tap.release(ms(base, 450));
        tap.poll(ms(base, 500));

        assert_eq!(tap.morse(), "..");
        // The letter gap only lands once the silence crosses the threshold
        tap.poll(ms(base, 1200));
        assert_eq!(tap.morse(), ".. ");
        assert_eq!(tap.text(), "I");
    }

    #[test]
    fn long_silence_marks_letter_then_word_exactly_once() {
        let base = Instant::now();
        let mut tap = TapDecoder::new();

        tap.press(ms(base, 0));
        tap.release(ms(base, 100));

        // 1600ms of silence: letter boundary at 700, word boundary at 1500
        tap.poll(ms(base, 900));
        assert_eq!(tap.morse(), ". ");
        tap.poll(ms(base, 1700));
        assert_eq!(tap.morse(), ". / ");

        // Further polls must not duplicate either separator
        tap.poll(ms(base, 2500));
        tap.poll(ms(base, 4000));
        assert_eq!(tap.morse(), ". / ");
    }

    #[test]
    fn both_boundaries_fire_on_a_single_late_poll() {
        let base = Instant::now();
        let mut tap = TapDecoder::new();

        tap.press(ms(base, 0));
        tap.release(ms(base, 100));
        tap.poll(ms(base, 1700));
        assert_eq!(tap.morse(), ". / ");
    }

    #[test]
    fn new_press_cancels_pending_boundaries() {
        let base = Instant::now();
        let mut tap = TapDecoder::new();

        tap.press(ms(base, 0));
        tap.release(ms(base, 100));
        // Press again before the letter gap fires
        tap.press(ms(base, 600));
        tap.poll(ms(base, 900));
        assert_eq!(tap.morse(), ".", "no separator while a press is held");
    }

    #[test]
    fn key_repeat_does_not_retrigger_press() {
        let base = Instant::now();
        let mut tap = TapDecoder::new();

        tap.press(ms(base, 0));
        tap.press(ms(base, 50)); // OS auto-repeat
        tap.press(ms(base, 100));
        assert!(tap.is_pressed());
        tap.release(ms(base, 120));
        assert_eq!(tap.morse(), ".", "duration counts from the first press");
    }

    #[test]
    fn release_without_press_is_ignored() {
        let base = Instant::now();
        let mut tap = TapDecoder::new();
        tap.release(ms(base, 100));
        assert_eq!(tap.morse(), "");
    }

    #[test]
    fn clear_cancels_deadlines_and_empties_buffer() {
        let base = Instant::now();
        let mut tap = TapDecoder::new();

        tap.press(ms(base, 0));
        tap.release(ms(base, 100));
        tap.clear();
        tap.poll(ms(base, 2000));
        assert_eq!(tap.morse(), "");
        assert_eq!(tap.text(), "");
    }
}
