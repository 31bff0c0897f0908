use super::{codec, Symbol};

/// Duration thresholds used to classify key presses / sound bursts and
/// the silences between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulsePolicy {
    /// Marks shorter than this are dots, longer are dashes.
    pub dot_threshold_ms: f32,
    /// Silence longer than this ends a letter.
    pub letter_gap_ms: f32,
    /// Silence longer than this ends a word.
    pub word_gap_ms: f32,
}

impl PulsePolicy {
    /// Thresholds for deliberate manual tapping.
    pub const TAP: PulsePolicy = PulsePolicy {
        dot_threshold_ms: 220.0,
        letter_gap_ms: 700.0,
        word_gap_ms: 1500.0,
    };

    /// Looser thresholds for acoustic input, where onsets are noisier.
    pub const ACOUSTIC: PulsePolicy = PulsePolicy {
        dot_threshold_ms: 180.0,
        letter_gap_ms: 500.0,
        word_gap_ms: 1200.0,
    };

    /// Classify a tone/press duration as dot or dash.
    pub fn classify_mark(&self, duration_ms: f32) -> Symbol {
        if duration_ms < self.dot_threshold_ms {
            Symbol::Dot
        } else {
            Symbol::Dash
        }
    }
}

/// Accumulated Morse produced by a decoder, with text derived on every
/// mutation. Append-only except for the word-separator trim; cleared only
/// by an explicit `clear()`.
#[derive(Debug, Default, Clone)]
pub struct MorseBuffer {
    morse: String,
    text: String,
}

impl MorseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn morse(&self) -> &str {
        &self.morse
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.morse.trim().is_empty()
    }

    /// Append a dot or dash. Separator symbols go through the guarded
    /// `mark_*` methods instead.
    pub fn push_mark(&mut self, symbol: Symbol) {
        if symbol.is_tone() {
            self.morse.push(symbol.as_char());
            self.rederive();
        }
    }

    /// Append a letter separator. Idempotent: does nothing if the buffer
    /// is empty or already ends at a boundary.
    pub fn mark_letter_gap(&mut self) {
        if self.is_empty() || self.morse.ends_with(' ') {
            return;
        }
        self.morse.push(' ');
        self.rederive();
    }

    /// Append a word separator (` / `), trimming any trailing letter
    /// separator first. Idempotent against duplicate insertion.
    pub fn mark_word_gap(&mut self) {
        if self.is_empty() || self.morse.ends_with("/ ") {
            return;
        }
        self.morse.truncate(self.morse.trim_end().len());
        self.morse.push_str(" / ");
        self.rederive();
    }

    pub fn clear(&mut self) {
        self.morse.clear();
        self.text.clear();
    }

    fn rederive(&mut self) {
        self.text = codec::morse_to_text(&self.morse);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_mark_thresholds() {
        assert_eq!(PulsePolicy::TAP.classify_mark(100.0), Symbol::Dot);
        assert_eq!(PulsePolicy::TAP.classify_mark(300.0), Symbol::Dash);
        assert_eq!(PulsePolicy::ACOUSTIC.classify_mark(179.0), Symbol::Dot);
        assert_eq!(PulsePolicy::ACOUSTIC.classify_mark(180.0), Symbol::Dash);
    }

    #[test]
    fn text_tracks_buffer() {
        let mut buf = MorseBuffer::new();
        buf.push_mark(Symbol::Dot);
        buf.push_mark(Symbol::Dot);
        buf.push_mark(Symbol::Dot);
        assert_eq!(buf.text(), "S");
        buf.mark_letter_gap();
        buf.push_mark(Symbol::Dash);
        assert_eq!(buf.morse(), "... -");
        assert_eq!(buf.text(), "ST");
    }

    #[test]
    fn letter_gap_is_guarded() {
        let mut buf = MorseBuffer::new();
        buf.mark_letter_gap();
        assert_eq!(buf.morse(), "");
        buf.push_mark(Symbol::Dot);
        buf.mark_letter_gap();
        buf.mark_letter_gap();
        assert_eq!(buf.morse(), ". ");
    }

    #[test]
    fn word_gap_trims_then_appends() {
        let mut buf = MorseBuffer::new();
        buf.push_mark(Symbol::Dash);
        buf.mark_letter_gap();
        buf.mark_word_gap();
        assert_eq!(buf.morse(), "- / ");
        buf.mark_word_gap();
        assert_eq!(buf.morse(), "- / ");
    }

    #[test]
    fn word_gap_needs_content() {
        let mut buf = MorseBuffer::new();
        buf.mark_word_gap();
        assert_eq!(buf.morse(), "");
    }

    #[test]
    fn clear_empties_both_views() {
        let mut buf = MorseBuffer::new();
        buf.push_mark(Symbol::Dot);
        buf.clear();
        assert_eq!(buf.morse(), "");
        assert_eq!(buf.text(), "");
    }
}
