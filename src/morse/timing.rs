use super::Symbol;

/// Slowest speed the duration math will accept. WPM values at or below
/// zero would divide by zero (or produce negative durations), so inputs
/// are clamped here rather than returning an error.
const MIN_WPM: f32 = 1.0;

/// Speed and tone configuration for playback.
///
/// Standard Morse timing: 1 word = 50 dit-lengths ("PARIS"), so
/// `dit_ms = 1200 / wpm`. With Farnsworth timing the characters are sent
/// at `character_wpm` but the inter-character and inter-word gaps stretch
/// to the slower `effective_wpm`. The settings surface guarantees
/// `effective_wpm < character_wpm` when Farnsworth is enabled; this model
/// just computes from whatever it is given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingProfile {
    pub character_wpm: f32,
    pub effective_wpm: f32,
    pub farnsworth_enabled: bool,
    pub tone_frequency_hz: f32,
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self {
            character_wpm: 20.0,
            effective_wpm: 10.0,
            farnsworth_enabled: false,
            tone_frequency_hz: 750.0,
        }
    }
}

/// Absolute element durations in milliseconds, derived from a profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolDurations {
    pub dot_ms: f32,
    pub dash_ms: f32,
    pub intra_char_gap_ms: f32,
    pub letter_gap_ms: f32,
    pub word_gap_ms: f32,
}

impl TimingProfile {
    /// Derive the five element durations. Pure; recompute on every
    /// settings change.
    pub fn durations(&self) -> SymbolDurations {
        let dot_ms = 1200.0 / self.character_wpm.max(MIN_WPM);
        let base_unit_ms = if self.farnsworth_enabled {
            1200.0 / self.effective_wpm.max(MIN_WPM)
        } else {
            dot_ms
        };

        SymbolDurations {
            dot_ms,
            dash_ms: dot_ms * 3.0,
            intra_char_gap_ms: dot_ms,
            letter_gap_ms: base_unit_ms * 3.0,
            word_gap_ms: base_unit_ms * 7.0,
        }
    }
}

impl SymbolDurations {
    /// Tone length and trailing gap for one scheduled symbol.
    ///
    /// Tone symbols carry the intra-character gap. Separator symbols carry
    /// no tone; their gap is the full letter/word gap minus the
    /// intra-character gap already emitted after the preceding tone.
    pub fn schedule(&self, symbol: Symbol) -> (f32, f32) {
        match symbol {
            Symbol::Dot => (self.dot_ms, self.intra_char_gap_ms),
            Symbol::Dash => (self.dash_ms, self.intra_char_gap_ms),
            Symbol::LetterGap => (0.0, self.letter_gap_ms - self.intra_char_gap_ms),
            Symbol::WordGap => (0.0, self.word_gap_ms - self.intra_char_gap_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn durations_at_20_wpm() {
        let profile = TimingProfile {
            character_wpm: 20.0,
            effective_wpm: 20.0,
            farnsworth_enabled: false,
            tone_frequency_hz: 750.0,
        };
        let d = profile.durations();
        assert!(approx(d.dot_ms, 60.0));
        assert!(approx(d.dash_ms, 180.0));
        assert!(approx(d.intra_char_gap_ms, 60.0));
        assert!(approx(d.letter_gap_ms, 180.0));
        assert!(approx(d.word_gap_ms, 420.0));
    }

    #[test]
    fn farnsworth_stretches_gaps_only() {
        let profile = TimingProfile {
            character_wpm: 20.0,
            effective_wpm: 10.0,
            farnsworth_enabled: true,
            tone_frequency_hz: 750.0,
        };
        let d = profile.durations();
        assert!(approx(d.dot_ms, 60.0));
        assert!(approx(d.dash_ms, 180.0));
        assert!(approx(d.letter_gap_ms, 360.0));
        assert!(approx(d.word_gap_ms, 840.0));
    }

    #[test]
    fn dash_is_3x_dot_across_speeds() {
        for wpm in [5.0, 12.0, 20.0, 40.0] {
            let d = TimingProfile {
                character_wpm: wpm,
                effective_wpm: wpm,
                farnsworth_enabled: false,
                tone_frequency_hz: 600.0,
            }
            .durations();
            assert!(approx(d.dash_ms, d.dot_ms * 3.0));
        }
    }

    #[test]
    fn non_positive_wpm_is_clamped() {
        let d = TimingProfile {
            character_wpm: 0.0,
            effective_wpm: -3.0,
            farnsworth_enabled: true,
            tone_frequency_hz: 600.0,
        }
        .durations();
        assert!(d.dot_ms.is_finite() && d.dot_ms > 0.0);
        assert!(d.word_gap_ms.is_finite() && d.word_gap_ms > 0.0);
    }

    #[test]
    fn separator_schedule_subtracts_intra_gap() {
        let d = TimingProfile::default().durations();
        let (tone, gap) = d.schedule(Symbol::LetterGap);
        assert!(approx(tone, 0.0));
        assert!(approx(gap, d.letter_gap_ms - d.intra_char_gap_ms));
        let (tone, gap) = d.schedule(Symbol::Dash);
        assert!(approx(tone, d.dash_ms));
        assert!(approx(gap, d.intra_char_gap_ms));
    }
}
