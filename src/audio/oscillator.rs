use std::f32::consts::PI;

/// Envelope rise/fall time. Short enough to keep element timing crisp,
/// long enough that keying never produces an audible click.
const RAMP_MS: f32 = 5.0;

/// Sine oscillator gated by the key state, with a linear attack/decay
/// envelope so the tone ramps smoothly instead of stepping.
pub struct ToneOscillator {
    phase: f32,
    phase_increment: f32,
    sample_rate: f32,
    frequency: f32,
    volume: f32,
    envelope: f32,
    ramp_rate: f32,
}

impl ToneOscillator {
    pub fn new(frequency: f32, volume: f32, sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            phase_increment: 2.0 * PI * frequency / sample_rate,
            sample_rate,
            frequency,
            volume: volume.clamp(0.0, 1.0),
            envelope: 0.0,
            ramp_rate: 1000.0 / (RAMP_MS * sample_rate),
        }
    }

    /// Generate the next sample. The envelope chases the key state.
    pub fn next_sample(&mut self, key_down: bool) -> f32 {
        if key_down {
            self.envelope = (self.envelope + self.ramp_rate).min(1.0);
        } else {
            self.envelope = (self.envelope - self.ramp_rate).max(0.0);
        }

        let sample = self.phase.sin() * self.envelope * self.volume;

        self.phase += self.phase_increment;
        if self.phase >= 2.0 * PI {
            self.phase -= 2.0 * PI;
        }

        sample
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.phase_increment = 2.0 * PI * self.frequency / sample_rate;
        self.ramp_rate = 1000.0 / (RAMP_MS * sample_rate);
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
        self.phase_increment = 2.0 * PI * frequency / self.sample_rate;
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_until_keyed() {
        let mut osc = ToneOscillator::new(750.0, 0.5, 48000.0);
        for _ in 0..100 {
            assert_eq!(osc.next_sample(false), 0.0);
        }
    }

    #[test]
    fn envelope_ramps_and_stays_bounded() {
        let mut osc = ToneOscillator::new(750.0, 1.0, 48000.0);
        let mut peak: f32 = 0.0;
        // 20ms keyed: well past the ramp
        for _ in 0..960 {
            peak = peak.max(osc.next_sample(true).abs());
        }
        assert!(peak > 0.5 && peak <= 1.0);

        // After release the envelope decays back to silence
        let mut tail: f32 = 0.0;
        for i in 0..960 {
            let s = osc.next_sample(false).abs();
            if i > 480 {
                tail = tail.max(s);
            }
        }
        assert_eq!(tail, 0.0);
    }
}
