use std::time::Instant;

/// Root-mean-square energy of a sample window, samples already in [-1, 1].
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Gates frames into sound/silence.
///
/// A frame counts as sound only when its RMS clears an absolute floor AND
/// rises sharply over the previous frame. The relative gate keeps steady
/// background noise from re-triggering as a new onset every frame. The
/// constants are empirically tuned and may need adjustment per microphone.
pub struct OnsetDetector {
    floor: f32,
    peak_factor: f32,
    prev_rms: f32,
}

impl OnsetDetector {
    pub fn new(floor: f32, peak_factor: f32) -> Self {
        Self {
            floor,
            peak_factor,
            prev_rms: 0.0,
        }
    }

    /// Classify one frame and remember its level for the next comparison.
    pub fn frame_is_sound(&mut self, rms: f32) -> bool {
        let is_sound = rms > self.floor && rms > self.prev_rms * self.peak_factor;
        self.prev_rms = rms;
        is_sound
    }

    pub fn reset(&mut self) {
        self.prev_rms = 0.0;
    }
}

/// A finished sound or silence interval, measured between transitions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Sound { duration_ms: f32 },
    Silence { duration_ms: f32 },
}

/// Tracks sound/silence transition edges with timestamps.
///
/// Feeding it per-frame classifications yields a `Segment` whenever an
/// interval closes: a silence ends when sound starts, a sound ends when
/// silence starts. `flush` closes whichever interval is still open so the
/// final gesture before stopping is not lost.
pub struct SegmentTracker {
    sound_started: Option<Instant>,
    silence_started: Option<Instant>,
}

impl SegmentTracker {
    /// Begin tracking; everything before the first sound is silence.
    pub fn start(now: Instant) -> Self {
        Self {
            sound_started: None,
            silence_started: Some(now),
        }
    }

    pub fn advance(&mut self, is_sound: bool, now: Instant) -> Option<Segment> {
        if is_sound {
            if self.sound_started.is_none() {
                self.sound_started = Some(now);
                if let Some(silence_started) = self.silence_started.take() {
                    return Some(Segment::Silence {
                        duration_ms: elapsed_ms(silence_started, now),
                    });
                }
            }
            None
        } else if let Some(sound_started) = self.sound_started.take() {
            self.silence_started = Some(now);
            Some(Segment::Sound {
                duration_ms: elapsed_ms(sound_started, now),
            })
        } else {
            None
        }
    }

    /// Close the in-progress interval, if any.
    pub fn flush(&mut self, now: Instant) -> Option<Segment> {
        if let Some(sound_started) = self.sound_started.take() {
            self.silence_started = Some(now);
            Some(Segment::Sound {
                duration_ms: elapsed_ms(sound_started, now),
            })
        } else if let Some(silence_started) = self.silence_started.take() {
            Some(Segment::Silence {
                duration_ms: elapsed_ms(silence_started, now),
            })
        } else {
            None
        }
    }
}

fn elapsed_ms(from: Instant, to: Instant) -> f32 {
    to.duration_since(from).as_secs_f32() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ms(base: Instant, offset: u64) -> Instant {
        base + Duration::from_millis(offset)
    }

    #[test]
    fn rms_of_silence_is_zero() {
        assert_eq!(rms(&[0.0; 64]), 0.0);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn rms_of_full_scale_square_is_one() {
        let samples = [1.0f32, -1.0, 1.0, -1.0];
        assert!((rms(&samples) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn sustained_background_noise_never_onsets() {
        // Constant-amplitude noise: no relative rise, so never sound,
        // regardless of how loud it is in absolute terms.
        let mut detector = OnsetDetector::new(0.015, 1.8);
        detector.frame_is_sound(0.4);
        for _ in 0..200 {
            assert!(!detector.frame_is_sound(0.4));
        }
    }

    #[test]
    fn sharp_rise_above_floor_is_sound() {
        let mut detector = OnsetDetector::new(0.015, 1.8);
        assert!(!detector.frame_is_sound(0.01)); // below floor
        assert!(detector.frame_is_sound(0.1)); // 10x rise, above floor
        assert!(!detector.frame_is_sound(0.1)); // plateau, no rise
    }

    #[test]
    fn quiet_rise_below_floor_is_not_sound() {
        let mut detector = OnsetDetector::new(0.015, 1.8);
        detector.frame_is_sound(0.001);
        assert!(!detector.frame_is_sound(0.01));
    }

    fn assert_silence(segment: Option<Segment>, expected_ms: f32) {
        match segment {
            Some(Segment::Silence { duration_ms }) => {
                assert!((duration_ms - expected_ms).abs() < 0.5)
            }
            other => panic!("expected silence segment, got {:?}", other),
        }
    }

    fn assert_sound(segment: Option<Segment>, expected_ms: f32) {
        match segment {
            Some(Segment::Sound { duration_ms }) => {
                assert!((duration_ms - expected_ms).abs() < 0.5)
            }
            other => panic!("expected sound segment, got {:?}", other),
        }
    }

    #[test]
    fn tracker_emits_silence_then_sound_segments() {
        let base = Instant::now();
        let mut tracker = SegmentTracker::start(base);

        assert_eq!(tracker.advance(false, ms(base, 100)), None);
        // Sound begins: the 300ms silence closes
        assert_silence(tracker.advance(true, ms(base, 300)), 300.0);
        assert_eq!(tracker.advance(true, ms(base, 350)), None);
        // Silence begins: the 120ms sound closes
        assert_sound(tracker.advance(false, ms(base, 420)), 120.0);
    }

    #[test]
    fn flush_closes_open_sound() {
        let base = Instant::now();
        let mut tracker = SegmentTracker::start(base);
        tracker.advance(true, ms(base, 50));
        assert_sound(tracker.flush(ms(base, 300)), 250.0);
    }

    #[test]
    fn flush_closes_open_silence() {
        let base = Instant::now();
        let mut tracker = SegmentTracker::start(base);
        tracker.advance(true, ms(base, 50));
        tracker.advance(false, ms(base, 150));
        assert_silence(tracker.flush(ms(base, 1500)), 1350.0);
    }
}
