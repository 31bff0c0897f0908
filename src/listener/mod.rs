mod detect;

use crate::audio::{self, AudioError};
use crate::morse::{MorseBuffer, PulsePolicy};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use ringbuf::traits::{Consumer, Split};
use ringbuf::HeapRb;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub use detect::{rms, OnsetDetector, Segment, SegmentTracker};

/// Minimum RMS for a frame to count as sound at all.
const MIN_RMS_THRESHOLD: f32 = 0.015;
/// How much louder a frame must be than the previous one to count as a
/// new onset rather than sustained background noise.
const PEAK_DETECTION_FACTOR: f32 = 1.8;

/// Samples per analysis window.
const ANALYSIS_WINDOW: usize = 2048;
/// Ring buffer size for mic audio (holds ~100ms at 48kHz)
const RING_BUFFER_SIZE: usize = 4800;
/// Analysis cadence, roughly one display refresh.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerStatus {
    Idle,
    Listening,
    /// Microphone access was refused.
    PermissionDenied,
    /// Any other acquisition or stream failure.
    Error,
}

enum CaptureCommand {
    Stop,
}

/// Decodes Morse from the default microphone.
///
/// `start()` acquires the mic and runs a sampling loop on a capture
/// thread (the cpal input `Stream` is `!Send`); per frame it reads the
/// latest amplitude window, gates it through the onset detector and turns
/// sound/silence intervals into buffer marks with the loose acoustic
/// thresholds. Failures surface as `status()` values, never as panics or
/// errors to branch on.
pub struct Listener {
    status: ListenerStatus,
    buffer: Arc<Mutex<MorseBuffer>>,
    policy: PulsePolicy,
    command_tx: Option<Sender<CaptureCommand>>,
    worker: Option<JoinHandle<()>>,
}

impl Listener {
    pub fn new() -> Self {
        Self::with_policy(PulsePolicy::ACOUSTIC)
    }

    pub fn with_policy(policy: PulsePolicy) -> Self {
        Self {
            status: ListenerStatus::Idle,
            buffer: Arc::new(Mutex::new(MorseBuffer::new())),
            policy,
            command_tx: None,
            worker: None,
        }
    }

    pub fn status(&self) -> ListenerStatus {
        self.status
    }

    pub fn morse(&self) -> String {
        self.buffer.lock().morse().to_string()
    }

    pub fn text(&self) -> String {
        self.buffer.lock().text().to_string()
    }

    /// Request the microphone and begin decoding. On refusal the status
    /// becomes `PermissionDenied`, on any other failure `Error`; neither
    /// retries automatically. No-op while already listening.
    pub fn start(&mut self) {
        if self.status == ListenerStatus::Listening {
            return;
        }

        let (command_tx, command_rx) = bounded::<CaptureCommand>(4);
        let (ack_tx, ack_rx) = bounded::<Result<(), AudioError>>(1);
        let buffer = Arc::clone(&self.buffer);
        let policy = self.policy;

        let worker = thread::spawn(move || capture_thread(command_rx, ack_tx, buffer, policy));

        match ack_rx.recv_timeout(Duration::from_secs(2)) {
            Ok(Ok(())) => {
                self.command_tx = Some(command_tx);
                self.worker = Some(worker);
                self.status = ListenerStatus::Listening;
                eprintln!("[listener] microphone capture started");
            }
            Ok(Err(e)) => {
                let _ = worker.join();
                self.status = match e {
                    AudioError::DeviceNotAvailable | AudioError::NoInputDevice => {
                        eprintln!("[listener] microphone access denied: {}", e);
                        ListenerStatus::PermissionDenied
                    }
                    other => {
                        eprintln!("[listener] microphone error: {}", other);
                        ListenerStatus::Error
                    }
                };
            }
            Err(_) => {
                eprintln!("[listener] capture thread not responding");
                self.status = ListenerStatus::Error;
            }
        }
    }

    /// Stop the sampling loop, release the microphone and flush the
    /// in-progress sound or silence so the last gesture is kept. Safe to
    /// call from any state; always lands on `Idle`.
    pub fn stop(&mut self) {
        if let Some(tx) = self.command_tx.take() {
            let _ = tx.send(CaptureCommand::Stop);
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        self.status = ListenerStatus::Idle;
    }

    /// Empty the decode buffer and derived text.
    pub fn clear(&mut self) {
        self.buffer.lock().clear();
    }
}

impl Default for Listener {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Owns the cpal input stream and runs the frame loop. The frame clock is
/// a `recv_timeout` on the command channel, so each frame is bounded and
/// the loop cancels as soon as a stop arrives.
fn capture_thread(
    command_rx: Receiver<CaptureCommand>,
    ack_tx: Sender<Result<(), AudioError>>,
    buffer: Arc<Mutex<MorseBuffer>>,
    policy: PulsePolicy,
) {
    let ring = HeapRb::<f32>::new(RING_BUFFER_SIZE);
    let (producer, mut consumer) = ring.split();
    let producer = Arc::new(Mutex::new(producer));

    let stream = match audio::create_input_stream(producer) {
        Ok(stream) => {
            let _ = ack_tx.send(Ok(()));
            stream
        }
        Err(e) => {
            let _ = ack_tx.send(Err(e));
            return;
        }
    };

    let mut detector = OnsetDetector::new(MIN_RMS_THRESHOLD, PEAK_DETECTION_FACTOR);
    let mut tracker = SegmentTracker::start(Instant::now());
    let mut window: Vec<f32> = Vec::with_capacity(ANALYSIS_WINDOW);

    loop {
        match command_rx.recv_timeout(FRAME_INTERVAL) {
            Ok(CaptureCommand::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                // Roll the newest samples into a fixed-size window
                while let Some(sample) = consumer.try_pop() {
                    if window.len() == ANALYSIS_WINDOW {
                        window.remove(0);
                    }
                    window.push(sample);
                }

                let level = rms(&window);
                let is_sound = detector.frame_is_sound(level);
                if let Some(segment) = tracker.advance(is_sound, Instant::now()) {
                    apply_segment(&buffer, &policy, segment);
                }
            }
        }
    }

    drop(stream);

    // Final flush: classify whatever interval was still open
    if let Some(segment) = tracker.flush(Instant::now()) {
        apply_segment(&buffer, &policy, segment);
    }
    eprintln!("[listener] microphone capture stopped");
}

/// Turn a closed interval into buffer marks under the decode policy.
fn apply_segment(buffer: &Arc<Mutex<MorseBuffer>>, policy: &PulsePolicy, segment: Segment) {
    let mut buffer = buffer.lock();
    match segment {
        Segment::Sound { duration_ms } => {
            buffer.push_mark(policy.classify_mark(duration_ms));
        }
        Segment::Silence { duration_ms } => {
            if duration_ms > policy.word_gap_ms {
                buffer.mark_word_gap();
            } else if duration_ms > policy.letter_gap_ms {
                buffer.mark_letter_gap();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morse::Symbol;

    fn apply(buffer: &Arc<Mutex<MorseBuffer>>, segment: Segment) {
        apply_segment(buffer, &PulsePolicy::ACOUSTIC, segment);
    }

    #[test]
    fn sound_segments_become_dots_and_dashes() {
        let buffer = Arc::new(Mutex::new(MorseBuffer::new()));
        apply(&buffer, Segment::Sound { duration_ms: 90.0 });
        apply(&buffer, Segment::Silence { duration_ms: 60.0 });
        apply(&buffer, Segment::Sound { duration_ms: 400.0 });
        assert_eq!(buffer.lock().morse(), ".-");
    }

    #[test]
    fn silence_classification_thresholds() {
        let buffer = Arc::new(Mutex::new(MorseBuffer::new()));
        apply(&buffer, Segment::Sound { duration_ms: 90.0 });
        // Below letter gap: nothing
        apply(&buffer, Segment::Silence { duration_ms: 400.0 });
        assert_eq!(buffer.lock().morse(), ".");
        // Letter gap
        apply(&buffer, Segment::Silence { duration_ms: 600.0 });
        assert_eq!(buffer.lock().morse(), ". ");
        // Word gap, with the trailing letter separator trimmed
        apply(&buffer, Segment::Silence { duration_ms: 1300.0 });
        assert_eq!(buffer.lock().morse(), ". / ");
    }

    #[test]
    fn silence_before_any_sound_is_ignored() {
        let buffer = Arc::new(Mutex::new(MorseBuffer::new()));
        apply(&buffer, Segment::Silence { duration_ms: 5000.0 });
        assert_eq!(buffer.lock().morse(), "");
    }

    #[test]
    fn stop_flush_appends_final_symbol() {
        // Mirrors the capture loop's teardown: a sound still open when
        // stop arrives is classified and appended before going idle.
        let base = Instant::now();
        let buffer = Arc::new(Mutex::new(MorseBuffer::new()));
        let mut tracker = SegmentTracker::start(base);

        tracker.advance(true, base + Duration::from_millis(100));
        let segment = tracker.flush(base + Duration::from_millis(350)).unwrap();
        apply(&buffer, segment);

        assert_eq!(buffer.lock().morse(), "-");
        assert_eq!(
            PulsePolicy::ACOUSTIC.classify_mark(250.0),
            Symbol::Dash
        );
    }

    #[test]
    fn stop_without_start_is_safe() {
        let mut listener = Listener::new();
        listener.stop();
        listener.stop();
        assert_eq!(listener.status(), ListenerStatus::Idle);
    }
}
