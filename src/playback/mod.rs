use crate::audio::ToneSink;
use crate::morse::{Symbol, SymbolDurations, TimingProfile};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Morse for the distress signal, playable directly.
pub const SOS: &str = "... --- ...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Stopped,
    Playing,
    Paused,
}

enum Control {
    Pause,
    Resume,
    Stop,
}

enum Wait {
    Completed,
    Paused,
    Stopped,
}

/// Session state shared between the player handle and its worker thread.
struct Shared {
    status: Mutex<PlaybackStatus>,
    queue: Mutex<Vec<Symbol>>,
    cursor: AtomicUsize,
    sink: Mutex<Box<dyn ToneSink>>,
}

/// Plays a Morse string through a `ToneSink`, one symbol at a time, with
/// pause/resume/stop semantics.
///
/// Progress is observable only through the tick channel: every emitted
/// symbol is sent as `Some(symbol)`, and `None` marks the session being
/// reset (stop, natural completion, or the teardown at the start of a new
/// `play()`). A paused symbol is not consumed; resuming re-emits it from
/// the start, and the cursor only advances once a symbol's tone and
/// trailing gap have both completed.
pub struct Player {
    profile: TimingProfile,
    shared: Arc<Shared>,
    control_tx: Option<Sender<Control>>,
    worker: Option<JoinHandle<()>>,
    tick_tx: Sender<Option<Symbol>>,
    tick_rx: Receiver<Option<Symbol>>,
}

impl Player {
    pub fn new(profile: TimingProfile, sink: Box<dyn ToneSink>) -> Self {
        let (tick_tx, tick_rx) = unbounded();
        Self {
            profile,
            shared: Arc::new(Shared {
                status: Mutex::new(PlaybackStatus::Stopped),
                queue: Mutex::new(Vec::new()),
                cursor: AtomicUsize::new(0),
                sink: Mutex::new(sink),
            }),
            control_tx: None,
            worker: None,
            tick_tx,
            tick_rx,
        }
    }

    /// Subscribe to per-symbol ticks. May be called multiple times; each
    /// receiver competes for the same event stream, so a UI should hold
    /// one receiver.
    pub fn ticks(&self) -> Receiver<Option<Symbol>> {
        self.tick_rx.clone()
    }

    pub fn status(&self) -> PlaybackStatus {
        *self.shared.status.lock()
    }

    /// Takes effect on the next `play()`.
    pub fn set_profile(&mut self, profile: TimingProfile) {
        self.profile = profile;
    }

    /// Tokenize `morse` (invalid characters filtered) and start emitting
    /// from the beginning. Any previous session is torn down first so the
    /// output device is never acquired twice. If the device cannot be
    /// acquired the player logs and stays `Stopped`, emitting nothing.
    pub fn play(&mut self, morse: &str) {
        self.stop();

        let queue = Symbol::tokenize(morse);
        if queue.is_empty() {
            return;
        }

        {
            let mut sink = self.shared.sink.lock();
            sink.set_frequency(self.profile.tone_frequency_hz);
            if let Err(e) = sink.acquire() {
                eprintln!("[playback] audio unavailable, staying stopped: {}", e);
                return;
            }
        }

        *self.shared.queue.lock() = queue;
        self.shared.cursor.store(0, Ordering::Relaxed);
        *self.shared.status.lock() = PlaybackStatus::Playing;

        let (control_tx, control_rx) = unbounded();
        self.control_tx = Some(control_tx);

        let shared = Arc::clone(&self.shared);
        let tick_tx = self.tick_tx.clone();
        let durations = self.profile.durations();
        self.worker = Some(thread::spawn(move || {
            worker_loop(shared, control_rx, tick_tx, durations);
        }));
    }

    /// Valid only while playing: cancels the pending symbol wait and
    /// releases the output device, keeping the queue and cursor intact.
    pub fn pause(&mut self) {
        {
            let mut status = self.shared.status.lock();
            if *status != PlaybackStatus::Playing {
                return;
            }
            *status = PlaybackStatus::Paused;
        }
        if let Some(ref tx) = self.control_tx {
            let _ = tx.send(Control::Pause);
        }
    }

    /// Valid only while paused: re-acquires the output device and resumes
    /// emission from the stored cursor.
    pub fn resume(&mut self) {
        {
            let mut status = self.shared.status.lock();
            if *status != PlaybackStatus::Paused {
                return;
            }
            *status = PlaybackStatus::Playing;
        }
        if let Some(ref tx) = self.control_tx {
            let _ = tx.send(Control::Resume);
        }
    }

    /// Valid from any state; idempotent. Cancels the worker, releases the
    /// output device, resets the session and emits a `None` tick.
    pub fn stop(&mut self) {
        if let Some(tx) = self.control_tx.take() {
            let _ = tx.send(Control::Stop);
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }

        *self.shared.status.lock() = PlaybackStatus::Stopped;
        self.shared.queue.lock().clear();
        self.shared.cursor.store(0, Ordering::Relaxed);
        {
            let mut sink = self.shared.sink.lock();
            sink.set_key(false);
            sink.release();
        }
        let _ = self.tick_tx.send(None);
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(
    shared: Arc<Shared>,
    control_rx: Receiver<Control>,
    tick_tx: Sender<Option<Symbol>>,
    durations: SymbolDurations,
) {
    loop {
        // Handle control that arrived between symbols
        match control_rx.try_recv() {
            Ok(Control::Stop) | Err(TryRecvError::Disconnected) => {
                silence_sink(&shared);
                return;
            }
            Ok(Control::Pause) => {
                silence_sink(&shared);
                if !wait_for_resume(&shared, &control_rx, &tick_tx) {
                    return;
                }
                continue;
            }
            Ok(Control::Resume) | Err(TryRecvError::Empty) => {}
        }

        let cursor = shared.cursor.load(Ordering::Relaxed);
        let symbol = shared.queue.lock().get(cursor).copied();
        let Some(symbol) = symbol else {
            finish(&shared, &tick_tx);
            return;
        };

        let _ = tick_tx.send(Some(symbol));
        let (tone_ms, gap_ms) = durations.schedule(symbol);

        if symbol.is_tone() {
            shared.sink.lock().set_key(true);
            match interruptible_wait(&control_rx, tone_ms) {
                Wait::Completed => shared.sink.lock().set_key(false),
                Wait::Paused => {
                    silence_sink(&shared);
                    if !wait_for_resume(&shared, &control_rx, &tick_tx) {
                        return;
                    }
                    // Symbol was not consumed; re-emit it from the top
                    continue;
                }
                Wait::Stopped => {
                    silence_sink(&shared);
                    return;
                }
            }
        }

        match interruptible_wait(&control_rx, gap_ms) {
            Wait::Completed => {}
            Wait::Paused => {
                silence_sink(&shared);
                if !wait_for_resume(&shared, &control_rx, &tick_tx) {
                    return;
                }
                continue;
            }
            Wait::Stopped => {
                silence_sink(&shared);
                return;
            }
        }

        shared.cursor.fetch_add(1, Ordering::Relaxed);
    }
}

/// Cancellable inter-symbol wait: sleeps for `ms` unless a control
/// message arrives first.
fn interruptible_wait(control_rx: &Receiver<Control>, ms: f32) -> Wait {
    if ms <= 0.0 {
        return Wait::Completed;
    }
    match control_rx.recv_timeout(Duration::from_micros((ms * 1000.0) as u64)) {
        Err(RecvTimeoutError::Timeout) => Wait::Completed,
        Ok(Control::Pause) => Wait::Paused,
        Ok(Control::Stop) | Err(RecvTimeoutError::Disconnected) => Wait::Stopped,
        // A stray resume while already playing; treat the wait as done
        Ok(Control::Resume) => Wait::Completed,
    }
}

/// Block until resumed. Returns false when the worker should terminate.
fn wait_for_resume(
    shared: &Arc<Shared>,
    control_rx: &Receiver<Control>,
    tick_tx: &Sender<Option<Symbol>>,
) -> bool {
    loop {
        match control_rx.recv() {
            Ok(Control::Resume) => {
                let acquired = shared.sink.lock().acquire();
                if let Err(e) = acquired {
                    eprintln!("[playback] resume failed, stopping: {}", e);
                    finish(shared, tick_tx);
                    return false;
                }
                return true;
            }
            Ok(Control::Pause) => continue,
            Ok(Control::Stop) | Err(_) => {
                silence_sink(shared);
                return false;
            }
        }
    }
}

fn silence_sink(shared: &Arc<Shared>) {
    let mut sink = shared.sink.lock();
    sink.set_key(false);
    sink.release();
}

/// Session teardown on natural completion (or a failed resume): release
/// the device, reset the session and signal `None`.
fn finish(shared: &Arc<Shared>, tick_tx: &Sender<Option<Symbol>>) {
    silence_sink(shared);
    shared.queue.lock().clear();
    shared.cursor.store(0, Ordering::Relaxed);
    *shared.status.lock() = PlaybackStatus::Stopped;
    let _ = tick_tx.send(None);
}
