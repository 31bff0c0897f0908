mod oscillator;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

pub use oscillator::ToneOscillator;

/// Errors from the audio device layer. Decoder-facing failures are mapped
/// to states by the caller; nothing here is allowed to escape as a panic.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no default audio output device")]
    NoOutputDevice,
    #[error("no default audio input device")]
    NoInputDevice,
    #[error("audio device not available")]
    DeviceNotAvailable,
    #[error("unsupported sample format")]
    UnsupportedFormat,
    #[error("audio backend error: {0}")]
    Backend(String),
    #[error("audio thread not responding")]
    ThreadUnresponsive,
}

impl From<cpal::BuildStreamError> for AudioError {
    fn from(e: cpal::BuildStreamError) -> Self {
        match e {
            cpal::BuildStreamError::DeviceNotAvailable => AudioError::DeviceNotAvailable,
            other => AudioError::Backend(other.to_string()),
        }
    }
}

impl From<cpal::DefaultStreamConfigError> for AudioError {
    fn from(e: cpal::DefaultStreamConfigError) -> Self {
        match e {
            cpal::DefaultStreamConfigError::DeviceNotAvailable => AudioError::DeviceNotAvailable,
            other => AudioError::Backend(other.to_string()),
        }
    }
}

impl From<cpal::PlayStreamError> for AudioError {
    fn from(e: cpal::PlayStreamError) -> Self {
        match e {
            cpal::PlayStreamError::DeviceNotAvailable => AudioError::DeviceNotAvailable,
            other => AudioError::Backend(other.to_string()),
        }
    }
}

/// The seam between the playback scheduler and the hardware. The scheduler
/// only ever keys a tone on and off; everything device-shaped lives behind
/// this trait so scheduling logic is testable without an output device.
pub trait ToneSink: Send {
    /// Acquire the output device. Called on `play()`/`resume()`; must tear
    /// down any previous session first so the device is never held twice.
    fn acquire(&mut self) -> Result<(), AudioError>;
    /// Release the output device. Idempotent.
    fn release(&mut self);
    fn set_key(&mut self, down: bool);
    fn set_frequency(&mut self, hz: f32);
}

/// Commands sent to the audio output thread
enum ToneCommand {
    Start { frequency: f32, volume: f32 },
    SetFrequency(f32),
    SetVolume(f32),
    Stop,
    Shutdown,
}

/// Handle to the tone output session. The cpal `Stream` is `!Send`, so a
/// dedicated thread owns it; this handle only holds channels and atomics.
pub struct ToneStream {
    command_tx: Sender<ToneCommand>,
    ack_rx: Receiver<Result<(), AudioError>>,
    is_key_down: Arc<AtomicBool>,
}

impl ToneStream {
    /// Spawn the audio thread. The output stream itself is not opened
    /// until `start()`.
    pub fn new() -> Self {
        let (command_tx, command_rx) = bounded::<ToneCommand>(16);
        let (ack_tx, ack_rx) = bounded::<Result<(), AudioError>>(1);
        let is_key_down = Arc::new(AtomicBool::new(false));
        let is_key_down_clone = Arc::clone(&is_key_down);

        thread::spawn(move || audio_thread(command_rx, ack_tx, is_key_down_clone));

        Self {
            command_tx,
            ack_rx,
            is_key_down,
        }
    }

    /// Open the output stream at the given tone frequency. Replaces any
    /// stream a previous `start()` created.
    pub fn start(&self, frequency: f32, volume: f32) -> Result<(), AudioError> {
        self.command_tx
            .send(ToneCommand::Start { frequency, volume })
            .map_err(|_| AudioError::ThreadUnresponsive)?;
        self.ack_rx
            .recv_timeout(Duration::from_secs(2))
            .map_err(|_| AudioError::ThreadUnresponsive)?
    }

    /// Close the output stream. The thread stays alive for the next start.
    pub fn stop(&self) {
        self.is_key_down.store(false, Ordering::Relaxed);
        let _ = self.command_tx.send(ToneCommand::Stop);
    }

    pub fn set_key(&self, down: bool) {
        self.is_key_down.store(down, Ordering::Relaxed);
    }

    pub fn set_frequency(&self, frequency: f32) {
        let _ = self.command_tx.send(ToneCommand::SetFrequency(frequency));
    }

    pub fn set_volume(&self, volume: f32) {
        let _ = self.command_tx.send(ToneCommand::SetVolume(volume));
    }
}

impl Default for ToneStream {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ToneStream {
    fn drop(&mut self) {
        let _ = self.command_tx.send(ToneCommand::Shutdown);
    }
}

/// `ToneSink` backed by a `ToneStream`. The thread is spawned lazily on
/// the first acquire so constructing a player costs nothing.
pub struct CpalToneSink {
    stream: Option<ToneStream>,
    frequency: f32,
    volume: f32,
}

impl CpalToneSink {
    pub fn new(frequency: f32, volume: f32) -> Self {
        Self {
            stream: None,
            frequency,
            volume,
        }
    }
}

impl ToneSink for CpalToneSink {
    fn acquire(&mut self) -> Result<(), AudioError> {
        let stream = self.stream.get_or_insert_with(ToneStream::new);
        stream.start(self.frequency, self.volume)
    }

    fn release(&mut self) {
        if let Some(ref stream) = self.stream {
            stream.stop();
        }
    }

    fn set_key(&mut self, down: bool) {
        if let Some(ref stream) = self.stream {
            stream.set_key(down);
        }
    }

    fn set_frequency(&mut self, hz: f32) {
        self.frequency = hz;
        if let Some(ref stream) = self.stream {
            stream.set_frequency(hz);
        }
    }
}

/// Audio thread that owns the cpal output Stream (not Send)
fn audio_thread(
    command_rx: Receiver<ToneCommand>,
    ack_tx: Sender<Result<(), AudioError>>,
    is_key_down: Arc<AtomicBool>,
) {
    let mut output_stream: Option<Stream> = None;
    let oscillator = Arc::new(parking_lot::Mutex::new(ToneOscillator::new(
        750.0, 0.5, 48000.0,
    )));

    loop {
        match command_rx.recv() {
            Ok(ToneCommand::Start { frequency, volume }) => {
                // Drop any previous stream before opening a new one
                output_stream = None;
                {
                    let mut osc = oscillator.lock();
                    osc.set_frequency(frequency);
                    osc.set_volume(volume);
                }
                match create_output_stream(Arc::clone(&oscillator), Arc::clone(&is_key_down)) {
                    Ok(stream) => {
                        output_stream = Some(stream);
                        let _ = ack_tx.send(Ok(()));
                    }
                    Err(e) => {
                        eprintln!("[audio] failed to open output stream: {}", e);
                        let _ = ack_tx.send(Err(e));
                    }
                }
            }
            Ok(ToneCommand::SetFrequency(freq)) => {
                oscillator.lock().set_frequency(freq);
            }
            Ok(ToneCommand::SetVolume(vol)) => {
                oscillator.lock().set_volume(vol);
            }
            Ok(ToneCommand::Stop) => {
                output_stream = None;
            }
            Ok(ToneCommand::Shutdown) | Err(_) => {
                output_stream = None;
                break;
            }
        }
    }
}

/// Create and start the tone output stream on the default device.
fn create_output_stream(
    oscillator: Arc<parking_lot::Mutex<ToneOscillator>>,
    is_key_down: Arc<AtomicBool>,
) -> Result<Stream, AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(AudioError::NoOutputDevice)?;

    let config = device.default_output_config()?;
    let sample_rate = config.sample_rate().0 as f32;
    let channels = config.channels() as usize;

    oscillator.lock().set_sample_rate(sample_rate);

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => {
            build_output_stream::<f32>(&device, &config.into(), oscillator, is_key_down, channels)
        }
        cpal::SampleFormat::I16 => {
            build_output_stream::<i16>(&device, &config.into(), oscillator, is_key_down, channels)
        }
        cpal::SampleFormat::U16 => {
            build_output_stream::<u16>(&device, &config.into(), oscillator, is_key_down, channels)
        }
        _ => return Err(AudioError::UnsupportedFormat),
    }?;

    stream.play()?;
    Ok(stream)
}

fn build_output_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
    device: &Device,
    config: &StreamConfig,
    oscillator: Arc<parking_lot::Mutex<ToneOscillator>>,
    is_key_down: Arc<AtomicBool>,
    channels: usize,
) -> Result<Stream, AudioError> {
    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let key_down = is_key_down.load(Ordering::Relaxed);
            let mut oscillator = oscillator.lock();

            for frame in data.chunks_mut(channels) {
                let value = T::from_sample(oscillator.next_sample(key_down));
                for channel in frame.iter_mut() {
                    *channel = value;
                }
            }
        },
        |err| eprintln!("[audio] output stream error: {}", err),
        None,
    )?;

    Ok(stream)
}

pub(crate) type MicProducer = Arc<parking_lot::Mutex<ringbuf::HeapProd<f32>>>;

/// Create and start a microphone capture stream on the default input
/// device. Must be called on the thread that will own the stream.
pub(crate) fn create_input_stream(producer: MicProducer) -> Result<Stream, AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(AudioError::NoInputDevice)?;

    let config = device.default_input_config()?;
    let channels = config.channels() as usize;

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => {
            build_input_stream::<f32>(&device, &config.into(), producer, channels)
        }
        cpal::SampleFormat::I16 => {
            build_input_stream::<i16>(&device, &config.into(), producer, channels)
        }
        cpal::SampleFormat::U16 => {
            build_input_stream::<u16>(&device, &config.into(), producer, channels)
        }
        _ => return Err(AudioError::UnsupportedFormat),
    }?;

    stream.play()?;
    Ok(stream)
}

fn build_input_stream<T: cpal::SizedSample>(
    device: &Device,
    config: &StreamConfig,
    producer: MicProducer,
    channels: usize,
) -> Result<Stream, AudioError>
where
    f32: FromSample<T>,
{
    use ringbuf::traits::Producer;

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let mut producer = producer.lock();

            // Downmix to mono and push to the ring buffer; drop samples
            // if the analysis side falls behind
            for frame in data.chunks(channels) {
                let sample: f32 = frame
                    .iter()
                    .map(|s| <f32 as FromSample<T>>::from_sample_(*s))
                    .sum::<f32>()
                    / channels as f32;
                let _ = producer.try_push(sample);
            }
        },
        |err| eprintln!("[audio] input stream error: {}", err),
        None,
    )?;

    Ok(stream)
}
