//! Morse code toolkit: text/Morse conversion, Farnsworth-aware audio
//! playback, a tap decoder for manual keying, and an acoustic decoder
//! that listens on the microphone.

pub mod audio;
pub mod config;
pub mod funfact;
pub mod listener;
pub mod morse;
pub mod playback;
pub mod tap;

pub use config::Settings;
pub use listener::{Listener, ListenerStatus};
pub use morse::{morse_to_text, text_to_morse, Symbol, TimingProfile};
pub use playback::{PlaybackStatus, Player, SOS};
pub use tap::TapDecoder;
