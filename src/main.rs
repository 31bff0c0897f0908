use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use dotdash::audio::CpalToneSink;
use dotdash::morse::Symbol;
use dotdash::{morse_to_text, text_to_morse, Listener, ListenerStatus, Player, Settings, SOS};
use std::io::Write;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "dotdash",
    version,
    about = "Morse code toolkit: convert, play, tap and listen"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert text to Morse code
    Encode {
        /// Text to convert (A-Z, 0-9; other characters are dropped)
        text: String,
    },
    /// Convert Morse code to text
    Decode {
        /// Morse string: dots and dashes, ' ' between letters, '/' between words
        morse: String,
    },
    /// Play text (or Morse) as audio through the default output device
    Play {
        /// Text to play
        text: Option<String>,

        /// Interpret the input as Morse instead of text
        #[arg(long, value_name = "MORSE", conflicts_with = "text")]
        morse: Option<String>,

        /// Play the SOS distress signal
        #[arg(long, conflicts_with_all = ["text", "morse"])]
        sos: bool,

        /// Character speed in words per minute
        #[arg(long, value_name = "WPM")]
        wpm: Option<f32>,

        /// Effective (Farnsworth) speed; implies stretched gaps
        #[arg(long, value_name = "WPM")]
        farnsworth: Option<f32>,

        /// Tone frequency in Hz
        #[arg(long, value_name = "HZ")]
        frequency: Option<f32>,
    },
    /// Key Morse by tapping the spacebar (Escape to finish)
    Tap,
    /// Decode Morse from the microphone
    Listen {
        /// How long to listen before decoding stops
        #[arg(long, value_name = "SECONDS", default_value = "10")]
        seconds: u64,
    },
    /// Fetch a Morse code fun fact (requires GEMINI_API_KEY)
    Fact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Encode { text } => {
            println!("{}", text_to_morse(&text));
        }
        Command::Decode { morse } => {
            println!("{}", morse_to_text(&morse));
        }
        Command::Play {
            text,
            morse,
            sos,
            wpm,
            farnsworth,
            frequency,
        } => {
            let morse = if sos {
                SOS.to_string()
            } else if let Some(morse) = morse {
                morse
            } else if let Some(text) = text {
                text_to_morse(&text)
            } else {
                bail!("nothing to play; pass TEXT, --morse or --sos");
            };
            play(&morse, wpm, farnsworth, frequency)?;
        }
        Command::Tap => {
            tap()?;
        }
        Command::Listen { seconds } => {
            listen(seconds)?;
        }
        Command::Fact => {
            println!("{}", dotdash::funfact::fetch_fun_fact());
        }
    }

    Ok(())
}

fn play(morse: &str, wpm: Option<f32>, farnsworth: Option<f32>, frequency: Option<f32>) -> Result<()> {
    let mut settings = Settings::load();
    if let Some(wpm) = wpm {
        settings.character_wpm = wpm;
    }
    if let Some(farnsworth) = farnsworth {
        settings.effective_wpm = farnsworth;
        settings.farnsworth_enabled = true;
    }
    if let Some(frequency) = frequency {
        settings.tone_frequency_hz = frequency;
    }
    let settings = settings.clamped();
    let profile = settings.timing_profile();

    if Symbol::tokenize(morse).is_empty() {
        bail!("nothing playable in the input");
    }

    let sink = CpalToneSink::new(profile.tone_frequency_hz, 0.5);
    let mut player = Player::new(profile, Box::new(sink));
    let ticks = player.ticks();

    player.play(morse);
    if player.status() == dotdash::PlaybackStatus::Stopped {
        bail!("could not open the audio output device");
    }

    // Echo each symbol as it sounds; the stream ends with a None tick.
    let mut stdout = std::io::stdout();
    while let Ok(Some(symbol)) = ticks.recv() {
        let glyph = match symbol {
            Symbol::Dot => ".",
            Symbol::Dash => "-",
            Symbol::LetterGap => " ",
            Symbol::WordGap => " / ",
        };
        print!("{}", glyph);
        stdout.flush()?;
    }
    println!();

    Ok(())
}

fn tap() -> Result<()> {
    use rdev::{listen, EventType, Key};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    let decoder = Arc::new(parking_lot::Mutex::new(dotdash::TapDecoder::new()));
    let done = Arc::new(AtomicBool::new(false));

    println!("Hold SPACE to key (short = dot, long = dash). Press ESC when finished.");

    // rdev's listen loop cannot be cancelled, so it runs on its own thread
    // and the process exits once Escape flips the flag.
    {
        let decoder = Arc::clone(&decoder);
        let done = Arc::clone(&done);
        std::thread::spawn(move || {
            let result = listen(move |event| match event.event_type {
                EventType::KeyPress(Key::Space) => decoder.lock().press(Instant::now()),
                EventType::KeyRelease(Key::Space) => decoder.lock().release(Instant::now()),
                EventType::KeyPress(Key::Escape) => done.store(true, Ordering::Relaxed),
                _ => {}
            });
            if let Err(e) = result {
                eprintln!("[tap] keyboard hook failed: {:?}", e);
            }
        });
    }

    let mut stdout = std::io::stdout();
    let mut last_shown = String::new();
    while !done.load(Ordering::Relaxed) {
        {
            let mut decoder = decoder.lock();
            decoder.poll(Instant::now());
            if decoder.morse() != last_shown {
                last_shown = decoder.morse().to_string();
                print!("\r{}  [{}]", last_shown, decoder.text());
                stdout.flush()?;
            }
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    let decoder = decoder.lock();
    println!();
    println!("Morse: {}", decoder.morse());
    println!("Text:  {}", decoder.text());
    Ok(())
}

fn listen(seconds: u64) -> Result<()> {
    let mut listener = Listener::new();
    listener.start();

    match listener.status() {
        ListenerStatus::Listening => {}
        ListenerStatus::PermissionDenied => bail!("microphone access denied"),
        _ => bail!("could not open the microphone"),
    }

    println!("Listening for {} seconds...", seconds);
    std::thread::sleep(Duration::from_secs(seconds));
    listener.stop();

    println!("Morse: {}", listener.morse());
    println!("Text:  {}", listener.text());

    Ok(())
}
