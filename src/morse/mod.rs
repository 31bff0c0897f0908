mod buffer;
mod codec;
mod timing;

pub use buffer::{MorseBuffer, PulsePolicy};
pub use codec::{morse_to_text, text_to_morse};
pub use timing::{SymbolDurations, TimingProfile};

/// One element of a rendered Morse string.
///
/// Textual encoding: `.` `-` for the tones, a single space for the letter
/// separator and `/` for the word separator (itself surrounded by spaces).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Dot,
    Dash,
    LetterGap,
    WordGap,
}

impl Symbol {
    /// Parse a single Morse character. Anything outside `. - ' ' /` is None.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '.' => Some(Symbol::Dot),
            '-' => Some(Symbol::Dash),
            ' ' => Some(Symbol::LetterGap),
            '/' => Some(Symbol::WordGap),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Symbol::Dot => '.',
            Symbol::Dash => '-',
            Symbol::LetterGap => ' ',
            Symbol::WordGap => '/',
        }
    }

    /// True for the elements that produce a tone.
    pub fn is_tone(&self) -> bool {
        matches!(self, Symbol::Dot | Symbol::Dash)
    }

    /// Tokenize a Morse string into symbols, silently dropping anything
    /// that is not a valid Morse character.
    pub fn tokenize(morse: &str) -> Vec<Symbol> {
        morse.chars().filter_map(Symbol::from_char).collect()
    }
}
