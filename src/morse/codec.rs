/// Morse code lookup table (A-Z, 0-9)
const MORSE_TABLE: &[(char, &str)] = &[
    ('A', ".-"),
    ('B', "-..."),
    ('C', "-.-."),
    ('D', "-.."),
    ('E', "."),
    ('F', "..-."),
    ('G', "--."),
    ('H', "...."),
    ('I', ".."),
    ('J', ".---"),
    ('K', "-.-"),
    ('L', ".-.."),
    ('M', "--"),
    ('N', "-."),
    ('O', "---"),
    ('P', ".--."),
    ('Q', "--.-"),
    ('R', ".-."),
    ('S', "..."),
    ('T', "-"),
    ('U', "..-"),
    ('V', "...-"),
    ('W', ".--"),
    ('X', "-..-"),
    ('Y', "-.--"),
    ('Z', "--.."),
    ('1', ".----"),
    ('2', "..---"),
    ('3', "...--"),
    ('4', "....-"),
    ('5', "....."),
    ('6', "-...."),
    ('7', "--..."),
    ('8', "---.."),
    ('9', "----."),
    ('0', "-----"),
];

fn lookup_char(c: char) -> Option<&'static str> {
    MORSE_TABLE.iter().find(|(ch, _)| *ch == c).map(|(_, code)| *code)
}

fn lookup_code(code: &str) -> Option<char> {
    MORSE_TABLE.iter().find(|(_, p)| *p == code).map(|(c, _)| *c)
}

/// Convert text to a Morse string.
///
/// Input is uppercased; each mapped character becomes its code, literal
/// spaces become the word separator `/`, and per-character codes are joined
/// with a single space. Characters outside the table are silently dropped,
/// so the output never carries empty letter slots.
pub fn text_to_morse(text: &str) -> String {
    let codes: Vec<&str> = text
        .to_uppercase()
        .chars()
        .filter_map(|c| if c == ' ' { Some("/") } else { lookup_char(c) })
        .collect();
    codes.join(" ")
}

/// Convert a Morse string back to text.
///
/// Characters outside `. - ' ' /` are stripped first so malformed input
/// never halts decoding. Unknown codes decode to nothing, and word slots
/// that decode to nothing are skipped, so irregular whitespace in the
/// input collapses to single spaces in the output.
pub fn morse_to_text(morse: &str) -> String {
    let sanitized: String = morse
        .chars()
        .filter(|c| matches!(c, '.' | '-' | ' ' | '/'))
        .collect();

    let words: Vec<String> = sanitized
        .split('/')
        .map(|word| {
            word.trim()
                .split(' ')
                .filter_map(lookup_code)
                .collect::<String>()
        })
        .filter(|decoded| !decoded.is_empty())
        .collect();
    words.join(" ")
}
