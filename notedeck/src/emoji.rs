//! Emoji removal for markdown sources

/// Pictographic ranges removed before rendering
const EMOJI_RANGES: &[(u32, u32)] = &[
    (0x1F600, 0x1F64F), // emoticons
    (0x1F300, 0x1F5FF), // symbols & pictographs
    (0x1F680, 0x1F6FF), // transport & map
    (0x1F700, 0x1F77F), // alchemical
    (0x1F780, 0x1F7FF), // geometric shapes extended
    (0x1F800, 0x1F8FF), // supplemental arrows-c
    (0x1F900, 0x1F9FF), // supplemental symbols & pictographs
    (0x1FA00, 0x1FA6F), // chess symbols
    (0x1FA70, 0x1FAFF), // symbols & pictographs extended-a
    (0x2600, 0x26FF),   // miscellaneous symbols
    (0x2700, 0x27BF),   // dingbats
];

/// Whether a character falls into one of the stripped pictographic ranges
pub fn is_emoji(c: char) -> bool {
    let code = u32::from(c);
    EMOJI_RANGES
        .iter()
        .any(|&(start, end)| (start..=end).contains(&code))
}

/// Remove emoji glyphs from text, leaving everything else untouched
pub fn strip_emoji(text: &str) -> String {
    text.chars().filter(|c| !is_emoji(*c)).collect()
}
