//! Filename and directory-name sanitization for album artifacts
//!
//! Track filenames and the archive root directory are derived from
//! user-supplied names, which routinely carry characters that are illegal in
//! file paths or typographic punctuation that breaks naive consumers. All
//! transformations here are idempotent: applying them twice yields the same
//! result as applying them once.

/// Characters that are illegal in file names on at least one supported platform
const PATH_ILLEGAL: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replace typographic punctuation with its ASCII equivalent.
///
/// Curly quotes, en/em dashes, and the ellipsis all have plain ASCII
/// stand-ins; everything else passes through unchanged.
pub fn normalize_typographic(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2013}' | '\u{2014}' | '\u{2015}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            _ => out.push(c),
        }
    }
    out
}

/// Strip characters that are illegal in file paths, then trim whitespace.
pub fn strip_path_illegal(input: &str) -> String {
    input
        .chars()
        .filter(|c| !PATH_ILLEGAL.contains(c) && !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Sanitize a name for use as a single file-name component.
///
/// Typographic punctuation is normalized first so that, for example, a curly
/// double quote becomes an ASCII `"` and is then stripped with the other
/// path-illegal characters.
pub fn file_name_component(input: &str) -> String {
    strip_path_illegal(&normalize_typographic(input))
}

/// Derive the filename for a fetched track: zero-padded ordinal plus the
/// sanitized track name, e.g. `01 AB.mp3`.
pub fn track_file_name(number: u32, name: &str) -> String {
    let cleaned = file_name_component(name);
    if cleaned.is_empty() {
        format!("{number:02}.mp3")
    } else {
        format!("{number:02} {cleaned}.mp3")
    }
}

/// Derive the archive root directory name from album name and artist,
/// e.g. `Test - Artist`.
///
/// On top of the file-name sanitization this also drops any remaining
/// non-ASCII characters, since the root name travels inside the archive and
/// gets reproduced verbatim by every unpacker.
pub fn archive_root_name(album_name: &str, artist: &str) -> String {
    let combined = format!("{album_name} - {artist}");
    let cleaned: String = file_name_component(&combined)
        .chars()
        .filter(|c| c.is_ascii())
        .collect();
    let trimmed = cleaned.trim().to_string();
    if trimmed == "-" || trimmed.is_empty() {
        "Album".to_string()
    } else {
        trimmed
    }
}
