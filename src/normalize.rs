/// Honorific tokens dropped from the front of a name when more tokens follow.
pub const HONORIFICS: [&str; 7] = ["mr", "ms", "mrs", "miss", "dr", "prof", "sir"];

/// Canonicalize a raw name for matching. Total over any input, including
/// empty and all-punctuation strings, and stable under repeated application
/// for names without stacked honorifics.
pub fn normalize_name(input: &str) -> String {
    use unicode_normalization::UnicodeNormalization;
    // Remove diacritics by decomposing to NFD and filtering combining marks.
    // Whatever is still non-ASCII after decomposition has no ASCII base form
    // and is dropped rather than guessed at.
    let ascii: String = input
        .trim()
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .filter(char::is_ascii)
        .collect();
    let spaced: String = ascii
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    strip_leading_honorific(&collapsed)
}

// One leading honorific is dropped, and only when at least one token follows.
// A lone "dr" stays: it may be the whole recorded name.
fn strip_leading_honorific(name: &str) -> String {
    if let Some((first, rest)) = name.split_once(' ') {
        if HONORIFICS.contains(&first) {
            return rest.to_string();
        }
    }
    name.to_string()
}
