use unicode_normalization::UnicodeNormalization;

/// Strip vowel points and cantillation marks: NFD, then drop every combining mark.
pub fn strip_nikud(text: &str) -> String {
    text.nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect()
}
