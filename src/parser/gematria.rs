/// Punctuation used as numeral separators (geresh / gershayim written in ASCII).
const SEPARATORS: &[char] = &['\'', '"'];

fn letter_value(c: char) -> u32 {
    match c {
        'א' => 1,
        'ב' => 2,
        'ג' => 3,
        'ד' => 4,
        'ה' => 5,
        'ו' => 6,
        'ז' => 7,
        'ח' => 8,
        'ט' => 9,
        'י' => 10,
        'כ' => 20,
        'ל' => 30,
        'מ' => 40,
        'נ' => 50,
        'ס' => 60,
        'ע' => 70,
        'פ' => 80,
        'צ' => 90,
        'ק' => 100,
        'ר' => 200,
        'ש' => 300,
        'ת' => 400,
        _ => 0,
    }
}

/// Decode a Hebrew-letter numeral token (e.g. `י"ז` → 17).
///
/// Lossy: characters outside the letter table count as 0, so a malformed token
/// and a token worth nothing both decode to 0. Never fails.
pub fn decode(token: &str) -> u32 {
    token
        .chars()
        .filter(|c| !SEPARATORS.contains(c))
        .map(letter_value)
        .sum()
}
