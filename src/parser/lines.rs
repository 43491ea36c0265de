//! Line classification for a single author's post.
//!
//! A post is free text: a date header ("כ תשרי") followed by lines naming who
//! is remembered on that date, sometimes chained with connector lines. There is
//! no markup, so each line is classified from lexical cues by an ordered rule
//! table; the first matching rule wins.

use super::{gematria, months, nikud};
use crate::index::{AdarPreference, YahrtzeitKey, YahrtzeitRecord};

/// Letters whose numeral value is 1–30: the only ones a day number starts with.
const DAY_LETTERS: &[char] = &['א', 'ב', 'ג', 'ד', 'ה', 'ו', 'ז', 'ח', 'ט', 'י', 'כ', 'ל'];
const PRIMARY_PREFIX: &str = "רבי ";
const NAME_PREFIXES: &[&str] = &[
    PRIMARY_PREFIX,
    "יששכר ",
    "השר ",
    "שמעון ",
    "??רבי ",
    "?רבי ",
    "משה ",
    "רבינו ",
];
const LEAF_MARKERS: &[(&str, AdarPreference)] = &[
    ("(א)", AdarPreference::First),
    ("(ב)", AdarPreference::Second),
];
const CONNECTORS: &[&str] = &["ובנו", "וחתנו"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Header,
    Name,
    Connector,
    Noise,
}

/// Date context carried across lines, and across blocks of the same post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanState {
    pub day: Option<u32>,
    pub month: Option<u8>,
    pub default_pref: Option<AdarPreference>,
}

impl ScanState {
    /// A date is in force only while the current day is present and non-zero.
    fn has_date(&self) -> bool {
        self.day.is_some_and(|d| d > 0)
    }
}

struct LineRule {
    kind: LineKind,
    matches: fn(&str, &ScanState) -> bool,
}

/// Checked in order; `Noise` is the fallback.
const RULES: &[LineRule] = &[
    LineRule { kind: LineKind::Header, matches: is_header },
    LineRule { kind: LineKind::Name, matches: is_name },
    LineRule { kind: LineKind::Connector, matches: is_connector },
];

/// Remove the backslash and apostrophe artifacts the forum leaves in text.
pub fn clean_line(line: &str) -> String {
    line.replace(['\\', '\''], "")
}

pub fn classify(line: &str, state: &ScanState) -> LineKind {
    RULES
        .iter()
        .find(|rule| (rule.matches)(line, state))
        .map(|rule| rule.kind)
        .unwrap_or(LineKind::Noise)
}

fn is_header(line: &str, _state: &ScanState) -> bool {
    line.chars().take(2).any(|c| DAY_LETTERS.contains(&c))
        && months::mentions_month(line)
        && !line.starts_with(PRIMARY_PREFIX)
}

fn is_name(line: &str, state: &ScanState) -> bool {
    let (_, rest) = split_leaf_marker(line);
    state.has_date() && NAME_PREFIXES.iter().any(|p| rest.starts_with(p))
}

fn is_connector(line: &str, _state: &ScanState) -> bool {
    CONNECTORS.contains(&line.trim())
}

/// Peel a leading `(א)` / `(ב)` marker off a name line.
fn split_leaf_marker(line: &str) -> (Option<AdarPreference>, &str) {
    for &(marker, pref) in LEAF_MARKERS {
        if let Some(rest) = line.strip_prefix(marker) {
            return (Some(pref), rest.trim_start());
        }
    }
    (None, line)
}

/// Scans every line of one post, carrying a single [`ScanState`] across all of
/// the post's blocks.
#[derive(Debug, Default)]
pub struct PostScanner {
    state: ScanState,
    records: Vec<YahrtzeitRecord>,
}

impl PostScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scan_block(&mut self, block: &str) {
        for raw in block.lines() {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            self.scan_line(&clean_line(raw));
        }
    }

    pub fn scan_line(&mut self, line: &str) {
        match classify(line, &self.state) {
            LineKind::Header => self.apply_header(line),
            LineKind::Name => self.apply_name(line),
            LineKind::Connector | LineKind::Noise => {}
        }
    }

    pub fn finish(self) -> Vec<YahrtzeitRecord> {
        self.records
    }

    fn apply_header(&mut self, line: &str) {
        let Some(resolution) = months::resolve(line) else {
            self.state.day = None;
            return;
        };
        let day_token = line.split(' ').next().unwrap_or_default();
        self.state.month = Some(resolution.month);
        self.state.default_pref = resolution.leaf;
        // A zero day is stored as-is; no record is emitted under it.
        self.state.day = Some(gematria::decode(day_token));
    }

    fn apply_name(&mut self, line: &str) {
        let (Some(day), Some(month)) = (self.state.day, self.state.month) else {
            return;
        };
        let (marker, rest) = split_leaf_marker(line);
        let rest = rest.strip_prefix("??").unwrap_or(rest);
        self.records.push(YahrtzeitRecord {
            key: YahrtzeitKey { month, day },
            text: nikud::strip_nikud(rest.trim()),
            adar_pref: marker.or(self.state.default_pref),
        });
    }
}

/// Scan all blocks of one post under a fresh state.
pub fn scan_post<S: AsRef<str>>(blocks: &[S]) -> Vec<YahrtzeitRecord> {
    let mut scanner = PostScanner::new();
    for block in blocks {
        scanner.scan_block(block.as_ref());
    }
    scanner.finish()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn key(month: u8, day: u32) -> YahrtzeitKey {
        YahrtzeitKey { month, day }
    }

    fn dated(day: u32, month: u8) -> ScanState {
        ScanState { day: Some(day), month: Some(month), default_pref: None }
    }

    #[test]
    fn header_rule() {
        let s = ScanState::default();
        assert_eq!(classify("כ תשרי", &s), LineKind::Header);
        assert_eq!(classify("יז תמוז תשפ\"ד", &s), LineKind::Header);
        // No month alias.
        assert_eq!(classify("כ something", &s), LineKind::Noise);
        // Starts with a non-numeral letter pair.
        assert_eq!(classify("שם תשרי", &s), LineKind::Noise);
    }

    #[test]
    fn primary_prefix_never_a_header() {
        // "רבי" opens with a numeral letter and "אב" hides in "אברהם".
        let line = "רבי אברהם";
        assert_eq!(classify(line, &ScanState::default()), LineKind::Noise);
        assert_eq!(classify(line, &dated(3, 1)), LineKind::Name);
    }

    #[test]
    fn name_rule_requires_date() {
        assert_eq!(classify("משה בן עמרם", &ScanState::default()), LineKind::Noise);
        assert_eq!(classify("משה בן עמרם", &dated(7, 12)), LineKind::Name);
        assert_eq!(classify("משה בן עמרם", &dated(0, 12)), LineKind::Noise);
    }

    #[test]
    fn name_rule_question_mark_variants() {
        let s = dated(1, 1);
        assert_eq!(classify("??רבי יוסף", &s), LineKind::Name);
        assert_eq!(classify("?רבי יוסף", &s), LineKind::Name);
        assert_eq!(classify("(ב) רבי יוסף", &s), LineKind::Name);
    }

    #[test]
    fn connector_rule() {
        let s = dated(1, 1);
        assert_eq!(classify("ובנו", &s), LineKind::Connector);
        assert_eq!(classify(" וחתנו ", &s), LineKind::Connector);
        assert_eq!(classify("ובנו רבי", &s), LineKind::Noise);
    }

    #[test]
    fn header_then_name() {
        let records = scan_post(&["כ תשרי\nרבי John Doe"]);
        assert_eq!(
            records,
            vec![YahrtzeitRecord { key: key(7, 20), text: "רבי John Doe".into(), adar_pref: None }]
        );
    }

    #[test]
    fn name_text_loses_nikud() {
        let records = scan_post(&["ה ניסן\nרבי יוֹסֵף"]);
        assert_eq!(records[0].text, "רבי יוסף");
        assert_eq!(records[0].key, key(1, 5));
    }

    #[test]
    fn date_carries_across_blocks_and_connectors() {
        let records = scan_post(&[
            "י\"ח אלול\nרבי ישראל בעל שם טוב\nובנו",
            "רבינו צבי",
            "כ\"ה ניסן\nמשה אהרן",
        ]);
        let keys: Vec<_> = records.iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![key(6, 18), key(6, 18), key(1, 25)]);
    }

    #[test]
    fn apostrophes_and_backslashes_stripped() {
        let records = scan_post(&["ט\\\"ו שבט\nרבי ר' חיים"]);
        assert_eq!(records[0].key, key(11, 15));
        assert_eq!(records[0].text, "רבי ר חיים");
    }

    #[test]
    fn noise_before_first_header_ignored() {
        let records = scan_post(&["שלום לכולם\nרבי פלוני\n\nו טבת\nרבי אלמוני"]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, key(10, 6));
    }

    #[test]
    fn new_header_replaces_date() {
        let mut scanner = PostScanner::new();
        scanner.scan_line("כ תשרי");
        scanner.scan_line("ב אלול");
        assert_eq!(&scanner.state, &ScanState { day: Some(2), month: Some(6), default_pref: None });
        scanner.scan_line("רבי פלוני");
        assert_eq!(scanner.records[0].key, key(6, 2));
    }

    #[test]
    fn header_without_names_emits_nothing() {
        assert!(scan_post(&["כ תשרי", "ו טבת\n"]).is_empty());
    }

    #[test]
    fn geresh_adar_halves_set_default() {
        let records = scan_post(&["יד אדר ב׳\nרבי אחד\n(א) רבי שני"]);
        assert_eq!(records[0].key, key(12, 14));
        assert_eq!(records[0].adar_pref, Some(AdarPreference::Second));
        assert_eq!(records[1].adar_pref, Some(AdarPreference::First));
        assert_eq!(records[1].text, "רבי שני");
    }

    #[test]
    fn leaf_marker_overrides_inherited_default() {
        let mut scanner = PostScanner::new();
        scanner.state = ScanState {
            day: Some(7),
            month: Some(12),
            default_pref: Some(AdarPreference::First),
        };
        scanner.scan_line("(ב) רבי משה");
        scanner.scan_line("רבי אהרן");
        let prefs: Vec<_> = scanner.records.iter().map(|r| r.adar_pref).collect();
        assert_eq!(prefs, vec![Some(AdarPreference::Second), Some(AdarPreference::First)]);
    }

    #[test]
    fn bare_adar_clears_default() {
        let records = scan_post(&["ז אדר ב׳\nרבי אחד\nח אדר\nרבי שני"]);
        assert_eq!(records[0].adar_pref, Some(AdarPreference::Second));
        assert_eq!(records[1].adar_pref, None);
        assert_eq!(records[1].key, key(12, 8));
    }

    #[test]
    fn double_question_mark_artifact_removed() {
        let records = scan_post(&["ג תמוז\n??רבי מנחם\n?רבי שלום"]);
        assert_eq!(records[0].text, "רבי מנחם");
        assert_eq!(records[1].text, "?רבי שלום");
    }

    #[test]
    fn fresh_post_has_no_date() {
        let first = scan_post(&["כ תשרי\nרבי אחד"]);
        let second = scan_post(&["רבי שני"]);
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }
}
