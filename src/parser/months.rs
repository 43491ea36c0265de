use crate::index::AdarPreference;

/// Leap-month index for the second half. Never escapes the resolver; it is
/// folded back into month 12 with a leaf preference.
const ADAR_II: u8 = 13;
const ADAR: u8 = 12;
const BARE_ADAR: &str = "אדר";

/// Month-name aliases as written on the forum. Table order breaks length ties.
pub const MONTH_ALIASES: &[(&str, u8)] = &[
    ("ניסן", 1),
    ("אייר", 2),
    ("סיון", 3),
    ("תמוז", 4),
    ("אב", 5),
    ("מנחם אב", 5),
    ("מנ\"א", 5),
    ("אלול", 6),
    ("תשרי", 7),
    ("חשון", 8),
    ("מרחשון", 8),
    ("כסלו", 9),
    ("טבת", 10),
    ("שבט", 11),
    (BARE_ADAR, ADAR),
    ("אדר א'", ADAR),
    ("אדר ב'", ADAR_II),
    ("אדר א׳", ADAR),
    ("אדר ב׳", ADAR_II),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthResolution {
    /// Canonical month, 1 (Nisan) through 12 (Adar).
    pub month: u8,
    pub leaf: Option<AdarPreference>,
}

/// True if any month alias occurs somewhere in `line`.
pub fn mentions_month(line: &str) -> bool {
    MONTH_ALIASES.iter().any(|(alias, _)| line.contains(alias))
}

/// Resolve the month named in `line`. The longest alias found as a substring
/// wins, so `אדר ב'` beats the bare `אדר` it contains.
pub fn resolve(line: &str) -> Option<MonthResolution> {
    let mut best: Option<(&str, u8)> = None;
    for &(alias, index) in MONTH_ALIASES {
        if !line.contains(alias) {
            continue;
        }
        let longer = best.map_or(true, |(b, _)| alias.chars().count() > b.chars().count());
        if longer {
            best = Some((alias, index));
        }
    }

    let (alias, index) = best?;
    let resolution = match index {
        ADAR | ADAR_II if alias == BARE_ADAR => MonthResolution { month: ADAR, leaf: None },
        ADAR => MonthResolution { month: ADAR, leaf: Some(AdarPreference::First) },
        ADAR_II => MonthResolution { month: ADAR, leaf: Some(AdarPreference::Second) },
        month => MonthResolution { month, leaf: None },
    };
    Some(resolution)
}
