use crate::survey::domain::SUBJECT_ORDER;

/// Short codes that appear in hand-maintained catalog sheets.
const ABBREVIATIONS: [(&str, &str); 3] = [
    ("bio", "biology"),
    ("earth", "earth-science"),
    ("soc", "social-studies"),
];

/// Trim, lowercase, expand short codes, and admit only subjects from the
/// canonical list. Returns `None` for anything else.
pub(crate) fn canonical_subject(raw: &str) -> Option<String> {
    let token = raw.trim().to_ascii_lowercase();
    if token.is_empty() {
        return None;
    }

    let expanded = ABBREVIATIONS
        .iter()
        .find(|(short, _)| *short == token)
        .map(|(_, full)| *full)
        .unwrap_or(token.as_str());

    SUBJECT_ORDER
        .iter()
        .find(|subject| **subject == expanded)
        .map(|subject| (*subject).to_string())
}

#[cfg(test)]
pub(crate) fn canonical_for_tests(raw: &str) -> Option<String> {
    canonical_subject(raw)
}
