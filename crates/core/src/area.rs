//! Area name normalization applied to the upstream customer dimension.

use std::collections::HashSet;

/// Title-case a name: the first letter after any non-letter is uppercased,
/// every other letter lowercased ("south-east zone" -> "South-East Zone").
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;

    for ch in name.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }

    out
}

/// Trim, title-case and deduplicate raw area names, keeping first-seen order.
/// Blank entries are dropped.
pub fn normalize_areas<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    raw.into_iter()
        .filter_map(|area| {
            let trimmed = area.as_ref().trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(title_case(trimmed))
            }
        })
        .filter(|area| seen.insert(area.clone()))
        .collect()
}
