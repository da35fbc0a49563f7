//! Edit-distance similarity between labels.

use crate::normalizer::normalize_name;

/// Long forms folded onto the abbreviation extractors and annotators
/// commonly use instead.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("corporation", "corp"),
    ("incorporated", "inc"),
    ("company", "co"),
    ("limited", "ltd"),
    ("international", "intl"),
    ("department", "dept"),
    ("university", "univ"),
];

/// Similarity of two labels in `[0, 1]`.
///
/// Empty input scores 0. Labels equal after normalization score 1. Otherwise
/// the score is `1 - levenshtein / max_len` over the normalized labels, or over
/// their abbreviation-folded forms when that is higher.
pub fn calculate_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a = normalize_name(a);
    let b = normalize_name(b);
    if a == b {
        return 1.0;
    }

    let raw = edit_ratio(&a, &b);
    let (folded_a, folded_b) = (fold_abbreviations(&a), fold_abbreviations(&b));
    if folded_a == a && folded_b == b {
        return raw;
    }
    raw.max(edit_ratio(&folded_a, &folded_b))
}

/// `1 - levenshtein(a, b) / max(len(a), len(b))`, lengths in chars.
/// Two empty strings are identical.
pub fn edit_ratio(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

/// Levenshtein distance over Unicode scalar values, one rolling row sized by
/// the shorter input.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (long, short) = if a.len() >= b.len() { (&a, &b) } else { (&b, &a) };

    if short.is_empty() {
        return long.len();
    }

    let mut row: Vec<usize> = (0..=short.len()).collect();
    for (i, lc) in long.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, sc) in short.iter().enumerate() {
            let above = row[j + 1];
            let substitution = diagonal + usize::from(lc != sc);
            row[j + 1] = substitution.min(above + 1).min(row[j] + 1);
            diagonal = above;
        }
    }

    row[short.len()]
}

fn fold_abbreviations(normalized: &str) -> String {
    normalized
        .split(' ')
        .map(|token| {
            ABBREVIATIONS
                .iter()
                .find(|(long, _)| *long == token)
                .map(|(_, short)| *short)
                .unwrap_or(token)
        })
        .collect::<Vec<_>>()
        .join(" ")
}
