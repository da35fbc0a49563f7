use regex::Regex;
use std::sync::LazyLock;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static LEADING_ARTICLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:the|a|an)\s+").expect("valid regex"));

/// Canonical comparison form of a label: lowercase, whitespace collapsed,
/// one leading article stripped, then punctuation removed.
///
/// Only used to compare labels; never stored as the item's name.
pub fn normalize_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let collapsed = WHITESPACE.replace_all(lowered.trim(), " ");
    let without_article = LEADING_ARTICLE.replace(&collapsed, "");
    NON_WORD.replace_all(&without_article, "").into_owned()
}

/// Absent labels normalize to the empty string.
pub fn normalize_opt(name: Option<&str>) -> String {
    name.map(normalize_name).unwrap_or_default()
}
