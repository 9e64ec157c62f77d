//! Token discovery in the configuration store

use regex::Regex;
use std::sync::OnceLock;

static PAT_KEY_REGEX: OnceLock<Regex> = OnceLock::new();

/// `PAT_` followed by optional ASCII digits, anchored at the end only.
fn pat_key_regex() -> &'static Regex {
    PAT_KEY_REGEX.get_or_init(|| Regex::new(r"PAT_[0-9]*$").expect("PAT key regex is valid"))
}

/// Whether a configuration key names a pool member (`PAT_`, `PAT_1`, `PAT_23`).
pub fn is_pat_key(key: &str) -> bool {
    pat_key_regex().is_match(key)
}

/// Return the keys that name pool members, in input order.
pub fn locate_pats<I, K>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
{
    keys.into_iter()
        .filter(|key| is_pat_key(key.as_ref()))
        .map(|key| key.as_ref().to_string())
        .collect()
}
