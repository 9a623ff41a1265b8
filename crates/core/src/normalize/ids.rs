use std::collections::{HashMap, HashSet};

/// Maximum length of a step/decision/unit id.
pub const MAX_ID_LEN: usize = 32;

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// True when `id` is 1..=32 chars of `[A-Za-z0-9_-]`.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= MAX_ID_LEN && id.chars().all(is_id_char)
}

/// Normalize a raw id: invalid characters become `_`, the result is cut to
/// [`MAX_ID_LEN`], and an empty input is replaced by `fallback`.
///
/// Idempotent: a valid id is returned unchanged.
pub fn normalize_id(raw: &str, fallback: &str) -> String {
    let source = if raw.is_empty() { fallback } else { raw };
    let id: String = source
        .chars()
        .map(|c| if is_id_char(c) { c } else { '_' })
        .take(MAX_ID_LEN)
        .collect();
    if id.is_empty() {
        // Only reachable with an empty fallback.
        "id".to_string()
    } else {
        id
    }
}

/// Per-unit id namespace shared by steps and decisions.
///
/// Tracks every id handed out and a rename map from each original raw id to
/// its final id, so decision paths can be rewritten after renumbering. One
/// registry is built per unit and dropped once the unit is finalized.
#[derive(Debug, Default)]
pub struct IdRegistry {
    used: HashSet<String>,
    renames: HashMap<String, String>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize `raw`, de-duplicate it with `_2`, `_3`, ... suffixes and
    /// remember the mapping. When a raw id repeats, the latest occurrence
    /// takes over the mapping.
    pub fn register(&mut self, raw: &str, fallback: &str) -> String {
        let base = normalize_id(raw, fallback);
        let id = self.unique(&base);
        self.used.insert(id.clone());
        self.renames.insert(raw.to_string(), id.clone());
        id
    }

    /// Rewrite a path reference: known raw ids map to their final id, anything
    /// else (forward or dangling references) is normalized in place.
    pub fn resolve(&self, raw: &str) -> String {
        match self.renames.get(raw) {
            Some(id) => id.clone(),
            None => normalize_id(raw, "s1"),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.used.contains(id)
    }

    fn unique(&self, base: &str) -> String {
        if !self.used.contains(base) {
            return base.to_string();
        }
        let mut k = 2usize;
        loop {
            let suffix = format!("_{k}");
            let keep = MAX_ID_LEN.saturating_sub(suffix.len());
            let candidate: String = base.chars().take(keep).chain(suffix.chars()).collect();
            if !self.used.contains(&candidate) {
                return candidate;
            }
            k += 1;
        }
    }
}
