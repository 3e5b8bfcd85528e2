//! Stable short identifiers for object names unfit as storage keys.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex_lite::Regex;

use crate::types::LongObjectNamesIndex;

/// Separator between the sanitized prefix and the counter of a short name.
///
/// Never produced by an as-is name, so short names cannot collide with them.
const COUNTER_SEPARATOR: char = '~';

/// Room reserved for the separator and the counter digits.
const COUNTER_RESERVE: usize = 11;

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid literal regex"))
}

/// Bidirectional table between raw object names and storage identifiers.
///
/// Grows monotonically; an identifier, once assigned, is reused for the
/// rest of the build.
#[derive(Debug, Clone)]
pub struct LongObjectNamesResolver {
    max_length: usize,
    short_by_name: BTreeMap<String, String>,
    name_by_short: BTreeMap<String, String>,
    next_id: usize,
}

impl LongObjectNamesResolver {
    /// Create an empty resolver.
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length: max_length.max(1),
            short_by_name: BTreeMap::new(),
            name_by_short: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Rebuild a resolver from its persisted table.
    pub fn from_index(index: &LongObjectNamesIndex, max_length: usize) -> Self {
        let mut resolver = Self::new(max_length);
        for (short, name) in &index.names {
            resolver.short_by_name.insert(name.clone(), short.clone());
            resolver.name_by_short.insert(short.clone(), name.clone());
        }
        resolver.next_id = index.names.len() + 1;
        resolver
    }

    /// Whether a name can be used as a storage key unchanged.
    pub fn is_safe(&self, name: &str) -> bool {
        !name.is_empty()
            && name.chars().count() <= self.max_length
            && !unsafe_chars().is_match(name)
    }

    /// Storage identifier for `name`, assigning a new one on first sight.
    pub fn resolve(&mut self, name: &str) -> String {
        if self.is_safe(name) {
            return name.to_string();
        }
        if let Some(short) = self.short_by_name.get(name) {
            return short.clone();
        }

        let sanitized = unsafe_chars().replace_all(name, "_");
        let prefix_len = self.max_length.saturating_sub(COUNTER_RESERVE).max(1);
        let mut prefix: String = sanitized.chars().take(prefix_len).collect();
        if prefix.is_empty() {
            prefix.push_str("object");
        }
        let short = format!("{prefix}{COUNTER_SEPARATOR}{}", self.next_id);
        self.next_id += 1;

        self.short_by_name.insert(name.to_string(), short.clone());
        self.name_by_short.insert(short.clone(), name.to_string());
        short
    }

    /// Identifier already assigned to `name`, if any.
    pub fn short_name(&self, name: &str) -> Option<&str> {
        self.short_by_name.get(name).map(String::as_str)
    }

    /// Raw name behind an identifier. As-is names resolve to themselves.
    pub fn original_name<'a>(&'a self, short: &'a str) -> &'a str {
        self.name_by_short.get(short).map(String::as_str).unwrap_or(short)
    }

    /// Number of substituted names.
    pub fn len(&self) -> usize {
        self.name_by_short.len()
    }

    /// Whether no name has been substituted.
    pub fn is_empty(&self) -> bool {
        self.name_by_short.is_empty()
    }

    /// Persistable form of the table.
    pub fn to_index(&self) -> LongObjectNamesIndex {
        LongObjectNamesIndex {
            names: self.name_by_short.clone(),
        }
    }
}
