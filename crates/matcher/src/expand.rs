//! Lexical query expansion.
//!
//! A short job title like "software engineer" embeds poorly against long taxonomy descriptions.
//! Expansion adds a few alternative phrasings (synonyms of the first matching key) and the
//! individual words of multi-word queries; the ranker then keeps the best score per occupation.

use serde::{Deserialize, Serialize};

/// One synonym rule: when `key` occurs in the query, `synonyms` are added as variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymEntry {
    pub key: String,
    pub synonyms: Vec<String>,
}

impl SynonymEntry {
    pub fn new(key: &str, synonyms: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Ordered synonym rules. Lookup scans in declaration order and the first key contained in the
/// query wins, so more specific keys must come before more general ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymTable {
    entries: Vec<SynonymEntry>,
}

impl SynonymTable {
    /// Builds a table; keys are lowercased so lookups are case-insensitive.
    pub fn new(entries: impl IntoIterator<Item = SynonymEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| SynonymEntry {
                key: entry.key.to_lowercase(),
                synonyms: entry.synonyms,
            })
            .filter(|entry| !entry.key.is_empty())
            .collect();
        Self { entries }
    }

    /// Synonyms of the first key that is a substring of `query_lower`.
    pub fn lookup(&self, query_lower: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|entry| query_lower.contains(entry.key.as_str()))
            .map(|entry| entry.synonyms.as_slice())
    }

    pub fn entries(&self) -> &[SynonymEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::new([
            SynonymEntry::new(
                "software engineer",
                &[
                    "programmer",
                    "developer",
                    "software developer",
                    "coder",
                    "software architect",
                ],
            ),
            SynonymEntry::new(
                "nurse",
                &[
                    "nursing",
                    "healthcare worker",
                    "medical nurse",
                    "registered nurse",
                    "healthcare professional",
                ],
            ),
            SynonymEntry::new(
                "teacher",
                &["educator", "instructor", "professor", "academic", "tutor", "lecturer"],
            ),
            SynonymEntry::new(
                "accountant",
                &[
                    "accounting",
                    "bookkeeper",
                    "financial analyst",
                    "auditor",
                    "tax professional",
                ],
            ),
            SynonymEntry::new(
                "chef",
                &["cook", "culinary professional", "kitchen staff", "food preparation"],
            ),
            SynonymEntry::new(
                "electrician",
                &[
                    "electrical technician",
                    "electrical worker",
                    "electrical installer",
                ],
            ),
            SynonymEntry::new(
                "mechanic",
                &[
                    "automotive technician",
                    "repair technician",
                    "maintenance worker",
                ],
            ),
            SynonymEntry::new(
                "doctor",
                &[
                    "physician",
                    "medical doctor",
                    "healthcare provider",
                    "medical professional",
                ],
            ),
            SynonymEntry::new(
                "lawyer",
                &["attorney", "legal professional", "advocate", "counsel"],
            ),
            SynonymEntry::new(
                "manager",
                &["supervisor", "administrator", "executive", "team leader"],
            ),
        ])
    }
}

/// Turns one query into the list of variants that get embedded.
#[derive(Debug, Clone)]
pub struct QueryExpander {
    table: SynonymTable,
    enabled: bool,
}

impl Default for QueryExpander {
    fn default() -> Self {
        Self::new(SynonymTable::default())
    }
}

impl QueryExpander {
    pub fn new(table: SynonymTable) -> Self {
        Self {
            table,
            enabled: true,
        }
    }

    /// Expander that only ever returns the query itself.
    pub fn disabled() -> Self {
        Self {
            table: SynonymTable::new([]),
            enabled: false,
        }
    }

    pub fn table(&self) -> &SynonymTable {
        &self.table
    }

    /// Variants for `query`, never empty. The first element is always `query` verbatim,
    /// followed by synonyms of the first matching key and then, for multi-word queries,
    /// every lowercased word. Duplicates are kept.
    pub fn expand(&self, query: &str) -> Vec<String> {
        let mut variants = vec![query.to_string()];
        if !self.enabled {
            return variants;
        }

        let lowered = query.to_lowercase();
        if let Some(synonyms) = self.table.lookup(&lowered) {
            variants.extend(synonyms.iter().cloned());
        }

        let words: Vec<&str> = lowered.split_whitespace().collect();
        if words.len() > 1 {
            variants.extend(words.into_iter().map(str::to_string));
        }
        variants
    }
}
