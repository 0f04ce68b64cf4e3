//! Concept database: the name → concept index the dictionary engine searches.
//!
//! The on-disk format is JSON:
//!
//! ```json
//! {
//!   "concepts": [
//!     { "cui": "C0004057", "pretty_name": "Aspirin",
//!       "names": ["aspirin", "acetylsalicylic acid"], "type_ids": ["T121"] }
//!   ],
//!   "type_names": { "T121": "Pharmacologic Substance" }
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::EngineError;

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{L}\p{N}]+").expect("token pattern should compile")
});

/// A word token with both byte and character offsets into its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    pub text: &'a str,
    pub byte_start: usize,
    pub byte_end: usize,
    pub char_start: usize,
    pub char_end: usize,
}

/// Split text into alphanumeric tokens.
pub(crate) fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut byte_cursor = 0;
    let mut char_cursor = 0;

    for m in TOKEN_PATTERN.find_iter(text) {
        char_cursor += text[byte_cursor..m.start()].chars().count();
        let char_len = m.as_str().chars().count();
        tokens.push(Token {
            text: m.as_str(),
            byte_start: m.start(),
            byte_end: m.end(),
            char_start: char_cursor,
            char_end: char_cursor + char_len,
        });
        char_cursor += char_len;
        byte_cursor = m.end();
    }

    tokens
}

/// Normalize a concept name for lookup: lowercase tokens joined by a space.
pub(crate) fn normalize_name(name: &str) -> String {
    tokenize(name)
        .iter()
        .map(|t| t.text.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A concept entry as stored in the database file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub cui: String,
    pub pretty_name: String,
    /// Surface forms; `pretty_name` is always indexed in addition to these.
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub type_ids: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ConceptFile {
    #[serde(default)]
    concepts: Vec<Concept>,
    #[serde(default)]
    type_names: HashMap<String, String>,
}

/// Indexed concept database.
#[derive(Debug, Clone)]
pub struct ConceptDatabase {
    concepts: Vec<Concept>,
    type_names: HashMap<String, String>,
    /// Normalized name -> concept positions, sorted by CUI.
    name_index: HashMap<String, Vec<usize>>,
    max_name_tokens: usize,
}

impl ConceptDatabase {
    /// Build and index a database. Fails if there are no concepts.
    pub fn new(
        concepts: Vec<Concept>,
        type_names: HashMap<String, String>,
    ) -> Result<Self, EngineError> {
        if concepts.is_empty() {
            return Err(EngineError::EmptyDatabase);
        }

        let mut name_index: HashMap<String, Vec<usize>> = HashMap::new();
        let mut max_name_tokens = 0;

        for (position, concept) in concepts.iter().enumerate() {
            let surface_forms = std::iter::once(&concept.pretty_name).chain(concept.names.iter());
            for name in surface_forms {
                let normalized = normalize_name(name);
                if normalized.is_empty() {
                    continue;
                }
                max_name_tokens = max_name_tokens.max(normalized.split(' ').count());
                name_index.entry(normalized).or_default().push(position);
            }
        }

        for positions in name_index.values_mut() {
            positions.sort_by(|a, b| concepts[*a].cui.cmp(&concepts[*b].cui).then(a.cmp(b)));
            positions.dedup();
        }

        Ok(Self {
            concepts,
            type_names,
            name_index,
            max_name_tokens,
        })
    }

    /// Parse a database from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let file: ConceptFile = serde_json::from_str(json)?;
        Self::new(file.concepts, file.type_names)
    }

    /// Load a database file from disk.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let contents = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Read a CUI filter file: one CUI per line, blank lines ignored.
    pub fn load_cui_filter(path: &Path) -> Result<HashSet<String>, EngineError> {
        let contents = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Keep only the concepts whose CUI is listed in `cuis`.
    pub fn filter_by_cui(self, cuis: &HashSet<String>) -> Result<Self, EngineError> {
        let concepts = self
            .concepts
            .into_iter()
            .filter(|c| cuis.contains(&c.cui))
            .collect();
        Self::new(concepts, self.type_names)
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Number of tokens in the longest indexed name.
    pub fn max_name_tokens(&self) -> usize {
        self.max_name_tokens
    }

    /// Concepts sharing a normalized name, lowest CUI first.
    pub fn lookup(&self, normalized_name: &str) -> Option<Vec<&Concept>> {
        self.name_index
            .get(normalized_name)
            .map(|positions| positions.iter().map(|p| &self.concepts[*p]).collect())
    }

    /// Human-readable name of a semantic type, falling back to its id.
    pub fn type_name<'a>(&'a self, type_id: &'a str) -> &'a str {
        self.type_names
            .get(type_id)
            .map(String::as_str)
            .unwrap_or(type_id)
    }
}
