//! Form revisions: the label sequence plus the noise / stop line rules.
//!
//! Label text changes with every C&P form revision, so none of it is
//! hardcoded in the extractor. A [`FormRevision`] is loaded from TOML
//! (see `revisions/` for the embedded ones) and handed to
//! [`crate::extract`] at call time.

use std::collections::BTreeSet;
use std::path::Path;

use cnp_support_models::FieldKey;
use regex::RegexSet;
use serde::Deserialize;

use crate::ExtractError;

/// Classifies lines met while a field is being consumed.
pub trait LineRules {
    /// Boilerplate (running headers, page footers) dropped from field text.
    fn is_noise(&self, line: &str) -> bool;

    /// Marks the end of the listing; nothing after it is scanned.
    fn is_stop(&self, line: &str) -> bool;
}

/// [`LineRules`] backed by a pair of closures.
pub struct FnRules<N, S> {
    noise: N,
    stop: S,
}

impl<N, S> FnRules<N, S>
where
    N: Fn(&str) -> bool,
    S: Fn(&str) -> bool,
{
    /// Creates rules from a noise predicate and a stop predicate.
    pub const fn new(noise: N, stop: S) -> Self {
        Self { noise, stop }
    }
}

impl<N, S> LineRules for FnRules<N, S>
where
    N: Fn(&str) -> bool,
    S: Fn(&str) -> bool,
{
    fn is_noise(&self, line: &str) -> bool {
        (self.noise)(line)
    }

    fn is_stop(&self, line: &str) -> bool {
        (self.stop)(line)
    }
}

/// Ordered, exact-match field labels.
///
/// Field `i` runs from label `i` up to label `(i + 1) % len`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSequence {
    labels: Vec<String>,
}

impl LabelSequence {
    /// Creates a label sequence.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Revision`] if `labels` is empty.
    pub fn new<I, S>(labels: I) -> Result<Self, ExtractError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(ExtractError::Revision(
                "label sequence must not be empty".to_owned(),
            ));
        }
        Ok(Self { labels })
    }

    /// Label at `index`, wrapping around the end of the sequence.
    #[must_use]
    pub fn label(&self, index: usize) -> &str {
        &self.labels[index % self.labels.len()]
    }

    /// Number of labels (fields per record).
    #[must_use]
    pub const fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always `false`; construction rejects empty sequences.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterates the labels in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

// ── TOML shape ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RevisionDef {
    id: String,
    name: String,
    fields: Vec<FieldDef>,
    #[serde(default)]
    noise_patterns: Vec<String>,
    #[serde(default)]
    stop_patterns: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FieldDef {
    key: FieldKey,
    label: String,
}

// ── Compiled revision ────────────────────────────────────────────────────

/// A form revision ready for extraction.
#[derive(Debug, Clone)]
pub struct FormRevision {
    id: String,
    name: String,
    keys: Vec<FieldKey>,
    labels: LabelSequence,
    noise: RegexSet,
    stop: RegexSet,
}

impl FormRevision {
    /// Parses and validates a revision from TOML text.
    ///
    /// # Errors
    ///
    /// * [`ExtractError::Toml`] if the document is not valid TOML for a
    ///   revision
    /// * [`ExtractError::Revision`] if it has no fields or repeats a key or
    ///   label
    /// * [`ExtractError::Regex`] if a noise or stop pattern does not compile
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractError> {
        let def: RevisionDef = toml::from_str(toml_str)?;
        Self::from_def(def)
    }

    /// Reads a revision from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Io`] if the file cannot be read, otherwise
    /// the same errors as [`FormRevision::from_toml`].
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let text = std::fs::read_to_string(path)?;
        let revision = Self::from_toml(&text)?;
        log::debug!(
            "Loaded form revision '{}' from {}",
            revision.id,
            path.display()
        );
        Ok(revision)
    }

    fn from_def(def: RevisionDef) -> Result<Self, ExtractError> {
        let mut seen_keys = BTreeSet::new();
        let mut seen_labels = BTreeSet::new();
        for field in &def.fields {
            if !seen_keys.insert(field.key) {
                return Err(ExtractError::Revision(format!(
                    "{}: field '{}' is mapped more than once",
                    def.id, field.key
                )));
            }
            if !seen_labels.insert(field.label.as_str()) {
                return Err(ExtractError::Revision(format!(
                    "{}: label '{}' appears more than once",
                    def.id, field.label
                )));
            }
        }

        let keys = def.fields.iter().map(|f| f.key).collect();
        let labels = LabelSequence::new(def.fields.into_iter().map(|f| f.label))
            .map_err(|e| ExtractError::Revision(format!("{}: {e}", def.id)))?;

        Ok(Self {
            id: def.id,
            name: def.name,
            keys,
            labels,
            noise: RegexSet::new(&def.noise_patterns)?,
            stop: RegexSet::new(&def.stop_patterns)?,
        })
    }

    /// Short identifier (e.g. `"doe_2023"`).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable revision name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The ordered labels.
    #[must_use]
    pub const fn labels(&self) -> &LabelSequence {
        &self.labels
    }

    /// The [`FieldKey`] filled by each label, in label order.
    #[must_use]
    pub fn keys(&self) -> &[FieldKey] {
        &self.keys
    }
}

impl LineRules for FormRevision {
    fn is_noise(&self, line: &str) -> bool {
        self.noise.is_match(line)
    }

    fn is_stop(&self, line: &str) -> bool {
        self.stop.is_match(line)
    }
}
