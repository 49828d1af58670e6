//! Form revision registry — revisions embedded from `revisions/*.toml`.
//!
//! Each TOML file is baked into the binary at compile time via
//! [`include_str!`]. Supporting a new form revision means adding a TOML
//! file and listing it below.

use crate::ExtractError;
use crate::revision::FormRevision;

/// Revision used when the caller does not pick one.
pub const DEFAULT_REVISION: &str = "doe_2023";

/// TOML configs embedded at compile time.
const REVISION_TOMLS: &[(&str, &str)] = &[(
    "doe_2023",
    include_str!("../revisions/doe_2023.toml"),
)];

/// Returns every embedded form revision.
///
/// # Panics
///
/// Panics if an embedded TOML config is malformed (a build-time mistake,
/// covered by the tests below).
#[must_use]
pub fn all_revisions() -> Vec<FormRevision> {
    REVISION_TOMLS
        .iter()
        .map(|(name, toml)| {
            FormRevision::from_toml(toml)
                .unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Looks up an embedded revision by id.
///
/// # Errors
///
/// Returns [`ExtractError::Revision`] if no embedded revision has that id.
pub fn find(id: &str) -> Result<FormRevision, ExtractError> {
    all_revisions()
        .into_iter()
        .find(|r| r.id() == id)
        .ok_or_else(|| ExtractError::Revision(format!("unknown form revision: {id}")))
}
