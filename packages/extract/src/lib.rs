#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Label-delimited field extraction for Current & Pending support forms.
//!
//! The text of a C&P form is a flat list of lines in which every project
//! block repeats the same fixed labels in the same order. This crate walks
//! that list once with a [`machine::FieldMachine`], slices the text between
//! consecutive labels into field values, and turns each full label cycle
//! into a [`Project`].
//!
//! Which labels to look for, and which lines to drop or stop at, comes from
//! a [`revision::FormRevision`] supplied by the caller (see
//! [`registry`] for the embedded ones).

pub mod machine;
pub mod registry;
pub mod revision;

use cnp_support_models::{PersonMonthsError, Project};

use crate::machine::{FieldMachine, Phase, RawRecord, Step};
use crate::revision::{FormRevision, LabelSequence, LineRules};

/// Errors that can occur during extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// A record's person-months text did not split into year / month pairs.
    #[error("malformed person months in record {record}: {source}")]
    MalformedPersonMonths {
        /// Zero-based position of the record in the output.
        record: usize,
        /// The underlying parse failure.
        source: PersonMonthsError,
    },

    /// The stream ended with an incomplete record under
    /// [`FlushPolicy::Strict`].
    #[error("malformed record: trailing block has {found} of {expected} fields")]
    MalformedRecord {
        /// Fields collected for the trailing block.
        found: usize,
        /// Fields per complete record.
        expected: usize,
    },

    /// A form revision is structurally invalid or unknown.
    #[error("Invalid form revision: {0}")]
    Revision(String),

    /// A form revision document could not be parsed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A noise or stop pattern failed to compile.
    #[error("Invalid regex pattern: {0}")]
    Regex(#[from] regex::Error),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What to do with an incomplete block left over at the end of the stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlushPolicy {
    /// Emit it as a partial record (missing fields left empty).
    #[default]
    Lenient,
    /// Fail with [`ExtractError::MalformedRecord`].
    Strict,
}

/// Runs the field machine over `lines` with an explicit label sequence and
/// line rules.
///
/// Scanning stops at the first stop marker; lines after it are never
/// looked at.
///
/// # Errors
///
/// Returns [`ExtractError::MalformedRecord`] under [`FlushPolicy::Strict`]
/// if the stream ends part-way through a record.
pub fn extract_with<I, S, R>(
    lines: I,
    labels: &LabelSequence,
    rules: &R,
    policy: FlushPolicy,
) -> Result<Vec<RawRecord>, ExtractError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    R: LineRules + ?Sized,
{
    let mut machine = FieldMachine::new(labels, rules);
    let mut records = Vec::new();
    let mut scanned = 0_usize;

    for line in lines {
        scanned += 1;
        match machine.step(line.as_ref()) {
            Step::FieldCompleted(Some(record)) | Step::Stopped(Some(record)) => {
                records.push(record);
            }
            _ => {}
        }
        if machine.phase() == Phase::Halted {
            log::debug!("Stop marker reached after {scanned} lines");
            break;
        }
    }

    if let Some(record) = machine.finish(policy)? {
        records.push(record);
    }

    log::debug!("Extracted {} records from {scanned} lines", records.len());

    Ok(records)
}

/// Runs the field machine over `lines` using a form revision's labels and
/// line rules.
///
/// # Errors
///
/// See [`extract_with`].
pub fn extract<I, S>(
    lines: I,
    revision: &FormRevision,
    policy: FlushPolicy,
) -> Result<Vec<RawRecord>, ExtractError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    extract_with(lines, revision.labels(), revision, policy)
}

/// Extracts [`Project`]s from `lines`.
///
/// # Errors
///
/// * [`ExtractError::MalformedPersonMonths`] if a record's person-months
///   text does not pair up
/// * [`ExtractError::MalformedRecord`] as for [`extract_with`]
pub fn extract_projects<I, S>(
    lines: I,
    revision: &FormRevision,
    policy: FlushPolicy,
) -> Result<Vec<Project>, ExtractError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let records = extract(lines, revision, policy)?;

    let projects = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| build_project(revision, record, index))
        .collect::<Result<Vec<_>, _>>()?;

    log::info!(
        "Extracted {} project(s) using form revision '{}'",
        projects.len(),
        revision.id()
    );

    Ok(projects)
}

fn build_project(
    revision: &FormRevision,
    record: RawRecord,
    index: usize,
) -> Result<Project, ExtractError> {
    let partial = !record.complete;
    let fields = revision.keys().iter().copied().zip(record.fields);
    Project::from_fields(fields, partial)
        .map_err(|source| ExtractError::MalformedPersonMonths { record: index, source })
}

#[cfg(test)]
mod tests {
    use cnp_support_models::FieldKey;

    use super::*;
    use crate::revision::FnRules;

    fn doe() -> FormRevision {
        registry::find("doe_2023").unwrap()
    }

    /// One DOE project block, each label followed by the given value line.
    fn block(values: [&str; 11]) -> Vec<String> {
        doe()
            .labels()
            .iter()
            .zip(values)
            .flat_map(|(label, value)| [label.to_owned(), value.to_owned()])
            .collect()
    }

    fn widget_study() -> [&'static str; 11] {
        [
            "Widget Study",
            "current",
            "DE-SC0012345",
            "DOE Office of Science",
            "Upton, NY",
            "10/2022",
            "09/2025",
            "$ 450,000",
            "2023 1.00 2024 1.50",
            "Study widgets.",
            "None.",
        ]
    }

    #[test]
    fn extracts_single_project() {
        let lines = block(widget_study());
        let projects = extract_projects(&lines, &doe(), FlushPolicy::Strict).unwrap();

        assert_eq!(projects.len(), 1);
        let project = &projects[0];
        assert_eq!(project.title, "Widget Study");
        assert_eq!(project.status_of_support, "current");
        assert_eq!(project.award_number, "DE-SC0012345");
        assert_eq!(project.source_of_support, "DOE Office of Science");
        assert_eq!(project.place, "Upton, NY");
        assert_eq!(project.start_date, "10/2022");
        assert_eq!(project.end_date, "09/2025");
        assert_eq!(project.total_amount, "$ 450,000");
        assert_eq!(project.objective, "Study widgets.");
        assert_eq!(project.overlap, "None.");
        assert_eq!(project.year, vec![2023, 2024]);
        assert_eq!(project.person_month, vec![1.0, 1.5]);
        assert!(!project.partial);
    }

    #[test]
    fn extracts_consecutive_projects() {
        let mut lines = vec!["SCV C&P(O)S v.2023-1".to_owned(), "Name: Jane Doe".to_owned()];
        lines.extend(block(widget_study()));
        let mut second = widget_study();
        second[0] = "Gadget Survey";
        second[1] = "pending";
        lines.extend(block(second));
        lines.push("Certification:".to_owned());
        lines.push("*Project/Proposal Title:".to_owned());

        let projects = extract_projects(&lines, &doe(), FlushPolicy::Strict).unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].title, "Widget Study");
        assert_eq!(projects[1].title, "Gadget Survey");
        assert_eq!(projects[1].status_of_support, "pending");
    }

    #[test]
    fn record_count_matches_complete_cycles() {
        let mut lines = Vec::new();
        for _ in 0..4 {
            lines.extend(block(widget_study()));
        }
        let records = extract(&lines, &doe(), FlushPolicy::Strict).unwrap();
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.complete && r.fields.len() == 11));
    }

    #[test]
    fn recovers_multi_line_filler_without_noise() {
        let labels = LabelSequence::new(["Title:", "Goals:"]).unwrap();
        let rules = FnRules::new(
            |l: &str| l.starts_with("Page"),
            |l: &str| l.starts_with("Certification:"),
        );
        let lines = [
            "Title:",
            "A study of",
            "Page 1 of 2",
            "very small widgets",
            "Goals:",
            "Page 2 of 2",
            "Measure them.",
        ];

        let records = extract_with(lines, &labels, &rules, FlushPolicy::Strict).unwrap();
        assert_eq!(
            records,
            vec![RawRecord {
                fields: vec![
                    "A study of very small widgets".to_owned(),
                    "Measure them.".to_owned()
                ],
                complete: true,
            }]
        );
    }

    #[test]
    fn noise_never_reaches_field_values() {
        let mut lines = Vec::new();
        for (i, line) in block(widget_study()).into_iter().enumerate() {
            lines.push(line);
            lines.push(format!("Page {i} of 30"));
            lines.push("SCV C&P(O)S v.2023-1 (rev.01/31/2023)".to_owned());
        }

        let projects = extract_projects(&lines, &doe(), FlushPolicy::Strict).unwrap();
        assert_eq!(projects.len(), 1);
        for key in doe().keys() {
            let value = projects[0].field(*key);
            assert!(!value.contains("Page"), "{key}: {value}");
            assert!(!value.contains("SCV C&P"), "{key}: {value}");
        }
        assert_eq!(projects[0].title, "Widget Study");
    }

    #[test]
    fn stop_marker_truncates_and_nothing_after_is_scanned() {
        let mut lines = block(widget_study());
        lines.truncate(10);
        lines.push("Certification: I certify the above".to_owned());
        lines.extend(block(widget_study()));

        let records = extract(&lines, &doe(), FlushPolicy::Lenient).unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].complete);
        assert_eq!(records[0].fields.len(), 5);
        assert_eq!(records[0].fields[4], "Upton, NY");
    }

    #[test]
    fn stop_marker_under_strict_policy_rejects_partial() {
        let mut lines = block(widget_study());
        lines.truncate(4);
        lines.push("Certification:".to_owned());

        let err = extract(&lines, &doe(), FlushPolicy::Strict).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::MalformedRecord {
                found: 2,
                expected: 11
            }
        ));
    }

    #[test]
    fn lenient_partial_becomes_partial_project() {
        let mut lines = block(widget_study());
        lines.truncate(4);

        let projects = extract_projects(&lines, &doe(), FlushPolicy::Lenient).unwrap();
        assert_eq!(projects.len(), 1);
        assert!(projects[0].partial);
        assert_eq!(projects[0].title, "Widget Study");
        assert_eq!(projects[0].status_of_support, "current");
        assert!(projects[0].award_number.is_empty());
        assert!(projects[0].year.is_empty());
    }

    #[test]
    fn extraction_is_repeatable() {
        let mut lines = block(widget_study());
        lines.extend(block(widget_study()));
        let revision = doe();

        let first = extract_projects(&lines, &revision, FlushPolicy::Lenient).unwrap();
        let second = extract_projects(&lines, &revision, FlushPolicy::Lenient).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unpaired_person_months_names_the_record() {
        let mut bad = widget_study();
        bad[8] = "1 2.50 2";
        let mut lines = block(widget_study());
        lines.extend(block(bad));

        let err = extract_projects(&lines, &doe(), FlushPolicy::Strict).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedPersonMonths { record: 1, .. }));
    }

    #[test]
    fn empty_stream_yields_nothing() {
        let lines: Vec<String> = Vec::new();
        let projects = extract_projects(&lines, &doe(), FlushPolicy::Strict).unwrap();
        assert!(projects.is_empty());
    }

    #[test]
    fn person_months_keep_their_field_position() {
        let projects = extract_projects(block(widget_study()), &doe(), FlushPolicy::Strict).unwrap();
        assert_eq!(
            projects[0].field(FieldKey::PersonMonths),
            "2023 1.00 2024 1.50"
        );
    }
}
