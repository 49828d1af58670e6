#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! NIH-format "Other Support" output for extracted C&P projects.
//!
//! [`NihDocument::from_projects`] lays projects out the way the NIH form
//! (OMB No. 0925-0001/0002, Rev. 12/2020) expects: an ACTIVE section for
//! `current` support and a PENDING section for `pending` support, each
//! project as `label: value` paragraphs followed by a person-months table.
//! [`docx::write_docx`] serializes the layout as a `.docx` package.

pub mod docx;

use std::path::{Path, PathBuf};

use cnp_support_models::{Project, SupportStatus};

/// Placeholder for the PD/PI name, which the DOE form does not carry.
pub const PI_PLACEHOLDER: &str = "TODO";

/// Caption printed above each person-months table.
pub const PERSON_MONTHS_CAPTION: &str =
    "*Person Months (Calendar/Academic/Summer) per budget period.";

/// Errors that can occur while producing NIH output.
#[derive(Debug, thiserror::Error)]
pub enum NihError {
    /// A project's status of support is neither `current` nor `pending`.
    #[error("invalid status of support '{status}' for project '{title}'")]
    InvalidStatus {
        /// Title of the offending project.
        title: String,
        /// Status text as extracted.
        status: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing the `.docx` package failed.
    #[error("docx packaging error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Maps a project onto the NIH field labels, in NIH order.
#[must_use]
pub fn to_nih_format(project: &Project) -> Vec<(&'static str, String)> {
    vec![
        ("*Title", project.title.clone()),
        ("*Major Goals", project.objective.clone()),
        ("*Status of Support", project.status_of_support.clone()),
        ("Project Number", project.award_number.clone()),
        ("Name of PD/PI", PI_PLACEHOLDER.to_owned()),
        ("*Source of Support", project.source_of_support.clone()),
        ("*Primary Place of Performance", project.place.clone()),
        (
            "Project/Proposal Start and End Date: (MM/YYYY) (if available)",
            format!("{} -- {}", project.start_date, project.end_date),
        ),
        (
            "*Total Award Amount (including Indirect Costs)",
            project.total_amount.clone(),
        ),
    ]
}

/// Splits projects into `(active, pending)`, keeping their order.
///
/// # Errors
///
/// Returns [`NihError::InvalidStatus`] for the first project whose status
/// is not exactly `current` or `pending`.
pub fn split_by_status(projects: &[Project]) -> Result<(Vec<&Project>, Vec<&Project>), NihError> {
    let mut active = Vec::new();
    let mut pending = Vec::new();

    for project in projects {
        match project.status() {
            Some(SupportStatus::Current) => active.push(project),
            Some(SupportStatus::Pending) => pending.push(project),
            None => {
                return Err(NihError::InvalidStatus {
                    title: project.title.clone(),
                    status: project.status_of_support.clone(),
                });
            }
        }
    }

    Ok((active, pending))
}

/// One two-column person-months table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonMonthsTable {
    /// Cell text, one `(year, person-months)` pair per row, header first.
    pub rows: Vec<(String, String)>,
}

impl PersonMonthsTable {
    /// Header row text.
    pub const HEADER: (&'static str, &'static str) = ("Year(YYYY)", "Person Months (##.##)");

    /// Builds the table for `project`: rows `"1. 2023"` / `"1.00 calendar"`.
    #[must_use]
    pub fn for_project(project: &Project) -> Self {
        let mut rows = vec![(Self::HEADER.0.to_owned(), Self::HEADER.1.to_owned())];
        rows.extend(
            project
                .person_month_pairs()
                .enumerate()
                .map(|(i, (year, months))| {
                    (format!("{}. {year}", i + 1), format!("{months:.2} calendar"))
                }),
        );
        Self { rows }
    }
}

/// A block of document content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// A paragraph of plain text (empty for spacing).
    Paragraph(String),
    /// A person-months table.
    Table(PersonMonthsTable),
}

/// The NIH document layout, independent of the file format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NihDocument {
    blocks: Vec<Block>,
}

impl NihDocument {
    /// Lays out `projects` into ACTIVE and PENDING sections.
    ///
    /// # Errors
    ///
    /// Returns [`NihError::InvalidStatus`] if a project is neither current
    /// nor pending.
    pub fn from_projects(projects: &[Project]) -> Result<Self, NihError> {
        let (active, pending) = split_by_status(projects)?;

        log::debug!(
            "Laying out NIH document: {} active, {} pending",
            active.len(),
            pending.len()
        );

        let mut doc = Self::default();
        doc.push_section("ACTIVE", &active);
        doc.push_section("PENDING", &pending);
        Ok(doc)
    }

    fn push_section(&mut self, heading: &str, projects: &[&Project]) {
        self.paragraph(heading);
        for project in projects {
            self.paragraph("");
            for (label, value) in to_nih_format(project) {
                self.paragraph(format!("{label}: {value}"));
            }
            self.paragraph(PERSON_MONTHS_CAPTION);
            self.blocks
                .push(Block::Table(PersonMonthsTable::for_project(project)));
            self.paragraph("  ");
        }
    }

    fn paragraph(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Paragraph(text.into()));
    }

    /// The content blocks in document order.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Writes the document as a `.docx` file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`NihError::Io`] or [`NihError::Zip`] if the file cannot be
    /// written.
    pub fn save(&self, path: &Path) -> Result<(), NihError> {
        let file = std::fs::File::create(path)?;
        docx::write_docx(self, file)?;
        log::info!("Wrote NIH document to {}", path.display());
        Ok(())
    }
}

/// Default output path for the NIH document: `NIH_<input stem>.docx` in
/// the working directory.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "output".into(), |s| s.to_string_lossy());
    PathBuf::from(format!("NIH_{stem}.docx"))
}
