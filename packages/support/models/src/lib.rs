#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record types for "Current & Pending Support" project listings.
//!
//! A C&P form lists one block of labelled fields per project. The extractor
//! in `cnp_extract` slices those blocks into `(FieldKey, String)` pairs and
//! hands them to [`Project::from_fields`], which also derives the per-year
//! person-month commitments via [`PersonMonths::parse`].

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Identifies which [`Project`] field a form label fills.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldKey {
    /// Project/proposal title
    Title,
    /// `current` or `pending`
    StatusOfSupport,
    /// Proposal or award number
    AwardNumber,
    /// Funding agency
    SourceOfSupport,
    /// Primary place of performance
    Place,
    /// Support start date (MM/YYYY)
    StartDate,
    /// Support end date (MM/YYYY)
    EndDate,
    /// Total award amount, verbatim
    TotalAmount,
    /// Raw person-months text (year / months pairs)
    PersonMonths,
    /// Overall objectives
    Objective,
    /// Statement of potential overlap
    Overlap,
}

/// Status of support as printed on the form.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SupportStatus {
    /// Active award
    Current,
    /// Submitted proposal
    Pending,
}

/// Errors produced while deriving the year / person-month sequences.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersonMonthsError {
    /// The numeric tokens did not pair up into `(year, months)` entries.
    #[error("unpaired person-month tokens in '{text}': {years} year(s) but {months} month value(s)")]
    Unpaired {
        /// Field text the tokens came from.
        text: String,
        /// Number of year tokens.
        years: usize,
        /// Number of person-month tokens.
        months: usize,
    },

    /// A year token was not an integer.
    #[error("invalid year '{token}' in '{text}'")]
    InvalidYear {
        /// Field text the token came from.
        text: String,
        /// Offending token.
        token: String,
    },

    /// A person-month token was not a number.
    #[error("invalid person-month value '{token}' in '{text}'")]
    InvalidMonths {
        /// Field text the token came from.
        text: String,
        /// Offending token.
        token: String,
    },
}

/// Person-months committed per budget period.
///
/// `years[i]` pairs with `months[i]`; both vectors always have the same
/// length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonMonths {
    years: Vec<i32>,
    months: Vec<f64>,
}

impl PersonMonths {
    /// Parses the person-months field text.
    ///
    /// The text is split on single spaces and only tokens starting with an
    /// ASCII digit are kept. Even positions are years, odd positions are
    /// person-month values, e.g. `"1 2.50 2 1.75"` gives years `[1, 2]`
    /// and months `[2.5, 1.75]`.
    ///
    /// # Errors
    ///
    /// * [`PersonMonthsError::Unpaired`] if the token count is odd
    /// * [`PersonMonthsError::InvalidYear`] / [`PersonMonthsError::InvalidMonths`]
    ///   if a token does not parse
    pub fn parse(text: &str) -> Result<Self, PersonMonthsError> {
        let tokens: Vec<&str> = text
            .split(' ')
            .filter(|t| t.starts_with(|c: char| c.is_ascii_digit()))
            .collect();

        let year_tokens = tokens.iter().step_by(2);
        let month_tokens = tokens.iter().skip(1).step_by(2);

        let year_count = year_tokens.len();
        let month_count = month_tokens.len();
        if year_count != month_count {
            return Err(PersonMonthsError::Unpaired {
                text: text.to_owned(),
                years: year_count,
                months: month_count,
            });
        }

        let years = year_tokens
            .map(|t| {
                t.parse::<i32>().map_err(|_| PersonMonthsError::InvalidYear {
                    text: text.to_owned(),
                    token: (*t).to_owned(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let months = month_tokens
            .map(|t| {
                t.parse::<f64>()
                    .map_err(|_| PersonMonthsError::InvalidMonths {
                        text: text.to_owned(),
                        token: (*t).to_owned(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { years, months })
    }

    /// Budget-period years.
    #[must_use]
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Person-months committed in the matching year.
    #[must_use]
    pub fn months(&self) -> &[f64] {
        &self.months
    }

    /// Iterates `(year, months)` pairs in form order.
    pub fn pairs(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.years.iter().copied().zip(self.months.iter().copied())
    }

    /// Number of budget periods.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.years.len()
    }

    /// Returns `true` when no budget periods were listed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

/// One project block from a C&P form.
///
/// Text fields are kept verbatim (after whitespace normalization by the
/// extractor). `year` and `person_month` are derived from
/// [`Project::person_months`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Project/proposal title.
    pub title: String,
    /// Status of support (`current` / `pending`).
    pub status_of_support: String,
    /// Proposal or award number.
    pub award_number: String,
    /// Funding agency.
    pub source_of_support: String,
    /// Primary place of performance.
    pub place: String,
    /// Support start date (MM/YYYY).
    pub start_date: String,
    /// Support end date (MM/YYYY).
    pub end_date: String,
    /// Total award amount as printed (e.g. `"$ 120,000"`).
    pub total_amount: String,
    /// Raw person-months text.
    pub person_months: String,
    /// Overall objectives.
    pub objective: String,
    /// Statement of potential overlap.
    pub overlap: String,
    /// Budget-period years derived from `person_months`.
    pub year: Vec<i32>,
    /// Person-months per year derived from `person_months`.
    pub person_month: Vec<f64>,
    /// Set when the project was built from an incomplete trailing block.
    #[serde(default)]
    pub partial: bool,
}

impl Project {
    /// Builds a project from extracted field values.
    ///
    /// Fields not present in `fields` stay empty; this only happens for a
    /// `partial` project.
    ///
    /// # Errors
    ///
    /// Returns a [`PersonMonthsError`] if the person-months text cannot be
    /// split into matching year / month sequences.
    pub fn from_fields<I>(fields: I, partial: bool) -> Result<Self, PersonMonthsError>
    where
        I: IntoIterator<Item = (FieldKey, String)>,
    {
        let mut project = Self {
            partial,
            ..Self::default()
        };

        for (key, value) in fields {
            *project.field_mut(key) = value;
        }

        let person_months = PersonMonths::parse(&project.person_months)?;
        project.year = person_months.years;
        project.person_month = person_months.months;

        Ok(project)
    }

    /// Returns the text value stored under `key`.
    #[must_use]
    pub fn field(&self, key: FieldKey) -> &str {
        match key {
            FieldKey::Title => &self.title,
            FieldKey::StatusOfSupport => &self.status_of_support,
            FieldKey::AwardNumber => &self.award_number,
            FieldKey::SourceOfSupport => &self.source_of_support,
            FieldKey::Place => &self.place,
            FieldKey::StartDate => &self.start_date,
            FieldKey::EndDate => &self.end_date,
            FieldKey::TotalAmount => &self.total_amount,
            FieldKey::PersonMonths => &self.person_months,
            FieldKey::Objective => &self.objective,
            FieldKey::Overlap => &self.overlap,
        }
    }

    const fn field_mut(&mut self, key: FieldKey) -> &mut String {
        match key {
            FieldKey::Title => &mut self.title,
            FieldKey::StatusOfSupport => &mut self.status_of_support,
            FieldKey::AwardNumber => &mut self.award_number,
            FieldKey::SourceOfSupport => &mut self.source_of_support,
            FieldKey::Place => &mut self.place,
            FieldKey::StartDate => &mut self.start_date,
            FieldKey::EndDate => &mut self.end_date,
            FieldKey::TotalAmount => &mut self.total_amount,
            FieldKey::PersonMonths => &mut self.person_months,
            FieldKey::Objective => &mut self.objective,
            FieldKey::Overlap => &mut self.overlap,
        }
    }

    /// Parses [`Project::status_of_support`], returning `None` for any
    /// text other than exactly `current` or `pending`.
    #[must_use]
    pub fn status(&self) -> Option<SupportStatus> {
        self.status_of_support.parse().ok()
    }

    /// `(year, person-months)` pairs in form order.
    pub fn person_month_pairs(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.year.iter().copied().zip(self.person_month.iter().copied())
    }
}
