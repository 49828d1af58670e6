//! Plain-text `field / value` tables for the console dump.

use cnp_support_models::{FieldKey, Project};
use strum::IntoEnumIterator as _;

/// Returns the `(field, value)` rows shown for `project`: every form field
/// in form order, then the derived `year` and `person_month` lists.
#[must_use]
pub fn project_rows(project: &Project) -> Vec<(String, String)> {
    let mut rows: Vec<(String, String)> = FieldKey::iter()
        .map(|key| (key.to_string(), project.field(key).to_owned()))
        .collect();
    rows.push(("year".to_owned(), format!("{:?}", project.year)));
    rows.push(("person_month".to_owned(), format!("{:?}", project.person_month)));
    if project.partial {
        rows.push(("partial".to_owned(), "true".to_owned()));
    }
    rows
}

/// Renders rows under `field` / `value` headers with left-aligned,
/// dash-underlined columns.
#[must_use]
pub fn render(rows: &[(String, String)]) -> String {
    let key_width = rows
        .iter()
        .map(|(k, _)| k.chars().count())
        .chain(std::iter::once("field".len()))
        .max()
        .unwrap_or_default();
    let value_width = rows
        .iter()
        .map(|(_, v)| v.chars().count())
        .chain(std::iter::once("value".len()))
        .max()
        .unwrap_or_default();

    let mut out = format!("{:<key_width$}  value\n", "field");
    out.push_str(&format!(
        "{}  {}\n",
        "-".repeat(key_width),
        "-".repeat(value_width)
    ));
    for (key, value) in rows {
        out.push_str(format!("{key:<key_width$}  {value}").trim_end());
        out.push('\n');
    }
    out
}
