use crate::models::{FeedbackRow, Patient};
use anyhow::Result;

pub const EXPORT_FILENAME: &str = "feedback_reports.csv";

/// Filter patients down to those with non-empty feedback, preserving the
/// order they were iterated in.
pub fn feedback_rows(patients: &[Patient]) -> Vec<FeedbackRow> {
    patients
        .iter()
        .filter(|p| p.feedback.as_deref().is_some_and(|f| !f.is_empty()))
        .map(|p| FeedbackRow {
            name: p.name.clone(),
            feedback: p.feedback.clone().unwrap_or_default(),
            category: p.feedback_category.clone().unwrap_or_default(),
        })
        .collect()
}

/// Serialize feedback rows as CSV with a fixed header. Quoting and
/// escaping follow RFC 4180 via the csv writer.
pub fn write_feedback_csv(rows: &[FeedbackRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Name", "Feedback", "Category"])?;
    for row in rows {
        writer.write_record([&row.name, &row.feedback, &row.category])?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("CSV buffer flush failed: {}", e.error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn patient(name: &str, email: &str, feedback: Option<&str>, category: Option<&str>) -> Patient {
        Patient {
            id: 0,
            name: name.to_string(),
            email: email.to_string(),
            appointment_date: "2026-09-01".to_string(),
            feedback: feedback.map(str::to_string),
            feedback_category: category.map(str::to_string),
            created_at: NaiveDate::from_ymd_opt(2026, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn feedback_rows_skip_empty_and_missing_feedback() {
        let patients = vec![
            patient("Amit", "a@x.com", Some(""), None),
            patient("Priya", "p@x.com", Some("Clean"), Some("Cleanliness")),
            patient("Ravi", "r@x.com", None, None),
        ];

        let rows = feedback_rows(&patients);
        assert_eq!(
            rows,
            vec![FeedbackRow {
                name: "Priya".to_string(),
                feedback: "Clean".to_string(),
                category: "Cleanliness".to_string(),
            }]
        );
    }

    #[test]
    fn feedback_rows_preserve_iteration_order() {
        let patients = vec![
            patient("Zara", "z@x.com", Some("Long wait"), Some("Staff Behavior")),
            patient("Amit", "a@x.com", Some("Clean"), Some("Cleanliness")),
        ];

        let rows = feedback_rows(&patients);
        assert_eq!(rows[0].name, "Zara");
        assert_eq!(rows[1].name, "Amit");
    }

    #[test]
    fn missing_category_exports_as_empty_field() {
        let rows = feedback_rows(&[patient("Amit", "a@x.com", Some("Good"), None)]);
        let bytes = write_feedback_csv(&rows).unwrap();
        let csv = String::from_utf8(bytes).unwrap();
        assert_eq!(csv, "Name,Feedback,Category\nAmit,Good,\n");
    }

    #[test]
    fn csv_has_fixed_header_even_when_empty() {
        let bytes = write_feedback_csv(&[]).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "Name,Feedback,Category\n");
    }

    #[test]
    fn csv_quotes_fields_with_commas_and_quotes() {
        let rows = vec![FeedbackRow {
            name: "O'Brien, Pat".to_string(),
            feedback: "Said \"great\" staff".to_string(),
            category: "Staff Behavior".to_string(),
        }];

        let bytes = write_feedback_csv(&rows).unwrap();
        let csv = String::from_utf8(bytes).unwrap();
        assert_eq!(
            csv,
            "Name,Feedback,Category\n\"O'Brien, Pat\",\"Said \"\"great\"\" staff\",Staff Behavior\n"
        );
    }
}
