// Property-based tests for the report exporter using proptest

use chrono::NaiveDate;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use hospital_backend::models::{FeedbackRow, Patient};
use hospital_backend::reports::{feedback_rows, write_feedback_csv};
use proptest::prelude::*;

fn patient(name: String, email: String, feedback: Option<String>) -> Patient {
    Patient {
        id: 0,
        name,
        email,
        appointment_date: "2026-09-01".to_string(),
        feedback,
        feedback_category: None,
        created_at: NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
    }
}

proptest! {
    // Any set of rows, including fields with commas, quotes and newlines,
    // must survive a serialize/parse cycle intact and in order.
    #[test]
    fn csv_parse_back_reproduces_rows(
        rows in proptest::collection::vec(
            (".{0,20}", ".{0,40}", ".{0,20}").prop_map(|(name, feedback, category)| FeedbackRow {
                name,
                feedback,
                category,
            }),
            0..10,
        )
    ) {
        let bytes = write_feedback_csv(&rows).unwrap();
        let mut reader = csv::Reader::from_reader(bytes.as_slice());

        let parsed: Vec<FeedbackRow> = reader
            .records()
            .map(|r| {
                let r = r.unwrap();
                FeedbackRow {
                    name: r[0].to_string(),
                    feedback: r[1].to_string(),
                    category: r[2].to_string(),
                }
            })
            .collect();

        prop_assert_eq!(parsed, rows);
    }

    // The report never includes a patient without feedback and never drops
    // one that has it.
    #[test]
    fn report_selects_exactly_nonempty_feedback(
        feedbacks in proptest::collection::vec(proptest::option::of(".{0,20}"), 0..20)
    ) {
        let patients: Vec<Patient> = feedbacks
            .iter()
            .map(|f| patient(Name().fake(), SafeEmail().fake(), f.clone()))
            .collect();

        let rows = feedback_rows(&patients);
        let expected = feedbacks
            .iter()
            .filter(|f| f.as_deref().is_some_and(|s| !s.is_empty()))
            .count();

        prop_assert_eq!(rows.len(), expected);
    }
}
