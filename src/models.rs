use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

// ============ User Models ============

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: NaiveDateTime,
}

/// Known user roles. Stored roles outside this set are kept as-is and fall
/// through to the home redirect on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

impl Role {
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "patient" => Some(Role::Patient),
            "doctor" => Some(Role::Doctor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

// ============ Patient Models ============

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub appointment_date: String,
    pub feedback: Option<String>,
    pub feedback_category: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PatientForm {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    // Free text, matching the intake form. No date validation.
    #[validate(length(min = 1))]
    pub appointment_date: String,
}

// ============ Doctor Models ============

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub specialization: String,
    pub schedule: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DoctorForm {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub specialization: String,
    #[validate(length(min = 1))]
    pub schedule: String,
}

// ============ Report Models ============

/// One row of the feedback report: patients with non-empty feedback,
/// flattened to (name, feedback, category).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackRow {
    pub name: String,
    pub feedback: String,
    pub category: String,
}

// ============ Session Claims ============

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // username
    pub user_id: i64,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: Uuid,
}
