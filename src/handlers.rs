use crate::audit_log;
use crate::auth::{verify_password, SessionAuth, SESSION_COOKIE};
use crate::error::AppError;
use crate::mailer::Mailer;
use crate::models::*;
use crate::reports::{feedback_rows, write_feedback_csv, EXPORT_FILENAME};
use actix_web::cookie::Cookie;
use actix_web::{http::header, web, HttpRequest, HttpResponse, Responder, ResponseError};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{error, warn};
use validator::Validate;

pub struct AppState {
    pub pool: SqlitePool,
    pub session_auth: Arc<SessionAuth>,
    pub mailer: Arc<Mailer>,
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Session guard for protected handlers. Absent or invalid session
/// redirects to the login page before any store access.
fn require_session(req: &HttpRequest, state: &AppState) -> Result<Claims, HttpResponse> {
    let cookie = match req.cookie(SESSION_COOKIE) {
        Some(c) => c,
        None => return Err(redirect("/login")),
    };

    state
        .session_auth
        .validate_session(cookie.value())
        .map_err(|_| redirect("/login"))
}

// ============ Health Check ============

pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let db_ok = sqlx::query("SELECT 1").fetch_one(&state.pool).await.is_ok();

    if db_ok {
        HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "database": "connected",
            "timestamp": Utc::now().to_rfc3339()
        }))
    } else {
        HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "database": "disconnected"
        }))
    }
}

// ============ Landing & Authentication Handlers ============

pub async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "view": "home" }))
}

pub async fn login_page() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "view": "login",
        "fields": ["username", "password"]
    }))
}

pub async fn login(state: web::Data<AppState>, body: web::Form<LoginForm>) -> impl Responder {
    if body.validate().is_err() {
        // Empty fields fail the same way as bad credentials.
        return AppError::InvalidCredentials.error_response();
    }

    let user: Option<User> = match sqlx::query_as("SELECT * FROM users WHERE username = ?")
        .bind(&body.username)
        .fetch_optional(&state.pool)
        .await
    {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, "Database error during login");
            return AppError::from_sqlx(e).error_response();
        }
    };

    // Unknown user and wrong password fail identically.
    let authenticated = user
        .as_ref()
        .is_some_and(|u| verify_password(&body.password, &u.password_hash));

    let user = match (authenticated, user) {
        (true, Some(u)) => u,
        _ => {
            audit_log!("auth", "login", &body.username, false);
            return AppError::InvalidCredentials.error_response();
        }
    };

    let token = match state
        .session_auth
        .issue_session(user.id, &user.username, &user.role)
    {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to issue session");
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({"error": "Failed to establish session"}));
        }
    };

    audit_log!("auth", "login", &user.username, true);

    let cookie = Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .finish();

    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/dashboard"))
        .cookie(cookie)
        .finish()
}

pub async fn logout(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let claims = match require_session(&req, &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    audit_log!("auth", "logout", &claims.sub, true);

    let mut removal = Cookie::new(SESSION_COOKIE, "");
    removal.set_path("/");
    removal.make_removal();

    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/"))
        .cookie(removal)
        .finish()
}

// ============ Dashboard Dispatcher ============

pub async fn dashboard(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let claims = match require_session(&req, &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let view = match Role::parse(&claims.role) {
        Some(Role::Admin) => "admin_dashboard",
        Some(Role::Doctor) => "doctor_dashboard",
        Some(Role::Patient) => "patient_dashboard",
        None => return redirect("/"),
    };

    HttpResponse::Ok().json(serde_json::json!({
        "view": view,
        "username": claims.sub,
        "role": claims.role
    }))
}

// ============ Patient Intake Handlers ============

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub added: Option<u8>,
}

pub async fn list_patients(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> impl Responder {
    if let Err(resp) = require_session(&req, &state) {
        return resp;
    }

    let patients: Vec<Patient> = match sqlx::query_as("SELECT * FROM patients")
        .fetch_all(&state.pool)
        .await
    {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "Failed to list patients");
            return AppError::from_sqlx(e).error_response();
        }
    };

    let flash = query.added.map(|_| "Patient added successfully!");

    HttpResponse::Ok().json(serde_json::json!({
        "view": "patients",
        "patients": patients,
        "flash": flash
    }))
}

pub async fn create_patient(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Form<PatientForm>,
) -> impl Responder {
    if let Err(resp) = require_session(&req, &state) {
        return resp;
    }

    if let Err(e) = body.validate() {
        return AppError::Validation(e.to_string()).error_response();
    }

    let result = sqlx::query("INSERT INTO patients (name, email, appointment_date) VALUES (?, ?, ?)")
        .bind(&body.name)
        .bind(&body.email)
        .bind(&body.appointment_date)
        .execute(&state.pool)
        .await;

    if let Err(e) = result {
        // The cause is logged distinctly; the user message stays generic.
        let classified = AppError::from_sqlx(e);
        match &classified {
            AppError::DuplicateRecord => {
                warn!(email = %body.email, "Patient intake rejected: duplicate email")
            }
            other => error!(error = %other, "Patient intake failed"),
        }
        return HttpResponse::build(classified.status_code())
            .json(serde_json::json!({"error": "Error adding patient. Please try again."}));
    }

    // Best-effort notification: the record is already persisted, so a send
    // failure must not turn the request into an error.
    if let Err(e) = state
        .mailer
        .send_confirmation(&body.email, &body.name, &body.appointment_date)
        .await
    {
        warn!(error = %e, email = %body.email, "Confirmation email failed after persist");
    }

    redirect("/patients?added=1")
}

// ============ Doctor Intake Handlers ============

pub async fn list_doctors(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> impl Responder {
    if let Err(resp) = require_session(&req, &state) {
        return resp;
    }

    let doctors: Vec<Doctor> = match sqlx::query_as("SELECT * FROM doctors")
        .fetch_all(&state.pool)
        .await
    {
        Ok(d) => d,
        Err(e) => {
            error!(error = %e, "Failed to list doctors");
            return AppError::from_sqlx(e).error_response();
        }
    };

    let flash = query.added.map(|_| "Doctor added successfully!");

    HttpResponse::Ok().json(serde_json::json!({
        "view": "doctors",
        "doctors": doctors,
        "flash": flash
    }))
}

pub async fn create_doctor(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Form<DoctorForm>,
) -> impl Responder {
    if let Err(resp) = require_session(&req, &state) {
        return resp;
    }

    if let Err(e) = body.validate() {
        return AppError::Validation(e.to_string()).error_response();
    }

    let result = sqlx::query("INSERT INTO doctors (name, specialization, schedule) VALUES (?, ?, ?)")
        .bind(&body.name)
        .bind(&body.specialization)
        .bind(&body.schedule)
        .execute(&state.pool)
        .await;

    if let Err(e) = result {
        let classified = AppError::from_sqlx(e);
        error!(error = %classified, "Doctor intake failed");
        return HttpResponse::build(classified.status_code())
            .json(serde_json::json!({"error": "Error adding doctor. Please try again."}));
    }

    redirect("/doctors?added=1")
}

// ============ Report Handlers ============

pub async fn feedback_reports(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    if let Err(resp) = require_session(&req, &state) {
        return resp;
    }

    let patients: Vec<Patient> = match sqlx::query_as("SELECT * FROM patients")
        .fetch_all(&state.pool)
        .await
    {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "Failed to load feedback report");
            return AppError::from_sqlx(e).error_response();
        }
    };

    HttpResponse::Ok().json(serde_json::json!({
        "view": "reports",
        "feedback": feedback_rows(&patients)
    }))
}

pub async fn export_reports(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    if let Err(resp) = require_session(&req, &state) {
        return resp;
    }

    let patients: Vec<Patient> = match sqlx::query_as("SELECT * FROM patients")
        .fetch_all(&state.pool)
        .await
    {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "Failed to load feedback export");
            return AppError::from_sqlx(e).error_response();
        }
    };

    let csv = match write_feedback_csv(&feedback_rows(&patients)) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "Failed to serialize feedback CSV");
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({"error": "Failed to export reports"}));
        }
    };

    HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", EXPORT_FILENAME),
        ))
        .body(csv)
}
