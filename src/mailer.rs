use crate::config::SmtpConfig;
use crate::error::AppError;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Mutex;
use tracing::{info, warn};

const CONFIRMATION_SUBJECT: &str = "Appointment Confirmation";

/// One recorded send attempt: what was addressed to whom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendAttempt {
    pub recipient: String,
    pub body: String,
}

/// Sends appointment-confirmation email over SMTP. Fire-and-forget: no
/// retry, no delivery-status tracking. Every attempt is recorded so
/// callers can inspect what was handed to the transport.
pub struct Mailer {
    config: SmtpConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    attempts: Mutex<Vec<SendAttempt>>,
}

impl Mailer {
    pub fn new(config: SmtpConfig) -> Result<Self, AppError> {
        let transport = if config.enabled {
            let builder = if config.use_tls {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                    .map_err(|e| AppError::Notification(e.to_string()))?
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            };

            let credentials =
                Credentials::new(config.username.clone(), config.password.clone());
            Some(builder.port(config.port).credentials(credentials).build())
        } else {
            None
        };

        Ok(Self {
            config,
            transport,
            attempts: Mutex::new(Vec::new()),
        })
    }

    /// Send attempts made so far, in order. Recorded whether or not the
    /// transport accepted the message.
    pub fn attempts(&self) -> Vec<SendAttempt> {
        self.attempts
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default()
    }

    /// Format the fixed confirmation body for a patient.
    pub fn confirmation_body(name: &str, appointment_date: &str) -> String {
        format!(
            "Dear {}, your appointment is scheduled for {}. Thank you!",
            name, appointment_date
        )
    }

    /// Build the confirmation message without sending it.
    pub fn build_confirmation(
        &self,
        recipient: &str,
        name: &str,
        appointment_date: &str,
    ) -> Result<Message, AppError> {
        Message::builder()
            .from(
                self.config
                    .sender
                    .parse()
                    .map_err(|e| AppError::Notification(format!("Invalid sender: {}", e)))?,
            )
            .to(recipient
                .parse()
                .map_err(|e| AppError::Notification(format!("Invalid recipient: {}", e)))?)
            .subject(CONFIRMATION_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(Self::confirmation_body(name, appointment_date))
            .map_err(|e| AppError::Notification(e.to_string()))
    }

    /// Send the appointment confirmation. Exactly one attempt per call.
    pub async fn send_confirmation(
        &self,
        recipient: &str,
        name: &str,
        appointment_date: &str,
    ) -> Result<(), AppError> {
        let message = self.build_confirmation(recipient, name, appointment_date)?;

        if let Ok(mut attempts) = self.attempts.lock() {
            attempts.push(SendAttempt {
                recipient: recipient.to_string(),
                body: Self::confirmation_body(name, appointment_date),
            });
        }

        match &self.transport {
            Some(transport) => {
                transport
                    .send(message)
                    .await
                    .map_err(|e| AppError::Notification(e.to_string()))?;
                info!(recipient = %recipient, "Appointment confirmation sent");
                Ok(())
            }
            None => {
                warn!(recipient = %recipient, "SMTP disabled, skipping confirmation send");
                Ok(())
            }
        }
    }
}
