//! Contact form: field validation and a single-shot EmailJS submission.

use std::{ fmt, sync::OnceLock, time::Duration };

use regex::Regex;
use serde::{ Deserialize, Serialize };
use thiserror::Error;

use crate::config::ContactConfig;

pub const MIN_MESSAGE_LEN: usize = 10;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// One message per invalid field.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.message.is_none()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [("name", self.name), ("email", self.email), ("message", self.message)];
        let mut first = true;
        for (field, error) in fields {
            if let Some(error) = error {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{field}: {error}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("please fix the errors in the form ({0})")]
    Validation(FieldErrors),

    #[error("email transmission failed: {0}")]
    Transmission(String),

    #[error("contact channel is not configured: {0} is missing")]
    NotConfigured(&'static str),
}

fn email_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\S+@\S+\.\S+$").ok()).as_ref()
}

impl ContactForm {
    pub fn new(name: impl Into<String>, email: impl Into<String>, message: impl Into<String>) -> Self {
        ContactForm { name: name.into(), email: email.into(), message: message.into() }
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();

        if self.name.trim().is_empty() {
            errors.name = Some("Name is required");
        }

        if self.email.trim().is_empty() {
            errors.email = Some("Email is required");
        } else if !email_pattern().is_some_and(|re| re.is_match(&self.email)) {
            errors.email = Some("Invalid email format");
        }

        let message = self.message.trim();
        if message.is_empty() {
            errors.message = Some("Message is required");
        } else if message.chars().count() < MIN_MESSAGE_LEN {
            errors.message = Some("Message is too short");
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    pub fn payload(&self) -> EmailPayload {
        EmailPayload {
            from_name: self.name.clone(),
            from_email: self.email.clone(),
            message: self.message.clone(),
            reply_to: self.email.clone(),
        }
    }

    pub fn clear(&mut self) {
        *self = ContactForm::default();
    }
}

/// Template parameters of the outgoing email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailPayload {
    pub from_name: String,
    pub from_email: String,
    pub message: String,
    pub reply_to: String,
}

pub trait ContactTransport {
    fn send(&self, payload: &EmailPayload) -> Result<(), ContactError>;
}

#[derive(Debug, Serialize)]
struct EmailJsRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: &'a EmailPayload,
}

/// Posts to the EmailJS REST endpoint.
#[derive(Debug)]
pub struct EmailJsTransport {
    client: reqwest::blocking::Client,
    config: ContactConfig,
}

impl EmailJsTransport {
    pub fn new(config: ContactConfig) -> Result<EmailJsTransport, ContactError> {
        for (name, value) in [
            ("service_id", &config.service_id),
            ("template_id", &config.template_id),
            ("user_id", &config.user_id),
        ] {
            if value.is_empty() {
                return Err(ContactError::NotConfigured(name));
            }
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ContactError::Transmission(format!("failed to create HTTP client: {e}")))?;
        Ok(EmailJsTransport { client, config })
    }
}

impl ContactTransport for EmailJsTransport {
    fn send(&self, payload: &EmailPayload) -> Result<(), ContactError> {
        let request = EmailJsRequest {
            service_id: &self.config.service_id,
            template_id: &self.config.template_id,
            user_id: &self.config.user_id,
            template_params: payload,
        };
        let response = self.client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .map_err(|e| ContactError::Transmission(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ContactError::Transmission(format!("{status}: {}", body.trim())));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitStatus {
    #[default]
    Idle,
    Processing,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Command,
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub kind: LogKind,
    pub text: String,
}

const TRANSMIT_STEPS: [&str; 5] = [
    "Initializing contact protocol...",
    "Validating credentials...",
    "Encrypting message...",
    "Establishing secure connection...",
    "Transmitting data...",
];

/// Form state plus the terminal-style log of the last submission.
#[derive(Debug)]
pub struct ContactChannel<T> {
    pub form: ContactForm,
    errors: FieldErrors,
    status: SubmitStatus,
    log: Vec<LogLine>,
    transport: T,
}

impl<T: ContactTransport> ContactChannel<T> {
    pub fn new(transport: T) -> Self {
        ContactChannel {
            form: ContactForm::default(),
            errors: FieldErrors::default(),
            status: SubmitStatus::Idle,
            log: Vec::new(),
            transport,
        }
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn status(&self) -> SubmitStatus {
        self.status
    }

    pub fn log(&self) -> &[LogLine] {
        &self.log
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Validates and sends the form once. The form is cleared only on success.
    pub fn submit(&mut self) -> Result<(), ContactError> {
        if let Err(errors) = self.form.validate() {
            tracing::debug!(%errors, "contact form rejected");
            self.errors = errors.clone();
            return Err(ContactError::Validation(errors));
        }
        self.errors = FieldErrors::default();
        self.status = SubmitStatus::Processing;
        self.log.clear();
        for step in TRANSMIT_STEPS {
            self.push(LogKind::Command, step);
        }

        match self.transport.send(&self.form.payload()) {
            Ok(()) => {
                tracing::info!(from = %self.form.email, "contact message sent");
                self.status = SubmitStatus::Success;
                self.push(LogKind::Success, "Message successfully sent to inbox!");
                self.form.clear();
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "contact message failed");
                self.status = SubmitStatus::Error;
                self.push(LogKind::Error, &format!("Error: {err}"));
                Err(err)
            }
        }
    }

    fn push(&mut self, kind: LogKind, text: &str) {
        self.log.push(LogLine { kind, text: text.to_string() });
    }
}
