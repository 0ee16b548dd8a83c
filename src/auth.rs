//! Sign-up, sign-in and sign-out.
//!
//! [`AuthFlow`] owns the session writer; everything else only reads.

use crate::account::PASSWORD_MIN;
use crate::api::ApiClient;
use crate::error::ClientError;
use crate::models::User;
use crate::session::{Session, SessionFile, SessionReader, SessionWriter};
use crate::validation::{Field, ValidationErrors};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Invalid(ValidationErrors),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl From<ValidationErrors> for AuthError {
    fn from(errors: ValidationErrors) -> Self {
        AuthError::Invalid(errors)
    }
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
    if !valid {
        errors.push(Field::Email, "Please enter a valid email address");
    }
}

fn check_password(errors: &mut ValidationErrors, password: &str) {
    if password.chars().count() < PASSWORD_MIN {
        errors.push(Field::Password, "Password must be at least 6 characters");
    }
}

#[derive(Debug)]
pub struct AuthFlow {
    api: ApiClient,
    writer: SessionWriter,
    store: Option<SessionFile>,
}

impl AuthFlow {
    /// `api` should read from `writer`'s channel.
    pub fn new(api: ApiClient, writer: SessionWriter) -> Self {
        Self {
            api,
            writer,
            store: None,
        }
    }

    /// Persist the session to `store` on every change.
    pub fn with_store(mut self, store: SessionFile) -> Self {
        self.store = Some(store);
        self
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> SessionReader {
        self.writer.reader()
    }

    /// Pick up a session saved by an earlier run. Returns the signed-in user.
    pub fn restore(&self) -> Option<User> {
        let session = self.store.as_ref()?.load()?;
        if session.token.trim().is_empty() {
            return None;
        }
        let user = session.user.clone();
        self.writer.sign_in(session);
        info!(user = %user.email, "session restored");
        Some(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let mut errors = ValidationErrors::new();
        check_email(&mut errors, email);
        errors.check_required(Field::Password, password, "Please enter your password");
        errors.into_result()?;

        let response = self.api.login(email.trim(), password).await?;
        let session = Session {
            token: response.token,
            user: response.user,
        };
        self.persist(&session);
        let user = session.user.clone();
        self.writer.sign_in(session);
        info!(user = %user.email, "signed in");
        Ok(user)
    }

    /// Create the account, then sign straight in with the same credentials.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, AuthError> {
        let mut errors = ValidationErrors::new();
        errors.check_required(Field::Name, name, "Please enter your name");
        check_email(&mut errors, email);
        check_password(&mut errors, password);
        errors.into_result()?;

        let created = self.api.register(name.trim(), email.trim(), password).await?;
        info!(user = %created.email, "account registered");
        self.login(email, password).await
    }

    pub fn logout(&self) -> Option<User> {
        let previous = self.writer.sign_out();
        if let Some(store) = &self.store {
            if let Err(e) = store.clear() {
                warn!(error = %e, "could not remove saved session");
            }
        }
        if let Some(session) = &previous {
            info!(user = %session.user.email, "signed out");
        }
        previous.map(|s| s.user)
    }

    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let mut errors = ValidationErrors::new();
        check_email(&mut errors, email);
        errors.into_result()?;
        self.api.forgot_password(email.trim()).await?;
        info!("password reset requested");
        Ok(())
    }

    fn persist(&self, session: &Session) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(session) {
                warn!(error = %e, "could not save session");
            }
        }
    }
}
