use crate::guard::{Route, SessionContext};
use crate::notice::Notices;
use setup_admin_remote::{ApiError, ConfigService};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    Incorrect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Navigate(Route),
    Rejected,
}

pub struct LoginController {
    service: Arc<dyn ConfigService>,
    session: SessionContext,
    failure_token: Option<String>,
    pub password_error: Option<FieldError>,
    pub notices: Notices,
}

impl LoginController {
    pub fn new(service: Arc<dyn ConfigService>, session: SessionContext) -> Self {
        Self {
            service,
            session,
            failure_token: None,
            password_error: None,
            notices: Notices::default(),
        }
    }

    /// Token written to the session slot even when the credential exchange
    /// fails. `None` keeps the slot untouched on failure.
    pub fn with_failure_token(mut self, token: Option<String>) -> Self {
        self.failure_token = token;
        self
    }

    /// One credential exchange per call; the caller has already checked that
    /// the username is non-empty.
    pub async fn authenticate(&mut self, username: &str, password: &str) -> LoginOutcome {
        let exchange = self
            .service
            .login(username, password)
            .await
            .and_then(|result| {
                if result.token.is_empty() {
                    Err(ApiError::Decode("login returned an empty token".into()))
                } else {
                    Ok(result)
                }
            });

        match exchange {
            Ok(result) => {
                if let Err(e) = self.session.set_token(&result.token) {
                    self.notices.error(format!("Could not store session: {e}"));
                    return LoginOutcome::Rejected;
                }
                self.password_error = None;
                tracing::info!(user = username, "Signed in");
                LoginOutcome::Navigate(Route::Config)
            }
            Err(e) => {
                tracing::error!(user = username, "Login error: {e}");
                if let Some(ref token) = self.failure_token {
                    if let Err(store_err) = self.session.set_token(token) {
                        tracing::warn!("Could not store fallback session token: {store_err}");
                    }
                }
                let message = e
                    .server_message()
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| e.user_message())
                    .to_string();
                self.notices.error(message);
                self.password_error = Some(FieldError::Incorrect);
                LoginOutcome::Rejected
            }
        }
    }

    pub fn logout(&mut self) -> LoginOutcome {
        if let Err(e) = self.session.clear() {
            self.notices.error(format!("Could not clear session: {e}"));
        }
        LoginOutcome::Navigate(Route::Login)
    }
}
