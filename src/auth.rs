//! Login form state machine:
//! `Unauthenticated → Submitting → Authenticated | Unauthenticated(error)`.

use std::time::Duration;

use tracing::{error, info, warn};

use crate::api::{ApiClient, Transport};
use crate::errors::{ClientError, ValidationError, INVALID_CREDENTIALS_MESSAGE};
use crate::models::UserProfile;
use crate::routes::{landing_for, Route};
use crate::session::KeyValueStore;
use crate::validation::{self, LOGIN_MIN_PASSWORD_LEN};

pub const LOGIN_SUCCESS_MESSAGE: &str = "Login realizado com sucesso! Redirecionando...";

/// Raw values typed into the login form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub bp: String,
    /// The "I am an advisor" toggle. Advisors and admins log in without an identifier.
    pub is_advisor: bool,
}

/// Login input that passed local validation.
#[derive(Clone, Debug, PartialEq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub bp: Option<String>,
}

impl LoginForm {
    /// Checks the fields in order, reporting the first one that fails.
    pub fn validate(&self) -> Result<Credentials, ValidationError> {
        let email = self.email.trim();
        validation::require_email(email)?;

        if self.password.chars().count() < LOGIN_MIN_PASSWORD_LEN {
            return Err(ValidationError::new("senha", "Senha muito curta"));
        }

        let bp = if self.is_advisor {
            None
        } else {
            Some(validation::require_bp(&self.bp)?)
        };

        Ok(Credentials {
            email: email.to_string(),
            password: self.password.clone(),
            bp,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AuthState {
    Unauthenticated { error: Option<String> },
    Submitting,
    Authenticated { profile: UserProfile },
}

/// What the login page should do next.
#[derive(Clone, Debug, PartialEq)]
pub enum LoginOutcome {
    /// Navigate to `target` once `after` has elapsed, showing `message` meanwhile.
    Redirect {
        target: Route,
        after: Duration,
        message: Option<String>,
    },
    /// A field failed validation; nothing was sent.
    Invalid(ValidationError),
    /// The server or the network refused the attempt.
    Failed { message: String },
}

pub struct AuthFlow<T, S> {
    client: ApiClient<T, S>,
    state: AuthState,
}

impl<T: Transport, S: KeyValueStore> AuthFlow<T, S> {
    pub fn new(client: ApiClient<T, S>) -> Self {
        let state = match client.session().profile() {
            Some(profile) if client.session().is_authenticated() => AuthState::Authenticated { profile },
            _ => AuthState::Unauthenticated { error: None },
        };
        Self { client, state }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Entry guard: a user who already has a session skips the form.
    pub fn resume(&self) -> Option<LoginOutcome> {
        match &self.state {
            AuthState::Authenticated { profile } => {
                info!("Session already present, skipping login form");
                Some(LoginOutcome::Redirect {
                    target: landing_for(&profile.role),
                    after: Duration::ZERO,
                    message: None,
                })
            }
            _ => None,
        }
    }

    pub async fn submit(&mut self, form: &LoginForm) -> LoginOutcome {
        let credentials = match form.validate() {
            Ok(c) => c,
            Err(e) => return LoginOutcome::Invalid(e),
        };

        self.state = AuthState::Submitting;
        let result = self
            .client
            .login(&credentials.email, &credentials.password, credentials.bp.as_deref())
            .await;

        let data = match result {
            Ok(data) => data,
            Err(e) => return self.fail(login_failure_message(&e)),
        };

        if let Err(e) = self.client.session().save_session(&data.token, &data.profile) {
            error!("Could not persist session: {e}");
            return self.fail(e.to_string());
        }

        info!("Login succeeded for user {}", data.profile.id);
        let target = landing_for(&data.profile.role);
        self.state = AuthState::Authenticated { profile: data.profile };
        LoginOutcome::Redirect {
            target,
            after: self.client.config().login_redirect_delay,
            message: Some(LOGIN_SUCCESS_MESSAGE.to_string()),
        }
    }

    fn fail(&mut self, message: String) -> LoginOutcome {
        warn!("Login failed: {message}");
        self.state = AuthState::Unauthenticated { error: Some(message.clone()) };
        LoginOutcome::Failed { message }
    }

    /// Drops the session and sends the user back to the login page.
    pub fn logout(&mut self) -> Route {
        self.client.session().clear_session();
        self.state = AuthState::Unauthenticated { error: None };
        info!("Logged out");
        Route::Login
    }
}

/// Server message when there is one, the credentials fallback for a bare
/// rejection, otherwise the generic text.
fn login_failure_message(err: &ClientError) -> String {
    match err {
        ClientError::Api { message: None, .. } => INVALID_CREDENTIALS_MESSAGE.to_string(),
        other => other.user_message(),
    }
}

/// Changes the logged-in user's password after checking the new one locally.
pub async fn change_password<T: Transport, S: KeyValueStore>(
    client: &ApiClient<T, S>,
    current: &str,
    new: &str,
    confirmation: &str,
) -> Result<String, ChangePasswordError> {
    if current.is_empty() {
        return Err(ValidationError::new("senha_atual", "Informe a senha atual").into());
    }
    validation::check_password_strength(new)
        .map_err(|message| ValidationError::new("nova_senha", message))?;
    if new != confirmation {
        return Err(ValidationError::new("confirmacao", "As senhas não coincidem").into());
    }

    let message = client.change_password(current, new).await?;
    Ok(message.unwrap_or_else(|| "Senha alterada com sucesso".to_string()))
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChangePasswordError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Client(#[from] ClientError),
}
