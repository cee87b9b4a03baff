use std::time::Duration;

use tracing::warn;

use crate::config::ClientConfig;
use crate::routes::Route;
use crate::session::{KeyValueStore, SessionStore};

pub const ACCESS_DENIED_NOTICE: &str = "Acesso negado. Apenas administradores.";

/// Outcome of a page-level access check. The caller performs the navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthResult {
    Allowed,
    DeniedRedirect {
        target: Route,
        after: Duration,
        notice: Option<String>,
    },
}

impl AuthResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AuthResult::Allowed)
    }
}

/// Checks run at the top of every protected page's initialization.
#[derive(Clone, Debug)]
pub struct RouteGuard<'a, S> {
    session: &'a SessionStore<S>,
    config: &'a ClientConfig,
}

impl<'a, S: KeyValueStore> RouteGuard<'a, S> {
    pub fn new(session: &'a SessionStore<S>, config: &'a ClientConfig) -> Self {
        Self { session, config }
    }

    /// Denies immediately, towards the login page, when no session exists.
    pub fn require_auth(&self) -> AuthResult {
        if self.session.is_authenticated() {
            AuthResult::Allowed
        } else {
            warn!("No session, redirecting to login");
            AuthResult::DeniedRedirect {
                target: Route::Login,
                after: Duration::ZERO,
                notice: None,
            }
        }
    }

    /// Like [`require_auth`](Self::require_auth), plus the admin role. A
    /// non-admin gets a notice and a delayed redirect to the project list.
    pub fn require_admin(&self) -> AuthResult {
        let auth = self.require_auth();
        if !auth.is_allowed() {
            return auth;
        }
        if self.session.is_admin() {
            return AuthResult::Allowed;
        }
        warn!("Non-admin user tried to open the admin dashboard");
        AuthResult::DeniedRedirect {
            target: Route::Projects,
            after: self.config.denied_redirect_delay,
            notice: Some(ACCESS_DENIED_NOTICE.to_string()),
        }
    }

    /// Applies the check a route needs.
    pub fn check(&self, route: &Route) -> AuthResult {
        match route {
            Route::Login => AuthResult::Allowed,
            Route::Admin => self.require_admin(),
            Route::Projects | Route::Chat { .. } => self.require_auth(),
        }
    }
}
