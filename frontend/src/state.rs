use std::time::Duration;

use apbia_client::guard::AuthResult;
use apbia_client::models::UserProfile;
use apbia_client::routes::Route;
use apbia_client::ClientError;
use gloo_timers::callback::Timeout;
use leptos::prelude::*;

use crate::api;

const TOAST_DURATION_MS: u32 = 4_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

impl ToastKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            ToastKind::Success => "toast success",
            ToastKind::Error => "toast error",
            ToastKind::Info => "toast info",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub kind: ToastKind,
    pub text: String,
}

/// State shared by every page, provided via Leptos context.
#[derive(Clone, Copy)]
pub struct AppState {
    // --- Read signals ---
    pub toast: ReadSignal<Option<Toast>>,
    pub user: ReadSignal<Option<UserProfile>>,

    // --- Write signals ---
    pub set_toast: WriteSignal<Option<Toast>>,
    pub set_user: WriteSignal<Option<UserProfile>>,
}

impl AppState {
    /// Create a new `AppState` and provide it in the current Leptos context.
    pub fn provide() -> Self {
        let (toast, set_toast) = signal(None::<Toast>);
        let (user, set_user) = signal(api::session().profile());

        let state = Self { toast, user, set_toast, set_user };
        provide_context(state);
        state
    }

    pub fn notify(&self, kind: ToastKind, text: impl Into<String>) {
        let toast = Toast { kind, text: text.into() };
        self.set_toast.set(Some(toast.clone()));

        let set_toast = self.set_toast;
        Timeout::new(TOAST_DURATION_MS, move || {
            // a newer toast may have replaced this one
            set_toast.update(|current| {
                if current.as_ref() == Some(&toast) {
                    *current = None;
                }
            });
        })
        .forget();
    }

    pub fn success(&self, text: impl Into<String>) {
        self.notify(ToastKind::Success, text);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.notify(ToastKind::Error, text);
    }

    /// Shows a failed API call. A rejected token ends the session.
    pub fn report(&self, err: &ClientError) {
        log::error!("Request failed: {err}");
        self.error(err.user_message());
        if err.is_unauthorized() {
            self.logout_after(api::config().denied_redirect_delay);
        }
    }

    /// Applies a guard decision. Returns whether the page may render.
    pub fn admit(&self, result: AuthResult) -> bool {
        match result {
            AuthResult::Allowed => true,
            AuthResult::DeniedRedirect { target, after, notice } => {
                if let Some(notice) = notice {
                    self.error(notice);
                }
                navigate_after(target, after);
                false
            }
        }
    }

    pub fn logout(&self) {
        self.logout_after(Duration::ZERO);
    }

    fn logout_after(&self, after: Duration) {
        api::session().clear_session();
        self.set_user.set(None);
        log::info!("Session cleared");
        navigate_after(Route::Login, after);
    }
}

/// Full-page navigation; every page boots its own controller.
pub fn navigate(route: &Route) {
    let Some(window) = web_sys::window() else { return };
    if let Err(e) = window.location().set_href(&route.path()) {
        log::error!("Navigation to {route} failed: {e:?}");
    }
}

pub fn navigate_after(route: Route, after: Duration) {
    if after.is_zero() {
        navigate(&route);
        return;
    }
    let millis = u32::try_from(after.as_millis()).unwrap_or(u32::MAX);
    Timeout::new(millis, move || navigate(&route)).forget();
}

/// Current `pathname` and `search` of the page.
pub fn current_location() -> (String, String) {
    web_sys::window()
        .map(|w| w.location())
        .map(|loc| (loc.pathname().unwrap_or_default(), loc.search().unwrap_or_default()))
        .unwrap_or_default()
}

/// Native confirmation dialog. A missing window counts as "no".
pub fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

/// Native text prompt. `None` when cancelled.
pub fn prompt(message: &str) -> Option<String> {
    web_sys::window()?.prompt_with_message(message).ok().flatten()
}
