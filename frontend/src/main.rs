mod api;
mod components;
mod state;

use apbia_client::guard::RouteGuard;
use apbia_client::routes::Route;
use leptos::mount::mount_to_body;
use leptos::prelude::*;

use components::admin::AdminPage;
use components::chat::ChatPage;
use components::login::LoginPage;
use components::projects::ProjectsPage;
use components::toast::ToastHost;
use state::{AppState, current_location, navigate_after};

const MISSING_CHAT_NOTICE: &str = "ID do chat não especificado";

/// Root application component. Picks the page from the URL after the guard allows it.
#[component]
fn App() -> impl IntoView {
    let state = AppState::provide();
    let config = api::config();
    let (pathname, search) = current_location();

    let page = match Route::parse(&pathname, &search) {
        Some(route) => Some(route),
        None if pathname.trim_end_matches(".html").ends_with("/chat") => {
            state.error(MISSING_CHAT_NOTICE);
            navigate_after(Route::Projects, config.denied_redirect_delay);
            None
        }
        None => Some(Route::Login),
    };

    let session = api::session();
    let page = page.filter(|route| state.admit(RouteGuard::new(&session, &config).check(route)));
    log::debug!("Rendering {pathname}: {page:?}");

    let body = match page {
        Some(Route::Login) => view! { <LoginPage /> }.into_any(),
        Some(Route::Projects) => view! { <ProjectsPage /> }.into_any(),
        Some(Route::Admin) => view! { <AdminPage /> }.into_any(),
        Some(Route::Chat { id }) => view! { <ChatPage chat_id=id /> }.into_any(),
        None => ().into_any(),
    };

    view! {
        <div class="app-container">
            <ToastHost />
            {body}
        </div>
    }
}

fn main() {
    let _ = console_log::init_with_level(log::Level::Debug);
    mount_to_body(App);
}
