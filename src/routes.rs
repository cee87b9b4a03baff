use std::fmt;

use crate::models::Role;

/// Pages of the client, addressable by URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Login,
    Projects,
    Admin,
    Chat { id: i64 },
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/".to_string(),
            Route::Projects => "/projetos".to_string(),
            Route::Admin => "/admin".to_string(),
            Route::Chat { id } => format!("/chat?id={id}"),
        }
    }

    /// Resolves a location `pathname` and `search` (with or without the leading `?`).
    /// The chat page without a usable id resolves to `None`.
    pub fn parse(pathname: &str, search: &str) -> Option<Route> {
        let path = pathname.trim_end_matches(".html").trim_end_matches('/');
        match path {
            "" | "/index" | "/login" => Some(Route::Login),
            "/projetos" => Some(Route::Projects),
            "/admin" => Some(Route::Admin),
            "/chat" => chat_id_from_query(search).map(|id| Route::Chat { id }),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Landing page after login: admins get the dashboard, everyone else the project list.
pub fn landing_for(role: &Role) -> Route {
    match role {
        Role::Admin => Route::Admin,
        Role::Advisor | Role::Participant | Role::Other(_) => Route::Projects,
    }
}

/// Extracts a positive numeric `id` from a query string.
pub fn chat_id_from_query(search: &str) -> Option<i64> {
    query_param(search, "id")?.parse::<i64>().ok().filter(|id| *id > 0)
}

pub fn query_param<'a>(search: &'a str, name: &str) -> Option<&'a str> {
    search
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}
