use apbia_client::auth::{self, ChangePasswordError};
use apbia_client::format::{first_name, initials};
use apbia_client::models::Role;
use apbia_client::routes::Route;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api;
use crate::state::{AppState, navigate};

/// Top bar: user badge, navigation and the account actions.
#[component]
pub fn Header() -> impl IntoView {
    let state = expect_context::<AppState>();
    let (show_password, set_show_password) = signal(false);

    let is_admin = move || state.user.get().is_some_and(|u| u.role == Role::Admin);
    let name = move || state.user.get().map(|u| u.full_name).unwrap_or_default();

    view! {
        <header class="top-bar">
            <div class="brand" on:click=move |_| navigate(&Route::Projects)>"APBIA"</div>
            <nav>
                <a href=Route::Projects.path()>"Projetos"</a>
                <Show when=is_admin fallback=|| ()>
                    <a href=Route::Admin.path()>"Administração"</a>
                </Show>
            </nav>
            <div class="user-badge">
                <span class="avatar">{move || initials(&name())}</span>
                <span class="user-name">{move || first_name(&name()).to_string()}</span>
                <span class="user-role">
                    {move || state.user.get().map(|u| u.role.to_string()).unwrap_or_default()}
                </span>
                <button class="link-btn" on:click=move |_| set_show_password.update(|open| *open = !*open)>
                    "Alterar senha"
                </button>
                <button class="logout-btn" on:click=move |_| state.logout()>"Sair"</button>
            </div>
        </header>
        <Show when=move || show_password.get() fallback=|| ()>
            <ChangePasswordForm on_done=move || set_show_password.set(false) />
        </Show>
    }
}

#[component]
fn ChangePasswordForm(on_done: impl Fn() + Copy + Send + Sync + 'static) -> impl IntoView {
    let state = expect_context::<AppState>();
    let (current, set_current) = signal(String::new());
    let (new_password, set_new_password) = signal(String::new());
    let (confirmation, set_confirmation) = signal(String::new());
    let (field_error, set_field_error) = signal(None::<String>);
    let (saving, set_saving) = signal(false);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if saving.get_untracked() {
            return;
        }
        set_saving.set(true);
        set_field_error.set(None);

        let (current, new_password, confirmation) =
            (current.get_untracked(), new_password.get_untracked(), confirmation.get_untracked());
        spawn_local(async move {
            let client = api::client();
            match auth::change_password(&client, &current, &new_password, &confirmation).await {
                Ok(message) => {
                    state.success(message);
                    on_done();
                }
                Err(ChangePasswordError::Invalid(v)) => set_field_error.set(Some(v.message)),
                Err(ChangePasswordError::Client(e)) => state.report(&e),
            }
            set_saving.set(false);
        });
    };

    view! {
        <form class="modal password-form" on:submit=on_submit>
            <h3>"Alterar senha"</h3>
            <input type="password" placeholder="Senha atual"
                prop:value=current on:input=move |ev| set_current.set(event_target_value(&ev)) />
            <input type="password" placeholder="Nova senha"
                prop:value=new_password on:input=move |ev| set_new_password.set(event_target_value(&ev)) />
            <input type="password" placeholder="Confirme a nova senha"
                prop:value=confirmation on:input=move |ev| set_confirmation.set(event_target_value(&ev)) />
            {move || field_error.get().map(|e| view! { <div class="field-error">{e}</div> })}
            <div class="form-actions">
                <button type="button" on:click=move |_| on_done()>"Cancelar"</button>
                <button type="submit" disabled=move || saving.get()>
                    {move || if saving.get() { "Salvando…" } else { "Salvar" }}
                </button>
            </div>
        </form>
    }
}
