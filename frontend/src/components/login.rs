use apbia_client::auth::{AuthFlow, LoginForm, LoginOutcome};
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api;
use crate::state::{AppState, navigate_after};

#[component]
pub fn LoginPage() -> impl IntoView {
    let state = expect_context::<AppState>();

    // Already logged in: skip the form.
    if let Some(LoginOutcome::Redirect { target, after, .. }) = AuthFlow::new(api::client()).resume() {
        navigate_after(target, after);
    }

    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (bp, set_bp) = signal(String::new());
    let (is_advisor, set_is_advisor) = signal(false);
    let (field_error, set_field_error) = signal(None::<(&'static str, String)>);
    let (submitting, set_submitting) = signal(false);

    let error_for = move |field: &'static str| {
        move || {
            field_error
                .get()
                .filter(|(f, _)| *f == field)
                .map(|(_, message)| view! { <div class="field-error">{message}</div> })
        }
    };

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if submitting.get_untracked() {
            return;
        }
        let form = LoginForm {
            email: email.get_untracked(),
            password: password.get_untracked(),
            bp: bp.get_untracked(),
            is_advisor: is_advisor.get_untracked(),
        };
        set_field_error.set(None);
        set_submitting.set(true);

        spawn_local(async move {
            let mut flow = AuthFlow::new(api::client());
            match flow.submit(&form).await {
                LoginOutcome::Redirect { target, after, message } => {
                    if let Some(message) = message {
                        state.success(message);
                    }
                    state.set_user.set(api::session().profile());
                    navigate_after(target, after);
                    // stays disabled until the redirect fires
                    return;
                }
                LoginOutcome::Invalid(v) => set_field_error.set(Some((v.field, v.message))),
                LoginOutcome::Failed { message } => state.error(message),
            }
            set_submitting.set(false);
        });
    };

    view! {
        <main class="login-page">
            <form class="login-card" on:submit=on_submit>
                <h1>"APBIA"</h1>
                <p class="subtitle">"Assistente de Projetos para Bolsistas em IA"</p>

                <label>"Email"</label>
                <input type="email" placeholder="seu@email.com"
                    prop:value=email on:input=move |ev| set_email.set(event_target_value(&ev)) />
                {error_for("email")}

                <label>"Senha"</label>
                <input type="password"
                    prop:value=password on:input=move |ev| set_password.set(event_target_value(&ev)) />
                {error_for("senha")}

                <label class="checkbox">
                    <input type="checkbox"
                        prop:checked=is_advisor on:change=move |ev| set_is_advisor.set(event_target_checked(&ev)) />
                    "Sou orientador / administrador"
                </label>

                <Show when=move || !is_advisor.get() fallback=|| ()>
                    <label>"BP"</label>
                    <input type="text" placeholder="BRG12345678"
                        prop:value=bp on:input=move |ev| set_bp.set(event_target_value(&ev)) />
                    {error_for("bp")}
                </Show>

                <button type="submit" class="primary-btn" disabled=move || submitting.get()>
                    {move || if submitting.get() { "Entrando…" } else { "Entrar" }}
                </button>
            </form>
        </main>
    }
}
