use leptos::prelude::*;

use crate::state::AppState;

/// Transient notice pinned to the top of the page.
#[component]
pub fn ToastHost() -> impl IntoView {
    let state = expect_context::<AppState>();

    view! {
        {move || {
            state.toast.get().map(|toast| {
                view! {
                    <div class=toast.kind.css_class() on:click=move |_| state.set_toast.set(None)>
                        {toast.text}
                    </div>
                }
            })
        }}
    }
}
