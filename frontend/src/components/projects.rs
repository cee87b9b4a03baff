use apbia_client::api::DEFAULT_AI_KIND;
use apbia_client::format::{relative_time, truncate};
use apbia_client::models::{Chat, Project};
use apbia_client::routes::Route;
use chrono::Utc;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api;
use crate::components::header::Header;
use crate::state::{AppState, confirm, navigate};

const DESCRIPTION_PREVIEW_CHARS: usize = 120;

/// Project list with the selected project's chats.
#[component]
pub fn ProjectsPage() -> impl IntoView {
    let state = expect_context::<AppState>();
    let (projects, set_projects) = signal(Vec::<Project>::new());
    let (selected, set_selected) = signal(None::<i64>);
    let (chats, set_chats) = signal(Vec::<Chat>::new());
    let (loading, set_loading) = signal(true);

    spawn_local(async move {
        match api::client().list_projects().await {
            Ok(list) => set_projects.set(list),
            Err(e) => state.report(&e),
        }
        set_loading.set(false);
    });

    let load_chats = move |project_id: i64| {
        set_selected.set(Some(project_id));
        set_chats.set(Vec::new());
        spawn_local(async move {
            match api::client().list_project_chats(project_id).await {
                Ok(list) => set_chats.set(list),
                Err(e) => state.report(&e),
            }
        });
    };

    let new_chat = move |_| {
        let Some(project_id) = selected.get_untracked() else { return };
        let title = format!("Chat {}", Utc::now().format("%d/%m/%Y %H:%M"));
        spawn_local(async move {
            match api::client().create_chat(project_id, DEFAULT_AI_KIND, &title).await {
                Ok(chat) => navigate(&Route::Chat { id: chat.id }),
                Err(e) => state.report(&e),
            }
        });
    };

    let delete_chat = move |chat_id: i64| {
        if !confirm("Excluir este chat? Esta ação não pode ser desfeita.") {
            return;
        }
        spawn_local(async move {
            match api::client().delete_chat(chat_id).await {
                Ok(message) => {
                    set_chats.update(|list| list.retain(|c| c.id != chat_id));
                    state.success(message.unwrap_or_else(|| "Chat excluído".to_string()));
                }
                Err(e) => state.report(&e),
            }
        });
    };

    view! {
        <Header />
        <main class="projects-page">
            <section class="project-list">
                <h2>"Meus projetos"</h2>
                {move || {
                    if loading.get() {
                        view! { <div class="empty-state">"Carregando…"</div> }.into_any()
                    } else if projects.get().is_empty() {
                        view! { <div class="empty-state">"Nenhum projeto encontrado"</div> }.into_any()
                    } else {
                        view! {
                            <For each=move || projects.get() key=|p| p.id let:project>
                                {
                                    let id = project.id;
                                    let description = project
                                        .description
                                        .as_deref()
                                        .map(|d| truncate(d, DESCRIPTION_PREVIEW_CHARS))
                                        .unwrap_or_default();
                                    view! {
                                        <div
                                            class="project-card"
                                            class:active=move || selected.get() == Some(id)
                                            on:click=move |_| load_chats(id)
                                        >
                                            <h3>{project.name.clone()}</h3>
                                            <div class="project-meta">
                                                {format!("{} · {}", project.area, project.edition_year)}
                                            </div>
                                            <p>{description}</p>
                                        </div>
                                    }
                                }
                            </For>
                        }.into_any()
                    }
                }}
            </section>

            <section class="chat-list">
                <Show
                    when=move || selected.get().is_some()
                    fallback=|| view! { <div class="empty-state">"Selecione um projeto"</div> }
                >
                    <div class="chat-list-header">
                        <h2>"Conversas"</h2>
                        <button class="primary-btn" on:click=new_chat>"+ Novo chat"</button>
                    </div>
                    <For each=move || chats.get() key=|c| c.id let:chat>
                        {
                            let id = chat.id;
                            let href = Route::Chat { id }.path();
                            let when = relative_time(chat.created_at.as_deref(), Utc::now());
                            view! {
                                <div class="chat-item">
                                    <a href=href>{chat.title.clone()}</a>
                                    <span class="chat-age">{when}</span>
                                    <button class="danger-link" on:click=move |_| delete_chat(id)>"Excluir"</button>
                                </div>
                            }
                        }
                    </For>
                </Show>
            </section>
        </main>
    }
}
