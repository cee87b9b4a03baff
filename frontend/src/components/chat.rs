use std::rc::Rc;

use apbia_client::format::format_time;
use apbia_client::models::{ApiHealth, ApiUsageStatus, Message};
use apbia_client::routes::Route;
use apbia_client::service::chat_service::{ChatController, ChatError};
use chrono::Utc;
use gloo_timers::callback::{Interval, Timeout};
use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

use crate::api::{self, BrowserStore, GlooTransport};
use crate::components::header::Header;
use crate::state::{AppState, confirm, navigate_after, prompt};

const REVOKE_DELAY_MS: u32 = 1_000;

type Controller = Rc<ChatController<GlooTransport, BrowserStore>>;

/// Signals mirroring the controller, refreshed after every await.
#[derive(Clone, Copy)]
struct ChatSignals {
    title: RwSignal<String>,
    project_name: RwSignal<String>,
    messages: RwSignal<Vec<Message>>,
    status: RwSignal<Option<ApiUsageStatus>>,
    sending: RwSignal<bool>,
}

impl ChatSignals {
    fn new() -> Self {
        Self {
            title: RwSignal::new(String::new()),
            project_name: RwSignal::new(String::new()),
            messages: RwSignal::new(Vec::new()),
            status: RwSignal::new(None),
            sending: RwSignal::new(false),
        }
    }

    fn sync(&self, ctrl: &Controller) {
        self.title.set(ctrl.title());
        self.project_name.set(ctrl.project_name());
        self.messages.set(ctrl.messages());
        self.status.set(ctrl.status());
        self.sending.set(ctrl.is_sending());
    }
}

/// Chat page: history, input, advisor notes and the assistant status badge.
#[component]
pub fn ChatPage(chat_id: i64) -> impl IntoView {
    let state = expect_context::<AppState>();
    let controller: Controller = Rc::new(ChatController::new(api::client(), chat_id));
    let can_annotate = controller.can_annotate();
    let ctrl = StoredValue::new_local(controller);
    let signals = ChatSignals::new();

    spawn_local(async move {
        let controller = ctrl.get_value();
        if let Err(e) = controller.load().await {
            report(&state, &e);
            if let ChatError::Client(err) = &e {
                if !err.is_unauthorized() {
                    navigate_after(Route::Projects, api::config().denied_redirect_delay);
                }
            }
        }
        signals.sync(&controller);
        controller.poll_status().await;
        signals.sync(&controller);
    });

    let poll_millis = u32::try_from(api::config().status_poll_interval.as_millis()).unwrap_or(u32::MAX);
    let poller = Interval::new(poll_millis, move || {
        spawn_local(async move {
            let controller = ctrl.get_value();
            if let Some(status) = controller.poll_status().await {
                signals.status.set(Some(status));
            }
        });
    });
    // dropped, and so cancelled, with the page's owner
    StoredValue::new_local(poller);

    let export = move |_| {
        spawn_local(async move {
            let controller = ctrl.get_value();
            let now = Utc::now();
            match controller.export_transcript(now).await {
                Ok(text) => {
                    if let Err(e) = download(&controller.transcript_file_name(now), &text) {
                        log::error!("Transcript download failed: {e:?}");
                        state.error("Não foi possível exportar o chat");
                    }
                }
                Err(e) => report(&state, &e),
            }
        });
    };

    let clear = move |_| {
        if confirm("Limpar as mensagens desta tela? O histórico no servidor não é apagado.") {
            let controller = ctrl.get_value();
            controller.clear_view();
            signals.sync(&controller);
        }
    };

    view! {
        <Header />
        <main class="chat-area">
            <div class="chat-header">
                <a class="back-link" href=Route::Projects.path()>"← Projetos"</a>
                <div class="chat-title">
                    <h2>{move || signals.title.get()}</h2>
                    <span class="project-name">{move || signals.project_name.get()}</span>
                </div>
                <StatusBadge status=signals.status />
                <button on:click=export>"Exportar"</button>
                <button on:click=clear>"Limpar"</button>
            </div>

            <div class="messages-container">
                {move || {
                    if signals.messages.get().is_empty() {
                        view! {
                            <div class="empty-state">"Envie uma mensagem para começar"</div>
                        }.into_any()
                    } else {
                        view! {
                            <For
                                each=move || signals.messages.get().into_iter().enumerate()
                                key=|(i, m)| (m.id, *i)
                                let:entry
                            >
                                <MessageBubble
                                    message=entry.1
                                    can_annotate=can_annotate
                                    on_note=move |message_id: i64| add_note(ctrl, signals, state, message_id)
                                />
                            </For>
                            <Show when=move || signals.sending.get() fallback=|| ()>
                                <div class="message assistant">
                                    <div class="role-label">"APBIA"</div>
                                    <div class="typing">"Pensando…"</div>
                                </div>
                            </Show>
                        }.into_any()
                    }
                }}
            </div>

            <ChatInput ctrl=ctrl signals=signals />
        </main>
    }
}

fn report(state: &AppState, err: &ChatError) {
    match err {
        ChatError::Client(e) => state.report(e),
        other => state.error(other.user_message()),
    }
}

fn add_note(ctrl: StoredValue<Controller, LocalStorage>, signals: ChatSignals, state: AppState, message_id: i64) {
    let Some(note) = prompt("Nota do orientador:") else { return };
    spawn_local(async move {
        let controller = ctrl.get_value();
        match controller.add_note(message_id, &note).await {
            Ok(_) => state.success("Nota adicionada"),
            Err(e) => report(&state, &e),
        }
        signals.sync(&controller);
    });
}

/// Saves `text` through a temporary object URL.
fn download(file_name: &str, text: &str) -> Result<(), JsValue> {
    let parts = js_sys::Array::of1(&JsValue::from_str(text));
    let options = BlobPropertyBag::new();
    options.set_type("text/plain;charset=utf-8");
    let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;
    let url = Url::create_object_url_with_blob(&blob)?;

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();

    // the download starts asynchronously and still needs the URL
    Timeout::new(REVOKE_DELAY_MS, move || {
        if let Err(e) = Url::revoke_object_url(&url) {
            log::warn!("Could not revoke transcript URL: {e:?}");
        }
    })
    .forget();
    Ok(())
}

#[component]
fn StatusBadge(status: RwSignal<Option<ApiUsageStatus>>) -> impl IntoView {
    let health = move || status.get().map(|s| s.health());

    view! {
        <span
            class="status-badge"
            class:online=move || health() == Some(ApiHealth::Online)
            class:limited=move || health() == Some(ApiHealth::Limited)
            class:offline=move || health() == Some(ApiHealth::Offline)
            title=move || status.get().map(|s| format!("Uso: {:.1}%", s.usage_percent)).unwrap_or_default()
        >
            {move || health().map(|h| h.label()).unwrap_or("…")}
        </span>
    }
}

/// A single chat message bubble.
#[component]
fn MessageBubble(
    message: Message,
    can_annotate: bool,
    on_note: impl Fn(i64) + Copy + Send + Sync + 'static,
) -> impl IntoView {
    let css_class = if message.is_advisor_note {
        "message note"
    } else if message.is_from_ai() {
        "message assistant"
    } else {
        "message user"
    };
    let label = message.sender_label().to_string();
    let time = format_time(message.sent_at.as_deref());
    let note_target = message.id.filter(|_| can_annotate && message.is_from_ai());

    view! {
        <div class=css_class>
            <div class="role-label">{label}<span class="time">{time}</span></div>
            <div class="content">{message.content}</div>
            {note_target.map(|id| view! {
                <button class="note-btn" on:click=move |_| on_note(id)>"Adicionar nota"</button>
            })}
        </div>
    }
}

/// Chat input form with textarea, thinking toggle and send button.
#[component]
fn ChatInput(ctrl: StoredValue<Controller, LocalStorage>, signals: ChatSignals) -> impl IntoView {
    let state = expect_context::<AppState>();
    let (input, set_input) = signal(String::new());
    let (thinking, set_thinking) = signal(false);

    let is_sending = move || signals.sending.get();

    let send = move || {
        let controller = ctrl.get_value();
        let text = match controller.begin_send(&input.get_untracked()) {
            Ok(text) => text,
            Err(ChatError::Empty) => return,
            Err(e) => return report(&state, &e),
        };
        set_input.set(String::new());
        signals.sync(&controller);

        let use_thinking = thinking.get_untracked();
        spawn_local(async move {
            if let Err(e) = controller.deliver(&text, use_thinking).await {
                report(&state, &e);
            }
            signals.sync(&controller);
        });
    };

    let on_keydown = move |ev: ev::KeyboardEvent| {
        if ev.key() == "Enter" && !ev.shift_key() {
            ev.prevent_default();
            send();
        }
    };

    view! {
        <div class="input-area">
            <div class="input-row">
                <textarea
                    rows="1"
                    placeholder="Digite sua mensagem… (Enter envia, Shift+Enter quebra linha)"
                    prop:value=input
                    on:input=move |ev| set_input.set(event_target_value(&ev))
                    on:keydown=on_keydown
                    disabled=is_sending
                />
                <label class="thinking-toggle">
                    <input type="checkbox"
                        prop:checked=thinking on:change=move |ev| set_thinking.set(event_target_checked(&ev)) />
                    "Raciocínio detalhado"
                </label>
                <button
                    class="send-btn"
                    on:click=move |_| send()
                    disabled=move || is_sending() || input.get().trim().is_empty()
                >
                    {move || if is_sending() { "Enviando…" } else { "Enviar" }}
                </button>
            </div>
        </div>
    }
}
