use std::rc::Rc;

use apbia_client::format::{format_datetime, format_thousands, truncate};
use apbia_client::models::{ApiUsageStatus, Project, Role, SystemReport};
use apbia_client::service::admin_service::{AdminDashboard, AdminError, RegistrationForm};
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::{self, BrowserStore, GlooTransport};
use crate::components::header::Header;
use crate::state::{AppState, confirm, prompt};

const DESCRIPTION_PREVIEW_CHARS: usize = 80;

type Dashboard = Rc<AdminDashboard<GlooTransport, BrowserStore>>;

fn report(state: &AppState, err: &AdminError) {
    match err {
        AdminError::Client(e) => state.report(e),
        AdminError::Invalid(v) => state.error(v.message.clone()),
    }
}

/// Admin dashboard: system totals, the on/off switch, the project list and user registration.
#[component]
pub fn AdminPage() -> impl IntoView {
    let state = expect_context::<AppState>();
    let dashboard: Dashboard = Rc::new(AdminDashboard::new(api::client()));
    let dash = StoredValue::new_local(dashboard);

    let (report_data, set_report_data) = signal(None::<SystemReport>);
    let (api_status, set_api_status) = signal(None::<ApiUsageStatus>);
    let (active, set_active) = signal(true);
    let (projects, set_projects) = signal(Vec::<Project>::new());

    let refresh = move || {
        spawn_local(async move {
            let dashboard = dash.get_value();
            match dashboard.load().await {
                Ok(data) => {
                    set_active.set(dashboard.system_active());
                    set_report_data.set(Some(data));
                }
                Err(e) => report(&state, &e),
            }
            match dashboard.api_status().await {
                Ok(status) => set_api_status.set(Some(status)),
                Err(e) => log::warn!("API status unavailable: {e}"),
            }
            match dashboard.projects().await {
                Ok(list) => set_projects.set(list),
                Err(e) => report(&state, &e),
            }
        });
    };
    refresh();

    let toggle = move |_| {
        let deactivating = active.get_untracked();
        let reason = if deactivating {
            if !confirm("Desativar o sistema? Participantes não poderão usar a IA.") {
                return;
            }
            prompt("Motivo (opcional):")
        } else {
            None
        };
        spawn_local(async move {
            let dashboard = dash.get_value();
            match dashboard.toggle_system(reason.as_deref()).await {
                Ok((now_active, message)) => {
                    set_active.set(now_active);
                    state.success(message);
                    refresh();
                }
                Err(e) => report(&state, &e),
            }
        });
    };

    view! {
        <Header />
        <main class="admin-page">
            <section class="stats-grid">
                <StatCard label="Usuários" value=Signal::derive(move || report_data.get().map(|r| r.users.total)) />
                <StatCard
                    label="Participantes"
                    value=Signal::derive(move || report_data.get().map(|r| r.users_with_role(&Role::Participant)))
                />
                <StatCard
                    label="Orientadores"
                    value=Signal::derive(move || report_data.get().map(|r| r.users_with_role(&Role::Advisor)))
                />
                <StatCard label="Projetos" value=Signal::derive(move || report_data.get().map(|r| r.projects.total)) />
                <StatCard label="Chats" value=Signal::derive(move || report_data.get().map(|r| r.chats.total)) />
                <StatCard label="Mensagens" value=Signal::derive(move || report_data.get().map(|r| r.messages.total)) />
            </section>

            <section class="system-panel">
                <h2>"Sistema"</h2>
                <div class="system-state" class:inactive=move || !active.get()>
                    {move || if active.get() { "Ativo" } else { "Desativado" }}
                </div>
                <button class="primary-btn" on:click=toggle>
                    {move || if active.get() { "Desativar sistema" } else { "Ativar sistema" }}
                </button>
                {move || api_status.get().map(|s| view! {
                    <dl class="api-usage">
                        <dt>"Situação"</dt><dd>{s.health().label()}</dd>
                        <dt>"Uso mensal"</dt><dd>{format!("{:.1}%", s.usage_percent)}</dd>
                        <dt>"Requisições no mês"</dt><dd>{format_thousands(s.requests_this_month)}</dd>
                        <dt>"Último minuto"</dt>
                        <dd>
                            {match s.per_minute_limit {
                                Some(limit) => format!("{} / {limit}", s.requests_last_minute),
                                None => s.requests_last_minute.to_string(),
                            }}
                        </dd>
                        <dt>"Última requisição"</dt><dd>{format_datetime(s.last_request_at.as_deref())}</dd>
                    </dl>
                })}
            </section>

            <section class="admin-projects">
                <h2>"Projetos"</h2>
                <Show
                    when=move || !projects.get().is_empty()
                    fallback=|| view! { <div class="empty-state">"Nenhum projeto cadastrado"</div> }
                >
                    <table>
                        <thead>
                            <tr><th>"Nome"</th><th>"Descrição"</th><th>"Área"</th><th>"Edição"</th><th>"Criado em"</th></tr>
                        </thead>
                        <tbody>
                            <For each=move || projects.get() key=|p| p.id let:project>
                                <tr>
                                    <td>{project.name.clone()}</td>
                                    <td title=project.description.clone().unwrap_or_default()>
                                        {truncate(project.description.as_deref().unwrap_or(""), DESCRIPTION_PREVIEW_CHARS)}
                                    </td>
                                    <td>{project.area.clone()}</td>
                                    <td>{project.edition_year}</td>
                                    <td>{format_datetime(project.created_at.as_deref())}</td>
                                </tr>
                            </For>
                        </tbody>
                    </table>
                </Show>
            </section>

            <RegisterUserForm dash=dash on_created=refresh />
        </main>
    }
}

#[component]
fn StatCard(label: &'static str, value: Signal<Option<u64>>) -> impl IntoView {
    view! {
        <div class="stat-card">
            <div class="stat-value">
                {move || value.get().map(format_thousands).unwrap_or_else(|| "-".to_string())}
            </div>
            <div class="stat-label">{label}</div>
        </div>
    }
}

#[component]
fn RegisterUserForm(
    dash: StoredValue<Dashboard, LocalStorage>,
    on_created: impl Fn() + Copy + Send + Sync + 'static,
) -> impl IntoView {
    let state = expect_context::<AppState>();
    let (full_name, set_full_name) = signal(String::new());
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (role, set_role) = signal(Role::Participant);
    let (bp, set_bp) = signal(String::new());
    let (field_error, set_field_error) = signal(None::<String>);
    let (saving, set_saving) = signal(false);

    let reset = move || {
        set_full_name.set(String::new());
        set_email.set(String::new());
        set_password.set(String::new());
        set_bp.set(String::new());
    };

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if saving.get_untracked() {
            return;
        }
        let form = RegistrationForm {
            full_name: full_name.get_untracked(),
            email: email.get_untracked(),
            password: password.get_untracked(),
            role: role.get_untracked(),
            bp: bp.get_untracked(),
        };
        set_field_error.set(None);
        set_saving.set(true);

        spawn_local(async move {
            let dashboard = dash.get_value();
            match dashboard.register_user(&form).await {
                Ok(user) => {
                    state.success(format!("Usuário {} cadastrado", user.full_name));
                    reset();
                    on_created();
                }
                Err(AdminError::Invalid(v)) => set_field_error.set(Some(v.message)),
                Err(e) => report(&state, &e),
            }
            set_saving.set(false);
        });
    };

    view! {
        <form class="register-form" on:submit=on_submit>
            <h2>"Cadastrar usuário"</h2>
            <input type="text" placeholder="Nome completo"
                prop:value=full_name on:input=move |ev| set_full_name.set(event_target_value(&ev)) />
            <input type="email" placeholder="Email"
                prop:value=email on:input=move |ev| set_email.set(event_target_value(&ev)) />
            <input type="password" placeholder="Senha (mín. 8, maiúscula, minúscula e número)"
                prop:value=password on:input=move |ev| set_password.set(event_target_value(&ev)) />
            <select on:change=move |ev| set_role.set(Role::from(event_target_value(&ev)))>
                <option value="participante" selected=true>"Participante"</option>
                <option value="orientador">"Orientador"</option>
                <option value="admin">"Administrador"</option>
            </select>
            <Show when=move || role.get() == Role::Participant fallback=|| ()>
                <input type="text" placeholder="BP (BRG12345678)"
                    prop:value=bp on:input=move |ev| set_bp.set(event_target_value(&ev)) />
            </Show>
            {move || field_error.get().map(|e| view! { <div class="field-error">{e}</div> })}
            <button type="submit" class="primary-btn" disabled=move || saving.get()>
                {move || if saving.get() { "Cadastrando…" } else { "Cadastrar" }}
            </button>
        </form>
    }
}
