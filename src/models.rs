use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Role attached to a user profile. Serialized with the backend's role names.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Advisor,
    Participant,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Advisor => "orientador",
            Role::Participant => "participante",
            Role::Other(name) => name,
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "admin" => Role::Admin,
            "orientador" | "advisor" => Role::Advisor,
            "participante" | "participant" => Role::Participant,
            _ => Role::Other(s),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the logged-in user as returned by `/auth/login`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    #[serde(rename = "nome_completo")]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "tipo_usuario_nome")]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bp: Option<String>,
}

/// `data` of a successful login: the token plus the flattened profile.
#[derive(Clone, Debug, Deserialize)]
pub struct LoginData {
    pub token: String,
    #[serde(flatten)]
    pub profile: UserProfile,
}

/// Request body for `/auth/login`.
#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub senha: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bp: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChangePasswordRequest {
    pub senha_atual: String,
    pub nova_senha: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao", default)]
    pub description: Option<String>,
    #[serde(rename = "area_projeto", default)]
    pub area: String,
    #[serde(rename = "ano_edicao", default)]
    pub edition_year: i32,
    #[serde(rename = "data_criacao", default)]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "titulo", default)]
    pub title: String,
    #[serde(rename = "projeto_id")]
    pub project_id: i64,
    #[serde(rename = "projeto_nome", default)]
    pub project_name: Option<String>,
    #[serde(rename = "data_criacao", default)]
    pub created_at: Option<String>,
    #[serde(rename = "mensagens", default)]
    pub messages: Vec<Message>,
}

/// Request body for `/chat/criar`.
#[derive(Clone, Debug, Serialize)]
pub struct CreateChatRequest {
    pub projeto_id: i64,
    pub tipo_ia: String,
    pub titulo: String,
}

/// A chat message. `author_id == None` marks an AI-authored message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "usuario_id", default)]
    pub author_id: Option<i64>,
    #[serde(rename = "usuario_nome", default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(rename = "conteudo")]
    pub content: String,
    #[serde(rename = "data_envio", default)]
    pub sent_at: Option<String>,
    #[serde(rename = "e_nota_orientador", default)]
    pub is_advisor_note: bool,
}

impl Message {
    pub fn is_from_ai(&self) -> bool {
        self.author_id.is_none()
    }

    /// Display name of whoever wrote the message.
    pub fn sender_label(&self) -> &str {
        if self.is_advisor_note {
            "Nota do Orientador"
        } else if self.is_from_ai() {
            "APBIA"
        } else {
            self.author_name.as_deref().unwrap_or("Usuário")
        }
    }
}

/// Request body for `/ia/mensagem`.
#[derive(Clone, Debug, Serialize)]
pub struct SendMessageRequest {
    pub chat_id: i64,
    pub conteudo: String,
    pub usar_thinking: bool,
}

/// `data` of `/ia/mensagem`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SendMessageReply {
    #[serde(rename = "mensagem_usuario", default)]
    pub user_message: Option<Message>,
    #[serde(rename = "mensagem_ia", default)]
    pub ai_message: Option<Message>,
    #[serde(rename = "uso_api", default)]
    pub usage: Option<ApiUsageStatus>,
}

/// Request body for `/ia/nota-orientador`.
#[derive(Clone, Debug, Serialize)]
pub struct AdvisorNoteRequest {
    pub mensagem_id: i64,
    pub nota: String,
}

/// Usage percentage at which the assistant is considered degraded.
pub const THROTTLE_WARNING_PERCENT: f64 = 80.0;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiUsageStatus {
    #[serde(rename = "sistema_ativo", default)]
    pub system_active: bool,
    #[serde(rename = "throttling_ativo", default)]
    pub throttling_active: bool,
    #[serde(rename = "requisicoes_mes", default)]
    pub requests_this_month: u64,
    #[serde(rename = "uso_percentual", default)]
    pub usage_percent: f64,
    #[serde(rename = "requisicoes_total", default)]
    pub total_requests: u64,
    #[serde(rename = "requisicoes_ultimo_minuto", default)]
    pub requests_last_minute: u64,
    #[serde(rename = "ultima_requisicao", default)]
    pub last_request_at: Option<String>,
    #[serde(rename = "limite_minuto", default)]
    pub per_minute_limit: Option<u64>,
}

/// Coarse availability of the assistant, derived from [`ApiUsageStatus`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiHealth {
    Online,
    Limited,
    Offline,
}

impl ApiHealth {
    pub fn label(&self) -> &'static str {
        match self {
            ApiHealth::Online => "Online",
            ApiHealth::Limited => "Limitado",
            ApiHealth::Offline => "Offline",
        }
    }
}

impl ApiUsageStatus {
    pub fn health(&self) -> ApiHealth {
        if !self.system_active {
            ApiHealth::Offline
        } else if self.throttling_active || self.usage_percent >= THROTTLE_WARNING_PERCENT {
            ApiHealth::Limited
        } else {
            ApiHealth::Online
        }
    }
}

// ── Admin ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct UserTotals {
    #[serde(default)]
    pub total: u64,
    #[serde(rename = "por_tipo", default)]
    pub by_role: HashMap<String, u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Total {
    #[serde(default)]
    pub total: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ApiSection {
    #[serde(default)]
    pub status: Option<ApiUsageStatus>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SystemSection {
    #[serde(rename = "ativo", default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub throttling: bool,
    #[serde(default)]
    pub database_ok: Option<bool>,
}

impl Default for SystemSection {
    fn default() -> Self {
        Self { active: true, throttling: false, database_ok: None }
    }
}

fn default_true() -> bool {
    true
}

/// `data` of `/admin/sistema/status`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SystemReport {
    #[serde(rename = "usuarios", default)]
    pub users: UserTotals,
    #[serde(rename = "projetos", default)]
    pub projects: Total,
    #[serde(default)]
    pub chats: Total,
    #[serde(rename = "mensagens", default)]
    pub messages: Total,
    #[serde(default)]
    pub api: ApiSection,
    #[serde(rename = "sistema", default)]
    pub system: SystemSection,
}

impl SystemReport {
    pub fn usage_percent(&self) -> f64 {
        self.api.status.as_ref().map(|s| s.usage_percent).unwrap_or(0.0)
    }

    pub fn users_with_role(&self, role: &Role) -> u64 {
        self.users.by_role.get(role.as_str()).copied().unwrap_or(0)
    }
}

/// Request body for `/admin/cadastrar-usuario`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewUser {
    pub nome_completo: String,
    pub email: String,
    pub senha: String,
    pub tipo_usuario: Role,
    pub bp: Option<String>,
}

/// `data` of `/admin/cadastrar-usuario`. The backend answers with the raw row,
/// so the role name may be missing and only its numeric id is present.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CreatedUser {
    pub id: i64,
    #[serde(rename = "nome_completo", default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "tipo_usuario_nome", default)]
    pub role: Option<Role>,
    #[serde(rename = "tipo_usuario_id", default)]
    pub role_id: Option<i64>,
    #[serde(default)]
    pub bp: Option<String>,
}

/// Request body for `/admin/sistema/toggle`.
#[derive(Clone, Debug, Serialize)]
pub struct ToggleSystemRequest {
    pub ativar: bool,
    pub motivo: String,
}

/// `/health` answers with a bare object rather than the usual envelope.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthReport {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
