//! Single point of HTTP access to the APBIA backend.
//!
//! Every response goes through [`ApiClient::request`], which decodes the
//! `{ success, data?, message? }` envelope exactly once. Callers receive an
//! [`ApiResult`] and never look at raw JSON.

pub mod transport;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::config::ClientConfig;
use crate::errors::ClientError;
use crate::models::{
    AdvisorNoteRequest, ApiUsageStatus, ChangePasswordRequest, Chat, CreateChatRequest, CreatedUser,
    HealthReport, LoginData, LoginRequest, Message, NewUser, Project, SendMessageReply,
    SendMessageRequest, SystemReport, ToggleSystemRequest, UserProfile,
};
use crate::session::{KeyValueStore, SessionStore};

pub use transport::{HttpRequest, HttpResponse, Method, Transport};

pub type ApiResult<T> = Result<T, ClientError>;

/// Default AI backend requested when creating a chat.
pub const DEFAULT_AI_KIND: &str = "gemini";

/// Default page size for `/chat/{id}/mensagens`.
pub const DEFAULT_MESSAGE_LIMIT: u32 = 100;

/// Whether an endpoint needs the bearer token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Access {
    Public,
    Authenticated,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// A decoded successful envelope.
#[derive(Debug)]
struct Success {
    data: Option<Value>,
    message: Option<String>,
}

impl Success {
    fn into_data<T: DeserializeOwned>(self) -> ApiResult<T> {
        let data = self
            .data
            .ok_or_else(|| ClientError::Decode("response has no data".to_string()))?;
        serde_json::from_value(data).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Typed client for the backend REST API.
#[derive(Clone, Debug)]
pub struct ApiClient<T, S> {
    transport: T,
    session: SessionStore<S>,
    config: ClientConfig,
}

impl<T: Transport, S: KeyValueStore> ApiClient<T, S> {
    pub fn new(transport: T, session: SessionStore<S>, config: ClientConfig) -> Self {
        Self { transport, session, config }
    }

    pub fn session(&self) -> &SessionStore<S> {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn headers(&self, access: Access) -> Vec<(String, String)> {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if access == Access::Authenticated {
            if let Some(token) = self.session.token() {
                headers.push(("Authorization".to_string(), format!("Bearer {token}")));
            }
        }
        headers
    }

    async fn exchange(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<String>,
        access: Access,
    ) -> ApiResult<HttpResponse> {
        let request = HttpRequest {
            method,
            url: self.config.endpoint_url(endpoint),
            headers: self.headers(access),
            body,
            timeout: self.config.request_timeout,
        };

        debug!("{method} {endpoint}");
        self.transport.send(request).await.map_err(|e| {
            error!("{method} {endpoint} failed: {e}");
            e
        })
    }

    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<String>,
        access: Access,
    ) -> ApiResult<Success> {
        let resp = self.exchange(method, endpoint, body, access).await?;

        let envelope = match serde_json::from_str::<Envelope>(&resp.body) {
            Ok(envelope) => envelope,
            Err(e) if resp.ok() => {
                error!("{method} {endpoint}: unreadable response body: {e}");
                return Err(ClientError::Decode(e.to_string()));
            }
            Err(_) => {
                error!("{method} {endpoint}: server error {}", resp.status);
                return Err(ClientError::api(resp.status, None));
            }
        };

        if !resp.ok() || !envelope.success {
            let message = envelope.message.or(envelope.error);
            let err = ClientError::api(resp.status, message);
            error!("{method} {endpoint} rejected ({}): {err}", resp.status);
            return Err(err);
        }

        Ok(Success { data: envelope.data, message: envelope.message })
    }

    fn encode(body: &impl Serialize) -> ApiResult<Option<String>> {
        serde_json::to_string(body)
            .map(Some)
            .map_err(|e| ClientError::Encode(e.to_string()))
    }

    // ── Verb helpers ─────────────────────────────────────────────────────────

    pub async fn get<R: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<R> {
        self.request(Method::Get, endpoint, None, Access::Authenticated)
            .await?
            .into_data()
    }

    pub async fn post<B: Serialize, R: DeserializeOwned>(&self, endpoint: &str, body: &B) -> ApiResult<R> {
        self.request(Method::Post, endpoint, Self::encode(body)?, Access::Authenticated)
            .await?
            .into_data()
    }

    pub async fn put<B: Serialize, R: DeserializeOwned>(&self, endpoint: &str, body: &B) -> ApiResult<R> {
        self.request(Method::Put, endpoint, Self::encode(body)?, Access::Authenticated)
            .await?
            .into_data()
    }

    pub async fn delete(&self, endpoint: &str) -> ApiResult<Option<String>> {
        self.request(Method::Delete, endpoint, None, Access::Authenticated)
            .await
            .map(|s| s.message)
    }

    /// POST whose success carries nothing but a confirmation message.
    async fn post_ack<B: Serialize>(&self, endpoint: &str, body: &B) -> ApiResult<Option<String>> {
        self.request(Method::Post, endpoint, Self::encode(body)?, Access::Authenticated)
            .await
            .map(|s| s.message)
    }

    // ── Auth ─────────────────────────────────────────────────────────────────

    pub async fn login(&self, email: &str, password: &str, bp: Option<&str>) -> ApiResult<LoginData> {
        let body = LoginRequest {
            email: email.to_string(),
            senha: password.to_string(),
            bp: bp.map(str::to_string),
        };
        self.request(Method::Post, "/auth/login", Self::encode(&body)?, Access::Public)
            .await?
            .into_data()
    }

    pub async fn validate_token(&self) -> ApiResult<UserProfile> {
        self.get("/auth/validate").await
    }

    pub async fn change_password(&self, current: &str, new: &str) -> ApiResult<Option<String>> {
        let body = ChangePasswordRequest {
            senha_atual: current.to_string(),
            nova_senha: new.to_string(),
        };
        self.post_ack("/auth/alterar-senha", &body).await
    }

    // ── Chats ────────────────────────────────────────────────────────────────

    pub async fn create_chat(&self, project_id: i64, ai_kind: &str, title: &str) -> ApiResult<Chat> {
        let body = CreateChatRequest {
            projeto_id: project_id,
            tipo_ia: ai_kind.to_string(),
            titulo: title.to_string(),
        };
        self.post("/chat/criar", &body).await
    }

    pub async fn fetch_chat(&self, chat_id: i64, include_messages: bool) -> ApiResult<Chat> {
        self.get(&format!("/chat/{chat_id}?incluir_mensagens={include_messages}"))
            .await
    }

    pub async fn list_project_chats(&self, project_id: i64) -> ApiResult<Vec<Chat>> {
        self.get(&format!("/chat/projeto/{project_id}")).await
    }

    pub async fn list_chat_messages(&self, chat_id: i64, limit: u32) -> ApiResult<Vec<Message>> {
        self.get(&format!("/chat/{chat_id}/mensagens?limit={limit}")).await
    }

    pub async fn delete_chat(&self, chat_id: i64) -> ApiResult<Option<String>> {
        self.delete(&format!("/chat/{chat_id}")).await
    }

    // ── AI ───────────────────────────────────────────────────────────────────

    pub async fn send_message(&self, chat_id: i64, content: &str, use_thinking: bool) -> ApiResult<SendMessageReply> {
        let body = SendMessageRequest {
            chat_id,
            conteudo: content.to_string(),
            usar_thinking: use_thinking,
        };
        self.post("/ia/mensagem", &body).await
    }

    pub async fn add_advisor_note(&self, message_id: i64, note: &str) -> ApiResult<Message> {
        let body = AdvisorNoteRequest {
            mensagem_id: message_id,
            nota: note.to_string(),
        };
        self.post("/ia/nota-orientador", &body).await
    }

    pub async fn api_status(&self) -> ApiResult<ApiUsageStatus> {
        self.get("/ia/status").await
    }

    // ── Projects & profile ───────────────────────────────────────────────────

    pub async fn list_projects(&self) -> ApiResult<Vec<Project>> {
        self.get("/projetos").await
    }

    pub async fn fetch_project(&self, project_id: i64) -> ApiResult<Project> {
        self.get(&format!("/projetos/{project_id}")).await
    }

    pub async fn profile(&self) -> ApiResult<UserProfile> {
        self.get("/usuario/perfil").await
    }

    // ── Admin ────────────────────────────────────────────────────────────────

    pub async fn register_user(&self, user: &NewUser) -> ApiResult<CreatedUser> {
        self.post("/admin/cadastrar-usuario", user).await
    }

    pub async fn system_status(&self) -> ApiResult<SystemReport> {
        self.get("/admin/sistema/status").await
    }

    pub async fn toggle_system(&self, activate: bool, reason: &str) -> ApiResult<Option<String>> {
        let body = ToggleSystemRequest {
            ativar: activate,
            motivo: reason.to_string(),
        };
        self.post_ack("/admin/sistema/toggle", &body).await
    }

    // ── Health ───────────────────────────────────────────────────────────────

    /// `/health` is public and answers without the envelope.
    pub async fn health_check(&self) -> ApiResult<HealthReport> {
        let resp = self.exchange(Method::Get, "/health", None, Access::Public).await?;
        if !resp.ok() {
            error!("GET /health: server error {}", resp.status);
            return Err(ClientError::api(resp.status, None));
        }
        serde_json::from_str(&resp.body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use serde_json::json;

    use super::transport::mock::MockTransport;
    use super::*;
    use crate::errors::GENERIC_FAILURE_MESSAGE;
    use crate::models::Role;
    use crate::session::tests::profile;
    use crate::session::MemoryStore;

    fn client(transport: &Rc<MockTransport>) -> ApiClient<Rc<MockTransport>, MemoryStore> {
        ApiClient::new(
            transport.clone(),
            SessionStore::new(MemoryStore::new()),
            ClientConfig::default().with_base_url("http://api.test"),
        )
    }

    #[tokio::test]
    async fn success_false_surfaces_server_message() {
        let transport = MockTransport::new();
        transport.reply(200, json!({"success": false, "message": "X"}));

        let err = client(&transport).list_projects().await.unwrap_err();
        assert_eq!(err, ClientError::Api { status: 200, message: Some("X".to_string()) });
        assert_eq!(err.user_message(), "X");
    }

    #[tokio::test]
    async fn network_failure_uses_generic_message() {
        let transport = MockTransport::new();
        transport.fail(ClientError::Transport("connection refused".to_string()));

        let err = client(&transport).api_status().await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn timeout_is_a_transport_failure() {
        let transport = MockTransport::new();
        transport.fail(ClientError::Timeout { seconds: 30 });

        let err = client(&transport).list_projects().await.unwrap_err();
        assert_eq!(err, ClientError::Timeout { seconds: 30 });
        assert!(err.is_transport());
        assert!(!err.is_unauthorized());
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn non_2xx_without_message_falls_back() {
        let transport = MockTransport::new();
        transport.reply(500, json!({"success": false}));
        let err = client(&transport).list_projects().await.unwrap_err();
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);

        transport.reply_raw(502, "<html>Bad Gateway</html>");
        let err = client(&transport).list_projects().await.unwrap_err();
        assert_eq!(err, ClientError::Api { status: 502, message: None });
        assert_eq!(err.to_string(), GENERIC_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn non_2xx_with_message_is_verbatim() {
        let transport = MockTransport::new();
        transport.reply(401, json!({"success": false, "message": "Token inválido"}));
        let err = client(&transport).profile().await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.user_message(), "Token inválido");
    }

    #[tokio::test]
    async fn ok_status_with_garbage_body_is_decode_error() {
        let transport = MockTransport::new();
        transport.reply_raw(200, "not json");
        let err = client(&transport).list_projects().await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn bearer_token_attached_only_when_needed() {
        let transport = MockTransport::new();
        let client = client(&transport);
        client.session().save_session("secret", &profile(Role::Participant)).unwrap();

        transport.reply(200, json!({"success": true, "data": []}));
        client.list_projects().await.unwrap();
        let req = transport.last_request();
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.url, "http://api.test/projetos");
        assert_eq!(req.header("authorization"), Some("Bearer secret"));
        assert_eq!(req.header("Content-Type"), Some("application/json"));

        transport.reply(200, json!({"status": "ok", "version": "1.0.0"}));
        let health = client.health_check().await.unwrap();
        assert!(health.is_ok());
        assert_eq!(transport.last_request().header("Authorization"), None);
    }

    #[tokio::test]
    async fn login_is_public_and_omits_missing_bp() {
        let transport = MockTransport::new();
        let client = client(&transport);
        client.session().save_session("stale", &profile(Role::Admin)).unwrap();

        transport.reply(
            200,
            json!({"success": true, "data": {
                "token": "t", "id": 1, "nome_completo": "Prof. João", "email": "j@x.br",
                "tipo_usuario_nome": "orientador"
            }}),
        );
        let data = client.login("j@x.br", "segredo1", None).await.unwrap();
        assert_eq!(data.profile.role, Role::Advisor);

        let req = transport.last_request();
        assert_eq!(req.header("Authorization"), None);
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"email": "j@x.br", "senha": "segredo1"}));
    }

    #[tokio::test]
    async fn endpoints_map_parameters() {
        let transport = MockTransport::new();
        let client = client(&transport);

        transport.reply(200, json!({"success": true, "data": {"id": 5, "projeto_id": 2, "titulo": "T"}}));
        client.fetch_chat(5, true).await.unwrap();
        assert_eq!(transport.last_request().url, "http://api.test/chat/5?incluir_mensagens=true");

        transport.reply(200, json!({"success": true, "data": []}));
        client.list_chat_messages(5, DEFAULT_MESSAGE_LIMIT).await.unwrap();
        assert_eq!(transport.last_request().url, "http://api.test/chat/5/mensagens?limit=100");

        transport.reply(200, json!({"success": true, "message": "Chat deletado"}));
        let msg = client.delete_chat(5).await.unwrap();
        assert_eq!(msg.as_deref(), Some("Chat deletado"));
        assert_eq!(transport.last_request().method, Method::Delete);

        transport.reply(200, json!({"success": true, "message": "Sistema ativado com sucesso"}));
        client.toggle_system(true, "").await.unwrap();
        let body: Value = serde_json::from_str(transport.last_request().body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"ativar": true, "motivo": ""}));

        transport.reply(201, json!({"success": true, "data": {"id": 8, "projeto_id": 2, "titulo": "Novo"}}));
        let chat = client.create_chat(2, DEFAULT_AI_KIND, "Novo").await.unwrap();
        assert_eq!(chat.id, 8);
        let req = transport.last_request();
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.url, "http://api.test/chat/criar");
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"projeto_id": 2, "tipo_ia": "gemini", "titulo": "Novo"}));

        transport.reply(200, json!({"success": true, "data": [{"id": 8, "projeto_id": 2}]}));
        let chats = client.list_project_chats(2).await.unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(transport.last_request().url, "http://api.test/chat/projeto/2");

        transport.reply(200, json!({"success": true, "data": {"id": 2, "nome": "X"}}));
        let project = client.fetch_project(2).await.unwrap();
        assert_eq!(project.name, "X");
        assert_eq!(transport.last_request().url, "http://api.test/projetos/2");

        transport.reply(200, json!({"success": true, "data": {
            "id": 1, "nome_completo": "Ana", "email": "ana@x.br", "tipo_usuario_nome": "admin"
        }}));
        let user = client.validate_token().await.unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(transport.last_request().url, "http://api.test/auth/validate");

        transport.reply(200, json!({"success": true, "data": {"atualizado": true}}));
        let _: Value = client.put("/usuario/perfil", &json!({"nome_completo": "Ana Lima"})).await.unwrap();
        let req = transport.last_request();
        assert_eq!(req.method, Method::Put);
        assert_eq!(req.url, "http://api.test/usuario/perfil");
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"nome_completo": "Ana Lima"}));

        // the registration reply is the raw row, without the role name
        transport.reply(201, json!({"success": true, "message": "Usuário cadastrado com sucesso", "data": {
            "id": 9, "nome_completo": "Prof. Rui", "email": "rui@x.br", "tipo_usuario_id": 2, "ativo": true
        }}));
        let new_user = NewUser {
            nome_completo: "Prof. Rui".to_string(),
            email: "rui@x.br".to_string(),
            senha: "Seguro123".to_string(),
            tipo_usuario: Role::Advisor,
            bp: None,
        };
        let created = client.register_user(&new_user).await.unwrap();
        assert_eq!((created.id, created.role_id, created.role), (9, Some(2), None));
        assert_eq!(transport.last_request().url, "http://api.test/admin/cadastrar-usuario");

        assert_eq!(transport.request_count(), 10);
    }

    #[tokio::test]
    async fn unhealthy_server_is_api_error() {
        let transport = MockTransport::new();
        transport.reply_raw(503, "<html><body>Service Unavailable</body></html>");

        let err = client(&transport).health_check().await.unwrap_err();
        assert_eq!(err, ClientError::Api { status: 503, message: None });
        assert_eq!(transport.last_request().url, "http://api.test/health");
    }

    #[tokio::test]
    async fn missing_data_is_decode_error() {
        let transport = MockTransport::new();
        transport.reply(200, json!({"success": true, "message": "ok"}));
        let err = client(&transport).api_status().await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }
}
