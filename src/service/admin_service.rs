use std::cell::{Cell, RefCell};

use tracing::{error, info};

use crate::api::{ApiClient, Transport};
use crate::errors::{ClientError, ValidationError};
use crate::models::{ApiUsageStatus, CreatedUser, NewUser, Project, Role, SystemReport};
use crate::session::KeyValueStore;
use crate::validation;

pub const DEFAULT_DEACTIVATION_REASON: &str = "Desativado pelo administrador";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl AdminError {
    pub fn user_message(&self) -> String {
        match self {
            AdminError::Invalid(v) => v.message.clone(),
            AdminError::Client(e) => e.user_message(),
        }
    }
}

/// Values typed into the "new user" modal.
#[derive(Clone, Debug, PartialEq)]
pub struct RegistrationForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub bp: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<NewUser, ValidationError> {
        let full_name = self.full_name.trim();
        if full_name.is_empty() {
            return Err(ValidationError::new("nome_completo", "Nome é obrigatório"));
        }

        let email = self.email.trim();
        validation::require_email(email)?;
        validation::check_password_strength(&self.password)
            .map_err(|message| ValidationError::new("senha", message))?;

        let bp = match self.role {
            Role::Participant => Some(validation::require_bp(&self.bp)?),
            _ => None,
        };

        Ok(NewUser {
            nome_completo: full_name.to_string(),
            email: email.to_string(),
            senha: self.password.clone(),
            tipo_usuario: self.role.clone(),
            bp,
        })
    }
}

/// Controller behind the admin dashboard.
pub struct AdminDashboard<T, S> {
    client: ApiClient<T, S>,
    report: RefCell<Option<SystemReport>>,
    system_active: Cell<bool>,
}

impl<T: Transport, S: KeyValueStore> AdminDashboard<T, S> {
    pub fn new(client: ApiClient<T, S>) -> Self {
        Self {
            client,
            report: RefCell::new(None),
            system_active: Cell::new(true),
        }
    }

    pub fn report(&self) -> Option<SystemReport> {
        self.report.borrow().clone()
    }

    pub fn system_active(&self) -> bool {
        self.system_active.get()
    }

    pub async fn load(&self) -> Result<SystemReport, AdminError> {
        let report = self.client.system_status().await.map_err(|e| {
            error!("Failed to load system report: {e}");
            e
        })?;
        self.system_active.set(report.system.active);
        *self.report.borrow_mut() = Some(report.clone());
        Ok(report)
    }

    pub async fn projects(&self) -> Result<Vec<Project>, AdminError> {
        Ok(self.client.list_projects().await?)
    }

    pub async fn api_status(&self) -> Result<ApiUsageStatus, AdminError> {
        Ok(self.client.api_status().await?)
    }

    /// Flips the system on or off. Returns the new state and the server's confirmation.
    pub async fn toggle_system(&self, reason: Option<&str>) -> Result<(bool, String), AdminError> {
        let activate = !self.system_active.get();
        let reason = match reason.map(str::trim).filter(|r| !r.is_empty()) {
            Some(r) => r.to_string(),
            None if activate => String::new(),
            None => DEFAULT_DEACTIVATION_REASON.to_string(),
        };

        let message = self.client.toggle_system(activate, &reason).await?;
        self.system_active.set(activate);
        info!("System {}", if activate { "activated" } else { "deactivated" });

        let fallback = if activate { "Sistema ativado!" } else { "Sistema desativado!" };
        Ok((activate, message.unwrap_or_else(|| fallback.to_string())))
    }

    pub async fn register_user(&self, form: &RegistrationForm) -> Result<CreatedUser, AdminError> {
        let new_user = form.validate()?;
        let created = self.client.register_user(&new_user).await?;
        info!("Registered user {} as {}", created.id, new_user.tipo_usuario);
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use serde_json::json;

    use super::*;
    use crate::api::transport::mock::MockTransport;
    use crate::config::ClientConfig;
    use crate::session::tests::profile;
    use crate::session::{MemoryStore, SessionStore};

    fn dashboard(transport: &Rc<MockTransport>) -> AdminDashboard<Rc<MockTransport>, MemoryStore> {
        let session = SessionStore::new(MemoryStore::new());
        session.save_session("admin-token", &profile(Role::Admin)).unwrap();
        AdminDashboard::new(ApiClient::new(transport.clone(), session, ClientConfig::default()))
    }

    fn form(role: Role) -> RegistrationForm {
        RegistrationForm {
            full_name: " Pedro Alves ".to_string(),
            email: "pedro@escola.edu.br".to_string(),
            password: "Seguro123".to_string(),
            role,
            bp: "brg87654321".to_string(),
        }
    }

    #[test]
    fn registration_validation() {
        let user = form(Role::Participant).validate().unwrap();
        assert_eq!(user.nome_completo, "Pedro Alves");
        assert_eq!(user.bp.as_deref(), Some("BRG87654321"));

        assert_eq!(form(Role::Advisor).validate().unwrap().bp, None);

        let weak = RegistrationForm { password: "fraca".to_string(), ..form(Role::Advisor) };
        assert_eq!(weak.validate().unwrap_err().field, "senha");

        let missing_bp = RegistrationForm { bp: String::new(), ..form(Role::Participant) };
        assert_eq!(missing_bp.validate().unwrap_err().field, "bp");
    }

    #[tokio::test]
    async fn load_then_toggle_off_with_default_reason() {
        let transport = MockTransport::new();
        let dash = dashboard(&transport);

        transport.reply(200, json!({"success": true, "data": {
            "usuarios": {"total": 3, "por_tipo": {"admin": 1, "orientador": 1, "participante": 1}},
            "projetos": {"total": 2}, "chats": {"total": 5},
            "api": {"status": {"sistema_ativo": true, "uso_percentual": 12.5}},
            "sistema": {"ativo": true}
        }}));
        let report = dash.load().await.unwrap();
        assert_eq!(report.chats.total, 5);
        assert_eq!(report.usage_percent(), 12.5);
        assert!(dash.system_active());

        transport.reply(200, json!({"success": true, "message": "Sistema desativado: Desativado pelo administrador"}));
        let (active, message) = dash.toggle_system(None).await.unwrap();
        assert!(!active);
        assert!(message.starts_with("Sistema desativado"));
        assert!(!dash.system_active());

        let body: serde_json::Value =
            serde_json::from_str(transport.last_request().body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"ativar": false, "motivo": DEFAULT_DEACTIVATION_REASON}));
    }

    #[tokio::test]
    async fn failed_toggle_keeps_state() {
        let transport = MockTransport::new();
        let dash = dashboard(&transport);
        transport.reply(403, json!({"success": false, "message": "Acesso negado. Apenas administradores."}));

        let err = dash.toggle_system(Some("manutenção")).await.unwrap_err();
        assert_eq!(err.user_message(), "Acesso negado. Apenas administradores.");
        assert!(dash.system_active());
    }

    #[tokio::test]
    async fn register_posts_validated_payload() {
        let transport = MockTransport::new();
        let dash = dashboard(&transport);
        // the created row comes back without the resolved role name
        transport.reply(201, json!({"success": true, "message": "Usuário cadastrado com sucesso", "data": {
            "id": 9, "nome_completo": "Pedro Alves", "email": "pedro@escola.edu.br",
            "tipo_usuario_id": 3, "bp": "BRG87654321", "ativo": true
        }}));

        let created = dash.register_user(&form(Role::Participant)).await.unwrap();
        assert_eq!(created.id, 9);
        assert_eq!(created.full_name, "Pedro Alves");
        assert_eq!(created.role, None);
        assert_eq!(created.role_id, Some(3));

        let body: serde_json::Value =
            serde_json::from_str(transport.last_request().body.as_deref().unwrap()).unwrap();
        assert_eq!(body["tipo_usuario"], "participante");
        assert_eq!(body["bp"], "BRG87654321");
    }

    #[tokio::test]
    async fn invalid_registration_stays_local() {
        let transport = MockTransport::new();
        let dash = dashboard(&transport);
        let bad = RegistrationForm { email: "x".to_string(), ..form(Role::Admin) };
        assert!(matches!(dash.register_user(&bad).await, Err(AdminError::Invalid(_))));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn projects_tab_lists_every_project() {
        let transport = MockTransport::new();
        let dash = dashboard(&transport);
        transport.reply(200, json!({"success": true, "data": [
            {"id": 1, "nome": "Robô Solar", "area_projeto": "Engenharia", "ano_edicao": 2024},
            {"id": 2, "nome": "Horta Urbana", "descricao": "Sensores", "area_projeto": "Biologia", "ano_edicao": 2023}
        ]}));

        let projects = dash.projects().await.unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[1].description.as_deref(), Some("Sensores"));
        assert_eq!(transport.last_request().url, "http://localhost:5000/api/projetos");
    }
}
