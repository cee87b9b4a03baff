use thiserror::Error;

/// Shown when the server gave no usable message, or never answered at all.
pub const GENERIC_FAILURE_MESSAGE: &str = "Erro ao conectar com o servidor. Tente novamente.";

/// Shown when a login attempt fails without a server-provided reason.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Credenciais inválidas";

/// Error surfaced by every API client call.
/// Network failure, non-2xx status and `success: false` all collapse into this one type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    // ── Transport errors ─────────────────────────────────────────────────────
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    // ── Application errors ───────────────────────────────────────────────────
    #[error("{}", .message.as_deref().unwrap_or(GENERIC_FAILURE_MESSAGE))]
    Api { status: u16, message: Option<String> },

    // ── Payload errors ───────────────────────────────────────────────────────
    #[error("Parse error: {0}")]
    Decode(String),

    #[error("Serialize error: {0}")]
    Encode(String),
}

impl ClientError {
    /// Builds an application error; a blank server message counts as none.
    pub fn api(status: u16, message: Option<String>) -> Self {
        let message = message.filter(|m| !m.trim().is_empty());
        ClientError::Api { status, message }
    }

    /// Text fit for a toast: the server's message verbatim, otherwise the generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { message: Some(message), .. } => message.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Api { status: 401, .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_) | ClientError::Timeout { .. })
    }
}

/// A form field rejected before anything reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

/// Failure writing to persistent key/value storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Storage write failed for '{key}': {message}")]
    WriteFailed { key: String, message: String },

    #[error("Failed to serialize '{key}': {message}")]
    Serialize { key: String, message: String },
}
