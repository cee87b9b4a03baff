use std::cell::RefCell;

use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use crate::api::{ApiClient, Transport};
use crate::errors::ClientError;
use crate::format::format_datetime;
use crate::models::{ApiUsageStatus, Message, SendMessageReply};
use crate::session::KeyValueStore;

const TRANSCRIPT_RULE_WIDTH: usize = 50;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChatError {
    #[error("Mensagem vazia")]
    Empty,

    #[error("Aguarde a resposta anterior")]
    Busy,

    #[error("Apenas orientadores podem adicionar notas")]
    NotAllowed,

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl ChatError {
    pub fn user_message(&self) -> String {
        match self {
            ChatError::Client(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Everything the chat page shows, owned by one controller per page.
#[derive(Debug, Clone, Default)]
struct ChatView {
    project_id: Option<i64>,
    title: String,
    project_name: String,
    messages: Vec<Message>,
    status: Option<ApiUsageStatus>,
    sending: bool,
}

/// Controller behind a single chat page.
///
/// Methods take `&self` and never hold the inner borrow across an `.await`,
/// so a status poll can run while a send is in flight.
pub struct ChatController<T, S> {
    client: ApiClient<T, S>,
    chat_id: i64,
    view: RefCell<ChatView>,
}

impl<T: Transport, S: KeyValueStore> ChatController<T, S> {
    pub fn new(client: ApiClient<T, S>, chat_id: i64) -> Self {
        Self {
            client,
            chat_id,
            view: RefCell::new(ChatView::default()),
        }
    }

    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }

    pub fn project_id(&self) -> Option<i64> {
        self.view.borrow().project_id
    }

    pub fn title(&self) -> String {
        self.view.borrow().title.clone()
    }

    pub fn project_name(&self) -> String {
        self.view.borrow().project_name.clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.view.borrow().messages.clone()
    }

    pub fn status(&self) -> Option<ApiUsageStatus> {
        self.view.borrow().status.clone()
    }

    pub fn is_sending(&self) -> bool {
        self.view.borrow().sending
    }

    pub fn can_annotate(&self) -> bool {
        self.client.session().can_annotate()
    }

    /// Fetches the chat with its messages and replaces the local view.
    pub async fn load(&self) -> Result<(), ChatError> {
        let chat = self.client.fetch_chat(self.chat_id, true).await?;
        debug!("Loaded chat {} with {} messages", chat.id, chat.messages.len());

        let mut view = self.view.borrow_mut();
        view.project_id = Some(chat.project_id);
        view.title = if chat.title.is_empty() { "Chat APBIA".to_string() } else { chat.title };
        view.project_name = chat.project_name.unwrap_or_else(|| "Projeto".to_string());
        view.messages = chat.messages;
        Ok(())
    }

    /// Sends `text`, echoing it locally before the server answers.
    /// Returns the AI reply when the server produced one.
    pub async fn send(&self, text: &str, use_thinking: bool) -> Result<Option<Message>, ChatError> {
        let content = self.begin_send(text)?;
        self.deliver(&content, use_thinking).await
    }

    /// First half of [`send`](Self::send): claims the send guard and pushes the
    /// local echo. Pages call it directly to render the echo before awaiting
    /// [`deliver`](Self::deliver).
    pub fn begin_send(&self, text: &str) -> Result<String, ChatError> {
        let content = text.trim();
        if content.is_empty() {
            return Err(ChatError::Empty);
        }

        let mut view = self.view.borrow_mut();
        if view.sending {
            return Err(ChatError::Busy);
        }
        view.sending = true;
        view.messages.push(self.local_echo(content));
        Ok(content.to_string())
    }

    /// Posts content accepted by [`begin_send`](Self::begin_send) and releases the guard.
    pub async fn deliver(&self, content: &str, use_thinking: bool) -> Result<Option<Message>, ChatError> {
        let result = self
            .client
            .send_message(self.chat_id, content, use_thinking)
            .await;
        self.finish_send(result)
    }

    fn finish_send(&self, result: Result<SendMessageReply, ClientError>) -> Result<Option<Message>, ChatError> {
        let mut view = self.view.borrow_mut();
        view.sending = false;

        let reply = result.map_err(|e| {
            error!("Failed to send message to chat {}: {e}", self.chat_id);
            ChatError::from(e)
        })?;

        if let Some(usage) = reply.usage {
            view.status = Some(usage);
        }
        if let Some(ai) = &reply.ai_message {
            view.messages.push(ai.clone());
        }
        Ok(reply.ai_message)
    }

    fn local_echo(&self, content: &str) -> Message {
        let profile = self.client.session().profile();
        Message {
            id: None,
            author_id: profile.as_ref().map(|p| p.id),
            author_name: Some(
                profile
                    .map(|p| p.full_name)
                    .unwrap_or_else(|| "Você".to_string()),
            ),
            content: content.to_string(),
            sent_at: Some(Utc::now().to_rfc3339()),
            is_advisor_note: false,
        }
    }

    /// Attaches an advisor note to the AI message `message_id`.
    pub async fn add_note(&self, message_id: i64, note: &str) -> Result<Message, ChatError> {
        if !self.can_annotate() {
            return Err(ChatError::NotAllowed);
        }
        let note = note.trim();
        if note.is_empty() {
            return Err(ChatError::Empty);
        }

        let saved = self.client.add_advisor_note(message_id, note).await?;
        self.view.borrow_mut().messages.push(saved.clone());
        Ok(saved)
    }

    /// Refreshes the usage status. Failures are logged and the previous
    /// status is kept.
    pub async fn poll_status(&self) -> Option<ApiUsageStatus> {
        match self.client.api_status().await {
            Ok(status) => {
                self.view.borrow_mut().status = Some(status.clone());
                Some(status)
            }
            Err(e) => {
                warn!("API status poll failed: {e}");
                None
            }
        }
    }

    /// Empties the local message list; nothing is deleted on the server.
    pub fn clear_view(&self) {
        self.view.borrow_mut().messages.clear();
    }

    /// Re-fetches the chat and renders it as a plain-text transcript.
    pub async fn export_transcript(&self, now: DateTime<Utc>) -> Result<String, ChatError> {
        let chat = self.client.fetch_chat(self.chat_id, true).await?;
        let project = chat.project_name.as_deref().unwrap_or("N/A");

        let mut text = format!("CHAT APBIA - {}\n", chat.title);
        text.push_str(&format!("Projeto: {project}\n"));
        text.push_str(&format!("Data: {}\n", now.format("%d/%m/%Y %H:%M")));
        text.push_str(&format!("\n{}\n\n", "=".repeat(TRANSCRIPT_RULE_WIDTH)));

        for msg in &chat.messages {
            let sender = if msg.is_from_ai() { "APBIA" } else { msg.sender_label() };
            text.push_str(&format!(
                "[{}] {}:\n{}\n\n",
                format_datetime(msg.sent_at.as_deref()),
                sender,
                msg.content
            ));
        }
        Ok(text)
    }

    pub fn transcript_file_name(&self, now: DateTime<Utc>) -> String {
        format!("chat_{}_{}.txt", self.chat_id, now.timestamp_millis())
    }
}
