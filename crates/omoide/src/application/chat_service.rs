//! Chat Application Service (Use Case)
//!
//! One conversation turn: user append -> prompt composition -> completion ->
//! paced delivery -> relations bookkeeping. Opening a session also starts
//! the self-narrative watcher for that conversation.

use chrono::{DateTime, FixedOffset, Local};
use std::sync::Arc;

use crate::application::config_service::ConfigService;
use crate::application::delivery::deliver_reply;
use crate::application::extractor::KnowledgeExtractor;
use crate::application::relations::{RelationsOutcome, RelationsTrack};
use crate::application::self_narrative::{spawn_narrative_watcher, SelfNarrativeTrack};
use crate::application::session::{Session, SessionRegistry};
use crate::domain::services::{compose_instruction, PromptContext};
use crate::domain::{ConversationKey, DomainError, Message, Persona, Sender};
use crate::ports::{
    ChatMessage, CompletionOptions, KnowledgeRepository, LlmProvider, MessageRepository,
    PersonaRepository,
};

/// Persisted in place of the reply when the completion call fails.
/// A single sentence so it is delivered as one message.
pub const APOLOGY_MESSAGE: &str =
    "Sorry, I lost my train of thought for a moment, could you say that again?";

/// Source of the local wall-clock time used in prompts
pub type Clock = Arc<dyn Fn() -> DateTime<FixedOffset> + Send + Sync>;

/// Result of [`ChatService::respond`]
#[derive(Debug, Clone)]
pub struct ReplyOutcome {
    /// AI messages persisted for this reply, in order
    pub messages: Vec<Message>,
    /// False when the apology was delivered instead of a generated reply
    pub generated: bool,
    /// `None` when the session closed before the reply was delivered; such
    /// an exchange is not counted
    pub relations: Option<RelationsOutcome>,
}

/// Application service for conversation turns
pub struct ChatService {
    messages: Arc<dyn MessageRepository>,
    personas: Arc<dyn PersonaRepository>,
    knowledge: Arc<dyn KnowledgeRepository>,
    llm: Arc<dyn LlmProvider>,
    config: Arc<ConfigService>,
    sessions: Arc<SessionRegistry>,
    extractor: Arc<KnowledgeExtractor>,
    relations: RelationsTrack,
    clock: Clock,
}

impl ChatService {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        personas: Arc<dyn PersonaRepository>,
        knowledge: Arc<dyn KnowledgeRepository>,
        llm: Arc<dyn LlmProvider>,
        config: Arc<ConfigService>,
        sessions: Arc<SessionRegistry>,
    ) -> Self {
        let extractor = Arc::new(KnowledgeExtractor::new(llm.clone()));
        let relations = RelationsTrack::new(
            extractor.clone(),
            messages.clone(),
            knowledge.clone(),
            config.clone(),
        );

        Self {
            messages,
            personas,
            knowledge,
            llm,
            config,
            sessions,
            extractor,
            relations,
            clock: Arc::new(|| Local::now().fixed_offset()),
        }
    }

    /// Replace the wall clock (tests, fixed-timezone deployments)
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Make `key` the user's active conversation and start its
    /// self-narrative watcher. Any previous session of the user is closed.
    pub async fn open_session(&self, key: ConversationKey) -> Result<Arc<Session>, DomainError> {
        let persona = self.load_persona(&key).await?;
        let subscription = self.messages.subscribe(&key).await?;

        let session = self.sessions.activate(key);
        let track = SelfNarrativeTrack::new(
            session.token(),
            persona.name.clone(),
            self.extractor.clone(),
            self.knowledge.clone(),
            self.config.clone(),
        );
        session.attach_watcher(spawn_narrative_watcher(track, subscription));

        tracing::info!("💬 Session opened: {} with {}", session.key(), persona.name);
        Ok(session)
    }

    /// Persist a user turn, opening the conversation if it is not the
    /// user's active one. Storage failures are returned to the caller.
    pub async fn send(&self, key: &ConversationKey, text: &str) -> Result<Message, DomainError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::Validation("message text is empty".to_string()));
        }

        if self.sessions.find(key).is_none() {
            self.open_session(key.clone()).await?;
        }
        self.messages.append(key, Sender::User, text).await
    }

    /// Generate and deliver the persona's reply to the conversation so far.
    ///
    /// Returns `Ok(None)` without writing anything when `key` is no longer
    /// the user's active conversation.
    pub async fn respond(&self, key: &ConversationKey) -> Result<Option<ReplyOutcome>, DomainError> {
        let Some(session) = self.sessions.find(key) else {
            tracing::info!(conversation = %key, "Conversation no longer active, reply dropped");
            return Ok(None);
        };
        let persona = self.load_persona(key).await?;
        let settings = self.config.get().await?;
        let knowledge = self.knowledge.find(key).await?.unwrap_or_default();

        let instruction = compose_instruction(&PromptContext {
            persona: &persona,
            catalog: &settings.trait_catalog,
            knowledge: &knowledge,
            global_guideline: &settings.global_guideline,
            now: (self.clock)(),
        });

        let history = self.messages.recent(key, settings.history_window).await?;
        let mut conversation = Vec::with_capacity(history.len() + 1);
        conversation.push(ChatMessage::system(instruction));
        conversation.extend(history.iter().map(ChatMessage::from_turn));

        let options = CompletionOptions {
            model: Some(settings.model.clone()),
            max_tokens: Some(settings.max_tokens),
            temperature: Some(settings.temperature),
        };

        let (reply, generated) = match self.llm.complete(&conversation, &options).await {
            Ok(response) if !response.content.trim().is_empty() => {
                tracing::debug!(
                    conversation = %key,
                    model = %response.model,
                    tokens = response.usage.total_tokens,
                    "Reply generated"
                );
                (response.content, true)
            }
            Ok(_) => {
                tracing::warn!(conversation = %key, "Completion was empty, sending apology");
                (APOLOGY_MESSAGE.to_string(), false)
            }
            Err(e) => {
                tracing::warn!(conversation = %key, "Completion failed, sending apology: {}", e);
                (APOLOGY_MESSAGE.to_string(), false)
            }
        };

        let delivered = deliver_reply(self.messages.as_ref(), &session, &reply).await?;
        let relations = if delivered.is_empty() || !session.is_live() {
            None
        } else {
            Some(
                self.relations
                    .record_exchange(&session.token(), &persona.name)
                    .await,
            )
        };

        Ok(Some(ReplyOutcome {
            messages: delivered,
            generated,
            relations,
        }))
    }

    /// `send` followed by `respond`
    pub async fn send_and_respond(
        &self,
        key: &ConversationKey,
        text: &str,
    ) -> Result<(Message, Option<ReplyOutcome>), DomainError> {
        let sent = self.send(key, text).await?;
        let reply = self.respond(key).await?;
        Ok((sent, reply))
    }

    async fn load_persona(&self, key: &ConversationKey) -> Result<Persona, DomainError> {
        self.personas
            .find_by_id(key.persona_id)
            .await?
            .filter(|p| p.user_id == key.user_id)
            .ok_or_else(|| DomainError::not_found("Persona", key.persona_id))
    }
}
