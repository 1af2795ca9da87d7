//! Self-Narrative Track
//!
//! Every `extraction_interval` new messages, the last window of the live
//! conversation is distilled into first-person facts and merged into the
//! persona's self-narrative. The cursor is process-local and starts at zero
//! for every session.

use std::sync::Arc;

use crate::application::config_service::ConfigService;
use crate::application::extractor::KnowledgeExtractor;
use crate::application::session::{SessionToken, TrackHandle};
use crate::domain::services::{merge_self_narrative, speaker_transcript};
use crate::domain::Message;
use crate::ports::{KnowledgeRepository, MessageSubscription};

/// Bookkeeping of the self-narrative cadence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NarrativeCursor {
    pub last_extracted_message_count: usize,
}

/// Cadence + merge for the persona's self-statements
pub struct SelfNarrativeTrack {
    token: SessionToken,
    persona_name: String,
    cursor: NarrativeCursor,
    extractor: Arc<KnowledgeExtractor>,
    knowledge: Arc<dyn KnowledgeRepository>,
    config: Arc<ConfigService>,
}

impl SelfNarrativeTrack {
    pub fn new(
        token: SessionToken,
        persona_name: String,
        extractor: Arc<KnowledgeExtractor>,
        knowledge: Arc<dyn KnowledgeRepository>,
        config: Arc<ConfigService>,
    ) -> Self {
        Self {
            token,
            persona_name,
            cursor: NarrativeCursor::default(),
            extractor,
            knowledge,
            config,
        }
    }

    pub fn cursor(&self) -> NarrativeCursor {
        self.cursor
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// Feed the full current message list. Returns `true` when the interval
    /// was crossed and an extraction cycle ran.
    ///
    /// The cursor moves to `messages.len()` whenever a cycle runs, whether
    /// or not it produced facts, so a failed batch is never retried.
    pub async fn observe(&mut self, messages: &[Message]) -> bool {
        let settings = match self.config.get().await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Self-narrative check skipped, settings unavailable: {}", e);
                return false;
            }
        };

        let interval = settings.extraction_interval.max(1);
        let count = messages.len();
        let diff = count.saturating_sub(self.cursor.last_extracted_message_count);
        if diff < interval {
            tracing::debug!(
                conversation = %self.token.key(),
                diff,
                interval,
                "Self-narrative threshold not reached"
            );
            return false;
        }

        let window = &messages[count - interval..];
        let transcript = speaker_transcript(window, &self.persona_name);
        let facts = self
            .extractor
            .extract_self_narrative(&transcript, &settings)
            .await;

        if !facts.is_empty() {
            self.apply(facts).await;
        }

        self.cursor.last_extracted_message_count = count;
        true
    }

    async fn apply(&self, facts: Vec<String>) {
        if !self.token.is_live() {
            tracing::info!(
                conversation = %self.token.key(),
                "Discarding self-narrative facts from a closed session"
            );
            return;
        }

        let key = self.token.key();
        let mut state = match self.knowledge.find(key).await {
            Ok(state) => state.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Self-narrative merge skipped: {}", e);
                return;
            }
        };

        let added = merge_self_narrative(&mut state.self_narrative, facts);

        match self.knowledge.save(key, &state).await {
            Ok(()) => tracing::info!(
                "📖 Self-narrative updated for {}: {} new, {} total",
                key,
                added,
                state.self_narrative.len()
            ),
            Err(e) => tracing::warn!("Self-narrative save failed: {}", e),
        }
    }
}

/// Drive a track from a live subscription until the session closes or the
/// store goes away.
pub fn spawn_narrative_watcher(
    mut track: SelfNarrativeTrack,
    mut subscription: MessageSubscription,
) -> TrackHandle {
    TrackHandle::new(tokio::spawn(async move {
        while let Some(snapshot) = subscription.next().await {
            if !track.token().is_live() {
                break;
            }
            track.observe(&snapshot).await;
        }
        tracing::debug!(conversation = %track.token().key(), "Narrative watcher stopped");
    }))
}
