//! Relations Track
//!
//! A persisted counter advances once per completed exchange. When it reaches
//! `relation_threshold`, the recent transcript is distilled into relation
//! facts, merged into KnowledgeState, and the counter is reset.

use std::sync::Arc;

use crate::application::config_service::ConfigService;
use crate::application::extractor::KnowledgeExtractor;
use crate::application::session::SessionToken;
use crate::domain::services::{merge_extraction, numbered_transcript};
use crate::domain::{ConversationKey, DomainError, RelationCounter, RelationExtraction};
use crate::ports::{KnowledgeRepository, MessageRepository};

/// What one `record_exchange` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationsOutcome {
    /// Counter advanced, threshold not reached
    Counted(u32),
    /// Extraction ran and knowledge was merged; counter reset
    Merged,
    /// Extraction produced nothing; counter kept so the next exchange retries
    Aborted(u32),
    /// Session closed while extracting; result dropped
    Discarded,
    /// Storage failed; nothing changed
    Skipped,
}

/// Cadence + merge for relationship facts
pub struct RelationsTrack {
    extractor: Arc<KnowledgeExtractor>,
    messages: Arc<dyn MessageRepository>,
    knowledge: Arc<dyn KnowledgeRepository>,
    config: Arc<ConfigService>,
}

impl RelationsTrack {
    pub fn new(
        extractor: Arc<KnowledgeExtractor>,
        messages: Arc<dyn MessageRepository>,
        knowledge: Arc<dyn KnowledgeRepository>,
        config: Arc<ConfigService>,
    ) -> Self {
        Self {
            extractor,
            messages,
            knowledge,
            config,
        }
    }

    /// Count one completed exchange and run an extraction cycle when due.
    /// Never fails; storage problems are logged and reported as `Skipped`.
    pub async fn record_exchange(
        &self,
        token: &SessionToken,
        persona_name: &str,
    ) -> RelationsOutcome {
        match self.run(token, persona_name).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(conversation = %token.key(), "Relations track skipped: {}", e);
                RelationsOutcome::Skipped
            }
        }
    }

    async fn run(
        &self,
        token: &SessionToken,
        persona_name: &str,
    ) -> Result<RelationsOutcome, DomainError> {
        let key = token.key();
        let settings = self.config.get().await?;

        let mut counter = self.knowledge.load_counter(key).await?;
        counter.count += 1;
        self.knowledge.save_counter(key, counter).await?;

        if counter.count < settings.relation_threshold {
            tracing::debug!(
                conversation = %key,
                count = counter.count,
                threshold = settings.relation_threshold,
                "Relations counter advanced"
            );
            return Ok(RelationsOutcome::Counted(counter.count));
        }

        let recent = self.messages.recent(key, settings.relation_window).await?;
        let transcript = numbered_transcript(&recent, persona_name);

        let Some(extraction) = self
            .extractor
            .extract_relations(&transcript, &settings)
            .await
        else {
            tracing::info!(
                conversation = %key,
                "Relations extraction empty, will retry next exchange"
            );
            return Ok(RelationsOutcome::Aborted(counter.count));
        };

        if !token.is_live() {
            tracing::info!(conversation = %key, "Discarding relations from a closed session");
            return Ok(RelationsOutcome::Discarded);
        }

        self.merge(key, extraction).await?;
        self.knowledge
            .save_counter(key, RelationCounter::default())
            .await?;

        Ok(RelationsOutcome::Merged)
    }

    async fn merge(
        &self,
        key: &ConversationKey,
        extraction: RelationExtraction,
    ) -> Result<(), DomainError> {
        let mut state = self.knowledge.find(key).await?.unwrap_or_default();
        merge_extraction(&mut state, extraction);
        self.knowledge.save(key, &state).await?;

        tracing::info!(
            "🤝 Relations merged for {}: {} user-side, {} persona-side",
            key,
            state.user_relations.len(),
            state.persona_relations.len()
        );
        Ok(())
    }
}
