//! Knowledge Extractor
//!
//! Sends a transcript to the text-generation service with a fixed
//! instruction and parses the structured answer. Failures (service errors,
//! malformed JSON) are logged and turned into an empty result; nothing is
//! ever returned as an error to the tracks.

use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::domain::{DomainError, GlobalSettings, RelationExtraction};
use crate::ports::{ChatMessage, CompletionOptions, LlmProvider};

/// Upper bound on self-statements taken from one extraction
pub const MAX_SELF_FACTS: usize = 5;

/// Extraction calls run cooler than chat replies
const EXTRACTION_TEMPERATURE: f32 = 0.2;

const SELF_NARRATIVE_INSTRUCTION: &str = r#"You analyze chat transcripts between a user and an AI persona.
Extract facts the PERSONA stated about ITSELF (its likes, habits, history, plans, feelings).

Rules:
- At most 5 facts.
- Each fact is one short sentence written in the first person, as the persona ("I ...").
- Ignore facts about the user.
- No duplicates. Do not invent anything that was not said.
- Output a JSON array of strings and nothing else, e.g. ["I have a cat named Mochi.", "I work at a flower shop."]
- If there are no such facts, output []."#;

const RELATIONS_INSTRUCTION: &str = r#"You analyze numbered chat transcripts between a user and an AI persona.
Extract relationship facts about named people, pets or organizations.

Output exactly this JSON object:
{
  "userRelations": [
    { "name": "<name>", "type": "<relationship to the USER, e.g. family, friend, coworker, pet>", "desc": "<short description or empty>", "episodes": ["<short event mentioned>"] }
  ],
  "personaRelations": [
    { "name": "<name>", "relation": "<relationship to the PERSONA>", "desc": "<short description or empty>", "episodes": ["<short event mentioned>"] }
  ],
  "identity": { "name": "<persona's stated name or null>", "age": "<stated age or null>", "job": "<stated job or null>", "notes": ["<other stable identity facts>"] }
}

Rules:
- Only include what was actually said. Use empty arrays when nothing applies.
- "identity" may be null when the persona said nothing about who it is.
- Episodes are short phrases ("ate dinner together", "called on Sunday")."#;

const JSON_ONLY_REQUEST: &str = "Respond with JSON only. No explanations, no Markdown.";

/// Transcript -> structured facts
pub struct KnowledgeExtractor {
    llm: Arc<dyn LlmProvider>,
}

impl KnowledgeExtractor {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Up to [`MAX_SELF_FACTS`] first-person statements, deduplicated.
    /// Empty on any failure.
    pub async fn extract_self_narrative(
        &self,
        transcript: &str,
        settings: &GlobalSettings,
    ) -> Vec<String> {
        let raw = match self.call(SELF_NARRATIVE_INSTRUCTION, transcript, settings).await {
            Some(raw) => raw,
            None => return Vec::new(),
        };

        match parse_json::<Vec<String>>(&raw) {
            Ok(facts) => {
                let mut unique: Vec<String> = Vec::new();
                for fact in facts.into_iter().map(|f| f.trim().to_string()) {
                    if !fact.is_empty() && !unique.contains(&fact) {
                        unique.push(fact);
                    }
                }
                unique.truncate(MAX_SELF_FACTS);
                unique
            }
            Err(e) => {
                tracing::warn!("Self-narrative extraction discarded: {}", e);
                Vec::new()
            }
        }
    }

    /// Relationship facts plus optional identity block. `None` on any failure.
    pub async fn extract_relations(
        &self,
        transcript: &str,
        settings: &GlobalSettings,
    ) -> Option<RelationExtraction> {
        let raw = self.call(RELATIONS_INSTRUCTION, transcript, settings).await?;

        match parse_json::<RelationExtraction>(&raw) {
            Ok(extraction) => Some(extraction),
            Err(e) => {
                tracing::warn!("Relations extraction discarded: {}", e);
                None
            }
        }
    }

    async fn call(
        &self,
        instruction: &str,
        transcript: &str,
        settings: &GlobalSettings,
    ) -> Option<String> {
        let messages = [
            ChatMessage::system(instruction),
            ChatMessage::user(format!(
                "## Transcript\n{}\n\n{}",
                transcript, JSON_ONLY_REQUEST
            )),
        ];
        let options = CompletionOptions {
            model: Some(settings.model.clone()),
            max_tokens: Some(settings.max_tokens),
            temperature: Some(EXTRACTION_TEMPERATURE),
        };

        match self.llm.complete(&messages, &options).await {
            Ok(response) => Some(response.content),
            Err(e) => {
                tracing::warn!(
                    provider = self.llm.provider_name(),
                    "Extraction call failed: {}",
                    e
                );
                None
            }
        }
    }
}

/// Remove a surrounding Markdown code fence (```json ... ```), if any
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T, DomainError> {
    serde_json::from_str(strip_code_fences(raw))
        .map_err(|e| DomainError::ExtractionParseFailure(e.to_string()))
}
