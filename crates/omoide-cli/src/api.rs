//! Omoide API Client

use anyhow::{bail, Context, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// API Client for Omoide
pub struct OmoideClient {
    client: Client,
    base_url: String,
    api_key: String,
    user_id: String,
}

// ============================================
// API Response Types
// ============================================

#[derive(Debug, Deserialize)]
pub struct PersonaResponse {
    pub id: Uuid,
    pub name: String,
    pub traits: TraitsView,
}

#[derive(Debug, Deserialize)]
pub struct TraitsView {
    #[serde(default)]
    pub tags: Vec<String>,
    pub verbosity_ratio: u8,
}

#[derive(Debug, Deserialize)]
pub struct SessionResponse {
    pub persona_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub sender: String,
    pub text: String,
    pub created_at: String,
}

impl MessageResponse {
    pub fn is_ai(&self) -> bool {
        self.sender == "ai"
    }
}

#[derive(Debug, Deserialize)]
pub struct MessagePageResponse {
    pub messages: Vec<MessageResponse>,
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TypingResponse {
    pub typing: bool,
}

#[derive(Debug, Deserialize)]
pub struct KnowledgeResponse {
    pub knowledge: KnowledgeView,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeView {
    #[serde(default)]
    pub user_relations: Vec<RelationView>,
    #[serde(default)]
    pub persona_relations: Vec<RelationView>,
    #[serde(default)]
    pub self_narrative: Vec<String>,
    #[serde(default)]
    pub identity: Option<serde_json::Value>,
}

/// Either side of a relation; user-side entries use `type`, persona-side `relation`
#[derive(Debug, Deserialize)]
pub struct RelationView {
    pub name: String,
    #[serde(alias = "type", alias = "relation")]
    pub kind: String,
    pub desc: Option<String>,
    #[serde(default)]
    pub episodes: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConfigResponse {
    pub settings: serde_json::Value,
    pub ttl_secs: u64,
    pub last_fetched_at: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreatePersonaRequest<'a> {
    user_id: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    traits: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct UserRequest<'a> {
    user_id: &'a str,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    user_id: &'a str,
    text: &'a str,
}

impl OmoideClient {
    /// Create a new API client
    pub fn new(base_url: &str, api_key: &str, user_id: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            user_id: user_id.to_string(),
        }
    }

    /// Test connection with health check
    pub async fn health(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);
        let resp = self.client.get(&url).send().await?;
        Ok(resp.status().is_success())
    }

    fn user_query(&self) -> String {
        format!("user_id={}", urlencoding::encode(&self.user_id))
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let resp = request
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .context("Failed to connect to Omoide API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("API error ({}): {}", status, body);
        }

        resp.json().await.context("Failed to parse response")
    }

    /// List the user's personas
    pub async fn list_personas(&self) -> Result<Vec<PersonaResponse>> {
        let url = format!("{}/omoide/personas?{}", self.base_url, self.user_query());
        self.execute(self.client.get(&url)).await
    }

    /// Get a specific persona
    pub async fn get_persona(&self, persona_id: &str) -> Result<PersonaResponse> {
        let url = format!(
            "{}/omoide/personas/{}?{}",
            self.base_url,
            persona_id,
            self.user_query()
        );
        self.execute(self.client.get(&url)).await
    }

    /// Create a persona
    pub async fn create_persona(
        &self,
        name: &str,
        verbosity: Option<u8>,
    ) -> Result<PersonaResponse> {
        let url = format!("{}/omoide/personas", self.base_url);
        let request = CreatePersonaRequest {
            user_id: &self.user_id,
            name,
            traits: verbosity.map(|v| serde_json::json!({ "verbosity_ratio": v })),
        };
        self.execute(self.client.post(&url).json(&request)).await
    }

    /// Make this persona the user's active conversation
    pub async fn open_session(&self, persona_id: &str) -> Result<SessionResponse> {
        let url = format!("{}/omoide/personas/{}/session", self.base_url, persona_id);
        let request = UserRequest {
            user_id: &self.user_id,
        };
        self.execute(self.client.post(&url).json(&request)).await
    }

    /// Send a user message; the reply is generated in the background
    pub async fn send_message(&self, persona_id: &str, text: &str) -> Result<MessageResponse> {
        let url = format!("{}/omoide/personas/{}/messages", self.base_url, persona_id);
        let request = SendMessageRequest {
            user_id: &self.user_id,
            text,
        };
        self.execute(self.client.post(&url).json(&request)).await
    }

    /// Latest messages, or the page before `before`
    pub async fn history(
        &self,
        persona_id: &str,
        limit: usize,
        before: Option<&str>,
    ) -> Result<MessagePageResponse> {
        let mut url = format!(
            "{}/omoide/personas/{}/messages?{}&limit={}",
            self.base_url,
            persona_id,
            self.user_query(),
            limit
        );
        if let Some(before) = before {
            url.push_str(&format!("&before={}", urlencoding::encode(before)));
        }
        self.execute(self.client.get(&url)).await
    }

    pub async fn typing(&self, persona_id: &str) -> Result<TypingResponse> {
        let url = format!(
            "{}/omoide/personas/{}/typing?{}",
            self.base_url,
            persona_id,
            self.user_query()
        );
        self.execute(self.client.get(&url)).await
    }

    /// Merged knowledge for this conversation
    pub async fn knowledge(&self, persona_id: &str) -> Result<KnowledgeResponse> {
        let url = format!(
            "{}/omoide/personas/{}/knowledge?{}",
            self.base_url,
            persona_id,
            self.user_query()
        );
        self.execute(self.client.get(&url)).await
    }

    pub async fn config(&self) -> Result<ConfigResponse> {
        let url = format!("{}/omoide/config", self.base_url);
        self.execute(self.client.get(&url)).await
    }

    /// Drop the server's settings cache
    pub async fn invalidate_config(&self) -> Result<()> {
        let url = format!("{}/omoide/config/invalidate", self.base_url);
        let _: serde_json::Value = self.execute(self.client.post(&url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knowledge_view_reads_both_relation_shapes() {
        let body: KnowledgeResponse = serde_json::from_str(
            r#"{"persona_id":"00000000-0000-0000-0000-000000000000","user_id":"u",
                "knowledge":{
                  "userRelations":[{"name":"Mom","type":"family","episodes":["ate dinner"]}],
                  "personaRelations":[{"name":"Mochi","relation":"cat"}],
                  "selfNarrative":["I like tea."]}}"#,
        )
        .unwrap();

        let knowledge = body.knowledge;
        assert_eq!(knowledge.user_relations[0].kind, "family");
        assert_eq!(knowledge.persona_relations[0].kind, "cat");
        assert!(knowledge.persona_relations[0].episodes.is_empty());
        assert_eq!(knowledge.self_narrative, vec!["I like tea."]);
        assert!(knowledge.identity.is_none());
    }

    #[test]
    fn test_user_id_is_url_encoded() {
        let client = OmoideClient::new("http://localhost/", "k", "a b&c");
        assert_eq!(client.base_url, "http://localhost");
        assert_eq!(client.user_query(), "user_id=a%20b%26c");
    }
}
