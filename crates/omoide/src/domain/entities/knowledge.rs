//! Knowledge - Durable facts distilled from conversation
//!
//! Two kinds of facts survive a conversation:
//! - relation entries about named people/entities (user-side and persona-side)
//! - self-narrative: short first-person statements the persona made about itself

use serde::{Deserialize, Deserializer, Serialize};

/// Maximum number of self-narrative facts kept per persona
pub const SELF_NARRATIVE_CAP: usize = 10;

/// Common shape of both relation lists, used by the merger
pub trait RelationFact {
    /// Uniqueness key within its list
    fn key(&self) -> (&str, &str);
    fn desc(&self) -> Option<&str>;
    fn set_desc(&mut self, desc: String);
    fn episodes(&self) -> &[String];
    fn episodes_mut(&mut self) -> &mut Vec<String>;

    /// Legacy "no facts yet" rows were stored as entries with a blank name
    fn is_placeholder(&self) -> bool {
        self.key().0.trim().is_empty()
    }
}

/// Someone in the user's life, as learned from the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRelation {
    pub name: String,
    #[serde(rename = "type")]
    pub relation_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default)]
    pub episodes: Vec<String>,
}

impl UserRelation {
    pub fn new(name: impl Into<String>, relation_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relation_type: relation_type.into(),
            desc: None,
            episodes: Vec::new(),
        }
    }

    pub fn with_episodes<I, S>(mut self, episodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.episodes = episodes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }
}

impl RelationFact for UserRelation {
    fn key(&self) -> (&str, &str) {
        (&self.name, &self.relation_type)
    }
    fn desc(&self) -> Option<&str> {
        self.desc.as_deref()
    }
    fn set_desc(&mut self, desc: String) {
        self.desc = Some(desc);
    }
    fn episodes(&self) -> &[String] {
        &self.episodes
    }
    fn episodes_mut(&mut self) -> &mut Vec<String> {
        &mut self.episodes
    }
}

/// Someone in the persona's own (fictional) life
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaRelation {
    pub name: String,
    pub relation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default)]
    pub episodes: Vec<String>,
}

impl PersonaRelation {
    pub fn new(name: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relation: relation.into(),
            desc: None,
            episodes: Vec::new(),
        }
    }

    pub fn with_episodes<I, S>(mut self, episodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.episodes = episodes.into_iter().map(Into::into).collect();
        self
    }
}

impl RelationFact for PersonaRelation {
    fn key(&self) -> (&str, &str) {
        (&self.name, &self.relation)
    }
    fn desc(&self) -> Option<&str> {
        self.desc.as_deref()
    }
    fn set_desc(&mut self, desc: String) {
        self.desc = Some(desc);
    }
    fn episodes(&self) -> &[String] {
        &self.episodes
    }
    fn episodes_mut(&mut self) -> &mut Vec<String> {
        &mut self.episodes
    }
}

/// Identity facts the persona has settled on during conversation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaIdentity {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub age: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub job: Option<String>,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl PersonaIdentity {
    pub fn is_empty(&self) -> bool {
        [&self.name, &self.age, &self.job]
            .iter()
            .all(|f| f.as_deref().map_or(true, |s| s.trim().is_empty()))
            && self.notes.iter().all(|n| n.trim().is_empty())
    }
}

/// Everything the persona remembers, per conversation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeState {
    #[serde(default)]
    pub user_relations: Vec<UserRelation>,
    #[serde(default)]
    pub persona_relations: Vec<PersonaRelation>,
    #[serde(default)]
    pub self_narrative: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<PersonaIdentity>,
}

impl KnowledgeState {
    pub fn has_relations(&self) -> bool {
        self.user_relations.iter().any(|r| !r.is_placeholder())
            || self.persona_relations.iter().any(|r| !r.is_placeholder())
    }
}

/// Structured result of one relations extraction call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationExtraction {
    #[serde(default)]
    pub user_relations: Vec<UserRelation>,
    #[serde(default)]
    pub persona_relations: Vec<PersonaRelation>,
    #[serde(default, alias = "personaIdentity")]
    pub identity: Option<PersonaIdentity>,
}

impl RelationExtraction {
    pub fn is_empty(&self) -> bool {
        self.user_relations.is_empty()
            && self.persona_relations.is_empty()
            && self.identity.as_ref().map_or(true, PersonaIdentity::is_empty)
    }
}

/// Persisted cadence counter of the relations track
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationCounter {
    pub count: u32,
}

/// Accept `"27"`, `27` or `null` for free-text identity fields
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}
