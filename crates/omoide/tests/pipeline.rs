//! End-to-end tests of the memory pipeline over the in-memory adapters

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, FixedOffset, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use omoide::adapters::{
    InMemoryKnowledgeRepository, InMemoryMessageStore, InMemoryPersonaRepository,
    InMemorySettingsRepository,
};
use omoide::application::{
    deliver_reply, ChatService, ConfigService, KnowledgeExtractor, RelationsOutcome,
    RelationsTrack, ReplyOutcome, SelfNarrativeTrack, SessionRegistry, SessionToken,
    APOLOGY_MESSAGE,
};
use omoide::{
    ChatMessage, CompletionOptions, CompletionResponse, ConversationKey, DomainError,
    GlobalSettings, KnowledgeRepository, KnowledgeState, LlmProvider, Message,
    MessageRepository, MessageRole, Persona, PersonaRepository, PersonaTraits, Sender,
    TokenUsage, UserRelation,
};

// =============================================================================
// Scripted text-generation service
// =============================================================================

type Hook = Box<dyn FnOnce() + Send>;

/// Answers by call kind; `None` makes that kind of call fail
#[derive(Default)]
struct ScriptedLlm {
    chat: Mutex<Option<String>>,
    /// Runs once, inside the next chat completion
    on_chat: Mutex<Option<Hook>>,
    narrative: Mutex<Option<String>>,
    relations: Mutex<Option<String>>,
    chat_requests: Mutex<Vec<Vec<ChatMessage>>>,
    narrative_calls: AtomicUsize,
    relations_calls: AtomicUsize,
}

impl ScriptedLlm {
    fn chatting(reply: &str) -> Self {
        let llm = Self::default();
        llm.set_chat(Some(reply));
        llm
    }

    fn set_chat(&self, reply: Option<&str>) {
        *self.chat.lock().unwrap() = reply.map(str::to_string);
    }

    fn set_narrative(&self, reply: Option<&str>) {
        *self.narrative.lock().unwrap() = reply.map(str::to_string);
    }

    fn set_relations(&self, reply: Option<&str>) {
        *self.relations.lock().unwrap() = reply.map(str::to_string);
    }

    fn during_next_chat(&self, hook: impl FnOnce() + Send + 'static) {
        *self.on_chat.lock().unwrap() = Some(Box::new(hook));
    }

    fn last_chat_request(&self) -> Vec<ChatMessage> {
        self.chat_requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _options: &CompletionOptions,
    ) -> Result<CompletionResponse, DomainError> {
        let system = messages
            .first()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let reply = if system.starts_with("You analyze numbered") {
            self.relations_calls.fetch_add(1, Ordering::SeqCst);
            // Let a concurrent exchange interleave with this one
            tokio::task::yield_now().await;
            self.relations.lock().unwrap().clone()
        } else if system.starts_with("You analyze chat") {
            self.narrative_calls.fetch_add(1, Ordering::SeqCst);
            self.narrative.lock().unwrap().clone()
        } else {
            self.chat_requests.lock().unwrap().push(messages.to_vec());
            let hook = self.on_chat.lock().unwrap().take();
            if let Some(hook) = hook {
                hook();
            }
            self.chat.lock().unwrap().clone()
        };

        match reply {
            Some(content) => Ok(CompletionResponse {
                content,
                model: "scripted".to_string(),
                usage: TokenUsage::default(),
            }),
            None => Err(DomainError::GenerationFailure("scripted failure".to_string())),
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    llm: Arc<ScriptedLlm>,
    messages: Arc<InMemoryMessageStore>,
    knowledge: Arc<InMemoryKnowledgeRepository>,
    personas: Arc<InMemoryPersonaRepository>,
    config: Arc<ConfigService>,
    sessions: Arc<SessionRegistry>,
    chat: ChatService,
}

impl Harness {
    fn new(settings: GlobalSettings, llm: ScriptedLlm) -> Self {
        let llm = Arc::new(llm);
        let messages = Arc::new(InMemoryMessageStore::new());
        let knowledge = Arc::new(InMemoryKnowledgeRepository::new());
        let personas = Arc::new(InMemoryPersonaRepository::new());
        let config = Arc::new(ConfigService::new(Arc::new(
            InMemorySettingsRepository::new(settings),
        )));
        let sessions = Arc::new(SessionRegistry::new());

        let chat = ChatService::new(
            messages.clone(),
            personas.clone(),
            knowledge.clone(),
            llm.clone(),
            config.clone(),
            sessions.clone(),
        );

        Self {
            llm,
            messages,
            knowledge,
            personas,
            config,
            sessions,
            chat,
        }
    }

    async fn persona(&self, user_id: &str, name: &str) -> ConversationKey {
        let persona = Persona::new(
            user_id.to_string(),
            name.to_string(),
            PersonaTraits::default(),
        );
        self.personas.save(&persona).await.unwrap();
        ConversationKey::new(user_id, persona.id)
    }

    /// One user turn plus the persona's reply, which must be produced
    async fn exchange(&self, key: &ConversationKey, text: &str) -> ReplyOutcome {
        let (_, reply) = self.chat.send_and_respond(key, text).await.unwrap();
        reply.expect("conversation should still be active")
    }

    fn relations_track(&self) -> RelationsTrack {
        RelationsTrack::new(
            self.extractor(),
            self.messages.clone(),
            self.knowledge.clone(),
            self.config.clone(),
        )
    }

    fn narrative_track(&self, token: SessionToken) -> SelfNarrativeTrack {
        SelfNarrativeTrack::new(
            token,
            "Hana".to_string(),
            self.extractor(),
            self.knowledge.clone(),
            self.config.clone(),
        )
    }

    fn extractor(&self) -> Arc<KnowledgeExtractor> {
        Arc::new(KnowledgeExtractor::new(self.llm.clone()))
    }

    async fn knowledge_of(&self, key: &ConversationKey) -> KnowledgeState {
        self.knowledge.find(key).await.unwrap().unwrap_or_default()
    }
}

fn settings_with(f: impl FnOnce(&mut GlobalSettings)) -> GlobalSettings {
    let mut settings = GlobalSettings::default();
    f(&mut settings);
    settings
}

fn conversation(n: usize) -> Vec<Message> {
    let start = Utc::now();
    (0..n)
        .map(|i| {
            let sender = if i % 2 == 0 { Sender::User } else { Sender::Ai };
            Message::new(
                sender,
                format!("message {}", i + 1),
                start + ChronoDuration::milliseconds(i as i64),
            )
        })
        .collect()
}

const MOM_DINNER: &str = r#"{"userRelations":[{"name":"Mom","type":"family","episodes":["ate dinner"]}],"personaRelations":[]}"#;

// =============================================================================
// Self-narrative track
// =============================================================================

#[tokio::test]
async fn test_narrative_cursor_advances_on_failed_extraction() {
    let h = Harness::new(GlobalSettings::default(), ScriptedLlm::default());
    let key = h.persona("user-1", "Hana").await;
    let mut track = h.narrative_track(SessionToken::detached(key));
    let messages = conversation(23);

    let mut triggered_at = Vec::new();
    for n in 1..=23 {
        if track.observe(&messages[..n]).await {
            triggered_at.push(n);
        }
    }

    assert_eq!(triggered_at, vec![10, 20]);
    assert_eq!(track.cursor().last_extracted_message_count, 20);
    assert_eq!(h.llm.narrative_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_narrative_catches_up_from_a_coalesced_snapshot() {
    let h = Harness::new(GlobalSettings::default(), ScriptedLlm::default());
    h.llm.set_narrative(Some(r#"["I grew up by the sea."]"#));
    let key = h.persona("user-1", "Hana").await;
    let mut track = h.narrative_track(SessionToken::detached(key.clone()));

    // A slow subscriber may only ever see the 14-message snapshot
    assert!(track.observe(&conversation(14)).await);
    assert_eq!(track.cursor().last_extracted_message_count, 14);
    assert!(!track.observe(&conversation(23)).await);

    let state = h.knowledge_of(&key).await;
    assert_eq!(state.self_narrative, vec!["I grew up by the sea."]);
}

#[tokio::test]
async fn test_narrative_watcher_merges_facts_from_live_conversation() {
    let h = Harness::new(
        settings_with(|s| s.extraction_interval = 2),
        ScriptedLlm::chatting("Nice to meet you."),
    );
    h.llm
        .set_narrative(Some(r#"["I love jasmine tea.", "I love jasmine tea."]"#));
    let key = h.persona("user-1", "Hana").await;

    h.exchange(&key, "Hi!").await;

    let mut narrative = Vec::new();
    for _ in 0..200 {
        narrative = h.knowledge_of(&key).await.self_narrative;
        if !narrative.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(narrative, vec!["I love jasmine tea."]);
}

// =============================================================================
// Relations track
// =============================================================================

#[tokio::test]
async fn test_relations_merge_at_threshold_and_reset() {
    let h = Harness::new(
        settings_with(|s| s.relation_threshold = 2),
        ScriptedLlm::chatting("Oh, that sounds lovely."),
    );
    h.llm.set_relations(Some(
        r#"```json
{"userRelations":[{"name":"Mom","type":"family","episodes":["ate dinner"]}],
 "personaRelations":[],
 "identity":{"name":"Hana","age":27,"job":null,"notes":[]}}
```"#,
    ));
    let key = h.persona("user-1", "Hana").await;

    let first = h.exchange(&key, "I ate dinner with Mom.").await;
    assert_eq!(first.relations, Some(RelationsOutcome::Counted(1)));

    let second = h.exchange(&key, "She made curry.").await;
    assert_eq!(second.relations, Some(RelationsOutcome::Merged));
    assert_eq!(h.knowledge.load_counter(&key).await.unwrap().count, 0);

    let state = h.knowledge_of(&key).await;
    assert_eq!(state.user_relations.len(), 1);
    assert_eq!(state.user_relations[0].episodes, vec!["ate dinner"]);
    let identity = state.identity.unwrap();
    assert_eq!(identity.age.as_deref(), Some("27"));
    assert!(identity.job.is_none());

    // The next cycle adds an episode to the same entry
    h.llm.set_relations(Some(
        r#"{"userRelations":[{"name":"Mom","type":"family","episodes":["ate dinner","called"]}],"personaRelations":[]}"#,
    ));
    h.exchange(&key, "Mom called today.").await;
    h.exchange(&key, "We talked for an hour.").await;

    let state = h.knowledge_of(&key).await;
    assert_eq!(state.user_relations.len(), 1);
    assert_eq!(state.user_relations[0].episodes, vec!["ate dinner", "called"]);
}

#[tokio::test]
async fn test_relations_failure_keeps_counter_for_retry() {
    let h = Harness::new(
        settings_with(|s| s.relation_threshold = 2),
        ScriptedLlm::chatting("I see."),
    );
    let key = h.persona("user-1", "Hana").await;

    let mut outcomes = Vec::new();
    for text in ["one", "two", "three"] {
        outcomes.push(h.exchange(&key, text).await.relations);
    }

    assert_eq!(
        outcomes,
        vec![
            Some(RelationsOutcome::Counted(1)),
            Some(RelationsOutcome::Aborted(2)),
            Some(RelationsOutcome::Aborted(3)),
        ]
    );
    assert_eq!(h.knowledge.load_counter(&key).await.unwrap().count, 3);
    assert!(!h.knowledge_of(&key).await.has_relations());

    // Extraction recovers on the next exchange
    h.llm.set_relations(Some(MOM_DINNER));
    let reply = h.exchange(&key, "four").await;
    assert_eq!(reply.relations, Some(RelationsOutcome::Merged));
    assert_eq!(h.knowledge.load_counter(&key).await.unwrap().count, 0);
}

#[tokio::test]
async fn test_overlapping_relation_extractions_stay_deduplicated() {
    let h = Harness::new(
        settings_with(|s| s.relation_threshold = 1),
        ScriptedLlm::default(),
    );
    h.llm.set_relations(Some(
        r#"{"userRelations":[{"name":"Mom","type":"family","episodes":["ate dinner","called","ate dinner"]}],"personaRelations":[{"name":"Mochi","relation":"cat","episodes":["napped"]}]}"#,
    ));
    let key = h.persona("user-1", "Hana").await;
    h.messages
        .append(&key, Sender::User, "I ate dinner with Mom.")
        .await
        .unwrap();

    let token = SessionToken::detached(key.clone());
    let track = h.relations_track();
    let (a, b) = tokio::join!(
        track.record_exchange(&token, "Hana"),
        track.record_exchange(&token, "Hana"),
    );

    assert_eq!(a, RelationsOutcome::Merged);
    assert_eq!(b, RelationsOutcome::Merged);
    assert_eq!(h.llm.relations_calls.load(Ordering::SeqCst), 2);

    let state = h.knowledge_of(&key).await;
    assert_eq!(state.user_relations.len(), 1);
    assert_eq!(state.user_relations[0].episodes, vec!["ate dinner", "called"]);
    assert_eq!(state.persona_relations.len(), 1);
    assert_eq!(state.persona_relations[0].episodes, vec!["napped"]);
}

#[tokio::test]
async fn test_legacy_placeholders_purged_on_first_real_merge() {
    let h = Harness::new(
        settings_with(|s| s.relation_threshold = 1),
        ScriptedLlm::default(),
    );
    h.llm.set_relations(Some(MOM_DINNER));
    let key = h.persona("user-1", "Hana").await;

    let legacy = KnowledgeState {
        user_relations: vec![UserRelation::new("", "")],
        ..Default::default()
    };
    h.knowledge.save(&key, &legacy).await.unwrap();

    let outcome = h
        .relations_track()
        .record_exchange(&SessionToken::detached(key.clone()), "Hana")
        .await;
    assert_eq!(outcome, RelationsOutcome::Merged);

    let state = h.knowledge_of(&key).await;
    assert_eq!(state.user_relations.len(), 1);
    assert_eq!(state.user_relations[0].name, "Mom");
}

#[tokio::test]
async fn test_relations_skip_silently_when_knowledge_store_is_down() {
    let h = Harness::new(
        settings_with(|s| s.relation_threshold = 1),
        ScriptedLlm::default(),
    );
    h.llm.set_relations(Some(MOM_DINNER));
    let key = h.persona("user-1", "Hana").await;

    h.knowledge.set_available(false);
    let outcome = h
        .relations_track()
        .record_exchange(&SessionToken::detached(key.clone()), "Hana")
        .await;
    assert_eq!(outcome, RelationsOutcome::Skipped);
    assert_eq!(h.llm.relations_calls.load(Ordering::SeqCst), 0);

    h.knowledge.set_available(true);
    assert_eq!(h.knowledge.load_counter(&key).await.unwrap().count, 0);
    assert!(h.knowledge.find(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_narrative_cursor_advances_when_knowledge_store_is_down() {
    let h = Harness::new(GlobalSettings::default(), ScriptedLlm::default());
    h.llm.set_narrative(Some(r#"["I grew up by the sea."]"#));
    let key = h.persona("user-1", "Hana").await;
    let mut track = h.narrative_track(SessionToken::detached(key.clone()));

    h.knowledge.set_available(false);
    assert!(track.observe(&conversation(10)).await);
    assert_eq!(track.cursor().last_extracted_message_count, 10);
    assert_eq!(h.llm.narrative_calls.load(Ordering::SeqCst), 1);

    // The batch is not retried once the store is back
    h.knowledge.set_available(true);
    assert!(!track.observe(&conversation(12)).await);
    assert!(h.knowledge.find(&key).await.unwrap().is_none());
}

// =============================================================================
// Session liveness
// =============================================================================

#[tokio::test]
async fn test_late_results_from_switched_session_are_discarded() {
    let h = Harness::new(
        settings_with(|s| s.relation_threshold = 1),
        ScriptedLlm::default(),
    );
    h.llm.set_relations(Some(MOM_DINNER));
    h.llm.set_narrative(Some(r#"["I work at a flower shop."]"#));
    let hana = h.persona("user-1", "Hana").await;
    let ren = h.persona("user-1", "Ren").await;

    let first = h.chat.open_session(hana.clone()).await.unwrap();
    let token = first.token();
    h.chat.open_session(ren.clone()).await.unwrap();
    assert!(!token.is_live());
    assert_eq!(h.sessions.current("user-1").unwrap().key(), &ren);

    let outcome = h.relations_track().record_exchange(&token, "Hana").await;
    assert_eq!(outcome, RelationsOutcome::Discarded);

    let mut track = h.narrative_track(token);
    assert!(track.observe(&conversation(10)).await);
    assert_eq!(track.cursor().last_extracted_message_count, 10);

    assert!(h.knowledge.find(&hana).await.unwrap().is_none());
}

#[tokio::test]
async fn test_late_reply_does_not_reopen_switched_conversation() {
    let h = Harness::new(
        settings_with(|s| s.relation_threshold = 1),
        ScriptedLlm::chatting("Welcome back."),
    );
    h.llm.set_relations(Some(MOM_DINNER));
    let hana = h.persona("user-1", "Hana").await;
    let ren = h.persona("user-1", "Ren").await;

    h.chat.send(&hana, "I ate dinner with Mom.").await.unwrap();
    let current = h.chat.open_session(ren.clone()).await.unwrap();

    // The reply task for Hana only starts after the switch
    assert!(h.chat.respond(&hana).await.unwrap().is_none());

    assert!(current.is_live());
    assert_eq!(h.sessions.current("user-1").unwrap().key(), &ren);
    assert!(h.llm.last_chat_request().is_empty());
    assert_eq!(h.messages.count(&hana).await.unwrap(), 1);
    assert_eq!(h.knowledge.load_counter(&hana).await.unwrap().count, 0);
}

#[tokio::test]
async fn test_switch_during_generation_is_not_counted() {
    let h = Harness::new(
        settings_with(|s| s.relation_threshold = 1),
        ScriptedLlm::chatting("Mom sounds wonderful."),
    );
    h.llm.set_relations(Some(MOM_DINNER));
    let hana = h.persona("user-1", "Hana").await;
    let ren = h.persona("user-1", "Ren").await;

    h.chat.send(&hana, "I ate dinner with Mom.").await.unwrap();
    let sessions = h.sessions.clone();
    h.llm.during_next_chat(move || {
        sessions.activate(ren);
    });

    let reply = h.chat.respond(&hana).await.unwrap().unwrap();

    assert!(reply.messages.is_empty());
    assert_eq!(reply.relations, None);
    assert_eq!(h.messages.count(&hana).await.unwrap(), 1);
    assert_eq!(h.knowledge.load_counter(&hana).await.unwrap().count, 0);
    assert_eq!(h.llm.relations_calls.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Chat turn
// =============================================================================

#[tokio::test]
async fn test_failed_completion_persists_apology() {
    let h = Harness::new(GlobalSettings::default(), ScriptedLlm::default());
    let key = h.persona("user-1", "Hana").await;

    let reply = h.exchange(&key, "Are you there?").await;

    assert!(!reply.generated);
    assert_eq!(reply.messages.len(), 1);
    assert_eq!(reply.messages[0].text, APOLOGY_MESSAGE);
    assert_eq!(reply.relations, Some(RelationsOutcome::Counted(1)));

    let log = h.messages.recent(&key, 10).await.unwrap();
    let texts: Vec<_> = log.iter().map(|m| (m.sender, m.text.as_str())).collect();
    assert_eq!(
        texts,
        vec![(Sender::User, "Are you there?"), (Sender::Ai, APOLOGY_MESSAGE)]
    );
}

#[tokio::test]
async fn test_send_surfaces_store_unavailable() {
    let h = Harness::new(GlobalSettings::default(), ScriptedLlm::chatting("Hi."));
    let key = h.persona("user-1", "Hana").await;
    h.chat.open_session(key.clone()).await.unwrap();

    h.messages.set_available(false);
    let err = h.chat.send(&key, "hello").await.unwrap_err();
    assert!(matches!(err, DomainError::StoreUnavailable(_)));

    h.messages.set_available(true);
    assert_eq!(h.messages.count(&key).await.unwrap(), 0);
}

#[tokio::test]
async fn test_send_rejects_blank_text_and_foreign_persona() {
    let h = Harness::new(GlobalSettings::default(), ScriptedLlm::chatting("Hi."));
    let key = h.persona("user-1", "Hana").await;

    let err = h.chat.send(&key, "   ").await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let intruder = ConversationKey::new("user-2", key.persona_id);
    let err = h.chat.send(&intruder, "hello").await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn test_prompt_carries_knowledge_history_and_time() {
    let h = Harness::new(GlobalSettings::default(), ScriptedLlm::chatting("Mochi is asleep."));
    let key = h.persona("user-1", "Hana").await;
    h.knowledge
        .save(
            &key,
            &KnowledgeState {
                self_narrative: vec!["I have a cat named Mochi.".to_string()],
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
    let chat = ChatService::new(
        h.messages.clone(),
        h.personas.clone(),
        h.knowledge.clone(),
        h.llm.clone(),
        h.config.clone(),
        h.sessions.clone(),
    )
    .with_clock(Arc::new(move || {
        tokyo.with_ymd_and_hms(2024, 5, 4, 21, 15, 0).unwrap()
    }));

    chat.send_and_respond(&key, "How is your cat?").await.unwrap();

    let request = h.llm.last_chat_request();
    assert_eq!(request[0].role, MessageRole::System);
    let system = &request[0].content;
    assert!(system.contains("YOU ARE \"Hana\""));
    assert!(system.contains("Reply in 3-5 sentences."));
    assert!(system.contains("I have a cat named Mochi."));
    assert!(system.contains("2024-05-04 (Saturday) 21:15"));

    let last = request.last().unwrap();
    assert_eq!(last.role, MessageRole::User);
    assert_eq!(last.content, "How is your cat?");
}

// =============================================================================
// Paced delivery
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_reply_is_delivered_sentence_by_sentence() {
    let store = Arc::new(InMemoryMessageStore::new());
    let registry = SessionRegistry::new();
    let key = ConversationKey::new("user-1", uuid::Uuid::new_v4());
    let session = registry.activate(key.clone());

    let started = tokio::time::Instant::now();
    let delivery = tokio::spawn({
        let store = store.clone();
        let session = session.clone();
        async move {
            deliver_reply(store.as_ref(), &session, "Hello there. How are you?\nI'm fine!").await
        }
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(session.is_typing());
    assert_eq!(store.count(&key).await.unwrap(), 1);

    let delivered = delivery.await.unwrap().unwrap();
    let texts: Vec<_> = delivered.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["Hello there.", "How are you?", "I'm fine!"]);
    assert!(delivered.iter().all(|m| m.sender == Sender::Ai));
    assert!(!session.is_typing());

    // 12 chars * 50ms twice, nothing after the last chunk
    assert!(started.elapsed() >= Duration::from_millis(1200));
    assert!(started.elapsed() < Duration::from_millis(1800));
}

#[tokio::test(start_paused = true)]
async fn test_switching_persona_stops_delivery() {
    let store = Arc::new(InMemoryMessageStore::new());
    let registry = SessionRegistry::new();
    let key = ConversationKey::new("user-1", uuid::Uuid::new_v4());
    let session = registry.activate(key.clone());

    let delivery = tokio::spawn({
        let store = store.clone();
        let session = session.clone();
        async move { deliver_reply(store.as_ref(), &session, "First. Second. Third.").await }
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    registry.activate(ConversationKey::new("user-1", uuid::Uuid::new_v4()));

    let delivered = delivery.await.unwrap().unwrap();
    assert_eq!(delivered.len(), 1);
    assert_eq!(store.count(&key).await.unwrap(), 1);
    assert!(!session.is_typing());
}
