//! Paced reply delivery
//!
//! Emits a generated reply as one AI message per sentence, strictly in
//! order, pausing between chunks the way a person types.

use crate::application::session::Session;
use crate::domain::services::{pacing_delay, split_sentences};
use crate::domain::{DomainError, Message, Sender};
use crate::ports::MessageRepository;

/// Persist `text` as sequential AI messages.
///
/// Typing is flagged true before the first chunk and false after the last
/// (also when an append fails). Delivery stops early if the session closes.
pub async fn deliver_reply(
    store: &dyn MessageRepository,
    session: &Session,
    text: &str,
) -> Result<Vec<Message>, DomainError> {
    let chunks = split_sentences(text);
    if chunks.is_empty() {
        return Ok(Vec::new());
    }

    session.set_typing(true);
    let result = emit_chunks(store, session, &chunks).await;
    session.set_typing(false);

    result
}

async fn emit_chunks(
    store: &dyn MessageRepository,
    session: &Session,
    chunks: &[String],
) -> Result<Vec<Message>, DomainError> {
    let mut delivered = Vec::with_capacity(chunks.len());

    for (i, chunk) in chunks.iter().enumerate() {
        if !session.is_live() {
            tracing::info!(
                conversation = %session.key(),
                delivered = delivered.len(),
                remaining = chunks.len() - i,
                "Session closed, dropping the rest of the reply"
            );
            break;
        }

        let message = store.append(session.key(), Sender::Ai, chunk).await?;
        delivered.push(message);

        if i + 1 < chunks.len() {
            tokio::time::sleep(pacing_delay(chunk)).await;
        }
    }

    Ok(delivered)
}
