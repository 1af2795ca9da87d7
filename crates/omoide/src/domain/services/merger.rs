//! Knowledge Merger
//!
//! Folds freshly extracted facts into long-lived knowledge using exact
//! string/key dedup only.

use crate::domain::entities::{
    KnowledgeState, PersonaIdentity, RelationExtraction, RelationFact, SELF_NARRATIVE_CAP,
};

/// Union new self-statements into the narrative and keep the newest
/// [`SELF_NARRATIVE_CAP`]. Returns how many statements were new.
pub fn merge_self_narrative(existing: &mut Vec<String>, incoming: Vec<String>) -> usize {
    let incoming: Vec<String> = incoming
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if !incoming.is_empty() {
        existing.retain(|s| !s.trim().is_empty());
    }

    let mut added = 0;
    for fact in incoming {
        if !existing.contains(&fact) {
            existing.push(fact);
            added += 1;
        }
    }

    if existing.len() > SELF_NARRATIVE_CAP {
        let overflow = existing.len() - SELF_NARRATIVE_CAP;
        existing.drain(..overflow);
    }

    added
}

/// Merge extracted relation entries into a list keyed by [`RelationFact::key`].
///
/// Known keys get their episodes unioned (order-preserving) and their
/// description replaced by a new non-empty one; unknown keys are appended.
/// Returns how many entries were appended.
pub fn merge_relations<T: RelationFact>(existing: &mut Vec<T>, incoming: Vec<T>) -> usize {
    let incoming: Vec<T> = incoming.into_iter().filter(|r| !r.is_placeholder()).collect();
    if incoming.is_empty() {
        return 0;
    }

    existing.retain(|r| !r.is_placeholder());

    let mut appended = 0;
    for mut entry in incoming {
        let position = existing.iter().position(|e| e.key() == entry.key());
        match position {
            Some(i) => {
                let target = &mut existing[i];
                let new_episodes = std::mem::take(entry.episodes_mut());
                union_into(target.episodes_mut(), new_episodes);
                if let Some(desc) = entry.desc().map(str::trim).filter(|d| !d.is_empty()) {
                    target.set_desc(desc.to_string());
                }
            }
            None => {
                let episodes = std::mem::take(entry.episodes_mut());
                union_into(entry.episodes_mut(), episodes);
                existing.push(entry);
                appended += 1;
            }
        }
    }

    appended
}

/// Apply a relations extraction (both lists plus the optional identity block)
pub fn merge_extraction(state: &mut KnowledgeState, extraction: RelationExtraction) {
    merge_relations(&mut state.user_relations, extraction.user_relations);
    merge_relations(&mut state.persona_relations, extraction.persona_relations);

    if let Some(identity) = extraction.identity.filter(|i| !i.is_empty()) {
        merge_identity(&mut state.identity, identity);
    }
}

fn merge_identity(existing: &mut Option<PersonaIdentity>, incoming: PersonaIdentity) {
    let current = existing.get_or_insert_with(PersonaIdentity::default);

    for (slot, value) in [
        (&mut current.name, incoming.name),
        (&mut current.age, incoming.age),
        (&mut current.job, incoming.job),
    ] {
        if let Some(v) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            *slot = Some(v);
        }
    }

    union_into(&mut current.notes, incoming.notes);
}

/// Order-preserving union; also drops duplicates already present in `target`
fn union_into(target: &mut Vec<String>, incoming: Vec<String>) {
    let mut merged: Vec<String> = Vec::with_capacity(target.len() + incoming.len());
    for item in target.drain(..).chain(incoming) {
        let item = item.trim().to_string();
        if !item.is_empty() && !merged.contains(&item) {
            merged.push(item);
        }
    }
    *target = merged;
}
