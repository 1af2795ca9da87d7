//! Prompt Composer
//!
//! Assembles the per-turn instruction text from persona traits, merged
//! knowledge, global guidance and the wall-clock time. Pure and
//! deterministic: identical inputs produce identical output.

use chrono::{DateTime, FixedOffset, Timelike};

use crate::domain::entities::{KnowledgeState, Persona, RelationFact, TraitCatalog};
use crate::domain::value_objects::VerbosityBand;

/// Everything the composer reads
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub persona: &'a Persona,
    pub catalog: &'a TraitCatalog,
    pub knowledge: &'a KnowledgeState,
    pub global_guideline: &'a str,
    /// Local wall-clock time of the turn
    pub now: DateTime<FixedOffset>,
}

/// Build the system instruction for one turn
pub fn compose_instruction(ctx: &PromptContext<'_>) -> String {
    let persona = ctx.persona;
    let traits = &persona.traits;
    let mut prompt = format!(
        r#"YOU ARE "{name}", a persona chatting one-on-one with the user.
Stay in character at all times. Speak as {name} in the first person and never mention being an AI or a language model.
"#,
        name = persona.name,
    );

    // Traits, grouped by category
    prompt.push_str("\n## Personality\n");
    let groups = ctx.catalog.group(&traits.tags);
    if groups.is_empty() {
        prompt.push_str("- No specific traits selected; be natural and friendly.\n");
    }
    for (category, labels) in groups {
        prompt.push_str(&format!("- {}: {}\n", category, labels.join(", ")));
    }
    if !traits.expression_prefs.is_empty() {
        let prefs: Vec<&str> = traits.expression_prefs.iter().map(String::as_str).collect();
        prompt.push_str(&format!("- Expression style: {}\n", prefs.join(", ")));
    }

    let band = VerbosityBand::from_ratio(traits.verbosity_ratio);
    prompt.push_str(&format!("\n## Response Length\n{}\n", band.instruction()));

    let profile = &traits.character_profile;
    if !profile.is_empty() {
        prompt.push_str("\n## Character Profile\n");
        push_field(&mut prompt, "Gender", profile.gender.as_deref());
        if let Some(age) = profile.age {
            prompt.push_str(&format!("- Age: {}\n", age));
        }
        push_field(&mut prompt, "Job", profile.job.as_deref());
        push_field(&mut prompt, "Description", profile.description.as_deref());
    }

    if !ctx.global_guideline.trim().is_empty() {
        prompt.push_str(&format!("\n## Guidelines\n{}\n", ctx.global_guideline.trim()));
    }

    if let Some(identity) = ctx.knowledge.identity.as_ref().filter(|i| !i.is_empty()) {
        prompt.push_str("\n## Who You Have Said You Are\n");
        push_field(&mut prompt, "Name", identity.name.as_deref());
        push_field(&mut prompt, "Age", identity.age.as_deref());
        push_field(&mut prompt, "Job", identity.job.as_deref());
        for note in &identity.notes {
            prompt.push_str(&format!("- {}\n", note));
        }
    }

    if ctx.knowledge.has_relations() {
        prompt.push_str("\n## Relationships (stay consistent with these)\n");
        push_relations(
            &mut prompt,
            "People in the user's life",
            &ctx.knowledge.user_relations,
        );
        push_relations(
            &mut prompt,
            "People in your life",
            &ctx.knowledge.persona_relations,
        );
    }

    let narrative: Vec<&String> = ctx
        .knowledge
        .self_narrative
        .iter()
        .filter(|s| !s.trim().is_empty())
        .collect();
    if !narrative.is_empty() {
        prompt.push_str("\n## Things You Have Said About Yourself (never contradict these)\n");
        for fact in narrative {
            prompt.push_str(&format!("- {}\n", fact));
        }
    }

    push_time_awareness(&mut prompt, ctx.now, profile.schedule.as_deref());

    prompt
}

fn push_field(prompt: &mut String, label: &str, value: Option<&str>) {
    if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
        prompt.push_str(&format!("- {}: {}\n", label, v));
    }
}

fn push_relations<T: RelationFact>(prompt: &mut String, heading: &str, relations: &[T]) {
    let real: Vec<&T> = relations.iter().filter(|r| !r.is_placeholder()).collect();
    if real.is_empty() {
        return;
    }

    prompt.push_str(&format!("### {}\n", heading));
    for relation in real {
        let (name, kind) = relation.key();
        prompt.push_str(&format!("- {} ({})", name, kind));
        if let Some(desc) = relation.desc().filter(|d| !d.trim().is_empty()) {
            prompt.push_str(&format!(": {}", desc.trim()));
        }
        if !relation.episodes().is_empty() {
            prompt.push_str(&format!(" | episodes: {}", relation.episodes().join("; ")));
        }
        prompt.push('\n');
    }
}

/// Coarse period of the day used to anchor the persona's routine
fn day_period(hour: u32) -> &'static str {
    match hour {
        5..=8 => "early morning",
        9..=11 => "morning",
        12..=13 => "midday",
        14..=17 => "afternoon",
        18..=21 => "evening",
        _ => "late night",
    }
}

fn push_time_awareness(prompt: &mut String, now: DateTime<FixedOffset>, schedule: Option<&str>) {
    prompt.push_str(&format!(
        "\n## Current Time\nIt is now {} local time ({}).\n",
        now.format("%Y-%m-%d (%A) %H:%M"),
        day_period(now.hour()),
    ));
    prompt.push_str(
        "Behave consistently with what you would plausibly be doing at this hour of your daily routine \
         (waking up, working, eating, relaxing, getting sleepy) and let it color your replies.\n",
    );
    if let Some(schedule) = schedule.map(str::trim).filter(|s| !s.is_empty()) {
        prompt.push_str(&format!("Your usual routine: {}\n", schedule));
    }
}
