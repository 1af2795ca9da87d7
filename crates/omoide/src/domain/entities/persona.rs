//! Persona - The configurable AI character
//!
//! Pure domain entity without infrastructure dependencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::domain::errors::DomainError;

/// Persona - identity plus the traits that shape every prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub traits: PersonaTraits,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Persona {
    /// Create a new Persona with generated ID and timestamps
    pub fn new(user_id: String, name: String, traits: PersonaTraits) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            traits,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Personality, style and profile of a persona
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaTraits {
    /// Trait labels, each belonging to a catalog category
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Speaking style labels ("uses emoji", "formal", ...)
    #[serde(default)]
    pub expression_prefs: BTreeSet<String>,
    /// 0-100 dial for response length
    pub verbosity_ratio: u8,
    #[serde(default)]
    pub character_profile: CharacterProfile,
}

impl PersonaTraits {
    pub fn with_verbosity(verbosity_ratio: u8) -> Self {
        Self {
            tags: BTreeSet::new(),
            expression_prefs: BTreeSet::new(),
            verbosity_ratio,
            character_profile: CharacterProfile::default(),
        }
    }

    /// Check the verbosity range and per-category selection bounds
    pub fn validate(&self, catalog: &TraitCatalog) -> Result<(), DomainError> {
        if self.verbosity_ratio > 100 {
            return Err(DomainError::Validation(format!(
                "verbosity_ratio must be within 0-100, got {}",
                self.verbosity_ratio
            )));
        }

        for category in &catalog.categories {
            let selected = self
                .tags
                .iter()
                .filter(|t| category.labels.iter().any(|l| l == *t))
                .count();
            if selected > category.max_selections {
                return Err(DomainError::Validation(format!(
                    "category '{}' allows at most {} selections, got {}",
                    category.name, category.max_selections, selected
                )));
            }
        }

        Ok(())
    }
}

impl Default for PersonaTraits {
    fn default() -> Self {
        Self::with_verbosity(50)
    }
}

/// Free-form character sheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterProfile {
    pub gender: Option<String>,
    pub age: Option<u32>,
    pub job: Option<String>,
    pub description: Option<String>,
    /// Typical daily routine, used for time awareness
    pub schedule: Option<String>,
}

impl CharacterProfile {
    /// True when none of gender/age/job/description carries a value
    pub fn is_empty(&self) -> bool {
        self.age.is_none()
            && [&self.gender, &self.job, &self.description]
                .iter()
                .all(|f| f.as_deref().map_or(true, |s| s.trim().is_empty()))
    }
}

/// A group of trait labels with a selection bound
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitCategory {
    pub name: String,
    pub max_selections: usize,
    pub labels: Vec<String>,
}

/// All trait categories, in display order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitCatalog {
    pub categories: Vec<TraitCategory>,
}

impl TraitCatalog {
    pub const UNCATEGORIZED: &'static str = "Other";

    /// Group selected tags by category, in catalog order.
    /// Tags missing from the catalog are collected under [`Self::UNCATEGORIZED`].
    pub fn group<'a>(&'a self, tags: &'a BTreeSet<String>) -> Vec<(&'a str, Vec<&'a str>)> {
        let mut groups: Vec<(&str, Vec<&str>)> = self
            .categories
            .iter()
            .map(|c| {
                let selected: Vec<&str> = tags
                    .iter()
                    .filter(|t| c.labels.iter().any(|l| l == *t))
                    .map(String::as_str)
                    .collect();
                (c.name.as_str(), selected)
            })
            .filter(|(_, selected)| !selected.is_empty())
            .collect();

        let other: Vec<&str> = tags
            .iter()
            .filter(|t| {
                !self
                    .categories
                    .iter()
                    .any(|c| c.labels.iter().any(|l| l == *t))
            })
            .map(String::as_str)
            .collect();
        if !other.is_empty() {
            groups.push((Self::UNCATEGORIZED, other));
        }

        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TraitCatalog {
        TraitCatalog {
            categories: vec![
                TraitCategory {
                    name: "Temperament".to_string(),
                    max_selections: 2,
                    labels: vec!["calm".into(), "cheerful".into(), "moody".into()],
                },
                TraitCategory {
                    name: "Interests".to_string(),
                    max_selections: 3,
                    labels: vec!["cooking".into(), "music".into()],
                },
            ],
        }
    }

    fn traits(tags: &[&str]) -> PersonaTraits {
        PersonaTraits {
            tags: tags.iter().map(|s| s.to_string()).collect(),
            ..PersonaTraits::default()
        }
    }

    #[test]
    fn test_selection_bound_is_enforced() {
        let ok = traits(&["calm", "cheerful", "music"]);
        assert!(ok.validate(&catalog()).is_ok());

        let too_many = traits(&["calm", "cheerful", "moody"]);
        assert!(matches!(
            too_many.validate(&catalog()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_verbosity_out_of_range_rejected() {
        let t = PersonaTraits::with_verbosity(101);
        assert!(t.validate(&TraitCatalog::default()).is_err());
    }

    #[test]
    fn test_group_keeps_catalog_order_and_collects_unknown() {
        let t = traits(&["music", "calm", "knitting"]);
        let catalog = catalog();
        let groups = catalog.group(&t.tags);
        assert_eq!(
            groups,
            vec![
                ("Temperament", vec!["calm"]),
                ("Interests", vec!["music"]),
                ("Other", vec!["knitting"]),
            ]
        );
    }

    #[test]
    fn test_profile_emptiness() {
        let mut p = CharacterProfile::default();
        assert!(p.is_empty());
        p.job = Some("  ".into());
        assert!(p.is_empty());
        p.age = Some(27);
        assert!(!p.is_empty());
    }
}
