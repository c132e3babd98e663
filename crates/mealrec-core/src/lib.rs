//! Core types for mealrec: the menu, the per-dish preference counters and the
//! policy trait that turns both into a list of dishes to offer.

pub mod menu;
pub mod preference;

pub use menu::{Dish, Menu};
pub use preference::{PreferenceRecord, PreferenceStore, ResetConfirmation};

use serde::{Deserialize, Serialize};

/// Strategy that produced a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Exploration,
    Personalized,
}

/// Why a single dish ended up in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    /// Offered while exploring the cuisine.
    Explore,
    /// One of the most frequently selected dishes.
    Favorite,
    /// Rarely or never offered before.
    Fresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub dish: Dish,
    pub slot: Slot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub cuisine: String,
    pub phase: Phase,
    pub candidates: Vec<Candidate>,
}

impl Recommendation {
    pub fn dishes(&self) -> impl Iterator<Item = &Dish> {
        self.candidates.iter().map(|c| &c.dish)
    }

    /// Candidate at a 1-based position, as shown to the user.
    pub fn position(&self, index: usize) -> Option<&Candidate> {
        index.checked_sub(1).and_then(|i| self.candidates.get(i))
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Proposes dishes; never records a selection.
pub trait RecommendationPolicy {
    type Error;

    fn pick_cuisine(&mut self, menu: &Menu) -> Option<String>;

    /// Builds the list for `cuisine` and records every offered dish in `prefs`.
    fn recommend(
        &mut self,
        menu: &Menu,
        prefs: &mut PreferenceStore,
        cuisine: &str,
    ) -> Result<Recommendation, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recommendation_serializes_with_lowercase_tags() {
        let rec = Recommendation {
            cuisine: "Chinese".into(),
            phase: Phase::Personalized,
            candidates: vec![Candidate {
                dish: Dish::new("Chinese", "Dumplings"),
                slot: Slot::Favorite,
            }],
        };
        let value = serde_json::to_value(&rec).expect("serialize");
        assert_eq!(value["phase"], json!("personalized"));
        assert_eq!(value["candidates"][0]["slot"], json!("favorite"));
        assert_eq!(value["candidates"][0]["dish"]["name"], json!("Dumplings"));
    }

    #[test]
    fn position_is_one_based() {
        let rec = Recommendation {
            cuisine: "Chinese".into(),
            phase: Phase::Exploration,
            candidates: vec![Candidate {
                dish: Dish::new("Chinese", "Noodles"),
                slot: Slot::Explore,
            }],
        };
        assert!(rec.position(0).is_none());
        assert_eq!(rec.position(1).map(|c| c.dish.name.as_str()), Some("Noodles"));
        assert!(rec.position(2).is_none());
    }
}
