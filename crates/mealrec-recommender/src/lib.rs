//! Dish recommender with an exploration phase and a personalized phase.
//!
//! The [`Recommender`] implements [`RecommendationPolicy`] for mealrec. Until
//! the user has made [`PERSONALIZATION_THRESHOLD`] selections it explores:
//! dishes that were never offered come first and are sampled at random.
//! Afterwards it returns a fixed-size list made of the user's favorites of the
//! cuisine plus the least offered remaining dishes. Ties in the personalized
//! phase are broken by menu order, so that phase is deterministic.

pub mod error;
pub mod resolve;

pub use error::{RecommendError, Result};
pub use resolve::{accept_selection, find_dish, resolve_choice, Accepted, DishResolution};

use mealrec_core::{
    Candidate, Dish, Menu, Phase, PreferenceStore, Recommendation, RecommendationPolicy, Slot,
};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::seq::{IteratorRandom, SliceRandom};
use std::cmp::Reverse;

/// Selections needed before recommendations become personalized.
pub const PERSONALIZATION_THRESHOLD: u64 = 10;
/// Upper bound of dishes offered per exploration round.
pub const EXPLORATION_BATCH: usize = 5;
/// Length of a personalized list.
pub const PERSONALIZED_LIST_LEN: usize = 7;
/// Favorite slots at the head of a personalized list.
pub const FAVORITE_SLOTS: usize = 2;
/// Cuisines offered at the start of an interactive round.
pub const CUISINE_SAMPLE: usize = 5;

macro_rules! debug_event {
    ($($arg:tt)*) => {
        #[cfg(feature = "telemetry")]
        tracing::debug!($($arg)*);
    };
}

pub fn phase_for(total_selections: u64) -> Phase {
    if total_selections < PERSONALIZATION_THRESHOLD {
        Phase::Exploration
    } else {
        Phase::Personalized
    }
}

#[derive(Debug)]
pub struct Recommender {
    rng: StdRng,
}

impl Default for Recommender {
    fn default() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Recommender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reproducible recommender, used by tests and `--seed`.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// All cuisines when there are at most `count`, otherwise a uniform
    /// random sample of `count` of them.
    pub fn sample_cuisines(&mut self, menu: &Menu, count: usize) -> Vec<String> {
        let cuisines: Vec<&str> = menu.cuisines().collect();
        if cuisines.len() <= count {
            return cuisines.into_iter().map(str::to_string).collect();
        }
        cuisines
            .choose_multiple(&mut self.rng, count)
            .map(|c| (*c).to_string())
            .collect()
    }

    fn explore(
        &mut self,
        cuisine: &str,
        names: &[String],
        prefs: &PreferenceStore,
    ) -> Vec<Candidate> {
        let dishes: Vec<Dish> = names
            .iter()
            .map(|n| Dish::new(cuisine, n.as_str()))
            .collect();
        let unoffered: Vec<&Dish> = dishes
            .iter()
            .filter(|d| prefs.peek(d).recommendation_count == 0)
            .collect();
        // Once every dish was offered, fall back to the whole cuisine.
        let pool: Vec<&Dish> = if unoffered.is_empty() {
            dishes.iter().collect()
        } else {
            unoffered
        };
        debug_event!(cuisine, pool = pool.len(), "exploration round");
        pool.choose_multiple(&mut self.rng, EXPLORATION_BATCH)
            .map(|d| Candidate {
                dish: (*d).clone(),
                slot: Slot::Explore,
            })
            .collect()
    }

    fn personalize(menu: &Menu, cuisine: &str, prefs: &PreferenceStore) -> Vec<Candidate> {
        let (own, others): (Vec<(usize, Dish)>, Vec<(usize, Dish)>) = menu
            .iter()
            .enumerate()
            .partition(|(_, d)| d.cuisine == cuisine);

        let mut by_favor = own;
        by_favor.sort_by_key(|(pos, d)| {
            let r = prefs.peek(d);
            (Reverse(r.selection_count), r.recommendation_count, *pos)
        });
        let mut rest = by_favor.split_off(FAVORITE_SLOTS.min(by_favor.len()));
        let favorites = by_favor;

        let fresh_key = |(pos, d): &(usize, Dish)| {
            let r = prefs.peek(d);
            (r.recommendation_count, Reverse(r.selection_count), *pos)
        };
        rest.sort_by_key(fresh_key);
        // Only reached when the cuisine itself cannot fill the list.
        let mut fallback = others;
        fallback.sort_by_key(fresh_key);

        let fresh_slots = PERSONALIZED_LIST_LEN - favorites.len();
        debug_event!(
            cuisine,
            favorites = favorites.len(),
            own_fresh = rest.len(),
            "personalized round"
        );
        favorites
            .into_iter()
            .map(|(_, dish)| Candidate {
                dish,
                slot: Slot::Favorite,
            })
            .chain(
                rest.into_iter()
                    .chain(fallback)
                    .take(fresh_slots)
                    .map(|(_, dish)| Candidate {
                        dish,
                        slot: Slot::Fresh,
                    }),
            )
            .collect()
    }
}

impl RecommendationPolicy for Recommender {
    type Error = RecommendError;

    /// Uniform pick over all cuisines; preferences play no role here.
    fn pick_cuisine(&mut self, menu: &Menu) -> Option<String> {
        menu.cuisines().choose(&mut self.rng).map(str::to_string)
    }

    fn recommend(
        &mut self,
        menu: &Menu,
        prefs: &mut PreferenceStore,
        cuisine: &str,
    ) -> Result<Recommendation> {
        let cuisine = menu
            .find_cuisine(cuisine)
            .ok_or_else(|| RecommendError::UnknownCuisine(cuisine.to_string()))?
            .to_string();
        let names = menu.dishes_in(&cuisine).unwrap_or_default();
        if names.is_empty() {
            return Err(RecommendError::EmptyCuisine(cuisine));
        }

        let phase = phase_for(prefs.total_selections());
        let candidates = match phase {
            Phase::Exploration => self.explore(&cuisine, names, prefs),
            Phase::Personalized => Self::personalize(menu, &cuisine, prefs),
        };
        prefs.record_recommendations(candidates.iter().map(|c| &c.dish));

        Ok(Recommendation {
            cuisine,
            phase,
            candidates,
        })
    }
}
