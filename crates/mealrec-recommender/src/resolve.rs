//! Turning user input into a dish and recording the final choice.

use crate::error::{RecommendError, Result};
use mealrec_core::{Dish, Menu, PreferenceStore, Recommendation};
use serde::Serialize;

/// Outcome of matching a typed dish name against the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DishResolution {
    /// The dish belongs to the active cuisine.
    Found(Dish),
    /// The dish exists, but under another cuisine.
    CrossCuisineFound(Dish),
    /// Nothing on the menu has this name.
    NotFound { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Accepted {
    pub dish: Dish,
    /// True when the dish was not on the menu and had to be added.
    pub added_to_menu: bool,
}

/// Case-insensitive exact lookup of `name`, first in the active cuisine and
/// then across the whole menu. Does not touch any counter.
pub fn find_dish(menu: &Menu, active_cuisine: &str, name: &str) -> DishResolution {
    if let Some(dish) = menu.find_in_cuisine(active_cuisine, name) {
        return DishResolution::Found(dish);
    }
    match menu.find_anywhere(name) {
        Some(dish) => DishResolution::CrossCuisineFound(dish),
        None => DishResolution::NotFound {
            name: name.trim().to_string(),
        },
    }
}

/// Interprets a reply to a recommendation list: a 1-based index picks a
/// candidate, anything else is looked up by name.
pub fn resolve_choice(
    menu: &Menu,
    recommendation: &Recommendation,
    input: &str,
) -> Result<DishResolution> {
    let input = input.trim();
    if input.is_empty() {
        return Err(RecommendError::AmbiguousSelection(input.to_string()));
    }
    if input.chars().all(|c| c.is_ascii_digit()) {
        let candidate = input
            .parse::<usize>()
            .ok()
            .and_then(|index| recommendation.position(index))
            .ok_or_else(|| RecommendError::AmbiguousSelection(input.to_string()))?;
        let dish = candidate.dish.clone();
        return Ok(if dish.cuisine == recommendation.cuisine {
            DishResolution::Found(dish)
        } else {
            DishResolution::CrossCuisineFound(dish)
        });
    }
    Ok(find_dish(menu, &recommendation.cuisine, input))
}

/// Records the user's final choice. An unknown dish is added to the menu
/// under `active_cuisine` before it is recorded.
pub fn accept_selection(
    menu: &mut Menu,
    prefs: &mut PreferenceStore,
    active_cuisine: &str,
    resolution: DishResolution,
) -> Accepted {
    let (dish, added_to_menu) = match resolution {
        DishResolution::Found(dish) | DishResolution::CrossCuisineFound(dish) => (dish, false),
        DishResolution::NotFound { name } => {
            let dish = Dish::new(active_cuisine.trim(), name.trim());
            let added = menu.insert(dish.clone());
            (dish, added)
        }
    };
    prefs.record_selection(&dish);
    Accepted {
        dish,
        added_to_menu,
    }
}
