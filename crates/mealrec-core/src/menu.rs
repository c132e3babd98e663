//! The dish catalog.
//!
//! A [`Menu`] keeps cuisines in the order they were first seen and, inside
//! each cuisine, dishes in insertion order. That order is the stable
//! tie-break used everywhere a ranking needs one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Menu used when no menu file exists or it holds no valid line.
pub const DEFAULT_MENU: &[(&str, &str)] = &[
    ("Chinese Cuisine", "Dumplings"),
    ("Chinese Cuisine", "Tomato and Egg Noodles"),
    ("Western Cuisine", "Steak"),
    ("Western Cuisine", "Spaghetti"),
    ("Japanese Cuisine", "Sushi"),
];

/// A dish is identified by its cuisine and its name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Dish {
    pub cuisine: String,
    pub name: String,
}

impl Dish {
    pub fn new(cuisine: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            cuisine: cuisine.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Dish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.cuisine)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Cuisine {
    name: String,
    dishes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Menu {
    cuisines: Vec<Cuisine>,
}

impl Menu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        Self::from_pairs(DEFAULT_MENU.iter().copied())
    }

    pub fn from_pairs<I, C, N>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, N)>,
        C: Into<String>,
        N: Into<String>,
    {
        let mut menu = Self::new();
        for (cuisine, name) in pairs {
            menu.insert(Dish::new(cuisine, name));
        }
        menu
    }

    /// Adds a dish, trimming both parts. Returns `false` for blank parts and
    /// for a (cuisine, name) pair that is already present.
    pub fn insert(&mut self, dish: Dish) -> bool {
        let cuisine = dish.cuisine.trim();
        let name = dish.name.trim();
        if cuisine.is_empty() || name.is_empty() {
            return false;
        }
        match self.cuisines.iter_mut().find(|c| c.name == cuisine) {
            Some(entry) => {
                if entry.dishes.iter().any(|d| d == name) {
                    return false;
                }
                entry.dishes.push(name.to_string());
            }
            None => self.cuisines.push(Cuisine {
                name: cuisine.to_string(),
                dishes: vec![name.to_string()],
            }),
        }
        true
    }

    pub fn cuisines(&self) -> impl Iterator<Item = &str> {
        self.cuisines.iter().map(|c| c.name.as_str())
    }

    pub fn cuisine_count(&self) -> usize {
        self.cuisines.len()
    }

    /// Canonical cuisine name for `name`, matched exactly first and then
    /// case-insensitively.
    pub fn find_cuisine(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.cuisines
            .iter()
            .find(|c| c.name == name)
            .or_else(|| {
                self.cuisines
                    .iter()
                    .find(|c| c.name.to_lowercase() == name.to_lowercase())
            })
            .map(|c| c.name.as_str())
    }

    /// Dish names of an exactly named cuisine.
    pub fn dishes_in(&self, cuisine: &str) -> Option<&[String]> {
        self.cuisines
            .iter()
            .find(|c| c.name == cuisine)
            .map(|c| c.dishes.as_slice())
    }

    pub fn contains(&self, dish: &Dish) -> bool {
        self.dishes_in(&dish.cuisine)
            .is_some_and(|names| names.iter().any(|n| *n == dish.name))
    }

    /// Case-insensitive exact lookup of `name` inside one cuisine.
    pub fn find_in_cuisine(&self, cuisine: &str, name: &str) -> Option<Dish> {
        let wanted = name.trim().to_lowercase();
        self.dishes_in(cuisine)?
            .iter()
            .find(|n| n.to_lowercase() == wanted)
            .map(|n| Dish::new(cuisine, n.as_str()))
    }

    /// First case-insensitive match of `name` across all cuisines, in menu order.
    pub fn find_anywhere(&self, name: &str) -> Option<Dish> {
        let wanted = name.trim().to_lowercase();
        self.iter().find(|d| d.name.to_lowercase() == wanted)
    }

    /// All dishes in menu order.
    pub fn iter(&self) -> impl Iterator<Item = Dish> + '_ {
        self.cuisines.iter().flat_map(|c| {
            c.dishes
                .iter()
                .map(move |name| Dish::new(c.name.as_str(), name.as_str()))
        })
    }

    /// Number of dishes.
    pub fn len(&self) -> usize {
        self.cuisines.iter().map(|c| c.dishes.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
