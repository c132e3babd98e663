use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecommendError {
    #[error("Unknown cuisine: {0}")]
    UnknownCuisine(String),
    #[error("Cuisine has no dishes: {0}")]
    EmptyCuisine(String),
    #[error("Input matches no offered dish: {0:?}")]
    AmbiguousSelection(String),
}

pub type Result<T> = std::result::Result<T, RecommendError>;
