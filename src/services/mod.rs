pub mod catalog;
pub mod features;
pub mod profile;
pub mod ranking;
pub mod recommendations;
pub mod sources;

pub use recommendations::{RecommendationEngine, RecommendationService};
