pub mod listings;
pub mod pricing;
pub mod recommendations;

pub use pricing::{HttpPriceScorer, PriceScorer};
pub use recommendations::{InteractionReader, Recommender};
