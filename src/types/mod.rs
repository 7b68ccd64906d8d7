pub mod category;
pub mod competitor;
pub mod dimension;
pub mod idea;
pub mod report;

pub use category::Category;
pub use competitor::{CompetitorListing, Platform, Review, SourceOrigin};
pub use dimension::{DimensionKey, DimensionWeight, WeightTable, default_weight_table};
pub use idea::{Idea, InputError};
pub use report::{DimensionScore, ScoreBreakdown, ValidationReport};
