pub mod fixture;

pub use crate::error::SourceError;
pub use fixture::{FixtureDataset, FixtureModel, FixtureQueryService, QueryReply};
