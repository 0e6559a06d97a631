//! Seoul subway congestion preprocessing and analysis.
//!
//! A wide table with one column per time slot is reshaped into a long,
//! enriched table ([`pipeline::preprocess`]), checked ([`validate`]) and
//! persisted ([`loader`]). The query modules ([`query`], [`station`],
//! [`timeslot`]) are pure functions over that table.

pub mod clean;
pub mod enrich;
pub mod error;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod query;
pub mod reshape;
pub mod schema;
pub mod station;
pub mod timeslot;
pub mod types;
pub mod util;
pub mod validate;

pub use error::PipelineError;
pub use pipeline::preprocess;
pub use types::{CongestionRecord, DayFilter, RawTable};
