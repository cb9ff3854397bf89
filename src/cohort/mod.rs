// Daily cohort engine (C10).

pub mod engine;
pub mod models;

pub use engine::CohortEngine;
pub use models::{CategoryCohort, CohortSummary};
