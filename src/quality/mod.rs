// Quality scorer (C5) — rates post effort, creativity, and clarity.

pub mod models;
pub mod rate_limiter;
pub mod remote;
pub mod traits;

pub use models::QualityResult;
pub use remote::RemoteQualityScorer;
pub use traits::QualityScorer;
