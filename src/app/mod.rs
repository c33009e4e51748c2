pub mod output;
pub mod recommend;
pub mod report;

pub use recommend::{load_profile, RecommendJob, RunSummary};
