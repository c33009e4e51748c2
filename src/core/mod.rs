pub mod cache;
pub mod catalogue;
pub mod engine;
pub mod graph;
pub mod pagerank;
pub mod projection;
pub mod ranking;
pub mod text;

pub use crate::domain::model::{Course, GraphView, RankedCourse, StudentProfile};
pub use crate::domain::ports::{CatalogueSource, ConfigProvider, Storage};
pub use crate::utils::error::Result;
