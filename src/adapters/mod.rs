// Concrete implementations of the domain ports.

pub mod catalogue;
pub mod storage;

pub use catalogue::{source_for, CsvFileCatalogue, HttpCatalogue, JsonFileCatalogue};
pub use storage::LocalStorage;
