mod repository;

pub use repository::{Database, Repository};
