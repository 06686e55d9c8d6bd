//! Read-query model for the generic repository

mod request;
mod result;
mod selector;
mod shape;

pub use request::{ReadQuery, ReadRequest};
pub use result::ReadResult;
pub use selector::{Comparison, FieldFilters, Match, Predicate, Selector};
pub use shape::{
    hints_sql, Direction, LoadHint, OrderBy, Page, PageParams, ResultShape, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};
