use std::fmt;

use futures::stream::BoxStream;

use super::shape::Page;
use crate::domain::DomainError;

/// Outcome of a read, matching the query's `ResultShape`
///
/// A streamed result borrows the unit of work that produced it and must be
/// drained before the unit of work is used again.
pub enum ReadResult<'a, E> {
    One(Option<E>),
    Many(Vec<E>),
    Page(Page<E>),
    Stream(BoxStream<'a, Result<E, DomainError>>),
}

impl<'a, E> ReadResult<'a, E> {
    fn shape_name(&self) -> &'static str {
        match self {
            Self::One(_) => "one",
            Self::Many(_) => "many",
            Self::Page(_) => "page",
            Self::Stream(_) => "stream",
        }
    }

    fn unexpected(&self, wanted: &str) -> DomainError {
        DomainError::internal(format!(
            "expected a {} result, got {}",
            wanted,
            self.shape_name()
        ))
    }

    pub fn into_one(self) -> Result<Option<E>, DomainError> {
        match self {
            Self::One(entity) => Ok(entity),
            other => Err(other.unexpected("one")),
        }
    }

    pub fn into_many(self) -> Result<Vec<E>, DomainError> {
        match self {
            Self::Many(entities) => Ok(entities),
            other => Err(other.unexpected("many")),
        }
    }

    pub fn into_page(self) -> Result<Page<E>, DomainError> {
        match self {
            Self::Page(page) => Ok(page),
            other => Err(other.unexpected("page")),
        }
    }

    pub fn into_stream(self) -> Result<BoxStream<'a, Result<E, DomainError>>, DomainError> {
        match self {
            Self::Stream(stream) => Ok(stream),
            other => Err(other.unexpected("stream")),
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for ReadResult<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One(entity) => f.debug_tuple("One").field(entity).finish(),
            Self::Many(entities) => f.debug_tuple("Many").field(entities).finish(),
            Self::Page(page) => f.debug_tuple("Page").field(page).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}
