//! Read request construction
//!
//! `ReadRequest` collects every knob a caller may set and `build()` resolves
//! them into a typed `ReadQuery`. Selector priority is fixed:
//! primary key > single field > filter maps > full scan.

use uuid::Uuid;

use super::selector::{FieldFilters, Match, Predicate, Selector};
use super::shape::{LoadHint, OrderBy, PageParams, ResultShape};
use crate::domain::entity::{Entity, FieldValue};
use crate::domain::DomainError;

/// A validated read: which rows, in which shape
#[derive(Debug, Clone, PartialEq)]
pub struct ReadQuery {
    pub selector: Selector,
    pub shape: ResultShape,
    pub hints: Vec<LoadHint>,
}

impl ReadQuery {
    pub fn new(selector: Selector, shape: ResultShape) -> Self {
        Self {
            selector,
            shape,
            hints: Vec::new(),
        }
    }

    /// Lookup by primary key
    pub fn by_key(id: Uuid) -> Self {
        Self::new(Selector::PrimaryKey(id), ResultShape::First)
    }

    /// First row of the table
    pub fn first() -> Self {
        Self::new(Selector::Everything, ResultShape::First)
    }

    pub fn with_hints(mut self, hints: impl IntoIterator<Item = LoadHint>) -> Self {
        self.hints.extend(hints);
        self
    }

    /// Reject any column the entity does not declare
    pub fn check_columns<E: Entity>(&self) -> Result<(), DomainError> {
        let mut columns: Vec<&str> = Vec::new();

        match &self.selector {
            Selector::Field { column, extra, .. } => {
                columns.push(column);
                columns.extend(extra.iter().map(|p| p.column.as_str()));
            }
            Selector::Filters { all, any, extra } => {
                columns.extend(all.keys().map(String::as_str));
                columns.extend(any.keys().map(String::as_str));
                columns.extend(extra.iter().map(|p| p.column.as_str()));
            }
            Selector::PrimaryKey(_) | Selector::PrimaryKeys(_) | Selector::Everything => {}
        }

        if let ResultShape::All {
            order_by: Some(order_by),
        } = &self.shape
        {
            columns.push(&order_by.column);
        }

        match columns.into_iter().find(|column| !E::has_column(column)) {
            Some(column) => Err(DomainError::invalid_query(format!(
                "unknown column '{}' for table '{}'",
                column,
                E::TABLE
            ))),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
enum KeySelector {
    One(Uuid),
    Many(Vec<Uuid>),
}

/// Builder for `ReadQuery`
#[derive(Debug, Clone, Default)]
pub struct ReadRequest {
    hints: Vec<LoadHint>,
    order_by: Option<OrderBy>,
    keys: Option<KeySelector>,
    field: Option<(String, Match)>,
    and_fields: FieldFilters,
    or_fields: FieldFilters,
    extra: Vec<Predicate>,
    return_all: bool,
    stream: bool,
    page: bool,
    page_params: Option<PageParams>,
}

impl ReadRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hint(mut self, hint: LoadHint) -> Self {
        self.hints.push(hint);
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    pub fn primary_key(mut self, id: Uuid) -> Self {
        self.keys = Some(KeySelector::One(id));
        self
    }

    pub fn primary_keys(mut self, ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.keys = Some(KeySelector::Many(ids.into_iter().collect()));
        self
    }

    pub fn with_field(self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.with_match(column, Match::one(value))
    }

    pub fn with_field_in<T: Into<FieldValue>>(
        self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        self.with_match(column, Match::any(values))
    }

    pub fn with_match(mut self, column: impl Into<String>, matching: Match) -> Self {
        self.field = Some((column.into(), matching));
        self
    }

    pub fn and_field(mut self, column: impl Into<String>, matching: Match) -> Self {
        self.and_fields.insert(column.into(), matching);
        self
    }

    pub fn or_field(mut self, column: impl Into<String>, matching: Match) -> Self {
        self.or_fields.insert(column.into(), matching);
        self
    }

    pub fn and_fields(mut self, fields: FieldFilters) -> Self {
        self.and_fields.extend(fields);
        self
    }

    pub fn or_fields(mut self, fields: FieldFilters) -> Self {
        self.or_fields.extend(fields);
        self
    }

    pub fn extra(mut self, predicate: Predicate) -> Self {
        self.extra.push(predicate);
        self
    }

    pub fn extras(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        self.extra.extend(predicates);
        self
    }

    pub fn return_all(mut self) -> Self {
        self.return_all = true;
        self
    }

    pub fn stream(mut self) -> Self {
        self.stream = true;
        self
    }

    /// Request a page with the given parameters
    pub fn paginate(mut self, params: PageParams) -> Self {
        self.page = true;
        self.page_params = Some(params);
        self
    }

    /// Set the paginate flag alone; `build()` fails unless parameters follow
    pub fn page(mut self) -> Self {
        self.page = true;
        self
    }

    pub fn build(self) -> Result<ReadQuery, DomainError> {
        if self.page && self.stream {
            return Err(DomainError::invalid_query(
                "page and stream cannot be requested at the same time",
            ));
        }

        let page_params = if self.page {
            let params = self.page_params.ok_or_else(|| {
                DomainError::invalid_query("page parameters are required when page is requested")
            })?;
            params.validate()?;
            Some(params)
        } else {
            None
        };

        let stream = self.stream;
        let collection = |order_by: Option<OrderBy>| match page_params {
            Some(params) => ResultShape::Paged(params),
            None if stream => ResultShape::Streamed,
            None => ResultShape::All { order_by },
        };

        let return_all = self.return_all;
        let single_or_collection = |order_by: Option<OrderBy>| {
            if return_all {
                collection(order_by)
            } else {
                ResultShape::First
            }
        };

        let (selector, shape) = if let Some(keys) = self.keys {
            match keys {
                KeySelector::One(id) => (Selector::PrimaryKey(id), ResultShape::First),
                KeySelector::Many(ids) => {
                    if ids.is_empty() {
                        return Err(DomainError::invalid_query(
                            "at least one primary key is required",
                        ));
                    }
                    let order_by = if return_all { self.order_by } else { None };
                    (Selector::PrimaryKeys(ids), collection(order_by))
                }
            }
        } else if let Some((column, matching)) = self.field {
            if matching.is_empty() {
                return Err(DomainError::invalid_query(format!(
                    "at least one value is required for field '{}'",
                    column
                )));
            }

            if matching.is_multi() && !return_all {
                return Err(DomainError::invalid_query(
                    "return_all is required when matching a list of values for a single field",
                ));
            }

            let shape = single_or_collection(self.order_by);
            (
                Selector::Field {
                    column,
                    matching,
                    extra: self.extra,
                },
                shape,
            )
        } else if !self.and_fields.is_empty() || !self.or_fields.is_empty() {
            if let Some((column, _)) = self
                .and_fields
                .iter()
                .chain(self.or_fields.iter())
                .find(|(_, matching)| matching.is_empty())
            {
                return Err(DomainError::invalid_query(format!(
                    "at least one value is required for field '{}'",
                    column
                )));
            }

            let shape = single_or_collection(self.order_by);
            (
                Selector::Filters {
                    all: self.and_fields,
                    any: self.or_fields,
                    extra: self.extra,
                },
                shape,
            )
        } else {
            (Selector::Everything, single_or_collection(self.order_by))
        };

        Ok(ReadQuery {
            selector,
            shape,
            hints: self.hints,
        })
    }
}
