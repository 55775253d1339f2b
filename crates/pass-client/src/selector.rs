//! Query descriptors and result pages

use crate::codec::UNKNOWN_TOTAL;
use crate::error::{PassClientError, Result};
use crate::model::Entity;
use std::fmt;
use std::marker::PhantomData;

/// Page size used when the caller does not pick one
pub const DEFAULT_LIMIT: u64 = 500;

/// A query for one page of `E` records
///
/// ```
/// use pass_client::model::Grant;
/// use pass_client::{rsql, PassClientSelector};
///
/// let selector = PassClientSelector::<Grant>::new()
///     .filter(rsql::equals("awardNumber", "R01EY027824"))
///     .sorting("startDate")
///     .include(["pi", "directFunder"])
///     .limit(50);
///
/// assert_eq!(selector.offset_value(), 0);
/// assert_eq!(selector.include_list(), ["pi", "directFunder"]);
/// ```
pub struct PassClientSelector<E> {
    offset: u64,
    limit: u64,
    filter: Option<String>,
    sorting: Option<String>,
    include: Vec<String>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> PassClientSelector<E> {
    /// Selector for the first [`DEFAULT_LIMIT`] records of `E`
    pub fn new() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
            filter: None,
            sorting: None,
            include: Vec::new(),
            _entity: PhantomData,
        }
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Page size; must be greater than zero when the selector is used
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Filter expression in the repository's RSQL dialect, see [`crate::rsql`]
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Sort expression, e.g. `-submittedDate`
    pub fn sorting(mut self, sorting: impl Into<String>) -> Self {
        self.sorting = Some(sorting.into());
        self
    }

    /// Relationships to embed in `included`, replacing any set before
    pub fn include<I, S>(mut self, relationships: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = relationships.into_iter().map(Into::into).collect();
        self
    }

    pub fn offset_value(&self) -> u64 {
        self.offset
    }

    pub fn limit_value(&self) -> u64 {
        self.limit
    }

    pub fn filter_value(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn sorting_value(&self) -> Option<&str> {
        self.sorting.as_deref()
    }

    pub fn include_list(&self) -> &[String] {
        &self.include
    }

    pub(crate) fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(PassClientError::invalid_argument(format!(
                "selector limit for {} must be greater than zero",
                E::TYPE
            )));
        }
        Ok(())
    }

    /// Query pairs in request order; `page[totals]` is sent without a value
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, Option<String>)> {
        let mut pairs = Vec::with_capacity(6);
        if !self.include.is_empty() {
            pairs.push(("include", Some(self.include.join(","))));
        }
        if let Some(filter) = &self.filter {
            pairs.push(("filter", Some(filter.clone())));
        }
        if let Some(sorting) = &self.sorting {
            pairs.push(("sort", Some(sorting.clone())));
        }
        pairs.push(("page[offset]", Some(self.offset.to_string())));
        pairs.push(("page[limit]", Some(self.limit.to_string())));
        pairs.push(("page[totals]", None));
        pairs
    }
}

impl<E: Entity> Default for PassClientSelector<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for PassClientSelector<E> {
    fn clone(&self) -> Self {
        Self {
            offset: self.offset,
            limit: self.limit,
            filter: self.filter.clone(),
            sorting: self.sorting.clone(),
            include: self.include.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> fmt::Debug for PassClientSelector<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassClientSelector")
            .field("type", &E::TYPE)
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .field("filter", &self.filter)
            .field("sorting", &self.sorting)
            .field("include", &self.include)
            .finish()
    }
}

/// One page of selected records
#[derive(Debug, Clone, PartialEq)]
pub struct PassClientResult<E> {
    /// Records in server order
    pub objects: Vec<E>,
    /// Count of all matches across pages, `-1` when the server omitted it
    pub total: i64,
}

impl<E> PassClientResult<E> {
    pub fn new(objects: Vec<E>, total: i64) -> Self {
        Self { objects, total }
    }

    /// The result of a select that matched nothing (HTTP 404)
    pub fn empty() -> Self {
        Self { objects: Vec::new(), total: 0 }
    }

    pub fn total_known(&self) -> bool {
        self.total != UNKNOWN_TOTAL
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::{Grant, Submission};

    #[test]
    fn test_defaults() {
        let selector = PassClientSelector::<Grant>::new();
        assert_eq!(selector.offset_value(), 0);
        assert_eq!(selector.limit_value(), DEFAULT_LIMIT);
        assert!(selector.filter_value().is_none());
        assert!(selector.include_list().is_empty());
        assert!(selector.validate().is_ok());
    }

    #[test]
    fn test_zero_limit_is_rejected() {
        let err = PassClientSelector::<Grant>::new().limit(0).validate().unwrap_err();
        assert!(matches!(err, PassClientError::InvalidArgument(_)));
    }

    #[test]
    fn test_query_pairs() {
        let selector = PassClientSelector::<Submission>::new()
            .offset(10)
            .limit(5)
            .filter("submitted==true")
            .sorting("-submittedDate")
            .include(["grants", "publication"]);

        assert_eq!(
            selector.query_pairs(),
            vec![
                ("include", Some("grants,publication".to_string())),
                ("filter", Some("submitted==true".to_string())),
                ("sort", Some("-submittedDate".to_string())),
                ("page[offset]", Some("10".to_string())),
                ("page[limit]", Some("5".to_string())),
                ("page[totals]", None),
            ]
        );
    }

    #[test]
    fn test_minimal_query_pairs_always_request_totals() {
        let pairs = PassClientSelector::<Grant>::new().query_pairs();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[2], ("page[totals]", None));
    }

    #[test]
    fn test_empty_result() {
        let result = PassClientResult::<Grant>::empty();
        assert!(result.objects.is_empty());
        assert_eq!(result.total, 0);
        assert!(result.total_known());
        assert!(!PassClientResult::<Grant>::new(Vec::new(), -1).total_known());
    }
}
