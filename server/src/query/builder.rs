use std::collections::HashMap;

use chrono::NaiveDate;
use mongodb::bson::Bson;
use protocol::{
    DEFAULT_LIMIT, DEFAULT_PAGE, DEFAULT_SORT_BY, DEFAULT_SORT_ORDER, RESERVED_LIST_KEYS,
};

use super::fields::{FieldKind, ResourceFields};
use super::predicate::{Clause, Predicate, Sort, SortDirection};
use crate::error::{CanteenError, Result};

pub const START_DATE_KEY: &str = "start_date";
pub const END_DATE_KEY: &str = "end_date";
/// Single-day shorthand: fills whichever bound the explicit keys leave open.
pub const DAY_KEY: &str = "created_at";

pub const INVALID_DATE_MESSAGE: &str = "Invalid date format. Use mm/dd/yyyy.";

const INPUT_DATE_FORMAT: &str = "%m/%d/%Y";
const STORED_DATE_FORMAT: &str = "%Y-%m-%d";

/// Page window with `page >= 1` and `limit >= 1` guaranteed by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u64,
    limit: u64,
}

impl Pagination {
    pub fn new(page: u64, limit: u64) -> Result<Self> {
        if page < 1 {
            return Err(CanteenError::validation(
                "page must be greater than or equal to 1",
            ));
        }
        if limit < 1 {
            return Err(CanteenError::validation(
                "limit must be greater than or equal to 1",
            ));
        }
        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Runtime parameters of a list request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub search_term: Option<String>,
    pub filters: HashMap<String, String>,
    pub sort_by: String,
    pub sort_order: String,
    pub pagination: Pagination,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            search_term: None,
            filters: HashMap::new(),
            sort_by: DEFAULT_SORT_BY.to_string(),
            sort_order: DEFAULT_SORT_ORDER.to_string(),
            pagination: Pagination::default(),
        }
    }
}

impl ListParams {
    /// Splits a raw query-string map into the list controls and the filter
    /// map. Every key that is not a list control becomes a filter.
    pub fn from_query(mut query: HashMap<String, String>) -> Result<Self> {
        let [search_key, page_key, limit_key, sort_by_key, sort_order_key] = RESERVED_LIST_KEYS;
        let page = parse_positive(query.remove(page_key), page_key, DEFAULT_PAGE)?;
        let limit = parse_positive(query.remove(limit_key), limit_key, DEFAULT_LIMIT)?;

        Ok(Self {
            search_term: query.remove(search_key),
            sort_by: query
                .remove(sort_by_key)
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| DEFAULT_SORT_BY.to_string()),
            sort_order: query
                .remove(sort_order_key)
                .unwrap_or_else(|| DEFAULT_SORT_ORDER.to_string()),
            pagination: Pagination::new(page, limit)?,
            filters: query,
        })
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn sorted_by(mut self, field: impl Into<String>, order: impl Into<String>) -> Self {
        self.sort_by = field.into();
        self.sort_order = order.into();
        self
    }

    pub fn paged(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }
}

fn parse_positive(raw: Option<String>, name: &str, default: u64) -> Result<u64> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse::<u64>().map_err(|_| {
            CanteenError::validation(format!("{name} must be a positive integer"))
        }),
    }
}

/// Predicate, sort and window ready to run against a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub predicate: Predicate,
    pub sort: Sort,
    pub skip: u64,
    pub limit: u64,
}

pub fn build_plan(fields: &ResourceFields, params: &ListParams) -> Result<QueryPlan> {
    let mut predicate = Predicate::all();

    if let Some(term) = params.search_term.as_deref().filter(|t| !t.is_empty()) {
        predicate.push(Clause::any_contains(fields.searchable, term));
    }

    for field in fields.filterable {
        match field.kind {
            FieldKind::Date => {
                if let Some(clause) = date_range_clause(field.name, &params.filters)? {
                    predicate.push(clause);
                }
            }
            FieldKind::Numeric => {
                if let Some(raw) = params.filters.get(field.name) {
                    let value = raw
                        .trim()
                        .parse::<f64>()
                        .ok()
                        .filter(|n| n.is_finite())
                        .ok_or_else(|| {
                            CanteenError::validation(format!("{} must be numeric", field.name))
                        })?;
                    predicate.push(Clause::equals(field.name, value));
                }
            }
            FieldKind::Text => {
                if let Some(raw) = params.filters.get(field.name) {
                    predicate.push(Clause::equals(field.name, raw.as_str()));
                }
            }
        }
    }

    if !fields.is_sortable(&params.sort_by) {
        return Err(CanteenError::validation(format!(
            "Cannot sort by {}",
            params.sort_by
        )));
    }

    Ok(QueryPlan {
        predicate,
        sort: Sort::new(
            params.sort_by.clone(),
            SortDirection::parse(&params.sort_order),
        ),
        skip: params.pagination.offset(),
        limit: params.pagination.limit(),
    })
}

fn date_range_clause(field: &str, filters: &HashMap<String, String>) -> Result<Option<Clause>> {
    let day = parse_day(filters.get(DAY_KEY))?;
    let start = parse_day(filters.get(START_DATE_KEY))?.or(day);
    let end = parse_day(filters.get(END_DATE_KEY))?.or(day);

    if start.is_none() && end.is_none() {
        return Ok(None);
    }

    Ok(Some(Clause::Range {
        field: field.to_string(),
        gte: start.map(|date| Bson::String(start_of_day(date))),
        lte: end.map(|date| Bson::String(end_of_day(date))),
    }))
}

fn parse_day(raw: Option<&String>) -> Result<Option<NaiveDate>> {
    raw.map(|value| {
        NaiveDate::parse_from_str(value.trim(), INPUT_DATE_FORMAT)
            .map_err(|_| CanteenError::validation(INVALID_DATE_MESSAGE))
    })
    .transpose()
}

fn start_of_day(date: NaiveDate) -> String {
    format!("{}T00:00:00.000000", date.format(STORED_DATE_FORMAT))
}

/// Same width as stored timestamps so string comparison stays inclusive.
fn end_of_day(date: NaiveDate) -> String {
    format!("{}T23:59:59.999999", date.format(STORED_DATE_FORMAT))
}
