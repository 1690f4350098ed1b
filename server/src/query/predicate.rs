use std::cmp::Ordering;

use mongodb::bson::{oid::ObjectId, Bson, Document};

/// One condition of a query predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Any of `fields` contains `term`, ignoring case. The term is literal text.
    AnyContains { fields: Vec<String>, term: String },
    /// `field` equals `value`; array fields match when any element does.
    Equals { field: String, value: Bson },
    /// Inclusive bounds on `field`; either side may be open.
    Range {
        field: String,
        gte: Option<Bson>,
        lte: Option<Bson>,
    },
}

impl Clause {
    pub fn any_contains(fields: &[&str], term: impl Into<String>) -> Self {
        Clause::AnyContains {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            term: term.into(),
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Clause::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        match self {
            Clause::AnyContains { fields, term } => {
                let pattern = regex::escape(term);
                let alternatives: Vec<Bson> = fields
                    .iter()
                    .map(|field| {
                        let mut condition = Document::new();
                        condition.insert("$regex", pattern.clone());
                        condition.insert("$options", "i");

                        let mut alternative = Document::new();
                        alternative.insert(field.clone(), condition);
                        Bson::Document(alternative)
                    })
                    .collect();
                document.insert("$or", alternatives);
            }
            Clause::Equals { field, value } => {
                document.insert(field.clone(), value.clone());
            }
            Clause::Range { field, gte, lte } => {
                let mut bounds = Document::new();
                if let Some(lower) = gte {
                    bounds.insert("$gte", lower.clone());
                }
                if let Some(upper) = lte {
                    bounds.insert("$lte", upper.clone());
                }
                document.insert(field.clone(), bounds);
            }
        }
        document
    }

    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Clause::AnyContains { fields, term } => {
                let needle = term.to_lowercase();
                fields.iter().any(|field| {
                    field_values(document, field).into_iter().any(|value| {
                        matches!(value, Bson::String(text) if text.to_lowercase().contains(&needle))
                    })
                })
            }
            Clause::Equals { field, value } => field_values(document, field)
                .into_iter()
                .any(|candidate| compare_values(candidate, value) == Some(Ordering::Equal)),
            Clause::Range { field, gte, lte } => {
                field_values(document, field).into_iter().any(|candidate| {
                    let above = gte.as_ref().map_or(true, |lower| {
                        matches!(
                            compare_values(candidate, lower),
                            Some(Ordering::Greater | Ordering::Equal)
                        )
                    });
                    let below = lte.as_ref().map_or(true, |upper| {
                        matches!(
                            compare_values(candidate, upper),
                            Some(Ordering::Less | Ordering::Equal)
                        )
                    });
                    above && below
                })
            }
        }
    }
}

/// Conjunction of clauses. An empty predicate matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with(clause: Clause) -> Self {
        Self {
            clauses: vec![clause],
        }
    }

    pub fn by_id(id: ObjectId) -> Self {
        Self::with(Clause::equals("_id", id))
    }

    pub fn push(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Renders the MongoDB filter document: `{}` or `{"$and": [...]}`.
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        if !self.clauses.is_empty() {
            let clauses: Vec<Bson> = self
                .clauses
                .iter()
                .map(|clause| Bson::Document(clause.to_document()))
                .collect();
            document.insert("$and", clauses);
        }
        document
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.clauses.iter().all(|clause| clause.matches(document))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// `"asc"` sorts ascending; anything else, including unknown values, descending.
    pub fn parse(order: &str) -> Self {
        if order == "asc" {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        document.insert(self.field.clone(), self.direction.as_i32());
        document
    }
}

/// Values a top-level field contributes to matching: array elements
/// individually, scalars as themselves, nothing when absent.
fn field_values<'a>(document: &'a Document, field: &str) -> Vec<&'a Bson> {
    match document.get(field) {
        Some(Bson::Array(items)) => items.iter().collect(),
        Some(value) => vec![value],
        None => Vec::new(),
    }
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

/// Ordering between two values of comparable type; `None` across types.
pub fn compare_values(left: &Bson, right: &Bson) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (as_number(left), as_number(right)) {
        return a.partial_cmp(&b);
    }

    match (left, right) {
        (Bson::String(a), Bson::String(b)) => Some(a.cmp(b)),
        (Bson::ObjectId(a), Bson::ObjectId(b)) => Some(a.bytes().cmp(&b.bytes())),
        (Bson::Boolean(a), Bson::Boolean(b)) => Some(a.cmp(b)),
        (Bson::DateTime(a), Bson::DateTime(b)) => Some(a.cmp(b)),
        (Bson::Null, Bson::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn empty_predicate_renders_empty_filter() {
        assert_eq!(Predicate::all().to_document(), doc! {});
        assert!(Predicate::all().matches(&doc! { "title": "Rice" }));
    }

    #[test]
    fn contains_renders_escaped_case_insensitive_regex() {
        let predicate = Predicate::with(Clause::any_contains(&["title", "details"], "a+b"));
        assert_eq!(
            predicate.to_document(),
            doc! {
                "$and": [
                    { "$or": [
                        { "title": { "$regex": "a\\+b", "$options": "i" } },
                        { "details": { "$regex": "a\\+b", "$options": "i" } },
                    ] }
                ]
            }
        );
    }

    #[test]
    fn contains_matches_any_field_ignoring_case() {
        let clause = Clause::any_contains(&["title", "details"], "ric");
        assert!(clause.matches(&doc! { "title": "Brown RICE" }));
        assert!(clause.matches(&doc! { "title": "Dal", "details": "served with rice" }));
        assert!(!clause.matches(&doc! { "title": "Dal" }));
    }

    #[test]
    fn equals_compares_numbers_across_types() {
        let clause = Clause::equals("price", 50.0);
        assert!(clause.matches(&doc! { "price": 50_i32 }));
        assert!(clause.matches(&doc! { "price": 50_i64 }));
        assert!(!clause.matches(&doc! { "price": 51_i32 }));
        assert!(!clause.matches(&doc! { "price": "50" }));
    }

    #[test]
    fn equals_matches_array_elements() {
        let clause = Clause::equals("rawItem", "65a1b2c3d4e5f60718293a4b");
        assert!(clause.matches(&doc! { "rawItem": ["65a1b2c3d4e5f60718293a4b", "x"] }));
        assert!(!clause.matches(&doc! { "rawItem": ["x"] }));
        assert!(!clause.matches(&doc! {}));
    }

    #[test]
    fn range_is_inclusive_on_both_ends() {
        let clause = Clause::Range {
            field: "createdAt".to_string(),
            gte: Some(Bson::from("2024-01-01T00:00:00")),
            lte: Some(Bson::from("2024-01-31T23:59:59")),
        };
        assert!(clause.matches(&doc! { "createdAt": "2024-01-01T00:00:00" }));
        assert!(clause.matches(&doc! { "createdAt": "2024-01-15T08:30:00.000000" }));
        assert!(clause.matches(&doc! { "createdAt": "2024-01-31T23:59:59" }));
        assert!(!clause.matches(&doc! { "createdAt": "2023-12-31T23:59:59.999999" }));
        assert!(!clause.matches(&doc! { "createdAt": "2024-02-01T00:00:00.000000" }));
    }

    #[test]
    fn open_range_renders_single_bound() {
        let clause = Clause::Range {
            field: "createdAt".to_string(),
            gte: None,
            lte: Some(Bson::from("2024-01-31T23:59:59")),
        };
        assert_eq!(
            clause.to_document(),
            doc! { "createdAt": { "$lte": "2024-01-31T23:59:59" } }
        );
    }

    #[test]
    fn sort_direction_defaults_to_descending() {
        assert_eq!(SortDirection::parse("asc"), SortDirection::Ascending);
        assert_eq!(SortDirection::parse("desc"), SortDirection::Descending);
        assert_eq!(SortDirection::parse("ASC"), SortDirection::Descending);
        assert_eq!(SortDirection::parse("sideways"), SortDirection::Descending);
        assert_eq!(
            Sort::new("price", SortDirection::Ascending).to_document(),
            doc! { "price": 1 }
        );
    }
}
