/// How a filterable field interprets its raw query-string value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Exact string equality.
    Text,
    /// Parsed as a float, then equality.
    Numeric,
    /// Driven by the `start_date` / `end_date` keys rather than its own name.
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
        }
    }

    pub const fn numeric(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Numeric,
        }
    }

    pub const fn date(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Date,
        }
    }
}

/// Static per-resource table of what list queries may touch.
#[derive(Debug, Clone, Copy)]
pub struct ResourceFields {
    pub searchable: &'static [&'static str],
    pub filterable: &'static [FieldSpec],
}

impl ResourceFields {
    /// Declared fields plus `createdAt`; anything else, stored secrets
    /// included, cannot order a listing.
    pub fn is_sortable(&self, field: &str) -> bool {
        field == protocol::DEFAULT_SORT_BY
            || self.searchable.contains(&field)
            || self.filterable.iter().any(|spec| spec.name == field)
    }
}

