/// Builder for constructing record queries.
///
/// Records are matched by kind and, optionally, by tag values. Results are
/// returned in insertion order.
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    /// Kind of record to return.
    pub kind: String,

    /// Tag filters; a record must match all of them.
    pub tags: Vec<(String, String)>,

    /// Maximum number of records to return.
    pub limit: Option<usize>,

    /// Number of records to skip.
    pub offset: Option<usize>,
}

impl RecordQuery {
    /// Creates a query for all records of a kind.
    pub fn for_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    /// Filters by a tag value.
    pub fn tag(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((field.into(), value.into()));
        self
    }

    /// Limits the number of records returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips this many records before returning results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}
