//! Ordering types used by root and preload queries.

use std::borrow::Cow;

/// Sort direction of one ordering column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Where nulls sort. Unset means last for ascending and first for
/// descending columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullsOrder {
    /// Nulls before every value.
    First,
    /// Nulls after every value.
    Last,
}

impl NullsOrder {
    fn as_sql(self) -> &'static str {
        match self {
            Self::First => "NULLS FIRST",
            Self::Last => "NULLS LAST",
        }
    }
}

/// One ordering column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByField {
    /// Column name, optionally qualified with its table.
    pub column: Cow<'static, str>,
    /// Sort direction.
    pub order: SortOrder,
    /// Explicit null placement.
    pub nulls: Option<NullsOrder>,
}

impl OrderByField {
    /// Order by `column` in the given direction.
    pub fn new(column: impl Into<Cow<'static, str>>, order: SortOrder) -> Self {
        Self {
            column: column.into(),
            order,
            nulls: None,
        }
    }

    /// Ascending on `column`.
    pub fn asc(column: impl Into<Cow<'static, str>>) -> Self {
        Self::new(column, SortOrder::Asc)
    }

    /// Descending on `column`.
    pub fn desc(column: impl Into<Cow<'static, str>>) -> Self {
        Self::new(column, SortOrder::Desc)
    }

    /// Place nulls explicitly.
    pub fn nulls(mut self, nulls: NullsOrder) -> Self {
        self.nulls = Some(nulls);
        self
    }

    fn write_sql(&self, buffer: &mut String) {
        buffer.push_str(&self.column);
        buffer.push(' ');
        buffer.push_str(self.order.as_sql());
        if let Some(nulls) = self.nulls {
            buffer.push(' ');
            buffer.push_str(nulls.as_sql());
        }
    }
}

/// Ordering of a query: one column or several in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderBy {
    /// A single column.
    Field(OrderByField),
    /// Several columns; empty means unordered.
    Fields(Box<[OrderByField]>),
}

impl Default for OrderBy {
    fn default() -> Self {
        Self::none()
    }
}

impl OrderBy {
    /// No ordering.
    pub fn none() -> Self {
        Self::Fields(Box::new([]))
    }

    /// Whether no column is ordered.
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Append a lower-priority column.
    pub fn then(self, field: OrderByField) -> Self {
        let mut fields = self.fields().to_vec();
        fields.push(field);
        Self::from(fields)
    }

    /// The columns in priority order.
    pub fn fields(&self) -> &[OrderByField] {
        match self {
            Self::Field(field) => std::slice::from_ref(field),
            Self::Fields(fields) => fields,
        }
    }

    /// Qualify every bare column with `table`.
    pub fn qualify(self, table: &str) -> Self {
        let fields: Vec<OrderByField> = self
            .fields()
            .iter()
            .cloned()
            .map(|mut field| {
                if !field.column.contains('.') {
                    field.column = Cow::Owned(format!("{}.{}", table, field.column));
                }
                field
            })
            .collect();
        Self::from(fields)
    }

    /// The ORDER BY clause body, without the keyword.
    pub fn to_sql(&self) -> String {
        let mut sql = String::new();
        self.write_sql(&mut sql);
        sql
    }

    pub(crate) fn write_sql(&self, buffer: &mut String) {
        for (i, field) in self.fields().iter().enumerate() {
            if i > 0 {
                buffer.push_str(", ");
            }
            field.write_sql(buffer);
        }
    }
}

impl From<OrderByField> for OrderBy {
    fn from(field: OrderByField) -> Self {
        Self::Field(field)
    }
}

impl From<Vec<OrderByField>> for OrderBy {
    fn from(mut fields: Vec<OrderByField>) -> Self {
        match fields.len() {
            1 => match fields.pop() {
                Some(field) => Self::Field(field),
                None => Self::none(),
            },
            _ => Self::Fields(fields.into_boxed_slice()),
        }
    }
}
