/// Minimal query builder over the two climate relations.
///
/// Only the shapes the API needs are expressible: column and aggregate
/// projections, equality/range filters, grouping, ordering and a limit.
/// Identifiers come from the fixed `Relation`/`Column` enums and every
/// filter value is bound as a text parameter, so request input never
/// reaches the SQL string itself.
///
/// Date filters compare text against text. The `date` column is stored as
/// zero-padded `YYYY-MM-DD`, so lexicographic order is calendar order, and a
/// malformed bound simply matches nothing.

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Measurement,
    Station,
}

impl Relation {
    pub fn table_name(self) -> &'static str {
        match self {
            Relation::Measurement => "measurement",
            Relation::Station => "station",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// `measurement.id`, the insertion-order surrogate key.
    MeasurementId,
    MeasurementStation,
    Date,
    Prcp,
    Tobs,
    StationId,
}

impl Column {
    pub fn name(self) -> &'static str {
        match self {
            Column::MeasurementId => "id",
            Column::MeasurementStation | Column::StationId => "station",
            Column::Date => "date",
            Column::Prcp => "prcp",
            Column::Tobs => "tobs",
        }
    }

    pub fn relation(self) -> Relation {
        match self {
            Column::MeasurementId
            | Column::MeasurementStation
            | Column::Date
            | Column::Prcp
            | Column::Tobs => Relation::Measurement,
            Column::StationId => Relation::Station,
        }
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Min,
    Max,
    Avg,
    Count,
}

impl Aggregate {
    fn function(self) -> &'static str {
        match self {
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
            Aggregate::Avg => "AVG",
            Aggregate::Count => "COUNT",
        }
    }
}

/// A projected or ordered expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expr {
    Column(Column),
    Aggregate(Aggregate, Column),
}

impl Expr {
    fn column(self) -> Column {
        match self {
            Expr::Column(c) | Expr::Aggregate(_, c) => c,
        }
    }

    fn render(self, out: &mut String) {
        match self {
            Expr::Column(c) => out.push_str(c.name()),
            Expr::Aggregate(agg, c) => {
                out.push_str(&format!("{}({})", agg.function(), c.name()));
            }
        }
    }
}

impl From<Column> for Expr {
    fn from(column: Column) -> Self {
        Expr::Column(column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ge,
    Le,
}

impl Op {
    fn symbol(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ge => ">=",
            Op::Le => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: Column,
    pub op: Op,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// A single-relation SELECT.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    relation: Relation,
    select: Vec<Expr>,
    filters: Vec<Filter>,
    group_by: Vec<Column>,
    order_by: Vec<(Expr, Direction)>,
    limit: Option<u32>,
}

impl Query {
    pub fn table(relation: Relation) -> Self {
        Self {
            relation,
            select: Vec::new(),
            filters: Vec::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
        }
    }

    pub fn select(mut self, expr: impl Into<Expr>) -> Self {
        self.select.push(expr.into());
        self
    }

    pub fn aggregate(self, aggregate: Aggregate, column: Column) -> Self {
        self.select(Expr::Aggregate(aggregate, column))
    }

    pub fn filter(mut self, column: Column, op: Op, value: impl Into<String>) -> Self {
        self.filters.push(Filter { column, op, value: value.into() });
        self
    }

    pub fn group_by(mut self, column: Column) -> Self {
        self.group_by.push(column);
        self
    }

    pub fn order_by(mut self, expr: impl Into<Expr>, direction: Direction) -> Self {
        self.order_by.push((expr.into(), direction));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render to SQL with `$n` placeholders plus the values to bind, in order.
    ///
    /// # Panics
    /// Panics if a column from the other relation is referenced, or nothing
    /// is selected. Both are programming errors in the fixed query set.
    pub fn to_sql(&self) -> (String, Vec<String>) {
        assert!(!self.select.is_empty(), "query selects no columns");
        let columns = self
            .select
            .iter()
            .map(|e| e.column())
            .chain(self.filters.iter().map(|f| f.column))
            .chain(self.group_by.iter().copied())
            .chain(self.order_by.iter().map(|(e, _)| e.column()));
        for column in columns {
            assert_eq!(
                column.relation(),
                self.relation,
                "column {:?} does not belong to {}",
                column,
                self.relation.table_name()
            );
        }

        let mut sql = String::from("SELECT ");
        for (i, expr) in self.select.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            expr.render(&mut sql);
        }
        sql.push_str(" FROM ");
        sql.push_str(self.relation.table_name());

        let mut params = Vec::with_capacity(self.filters.len());
        for (i, filter) in self.filters.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            params.push(filter.value.clone());
            sql.push_str(&format!(
                "{} {} ${}",
                filter.column.name(),
                filter.op.symbol(),
                params.len()
            ));
        }

        if !self.group_by.is_empty() {
            let names: Vec<&str> = self.group_by.iter().map(|c| c.name()).collect();
            sql.push_str(" GROUP BY ");
            sql.push_str(&names.join(", "));
        }

        for (i, (expr, direction)) in self.order_by.iter().enumerate() {
            sql.push_str(if i == 0 { " ORDER BY " } else { ", " });
            expr.render(&mut sql);
            sql.push_str(match direction {
                Direction::Asc => " ASC",
                Direction::Desc => " DESC",
            });
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        (sql, params)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
