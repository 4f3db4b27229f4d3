use dugout_core::{FieldValue, SortDirection, TargetKind};
use serde::{Deserialize, Serialize};

/// A store-agnostic query against one logical table.
///
/// The planner produces it, a [`StatsStore`](crate::StatsStore) runs it.
/// Filters are conjunctive and keep the order they were added in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub target: TargetKind,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub sort: Option<SortKey>,
    #[serde(default)]
    pub limit: Option<u32>,
    /// Requested columns. Empty means all columns.
    #[serde(default)]
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: FilterValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    In,
    Gte,
    Lte,
}

impl FilterOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::In => "IN",
            FilterOp::Gte => ">=",
            FilterOp::Lte => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    List(Vec<FieldValue>),
    Single(FieldValue),
}

impl FilterValue {
    /// All candidate values: one for scalar ops, many for `In`.
    pub fn values(&self) -> Vec<&FieldValue> {
        match self {
            FilterValue::List(vs) => vs.iter().collect(),
            FilterValue::Single(v) => vec![v],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl QueryPlan {
    pub fn new(target: TargetKind) -> Self {
        Self {
            target,
            filters: Vec::new(),
            sort: None,
            limit: None,
            fields: Vec::new(),
        }
    }

    pub fn eq(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op: FilterOp::Eq,
            value: FilterValue::Single(value.into()),
        });
        self
    }

    pub fn one_of(mut self, field: &str, values: Vec<FieldValue>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op: FilterOp::In,
            value: FilterValue::List(values),
        });
        self
    }

    pub fn gte(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op: FilterOp::Gte,
            value: FilterValue::Single(value.into()),
        });
        self
    }

    pub fn lte(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op: FilterOp::Lte,
            value: FilterValue::Single(value.into()),
        });
        self
    }

    pub fn sort_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.sort = Some(SortKey {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Every column name the plan touches (filters, sort, projection).
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.filters.iter().map(|f| f.field.as_str()).collect();
        if let Some(sort) = &self.sort {
            out.push(&sort.field);
        }
        out.extend(self.fields.iter().map(String::as_str));
        out
    }
}

impl std::fmt::Display for QueryPlan {
    /// Pseudo-SQL rendering for traces and logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields = if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields.join(", ")
        };
        write!(f, "{} FROM {}", fields, self.target)?;
        for (i, filter) in self.filters.iter().enumerate() {
            let kw = if i == 0 { "WHERE" } else { "AND" };
            let rendered: Vec<String> = filter.value.values().iter().map(|v| v.render(None)).collect();
            let value = match filter.op {
                FilterOp::In => format!("({})", rendered.join(", ")),
                _ => rendered.join(", "),
            };
            write!(f, " {} {} {} {}", kw, filter.field, filter.op.symbol(), value)?;
        }
        if let Some(sort) = &self.sort {
            write!(f, " ORDER BY {} {}", sort.field, sort.direction.to_string().to_uppercase())?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        Ok(())
    }
}
