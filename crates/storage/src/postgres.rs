use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use dugout_catalog::{
    FilterOp, PlayerListing, QueryPlan, StatsStore, StoreError, TableSchema,
};
use dugout_core::config::PostgresConfig;
use dugout_core::{FieldValue, Row, SortDirection, TargetKind};
use regex::Regex;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row as _};
use tracing::{debug, info};

use crate::error::StorageError;
use crate::is_virtual_team;

/// Lower-case SQL identifier. Anything else never reaches generated SQL.
fn is_safe_identifier(ident: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[a-z_][a-z0-9_]*$").ok())
        .as_ref()
        .map(|re| re.is_match(ident))
        .unwrap_or(false)
}

/// Stats store backed by the normalized KBO tables in PostgreSQL.
///
/// Only columns declared in the table schemas can appear in generated SQL;
/// every value is bound as a parameter.
pub struct PgStore {
    pool: PgPool,
    tables: Vec<TableSchema>,
}

impl PgStore {
    /// Create a lazily connecting pool. Connection problems surface per query
    /// as [`StoreError::Unavailable`].
    pub fn connect_lazy(
        config: &PostgresConfig,
        tables: Vec<TableSchema>,
        acquire_timeout: Duration,
    ) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_lazy(&config.connection_string())?;
        info!("PostgreSQL store configured: {}/{}", config.host, config.database);
        Ok(Self { pool, tables })
    }

    fn table(&self, target: TargetKind) -> Result<&TableSchema, StoreError> {
        self.tables
            .iter()
            .find(|t| t.target == target)
            .ok_or_else(|| StoreError::Query(format!("no table configured for {}", target)))
    }
}

#[async_trait]
impl StatsStore for PgStore {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn execute(&self, plan: &QueryPlan) -> Result<Vec<Row>, StoreError> {
        let table = self.table(plan.target)?;
        let mut query = build_select(table, plan)?;
        debug!("SQL: {}", query.sql());

        let pg_rows = query.build().fetch_all(&self.pool).await.map_err(map_sqlx_error)?;
        let columns = selected_columns(table, plan);
        pg_rows
            .iter()
            .map(|row| decode_row(row, table, &columns))
            .collect()
    }

    async fn list_players(&self) -> Result<Vec<PlayerListing>, StoreError> {
        let table = self.table(TargetKind::Player)?;
        check_identifier(table, &table.name)?;
        let sql = format!(
            "SELECT player_id::text AS player_id, player_name::text AS player_name, \
             team::text AS team, role::text AS role FROM \"{}\" ORDER BY player_id",
            table.name
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| {
                let role: Option<String> = row.try_get("role").map_err(map_sqlx_error)?;
                Ok(PlayerListing {
                    player_id: row.try_get("player_id").map_err(map_sqlx_error)?,
                    name: row.try_get("player_name").map_err(map_sqlx_error)?,
                    team: row.try_get("team").map_err(map_sqlx_error)?,
                    role: role.and_then(|r| r.parse().ok()),
                    aliases: Vec::new(),
                })
            })
            .collect()
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
        other => StoreError::Query(other.to_string()),
    }
}

fn check_identifier(table: &TableSchema, ident: &str) -> Result<(), StoreError> {
    if is_safe_identifier(ident) {
        Ok(())
    } else {
        Err(StoreError::InvalidField {
            table: table.name.clone(),
            field: ident.to_string(),
        })
    }
}

fn check_column<'t>(table: &'t TableSchema, target: TargetKind, field: &str) -> Result<&'t str, StoreError> {
    check_identifier(table, field)?;
    match table.columns.iter().find(|c| c.name == field) {
        Some(column) => Ok(column.data_type.as_str()),
        None if is_virtual_team(target, field) => Ok("text"),
        None => Err(StoreError::InvalidField {
            table: table.name.clone(),
            field: field.to_string(),
        }),
    }
}

/// Columns returned for a plan: the projection, or every physical column.
fn selected_columns<'p>(table: &'p TableSchema, plan: &'p QueryPlan) -> Vec<&'p str> {
    if plan.fields.is_empty() {
        table
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .filter(|c| !is_virtual_team(plan.target, c))
            .collect()
    } else {
        plan.fields.iter().map(String::as_str).collect()
    }
}

fn cast_for(data_type: &str) -> &'static str {
    match data_type {
        "integer" => "int8",
        "float" => "float8",
        "boolean" => "bool",
        _ => "text",
    }
}

fn push_value(query: &mut QueryBuilder<'static, Postgres>, value: &FieldValue) {
    match value {
        FieldValue::Text(s) => {
            query.push_bind(s.clone());
        }
        FieldValue::Integer(i) => {
            query.push_bind(*i);
        }
        FieldValue::Float(f) => {
            query.push_bind(*f);
        }
        FieldValue::Boolean(b) => {
            query.push_bind(*b);
        }
        FieldValue::Null => {
            query.push("NULL");
        }
    }
}

fn push_condition(
    query: &mut QueryBuilder<'static, Postgres>,
    column: &str,
    data_type: &str,
    op: FilterOp,
    values: &[&FieldValue],
) {
    query.push(format!("\"{}\"::{}", column, cast_for(data_type)));
    match op {
        FilterOp::In => {
            query.push(" IN (");
            let mut list = query.separated(", ");
            for v in values {
                match v {
                    FieldValue::Text(s) => list.push_bind(s.clone()),
                    FieldValue::Integer(i) => list.push_bind(*i),
                    FieldValue::Float(f) => list.push_bind(*f),
                    FieldValue::Boolean(b) => list.push_bind(*b),
                    FieldValue::Null => list.push("NULL"),
                };
            }
            list.push_unseparated(")");
        }
        FilterOp::Eq | FilterOp::Gte | FilterOp::Lte => {
            query.push(format!(" {} ", op.symbol()));
            if let Some(v) = values.first() {
                push_value(query, v);
            } else {
                query.push("NULL");
            }
        }
    }
}

/// Build the parameterized SELECT for a plan against `table`.
pub fn build_select(
    table: &TableSchema,
    plan: &QueryPlan,
) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    check_identifier(table, &table.name)?;

    let mut select = Vec::new();
    for column in selected_columns(table, plan) {
        let data_type = check_column(table, plan.target, column)?;
        select.push(format!("\"{c}\"::{} AS \"{c}\"", cast_for(data_type), c = column));
    }

    let mut query = QueryBuilder::new(format!("SELECT {} FROM \"{}\"", select.join(", "), table.name));

    for (i, filter) in plan.filters.iter().enumerate() {
        let data_type = check_column(table, plan.target, &filter.field)?;
        query.push(if i == 0 { " WHERE " } else { " AND " });
        let values = filter.value.values();
        if is_virtual_team(plan.target, &filter.field) {
            query.push("(");
            push_condition(&mut query, "home_team", data_type, filter.op, &values);
            query.push(" OR ");
            push_condition(&mut query, "away_team", data_type, filter.op, &values);
            query.push(")");
        } else {
            push_condition(&mut query, &filter.field, data_type, filter.op, &values);
        }
    }

    if let Some(sort) = &plan.sort {
        check_column(table, plan.target, &sort.field)?;
        let direction = match sort.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        query.push(format!(" ORDER BY \"{}\" {} NULLS LAST", sort.field, direction));
    }

    if let Some(limit) = plan.limit {
        query.push(" LIMIT ");
        query.push_bind(limit as i64);
    }

    Ok(query)
}

fn decode_row(row: &PgRow, table: &TableSchema, columns: &[&str]) -> Result<Row, StoreError> {
    let mut out = Row::new();
    for column in columns {
        let data_type = table
            .columns
            .iter()
            .find(|c| c.name == *column)
            .map(|c| c.data_type.as_str())
            .unwrap_or("text");
        let value = match data_type {
            "integer" => row
                .try_get::<Option<i64>, _>(*column)
                .map(|v| v.map(FieldValue::Integer)),
            "float" => row
                .try_get::<Option<f64>, _>(*column)
                .map(|v| v.map(FieldValue::Float)),
            "boolean" => row
                .try_get::<Option<bool>, _>(*column)
                .map(|v| v.map(FieldValue::Boolean)),
            _ => row
                .try_get::<Option<String>, _>(*column)
                .map(|v| v.map(FieldValue::Text)),
        }
        .map_err(map_sqlx_error)?;
        out.insert(column.to_string(), value.unwrap_or(FieldValue::Null));
    }
    Ok(out)
}
