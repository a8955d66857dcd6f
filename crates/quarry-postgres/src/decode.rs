use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use quarry_core::data_source::{
    ColumnType, DataColumn, DataRow, DataSourceError, stream::RowDecoder,
};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde_json::{Number, Value};
use sqlx::{
    Column, Decode, Postgres, Row, Type, TypeInfo,
    postgres::{PgArguments, PgRow},
    query::Query,
};
use uuid::Uuid;

/// Canonical type for a PostgreSQL type name. `None` for types without a
/// mapping.
pub(crate) fn native_type(name: &str) -> Option<ColumnType> {
    let column_type = match name {
        "BOOL" => ColumnType::Boolean,
        "INT2" | "INT4" | "INT8" | "FLOAT4" | "FLOAT8" | "NUMERIC" | "OID" => ColumnType::Number,
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" | "UUID" => ColumnType::String,
        "DATE" | "TIME" | "TIMESTAMP" | "TIMESTAMPTZ" => ColumnType::Date,
        "JSON" | "JSONB" => ColumnType::Json,
        "BYTEA" => ColumnType::Binary,
        _ => return None,
    };

    Some(column_type)
}

///
/// PgRowDecoder
///

pub(crate) struct PgRowDecoder;

impl RowDecoder for PgRowDecoder {
    type Row = PgRow;

    fn columns(&self, first: &PgRow) -> Result<Vec<DataColumn>, DataSourceError> {
        first
            .columns()
            .iter()
            .map(|column| {
                let native = column.type_info().name();
                let column_type =
                    native_type(native).ok_or_else(|| DataSourceError::UnsupportedType {
                        column: column.name().to_string(),
                        native: native.to_string(),
                    })?;

                Ok(DataColumn::new(column.name(), column_type))
            })
            .collect()
    }

    fn decode(&self, row: PgRow, columns: &[DataColumn]) -> Result<DataRow, DataSourceError> {
        columns
            .iter()
            .zip(row.columns())
            .enumerate()
            .map(|(index, (column, native_column))| {
                let native = native_column.type_info().name();
                let value = decode_value(&row, index, native).map_err(|message| {
                    DataSourceError::Decode {
                        column: column.name.clone(),
                        message,
                    }
                })?;

                Ok((column.name.clone(), value))
            })
            .collect()
    }
}

fn get<'r, T>(row: &'r PgRow, index: usize) -> Result<Option<T>, String>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get::<Option<T>, _>(index).map_err(|e| e.to_string())
}

fn number(n: Option<f64>) -> Result<Value, String> {
    match n {
        None => Ok(Value::Null),
        Some(f) => Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| format!("{f} is not a finite number")),
    }
}

fn or_null<T>(value: Option<T>, f: impl FnOnce(T) -> Value) -> Value {
    value.map_or(Value::Null, f)
}

fn decode_value(row: &PgRow, index: usize, native: &str) -> Result<Value, String> {
    let value = match native {
        "BOOL" => or_null(get::<bool>(row, index)?, Value::Bool),
        "INT2" => or_null(get::<i16>(row, index)?, Value::from),
        "INT4" => or_null(get::<i32>(row, index)?, Value::from),
        "INT8" => or_null(get::<i64>(row, index)?, Value::from),
        "OID" => or_null(get::<sqlx::postgres::types::Oid>(row, index)?, |oid| Value::from(oid.0)),
        "FLOAT4" => number(get::<f32>(row, index)?.map(f64::from))?,
        "FLOAT8" => number(get::<f64>(row, index)?)?,
        "NUMERIC" => {
            let decimal = get::<Decimal>(row, index)?;
            match decimal {
                None => Value::Null,
                Some(d) => number(Some(
                    d.to_f64()
                        .ok_or_else(|| format!("{d} does not fit a double"))?,
                ))?,
            }
        }
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => {
            or_null(get::<String>(row, index)?, Value::String)
        }
        "UUID" => or_null(get::<Uuid>(row, index)?, |u| Value::String(u.to_string())),
        "DATE" => or_null(get::<NaiveDate>(row, index)?, |d| Value::String(d.to_string())),
        "TIME" => or_null(get::<NaiveTime>(row, index)?, |t| Value::String(t.to_string())),
        "TIMESTAMP" => or_null(get::<NaiveDateTime>(row, index)?, |t| {
            Value::String(t.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }),
        "TIMESTAMPTZ" => or_null(get::<DateTime<Utc>>(row, index)?, |t| {
            Value::String(t.to_rfc3339())
        }),
        "JSON" | "JSONB" => get::<Value>(row, index)?.unwrap_or(Value::Null),
        "BYTEA" => or_null(get::<Vec<u8>>(row, index)?, |bytes| {
            Value::String(STANDARD.encode(bytes))
        }),
        other => return Err(format!("unsupported native type '{other}'")),
    };

    Ok(value)
}

///
/// PgValue
/// A bound JSON value in the shape PostgreSQL receives it.
///

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum PgValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(Value),
}

impl PgValue {
    pub(crate) fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n
                .as_i64()
                .map_or_else(|| n.as_f64().map_or(Self::Null, Self::Float), Self::Int),
            Value::String(s) => Self::Text(s.clone()),
            other => Self::Json(other.clone()),
        }
    }

    pub(crate) fn bind(self, query: Query<'_, Postgres, PgArguments>) -> Query<'_, Postgres, PgArguments> {
        match self {
            Self::Null => query.bind(None::<String>),
            Self::Bool(b) => query.bind(b),
            Self::Int(i) => query.bind(i),
            Self::Float(f) => query.bind(f),
            Self::Text(s) => query.bind(s),
            Self::Json(v) => query.bind(sqlx::types::Json(v)),
        }
    }
}
