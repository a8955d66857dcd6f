use base64::{Engine as _, engine::general_purpose::STANDARD};
use quarry_core::data_source::{
    ColumnType, DataColumn, DataRow, DataSourceError, stream::RowDecoder,
};
use rusqlite::types::Value as SqlValue;
use serde_json::{Number, Value};
use std::sync::Arc;

///
/// SqliteColumn
/// Name and declared type as reported by the prepared statement.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct SqliteColumn {
    pub name: String,
    pub decl_type: Option<String>,
}

///
/// SqliteRow
/// One native row; the header is shared by every row of a result.
///

#[derive(Debug)]
pub(crate) struct SqliteRow {
    pub header: Arc<[SqliteColumn]>,
    pub values: Vec<SqlValue>,
}

///
/// SqliteRowDecoder
///

pub(crate) struct SqliteRowDecoder;

impl RowDecoder for SqliteRowDecoder {
    type Row = SqliteRow;

    fn columns(&self, first: &SqliteRow) -> Result<Vec<DataColumn>, DataSourceError> {
        Ok(first
            .header
            .iter()
            .zip(&first.values)
            .map(|(column, value)| {
                let column_type = column
                    .decl_type
                    .as_deref()
                    .and_then(declared_type)
                    .unwrap_or_else(|| storage_type(value));

                DataColumn::new(column.name.clone(), column_type)
            })
            .collect())
    }

    fn decode(&self, row: SqliteRow, columns: &[DataColumn]) -> Result<DataRow, DataSourceError> {
        columns
            .iter()
            .zip(row.values)
            .map(|(column, value)| Ok((column.name.clone(), decode_value(column, value)?)))
            .collect()
    }
}

/// Canonical type for a declared column type, following SQLite's affinity
/// rules loosely. `None` when nothing matches.
pub(crate) fn declared_type(decl: &str) -> Option<ColumnType> {
    let decl = decl.to_ascii_uppercase();
    let has = |needles: &[&str]| needles.iter().any(|n| decl.contains(n));

    let column_type = if has(&["BOOL"]) {
        ColumnType::Boolean
    } else if has(&["JSON"]) {
        ColumnType::Json
    } else if has(&["INT"]) {
        ColumnType::Number
    } else if has(&["CHAR", "CLOB", "TEXT", "UUID"]) {
        ColumnType::String
    } else if has(&["BLOB"]) {
        ColumnType::Binary
    } else if has(&["REAL", "FLOA", "DOUB", "NUM", "DEC"]) {
        ColumnType::Number
    } else if has(&["DATE", "TIME"]) {
        ColumnType::Date
    } else {
        return None;
    };

    Some(column_type)
}

/// Canonical type from the storage class of a value.
pub(crate) const fn storage_type(value: &SqlValue) -> ColumnType {
    match value {
        SqlValue::Null => ColumnType::Unknown,
        SqlValue::Integer(_) | SqlValue::Real(_) => ColumnType::Number,
        SqlValue::Text(_) => ColumnType::String,
        SqlValue::Blob(_) => ColumnType::Binary,
    }
}

// Every non-NULL value must fit the type already reported for its column.
// SQLite stores values by storage class, not by declared type, so a mismatch
// is a decode error rather than a silently retyped value.
fn decode_value(column: &DataColumn, value: SqlValue) -> Result<Value, DataSourceError> {
    let decode_err = |message: String| DataSourceError::Decode {
        column: column.name.clone(),
        message,
    };
    let real = |f: f64| {
        Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| decode_err(format!("{f} is not a finite number")))
    };

    let value = match (column.column_type, value) {
        (_, SqlValue::Null) => Value::Null,

        (ColumnType::Boolean, SqlValue::Integer(0)) => Value::Bool(false),
        (ColumnType::Boolean, SqlValue::Integer(1)) => Value::Bool(true),

        (ColumnType::Number | ColumnType::Json | ColumnType::Unknown, SqlValue::Integer(i)) => {
            Value::from(i)
        }
        (ColumnType::Number | ColumnType::Json | ColumnType::Unknown, SqlValue::Real(f)) => real(f)?,

        (ColumnType::Json, SqlValue::Text(text)) => {
            serde_json::from_str(&text).map_err(|e| decode_err(e.to_string()))?
        }
        (ColumnType::String | ColumnType::Date | ColumnType::Unknown, SqlValue::Text(text)) => {
            Value::String(text)
        }
        (ColumnType::Binary | ColumnType::Unknown, SqlValue::Blob(bytes)) => {
            Value::String(STANDARD.encode(bytes))
        }

        (expected, other) => {
            return Err(decode_err(format!(
                "{} value does not fit a {expected} column",
                storage_name(&other)
            )));
        }
    };

    Ok(value)
}

const fn storage_name(value: &SqlValue) -> &'static str {
    match value {
        SqlValue::Null => "null",
        SqlValue::Integer(_) => "integer",
        SqlValue::Real(_) => "real",
        SqlValue::Text(_) => "text",
        SqlValue::Blob(_) => "blob",
    }
}

/// Convert a bound JSON value into a SQLite value.
pub(crate) fn bind_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => n.as_i64().map_or_else(
            || n.as_f64().map_or(SqlValue::Null, SqlValue::Real),
            SqlValue::Integer,
        ),
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(columns: &[(&str, Option<&str>)], values: Vec<SqlValue>) -> SqliteRow {
        SqliteRow {
            header: columns
                .iter()
                .map(|(name, decl)| SqliteColumn {
                    name: (*name).to_string(),
                    decl_type: decl.map(str::to_string),
                })
                .collect(),
            values,
        }
    }

    #[test]
    fn declared_types_map_to_canonical_types() {
        let cases = [
            ("INTEGER", ColumnType::Number),
            ("BOOLEAN", ColumnType::Boolean),
            ("varchar(32)", ColumnType::String),
            ("TEXT", ColumnType::String),
            ("UUID", ColumnType::String),
            ("REAL", ColumnType::Number),
            ("DOUBLE PRECISION", ColumnType::Number),
            ("DECIMAL(10,2)", ColumnType::Number),
            ("DATE", ColumnType::Date),
            ("DATETIME", ColumnType::Date),
            ("TIMESTAMP", ColumnType::Date),
            ("BLOB", ColumnType::Binary),
            ("JSON", ColumnType::Json),
        ];

        for (decl, expected) in cases {
            assert_eq!(declared_type(decl), Some(expected), "{decl}");
        }
        assert_eq!(declared_type("GEOMETRY"), None);
    }

    #[test]
    fn untyped_columns_fall_back_to_storage_class() {
        let first = row(
            &[("a", None), ("b", None), ("c", None), ("d", Some("GEOMETRY"))],
            vec![
                SqlValue::Integer(1),
                SqlValue::Text("x".into()),
                SqlValue::Null,
                SqlValue::Blob(vec![1]),
            ],
        );

        let types: Vec<_> = SqliteRowDecoder
            .columns(&first)
            .expect("columns")
            .into_iter()
            .map(|c| c.column_type)
            .collect();
        assert_eq!(
            types,
            vec![
                ColumnType::Number,
                ColumnType::String,
                ColumnType::Unknown,
                ColumnType::Binary
            ]
        );
    }

    #[test]
    fn values_decode_by_column_type() {
        let header = [
            ("enabled", Some("BOOLEAN")),
            ("doc", Some("JSON")),
            ("raw", Some("BLOB")),
            ("score", Some("REAL")),
            ("missing", Some("TEXT")),
        ];
        let first = row(
            &header,
            vec![
                SqlValue::Integer(0),
                SqlValue::Text(r#"{"a":[1,2]}"#.into()),
                SqlValue::Blob(b"hi".to_vec()),
                SqlValue::Real(1.5),
                SqlValue::Null,
            ],
        );
        let columns = SqliteRowDecoder.columns(&first).expect("columns");

        let decoded = SqliteRowDecoder.decode(first, &columns).expect("decode");
        assert_eq!(decoded["enabled"], json!(false));
        assert_eq!(decoded["doc"], json!({ "a": [1, 2] }));
        assert_eq!(decoded["raw"], json!("aGk="));
        assert_eq!(decoded["score"], json!(1.5));
        assert_eq!(decoded["missing"], Value::Null);
    }

    #[test]
    fn invalid_json_text_is_a_decode_error() {
        let first = row(&[("doc", Some("JSON"))], vec![SqlValue::Text("{".into())]);
        let columns = SqliteRowDecoder.columns(&first).expect("columns");

        let err = SqliteRowDecoder
            .decode(first, &columns)
            .expect_err("broken json must not pass as text");
        assert!(matches!(err, DataSourceError::Decode { ref column, .. } if column == "doc"));
    }

    #[test]
    fn values_that_contradict_the_declared_type_are_rejected() {
        let header = [("age", Some("INTEGER")), ("ok", Some("BOOLEAN"))];
        let columns = SqliteRowDecoder
            .columns(&row(&header, vec![SqlValue::Integer(1), SqlValue::Integer(1)]))
            .expect("columns");

        let cases = [
            (vec![SqlValue::Text("abc".into()), SqlValue::Integer(0)], "age"),
            (vec![SqlValue::Integer(2), SqlValue::Text("yes".into())], "ok"),
            (vec![SqlValue::Real(2.5), SqlValue::Real(0.5)], "ok"),
            (vec![SqlValue::Integer(2), SqlValue::Integer(2)], "ok"),
        ];

        for (values, bad) in cases {
            let err = SqliteRowDecoder
                .decode(row(&header, values), &columns)
                .expect_err("mismatched value must fail");
            assert!(
                matches!(err, DataSourceError::Decode { ref column, .. } if column == bad),
                "{err}"
            );
        }
    }

    #[test]
    fn mixed_storage_classes_in_an_untyped_column_are_rejected() {
        let header = [("v", None)];
        let columns = SqliteRowDecoder
            .columns(&row(&header, vec![SqlValue::Integer(1)]))
            .expect("columns");
        assert_eq!(columns[0].column_type, ColumnType::Number);

        let err = SqliteRowDecoder
            .decode(row(&header, vec![SqlValue::Text("x".into())]), &columns)
            .expect_err("text in a number column");
        assert!(err.to_string().contains("text value does not fit a number column"), "{err}");

        let nulls = SqliteRowDecoder
            .decode(row(&header, vec![SqlValue::Null]), &columns)
            .expect("null fits any column");
        assert_eq!(nulls["v"], Value::Null);
    }

    #[test]
    fn unknown_columns_pass_values_through() {
        let header = [("v", None)];
        let columns = SqliteRowDecoder
            .columns(&row(&header, vec![SqlValue::Null]))
            .expect("columns");
        assert_eq!(columns[0].column_type, ColumnType::Unknown);

        let decoded = SqliteRowDecoder
            .decode(row(&header, vec![SqlValue::Text("x".into())]), &columns)
            .expect("unknown accepts text");
        assert_eq!(decoded["v"], json!("x"));
    }

    #[test]
    fn bound_values_keep_their_storage_class() {
        assert_eq!(bind_value(&json!(123)), SqlValue::Integer(123));
        assert_eq!(bind_value(&json!(1.25)), SqlValue::Real(1.25));
        assert_eq!(bind_value(&json!(true)), SqlValue::Integer(1));
        assert_eq!(bind_value(&json!("x")), SqlValue::Text("x".into()));
        assert_eq!(bind_value(&Value::Null), SqlValue::Null);
        assert_eq!(bind_value(&json!([1])), SqlValue::Text("[1]".into()));
    }
}
