//! Runs against a live server when `QUARRY_POSTGRES_URL` is set; otherwise
//! every test returns early.

use quarry_core::{
    data_source::{ColumnType, DataColumn, DataSource, ExecuteOptions},
    obs::QueryLogger,
};
use quarry_postgres::{PostgresDataSource, PostgresOptions};
use serde_json::json;

fn source() -> Option<PostgresDataSource> {
    let url = std::env::var("QUARRY_POSTGRES_URL").ok()?;
    let options = PostgresOptions {
        url,
        max_connections: 2,
    };

    Some(PostgresDataSource::new(&options, QueryLogger::disabled()).expect("lazy pool"))
}

#[tokio::test]
async fn users_scenario() {
    let Some(source) = source() else {
        return;
    };
    let table = format!("quarry_users_{}", uuid::Uuid::new_v4().simple());

    source
        .execute(ExecuteOptions::new(format!(
            "CREATE TABLE {table} (id INT8 PRIMARY KEY, name TEXT NOT NULL, age INT4, enabled BOOL)"
        )))
        .await
        .expect("create table");
    source
        .execute(
            ExecuteOptions::new(format!(
                "INSERT INTO {table} VALUES (1, 'alice', $1, true), (2, 'bob', $2, true), (3, 'carol', $3, false)"
            ))
            .bind("$1", 18)
            .bind("$2", 180)
            .bind("$3", 1800),
        )
        .await
        .expect("insert seed rows");
    source
        .execute(ExecuteOptions::new(format!(
            "INSERT INTO {table} SELECT n, 'user' || (n - 4), 18000, false FROM generate_series(4, 2003) AS n"
        )))
        .await
        .expect("insert bulk rows");

    let filtered = source
        .execute(
            ExecuteOptions::new(format!("SELECT * FROM {table} WHERE age < $1 ORDER BY id DESC"))
                .bind("$1", 200),
        )
        .await
        .expect("filtered query");
    assert_eq!(
        filtered.columns(),
        &[
            DataColumn::new("id", ColumnType::Number),
            DataColumn::new("name", ColumnType::String),
            DataColumn::new("age", ColumnType::Number),
            DataColumn::new("enabled", ColumnType::Boolean),
        ]
    );
    let rows = filtered.collect_rows().await.expect("rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], json!(2));
    assert_eq!(rows[1]["id"], json!(1));

    let rows = source
        .execute(ExecuteOptions::new(format!("SELECT * FROM {table} ORDER BY id ASC")))
        .await
        .expect("full query")
        .collect_rows()
        .await
        .expect("rows");
    assert_eq!(rows.len(), 2003);
    assert_eq!(
        serde_json::to_value(&rows[1234]).expect("row json"),
        json!({ "id": 1235, "name": "user1231", "age": 18000, "enabled": false })
    );

    let empty = source
        .execute(ExecuteOptions::new(format!("SELECT * FROM {table} WHERE age < 0")))
        .await
        .expect("empty query");
    assert!(empty.columns().is_empty());

    source
        .execute(ExecuteOptions::new(format!("DROP TABLE {table}")))
        .await
        .expect("drop table");
}

#[tokio::test]
async fn syntax_errors_surface_the_server_message() {
    let Some(source) = source() else {
        return;
    };

    let err = source
        .execute(ExecuteOptions::new("wrong syntax"))
        .await
        .expect_err("bad statement must fail");

    assert!(err.to_string().contains("syntax error"), "{err}");
}
