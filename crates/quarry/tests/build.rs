#![cfg(feature = "sqlite")]

use quarry::{
    Builder, DataSourceRegistry, Error,
    build::{Artifact, ParameterCheckPolicy},
    config::QuarryConfig,
    core::{
        data_source::{ExecuteOptions, PrepareParameter},
        obs::{QueryLogSink, TracingQueryLogSink},
        schema::{AllTemplateMetadata, ErrorDefinition, FieldIn, FieldType, TemplateMetadata},
    },
};
use serde_json::json;
use std::{fs, path::PathBuf, sync::Arc};
use tempfile::TempDir;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sqls")
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

// Config file in a fresh folder; the schema folder is absolute so only the
// artifact and the database land in the tempdir.
fn project(schema_path: &str) -> (TempDir, QuarryConfig) {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = format!(
        r#"
[schema-parser]
schema-path = "{schema_path}"

[artifact]
path = "dist/result.json"

[[profiles]]
name = "local"
type = "sqlite"
log-queries = true
[profiles.connection]
persistent-path = "users.db"
"#
    );
    let path = dir.path().join("quarry.toml");
    fs::write(&path, source).expect("write config");

    let config = QuarryConfig::load(&path).expect("load config");
    (dir, config)
}

fn metadata() -> Arc<AllTemplateMetadata> {
    let mut all = AllTemplateMetadata::new();
    all.insert(
        "user/list".to_string(),
        TemplateMetadata::new()
            .with_parameter("maxAge")
            .with_error("E_TOO_MANY", "template message")
            .with_error("E_NO_USERS", "template message"),
    );
    all.insert(
        "user/detail".to_string(),
        TemplateMetadata::new().with_parameter("id"),
    );
    Arc::new(all)
}

#[tokio::test]
async fn build_compiles_fixtures_and_writes_the_artifact() {
    init_tracing();
    let (dir, config) = project(&fixtures().to_string_lossy());

    let artifact = Builder::default()
        .build(&config, Some(metadata()))
        .await
        .expect("build");

    let names: Vec<_> = artifact.schemas.iter().map(|s| s.source_name.as_str()).collect();
    assert_eq!(names, ["health", "user/detail", "user/list"]);

    let health = &artifact.schemas[0];
    assert_eq!(health.url_path, "/health");
    assert_eq!(health.description.as_deref(), Some("liveness probe"));
    assert!(health.errors.is_empty());

    let detail = &artifact.schemas[1];
    assert_eq!(detail.url_path, "/users/:id");
    assert_eq!(detail.request[0].field_in, FieldIn::Path);

    let list = &artifact.schemas[2];
    assert_eq!(list.template_source, "user/list");
    assert_eq!(list.profiles, ["local"]);
    assert_eq!(list.request[0].field_type, FieldType::Integer);
    assert_eq!(list.request[0].validators[1].args["min"], json!(0));
    assert_eq!(
        list.errors,
        vec![
            ErrorDefinition::new("E_TOO_MANY", "too many users"),
            ErrorDefinition::placeholder("E_NO_USERS"),
        ]
    );

    let written = Artifact::read(&dir.path().join("dist/result.json"))
        .await
        .expect("read artifact");
    assert_eq!(written, artifact);
}

#[tokio::test]
async fn compiled_schema_runs_against_its_profile() {
    let (dir, config) = project(&fixtures().to_string_lossy());
    let artifact = Builder::default()
        .build(&config, Some(metadata()))
        .await
        .expect("build");
    let list = artifact
        .schemas
        .iter()
        .find(|s| s.source_name == "user/list")
        .expect("user/list schema");

    let sink: Arc<dyn QueryLogSink> = Arc::new(TracingQueryLogSink);
    let registry = DataSourceRegistry::from_profiles(&config.profiles, &sink).expect("registry");
    let source = registry.try_get(&list.profiles[0]).expect("profile source");

    source
        .execute(ExecuteOptions::new(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, age INTEGER)",
        ))
        .await
        .expect("create table");
    source
        .execute(ExecuteOptions::new(
            "INSERT INTO users VALUES (1, 'alice', 18), (2, 'bob', 180), (3, 'carol', 1800)",
        ))
        .await
        .expect("insert rows");

    let statement = fs::read_to_string(fixtures().join(format!("{}.sql", list.template_source)))
        .expect("template");
    let token = source
        .prepare(PrepareParameter {
            parameter_index: 1,
            value: json!(200),
        })
        .await
        .expect("prepare");

    let rows = source
        .execute(ExecuteOptions::new(statement.trim()).bind(token, 200))
        .await
        .expect("execute")
        .collect_rows()
        .await
        .expect("rows");

    let names: Vec<_> = rows.iter().map(|row| row["name"].clone()).collect();
    assert_eq!(names, [json!("bob"), json!("alice")]);
    assert!(dir.path().join("users.db").exists());
}

#[tokio::test]
async fn unknown_profiles_fail_the_build() {
    let schemas = tempfile::tempdir().expect("schema dir");
    fs::write(schemas.path().join("report.yaml"), "profiles: [warehouse]\n").expect("write schema");
    let (dir, config) = project(&schemas.path().to_string_lossy());

    let err = Builder::default().build(&config, None).await.expect_err("unknown profile");

    assert!(
        matches!(err, Error::UnknownProfile { ref source_name, ref profile }
            if source_name == "report" && profile == "warehouse"),
        "{err}"
    );
    assert!(!dir.path().join("dist/result.json").exists(), "no artifact on failure");
}

#[tokio::test]
async fn undeclared_template_parameters_fail_unless_warned() {
    let mut all = AllTemplateMetadata::new();
    all.insert("health".to_string(), TemplateMetadata::new().with_parameter("verbose"));
    let metadata = Arc::new(all);

    let (_dir, config) = project(&fixtures().to_string_lossy());
    let err = Builder::default()
        .build(&config, Some(Arc::clone(&metadata)))
        .await
        .expect_err("fail policy");
    assert!(matches!(err, Error::Parse(_)), "{err}");
    assert!(err.to_string().contains("verbose"), "{err}");

    let (_dir, mut config) = project(&fixtures().to_string_lossy());
    config.schema_parser.parameter_check = ParameterCheckPolicy::Warn;
    let artifact = Builder::default()
        .build(&config, Some(metadata))
        .await
        .expect("warn policy");
    assert_eq!(artifact.schemas.len(), 3);
}

#[test]
fn version_matches_the_workspace() {
    assert_eq!(quarry::VERSION, env!("CARGO_PKG_VERSION"));
}
