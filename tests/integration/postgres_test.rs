//! PostgreSQL integration tests.
//!
//! Set DATABASE_URL to run them.

use super::common::{artifact_lines, tabula};

fn database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok()
}

async fn run(url: &str, dest: &std::path::Path, mode: &str, queries: &str) -> Vec<String> {
    tabula(&[
        "--engine",
        "postgres",
        "--conn-str",
        url,
        "--dest-folder",
        &dest.to_string_lossy(),
        "--option",
        mode,
        "--queries",
        queries,
    ])
    .await
}

#[tokio::test]
async fn test_ping() {
    let Some(url) = database_url() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let dest = tempfile::tempdir().unwrap();

    let lines = run(&url, dest.path(), "4", "").await;
    assert_eq!(lines, vec!["Successfully connected to the database!"]);
}

#[tokio::test]
async fn test_select_literals() {
    let Some(url) = database_url() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let dest = tempfile::tempdir().unwrap();

    let lines = run(&url, dest.path(), "1", "SELECT 1 AS num, 'hello' AS greeting, NULL::text AS nothing").await;
    assert_eq!(lines.len(), 2, "{lines:?}");

    let table = artifact_lines(&lines[1]);
    assert_eq!(table.len(), 5);
    assert!(table[1].contains("NUM"));
    assert!(table[1].contains("GREETING"));
    assert!(table[3].contains(" hello "));
    assert!(table[3].contains(" NULL "));
}

#[tokio::test]
async fn test_table_lifecycle() {
    let Some(url) = database_url() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let dest = tempfile::tempdir().unwrap();

    let lines = run(
        &url,
        dest.path(),
        "1",
        "DROP TABLE IF EXISTS tabula_it_people;
         CREATE TABLE tabula_it_people (id SERIAL PRIMARY KEY, name VARCHAR(20) NOT NULL, note TEXT);
         INSERT INTO tabula_it_people (name) VALUES ('Ana'), ('Bo');",
    )
    .await;
    assert_eq!(lines[0], "", "{lines:?}");
    let report = artifact_lines(&lines[1]);
    assert_eq!(report[2], "3)   Row(s) affected: 2");

    let lines = run(&url, dest.path(), "2", "").await;
    assert!(lines[0].contains("TABULA_IT_PEOPLE"));

    let lines = run(&url, dest.path(), "3", "TABULA_IT_PEOPLE").await;
    let table = artifact_lines(&lines[1]);
    assert_eq!(table.len(), 3 + 2 * 3);
    assert!(table[3].contains("◆ PRIMARY KEY"));
    assert!(table[5].contains("20"));
    assert!(table[7].contains("○"));

    let lines = run(&url, dest.path(), "1", "DROP TABLE tabula_it_people").await;
    assert_eq!(lines, vec!["  Statement executed correctly."]);
}

#[tokio::test]
async fn test_error_carries_server_message() {
    let Some(url) = database_url() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let dest = tempfile::tempdir().unwrap();

    let lines = run(&url, dest.path(), "1", "SELECT * FROM tabula_it_missing").await;
    assert!(lines[0].starts_with("[ERROR] Query error: "));
    assert!(lines[0].contains("tabula_it_missing"));
}
