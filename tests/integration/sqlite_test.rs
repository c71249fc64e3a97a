//! End-to-end tests against a SQLite database file.

use super::common::{artifact_lines, file_count, tabula};
use pretty_assertions::assert_eq;
use tabula_db::render::Highlight;
use tempfile::TempDir;

struct Fixture {
    _db_dir: TempDir,
    dest: TempDir,
    db_path: String,
}

impl Fixture {
    async fn new() -> Self {
        let db_dir = tempfile::tempdir().unwrap();
        let path = db_dir.path().join("app.db");
        std::fs::File::create(&path).unwrap();

        let fixture = Self {
            db_path: path.to_string_lossy().into_owned(),
            _db_dir: db_dir,
            dest: tempfile::tempdir().unwrap(),
        };

        let lines = fixture
            .run(
                "1",
                "CREATE TABLE teams (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
                 CREATE TABLE people (
                     id INTEGER PRIMARY KEY,
                     name TEXT NOT NULL,
                     team_id INTEGER REFERENCES teams(id),
                     note TEXT
                 );
                 INSERT INTO teams (name) VALUES ('core');
                 INSERT INTO people (name, team_id, note) VALUES ('Ana', 1, 'a;b'), ('Bo', 1, NULL);",
            )
            .await;
        assert_eq!(lines[0], "", "setup batch failed: {lines:?}");

        fixture
    }

    async fn run(&self, mode: &str, queries: &str) -> Vec<String> {
        tabula(&[
            "--engine",
            "sqlite",
            "--dbname",
            &self.db_path,
            "--dest-folder",
            &self.dest.path().to_string_lossy(),
            "--option",
            mode,
            "--queries",
            queries,
        ])
        .await
    }
}

#[tokio::test]
async fn test_select_renders_table_file() {
    let fixture = Fixture::new().await;

    let lines = fixture
        .run("1", "SELECT name, note FROM people ORDER BY id")
        .await;
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("'\\<NAME\\>' | hi link header2 Type"));
    assert!(lines[0].contains("'\\<NOTE\\>' | hi link header3 Type"));

    let table = artifact_lines(&lines[1]);
    assert_eq!(table.len(), 3 + 2 * 2);
    assert!(table[3].contains(" #1 "));
    assert!(table[3].contains(" Ana "));
    assert!(table[5].contains(" #2 "));
    assert!(table[3].contains(" a;b "));
    assert!(table[5].contains(" NULL "));
}

#[tokio::test]
async fn test_zero_rows_writes_no_file() {
    let fixture = Fixture::new().await;
    let before = file_count(fixture.dest.path());

    let lines = fixture
        .run("1", "SELECT * FROM people WHERE name = 'nobody'")
        .await;

    assert_eq!(lines, vec!["  Query has returned 0 results."]);
    assert_eq!(file_count(fixture.dest.path()), before);
}

#[tokio::test]
async fn test_single_writes_report_inline() {
    let fixture = Fixture::new().await;

    let lines = fixture.run("1", "UPDATE people SET note = 'x'").await;
    assert_eq!(lines, vec!["  Row(s) affected: 2"]);

    let lines = fixture.run("1", "CREATE INDEX people_name ON people (name);").await;
    assert_eq!(lines, vec!["  Statement executed correctly."]);
}

#[tokio::test]
async fn test_batch_failure_is_isolated() {
    let fixture = Fixture::new().await;

    let lines = fixture
        .run(
            "1",
            "INSERT INTO teams (name) VALUES ('ops');
             INSERT INTO missing_table VALUES (1);
             DELETE FROM people WHERE name = 'Bo';",
        )
        .await;

    assert_eq!(lines[0], Highlight::error_marker().to_string());
    let report = artifact_lines(&lines[1]);
    assert_eq!(report.len(), 3);
    assert_eq!(report[0], "1)   Row(s) affected: 1");
    assert!(report[1].starts_with("2) ✘ "));
    assert!(report[1].contains("missing_table"));
    assert_eq!(report[2], "3)   Row(s) affected: 1");
}

#[tokio::test]
async fn test_semicolon_inside_literal_is_not_a_batch() {
    let fixture = Fixture::new().await;

    let lines = fixture
        .run("1", "SELECT name FROM people WHERE note = 'a;b'")
        .await;
    let table = artifact_lines(&lines[1]);
    assert_eq!(table.len(), 5);
    assert!(table[3].contains("Ana"));
}

#[tokio::test]
async fn test_list_tables() {
    let fixture = Fixture::new().await;
    let lines = fixture.run("2", "").await;
    assert_eq!(lines, vec!["[PEOPLE TEAMS]"]);
}

#[tokio::test]
async fn test_describe_table() {
    let fixture = Fixture::new().await;

    let lines = fixture.run("3", "people").await;
    let table = artifact_lines(&lines[1]);
    assert_eq!(table.len(), 3 + 2 * 4);

    let id_row = &table[3];
    assert!(id_row.contains("ID"));
    assert!(id_row.contains("◆ PRIMARY KEY"));

    let team_row = &table[7];
    assert!(team_row.contains("TEAM_ID"));
    assert!(team_row.contains("◇ FOREIGN KEY"));
    assert!(team_row.contains("→ teams.id"));

    let note_row = &table[9];
    assert!(note_row.contains("NOTE"));
    assert!(note_row.contains("○"));
}

#[tokio::test]
async fn test_ping() {
    let fixture = Fixture::new().await;
    let lines = fixture.run("4", "").await;
    assert_eq!(lines, vec!["Successfully connected to the database!"]);
}

#[tokio::test]
async fn test_query_error_is_reported() {
    let fixture = Fixture::new().await;
    let lines = fixture.run("1", "SELECT * FROM nowhere").await;
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("[ERROR] Query error: "));
    assert!(lines[0].contains("nowhere"));
}

#[tokio::test]
async fn test_missing_database_is_a_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.db");

    let lines = tabula(&[
        "--engine",
        "sqlite",
        "--dbname",
        &missing.to_string_lossy(),
        "--option",
        "4",
    ])
    .await;
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("[ERROR] Connection error: "));
}

#[tokio::test]
async fn test_unknown_engine() {
    let lines = tabula(&["--engine", "oracle", "--option", "4"]).await;
    assert_eq!(
        lines,
        vec!["[ERROR] Configuration error: Engine oracle is not supported"]
    );
}
