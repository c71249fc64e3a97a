//! MongoDB integration tests.
//!
//! Set MONGO_URL to run them. They use the `tabula_it` database.

use super::common::{artifact_lines, tabula};

const DATABASE: &str = "tabula_it";

fn mongo_url() -> Option<String> {
    std::env::var("MONGO_URL").ok()
}

async fn run(url: &str, dest: &std::path::Path, mode: &str, queries: &str) -> Vec<String> {
    tabula(&[
        "--engine",
        "mongo",
        "--conn-str",
        url,
        "--dbname",
        DATABASE,
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
    let Some(url) = mongo_url() else {
        eprintln!("Skipping test: MONGO_URL not set");
        return;
    };
    let dest = tempfile::tempdir().unwrap();

    let lines = run(&url, dest.path(), "4", "").await;
    assert_eq!(lines, vec!["Successfully connected to the database!"]);
}

#[tokio::test]
async fn test_collection_lifecycle() {
    let Some(url) = mongo_url() else {
        eprintln!("Skipping test: MONGO_URL not set");
        return;
    };
    let dest = tempfile::tempdir().unwrap();

    run(&url, dest.path(), "1", "db.people.drop()").await;

    let lines = run(
        &url,
        dest.path(),
        "1",
        "db.people.insertMany([{ _id: 1, name: 'Ana' }, { _id: 2, name: 'Bo', age: 31, tags: ['x'] }, { _id: 3, name: 'Cy', age: 40 }])",
    )
    .await;
    assert_eq!(
        lines,
        vec!["  Collection people, documents inserted with ID(s): 1, 2, 3"]
    );

    let lines = run(&url, dest.path(), "1", "db.people.countDocuments({ age: { $gt: 30 } })").await;
    assert_eq!(lines, vec!["  Collection people count: 2 results."]);

    let lines = run(&url, dest.path(), "1", "db.people.find().sort({ _id: -1 }).limit(2)").await;
    assert!(lines[1].ends_with(".tabula.doc"), "{lines:?}");
    let table = artifact_lines(&lines[1]);
    assert_eq!(table.len(), 3 + 2 * 2);
    assert!(table[3].contains("Cy"));
    assert!(table[5].contains("[\"x\"]"));

    let lines = run(&url, dest.path(), "3", "people").await;
    let table = artifact_lines(&lines[1]);
    assert_eq!(table.len(), 3 + 2 * 4);
    assert!(table[1].contains("KEY"));
    assert!(table[1].contains("DATA_TYPE"));
    assert!(table[9].contains("TAGS"));
    assert!(table[9].contains("array"));

    let lines = run(&url, dest.path(), "1", "db.people.updateMany({ age: { $exists: false } }, { $set: { age: 0 } })").await;
    assert_eq!(lines, vec!["  Collection people, updated 1 document(s)"]);

    let lines = run(&url, dest.path(), "1", "db.people.deleteOne({ _id: 1 })").await;
    assert_eq!(lines, vec!["  Collection people, deleted 1 document(s)"]);

    let lines = run(&url, dest.path(), "2", "").await;
    assert!(lines[0].contains("people"));

    let lines = run(&url, dest.path(), "1", "db.people.drop()").await;
    assert_eq!(lines, vec!["  Collection people dropped successfully."]);

    let lines = run(&url, dest.path(), "3", "people").await;
    assert_eq!(lines, vec!["  Query has returned 0 results."]);
}

#[tokio::test]
async fn test_unknown_function() {
    let Some(url) = mongo_url() else {
        eprintln!("Skipping test: MONGO_URL not set");
        return;
    };
    let dest = tempfile::tempdir().unwrap();

    let lines = run(&url, dest.path(), "1", "db.people.explode()").await;
    assert_eq!(
        lines,
        vec!["[ERROR] Query error: explode is not an available function"]
    );
}
