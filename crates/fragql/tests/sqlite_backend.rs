//! End-to-end tests: fragments resolved by the operator and run on in-memory SQLite.

use fragql::{
    Backend, BatchBackend, Comparator, FromRow, Operator, OperatorConfig, OrmResult, Record,
    RecordExt, Rows, SqliteBackend, Statement, Value, Values,
};
use std::time::Duration;

const SCHEMA: &str = r#"
CREATE TABLE note_author (
    id TEXT NOT NULL PRIMARY KEY,
    name TEXT NOT NULL
);
CREATE TABLE note (
    id INTEGER NOT NULL PRIMARY KEY,
    author_id TEXT NOT NULL REFERENCES note_author(id),
    body TEXT,
    score REAL,
    pinned INTEGER NOT NULL DEFAULT 0
);
"#;

#[derive(Debug, PartialEq)]
struct Note {
    id: i64,
    body: Option<String>,
    pinned: bool,
}

impl FromRow for Note {
    fn from_row(row: &Record) -> OrmResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            body: row.try_get_column("body")?,
            pinned: row.try_get_column("pinned")?,
        })
    }
}

async fn setup() -> Operator<SqliteBackend> {
    let backend = SqliteBackend::open_in_memory().await.unwrap();
    backend.execute_batch(SCHEMA).await.unwrap();
    let operator = Operator::new(backend);
    let author = Values::new().set("id", "a1").set("name", "Ada");
    operator
        .run(|ctx| vec![ctx.insert_into("note_author", author)])
        .await
        .unwrap();
    operator
}

async fn insert_note(
    operator: &Operator<SqliteBackend>,
    id: i64,
    body: Option<&str>,
    pinned: bool,
) {
    let values = Values::new()
        .set("id", id)
        .set("author_id", "a1")
        .set("body", body)
        .set("pinned", pinned);
    operator
        .run(|ctx| vec![ctx.insert_into("note", values)])
        .await
        .unwrap();
}

#[tokio::test]
async fn insert_returning_through_get() {
    let operator = setup().await;
    let values = Values::new()
        .set("id", 1)
        .set("author_id", "a1")
        .set("body", "hi");
    let note: Option<Note> = operator
        .get(|ctx| vec![ctx.insert_into("note", values), ctx.returning(["*"])])
        .await
        .unwrap();
    assert_eq!(
        note,
        Some(Note {
            id: 1,
            body: Some("hi".into()),
            pinned: false,
        })
    );
}

#[tokio::test]
async fn get_and_get_all_shapes() {
    let operator = setup().await;
    insert_note(&operator, 1, Some("one"), true).await;
    insert_note(&operator, 2, None, false).await;

    let missing: Option<Note> = operator
        .get(|ctx| {
            vec![
                ctx.select_from("note", ["*"]),
                ctx.where_("id", Comparator::Eq, 99),
            ]
        })
        .await
        .unwrap();
    assert!(missing.is_none());

    let none: Vec<Note> = operator
        .get_all(|ctx| {
            vec![
                ctx.select_from("note", ["*"]),
                ctx.where_("author_id", Comparator::Eq, "nobody"),
            ]
        })
        .await
        .unwrap();
    assert!(none.is_empty());

    let mut notes: Vec<Note> = operator
        .get_all(|ctx| {
            vec![
                ctx.select_from("note", ["*"]),
                ctx.where_("author_id", Comparator::Eq, "a1"),
            ]
        })
        .await
        .unwrap();
    notes.sort_by_key(|n| n.id);
    assert_eq!(notes.len(), 2);
    assert!(notes[0].pinned);
    assert_eq!(notes[1].body, None);
}

#[tokio::test]
async fn join_with_aliased_columns() {
    let operator = setup().await;
    insert_note(&operator, 7, Some("joined"), false).await;

    let columns = ["note.body", "note_author.name AS _author_name"];
    let row: Record = operator
        .get(|ctx| {
            vec![
                ctx.select_from("note", columns),
                ctx.inner_join("note_author", "note_author.id", "note.author_id"),
                ctx.where_("note.id", Comparator::Eq, 7),
            ]
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.get("body"), Some(&Value::Text("joined".into())));
    assert_eq!(row.get("_author_name"), Some(&Value::Text("Ada".into())));
}

#[tokio::test]
async fn update_and_delete_with_conjunction() {
    let operator = setup().await;
    insert_note(&operator, 1, Some("keep"), true).await;
    insert_note(&operator, 2, Some("drop"), false).await;

    operator
        .run(|ctx| {
            vec![
                ctx.update("note", Values::new().set("score", 2.5)),
                ctx.where_("id", Comparator::Eq, 1),
            ]
        })
        .await
        .unwrap();

    for id in [1, 2] {
        operator
            .run(|ctx| {
                vec![
                    ctx.delete_from("note"),
                    ctx.and([ctx.eq("id", id), ctx.eq("pinned", false)]),
                ]
            })
            .await
            .unwrap();
    }

    let rows: Vec<Record> = operator
        .get_all(|ctx| vec![ctx.select_from("note", ["id", "score"])])
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("id"), Some(&Value::Integer(1)));
    assert_eq!(rows[0].get("score"), Some(&Value::Real(2.5)));
}

#[tokio::test]
async fn constraint_violations_are_backend_errors() {
    let operator = setup().await;
    insert_note(&operator, 1, None, false).await;

    let duplicate = Values::new().set("id", 1).set("author_id", "a1");
    let err = operator
        .run(|ctx| vec![ctx.insert_into("note", duplicate)])
        .await
        .unwrap_err();
    assert!(
        err.backend_text()
            .unwrap()
            .contains("UNIQUE constraint failed")
    );

    let orphan = Values::new().set("id", 2).set("author_id", "ghost");
    let err = operator
        .run(|ctx| vec![ctx.insert_into("note", orphan)])
        .await
        .unwrap_err();
    assert!(
        err.backend_text()
            .unwrap()
            .contains("FOREIGN KEY constraint failed")
    );
}

#[tokio::test]
async fn batch_is_atomic() {
    let operator = setup().await;
    let good = Values::new().set("id", 10).set("author_id", "a1");
    let good = operator
        .write(|ctx| vec![ctx.insert_into("note", good), ctx.returning(["id"])])
        .unwrap();
    let bad = Values::new().set("id", 11).set("author_id", "ghost");
    let bad = operator
        .write(|ctx| vec![ctx.insert_into("note", bad)])
        .unwrap();

    assert!(operator.batch(&[good.clone(), bad]).await.is_err());
    let rows: Vec<Record> = operator
        .get_all(|ctx| vec![ctx.select_from("note", ["*"])])
        .await
        .unwrap();
    assert!(rows.is_empty());

    let results = operator.batch(&[good]).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0][0].get("id"), Some(&Value::Integer(10)));
}

#[tokio::test]
async fn backend_get_reports_many() {
    let backend = SqliteBackend::open_in_memory().await.unwrap();
    let rows = backend.get("SELECT 1 AS one", &[]).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(!rows.is_empty());
    match rows {
        Rows::Many(records) => assert_eq!(records[0].get("one"), Some(&Value::Integer(1))),
        other => panic!("expected Rows::Many, got {other:?}"),
    }
}

#[tokio::test]
async fn blob_columns_are_rejected() {
    let backend = SqliteBackend::open_in_memory().await.unwrap();
    let err = backend.get("SELECT x'00' AS b", &[]).await.unwrap_err();
    assert!(err.is_backend());
}

/// Counts to a hundred million; runs for seconds unless interrupted.
const SLOW_COUNT: &str = "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c \
     WHERE x < 100000000) SELECT max(x) AS m FROM c";

async fn author_exists(backend: &SqliteBackend, id: &str) -> bool {
    let rows = backend
        .get("SELECT id FROM note_author WHERE id = ?", &[Value::from(id)])
        .await
        .unwrap();
    !rows.is_empty()
}

#[tokio::test]
async fn timed_out_batch_is_rolled_back() {
    let backend = SqliteBackend::open_in_memory().await.unwrap();
    backend.execute_batch(SCHEMA).await.unwrap();
    let config = OperatorConfig::new().timeout(Duration::from_millis(5));
    let operator = Operator::with_config(backend.clone(), config);

    let slow = Statement::new(SLOW_COUNT, vec![]);
    let values = Values::new().set("id", "late").set("name", "L");
    let insert = operator
        .write(|ctx| vec![ctx.insert_into("note_author", values)])
        .unwrap();
    let err = operator.batch(&[slow, insert]).await.unwrap_err();
    assert!(err.is_timeout());

    // Queued behind the cancelled call, so this sees its final outcome.
    assert!(!author_exists(&backend, "late").await);
    assert!(backend.get("SELECT 1 AS one", &[]).await.is_ok());
}

#[tokio::test]
async fn dropped_run_does_not_commit() {
    let backend = SqliteBackend::open_in_memory().await.unwrap();
    backend.execute_batch(SCHEMA).await.unwrap();
    let slow_insert = format!(
        "INSERT INTO note_author (id, name) SELECT 'late', 'L' FROM ({SLOW_COUNT})"
    );

    let run = backend.run(&slow_insert, &[]);
    let outcome = tokio::time::timeout(Duration::from_millis(5), run).await;
    assert!(outcome.is_err());
    assert!(!author_exists(&backend, "late").await);
}

#[tokio::test]
async fn finished_batch_is_not_cancelled() {
    let backend = SqliteBackend::open_in_memory().await.unwrap();
    backend.execute_batch(SCHEMA).await.unwrap();
    let insert = Statement::new(
        "INSERT INTO note_author (id, name) VALUES (?, ?)",
        vec![Value::from("a9"), Value::from("Nine")],
    );
    backend.batch(&[insert]).await.unwrap();
    assert!(author_exists(&backend, "a9").await);
}
