use rusqlite::Connection;
use todo_core::db::{open_db, open_db_in_memory};
use todo_core::{RepoError, SqliteTaskRepository, Task, TaskRepository};
use uuid::Uuid;

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);

    let mut task = Task::new("Buy milk");
    task.description = Some("2.5% milk".to_string());
    task.owner_ref = Some(42);
    let id = repo.create_task(&task).unwrap();

    let loaded = repo.get_task(id).unwrap().unwrap();
    assert_eq!(loaded, task);
}

#[test]
fn reopening_file_preserves_every_field() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("todo.sqlite3");

    let mut task = Task::new("Call plumber");
    task.description = Some("kitchen sink".to_string());
    task.is_completed = true;
    task.date = 1_754_222_400_000;
    task.owner_ref = Some(7);

    {
        let conn = open_db(&path).unwrap();
        SqliteTaskRepository::new(&conn).create_task(&task).unwrap();
    }

    let conn = open_db(&path).unwrap();
    let tasks = SqliteTaskRepository::new(&conn).list_tasks().unwrap();
    assert_eq!(tasks, vec![task]);
}

#[test]
fn update_missing_task_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);

    let task = Task::new("ghost");
    let err = repo.update_task(&task).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == task.id));
}

#[test]
fn delete_twice_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);

    let task = Task::new("once");
    repo.create_task(&task).unwrap();
    repo.delete_task(task.id).unwrap();

    let err = repo.delete_task(task.id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == task.id));
    assert!(repo.get_task(task.id).unwrap().is_none());
}

#[test]
fn validation_failure_blocks_create_and_update() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);

    let create_err = repo.create_task(&Task::new("")).unwrap_err();
    assert!(matches!(create_err, RepoError::Validation(_)));

    let mut task = Task::new("valid");
    repo.create_task(&task).unwrap();
    task.name = " ".to_string();
    let update_err = repo.update_task(&task).unwrap_err();
    assert!(matches!(update_err, RepoError::Validation(_)));
    assert_eq!(repo.get_task(task.id).unwrap().unwrap().name, "valid");
}

#[test]
fn list_is_ordered_by_date_then_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);

    let mut late = Task::new("late");
    late.date = 300;
    let mut early = Task::new("early");
    early.date = 100;
    repo.create_task(&late).unwrap();
    repo.create_task(&early).unwrap();

    let names = repo
        .list_tasks()
        .unwrap()
        .into_iter()
        .map(|task| task.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["early", "late"]);
}

#[test]
fn search_matches_name_or_description_and_escapes_wildcards() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);

    let mut milk = Task::new("Buy MILK");
    milk.description = Some("2.5% fat".to_string());
    let bread = Task::new("Bake bread");
    repo.create_task(&milk).unwrap();
    repo.create_task(&bread).unwrap();

    let by_name = repo.search_tasks("milk").unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].id, milk.id);

    let by_description = repo.search_tasks("5% F").unwrap();
    assert_eq!(by_description.len(), 1);
    assert_eq!(by_description[0].id, milk.id);

    assert_eq!(repo.search_tasks("%").unwrap().len(), 1);
    assert_eq!(repo.search_tasks("").unwrap().len(), 2);
}

#[test]
fn corrupt_rows_are_reported_not_masked() {
    let conn = open_db_in_memory().unwrap();
    insert_raw(&conn, "not-a-uuid", "bad id", 0);

    let err = SqliteTaskRepository::new(&conn).list_tasks().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn unknown_id_reads_as_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);
    assert!(repo.get_task(Uuid::new_v4()).unwrap().is_none());
}

fn insert_raw(conn: &Connection, id: &str, name: &str, is_completed: i64) {
    conn.execute(
        "INSERT INTO tasks (id, name, is_completed, date) VALUES (?1, ?2, ?3, 0);",
        rusqlite::params![id, name, is_completed],
    )
    .unwrap();
}
