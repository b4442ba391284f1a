use kanban_core::db::open_db_in_memory;
use kanban_core::{
    AuthGate, AuthenticatedUser, CardRepository, ErrorKind, Headers, KanbanError, KanbanService,
    SqliteKanbanRepository, StaticTokenVerifier, UserRepository,
};
use rusqlite::Connection;
use std::thread::sleep;
use std::time::Duration;
use uuid::Uuid;

fn login(conn: &Connection, username: &str) -> AuthenticatedUser {
    let repo = SqliteKanbanRepository::try_new(conn).unwrap();
    let user = repo.create_user(username).unwrap();
    let gate = AuthGate::new(StaticTokenVerifier::new().with_user_token("tok", user.id));
    let headers = Headers::from([("Authorization".to_string(), "Bearer tok".to_string())]);
    gate.authenticate(&headers, &repo).unwrap()
}

fn service(conn: &Connection) -> KanbanService<SqliteKanbanRepository<'_>> {
    KanbanService::new(SqliteKanbanRepository::try_new(conn).unwrap())
}

#[test]
fn create_card_attaches_to_column_with_equal_timestamps() {
    let conn = open_db_in_memory().unwrap();
    let caller = login(&conn, "ada");
    let service = service(&conn);

    let column = service.create_column(&caller, "Todo", None).unwrap();
    let card = service.create_card(&caller, "write spec", column.id).unwrap();

    assert_eq!(card.column_id, column.id);
    assert_eq!(card.content, "write spec");
    assert_eq!(card.created_at, card.updated_at);
    assert_eq!(service.list_cards(&caller, column.id).unwrap(), vec![card]);
}

#[test]
fn create_card_in_unknown_column_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let caller = login(&conn, "ada");
    let missing = Uuid::new_v4();

    let err = service(&conn)
        .create_card(&caller, "orphan", missing)
        .unwrap_err();
    assert!(matches!(err, KanbanError::ColumnNotFound(id) if id == missing));

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM cards;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn create_card_rejects_blank_content() {
    let conn = open_db_in_memory().unwrap();
    let caller = login(&conn, "ada");
    let service = service(&conn);
    let column = service.create_column(&caller, "Todo", None).unwrap();

    let err = service.create_card(&caller, " \n ", column.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);
}

#[test]
fn update_card_replaces_content_and_advances_updated_at() {
    let conn = open_db_in_memory().unwrap();
    let caller = login(&conn, "ada");
    let service = service(&conn);
    let column = service.create_column(&caller, "Todo", None).unwrap();
    let card = service.create_card(&caller, "draft", column.id).unwrap();

    sleep(Duration::from_millis(10));
    let updated = service.update_card(&caller, card.id, "final").unwrap();

    assert_eq!(updated.id, card.id);
    assert_eq!(updated.content, "final");
    assert_eq!(updated.created_at, card.created_at);
    assert!(updated.updated_at > card.updated_at);
}

#[test]
fn updated_at_never_moves_backwards() {
    let conn = open_db_in_memory().unwrap();
    let caller = login(&conn, "ada");
    let service = service(&conn);
    let column = service.create_column(&caller, "Todo", None).unwrap();
    let card = service.create_card(&caller, "draft", column.id).unwrap();

    let future = card.updated_at + 86_400_000;
    conn.execute(
        "UPDATE cards SET updated_at = ?2 WHERE id = ?1;",
        rusqlite::params![card.id.to_string(), future],
    )
    .unwrap();

    let updated = service.update_card(&caller, card.id, "again").unwrap();
    assert_eq!(updated.updated_at, future);
}

#[test]
fn update_unknown_card_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let caller = login(&conn, "ada");

    let err = service(&conn)
        .update_card(&caller, Uuid::new_v4(), "text")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn move_card_reassigns_column() {
    let conn = open_db_in_memory().unwrap();
    let caller = login(&conn, "ada");
    let service = service(&conn);
    let todo = service.create_column(&caller, "Todo", None).unwrap();
    let doing = service.create_column(&caller, "Doing", None).unwrap();
    let card = service.create_card(&caller, "task", todo.id).unwrap();

    let moved = service.move_card(&caller, card.id, doing.id).unwrap();

    assert_eq!(moved.column_id, doing.id);
    assert!(moved.updated_at >= card.updated_at);
    assert!(service.list_cards(&caller, todo.id).unwrap().is_empty());
    assert_eq!(service.list_cards(&caller, doing.id).unwrap(), vec![moved]);
}

#[test]
fn move_card_to_unknown_column_leaves_card_untouched() {
    let conn = open_db_in_memory().unwrap();
    let caller = login(&conn, "ada");
    let service = service(&conn);
    let todo = service.create_column(&caller, "Todo", None).unwrap();
    let card = service.create_card(&caller, "task", todo.id).unwrap();
    let missing = Uuid::new_v4();

    let err = service.move_card(&caller, card.id, missing).unwrap_err();
    assert!(matches!(err, KanbanError::ColumnNotFound(id) if id == missing));

    let repo = SqliteKanbanRepository::try_new(&conn).unwrap();
    assert_eq!(repo.get_card(card.id).unwrap(), Some(card));
}

#[test]
fn move_unknown_card_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let caller = login(&conn, "ada");
    let service = service(&conn);
    let todo = service.create_column(&caller, "Todo", None).unwrap();
    let missing = Uuid::new_v4();

    let err = service.move_card(&caller, missing, todo.id).unwrap_err();
    assert!(matches!(err, KanbanError::CardNotFound(id) if id == missing));
}

#[test]
fn delete_card_twice_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let caller = login(&conn, "ada");
    let service = service(&conn);
    let todo = service.create_column(&caller, "Todo", None).unwrap();
    let card = service.create_card(&caller, "task", todo.id).unwrap();

    service.delete_card(&caller, card.id).unwrap();
    let err = service.delete_card(&caller, card.id).unwrap_err();
    assert!(matches!(err, KanbanError::CardNotFound(id) if id == card.id));
}
