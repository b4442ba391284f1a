use kanban_core::db::open_db_in_memory;
use kanban_core::{
    AuthError, AuthGate, Headers, SqliteKanbanRepository, StaticTokenVerifier, TokenRejection,
    UserRepository,
};
use uuid::Uuid;

fn headers(value: &str) -> Headers {
    Headers::from([("Authorization".to_string(), value.to_string())])
}

#[test]
fn valid_bearer_token_resolves_user() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKanbanRepository::try_new(&conn).unwrap();
    let user = repo.create_user("ada").unwrap();
    let gate = AuthGate::new(StaticTokenVerifier::new().with_user_token("tok-ada", user.id));

    let caller = gate
        .authenticate(&headers("Bearer tok-ada"), &repo)
        .unwrap();
    assert_eq!(caller.user_id(), user.id);
}

#[test]
fn header_name_is_case_insensitive() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKanbanRepository::try_new(&conn).unwrap();
    let user = repo.create_user("ada").unwrap();
    let gate = AuthGate::new(StaticTokenVerifier::new().with_user_token("tok", user.id));

    let lower = Headers::from([("authorization".to_string(), "bearer tok".to_string())]);
    assert!(gate.authenticate(&lower, &repo).is_ok());
}

#[test]
fn missing_header_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKanbanRepository::try_new(&conn).unwrap();
    let gate = AuthGate::new(StaticTokenVerifier::new());

    let err = gate.authenticate(&Headers::new(), &repo).unwrap_err();
    assert!(matches!(err, AuthError::MissingCredential));
    assert_eq!(err.to_string(), "no credential supplied");
}

#[test]
fn malformed_header_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKanbanRepository::try_new(&conn).unwrap();
    let user = repo.create_user("ada").unwrap();
    let gate = AuthGate::new(StaticTokenVerifier::new().with_user_token("tok", user.id));

    for value in ["tok", "Bearer", "Token tok", "Bearer tok extra"] {
        let err = gate.authenticate(&headers(value), &repo).unwrap_err();
        assert!(
            matches!(err, AuthError::MalformedCredential),
            "`{value}` should be malformed, got {err:?}"
        );
    }
}

#[test]
fn unknown_and_expired_tokens_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKanbanRepository::try_new(&conn).unwrap();
    let user = repo.create_user("ada").unwrap();
    let gate = AuthGate::new(
        StaticTokenVerifier::new().with_expiring_user_token("stale", user.id, 1),
    );

    let err = gate.authenticate(&headers("Bearer nope"), &repo).unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken(TokenRejection::Unknown)));

    let err = gate.authenticate(&headers("Bearer stale"), &repo).unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken(TokenRejection::Expired)));
}

#[test]
fn anonymous_identity_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKanbanRepository::try_new(&conn).unwrap();
    let gate = AuthGate::new(StaticTokenVerifier::new().with_anonymous_token("guest"));

    let err = gate.authenticate(&headers("Bearer guest"), &repo).unwrap_err();
    assert!(matches!(err, AuthError::AnonymousIdentity));
}

#[test]
fn token_for_unknown_or_inactive_user_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKanbanRepository::try_new(&conn).unwrap();
    let ghost = Uuid::new_v4();
    let user = repo.create_user("ada").unwrap();
    repo.set_user_active(user.id, false).unwrap();
    let gate = AuthGate::new(
        StaticTokenVerifier::new()
            .with_user_token("ghost", ghost)
            .with_user_token("ada", user.id),
    );

    let err = gate.authenticate(&headers("Bearer ghost"), &repo).unwrap_err();
    assert!(matches!(err, AuthError::UnknownUser(id) if id == ghost));

    let err = gate.authenticate(&headers("Bearer ada"), &repo).unwrap_err();
    assert!(matches!(err, AuthError::InactiveUser(id) if id == user.id));
}

#[test]
fn gate_accepts_boxed_verifier() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKanbanRepository::try_new(&conn).unwrap();
    let user = repo.create_user("ada").unwrap();
    let verifier: Box<dyn kanban_core::TokenVerifier> =
        Box::new(StaticTokenVerifier::new().with_user_token("tok", user.id));
    let gate = AuthGate::new(verifier);

    assert!(gate.authenticate(&headers("Bearer tok"), &repo).is_ok());
}

#[test]
fn credential_check_needs_no_store() {
    let user_id = Uuid::new_v4();
    let gate = AuthGate::new(
        StaticTokenVerifier::new()
            .with_user_token("tok", user_id)
            .with_anonymous_token("guest"),
    );

    let credential = gate.verify_credential(&headers("Bearer tok")).unwrap();
    assert_eq!(credential.user_id(), user_id);

    assert!(matches!(
        gate.verify_credential(&Headers::new()),
        Err(AuthError::MissingCredential)
    ));
    assert!(matches!(
        gate.verify_credential(&headers("Bearer guest")),
        Err(AuthError::AnonymousIdentity)
    ));
}

#[test]
fn verified_credential_for_unknown_user_is_not_admitted() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKanbanRepository::try_new(&conn).unwrap();
    let gate = AuthGate::new(StaticTokenVerifier::new().with_user_token("tok", Uuid::new_v4()));

    let credential = gate.verify_credential(&headers("Bearer tok")).unwrap();
    assert!(matches!(
        gate.admit(credential, &repo),
        Err(AuthError::UnknownUser(_))
    ));
}

#[test]
fn conflicting_authorization_headers_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKanbanRepository::try_new(&conn).unwrap();
    let user = repo.create_user("ada").unwrap();
    let gate = AuthGate::new(StaticTokenVerifier::new().with_user_token("tok", user.id));

    let both = Headers::from([
        ("Authorization".to_string(), "Bearer tok".to_string()),
        ("authorization".to_string(), "Bearer other".to_string()),
    ]);
    let err = gate.authenticate(&both, &repo).unwrap_err();
    assert!(matches!(err, AuthError::MalformedCredential));
}
