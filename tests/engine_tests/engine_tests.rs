//! Tests for Engine
//!
//! These tests verify:
//! - Every action's response payload
//! - Parameter checks and their error messages
//! - The `replicated` flag
//! - The end-to-end client scenario against a single node

use memdocdb::engine::Engine;
use memdocdb::protocol::{Action, Request, Response};
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn engine_with_users() -> Engine {
    let mut engine = Engine::standalone();
    ok(&mut engine, Request::new(Action::Create).with_document("users"));
    ok(
        &mut engine,
        Request::new(Action::Insert).with_document("users").with_data(json!([
            {"name": "John", "role": "Dev", "gender": "Male"},
            {"name": "Anna", "role": "QA", "gender": "Female"}
        ])),
    );
    engine
}

/// Execute and assert success
fn ok(engine: &mut Engine, request: Request) -> Response {
    let response = engine.execute(&request);
    assert!(
        response.is_success(),
        "{} failed: {:?}",
        request.action,
        response.message()
    );
    response
}

/// Execute and return the error message
fn err(engine: &mut Engine, request: Request) -> String {
    let response = engine.execute(&request);
    assert!(!response.is_success(), "{} unexpectedly succeeded", request.action);
    response.message().unwrap_or_default().to_string()
}

fn field<'a>(response: &'a Response, key: &str) -> &'a Value {
    response
        .get(key)
        .unwrap_or_else(|| panic!("Missing field {}", key))
}

// =============================================================================
// Document Lifecycle Tests
// =============================================================================

#[test]
fn test_list_starts_empty() {
    let mut engine = Engine::standalone();
    let response = ok(&mut engine, Request::new(Action::List));
    assert_eq!(field(&response, "documents"), &json!([]));
}

#[test]
fn test_create_list_drop() {
    let mut engine = Engine::standalone();
    ok(&mut engine, Request::new(Action::Create).with_document("a"));
    ok(&mut engine, Request::new(Action::Create).with_document("b"));

    let response = ok(&mut engine, Request::new(Action::List));
    assert_eq!(field(&response, "documents"), &json!(["a", "b"]));

    ok(&mut engine, Request::new(Action::Drop).with_document("a"));
    let response = ok(&mut engine, Request::new(Action::List));
    assert_eq!(field(&response, "documents"), &json!(["b"]));
}

#[test]
fn test_create_twice() {
    let mut engine = Engine::standalone();
    ok(&mut engine, Request::new(Action::Create).with_document("a"));
    assert_eq!(
        err(&mut engine, Request::new(Action::Create).with_document("a")),
        "Document provided already exist."
    );
}

#[test]
fn test_missing_document_errors() {
    let mut engine = Engine::standalone();
    for action in [Action::Get, Action::GetKeys, Action::Count, Action::Drop, Action::Empty] {
        assert_eq!(
            err(&mut engine, Request::new(action).with_document("ghost")),
            "Document provided does not exist.",
            "action {}",
            action
        );
    }
}

#[test]
fn test_missing_document_parameter() {
    let mut engine = Engine::standalone();
    for action in [
        Action::Get,
        Action::GetKeys,
        Action::Count,
        Action::Create,
        Action::Drop,
        Action::Empty,
        Action::Insert,
        Action::Update,
        Action::Delete,
    ] {
        assert_eq!(err(&mut engine, Request::new(action)), "No document provided.");
    }
}

#[test]
fn test_getall_snapshot() {
    let mut engine = engine_with_users();
    ok(&mut engine, Request::new(Action::Create).with_document("empty"));

    let response = ok(&mut engine, Request::new(Action::GetAll));
    let documents = field(&response, "documents");

    assert_eq!(documents["users"][1]["name"], "Anna");
    assert_eq!(documents["empty"], json!([]));
}

// =============================================================================
// Read Tests
// =============================================================================

#[test]
fn test_get_whole_document() {
    let mut engine = engine_with_users();
    let response = ok(&mut engine, Request::new(Action::Get).with_document("users"));
    assert_eq!(field(&response, "data").as_array().unwrap().len(), 2);
}

#[test]
fn test_get_by_id_keeps_key() {
    let mut engine = engine_with_users();

    let response = ok(&mut engine, Request::new(Action::Get).with_document("users").with_id(0));
    assert_eq!(field(&response, "data")[0]["name"], "John");

    let response = ok(&mut engine, Request::new(Action::Get).with_document("users").with_id(1));
    assert_eq!(field(&response, "data"), &json!({"1": {"name": "Anna", "role": "QA", "gender": "Female"}}));
}

#[test]
fn test_get_nothing_found_has_no_data() {
    let mut engine = engine_with_users();

    let response = ok(&mut engine, Request::new(Action::Get).with_document("users").with_id(5));
    assert!(response.get("data").is_none());

    let response = ok(
        &mut engine,
        Request::new(Action::Get)
            .with_document("users")
            .with_query(json!({"gender": "Other"})),
    );
    assert!(response.get("data").is_none());
}

#[test]
fn test_get_empty_document_returns_empty_data() {
    let mut engine = Engine::standalone();
    ok(&mut engine, Request::new(Action::Create).with_document("d"));

    let response = ok(&mut engine, Request::new(Action::Get).with_document("d"));
    assert_eq!(field(&response, "data"), &json!([]));
}

#[test]
fn test_get_query_must_be_object() {
    let mut engine = engine_with_users();
    assert_eq!(
        err(
            &mut engine,
            Request::new(Action::Get).with_document("users").with_query(json!("gender"))
        ),
        "Query must be provided as an object."
    );
}

#[test]
fn test_getkeys() {
    let mut engine = engine_with_users();
    let response = ok(&mut engine, Request::new(Action::GetKeys).with_document("users"));

    assert_eq!(field(&response, "document_keys"), &json!(["name", "role", "gender"]));
    assert_eq!(field(&response, "document_first_key"), &json!(0));
}

#[test]
fn test_getkeys_empty_document() {
    let mut engine = Engine::standalone();
    ok(&mut engine, Request::new(Action::Create).with_document("d"));

    let response = ok(&mut engine, Request::new(Action::GetKeys).with_document("d"));
    assert_eq!(field(&response, "document_keys"), &json!([]));
    assert_eq!(field(&response, "document_first_key"), &Value::Null);
}

#[test]
fn test_count_with_query() {
    let mut engine = engine_with_users();

    let response = ok(&mut engine, Request::new(Action::Count).with_document("users"));
    assert_eq!(field(&response, "count"), &json!(2));

    let response = ok(
        &mut engine,
        Request::new(Action::Count)
            .with_document("users")
            .with_query(json!({"gender": "Female"})),
    );
    assert_eq!(field(&response, "count"), &json!(1));
}

// =============================================================================
// Write Tests
// =============================================================================

#[test]
fn test_insert_echoes_records() {
    let mut engine = Engine::standalone();
    ok(&mut engine, Request::new(Action::Create).with_document("d"));

    let response = ok(
        &mut engine,
        Request::new(Action::Insert)
            .with_document("d")
            .with_data(json!([{"a": 1}])),
    );
    assert_eq!(field(&response, "data_interted"), &json!([{"a": 1}]));

    let response = ok(
        &mut engine,
        Request::new(Action::Insert)
            .with_document("d")
            .with_data(json!({"9": {"a": 2}}))
            .with_auto_increment(false),
    );
    assert_eq!(field(&response, "data_interted"), &json!({"9": {"a": 2}}));
}

#[test]
fn test_insert_parameter_errors() {
    let mut engine = engine_with_users();

    assert_eq!(
        err(&mut engine, Request::new(Action::Insert).with_document("users")),
        "No data provided."
    );
    assert_eq!(
        err(
            &mut engine,
            Request::new(Action::Insert).with_document("users").with_data(json!("x"))
        ),
        "Data must be provided in array."
    );
    assert_eq!(
        err(
            &mut engine,
            Request::new(Action::Insert)
                .with_document("users")
                .with_data(json!([{"name": "Zed"}]))
        ),
        "The required keys for this document are: name, role, gender, received: name."
    );
}

#[test]
fn test_insert_after_max_key_is_an_error_response() {
    let mut engine = Engine::standalone();
    ok(&mut engine, Request::new(Action::Create).with_document("d"));
    ok(
        &mut engine,
        Request::new(Action::Insert)
            .with_document("d")
            .with_data(json!({"9223372036854775807": {"a": 1}}))
            .with_auto_increment(false),
    );

    assert_eq!(
        err(
            &mut engine,
            Request::new(Action::Insert).with_document("d").with_data(json!([{"a": 2}]))
        ),
        "No auto-increment key left in document."
    );
    let response = ok(&mut engine, Request::new(Action::Count).with_document("d"));
    assert_eq!(field(&response, "count"), &json!(1));
}

#[test]
fn test_update_patch_reports_changes() {
    let mut engine = engine_with_users();

    let response = ok(
        &mut engine,
        Request::new(Action::Update)
            .with_document("users")
            .with_id(1)
            .with_data(json!({"name": "Anna", "role": "Lead", "gender": "Female"})),
    );
    assert_eq!(field(&response, "document_keys"), &json!(["name", "role", "gender"]));
    assert_eq!(field(&response, "updated_data"), &json!({"1": {"role": "Lead"}}));

    let response = ok(&mut engine, Request::new(Action::Get).with_document("users").with_id(1));
    assert_eq!(field(&response, "data")["1"]["role"], "Lead");
}

#[test]
fn test_update_missing_key() {
    let mut engine = engine_with_users();
    assert_eq!(
        err(
            &mut engine,
            Request::new(Action::Update)
                .with_document("users")
                .with_id(7)
                .with_data(json!({"name": "x", "role": "y", "gender": "z"}))
        ),
        "Key:id provided does not exist in document."
    );
}

#[test]
fn test_delete_requires_id() {
    let mut engine = engine_with_users();
    assert_eq!(
        err(&mut engine, Request::new(Action::Delete).with_document("users")),
        "No id provided or not numeric value."
    );
}

#[test]
fn test_delete_rekeys() {
    let mut engine = engine_with_users();
    ok(&mut engine, Request::new(Action::Delete).with_document("users").with_id(0));

    let response = ok(&mut engine, Request::new(Action::Get).with_document("users").with_id(0));
    assert_eq!(field(&response, "data")[0]["name"], "Anna");
}

// =============================================================================
// Replication Flag Tests
// =============================================================================

#[test]
fn test_standalone_mutations_not_replicated() {
    let mut engine = Engine::standalone();
    let response = ok(&mut engine, Request::new(Action::Create).with_document("d"));
    assert_eq!(field(&response, "replicated"), &json!(false));
}

#[test]
fn test_reads_carry_no_replicated_flag() {
    let mut engine = engine_with_users();
    for request in [
        Request::new(Action::List),
        Request::new(Action::Get).with_document("users"),
        Request::new(Action::Count).with_document("users"),
        Request::new(Action::GetKeys).with_document("users"),
    ] {
        assert!(ok(&mut engine, request).get("replicated").is_none());
    }
}

#[test]
fn test_getall_reflects_replicate_flag() {
    let mut engine = Engine::standalone();

    let response = ok(&mut engine, Request::new(Action::GetAll));
    assert_eq!(field(&response, "replicated"), &json!(true));

    let response = ok(&mut engine, Request::new(Action::GetAll).with_replicate(false));
    assert_eq!(field(&response, "replicated"), &json!(false));
}

#[test]
fn test_failed_mutation_has_no_replicated_flag() {
    let mut engine = Engine::standalone();
    let response = engine.execute(&Request::new(Action::Drop).with_document("nope"));
    assert!(!response.is_success());
    assert!(response.get("replicated").is_none());
}

// =============================================================================
// Scenario Test
// =============================================================================

#[test]
fn test_client_scenario() {
    let mut engine = Engine::standalone();
    let doc = "users_test";

    ok(&mut engine, Request::new(Action::List));
    // Nothing to drop yet
    err(&mut engine, Request::new(Action::Drop).with_document(doc));
    ok(&mut engine, Request::new(Action::Create).with_document(doc));
    ok(
        &mut engine,
        Request::new(Action::Insert).with_document(doc).with_data(json!([
            {"name": "John", "role": "Dev", "gender": "Male"},
            {"name": "Anna", "role": "QA", "gender": "Female"}
        ])),
    );

    let response = ok(&mut engine, Request::new(Action::Get).with_document(doc));
    assert_eq!(field(&response, "data").as_array().unwrap().len(), 2);

    let response = ok(&mut engine, Request::new(Action::Get).with_document(doc).with_id(0));
    assert_eq!(field(&response, "data")[0]["name"], "John");

    let response = ok(&mut engine, Request::new(Action::GetKeys).with_document(doc));
    assert_eq!(field(&response, "document_keys"), &json!(["name", "role", "gender"]));

    let response = ok(
        &mut engine,
        Request::new(Action::Get)
            .with_document(doc)
            .with_query(json!({"gender": "Male"})),
    );
    assert_eq!(field(&response, "data").as_array().unwrap().len(), 1);

    let response = ok(&mut engine, Request::new(Action::Count).with_document(doc));
    assert_eq!(field(&response, "count"), &json!(2));

    ok(
        &mut engine,
        Request::new(Action::Update).with_document(doc).with_id(0).with_data(json!([
            {"name": "John", "role": "Lead", "gender": "Male"},
            {"name": "Andrew", "role": "Dev", "gender": "Male"}
        ])),
    );
    ok(&mut engine, Request::new(Action::Delete).with_document(doc).with_id(0));

    let response = ok(&mut engine, Request::new(Action::Count).with_document(doc));
    assert_eq!(field(&response, "count"), &json!(1));

    let response = ok(&mut engine, Request::new(Action::Get).with_document(doc).with_id(0));
    assert_eq!(field(&response, "data")[0]["name"], "Andrew");

    ok(&mut engine, Request::new(Action::Empty).with_document(doc));
    ok(&mut engine, Request::new(Action::Drop).with_document(doc));

    let response = ok(&mut engine, Request::new(Action::GetAll));
    assert_eq!(field(&response, "documents"), &json!({}));
    assert!(!engine.database().contains(doc));
}
