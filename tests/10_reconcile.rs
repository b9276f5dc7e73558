mod common;

use anyhow::Result;
use authbridge::config::{HttpConfig, StoreConfig};
use authbridge::identity::Actor;
use authbridge::store::StoreClient;
use authbridge::users;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{no_rows_response, user_row};

// These tests exercise the reconciliation flow directly against a mocked
// store endpoint; mount expectations double as call-count assertions.

fn store_client(server: &MockServer) -> StoreClient {
    let config = StoreConfig {
        url: server.uri(),
        anon_key: "anon-key".to_string(),
    };
    let http = HttpConfig {
        request_timeout_secs: 5,
        connect_timeout_secs: 2,
    };
    StoreClient::new(&config, &http).expect("store client")
}

fn actor(
    full_name: Option<&str>,
    first_name: Option<&str>,
    last_name: Option<&str>,
    email: Option<&str>,
) -> Actor {
    Actor {
        id: "u_123".to_string(),
        full_name: full_name.map(String::from),
        first_name: first_name.map(String::from),
        last_name: last_name.map(String::from),
        primary_email: email.map(String::from),
    }
}

#[tokio::test]
async fn first_visit_creates_row_with_derived_name() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("clerk_id", "eq.u_123"))
        .respond_with(no_rows_response())
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .and(header("Prefer", "return=representation"))
        .and(body_json(json!({ "clerk_id": "u_123", "name": "Ada Lovelace" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(user_row("u_123", "Ada Lovelace")))
        .expect(1)
        .mount(&server)
        .await;

    let client = store_client(&server);
    let reconciled =
        users::fetch_or_create(&client, &actor(Some("Ada Lovelace"), None, None, None)).await?;

    assert!(reconciled.created);
    assert_eq!(reconciled.user.clerk_id, "u_123");
    assert_eq!(reconciled.user.name, "Ada Lovelace");

    Ok(())
}

#[tokio::test]
async fn existing_row_is_returned_without_insert() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("clerk_id", "eq.u_123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_row("u_123", "Ada Lovelace")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let client = store_client(&server);
    let reconciled =
        users::fetch_or_create(&client, &actor(Some("Ada Lovelace"), None, None, None)).await?;

    assert!(!reconciled.created);
    assert_eq!(reconciled.user.name, "Ada Lovelace");

    Ok(())
}

#[tokio::test]
async fn email_local_part_names_the_new_row() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("clerk_id", "eq.u_123"))
        .respond_with(no_rows_response())
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .and(body_json(json!({ "clerk_id": "u_123", "name": "bob" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(user_row("u_123", "bob")))
        .expect(1)
        .mount(&server)
        .await;

    let client = store_client(&server);
    let reconciled =
        users::fetch_or_create(&client, &actor(None, None, None, Some("bob@example.com"))).await?;

    assert!(reconciled.created);
    assert_eq!(reconciled.user.name, "bob");

    Ok(())
}

#[tokio::test]
async fn transient_lookup_error_halts_flow_without_insert() -> Result<()> {
    let server = MockServer::start().await;

    // A real failure, not the no-rows signal
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "message": "connection timeout" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let client = store_client(&server);
    let err = users::fetch_or_create(&client, &actor(None, None, None, None))
        .await
        .unwrap_err();

    assert!(!err.is_not_found(), "error must not read as the no-rows signal");
    assert!(err.to_string().contains("connection timeout"));

    Ok(())
}

#[tokio::test]
async fn racing_insert_settles_on_winner_row() -> Result<()> {
    let server = MockServer::start().await;

    // First lookup sees no row; the re-read after the conflict sees the
    // winner's row.
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("clerk_id", "eq.u_123"))
        .respond_with(no_rows_response())
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"users_clerk_id_key\"",
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("clerk_id", "eq.u_123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_row("u_123", "First Writer")))
        .expect(1)
        .mount(&server)
        .await;

    let client = store_client(&server);
    let reconciled = users::fetch_or_create(&client, &actor(None, None, None, None)).await?;

    assert!(!reconciled.created, "the racing loser must not claim creation");
    assert_eq!(reconciled.user.name, "First Writer");

    Ok(())
}

#[tokio::test]
async fn update_patches_only_the_name_field() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .and(query_param("clerk_id", "eq.u_123"))
        .and(body_json(json!({ "name": "Alice" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_row("u_123", "Alice")))
        .expect(1)
        .mount(&server)
        .await;

    let client = store_client(&server);
    let updated = users::update_name(&client, "u_123", "  Alice  ").await?;

    let user = updated.expect("row should come back");
    assert_eq!(user.name, "Alice");
    assert_eq!(user.clerk_id, "u_123");

    Ok(())
}

#[tokio::test]
async fn empty_name_update_makes_no_store_call() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = store_client(&server);
    assert!(users::update_name(&client, "u_123", "   ").await?.is_none());
    assert!(users::update_name(&client, "u_123", "").await?.is_none());

    Ok(())
}
