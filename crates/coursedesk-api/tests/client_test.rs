#![allow(clippy::unwrap_used)]
// Integration tests for `AdminClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use coursedesk_api::{
    AdminClient, Body, Error, FilterRule, FormPart, ListQuery, Method, Mutation, Payload,
    Relation, Session, SortRule,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, AdminClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let session = Session::with_token("t0k".to_string().into());
    let client = AdminClient::with_client(reqwest::Client::new(), base_url, session);
    (server, client)
}

async fn setup_anonymous() -> (MockServer, AdminClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = AdminClient::with_client(reqwest::Client::new(), base_url, Session::ephemeral());
    (server, client)
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap().len()
}

// ── Fetch tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_paginated_list() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .and(query_param("page", "2"))
        .and(query_param("pageSize", "10"))
        .and(header("authorization", "Bearer t0k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{ "id": 11, "name": "Anna" }],
            "current_page": 2,
            "last_page": 3,
            "page_size": 10,
            "total_count": 21
        })))
        .expect(1)
        .mount(&server)
        .await;

    let out = client
        .fetch("/admin/users", Some(&ListQuery::paged(2, 10)))
        .await
        .unwrap();

    let pagination = out.pagination.unwrap();
    assert_eq!(pagination.current_page, 2);
    assert_eq!(pagination.last_page, 3);
    assert_eq!(pagination.total_count, 21);
    assert_eq!(out.data.unwrap().rows()[0]["name"], "Anna");
}

#[tokio::test]
async fn test_fetch_sends_sort_and_filter_params() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/admin/subjects"))
        .and(query_param("sort", "name,-created_at"))
        .and(query_param("filter[name][contains]", "math"))
        .and(query_param("filter[created_by_name][equals]", "Ada"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let query = ListQuery {
        page: None,
        filters: vec![
            FilterRule::contains("name", "math"),
            FilterRule::new("created_by_name", Relation::Equals, "Ada"),
        ],
        sorters: vec![SortRule::asc("name"), SortRule::desc("created_at")],
    };

    let out = client.fetch("/admin/subjects", Some(&query)).await.unwrap();
    assert_eq!(out.data, Some(Payload::Many(vec![])));
}

#[tokio::test]
async fn test_fetch_single_entity() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/admin/tasks/5"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "task": { "id": 5, "title": "Essay" } })),
        )
        .mount(&server)
        .await;

    let out = client.fetch("/admin/tasks/5", None).await.unwrap();
    assert_eq!(
        out.data,
        Some(Payload::Single(json!({ "id": 5, "title": "Essay" })))
    );
    assert!(out.pagination.is_none());
}

#[tokio::test]
async fn test_fetch_without_token_sends_nothing() {
    let (server, client) = setup_anonymous().await;

    let result = client.fetch("/admin/users", None).await;

    assert!(
        matches!(result, Err(Error::Unauthenticated)),
        "expected Unauthenticated, got: {result:?}"
    );
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_fetch_empty_endpoint_is_invalid() {
    let (_server, client) = setup().await;
    let result = client.fetch("", None).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_fetch_error_without_message_uses_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.fetch("/admin/users", None).await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP error 500");
    assert_eq!(err.status(), Some(500));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_fetch_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let result = client.fetch("/admin/users", None).await;
    assert!(matches!(result, Err(Error::Deserialization { .. })));
}

// ── Mutate tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_mutate_without_token_sends_nothing() {
    let (server, client) = setup_anonymous().await;

    let result = client.mutate(&Mutation::delete("subjects", 42)).await;

    assert!(
        matches!(result, Err(Error::Unauthenticated)),
        "expected Unauthenticated, got: {result:?}"
    );
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_mutate_validation_message_is_verbatim() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/admin/subjects"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "message": "Validation failed" })),
        )
        .mount(&server)
        .await;

    let err = client
        .mutate(&Mutation::create("subjects", json!({ "name": "" })))
        .await
        .unwrap_err();

    match err {
        Error::Http { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "Validation failed");
        }
        other => panic!("expected Http error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_mutate_json_body() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/admin/users/7/role"))
        .and(header("content-type", "application/json"))
        .and(header("authorization", "Bearer t0k"))
        .and(body_json(json!({ "role": "admin" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let out = client.mutate(&Mutation::user_role(7, "admin")).await.unwrap();
    assert_eq!(out, json!({ "ok": true }));
}

#[tokio::test]
async fn test_mutate_empty_body_is_null() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/admin/tasks/3"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let out = client.mutate(&Mutation::delete("tasks", 3)).await.unwrap();
    assert_eq!(out, serde_json::Value::Null);
}

#[tokio::test]
async fn test_mutate_form_body_is_multipart() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/admin/users/7/avatar"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 7 })))
        .expect(1)
        .mount(&server)
        .await;

    let mutation = Mutation::new(
        "/admin/users/7/avatar",
        Method::Post,
        Body::Form(vec![
            FormPart::text("caption", "me"),
            FormPart::file("avatar", "me.png", vec![0x89, b'P', b'N', b'G']),
        ]),
    );

    let out = client.mutate(&mutation).await.unwrap();
    assert_eq!(out["id"], 7);
}

#[tokio::test]
async fn test_logout_mid_session_blocks_next_request() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    client.fetch("/admin/users", None).await.unwrap();
    client.session().logout().unwrap();

    let result = client.fetch("/admin/users", None).await;
    assert!(matches!(result, Err(Error::Unauthenticated)));
    assert_eq!(request_count(&server).await, 1);
}
