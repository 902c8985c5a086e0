#![allow(clippy::unwrap_used)]
// Modal flows end to end: coordinator, mutator, forms and listings.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use coursedesk_core::{
    ActionCoordinator, ActionDispatch, AdminClient, CoreError, EditForm, EntityKind, EntityRef,
    FilterDiscipline, Listing, ModalKind, ModalState, Mutator, RefreshFn, Session, Settled,
    encode,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, AdminClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let session = Session::with_token("t0k".to_string().into());
    let client = AdminClient::with_client(reqwest::Client::new(), base_url, session);
    (server, client)
}

fn counter() -> (Arc<AtomicUsize>, RefreshFn) {
    let count = Arc::new(AtomicUsize::new(0));
    let hits = Arc::clone(&count);
    let refetch: RefreshFn = Arc::new(move || {
        hits.fetch_add(1, Ordering::SeqCst);
    });
    (count, refetch)
}

// ── Delete ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_confirmed_delete_closes_and_refetches_once() {
    let (server, client) = setup().await;
    Mock::given(method("DELETE"))
        .and(path("/admin/subjects/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "deleted" })))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = ActionCoordinator::new(Mutator::new(client));
    let (count, refetch) = counter();
    let _registration = coordinator.register_refetch(refetch);

    coordinator
        .open_modal(ModalKind::Delete, EntityKind::Subjects, encode(42).as_str())
        .unwrap();
    let settled = coordinator.confirm_delete().await.unwrap();

    assert_eq!(settled, Settled::Refetched);
    assert_eq!(coordinator.state(), ModalState::Closed);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_delete_keeps_modal_open() {
    let (server, client) = setup().await;
    Mock::given(method("DELETE"))
        .and(path("/admin/subjects/42"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "message": "Subject has tasks" })),
        )
        .mount(&server)
        .await;

    let coordinator = ActionCoordinator::new(Mutator::new(client));
    let (count, refetch) = counter();
    let _registration = coordinator.register_refetch(refetch);

    let opened = coordinator
        .open_modal(ModalKind::Delete, EntityKind::Subjects, encode(42).as_str())
        .unwrap();
    let err = coordinator.confirm_delete().await.unwrap_err();

    assert_eq!(err.to_string(), "Subject has tasks");
    assert_eq!(coordinator.state(), opened);
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_delete_without_listing_falls_back_to_reload() {
    let (server, client) = setup().await;
    Mock::given(method("DELETE"))
        .and(path("/admin/tasks/3"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let coordinator = ActionCoordinator::new(Mutator::new(client));
    let (reloads, reload) = counter();
    coordinator.set_reload_hook(reload);

    {
        let (_, refetch) = counter();
        let _gone = coordinator.register_refetch(refetch);
    }

    coordinator
        .open_modal(ModalKind::Delete, EntityKind::Tasks, encode(3).as_str())
        .unwrap();
    assert_eq!(coordinator.confirm_delete().await.unwrap(), Settled::Reloaded);
    assert_eq!(reloads.load(Ordering::SeqCst), 1);
}

// ── Edit ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_user_edit_puts_role_then_status() {
    let (server, client) = setup().await;
    Mock::given(method("PUT"))
        .and(path("/admin/users/7/role"))
        .and(body_json(json!({ "role": "admin" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/admin/users/7/status"))
        .and(body_json(json!({ "status": "approved" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = ActionCoordinator::new(Mutator::new(client));
    let (count, refetch) = counter();
    let _registration = coordinator.register_refetch(refetch);
    coordinator
        .open_modal(ModalKind::Edit, EntityKind::Users, encode(7).as_str())
        .unwrap();

    let mut form = EditForm::blank(EntityKind::Users);
    form.set_field("role", "admin").unwrap();
    form.set_field("status", "approved").unwrap();

    assert_eq!(coordinator.submit_edit(&form).await.unwrap(), Settled::Refetched);
    assert_eq!(coordinator.state(), ModalState::Closed);
    assert_eq!(count.load(Ordering::SeqCst), 1);

    let paths: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_owned())
        .collect();
    assert_eq!(paths, ["/admin/users/7/role", "/admin/users/7/status"]);
}

#[tokio::test]
async fn test_invalid_form_sends_nothing() {
    let (server, client) = setup().await;
    let coordinator = ActionCoordinator::new(Mutator::new(client));
    coordinator.open_create(EntityKind::Subjects).unwrap();

    let err = coordinator
        .submit_edit(&EditForm::blank(EntityKind::Subjects))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::ValidationFailed { .. }));
    assert_eq!(coordinator.state(), ModalState::Creating(EntityKind::Subjects));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_form_for_another_kind_is_rejected() {
    let (_server, client) = setup().await;
    let coordinator = ActionCoordinator::new(Mutator::new(client));
    coordinator
        .open_modal(ModalKind::Edit, EntityKind::Tasks, encode(1).as_str())
        .unwrap();

    let err = coordinator
        .submit_edit(&EditForm::blank(EntityKind::Subjects))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidState(_)));
}

// ── Listing round trip ──────────────────────────────────────────────

#[tokio::test]
async fn test_listing_refetches_after_modal_delete() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/admin/subjects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{ "id": 42, "name": "Physics", "description": "Forces" }],
            "current_page": 1,
            "last_page": 1,
            "page_size": 10,
            "total_count": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/admin/subjects/42"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = ActionCoordinator::new(Mutator::new(client.clone()));
    let mut listing = Listing::new(
        EntityKind::Subjects,
        client,
        FilterDiscipline::Server,
        10,
        None,
    );
    listing.mount(&coordinator);
    listing.load().await;

    let view = listing.view();
    let ActionDispatch::OpenModal { kind, entity } = view.activate(0, "delete").unwrap() else {
        panic!("delete should open a modal");
    };
    assert_eq!(entity, EntityRef::new(EntityKind::Subjects, encode(42)));
    coordinator
        .open_modal(kind, entity.kind, entity.token.as_str())
        .unwrap();
    coordinator.confirm_delete().await.unwrap();

    let mut gets = 0;
    for _ in 0..40 {
        gets = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.method.as_str() == "GET")
            .count();
        if gets >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    assert_eq!(gets, 2);

    listing.unmount();
    assert!(!coordinator.has_registration());
}
