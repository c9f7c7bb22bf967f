// Copyright (c) 2026 Trellis Platform
// SPDX-License-Identifier: AGPL-3.0
//! Wire-protocol tests for the remote entity gateway, driven against a
//! local mock HTTP server.

use std::time::{Duration, Instant};

use mockito::Matcher;
use serde_json::json;
use trellis_gateway_core::config::GatewayConfig;
use trellis_gateway_core::domain::repository::{EntityRepository, RepositoryError};
use trellis_gateway_core::infrastructure::remote_gateway::RemoteEntityGateway;

fn gateway_for(server: &mockito::Server, budget_ms: u64, interval_ms: u64) -> RemoteEntityGateway {
    let mut config = GatewayConfig::new(server.url());
    config.poll.budget = Duration::from_millis(budget_ms);
    config.poll.interval = Duration::from_millis(interval_ms);
    RemoteEntityGateway::new(&config)
}

async fn mock_submit(server: &mut mockito::Server) -> mockito::Mock {
    server
        .mock("POST", "/search/snapshot/order/1000")
        .with_status(200)
        .with_body(r#""snap-1""#)
        .create_async()
        .await
}

async fn mock_status(server: &mut mockito::Server, status: &str) -> mockito::Mock {
    server
        .mock("GET", "/search/snapshot/snap-1/status")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"snapshotStatus": "{status}"}}"#))
        .create_async()
        .await
}

fn page_matcher() -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("pageSize".into(), "100".into()),
        Matcher::UrlEncoded("pageNumber".into(), "1".into()),
    ])
}

#[tokio::test]
async fn criteria_search_unwraps_result_nodes() {
    let mut server = mockito::Server::new_async().await;
    mock_submit(&mut server).await;
    mock_status(&mut server, "SUCCESSFUL").await;
    server
        .mock("GET", "/search/snapshot/snap-1")
        .match_query(page_matcher())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "_embedded": {"objectNodes": [{"id": "abc", "tree": {"name": "x"}}]},
                "page": {"number": 0, "size": 100, "totalElements": 1, "totalPages": 1}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let gateway = gateway_for(&server, 5_000, 20);
    let meta = gateway.meta("tok", "order", "1000").await;
    let hits = gateway
        .find_all_by_criteria(&meta, &json!({"key": "status", "value": "active"}))
        .await
        .unwrap();

    assert_eq!(hits, vec![json!({"name": "x", "technicalId": "abc"})]);
}

#[tokio::test]
async fn zero_total_elements_yields_empty_not_error() {
    let mut server = mockito::Server::new_async().await;
    mock_submit(&mut server).await;
    mock_status(&mut server, "SUCCESSFUL").await;
    server
        .mock("GET", "/search/snapshot/snap-1")
        .match_query(page_matcher())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"page": {"number": 0, "size": 100, "totalElements": 0, "totalPages": 0}})
                .to_string(),
        )
        .create_async()
        .await;

    let gateway = gateway_for(&server, 5_000, 20);
    let meta = gateway.meta("tok", "order", "1000").await;
    let hits = gateway
        .find_all_by_criteria(&meta, &json!({"key": "status", "value": "active"}))
        .await
        .unwrap();

    assert!(hits.is_empty());
}

#[tokio::test]
async fn running_past_budget_times_out_without_fetching() {
    let mut server = mockito::Server::new_async().await;
    mock_submit(&mut server).await;
    mock_status(&mut server, "RUNNING").await;
    let fetch = server
        .mock("GET", "/search/snapshot/snap-1")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let gateway = gateway_for(&server, 80, 20);
    let meta = gateway.meta("tok", "order", "1000").await;
    let err = gateway
        .find_all_by_criteria(&meta, &json!({"key": "status", "value": "active"}))
        .await
        .unwrap_err();

    assert!(matches!(err, RepositoryError::SearchTimeout { .. }));
    fetch.assert_async().await;
}

#[tokio::test]
async fn terminal_failure_fails_fast_before_the_budget() {
    let mut server = mockito::Server::new_async().await;
    mock_submit(&mut server).await;
    mock_status(&mut server, "FAILED").await;

    // Budget is far larger than what a fail-fast abort should need.
    let gateway = gateway_for(&server, 30_000, 20);
    let meta = gateway.meta("tok", "order", "1000").await;

    let started = Instant::now();
    let err = gateway
        .find_all_by_criteria(&meta, &json!({"key": "status", "value": "active"}))
        .await
        .unwrap_err();

    match err {
        RepositoryError::SearchFailed { status } => assert_eq!(status, "FAILED"),
        other => panic!("expected SearchFailed, got {other:?}"),
    }
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn cancellation_token_aborts_an_in_flight_poll() {
    let mut server = mockito::Server::new_async().await;
    mock_submit(&mut server).await;
    mock_status(&mut server, "RUNNING").await;

    let gateway = gateway_for(&server, 30_000, 50);
    let cancel = gateway.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(60)).await;
        cancel.cancel();
    });

    let meta = gateway.meta("tok", "order", "1000").await;
    let started = Instant::now();
    let err = gateway
        .find_all_by_criteria(&meta, &json!({"key": "status", "value": "active"}))
        .await
        .unwrap_err();

    assert!(matches!(err, RepositoryError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn empty_snapshot_id_is_fatal_without_retry() {
    let mut server = mockito::Server::new_async().await;
    let submit = server
        .mock("POST", "/search/snapshot/order/1000")
        .with_status(200)
        .with_body(r#""""#)
        .expect(1)
        .create_async()
        .await;

    let gateway = gateway_for(&server, 5_000, 20);
    let meta = gateway.meta("tok", "order", "1000").await;
    let err = gateway
        .find_all_by_criteria(&meta, &json!({"key": "status", "value": "active"}))
        .await
        .unwrap_err();

    assert!(matches!(err, RepositoryError::Protocol(_)));
    submit.assert_async().await;
}

#[tokio::test]
async fn save_extracts_the_generated_id() {
    let mut server = mockito::Server::new_async().await;
    let create = server
        .mock("POST", "/entity/JSON/order/1000")
        .match_header("authorization", "Bearer tok")
        .match_body(Matcher::Json(json!([{"name": "x"}])))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"entityIds": ["abc"]}]"#)
        .create_async()
        .await;

    let gateway = gateway_for(&server, 5_000, 20);
    let meta = gateway.meta("tok", "order", "1000").await;
    let id = gateway.save(&meta, &json!({"name": "x"})).await.unwrap();

    assert_eq!(id, "abc");
    create.assert_async().await;
}

#[tokio::test]
async fn save_failure_propagates_the_remote_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/entity/JSON/order/1000")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let gateway = gateway_for(&server, 5_000, 20);
    let meta = gateway.meta("tok", "order", "1000").await;
    let err = gateway.save(&meta, &json!({"name": "x"})).await.unwrap_err();

    match err {
        RepositoryError::Remote { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected Remote, got {other:?}"),
    }
}

#[tokio::test]
async fn save_all_returns_the_first_id_of_the_batch() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/entity/JSON/order/1000")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"entityIds": ["first", "second"]}]"#)
        .create_async()
        .await;

    let gateway = gateway_for(&server, 5_000, 20);
    let meta = gateway.meta("tok", "order", "1000").await;
    let id = gateway
        .save_all(&meta, &[json!({"n": 1}), json!({"n": 2})])
        .await
        .unwrap();

    assert_eq!(id, "first");
}

#[tokio::test]
async fn payload_update_uses_the_id_transition_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let payload_update = server
        .mock("PUT", "/entity/JSON/abc/update")
        .match_body(Matcher::Json(json!({"name": "y"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"entityIds": ["abc"]}"#)
        .expect(1)
        .create_async()
        .await;
    let bare_transition = server
        .mock("PUT", "/platform-api/entity/transition")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let gateway = gateway_for(&server, 5_000, 20);
    let meta = gateway.meta("tok", "order", "1000").await;
    let result = gateway
        .update(&meta, "abc", Some(&json!({"name": "y"})))
        .await
        .unwrap();

    assert_eq!(result, json!("abc"));
    payload_update.assert_async().await;
    bare_transition.assert_async().await;
}

#[tokio::test]
async fn bare_transition_uses_the_launch_endpoint_only() {
    let mut server = mockito::Server::new_async().await;
    let bare_transition = server
        .mock("PUT", "/platform-api/entity/transition")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("entityId".into(), "abc".into()),
            Matcher::UrlEncoded("transitionName".into(), "approve".into()),
        ]))
        .with_status(200)
        .with_body("")
        .expect(1)
        .create_async()
        .await;
    let payload_update = server
        .mock("PUT", "/entity/JSON/abc/approve")
        .expect(0)
        .create_async()
        .await;

    let gateway = gateway_for(&server, 5_000, 20);
    let mut meta = gateway.meta("tok", "order", "1000").await;
    meta.update_transition = Some("approve".into());
    let result = gateway.update(&meta, "abc", None).await.unwrap();

    assert_eq!(result, serde_json::Value::Null);
    bare_transition.assert_async().await;
    payload_update.assert_async().await;
}

#[tokio::test]
async fn update_without_transition_or_payload_is_rejected_locally() {
    let server = mockito::Server::new_async().await;
    let gateway = gateway_for(&server, 5_000, 20);
    let mut meta = gateway.meta("tok", "order", "1000").await;
    meta.update_transition = None;

    let err = gateway.update(&meta, "abc", None).await.unwrap_err();
    assert!(matches!(err, RepositoryError::MissingTransition));
}

#[tokio::test]
async fn find_by_id_unwraps_the_tree() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/entity/abc")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"tree": {"name": "x"}}"#)
        .create_async()
        .await;

    let gateway = gateway_for(&server, 5_000, 20);
    let meta = gateway.meta("tok", "order", "1000").await;
    let found = gateway.find_by_id(&meta, "abc").await.unwrap().unwrap();

    assert_eq!(found, json!({"name": "x", "technicalId": "abc"}));
}

#[tokio::test]
async fn find_by_id_treats_404_as_absence() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/entity/missing")
        .with_status(404)
        .create_async()
        .await;

    let gateway = gateway_for(&server, 5_000, 20);
    let meta = gateway.meta("tok", "order", "1000").await;
    assert!(gateway.find_by_id(&meta, "missing").await.unwrap().is_none());
}

#[tokio::test]
async fn model_existence_is_signalled_by_status_alone() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/model/export/SIMPLE_VIEW/order/1000")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;
    server
        .mock("GET", "/model/export/SIMPLE_VIEW/order/2000")
        .with_status(404)
        .create_async()
        .await;

    let gateway = gateway_for(&server, 5_000, 20);
    let present = gateway.meta("tok", "order", "1000").await;
    let absent = gateway.meta("tok", "order", "2000").await;

    assert!(gateway.model_exists(&present).await.unwrap());
    assert!(!gateway.model_exists(&absent).await.unwrap());
}

#[tokio::test]
async fn find_by_key_degrades_to_none_on_read_errors() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/search/snapshot/order/1000")
        .with_status(500)
        .create_async()
        .await;

    let gateway = gateway_for(&server, 5_000, 20);
    let meta = gateway
        .meta("tok", "order", "1000")
        .await
        .with_condition(json!({"key": "email", "value": "a@b.c"}));

    assert!(gateway.find_by_key(&meta, "email").await.unwrap().is_none());
}
