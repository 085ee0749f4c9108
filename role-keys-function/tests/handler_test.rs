//! Get/Add Role handler tests against the in-memory database.

mod common;

use cache_keys_core::response::{LambdaResponse, ResponseBody};
use cache_keys_core::testing::{Failure, MemoryConnector};
use common::spawn_store;
use role_keys_function::function_handler;
use role_keys_function::handler::added_message;
use serde_json::json;
use std::collections::BTreeSet;

fn keys_of(response: &LambdaResponse) -> Vec<String> {
    match &response.body {
        ResponseBody::Keys(keys) => keys.clone(),
        other => panic!("expected a key list, got {:?}", other),
    }
}

#[tokio::test]
async fn get_roles_on_empty_table() {
    let connector = MemoryConnector::new();
    let store = spawn_store(&connector);

    for event in [json!({}), json!({"request_type": "get_roles"})] {
        let response = function_handler(&store, event).await;
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"statusCode": 200, "body": []})
        );
    }
}

#[tokio::test]
async fn add_role_then_get_roles_sees_key() {
    let connector = MemoryConnector::new();
    let store = spawn_store(&connector);

    let added = function_handler(
        &store,
        json!({"request_type": "add_role", "key": "summarize:v2"}),
    )
    .await;
    assert_eq!(added, LambdaResponse::message(added_message("summarize:v2")));

    let listed = function_handler(&store, json!({"request_type": "get_roles"})).await;
    assert_eq!(listed.status_code, 200);
    assert_eq!(keys_of(&listed), vec!["summarize:v2"]);
}

#[tokio::test]
async fn every_inserted_key_is_listed() {
    let connector = MemoryConnector::with_keys(["seed"]);
    let store = spawn_store(&connector);

    let inserted = ["alpha", "beta", "gamma", "alpha", "δ-unicode"];
    for key in inserted {
        let event = json!({"request_type": "add_role", "key": key});
        let response = function_handler(&store, event).await;
        assert_eq!(response.status_code, 200);
    }

    let listed = function_handler(&store, json!({})).await;
    let listed: BTreeSet<String> = keys_of(&listed).into_iter().collect();
    let expected: BTreeSet<String> = inserted
        .iter()
        .chain(["seed"].iter())
        .map(|k| k.to_string())
        .collect();

    assert_eq!(listed, expected);
    // Duplicates are stored, not collapsed.
    assert_eq!(connector.keys().len(), inserted.len() + 1);
}

#[tokio::test]
async fn add_role_without_key_never_touches_database() {
    let connector = MemoryConnector::new();
    let store = spawn_store(&connector);

    for event in [
        json!({"request_type": "add_role"}),
        json!({"request_type": "add_role", "key": ""}),
        json!({"request_type": "add_role", "key": null}),
    ] {
        let response = function_handler(&store, event).await;
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"statusCode": 400, "body": "Missing key"})
        );
    }

    assert_eq!(connector.stats().connects, 0);
}

#[tokio::test]
async fn missing_key_is_rejected_even_when_database_is_down() {
    let connector = MemoryConnector::new().fail_on(Failure::Connect);
    let store = spawn_store(&connector);

    let response = function_handler(&store, json!({"request_type": "add_role"})).await;

    assert_eq!(response, LambdaResponse::bad_request("Missing key"));
    assert_eq!(connector.stats().connects, 0);
}

#[tokio::test]
async fn add_role_with_non_string_key_is_missing_key() {
    let connector = MemoryConnector::new();
    let store = spawn_store(&connector);

    let response = function_handler(&store, json!({"request_type": "add_role", "key": 7})).await;

    assert_eq!(response, LambdaResponse::bad_request("Missing key"));
    assert_eq!(connector.stats().connects, 0);
}

#[tokio::test]
async fn wrong_typed_fields_still_list_keys() {
    let connector = MemoryConnector::with_keys(["a"]);
    let store = spawn_store(&connector);

    for event in [
        json!({"request_type": "get_roles", "key": 7}),
        json!({"request_type": 42}),
        json!({"key": false}),
    ] {
        let response = function_handler(&store, event.clone()).await;
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"statusCode": 200, "body": ["a"]}),
            "event {}",
            event
        );
    }
}

#[tokio::test]
async fn non_object_event_is_bad_request() {
    let connector = MemoryConnector::new();
    let store = spawn_store(&connector);

    let response = function_handler(&store, json!(["add_role", "k"])).await;

    assert_eq!(response, LambdaResponse::bad_request("Invalid request"));
    assert_eq!(connector.stats().connects, 0);
}

#[tokio::test]
async fn database_failures_return_generic_500() {
    let cases = [
        (Failure::Connect, json!({})),
        (Failure::Connect, json!({"request_type": "add_role", "key": "k"})),
        (Failure::Query, json!({"request_type": "get_roles"})),
        (Failure::Query, json!({"request_type": "add_role", "key": "k"})),
        (Failure::Commit, json!({"request_type": "add_role", "key": "k"})),
    ];

    for (failure, event) in cases {
        let connector = MemoryConnector::with_keys(["existing"]).fail_on(failure);
        let store = spawn_store(&connector);

        let response = function_handler(&store, event.clone()).await;

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"statusCode": 500, "body": "Internal Server Error"}),
            "failure {:?} on event {}",
            failure,
            event
        );
        assert_eq!(connector.keys(), vec!["existing"]);
    }
}

#[tokio::test]
async fn failed_commit_leaves_no_trace_and_releases_session() {
    let connector = MemoryConnector::new().fail_on(Failure::Commit);
    let store = spawn_store(&connector);

    let event = json!({"request_type": "add_role", "key": "lost"});
    let response = function_handler(&store, event).await;
    assert_eq!(response, LambdaResponse::internal_error());

    let stats = connector.stats();
    assert_eq!(stats.statements, 1);
    assert_eq!(stats.commits, 0);
    assert_eq!(stats.cursor_closes, 1);
    assert_eq!(stats.connection_closes, 1);
    assert!(connector.keys().is_empty());
}
