mod common;

use axum::http::{header, Method, StatusCode};
use common::{body_json, create_article, get, patch_json, post_json, put_json, send};
use manuscript_api::config::AppConfig;
use manuscript_core::events::EditorEvent;
use serde_json::json;
use tokio::sync::broadcast::error::TryRecvError;

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_starts_at_version_one() {
    let app = common::build_test_app();
    let article = create_article(&app, "On Offsets", "A").await;

    assert_eq!(article["current_version"], 1);
    assert_eq!(article["content"], "A");
    assert_eq!(article["status"], "draft");
    assert_eq!(article["template"], "IEEE");
    assert_eq!(article["authors"], json!(["alice"]));
    assert_eq!(article["versions"][0]["changes_summary"], "Initial version");
}

#[tokio::test]
async fn empty_title_is_bad_request() {
    let app = common::build_test_app();
    let response = post_json(&app, "/v1/articles", json!({ "title": "  " })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["type"], "badRequest");
    assert_eq!(json["error"]["statusCode"], 400);
}

#[tokio::test]
async fn update_revert_and_history() {
    let app = common::build_test_app();
    let article = create_article(&app, "Revert", "A").await;
    let id = article["article_id"].as_str().unwrap();

    for (base, content) in [(1, "AB"), (2, "ABC")] {
        let response = patch_json(
            &app,
            &format!("/v1/articles/{id}?author=bob"),
            json!({ "content": content, "base_version": base }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = send(
        &app,
        Method::POST,
        &format!("/v1/articles/{id}/revert/1?author=carol"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let reverted = body_json(response).await;
    assert_eq!(reverted["current_version"], 4);
    assert_eq!(reverted["content"], "A");

    let versions = body_json(get(&app, &format!("/v1/articles/{id}/versions")).await).await;
    let contents: Vec<_> = versions
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["content"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(contents, vec!["A", "AB", "ABC", "A"]);

    let v4 = body_json(get(&app, &format!("/v1/articles/{id}/versions/4")).await).await;
    assert_eq!(v4["author"], "carol");
    assert_eq!(v4["changes_summary"], "Reverted to version 1");
}

#[tokio::test]
async fn stale_base_version_conflicts() {
    let app = common::build_test_app();
    let article = create_article(&app, "Race", "A").await;
    let id = article["article_id"].as_str().unwrap();
    let uri = format!("/v1/articles/{id}");

    let first = patch_json(&app, &uri, json!({ "content": "AB", "base_version": 1 })).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = patch_json(&app, &uri, json!({ "content": "AX", "base_version": 1 })).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(second).await["error"]["type"], "conflict");

    let current = body_json(get(&app, &uri).await).await;
    assert_eq!(current["current_version"], 2);
    assert_eq!(current["content"], "AB");
}

#[tokio::test]
async fn out_of_range_base_version_conflicts() {
    let app = common::build_test_app();
    let article = create_article(&app, "Huge base", "A").await;
    let id = article["article_id"].as_str().unwrap();

    let response = patch_json(
        &app,
        &format!("/v1/articles/{id}"),
        json!({ "content": "B", "base_version": u32::MAX }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn put_updates_like_patch() {
    let app = common::build_test_app();
    let article = create_article(&app, "Put", "A").await;
    let id = article["article_id"].as_str().unwrap();

    let response = put_json(
        &app,
        &format!("/v1/articles/{id}"),
        json!({ "content": "AB", "base_version": 1, "title": "Put again" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["current_version"], 2);
    assert_eq!(json["title"], "Put again");
}

#[tokio::test]
async fn only_real_commits_are_published() {
    let (app, bus) = common::build_test_app_with_bus(AppConfig::default());
    let article = create_article(&app, "Events", "A").await;
    let id = article["article_id"].as_str().unwrap();
    let uri = format!("/v1/articles/{id}");

    let mut events = bus.subscribe();
    let response = patch_json(&app, &uri, json!({ "content": "AB", "base_version": 1 })).await;
    assert_eq!(response.status(), StatusCode::OK);
    match events.try_recv() {
        Ok(EditorEvent::VersionCommitted(event)) => assert_eq!(event.version_number, 2),
        other => panic!("expected a commit event, got {other:?}"),
    }

    let response = patch_json(
        &app,
        &uri,
        json!({ "content": "AB", "base_version": 1, "title": "Renamed" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["title"], "Renamed");
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn content_without_base_version_is_rejected() {
    let app = common::build_test_app();
    let article = create_article(&app, "Base", "A").await;
    let id = article["article_id"].as_str().unwrap();

    let response = patch_json(&app, &format!("/v1/articles/{id}"), json!({ "content": "B" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_article_and_version_are_404() {
    let app = common::build_test_app();
    let missing = uuid::Uuid::new_v4();
    let response = get(&app, &format!("/v1/articles/{missing}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let article = create_article(&app, "Versions", "A").await;
    let id = article["article_id"].as_str().unwrap();
    let response = get(&app, &format!("/v1/articles/{id}/versions/7")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, Method::POST, &format!("/v1/articles/{id}/revert/0"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_article() {
    let app = common::build_test_app();
    let article = create_article(&app, "Gone", "A").await;
    let id = article["article_id"].as_str().unwrap();

    let response = send(&app, Method::DELETE, &format!("/v1/articles/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(&app, &format!("/v1/articles/{id}/versions")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_by_status() {
    let app = common::build_test_app();
    create_article(&app, "Draft", "").await;
    let submitted = create_article(&app, "Submitted", "").await;
    let id = submitted["article_id"].as_str().unwrap();
    patch_json(&app, &format!("/v1/articles/{id}"), json!({ "status": "submitted" })).await;

    let list = body_json(get(&app, "/v1/articles?status=submitted").await).await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["title"], "Submitted");
    assert!(list[0]["submitted_at"].is_string());

    let all = body_json(get(&app, "/v1/articles?limit=10").await).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn diff_defaults_to_latest_change() {
    let app = common::build_test_app();
    let article = create_article(&app, "Diff", "Intro\nThe data is was collected.\n").await;
    let id = article["article_id"].as_str().unwrap();
    patch_json(
        &app,
        &format!("/v1/articles/{id}"),
        json!({ "content": "Intro\nThe data was collected.\n", "base_version": 1 }),
    )
    .await;

    let diff = body_json(get(&app, &format!("/v1/articles/{id}/diff")).await).await;
    assert_eq!(diff["from"], 1);
    assert_eq!(diff["to"], 2);
    let kinds: Vec<_> = diff["lines"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["kind"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(kinds, vec!["unchanged", "removed", "added"]);

    let response = get(&app, &format!("/v1/articles/{id}/diff?from=1&to=9")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Suggestions
// ---------------------------------------------------------------------------

fn suggestion(position: usize, original: &str, replacement: &str) -> serde_json::Value {
    json!({
        "type": "grammar",
        "position": position,
        "length": original.chars().count(),
        "original": original,
        "suggestion": replacement,
        "explanation": "",
        "confidence": 0.9
    })
}

#[tokio::test]
async fn apply_suggestions_commits_once() {
    let app = common::build_test_app();
    let article = create_article(&app, "Grammar", "The data is was collected.").await;
    let id = article["article_id"].as_str().unwrap();

    let response = post_json(
        &app,
        &format!("/v1/articles/{id}/suggestions/apply?author=editor"),
        json!({
            "base_version": 1,
            "suggestions": [
                suggestion(0, "The", "These"),
                suggestion(9, "is was", "was"),
                suggestion(12, "is was", "was"),
            ]
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["article"]["content"], "These data was collected.");
    assert_eq!(json["article"]["current_version"], 2);
    assert_eq!(json["applied"], json!([0, 1]));
    assert_eq!(json["rejected"][0]["index"], 2);
    assert_eq!(json["rejected"][0]["stale"], true);
    assert_eq!(
        json["article"]["versions"][1]["changes_summary"],
        "Applied 2 suggestion(s)"
    );
}

#[tokio::test]
async fn apply_suggestions_respects_selection_and_base() {
    let app = common::build_test_app();
    let article = create_article(&app, "Selection", "The data is was collected.").await;
    let id = article["article_id"].as_str().unwrap();
    let uri = format!("/v1/articles/{id}/suggestions/apply");

    let stale = post_json(
        &app,
        &uri,
        json!({ "base_version": 3, "suggestions": [suggestion(9, "is was", "was")] }),
    )
    .await;
    assert_eq!(stale.status(), StatusCode::CONFLICT);

    let out_of_range = post_json(
        &app,
        &uri,
        json!({ "base_version": 1, "suggestions": [], "selected": [0] }),
    )
    .await;
    assert_eq!(out_of_range.status(), StatusCode::BAD_REQUEST);

    let response = post_json(
        &app,
        &uri,
        json!({
            "base_version": 1,
            "suggestions": [suggestion(0, "The", "These"), suggestion(9, "is was", "was")],
            "selected": [1],
            "changes_summary": "Fix verb"
        }),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["article"]["content"], "The data was collected.");
    assert_eq!(json["applied"], json!([1]));
    assert_eq!(json["rejected"], json!([]));
    assert_eq!(json["article"]["versions"][1]["changes_summary"], "Fix verb");
}

#[tokio::test]
async fn nothing_applied_commits_nothing() {
    let app = common::build_test_app();
    let article = create_article(&app, "Stale", "The data is was collected.").await;
    let id = article["article_id"].as_str().unwrap();

    let response = post_json(
        &app,
        &format!("/v1/articles/{id}/suggestions/apply"),
        json!({ "base_version": 1, "suggestions": [suggestion(40, "x", "y")] }),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["article"]["current_version"], 1);
    assert_eq!(json["rejected"][0]["stale"], false);
}

#[tokio::test]
async fn overflowing_suggestion_is_rejected_by_index() {
    let app = common::build_test_app();
    let article = create_article(&app, "Overflow", "abc").await;
    let id = article["article_id"].as_str().unwrap();

    let mut huge = suggestion(1, "b", "y");
    huge["length"] = json!(usize::MAX);
    let response = post_json(
        &app,
        &format!("/v1/articles/{id}/suggestions/apply"),
        json!({
            "base_version": 1,
            "suggestions": [suggestion(0, "ab", "x"), huge],
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["article"]["content"], "xc");
    assert_eq!(json["applied"], json!([0]));
    assert_eq!(json["rejected"][0]["index"], 1);
    assert_eq!(json["rejected"][0]["stale"], false);

    let response = post_json(
        &app,
        &format!("/v1/articles/{id}/suggestions/apply"),
        json!({
            "base_version": 2,
            "suggestions": [suggestion(0, "x", "X"), huge],
            "selected": [0],
        }),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["article"]["content"], "Xc");
    assert_eq!(json["rejected"], json!([]));
}

// ---------------------------------------------------------------------------
// Events and limits
// ---------------------------------------------------------------------------

#[tokio::test]
async fn events_stream_is_sse() {
    let app = common::build_test_app();
    let article = create_article(&app, "Events", "A").await;
    let id = article["article_id"].as_str().unwrap();

    let response = get(&app, &format!("/v1/articles/{id}/events")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));

    let missing = uuid::Uuid::new_v4();
    let response = get(&app, &format!("/v1/articles/{missing}/events")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = common::build_test_app_with(AppConfig {
        max_body_bytes: 64,
        ..AppConfig::default()
    });
    let response = post_json(
        &app,
        "/v1/articles",
        json!({ "title": "Big", "content": "x".repeat(1024) }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
