use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;

use feedbackpulse::webhook::{verify, WebhookPayload, EVENT_HEADER, SIGNATURE_HEADER};
use feedbackpulse::SentimentClient;

use crate::helpers::{
    bearer, call, enable_webhook, get, next_delivery, seed_feedback, seed_project, send_json,
    spawn_gemini, spawn_receiver, spawn_slow_gemini, submit, test_state, test_state_with,
    GEMINI_MODEL, OTHER_USER, TEST_USER,
};

// ── Health and routing ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_report_health() {
    let state = test_state();
    let (status, body) = get(&state, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].as_str().is_some_and(|t| t.ends_with('Z')));
}

#[tokio::test]
async fn should_return_json_404_for_unknown_routes() {
    let state = test_state();
    let (status, body) = get(&state, "/api/nope", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Route GET /api/nope not found");
}

// ── Public submission ────────────────────────────────────────────────────────

#[tokio::test]
async fn should_accept_feedback_when_no_domains_configured() {
    let state = test_state();
    let project = seed_project(&state, None).await;

    let (status, body) = submit(
        &state,
        None,
        json!({ "projectKey": project.project_key, "type": "Bug", "message": "Broken button" }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["type"], "Bug");
    assert_eq!(body["data"]["projectId"], project.id.as_str());
    assert_eq!(body["data"]["message"], "Broken button");
    assert_eq!(body["data"]["sentiment"], serde_json::Value::Null);
    assert_eq!(state.store.export_feedback(&project.id).await.len(), 1);
}

#[tokio::test]
async fn should_reject_unknown_project_key() {
    let state = test_state();
    seed_project(&state, None).await;

    for key in ["fp_doesnotexi", "not-a-key"] {
        let (status, body) = submit(
            &state,
            None,
            json!({ "projectKey": key, "type": "Bug", "message": "Hello there" }),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Invalid project key");
    }
}

#[tokio::test]
async fn should_reject_invalid_submissions() {
    let state = test_state();
    let project = seed_project(&state, None).await;

    let (status, body) = submit(
        &state,
        None,
        json!({ "projectKey": project.project_key, "type": "Bug", "message": "hi" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "VALIDATION_FAILED");

    let (status, body) = submit(
        &state,
        None,
        json!({ "projectKey": project.project_key, "type": "Complaint", "message": "Hello there" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "VALIDATION_FAILED");

    assert!(state.store.export_feedback(&project.id).await.is_empty());
}

#[tokio::test]
async fn should_gate_submissions_by_origin() {
    let state = test_state();
    let project = seed_project(&state, Some("example.com, *.myapp.io")).await;
    let body = json!({ "projectKey": project.project_key, "type": "Feature", "message": "Dark mode please" });

    let cases = [
        (Some("https://example.com"), StatusCode::CREATED),
        (Some("https://app.myapp.io"), StatusCode::CREATED),
        (Some("https://myapp.io"), StatusCode::CREATED),
        (Some("https://evil.com"), StatusCode::FORBIDDEN),
        (Some("https://sub.example.com"), StatusCode::FORBIDDEN),
        (None, StatusCode::FORBIDDEN),
    ];

    for (origin, expected) in cases {
        let (status, _) = submit(&state, origin, body.clone()).await;
        assert_eq!(status, expected, "origin {origin:?}");
    }

    assert_eq!(state.store.export_feedback(&project.id).await.len(), 3);
}

#[tokio::test]
async fn should_fall_back_to_referer_for_origin() {
    let state = test_state();
    let project = seed_project(&state, Some("example.com")).await;

    let req = Request::builder()
        .method("POST")
        .uri("/api/public/feedback")
        .header("content-type", "application/json")
        .header("referer", "https://example.com/pricing?plan=pro")
        .body(Body::from(
            json!({ "projectKey": project.project_key, "type": "Other", "message": "Nice page" })
                .to_string(),
        ))
        .unwrap();

    let (status, _) = call(&state, req).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn should_deliver_created_webhook_after_submission() {
    let state = test_state();
    let project = seed_project(&state, None).await;
    let (url, mut rx) = spawn_receiver(StatusCode::OK).await;
    let project = enable_webhook(&state, &project, &url).await;
    let secret = project.webhook_secret.clone().unwrap();

    let (status, body) = submit(
        &state,
        None,
        json!({ "projectKey": project.project_key, "type": "Bug", "message": "Crash on save" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let captured = next_delivery(&mut rx).await;
    let signature = captured.headers[SIGNATURE_HEADER].to_str().unwrap();
    assert!(verify(&captured.body, signature, &secret));
    assert_eq!(captured.headers[EVENT_HEADER], "feedback.created");

    let payload: WebhookPayload = serde_json::from_slice(&captured.body).unwrap();
    assert_eq!(payload.feedback.id, body["data"]["id"].as_str().unwrap());
    assert_eq!(payload.project.id, project.id);
}

#[tokio::test]
async fn should_not_deliver_when_webhook_disabled() {
    let state = test_state();
    let project = seed_project(&state, None).await;
    let (url, mut rx) = spawn_receiver(StatusCode::OK).await;
    enable_webhook(&state, &project, &url).await;
    state
        .store
        .update_webhook(
            &project.id,
            TEST_USER,
            feedbackpulse::store::WebhookUpdate {
                webhook_url: None,
                webhook_enabled: Some(false),
            },
        )
        .await
        .unwrap();

    let (status, _) = submit(
        &state,
        None,
        json!({ "projectKey": project.project_key, "type": "Bug", "message": "Crash on save" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let waited = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
    assert!(waited.is_err(), "no delivery expected");
}

// ── Dashboard: auth and projects ─────────────────────────────────────────────

#[tokio::test]
async fn should_require_bearer_token() {
    let state = test_state();

    let (status, body) = get(&state, "/api/projects", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "UNAUTHORIZED");

    let (status, _) = get(&state, "/api/projects", Some("Bearer not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_create_and_fetch_project_with_snippet() {
    let state = test_state();
    let auth = bearer(&state, TEST_USER);

    let (status, body) = send_json(
        &state,
        "POST",
        "/api/projects",
        Some(&auth),
        json!({ "name": "Landing", "widgetText": "Talk to us", "widgetPosition": "top-left" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let project_id = body["data"]["id"].as_str().unwrap().to_string();
    let key = body["data"]["projectKey"].as_str().unwrap().to_string();
    assert!(key.starts_with("fp_"));
    assert_eq!(body["data"]["widgetText"], "Talk to us");
    assert_eq!(body["data"]["widgetPrimary"], "#2563EB");
    assert_eq!(body["data"]["feedbackCount"], 0);

    let (status, body) = get(&state, &format!("/api/projects/{project_id}"), Some(&auth)).await;
    assert_eq!(status, StatusCode::OK);
    let snippet = body["data"]["embedSnippet"].as_str().unwrap();
    assert!(snippet.starts_with("<script src=\"https://fp.test/widget.js?key="));
    assert!(snippet.contains(&key));
    assert!(snippet.contains("pos=top-left"));

    let (status, body) = get(&state, "/api/projects", Some(&auth)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn should_validate_project_input() {
    let state = test_state();
    let auth = bearer(&state, TEST_USER);

    let (status, _) = send_json(&state, "POST", "/api/projects", Some(&auth), json!({ "name": "x" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &state,
        "POST",
        "/api/projects",
        Some(&auth),
        json!({ "name": "Valid", "widgetPrimary": "red" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn should_hide_other_users_projects() {
    let state = test_state();
    let project = seed_project(&state, None).await;
    let other = bearer(&state, OTHER_USER);

    let (status, body) = get(&state, &format!("/api/projects/{}", project.id), Some(&other)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Project not found");

    let (status, _) = send_json(
        &state,
        "DELETE",
        &format!("/api/projects/{}", project.id),
        Some(&other),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(state.store.get_project(&project.id, TEST_USER).await.is_some());
}

#[tokio::test]
async fn should_update_and_clear_allowed_domains() {
    let state = test_state();
    let project = seed_project(&state, Some("example.com")).await;
    let auth = bearer(&state, TEST_USER);
    let uri = format!("/api/projects/{}", project.id);

    let (status, body) = send_json(&state, "PUT", &uri, Some(&auth), json!({ "name": "Renamed" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Renamed");
    assert_eq!(body["data"]["allowedDomains"], "example.com");

    let (status, body) = send_json(&state, "PUT", &uri, Some(&auth), json!({ "allowedDomains": null })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["allowedDomains"], serde_json::Value::Null);

    // Unrestricted again: a submission without any origin goes through.
    let (status, _) = submit(
        &state,
        None,
        json!({ "projectKey": project.project_key, "type": "Bug", "message": "Works now" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn should_regenerate_key_and_invalidate_old_one() {
    let state = test_state();
    let project = seed_project(&state, None).await;
    let auth = bearer(&state, TEST_USER);

    let (status, body) = send_json(
        &state,
        "POST",
        &format!("/api/projects/{}/regenerate-key", project.id),
        Some(&auth),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let new_key = body["data"]["projectKey"].as_str().unwrap().to_string();
    assert_ne!(new_key, project.project_key);

    let message = json!({ "type": "Bug", "message": "Old key test" });
    let mut old = message.clone();
    old["projectKey"] = json!(project.project_key);
    let mut new = message;
    new["projectKey"] = json!(new_key);

    assert_eq!(submit(&state, None, old).await.0, StatusCode::NOT_FOUND);
    assert_eq!(submit(&state, None, new).await.0, StatusCode::CREATED);
}

#[tokio::test]
async fn should_delete_project_with_its_feedback() {
    let state = test_state();
    let project = seed_project(&state, None).await;
    let feedback = seed_feedback(&state, &project, "Goes away").await;
    let auth = bearer(&state, TEST_USER);

    let (status, body) = send_json(
        &state,
        "DELETE",
        &format!("/api/projects/{}", project.id),
        Some(&auth),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(state.store.find_owned_feedback(&feedback.id, TEST_USER).await.is_none());
}

// ── Dashboard: feedback ──────────────────────────────────────────────────────

#[tokio::test]
async fn should_paginate_and_filter_feedback() {
    let state = test_state();
    let project = seed_project(&state, None).await;
    let auth = bearer(&state, TEST_USER);
    for i in 0..15 {
        seed_feedback(&state, &project, &format!("Bug number {i}")).await;
    }
    state
        .store
        .insert_feedback(&project.id, feedbackpulse::model::FeedbackType::Feature, "Add export".into())
        .await
        .unwrap();

    let base = format!("/api/projects/{}/feedback", project.id);

    let (status, body) = get(&state, &format!("{base}?page=2&limit=10"), Some(&auth)).await;
    assert_eq!(status, StatusCode::OK);
    let page = &body["data"];
    assert_eq!(page["data"].as_array().unwrap().len(), 6);
    assert_eq!(page["total"], 16);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["page"], 2);

    let (_, body) = get(&state, &format!("{base}?type=Feature"), Some(&auth)).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["data"][0]["message"], "Add export");

    let (status, _) = get(&state, &format!("{base}?limit=500"), Some(&auth)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&state, &format!("{base}?page=abc"), Some(&auth)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn should_export_all_feedback() {
    let state = test_state();
    let project = seed_project(&state, None).await;
    let auth = bearer(&state, TEST_USER);
    for i in 0..12 {
        seed_feedback(&state, &project, &format!("Entry {i}")).await;
    }

    let (status, body) = get(
        &state,
        &format!("/api/projects/{}/feedback/export", project.id),
        Some(&auth),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 12);
    assert_eq!(entries[0]["message"], "Entry 11");
}

#[tokio::test]
async fn should_delete_feedback_and_notify_webhook() {
    let state = test_state();
    let project = seed_project(&state, None).await;
    let (url, mut rx) = spawn_receiver(StatusCode::OK).await;
    enable_webhook(&state, &project, &url).await;
    let feedback = seed_feedback(&state, &project, "Remove me").await;
    let auth = bearer(&state, TEST_USER);

    let (status, _) = send_json(
        &state,
        "DELETE",
        &format!("/api/feedback/{}", feedback.id),
        Some(&auth),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let captured = next_delivery(&mut rx).await;
    assert_eq!(captured.headers[EVENT_HEADER], "feedback.deleted");
    let payload: WebhookPayload = serde_json::from_slice(&captured.body).unwrap();
    assert_eq!(payload.feedback.id, feedback.id);

    assert!(state.store.export_feedback(&project.id).await.is_empty());
}

#[tokio::test]
async fn should_report_sentiment_unavailable_without_api_key() {
    let state = test_state();
    let project = seed_project(&state, None).await;
    let feedback = seed_feedback(&state, &project, "Love it").await;
    let auth = bearer(&state, TEST_USER);

    let (status, body) = send_json(
        &state,
        "POST",
        &format!("/api/feedback/{}/sentiment", feedback.id),
        Some(&auth),
        json!({}),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["kind"], "SENTIMENT_UNAVAILABLE");
}

#[tokio::test]
async fn should_store_sentiment_and_emit_updated_event() {
    let endpoint = spawn_gemini("Positive").await;
    let sentiment = SentimentClient::new(reqwest::Client::new(), Some("test-key".into()), GEMINI_MODEL)
        .with_endpoint(endpoint);
    let state = test_state_with(Duration::from_secs(2), sentiment);

    let project = seed_project(&state, None).await;
    let (url, mut rx) = spawn_receiver(StatusCode::OK).await;
    enable_webhook(&state, &project, &url).await;
    let feedback = seed_feedback(&state, &project, "This is wonderful").await;
    let auth = bearer(&state, TEST_USER);

    let (status, body) = send_json(
        &state,
        "POST",
        &format!("/api/feedback/{}/sentiment", feedback.id),
        Some(&auth),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["sentiment"], "positive");

    let captured = next_delivery(&mut rx).await;
    assert_eq!(captured.headers[EVENT_HEADER], "feedback.updated");
    let payload: WebhookPayload = serde_json::from_slice(&captured.body).unwrap();
    assert_eq!(
        payload.feedback.sentiment,
        Some(feedbackpulse::model::Sentiment::Positive)
    );
}

#[tokio::test]
async fn should_fail_sentiment_when_model_is_too_slow() {
    let endpoint = spawn_slow_gemini(Duration::from_secs(5)).await;
    let sentiment = SentimentClient::new(reqwest::Client::new(), Some("test-key".into()), GEMINI_MODEL)
        .with_endpoint(endpoint)
        .with_timeout(Duration::from_millis(200));
    let state = test_state_with(Duration::from_secs(2), sentiment);

    let project = seed_project(&state, None).await;
    let feedback = seed_feedback(&state, &project, "Where did my data go").await;
    let auth = bearer(&state, TEST_USER);

    let started = std::time::Instant::now();
    let (status, body) = send_json(
        &state,
        "POST",
        &format!("/api/feedback/{}/sentiment", feedback.id),
        Some(&auth),
        json!({}),
    )
    .await;

    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "INTERNAL");

    let stored = state.store.export_feedback(&project.id).await;
    assert_eq!(stored[0].sentiment, None);
}

#[tokio::test]
async fn should_manage_labels() {
    let state = test_state();
    let project = seed_project(&state, None).await;
    let feedback = seed_feedback(&state, &project, "Needs triage").await;
    let auth = bearer(&state, TEST_USER);
    let uri = format!("/api/feedback/{}/labels", feedback.id);

    let (status, body) = send_json(&state, "POST", &uri, Some(&auth), json!({ "label": "urgent" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let label_id = body["data"]["id"].as_str().unwrap().to_string();

    send_json(&state, "POST", &uri, Some(&auth), json!({ "label": "ui" })).await;

    let (_, body) = get(&state, &uri, Some(&auth)).await;
    let labels = body["data"].as_array().unwrap();
    assert_eq!(labels.len(), 2);
    assert_eq!(labels[0]["label"], "ui");

    let (status, _) = send_json(&state, "POST", &uri, Some(&auth), json!({ "label": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &state,
        "DELETE",
        &format!("{uri}/{label_id}"),
        Some(&auth),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_json(
        &state,
        "DELETE",
        &format!("{uri}/{label_id}"),
        Some(&auth),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let other = bearer(&state, OTHER_USER);
    let (status, _) = get(&state, &uri, Some(&other)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Dashboard: webhook settings ──────────────────────────────────────────────

#[tokio::test]
async fn should_create_secret_lazily_and_keep_it_when_url_cleared() {
    let state = test_state();
    let project = seed_project(&state, None).await;
    let auth = bearer(&state, TEST_USER);
    let uri = format!("/api/projects/{}/webhook", project.id);

    let (status, body) = get(&state, &uri, Some(&auth)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["webhookSecret"], serde_json::Value::Null);
    assert_eq!(body["data"]["webhookEnabled"], false);

    let (status, body) = send_json(
        &state,
        "PUT",
        &uri,
        Some(&auth),
        json!({ "webhookUrl": "https://hooks.example.com/fp", "webhookEnabled": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let secret = body["data"]["webhookSecret"].as_str().unwrap().to_string();
    assert!(secret.starts_with("whsec_"));
    assert_eq!(body["data"]["webhookEnabled"], true);

    let (_, body) = send_json(&state, "PUT", &uri, Some(&auth), json!({ "webhookUrl": null })).await;
    assert_eq!(body["data"]["webhookUrl"], serde_json::Value::Null);
    assert_eq!(body["data"]["webhookSecret"], secret);

    let (status, body) = send_json(
        &state,
        "POST",
        &format!("{uri}/regenerate-secret"),
        Some(&auth),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(body["data"]["webhookSecret"], secret);
}

#[tokio::test]
async fn should_reject_non_http_webhook_urls() {
    let state = test_state();
    let project = seed_project(&state, None).await;
    let auth = bearer(&state, TEST_USER);

    let (status, body) = send_json(
        &state,
        "PUT",
        &format!("/api/projects/{}/webhook", project.id),
        Some(&auth),
        json!({ "webhookUrl": "ftp://files.example.com" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "BAD_REQUEST");
}

#[tokio::test]
async fn should_send_test_webhook_and_report_outcome() {
    let state = test_state();
    let project = seed_project(&state, None).await;
    let auth = bearer(&state, TEST_USER);
    let test_uri = format!("/api/projects/{}/webhook/test", project.id);

    let (status, _) = send_json(&state, "POST", &test_uri, Some(&auth), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (url, mut rx) = spawn_receiver(StatusCode::OK).await;
    enable_webhook(&state, &project, &url).await;

    let (status, body) = send_json(&state, "POST", &test_uri, Some(&auth), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["statusCode"], 200);

    let captured = next_delivery(&mut rx).await;
    let payload: WebhookPayload = serde_json::from_slice(&captured.body).unwrap();
    assert_eq!(payload.feedback.id, "test_feedback_id");

    let (failing, _rx) = spawn_receiver(StatusCode::BAD_GATEWAY).await;
    enable_webhook(&state, &project, &failing).await;

    let (status, body) = send_json(&state, "POST", &test_uri, Some(&auth), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "HTTP 502: Bad Gateway");
    assert_eq!(body["statusCode"], 502);
}
