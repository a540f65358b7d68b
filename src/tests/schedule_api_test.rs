use axum::http::StatusCode;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::json;

use crate::{
    api,
    database::models::{job_status::JobStatus, post_job},
    delivery::Platform,
    tests::setup_test::{setup_test, TestUtils},
};

async fn test() -> TestUtils {
    setup_test(api::schedule::routes).await
}

/// A `run_at` string safely in the future, in the wire format the UI sends
fn future_run_at() -> String {
    (chrono::Local::now() + chrono::Duration::days(1))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

async fn listed_jobs(test: &TestUtils) -> Vec<serde_json::Value> {
    let response = test.server.get("/scheduled_jobs/").await;
    response.assert_status_ok();
    response.json()
}

#[tokio::test]
async fn scheduling_a_post_makes_it_visible_in_the_listing() {
    let test = test().await;
    let run_at = future_run_at();

    let response = test
        .server
        .post("/schedule_post/")
        .json(&json!({ "app": "Twitter", "content": "hello world", "run_at": run_at }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "Twitter post scheduled!");
    assert_eq!(body["app"], "Twitter");
    assert_eq!(body["time"], run_at.as_str());

    let jobs = listed_jobs(&test).await;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["id"], format!("Twitter-{run_at}-hello worl"));
    assert_eq!(jobs[0]["func"], "post_to_twitter");
    // Stored as UTC, reported back as the same local wall-clock instant
    assert_eq!(jobs[0]["next_run_time"], run_at.replace(' ', "T"));
}

#[tokio::test]
async fn platform_name_is_case_insensitive() {
    let test = test().await;

    let response = test
        .server
        .post("/schedule_post/")
        .json(&json!({ "app": "linkedin", "content": "launch day", "run_at": future_run_at() }))
        .await;

    response.assert_status_ok();
    let jobs = listed_jobs(&test).await;
    assert_eq!(jobs[0]["func"], "post_to_linkedin");
}

#[tokio::test]
async fn malformed_run_at_is_rejected() {
    let test = test().await;

    let response = test
        .server
        .post("/schedule_post/")
        .json(&json!({ "app": "Twitter", "content": "hello", "run_at": "2024-01-01T10:30" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["detail"], "Invalid datetime format. Use YYYY-MM-DD HH:MM:SS");

    assert!(listed_jobs(&test).await.is_empty());
}

#[tokio::test]
async fn past_run_at_is_rejected() {
    let test = test().await;

    let response = test
        .server
        .post("/schedule_post/")
        .json(&json!({ "app": "Twitter", "content": "hello", "run_at": "2020-01-01 10:00:00" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["detail"], "run_at must be in the future");

    assert!(listed_jobs(&test).await.is_empty());
}

#[tokio::test]
async fn unsupported_app_is_rejected() {
    let test = test().await;

    let response = test
        .server
        .post("/schedule_post/")
        .json(&json!({ "app": "Myspace", "content": "hello", "run_at": future_run_at() }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["detail"], "Unsupported app: Myspace");
}

#[tokio::test]
async fn empty_content_is_rejected() {
    let test = test().await;

    let response = test
        .server
        .post("/schedule_post/")
        .json(&json!({ "app": "Twitter", "content": "", "run_at": future_run_at() }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert!(listed_jobs(&test).await.is_empty());
}

#[tokio::test]
async fn invalid_json_gets_a_detail_message() {
    let test = test().await;

    let response = test
        .server
        .post("/schedule_post/")
        .content_type("application/json")
        .text("{not json")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["detail"], "Invalid JSON format");
}

#[tokio::test]
async fn rescheduling_the_same_post_replaces_the_job() {
    let test = test().await;
    let run_at = future_run_at();
    let payload = json!({ "app": "Facebook", "content": "big announcement", "run_at": run_at });

    test.server
        .post("/schedule_post/")
        .json(&payload)
        .await
        .assert_status_ok();
    test.server
        .post("/schedule_post/")
        .json(&payload)
        .await
        .assert_status_ok();

    let jobs = listed_jobs(&test).await;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["func"], "post_to_facebook");
}

#[tokio::test]
async fn listing_is_empty_without_jobs() {
    let test = test().await;

    let response = test.server.get("/scheduled_jobs/").await;
    response.assert_status_ok();
    let jobs: Vec<serde_json::Value> = response.json();
    assert!(jobs.is_empty());
}

#[tokio::test]
async fn executed_jobs_disappear_from_the_listing() {
    let test = test().await;

    test.server
        .post("/schedule_post/")
        .json(&json!({ "app": "Twitter", "content": "old news", "run_at": future_run_at() }))
        .await
        .assert_status_ok();

    // Simulate the dispatcher finishing the job
    let job = post_job::Entity::find()
        .one(test.db())
        .await
        .unwrap()
        .unwrap();
    let mut finished: post_job::ActiveModel = job.into();
    finished.status = Set(JobStatus::Completed);
    finished.update(test.db()).await.unwrap();

    assert!(listed_jobs(&test).await.is_empty());
}

#[tokio::test]
async fn schedule_tweet_targets_twitter() {
    let test = test().await;
    let run_at = future_run_at();

    let response = test
        .server
        .post("/schedule_tweet/")
        .json(&json!({ "text": "short and sweet", "run_at": run_at }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "Tweet scheduled!");
    assert_eq!(body["time"], run_at.as_str());

    let jobs = listed_jobs(&test).await;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["func"], "post_to_twitter");
}

#[tokio::test]
async fn post_now_delivers_without_touching_the_store() {
    let test = test().await;

    let response = test
        .server
        .post("/post_now/")
        .json(&json!({ "app": "facebook", "content": "right away" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "Facebook posted!");

    let posts = test.sent_posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].platform, Platform::Facebook);
    assert_eq!(posts[0].text, "right away");

    assert!(listed_jobs(&test).await.is_empty());
}

#[tokio::test]
async fn post_now_rejects_unknown_platforms() {
    let test = test().await;

    let response = test
        .server
        .post("/post_now/")
        .json(&json!({ "app": "Friendster", "content": "hello" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["detail"], "Unsupported app: Friendster");
    assert!(test.sent_posts().is_empty());
}
