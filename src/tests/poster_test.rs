use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::{
    config::PlatformCredentials,
    delivery::Platform,
    poster::{PlatformEndpoints, Poster, PosterError},
};

fn endpoints(server: &MockServer) -> PlatformEndpoints {
    PlatformEndpoints {
        twitter: format!("{}/2/tweets", server.uri()),
        facebook: format!("{}/me/feed", server.uri()),
        instagram: format!("{}/me/media", server.uri()),
        linkedin: format!("{}/v2/ugcPosts", server.uri()),
    }
}

fn credentials() -> PlatformCredentials {
    PlatformCredentials {
        twitter_bearer_token: "twitter-token".to_string(),
        facebook_access_token: "facebook-token".to_string(),
        instagram_access_token: "instagram-token".to_string(),
        linkedin_access_token: "linkedin-token".to_string(),
        linkedin_author_urn: "urn:li:person:42".to_string(),
    }
}

#[tokio::test]
async fn twitter_post_sends_bearer_token_and_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(header("authorization", "Bearer twitter-token"))
        .and(body_string_contains("\"text\":\"hello\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "data": { "id": "1" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let poster = Poster::http(endpoints(&server), credentials());
    let result = poster.post(Platform::Twitter, "hello").await.unwrap();

    assert_eq!(result["data"]["id"], "1");
}

#[tokio::test]
async fn facebook_post_is_form_encoded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/me/feed"))
        .and(body_string_contains("message=hello"))
        .and(body_string_contains("access_token=facebook-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "123" })))
        .expect(1)
        .mount(&server)
        .await;

    let poster = Poster::http(endpoints(&server), credentials());
    let result = poster.post(Platform::Facebook, "hello").await.unwrap();

    assert_eq!(result["id"], "123");
}

#[tokio::test]
async fn linkedin_post_carries_the_author_urn() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/ugcPosts"))
        .and(header("authorization", "Bearer linkedin-token"))
        .and(body_string_contains("urn:li:person:42"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "id": "ugc-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let poster = Poster::http(endpoints(&server), credentials());
    let result = poster.post(Platform::LinkedIn, "we are hiring").await.unwrap();

    assert_eq!(result["id"], "ugc-1");
}

#[tokio::test]
async fn platform_rejection_reports_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let poster = Poster::http(endpoints(&server), credentials());
    let error = poster.post(Platform::Twitter, "hello").await.unwrap_err();

    match error {
        PosterError::Rejected {
            platform,
            status,
            body,
        } => {
            assert_eq!(platform, Platform::Twitter);
            assert_eq!(status.as_u16(), 403);
            assert_eq!(body, "forbidden");
        }
        PosterError::Transport { .. } => panic!("expected a rejection"),
    }
}

#[tokio::test]
async fn unexpected_success_status_is_still_a_rejection() {
    // Twitter answers 201 on success; a plain 200 means something else
    // handled the request
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let poster = Poster::http(endpoints(&server), credentials());
    let error = poster.post(Platform::Twitter, "hello").await.unwrap_err();

    assert!(matches!(error, PosterError::Rejected { .. }));
}

#[tokio::test]
async fn unreachable_platform_is_a_transport_error() {
    let endpoints = PlatformEndpoints {
        twitter: "http://127.0.0.1:1/2/tweets".to_string(),
        ..PlatformEndpoints::default()
    };

    let poster = Poster::http(endpoints, credentials());
    let error = poster.post(Platform::Twitter, "hello").await.unwrap_err();

    assert!(matches!(error, PosterError::Transport { .. }));
}

#[tokio::test]
async fn mock_poster_captures_instead_of_sending() {
    let poster = Poster::mock();

    poster.post(Platform::Instagram, "pretty picture").await.unwrap();

    let posts = poster.sent_posts().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].platform, Platform::Instagram);
    assert_eq!(posts[0].text, "pretty picture");

    poster.clear_sent_posts();
    assert!(poster.sent_posts().unwrap().is_empty());
}
