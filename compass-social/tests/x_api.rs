use compass_social::{SocialError, XApi};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn resolves_username_to_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/users/by/username/jane"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"id": "1001", "username": "jane", "name": "Jane"}
        })))
        .mount(&server)
        .await;

    let api = XApi::with_base(&server.uri(), "bearer-token".into()).unwrap();
    let user = api.user_by_username("@jane").await.unwrap();
    assert_eq!(user.id, "1001");
    assert_eq!(user.username, "jane");
}

#[tokio::test]
async fn unknown_handle_is_user_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/users/by/username/ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errors": [{"title": "Not Found Error", "detail": "Could not find user"}]
        })))
        .mount(&server)
        .await;

    let api = XApi::with_base(&server.uri(), "bearer-token".into()).unwrap();
    let err = api.user_by_username("ghost").await.unwrap_err();
    assert!(matches!(err, SocialError::UserNotFound(name) if name == "ghost"));
}

#[tokio::test]
async fn fetches_recent_posts_with_clamped_page_size() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/users/1001/tweets"))
        .and(query_param("max_results", "5"))
        .and(query_param("tweet.fields", "created_at,author_id,conversation_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                {"id": "1", "text": "first", "author_id": "1001"},
                {"id": "2", "text": "second", "author_id": "1001"}
            ],
            "meta": {"result_count": 2}
        })))
        .mount(&server)
        .await;

    let api = XApi::with_base(&server.uri(), "bearer-token".into()).unwrap();
    // 1 is below the endpoint floor; the client clamps up to 5.
    let posts = api.recent_posts("1001", 1).await.unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].text, "first");
}
