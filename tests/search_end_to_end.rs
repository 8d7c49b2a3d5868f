mod support;

use std::{sync::Arc, time::Duration};

use httpmock::MockServer;
use whalefall::{
    application::search::{SearchController, SearchOutcome},
    infra::client::SiteClient,
};

use support::app;

async fn spawn_site(backend: &str) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let router = app(Some(backend));
    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .await
            .expect("test server");
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn latest_query_commits_through_the_proxy() {
    let backend = MockServer::start();
    backend.mock(|when, then| {
        when.method("GET")
            .path("/api/v1/blogs")
            .query_param("filter_title", "tokio");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"code":"OK","data":{"total":1,"item_list":[{"id":5,"title":"Tokio tips","summary":"","date":"2025-06-01","tags":"rust"}]}}"#);
    });

    let site = spawn_site(&backend.base_url()).await;
    let client = SiteClient::new(&site).expect("site client");
    let controller = SearchController::new(Arc::new(client), Duration::from_millis(20), 10);
    let mut updates = controller.subscribe();

    controller.submit("tok", None);
    let last = controller.submit("tokio", None);

    let state = tokio::time::timeout(
        Duration::from_secs(10),
        updates.wait_for(|state| state.generation == last),
    )
    .await
    .expect("search should settle")
    .expect("controller alive")
    .clone();

    assert_eq!(state.outcome, SearchOutcome::Ready);
    assert_eq!(state.total, 1);
    assert_eq!(state.posts[0].title, "Tokio tips");
    assert_eq!(state.posts[0].tags.as_deref(), Some(&["rust".to_string()][..]));
}

#[tokio::test]
async fn proxy_failure_commits_empty_results() {
    let backend = MockServer::start();
    backend.mock(|when, then| {
        when.method("GET").path("/api/v1/blogs");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"code":"ERR","message":"search index rebuilding"}"#);
    });

    let site = spawn_site(&backend.base_url()).await;
    let client = SiteClient::new(&site).expect("site client");
    let controller = SearchController::new(Arc::new(client), Duration::from_millis(10), 10);
    let mut updates = controller.subscribe();

    let generation = controller.submit("anything", Some("rust".to_string()));

    let state = tokio::time::timeout(
        Duration::from_secs(10),
        updates.wait_for(|state| state.generation == generation),
    )
    .await
    .expect("search should settle")
    .expect("controller alive")
    .clone();

    assert_eq!(state.outcome, SearchOutcome::Failed);
    assert!(state.posts.is_empty());
    assert_eq!(state.total, 0);
}
