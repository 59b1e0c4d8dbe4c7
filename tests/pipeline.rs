use std::collections::HashMap;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use gcnotify::config::Config;
use gcnotify::error::FetchError;
use gcnotify::models::{AccountId, SearchLocation};
use gcnotify::notify::PushoverClient;
use gcnotify::pipeline::run_cycle;
use gcnotify::storage::{SqliteStorage, Storage};
use gcnotify::utils::http::create_client;

const LISTING_PATH: &str = "/seek/nearest.aspx";
const PUSH_PATH: &str = "/1/messages.json";

fn location(lat: f64) -> SearchLocation {
    SearchLocation {
        lat,
        lng: 13.4,
        dist: Some(10),
    }
}

fn config(server: &MockServer, pushover_url: String, locations: Vec<SearchLocation>) -> Config {
    Config {
        geocaching_user_id: "user-1".to_string(),
        geocaching_gspk_user_id: "gspk-1".to_string(),
        pushover_user: "push-user".to_string(),
        pushover_token: "push-token".to_string(),
        search_locations: locations,
        listing_url: format!("{}{}", server.uri(), LISTING_PATH),
        pushover_url,
        database_path: PathBuf::from(":memory:"),
        user_agent: "gcnotify-test".to_string(),
        request_timeout_seconds: Some(5),
        check_interval_seconds: None,
    }
}

fn listing_page(rows: &[(&str, &str, &str)]) -> String {
    let rows: String = rows
        .iter()
        .map(|(href, class, label)| {
            format!(
                r#"<tr class="Data BorderTop">
                     <td class="Merge"><a href="{href}" class="{class}"><span>{label}</span></a></td>
                   </tr>"#
            )
        })
        .collect();
    format!(
        r#"<html><body><table class="SearchResultsTable">
           <tr class="Header"><th>Name</th></tr>{rows}</table></body></html>"#
    )
}

async fn mount_listing(server: &MockServer, lat: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("lat", lat))
        .and(query_param("ex", "1"))
        .and(header_exists("cookie"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_pushover(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path(PUSH_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string(r#"{"status":1}"#))
        .mount(server)
        .await;
}

fn form(request: &Request) -> HashMap<String, String> {
    serde_urlencoded::from_bytes(&request.body).unwrap()
}

async fn pushes(server: &MockServer) -> Vec<HashMap<String, String>> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == PUSH_PATH)
        .map(form)
        .collect()
}

async fn storage() -> SqliteStorage {
    let storage = SqliteStorage::in_memory().await.unwrap();
    storage.migrate().await.unwrap();
    storage
}

fn account() -> AccountId {
    AccountId("user-1".to_string())
}

#[tokio::test]
async fn new_cache_is_pushed_once_across_runs() {
    let server = MockServer::start().await;
    mount_listing(&server, "52.5", 200, listing_page(&[("/geocache/GC1", "", "Cache One")])).await;
    mount_pushover(&server, 200).await;

    let config = config(&server, format!("{}{}", server.uri(), PUSH_PATH), vec![location(52.5)]);
    let client = create_client(&config).unwrap();
    let sender = PushoverClient::new(client.clone(), &config);
    let storage = storage().await;

    let first = run_cycle(&config, &client, &storage, &sender).await;
    let second = run_cycle(&config, &client, &storage, &sender).await;

    assert_eq!(first[0].as_ref().unwrap().notified, 1);
    assert_eq!(second[0].as_ref().unwrap().already_seen, 1);

    let pushes = pushes(&server).await;
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0]["message"], "Cache One");
    assert_eq!(pushes[0]["url"], "/geocache/GC1");
    assert_eq!(pushes[0]["token"], "push-token");
    assert_eq!(pushes[0]["user"], "push-user");

    let records = storage.seen_records(&account()).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "Cache One");
}

#[tokio::test]
async fn empty_listing_pushes_no_results_alert() {
    let server = MockServer::start().await;
    mount_listing(&server, "52.5", 200, listing_page(&[])).await;
    mount_pushover(&server, 200).await;

    let config = config(&server, format!("{}{}", server.uri(), PUSH_PATH), vec![location(52.5)]);
    let client = create_client(&config).unwrap();
    let sender = PushoverClient::new(client.clone(), &config);
    let storage = storage().await;

    let results = run_cycle(&config, &client, &storage, &sender).await;

    assert!(!results[0].as_ref().unwrap().found_any_row);
    let pushes = pushes(&server).await;
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0]["message"], "No caches returned");
    assert_eq!(pushes[0]["url"], "");
    assert!(storage.seen_records(&account()).await.unwrap().is_empty());
}

#[tokio::test]
async fn disabled_caches_are_not_pushed() {
    let server = MockServer::start().await;
    let page = listing_page(&[
        ("/geocache/GC1", "lnk Strike", "Archived"),
        ("/geocache/GC2", "lnk", "Active"),
    ]);
    mount_listing(&server, "52.5", 200, page).await;
    mount_pushover(&server, 200).await;

    let config = config(&server, format!("{}{}", server.uri(), PUSH_PATH), vec![location(52.5)]);
    let client = create_client(&config).unwrap();
    let sender = PushoverClient::new(client.clone(), &config);
    let storage = storage().await;

    run_cycle(&config, &client, &storage, &sender).await;

    let messages: Vec<_> = pushes(&server)
        .await
        .into_iter()
        .map(|push| push["message"].clone())
        .collect();
    assert_eq!(messages, vec!["Active".to_string()]);
}

#[tokio::test]
async fn unreachable_push_service_leaves_cache_for_next_run() {
    let server = MockServer::start().await;
    mount_listing(&server, "52.5", 200, listing_page(&[("/geocache/GC1", "", "Cache One")])).await;
    mount_pushover(&server, 200).await;
    let storage = storage().await;

    let offline = config(
        &server,
        format!("http://127.0.0.1:1{}", PUSH_PATH),
        vec![location(52.5)],
    );
    let client = create_client(&offline).unwrap();
    let sender = PushoverClient::new(client.clone(), &offline);

    let results = run_cycle(&offline, &client, &storage, &sender).await;

    assert_eq!(results[0].as_ref().unwrap().failed, 1);
    assert!(storage.seen_records(&account()).await.unwrap().is_empty());

    let online = config(&server, format!("{}{}", server.uri(), PUSH_PATH), vec![location(52.5)]);
    let sender = PushoverClient::new(client.clone(), &online);

    let results = run_cycle(&online, &client, &storage, &sender).await;

    assert_eq!(results[0].as_ref().unwrap().notified, 1);
    assert_eq!(storage.seen_records(&account()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn push_error_status_still_counts_as_delivered() {
    let server = MockServer::start().await;
    mount_listing(&server, "52.5", 200, listing_page(&[("/geocache/GC1", "", "Cache One")])).await;
    mount_pushover(&server, 500).await;

    let config = config(&server, format!("{}{}", server.uri(), PUSH_PATH), vec![location(52.5)]);
    let client = create_client(&config).unwrap();
    let sender = PushoverClient::new(client.clone(), &config);
    let storage = storage().await;

    run_cycle(&config, &client, &storage, &sender).await;

    assert_eq!(storage.seen_records(&account()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn error_page_raises_no_results_alert_without_stopping_others() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "10",
        503,
        "<html><body><h1>Service Unavailable</h1></body></html>".to_string(),
    )
    .await;
    mount_listing(&server, "52.5", 200, listing_page(&[("/geocache/GC1", "", "Cache One")])).await;
    mount_pushover(&server, 200).await;

    let config = config(
        &server,
        format!("{}{}", server.uri(), PUSH_PATH),
        vec![location(10.0), location(52.5)],
    );
    let client = create_client(&config).unwrap();
    let sender = PushoverClient::new(client.clone(), &config);
    let storage = storage().await;

    let results = run_cycle(&config, &client, &storage, &sender).await;

    assert!(!results[0].as_ref().unwrap().found_any_row);
    assert_eq!(results[1].as_ref().unwrap().notified, 1);

    let mut messages: Vec<_> = pushes(&server)
        .await
        .into_iter()
        .map(|push| push["message"].clone())
        .collect();
    messages.sort();
    assert_eq!(
        messages,
        vec!["Cache One".to_string(), "No caches returned".to_string()]
    );
    assert_eq!(storage.seen_records(&account()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn unreachable_listing_is_a_fetch_error_without_alert() {
    let server = MockServer::start().await;
    mount_pushover(&server, 200).await;

    let mut config = config(&server, format!("{}{}", server.uri(), PUSH_PATH), vec![location(52.5)]);
    config.listing_url = format!("http://127.0.0.1:1{}", LISTING_PATH);
    let client = create_client(&config).unwrap();
    let sender = PushoverClient::new(client.clone(), &config);
    let storage = storage().await;

    let results = run_cycle(&config, &client, &storage, &sender).await;

    assert!(matches!(results[0], Err(FetchError::Request { .. })));
    assert!(pushes(&server).await.is_empty());
}
