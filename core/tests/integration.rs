//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises every client
//! operation over real HTTP through the default ureq transport.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc};
use gorse_core::{ApiError, Feedback, GorseClient, Item, Recommender, User, UreqTransport};

/// Start a mock server on a random port and return its base URL.
fn spawn_server(api_key: Option<&str>) -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();
    let api_key = api_key.map(str::to_string);

    thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with_key(listener, api_key).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

/// Serve one canned HTTP response per connection, forever.
fn spawn_raw_server(status: u16, body: Arc<Vec<u8>>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let mut stream = stream.unwrap();
            let body = Arc::clone(&body);
            thread::spawn(move || {
                read_request_head(&mut stream);
                let head = format!(
                    "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(&body);
            });
        }
    });

    format!("http://{addr}")
}

/// Accept connections and never answer them.
fn spawn_silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let mut stream = stream.unwrap();
            thread::spawn(move || {
                read_request_head(&mut stream);
                thread::sleep(Duration::from_secs(10));
            });
        }
    });

    format!("http://{addr}")
}

fn read_request_head(stream: &mut std::net::TcpStream) {
    let mut seen = Vec::new();
    let mut buf = [0u8; 1024];
    while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => seen.extend_from_slice(&buf[..n]),
        }
    }
}

/// A JSON item array larger than `min_bytes`.
fn large_item_array(min_bytes: usize) -> (Vec<u8>, usize) {
    let mut body = b"[".to_vec();
    let mut count = 0;
    while body.len() < min_bytes {
        if count > 0 {
            body.push(b',');
        }
        let entry = format!(
            r#"{{"ItemId":"item-{count}","Timestamp":"2020-01-01T00:00:00Z","Labels":["padding-label-for-size"],"Comment":"{}"}}"#,
            "x".repeat(200)
        );
        body.extend_from_slice(entry.as_bytes());
        count += 1;
    }
    body.push(b']');
    (body, count)
}

fn item(id: &str, labels: &[&str], year: i32) -> Item {
    Item {
        item_id: id.to_string(),
        timestamp: Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap(),
        labels: labels.iter().map(|l| l.to_string()).collect(),
        comment: format!("item {id}"),
    }
}

fn user(id: &str) -> User {
    User {
        user_id: id.to_string(),
        labels: vec!["reader".to_string()],
        subscribe: Vec::new(),
        comment: String::new(),
    }
}

fn like(user_id: &str, item_id: &str) -> Feedback {
    Feedback {
        feedback_type: "like".to_string(),
        user_id: user_id.to_string(),
        item_id: item_id.to_string(),
        timestamp: Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
        comment: String::new(),
    }
}

fn ids(items: &[Item]) -> Vec<&str> {
    items.iter().map(|i| i.item_id.as_str()).collect()
}

#[test]
fn catalog_lifecycle() {
    let client = GorseClient::new(&spawn_server(None), "");

    // Step 1: empty catalog — lists are empty, not errors.
    assert!(client.get_popular_items(0, 10).unwrap().is_empty());
    assert!(client.get_latest_items(0, 10).unwrap().is_empty());

    // Step 2: insert items, singly and in a batch.
    client.insert_item(&item("a", &["news"], 2019)).unwrap();
    client
        .insert_items(&[item("b", &["news", "tech"], 2021), item("c", &["music"], 2020)])
        .unwrap();

    // Step 3: latest is newest first and round-trips every field.
    let latest = client.get_latest_items(0, 10).unwrap();
    assert_eq!(ids(&latest), ["b", "c", "a"]);
    assert_eq!(latest[0], item("b", &["news", "tech"], 2021));

    // Step 4: paging passes offset and n through.
    let page = client.get_latest_items(1, 1).unwrap();
    assert_eq!(ids(&page), ["c"]);

    // Step 5: users, singly and in a batch.
    client.insert_user(&user("u1")).unwrap();
    client.insert_users(&[user("u2"), user("u3")]).unwrap();

    // Step 6: feedback, singular and plural.
    client.insert_feedback(&like("u1", "c")).unwrap();
    client
        .insert_feedbacks(&[like("u2", "c"), like("u2", "a")])
        .unwrap();

    // Step 7: popular reflects feedback counts.
    let popular = client.get_popular_items(0, 2).unwrap();
    assert_eq!(ids(&popular), ["c", "a"]);

    // Step 8: recommendations exclude what the user has seen.
    let recommended = client.get_recommend_items("u2").unwrap();
    assert_eq!(ids(&recommended), ["b"]);

    // Step 9: neighbors share labels.
    let neighbors = client.get_item_neighbors("a", 0, 10).unwrap();
    assert_eq!(ids(&neighbors), ["b"]);
}

#[test]
fn not_found_is_a_remote_status_error() {
    let client = GorseClient::new(&spawn_server(None), "");

    let err = client.get_recommend_items("ghost").unwrap_err();
    assert!(matches!(err, ApiError::RemoteStatus { status: 404 }));

    let err = client.get_item_neighbors("ghost", 0, 10).unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[test]
fn api_key_is_sent_as_header() {
    let base = spawn_server(Some("secret"));

    let anonymous = GorseClient::new(&base, "");
    let err = anonymous.get_latest_items(0, 10).unwrap_err();
    assert!(matches!(err, ApiError::RemoteStatus { status: 401 }));

    let wrong = GorseClient::new(&base, "guess");
    assert_eq!(wrong.insert_item(&item("x", &[], 2020)).unwrap_err().status(), Some(401));

    let authorized = GorseClient::new(&base, "secret");
    authorized.insert_item(&item("x", &[], 2020)).unwrap();
    assert_eq!(ids(&authorized.get_latest_items(0, 10).unwrap()), ["x"]);
}

#[test]
fn unreachable_server_is_a_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = GorseClient::new(&format!("http://{addr}"), "");

    let err = client.get_popular_items(0, 10).unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "{err}");
}

#[test]
fn concurrent_callers_share_one_client() {
    let client = Arc::new(GorseClient::new(&spawn_server(None), ""));

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let client = Arc::clone(&client);
            thread::spawn(move || {
                client
                    .insert_item(&item(&format!("i{n}"), &["shared"], 2000 + n))
                    .unwrap();
                client.get_latest_items(0, 100).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let latest = client.get_latest_items(0, 100).unwrap();
    assert_eq!(latest.len(), 8);
    assert_eq!(latest[0].item_id, "i7");
}

#[test]
fn recommender_trait_object_works() {
    let client: Box<dyn Recommender> = Box::new(GorseClient::new(&spawn_server(None), ""));
    client.insert_item(&item("solo", &[], 2020)).unwrap();
    assert_eq!(ids(&client.get_popular_items(0, 10).unwrap()), ["solo"]);
}

#[test]
fn bodies_over_ten_mebibytes_are_read_in_full() {
    let (body, count) = large_item_array(11 * 1024 * 1024);
    let client = GorseClient::new(&spawn_raw_server(200, Arc::new(body)), "");

    let items = client.get_popular_items(0, count).unwrap();
    assert_eq!(items.len(), count);
    assert_eq!(items[count - 1].item_id, format!("item-{}", count - 1));
}

#[test]
fn large_error_bodies_still_report_the_status() {
    let body = vec![b'x'; 11 * 1024 * 1024];
    let client = GorseClient::new(&spawn_raw_server(503, Arc::new(body)), "");

    let err = client.get_latest_items(0, 10).unwrap_err();
    assert!(matches!(err, ApiError::RemoteStatus { status: 503 }), "{err}");
}

#[test]
fn body_limit_is_enforced_when_configured() {
    let (body, _) = large_item_array(64 * 1024);
    let base = spawn_raw_server(200, Arc::new(body));
    let client = GorseClient::with_transport(&base, "", UreqTransport::new().with_body_limit(1024));

    let err = client.get_latest_items(0, 10).unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "{err}");
}

#[test]
fn per_call_timeout_aborts_a_silent_server() {
    let client = GorseClient::new(&spawn_silent_server(), "").with_timeout(Duration::from_millis(300));

    let started = Instant::now();
    let err = client.get_recommend_items("u1").unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, ApiError::Transport(_)), "{err}");
    assert!(elapsed >= Duration::from_millis(250), "returned too early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "timeout not applied: {elapsed:?}");
}
