//! Integration tests for the PostgREST-style HTTP store adapter
#![cfg(feature = "http-store")]

use std::sync::Arc;

use cardforge::{GalleryPaginator, GreetingRecord, HttpGreetingStore, LoadOutcome};
use tiny_http::{Header, Response, Server};

fn seeded_rows(n: usize) -> Vec<GreetingRecord> {
    (0..n)
        .map(|i| {
            let mut r = GreetingRecord::new(
                &format!("Student {}", i),
                "CSE",
                "2",
                "Happy New Year",
                "Body text",
                "Quote",
            );
            r.id = format!("id-{}", i);
            r.created_at = format!("2026-01-01T00:00:{:02}Z", 59 - i);
            r
        })
        .collect()
}

/// Serve slices of a fixed row set, honoring `offset`/`limit` query
/// parameters and reporting the total via `Content-Range` when asked.
fn start_store_server(rows: Vec<GreetingRecord>) -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr();

    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            let url = url::Url::parse(&format!("http://host{}", request.url())).unwrap();
            if url.path() == "/fail" {
                let _ = request.respond(Response::from_string("boom").with_status_code(500));
                continue;
            }

            let mut offset = 0usize;
            let mut limit = rows.len();
            for (key, value) in url.query_pairs() {
                match key.as_ref() {
                    "offset" => offset = value.parse().unwrap_or(0),
                    "limit" => limit = value.parse().unwrap_or(limit),
                    _ => {}
                }
            }
            let want_total = request.headers().iter().any(|h| h.field.equiv("Prefer"));

            let start = offset.min(rows.len());
            let end = (offset + limit).min(rows.len());
            let body = serde_json::to_string(&rows[start..end]).unwrap();

            let mut response = Response::from_string(body).with_header(
                "Content-Type: application/json"
                    .parse::<Header>()
                    .unwrap(),
            );
            if want_total {
                let range = format!(
                    "Content-Range: {}-{}/{}",
                    start,
                    end.saturating_sub(1),
                    rows.len()
                );
                response = response.with_header(range.parse::<Header>().unwrap());
            }
            let _ = request.respond(response);
        }
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn paginates_a_remote_collection_with_totals() {
    let base = start_store_server(seeded_rows(9));
    let store = HttpGreetingStore::new(&format!("{}/greetings", base)).unwrap();
    let paginator = GalleryPaginator::new(Arc::new(store), 8);

    paginator.load_initial().await.unwrap();
    assert_eq!(paginator.items().len(), 8);
    assert!(paginator.has_more());

    let outcome = paginator.load_more().await.unwrap();
    assert_eq!(outcome, LoadOutcome::Loaded(1));
    assert!(!paginator.has_more());

    let ids: Vec<String> = paginator.items().iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids[0], "id-0");
    assert_eq!(ids[8], "id-8");
}

#[tokio::test]
async fn server_error_fails_closed() {
    let base = start_store_server(seeded_rows(3));
    let store = HttpGreetingStore::new(&format!("{}/fail", base)).unwrap();
    let paginator = GalleryPaginator::new(Arc::new(store), 8);

    assert!(paginator.load_initial().await.is_err());
    assert!(paginator.items().is_empty());
    assert!(!paginator.has_more());
}
