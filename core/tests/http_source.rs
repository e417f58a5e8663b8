//! End-to-end checks of the HTTP source and poll loop against a canned local server.

use std::time::Duration;

use servicedash_core::{
    CycleOutcome, Error, HttpServiceSource, PagingMode, Phase, PollLoop, PollOptions,
    ServiceSource, SortField, SortSpec,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_test::assert_ok;

/// Serve each canned `(status, body)` to one connection, reporting request lines.
async fn serve(responses: Vec<(u16, &'static str)>) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}/", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let head = String::from_utf8_lossy(&buf);
            let request_line = head.lines().next().unwrap_or_default().to_string();
            let _ = tx.send(request_line);

            let response = format!(
                "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        }
    });

    (endpoint, rx)
}

#[tokio::test]
async fn fetches_and_validates_listing() {
    let (endpoint, mut requests) = serve(vec![(
        200,
        r#"[{"port":6379,"status":"LISTEN","process":"redis-server"},{"port":8080,"status":"LISTEN"}]"#,
    )])
    .await;
    let source = assert_ok!(HttpServiceSource::new(&endpoint, Duration::from_secs(5)));
    let poll = PollLoop::new(source, PollOptions::default());

    assert_eq!(poll.refresh().await, CycleOutcome::Replaced);
    assert_eq!(requests.recv().await.unwrap(), "GET / HTTP/1.1");

    let view = poll.view();
    assert_eq!(view.total, 2);
    assert_eq!(view.rows[0].recognized.map(|r| r.label), Some("Redis"));
    assert_eq!(view.rows[1].recognized, None);
}

#[tokio::test]
async fn server_paging_sends_query_parameters() {
    let (endpoint, mut requests) = serve(vec![(
        200,
        r#"{"data":[{"port":5432,"status":"LISTEN"}],"total":21,"page":2,"page_size":20}"#,
    )])
    .await;
    let source = assert_ok!(HttpServiceSource::new(&endpoint, Duration::from_secs(5)));
    let poll = PollLoop::new(
        source,
        PollOptions {
            mode: PagingMode::Server,
            ..PollOptions::default()
        },
    );
    poll.set_sort(SortSpec::descending(SortField::Pid));
    poll.set_page(2);

    assert_eq!(poll.refresh().await, CycleOutcome::Replaced);
    assert_eq!(
        requests.recv().await.unwrap(),
        "GET /?sort_by=pid&sort_order=desc&page=2&page_size=20 HTTP/1.1"
    );

    let view = poll.view();
    assert_eq!(view.page, 2);
    assert_eq!(view.page_count, 2);
    assert_eq!(view.rows.len(), 1);
}

#[tokio::test]
async fn http_error_status_is_transport_failure() {
    let (endpoint, _requests) = serve(vec![(500, r#"{"error":"boom"}"#)]).await;
    let source = assert_ok!(HttpServiceSource::new(&endpoint, Duration::from_secs(5)));

    let err = source.fetch_list(None).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

#[tokio::test]
async fn malformed_listing_is_shape_failure() {
    let (endpoint, _requests) = serve(vec![(200, r#"[{"port":"80","status":"LISTEN"}]"#)]).await;
    let source = assert_ok!(HttpServiceSource::new(&endpoint, Duration::from_secs(5)));
    let poll = PollLoop::new(source, PollOptions::default());

    assert_eq!(poll.refresh().await, CycleOutcome::Failed);
    let state = poll.state();
    assert_eq!(state.phase, Phase::Failed);
    assert_eq!(
        state.error.map(|e| e.message),
        Some("Invalid data from server".to_string())
    );
}

#[tokio::test]
async fn fetches_single_service_detail() {
    let (endpoint, mut requests) = serve(vec![(
        200,
        r#"{"port":27017,"status":"LISTEN","process":"mongod","pid":812}"#,
    )])
    .await;
    let source = assert_ok!(HttpServiceSource::new(&endpoint, Duration::from_secs(5)));
    let poll = PollLoop::new(source, PollOptions::default());

    let record = assert_ok!(poll.fetch_detail(27017).await);
    assert_eq!(requests.recv().await.unwrap(), "GET /27017 HTTP/1.1");
    assert_eq!(record.pid, Some(812));
    assert_eq!(record.recognized().map(|r| r.id), Some("mongodb"));
    assert_eq!(poll.state().revision, 0);
}
