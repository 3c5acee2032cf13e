use auto_slides::http::RetryPolicy;
use auto_slides::{GeminiClient, ImageSearch, PexelsClient, SlidesError, TextGenerator};
use std::io::Read;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;
use tiny_http::{Response, Server};

/// What the mock server saw for one request.
#[derive(Debug, Clone)]
struct Captured {
    url: String,
    body: String,
    authorization: Option<String>,
}

/// Serve requests on a local port until idle, answering with `handler`.
/// Returns the base URL and a channel of captured requests.
fn spawn_server<F>(handler: F) -> (String, mpsc::Receiver<Captured>)
where
    F: Fn(&Captured, usize, &str) -> (u16, Vec<u8>) + Send + 'static,
{
    let server = Server::http("127.0.0.1:0").expect("Failed to start mock server");
    let addr = server
        .server_addr()
        .to_ip()
        .expect("Mock server has no IP address");
    let base = format!("http://{}", addr);
    let (tx, rx) = mpsc::channel();

    let thread_base = base.clone();
    thread::spawn(move || {
        let mut count = 0;
        while let Ok(Some(mut request)) = server.recv_timeout(Duration::from_secs(10)) {
            let mut body = String::new();
            let _ = request.as_reader().read_to_string(&mut body);
            let authorization = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Authorization"))
                .map(|h| h.value.as_str().to_string());
            let captured = Captured {
                url: request.url().to_string(),
                body,
                authorization,
            };

            let (status, bytes) = handler(&captured, count, &thread_base);
            count += 1;
            let _ = tx.send(captured);
            let _ = request.respond(Response::from_data(bytes).with_status_code(status));
        }
    });

    (base, rx)
}

fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_delay: Duration::from_millis(10),
    }
}

const GEMINI_REPLY: &str = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"**Topic:** recursion\n"},{"text":"1. **Base case**: stopping condition"}]}}]}"#;

#[test]
fn test_gemini_client_sends_prompt_and_joins_parts() {
    let (base, requests) = spawn_server(|_, _, _| (200, GEMINI_REPLY.as_bytes().to_vec()));
    let client = GeminiClient::new("secret", "test-model", &base, Duration::from_secs(5))
        .expect("Failed to build client");

    let text = client
        .summarize("Summarize this.", "recursion")
        .expect("Request failed");

    assert_eq!(
        text,
        "**Topic:** recursion\n1. **Base case**: stopping condition"
    );

    let captured = requests.recv_timeout(Duration::from_secs(5)).expect("No request seen");
    assert_eq!(
        captured.url,
        "/v1beta/models/test-model:generateContent?key=secret"
    );
    let body: serde_json::Value = serde_json::from_str(&captured.body).expect("Body is not JSON");
    assert_eq!(body["contents"][0]["role"], "user");
    assert_eq!(
        body["contents"][0]["parts"][0]["text"],
        "Summarize this. Topic: recursion"
    );
}

#[test]
fn test_gemini_client_retries_server_errors() {
    let (base, requests) = spawn_server(|_, count, _| {
        if count == 0 {
            (503, b"busy".to_vec())
        } else {
            (200, GEMINI_REPLY.as_bytes().to_vec())
        }
    });
    let client = GeminiClient::new("secret", "test-model", &base, Duration::from_secs(5))
        .expect("Failed to build client")
        .with_retry(fast_retry(3));

    let text = client.summarize("Summarize this.", "recursion").expect("Request failed");

    assert!(text.starts_with("**Topic:**"));
    assert!(requests.recv_timeout(Duration::from_secs(5)).is_ok());
    assert!(requests.recv_timeout(Duration::from_secs(5)).is_ok());
}

#[test]
fn test_gemini_client_does_not_retry_client_errors() {
    let (base, requests) = spawn_server(|_, _, _| (400, b"{\"error\":\"bad key\"}".to_vec()));
    let client = GeminiClient::new("wrong", "test-model", &base, Duration::from_secs(5))
        .expect("Failed to build client")
        .with_retry(fast_retry(3));

    let result = client.summarize("Summarize this.", "recursion");

    assert!(matches!(result, Err(SlidesError::HttpStatus { status: 400, .. })));
    assert!(requests.recv_timeout(Duration::from_secs(5)).is_ok());
    assert!(requests.recv_timeout(Duration::from_millis(300)).is_err());
}

#[test]
fn test_gemini_client_rejects_empty_reply() {
    let (base, _requests) = spawn_server(|_, _, _| (200, b"{\"candidates\":[]}".to_vec()));
    let client = GeminiClient::new("secret", "test-model", &base, Duration::from_secs(5))
        .expect("Failed to build client");

    let result = client.summarize("Summarize this.", "recursion");
    assert!(matches!(result, Err(SlidesError::UpstreamError(_))));
}

#[test]
fn test_pexels_client_searches_and_downloads() {
    let (base, requests) = spawn_server(|captured, _, base| {
        if captured.url.starts_with("/v1/search") {
            let reply = format!(
                r#"{{"photos":[{{"id":7,"src":{{"original":"{base}/photos/cat.png"}}}},{{"id":8,"src":{{"original":"{base}/photos/dog.png"}}}}]}}"#
            );
            (200, reply.into_bytes())
        } else {
            (200, b"fake-image-bytes".to_vec())
        }
    });
    let dest = TempDir::new().expect("Failed to create temp dir");
    let client = PexelsClient::new("pexels-key", &base, Duration::from_secs(5))
        .expect("Failed to build client");

    let paths = client
        .search_images("black cat", 1, dest.path())
        .expect("Search failed");

    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0], dest.path().join("cat.png"));
    assert_eq!(std::fs::read(&paths[0]).unwrap(), b"fake-image-bytes");

    let search = requests.recv_timeout(Duration::from_secs(5)).expect("No search seen");
    assert_eq!(search.url, "/v1/search?query=black+cat&per_page=1");
    assert_eq!(search.authorization.as_deref(), Some("pexels-key"));
    let download = requests.recv_timeout(Duration::from_secs(5)).expect("No download seen");
    assert_eq!(download.url, "/photos/cat.png");
}

#[test]
fn test_pexels_client_handles_no_results() {
    let (base, _requests) = spawn_server(|_, _, _| (200, b"{\"photos\":[]}".to_vec()));
    let dest = TempDir::new().expect("Failed to create temp dir");
    let client = PexelsClient::new("pexels-key", &base, Duration::from_secs(5))
        .expect("Failed to build client");

    let paths = client
        .search_images("nothing at all", 1, dest.path())
        .expect("Search failed");
    assert!(paths.is_empty());
}

#[test]
fn test_pexels_download_failure_is_skipped() {
    let (base, _requests) = spawn_server(|captured, _, base| {
        if captured.url.starts_with("/v1/search") {
            let reply = format!(
                r#"{{"photos":[{{"id":1,"src":{{"original":"{base}/photos/gone.png"}}}},{{"id":2,"src":{{"original":"{base}/photos/here.png"}}}}]}}"#
            );
            (200, reply.into_bytes())
        } else if captured.url.ends_with("gone.png") {
            (404, Vec::new())
        } else {
            (200, b"ok".to_vec())
        }
    });
    let dest = TempDir::new().expect("Failed to create temp dir");
    let client = PexelsClient::new("pexels-key", &base, Duration::from_secs(5))
        .expect("Failed to build client")
        .with_retry(fast_retry(1));

    let paths = client
        .search_images("things", 2, dest.path())
        .expect("Search failed");

    assert_eq!(paths, vec![dest.path().join("here.png")]);
}
