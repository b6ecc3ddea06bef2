use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use trip_planner::error::PlannerError;
use trip_planner::planning_service::{PlanningServiceClient, PlanningServiceConfig};
use trip_planner::traits::{PlannerBackend, PlanningTask};

/// Serves one request with `status` and `body`, then closes. The handle
/// yields the request line and the request body.
fn serve_once(
    status: &'static str,
    body: &'static str,
    delay: Duration,
) -> (String, JoinHandle<(String, String)>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        let mut content_length = 0;
        loop {
            let mut header = String::new();
            reader.read_line(&mut header).unwrap();
            if header == "\r\n" || header.is_empty() {
                break;
            }
            let lower = header.to_ascii_lowercase();
            if let Some(value) = lower.strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap();
            }
        }
        let mut request_body = vec![0; content_length];
        reader.read_exact(&mut request_body).unwrap();

        thread::sleep(delay);
        let _ = write!(
            stream,
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        (request_line.trim().to_string(), String::from_utf8(request_body).unwrap())
    });

    (base_url, handle)
}

fn client(base_url: String, timeout_secs: u64) -> PlanningServiceClient {
    PlanningServiceClient::new(PlanningServiceConfig {
        base_url,
        timeout_secs,
    })
    .unwrap()
}

fn task() -> PlanningTask {
    PlanningTask {
        domain: "(define (domain tokyo_trip))".to_string(),
        problem: "(define (problem tokyo_trip_plan))".to_string(),
    }
}

#[test]
fn test_solved_plan_is_joined() {
    let (url, server) = serve_once(
        "200 OK",
        concat!(
            r#"{"status":"ok","result":{"plan":["#,
            r#"{"name":"(visit senso_ji day1 ts_8)"},"#,
            r#"{"name":"(move senso_ji akihabara day1 ts_10)"}]}}"#,
        ),
        Duration::ZERO,
    );

    let text = client(format!("{url}/"), 5).solve(&task()).unwrap();
    assert_eq!(text, "(visit senso_ji day1 ts_8)\n(move senso_ji akihabara day1 ts_10)");

    let (request_line, body) = server.join().unwrap();
    assert!(request_line.starts_with("POST /solve "), "{request_line}");
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["domain"], task().domain);
    assert_eq!(body["problem"], task().problem);
}

#[test]
fn test_error_status_is_no_plan() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"status":"error","result":"goal can be simplified to FALSE"}"#,
        Duration::ZERO,
    );
    let err = client(url, 5).solve(&task()).unwrap_err();
    assert!(matches!(err, PlannerError::NoPlanFound(message) if message.contains("FALSE")));
    server.join().unwrap();
}

#[test]
fn test_empty_plan_is_no_plan() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"status":"ok","result":{"plan":[]}}"#,
        Duration::ZERO,
    );
    assert!(matches!(client(url, 5).solve(&task()), Err(PlannerError::NoPlanFound(_))));
    server.join().unwrap();
}

#[test]
fn test_server_error_is_invocation_failure() {
    let (url, server) = serve_once("500 Internal Server Error", "{}", Duration::ZERO);
    assert!(matches!(client(url, 5).solve(&task()), Err(PlannerError::InvocationFailed(_))));
    server.join().unwrap();
}

#[test]
fn test_unreachable_service_is_invocation_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    assert!(matches!(client(url, 5).solve(&task()), Err(PlannerError::InvocationFailed(_))));
}

#[test]
fn test_slow_service_times_out() {
    let (url, _server) = serve_once(
        "200 OK",
        r#"{"status":"ok","result":{"plan":[]}}"#,
        Duration::from_secs(3),
    );
    let err = client(url, 1).solve(&task()).unwrap_err();
    assert!(matches!(err, PlannerError::Timeout(timeout) if timeout == Duration::from_secs(1)));
}
