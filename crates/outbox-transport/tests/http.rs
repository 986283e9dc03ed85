// crates/outbox-transport/tests/http.rs
// ============================================================================
// Module: HTTP Replay Transport Tests
// Description: Replay fidelity, policy gating, and failure classification.
// Purpose: Validate writes go out with their original shape under strict limits.
// Dependencies: outbox-core, outbox-transport, tiny_http
// ============================================================================

//! ## Overview
//! Tests the HTTP transport for:
//! - Replay fidelity: method, path, headers, and body arrive unchanged.
//! - Reply semantics: 4xx/5xx from a reachable server is a reply, not an error.
//! - Policy gating: scheme restriction, host allowlist, redirects never followed.
//! - Failure classification: refused connections and timeouts map to their
//!   transport error variants.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeSet;
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use outbox_core::ReplayTransport;
use outbox_core::TransportError;
use outbox_core::WriteMethod;
use outbox_core::WriteRequest;
use outbox_transport::HttpReplayTransport;
use outbox_transport::HttpTransportConfig;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Creates a transport configured to reach the local test server.
fn local_transport() -> HttpReplayTransport {
    HttpReplayTransport::new(HttpTransportConfig {
        allow_http: true,
        timeout_ms: 5_000,
        ..HttpTransportConfig::default()
    })
    .unwrap()
}

/// Observed shape of one request received by the test server.
struct ReceivedRequest {
    /// Request method label.
    method: String,
    /// Request path and query.
    path: String,
    /// Header pairs, lowercased names.
    headers: Vec<(String, String)>,
    /// Request body bytes.
    body: Vec<u8>,
}

/// Spawns a server answering one request and reporting what it received.
fn spawn_recording_server(
    status: u16,
    body: &'static str,
) -> (String, mpsc::Receiver<ReceivedRequest>, thread::JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let url = format!("http://{addr}");
    let (report, received) = mpsc::channel();

    let handle = thread::spawn(move || {
        if let Ok(mut request) = server.recv() {
            let mut request_body = Vec::new();
            let _ = request.as_reader().read_to_end(&mut request_body);
            let observed = ReceivedRequest {
                method: request.method().to_string(),
                path: request.url().to_string(),
                headers: request
                    .headers()
                    .iter()
                    .map(|header| {
                        (header.field.as_str().to_string().to_lowercase(), header.value.to_string())
                    })
                    .collect(),
                body: request_body,
            };
            let _ = report.send(observed);
            let response = Response::from_string(body).with_status_code(status);
            let _ = request.respond(response);
        }
    });

    (url, received, handle)
}

/// Spawns a server answering one request with the given status and body.
fn spawn_server(status: u16, body: &'static str) -> (String, thread::JoinHandle<()>) {
    let (url, _received, handle) = spawn_recording_server(status, body);
    (url, handle)
}

// ============================================================================
// SECTION: Replay Fidelity
// ============================================================================

#[test]
fn request_shape_arrives_unchanged() {
    let (url, received, handle) = spawn_recording_server(200, "ok");
    let transport = local_transport();
    let request = WriteRequest::new(format!("{url}/items?source=queue"), WriteMethod::Put)
        .header("content-type", "application/json")
        .header("x-request-token", "abc123")
        .body(br#"{"op":"update"}"#.to_vec());

    let reply = transport.send(&request).unwrap();
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, b"ok");

    let observed = received.recv().unwrap();
    assert_eq!(observed.method, "PUT");
    assert_eq!(observed.path, "/items?source=queue");
    assert_eq!(observed.body, br#"{"op":"update"}"#);
    let has_header = |name: &str, value: &str| {
        observed.headers.iter().any(|(field, found)| field == name && found == value)
    };
    assert!(has_header("content-type", "application/json"));
    assert!(has_header("x-request-token", "abc123"));
    handle.join().unwrap();
}

#[test]
fn delete_requests_carry_no_body() {
    let (url, received, handle) = spawn_recording_server(204, "");
    let transport = local_transport();
    let request = WriteRequest::new(format!("{url}/items/7"), WriteMethod::Delete);

    let reply = transport.send(&request).unwrap();
    assert_eq!(reply.status, 204);

    let observed = received.recv().unwrap();
    assert_eq!(observed.method, "DELETE");
    assert!(observed.body.is_empty());
    handle.join().unwrap();
}

// ============================================================================
// SECTION: Reply Semantics
// ============================================================================

#[test]
fn server_errors_are_replies_not_transport_errors() {
    for status in [400_u16, 404, 422, 500, 503] {
        let (url, handle) = spawn_server(status, "answer");
        let transport = local_transport();
        let request = WriteRequest::new(format!("{url}/items"), WriteMethod::Post);

        let reply = transport.send(&request).unwrap();
        assert_eq!(reply.status, status);
        assert_eq!(reply.body, b"answer");
        handle.join().unwrap();
    }
}

#[test]
fn redirects_are_returned_not_followed() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let url = format!("http://{addr}/items");
    let handle = thread::spawn(move || {
        if let Ok(request) = server.recv() {
            let location =
                Header::from_bytes(&b"Location"[..], &b"http://127.0.0.1:1/elsewhere"[..]).unwrap();
            let response = Response::from_string("moved").with_status_code(302).with_header(location);
            let _ = request.respond(response);
        }
    });

    let transport = local_transport();
    let reply = transport.send(&WriteRequest::new(url, WriteMethod::Post)).unwrap();
    assert_eq!(reply.status, 302, "redirect status surfaces to the caller");
    handle.join().unwrap();
}

#[test]
fn oversized_response_bodies_are_truncated() {
    let (url, handle) = spawn_server(200, "0123456789abcdef");
    let transport = HttpReplayTransport::new(HttpTransportConfig {
        allow_http: true,
        timeout_ms: 5_000,
        max_response_bytes: 8,
        ..HttpTransportConfig::default()
    })
    .unwrap();

    let reply = transport.send(&WriteRequest::new(format!("{url}/items"), WriteMethod::Post)).unwrap();
    assert_eq!(reply.status, 200, "status arrives intact");
    assert_eq!(reply.body, b"01234567");
    handle.join().unwrap();
}

// ============================================================================
// SECTION: Policy Gating
// ============================================================================

#[test]
fn cleartext_http_is_rejected_by_default() {
    let transport = HttpReplayTransport::new(HttpTransportConfig::default()).unwrap();
    let request = WriteRequest::new("http://api.example.com/items".to_string(), WriteMethod::Post);

    let err = transport.send(&request).unwrap_err();
    assert!(matches!(err, TransportError::Invalid(_)));
}

#[test]
fn unknown_schemes_are_rejected() {
    let transport = local_transport();
    let request = WriteRequest::new("ftp://api.example.com/items".to_string(), WriteMethod::Post);

    let err = transport.send(&request).unwrap_err();
    assert!(matches!(err, TransportError::Invalid(_)));
}

#[test]
fn hosts_outside_the_allowlist_are_rejected() {
    let mut allowed_hosts = BTreeSet::new();
    allowed_hosts.insert("api.example.com".to_string());
    let transport = HttpReplayTransport::new(HttpTransportConfig {
        allow_http: true,
        allowed_hosts: Some(allowed_hosts),
        ..HttpTransportConfig::default()
    })
    .unwrap();
    let request = WriteRequest::new("http://127.0.0.1/items".to_string(), WriteMethod::Post);

    let err = transport.send(&request).unwrap_err();
    assert!(matches!(err, TransportError::Invalid(_)));
}

#[test]
fn malformed_urls_are_rejected_before_io() {
    let transport = local_transport();
    let request = WriteRequest::new("not a url".to_string(), WriteMethod::Post);

    let err = transport.send(&request).unwrap_err();
    assert!(matches!(err, TransportError::Invalid(_)));
}

// ============================================================================
// SECTION: Failure Classification
// ============================================================================

#[test]
fn refused_connections_are_unreachable() {
    // Bind then drop a listener so the port is very likely unoccupied.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = local_transport();
    let request = WriteRequest::new(format!("http://{addr}/items"), WriteMethod::Post);

    let err = transport.send(&request).unwrap_err();
    assert!(matches!(err, TransportError::Unreachable(_)));
}

#[test]
fn hung_servers_time_out() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    // Accept the connection but never answer it.
    let handle = thread::spawn(move || {
        if let Ok((stream, _peer)) = listener.accept() {
            thread::sleep(Duration::from_millis(600));
            drop(stream);
        }
    });

    let transport = HttpReplayTransport::new(HttpTransportConfig {
        allow_http: true,
        timeout_ms: 150,
        ..HttpTransportConfig::default()
    })
    .unwrap();
    let request = WriteRequest::new(format!("http://{addr}/items"), WriteMethod::Post);

    let err = transport.send(&request).unwrap_err();
    assert!(matches!(err, TransportError::Timeout(_)));
    handle.join().unwrap();
}
