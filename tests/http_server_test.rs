//! HTTP server/client integration tests over loopback.

use forgenet::base::{Host, NetError};
use forgenet::client::Client;
use forgenet::http::{Http, Request, Response, Version};
use forgenet::server::Server;
use std::time::{Duration, Instant};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn hello_server() -> Server<Http> {
    init_logging();
    Server::builder(Http)
        .rule(
            |req: &Request| req.target == "/hello",
            |req: &Request| {
                let mut resp = Response::ok(&b"hi there"[..]);
                if req.version == Version::H09 {
                    resp = resp.with_version(Version::H09);
                }
                resp
            },
        )
        .build()
}

fn serve_loopback(server: &mut Server<Http>) -> Host {
    server.serve(&":0".parse().unwrap()).unwrap();
    let port = server.local_addr().unwrap().port();
    Host::new("localhost", port.to_string())
}

#[test]
fn test_ephemeral_bind_reports_nonzero_port() {
    let mut server = hello_server();
    server.serve(&":0".parse().unwrap()).unwrap();
    assert!(server.is_listening());
    assert_ne!(server.local_addr().unwrap().port(), 0);
    server.close();
    assert!(!server.is_listening());
}

#[test]
fn test_loopback_round_trip_is_fast() {
    let mut server = hello_server();
    let host = serve_loopback(&mut server);

    let mut client = Client::new(Http);
    client.connect(&host).unwrap();

    let start = Instant::now();
    let response = client.exchange(&Request::get("/hello")).unwrap();
    assert!(start.elapsed() < Duration::from_millis(100));
    assert_eq!(response.status, 200);
    assert_eq!(&response.body[..], b"hi there");
}

#[test]
fn test_unmatched_target_draws_404_zero_length() {
    let mut server = hello_server();
    let host = serve_loopback(&mut server);

    let mut client = Client::new(Http);
    client.connect(&host).unwrap();
    let response = client.exchange(&Request::get("/missing")).unwrap();
    assert_eq!(response.status, 404);
    assert_eq!(response.headers.content_length(), Some(0));
    assert!(response.body.is_empty());
}

#[test]
fn test_keep_alive_serves_multiple_requests() {
    let mut server = hello_server();
    let host = serve_loopback(&mut server);

    let mut client = Client::new(Http);
    client.connect(&host).unwrap();
    for _ in 0..3 {
        let response = client.exchange(&Request::get("/hello")).unwrap();
        assert_eq!(response.status, 200);
    }
}

#[test]
fn test_http09_request_gets_body_only_response() {
    let mut server = hello_server();
    let host = serve_loopback(&mut server);

    let mut client = Client::new(Http);
    client.connect(&host).unwrap();
    let request = Request::get("/hello").with_version(Version::H09);
    let response = client.exchange(&request).unwrap();
    assert_eq!(response.version, Version::H09);
    assert_eq!(&response.body[..], b"hi there");
}

#[test]
fn test_first_matching_rule_wins() {
    let mut server = Server::builder(Http)
        .rule(
            |req: &Request| req.target.starts_with('/'),
            |_: &Request| Response::ok(&b"first"[..]),
        )
        .rule(
            |req: &Request| req.target == "/hello",
            |_: &Request| Response::ok(&b"second"[..]),
        )
        .build();
    let host = serve_loopback(&mut server);

    let mut client = Client::new(Http);
    client.connect(&host).unwrap();
    let response = client.exchange(&Request::get("/hello")).unwrap();
    assert_eq!(&response.body[..], b"first");
}

#[test]
fn test_idle_connection_is_force_closed() {
    let mut server = Server::builder(Http)
        .read_idle_timeout(Duration::from_millis(100))
        .rule(
            |_: &Request| true,
            |_: &Request| Response::ok(&b"ok"[..]),
        )
        .build();
    let host = serve_loopback(&mut server);

    let mut client = Client::new(Http);
    client.connect(&host).unwrap();
    std::thread::sleep(Duration::from_millis(400));
    // The worker timed out and closed the socket; the next exchange
    // cannot complete.
    assert!(client.exchange(&Request::get("/")).is_err());
}

#[test]
fn test_close_unblocks_live_connections() {
    let mut server = hello_server();
    let host = serve_loopback(&mut server);

    let mut client = Client::new(Http);
    client.connect(&host).unwrap();

    let start = Instant::now();
    server.close();
    // close() interrupted the idle worker instead of waiting out its
    // read timeout.
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_worker_setup_hook_customizes_each_connection() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let setups = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&setups);
    let mut server = Server::builder(Http)
        .rule(
            |_: &Request| true,
            |_: &Request| Response::ok(&b"ok"[..]),
        )
        .worker_setup(move |conn| {
            seen.fetch_add(1, Ordering::SeqCst);
            // Override the default idle timeout for this connection.
            let _ = conn.set_recv_timeout(Some(Duration::from_millis(100)));
        })
        .build();
    let host = serve_loopback(&mut server);

    let mut client = Client::new(Http);
    client.connect(&host).unwrap();
    let response = client.exchange(&Request::get("/")).unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(setups.load(Ordering::SeqCst), 1);

    // The hook's tightened timeout (not the 30s default) governs the
    // connection: idling past it gets the socket force-closed.
    std::thread::sleep(Duration::from_millis(400));
    assert!(client.exchange(&Request::get("/")).is_err());
}

#[test]
fn test_serve_twice_is_rejected() {
    let mut server = hello_server();
    server.serve(&":0".parse().unwrap()).unwrap();
    assert!(matches!(
        server.serve(&":0".parse().unwrap()),
        Err(NetError::AlreadyListening)
    ));
}
