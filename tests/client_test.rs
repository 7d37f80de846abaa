//! Client connection-failure and lifecycle tests.

use forgenet::base::{Host, NetError};
use forgenet::client::Client;
use forgenet::http::{Http, Request};
use std::time::Duration;

#[test]
fn test_unresolvable_host_is_hard_failure() {
    let mut client = Client::builder(Http)
        .resolve_timeout(Duration::from_secs(5))
        .build();
    let host = Host::new("definitely-not-a-real-domain.invalid", "80");
    assert!(matches!(
        client.connect(&host),
        Err(NetError::ConnectionFailed)
    ));
    assert!(!client.is_connected());
}

#[test]
fn test_refused_port_is_typed_error() {
    // Bind-then-drop guarantees nothing is listening on the port.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut client = Client::builder(Http)
        .connect_timeout(Duration::from_secs(2))
        .build();
    let err = client
        .connect(&Host::new("127.0.0.1", port.to_string()))
        .unwrap_err();
    assert!(err.is_connection_error() || err.is_timeout());
}

#[test]
fn test_io_before_connect_reports_not_connected() {
    let mut client = Client::new(Http);
    assert!(matches!(
        client.send(&Request::get("/")),
        Err(NetError::NotConnected)
    ));
    assert!(matches!(
        client.recv_response(),
        Err(NetError::NotConnected)
    ));
}

#[test]
fn test_shutdown_then_io_reports_not_connected() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let mut client = Client::new(Http);
    client
        .connect(&Host::new("127.0.0.1", port.to_string()))
        .unwrap();
    assert!(client.is_connected());

    client.shutdown();
    client.shutdown(); // idempotent
    assert!(!client.is_connected());
    assert!(matches!(
        client.send(&Request::get("/")),
        Err(NetError::NotConnected)
    ));
}
