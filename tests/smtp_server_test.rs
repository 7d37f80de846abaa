//! SMTP server/client integration tests over loopback.

use forgenet::base::Host;
use forgenet::client::Client;
use forgenet::server::Server;
use forgenet::smtp::{Command, Request, Response, Smtp, Status};

fn mail_server() -> Server<Smtp> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    Server::builder(Smtp)
        .rule(
            |req: &Request| matches!(req.command, Command::Helo | Command::Ehlo),
            |req: &Request| {
                Response::new(Status::Ok).with_message(format!("Hello {}", req.argument))
            },
        )
        .rule(
            |req: &Request| req.command == Command::Noop,
            |_: &Request| Response::new(Status::Ok),
        )
        .build()
}

fn serve_loopback(server: &mut Server<Smtp>) -> Host {
    server.serve(&":0".parse().unwrap()).unwrap();
    let port = server.local_addr().unwrap().port();
    Host::new("localhost", port.to_string())
}

#[test]
fn test_greeting_arrives_before_any_command() {
    let mut server = mail_server();
    let host = serve_loopback(&mut server);

    let mut client = Client::new(Smtp);
    client.connect(&host).unwrap();
    let greeting = client.recv_response().unwrap();
    assert_eq!(greeting.status, Status::ServiceReady);
}

#[test]
fn test_helo_round_trip() {
    let mut server = mail_server();
    let host = serve_loopback(&mut server);

    let mut client = Client::new(Smtp);
    client.connect(&host).unwrap();
    client.recv_response().unwrap();

    let reply = client
        .exchange(&Request::new(Command::Helo).with_argument("client.example.com"))
        .unwrap();
    assert_eq!(reply.status, Status::Ok);
    assert_eq!(reply.message, "Hello client.example.com");
}

#[test]
fn test_unmatched_command_draws_502() {
    let mut server = mail_server();
    let host = serve_loopback(&mut server);

    let mut client = Client::new(Smtp);
    client.connect(&host).unwrap();
    client.recv_response().unwrap();

    let reply = client.exchange(&Request::new(Command::Vrfy)).unwrap();
    assert_eq!(reply.status, Status::CommandNotImplemented);
}

#[test]
fn test_quit_gets_closing_reply_then_close() {
    let mut server = mail_server();
    let host = serve_loopback(&mut server);

    let mut client = Client::new(Smtp);
    client.connect(&host).unwrap();
    client.recv_response().unwrap();

    let reply = client.exchange(&Request::new(Command::Quit)).unwrap();
    assert_eq!(reply.status, Status::ServiceClosing);

    // The server hung up after QUIT; the next read sees EOF.
    client.send(&Request::new(Command::Noop)).unwrap();
    assert!(client.recv_response().is_err());
}
