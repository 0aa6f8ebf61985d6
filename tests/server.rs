// End-to-end scenarios driving a real `MockServer` over real sockets, the
// way `xaviershay-hyper/tests/server.rs` drives a real `hyper::Server`.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use mockwire::http::{self, Method};
use mockwire::telnet::TelnetMock;
use mockwire::MockServer;

fn connect(port: u16) -> TcpStream {
    TcpStream::connect(("127.0.0.1", port)).unwrap()
}

#[test]
fn echo_prefix() {
    let mut mock = TelnetMock::new();
    mock.when("hello world").reply("hola mundo");
    let mut server = MockServer::new(mock.build());
    let port = server.start(0).unwrap();

    let mut client = connect(port);
    client.write_all(b"hello world").unwrap();
    let mut reply = [0u8; 10];
    client.read_exact(&mut reply).unwrap();
    assert_eq!(&reply, b"hola mundo");

    server.stop();
    server.wait();
}

#[test]
fn rotation_round_robins_equal_priority_expectations() {
    let mut mock = TelnetMock::new();
    mock.when("hello").reply("+");
    mock.when("hello").reply("-");
    let mut server = MockServer::new(mock.build());
    let port = server.start(0).unwrap();

    let mut client = connect(port);
    client.write_all(b"hellohellohellohello").unwrap();
    let mut reply = [0u8; 4];
    client.read_exact(&mut reply).unwrap();
    assert_eq!(&reply, b"+-+-");

    server.stop();
    server.wait();
}

#[test]
fn times_limit_then_fallback() {
    let mut mock = TelnetMock::new();
    mock.when("A").reply("+").times(2);
    mock.when("A").reply("-");
    let mut server = MockServer::new(mock.build());
    let port = server.start(0).unwrap();

    let mut client = connect(port);
    client.write_all(b"AAAAAA").unwrap();
    let mut reply = [0u8; 6];
    client.read_exact(&mut reply).unwrap();
    assert_eq!(&reply, b"+-+---");

    server.stop();
    server.wait();
}

#[test]
fn close_connection_surfaces_as_a_read_error_or_eof() {
    let mut mock = TelnetMock::new();
    mock.when("hello world").close_connection();
    let mut server = MockServer::new(mock.build());
    let port = server.start(0).unwrap();

    let mut client = connect(port);
    client.write_all(b"hello world").unwrap();
    let mut buf = [0u8; 1];
    let result = client.read(&mut buf);
    // Either a hard error or a clean EOF (0 bytes) signals the closed half;
    // a real byte reply would be the only failure mode here.
    match result {
        Ok(n) => assert_eq!(n, 0),
        Err(_) => {}
    }

    server.stop();
    server.wait();
}

#[test]
fn freeze_delays_the_reply_by_roughly_the_requested_duration() {
    let mut mock = TelnetMock::new();
    mock.when("go").freeze(50_000).reply("done");
    let mut server = MockServer::new(mock.build());
    let port = server.start(0).unwrap();

    let mut client = connect(port);
    let start = Instant::now();
    client.write_all(b"go").unwrap();
    let mut reply = [0u8; 4];
    client.read_exact(&mut reply).unwrap();
    assert!(start.elapsed() >= Duration::from_micros(50_000));
    assert_eq!(&reply, b"done");

    server.stop();
    server.wait();
}

#[test]
fn http_structural_match() {
    let mut mock = http::HttpMock::new();
    mock.when(http::GET()).reply(200);
    let mut server = MockServer::new(mock.build());
    let port = server.start(0).unwrap();

    let mut client = connect(port);
    client.write_all(b"GET / HTTP/1.1\r\n\r\n").unwrap();
    let mut reply = [0u8; 19];
    client.read_exact(&mut reply).unwrap();
    assert_eq!(&reply, b"HTTP/1.1 200 OK\r\n\r\n");

    server.stop();
    server.wait();
}

#[test]
fn http_fallback_between_two_uri_specific_expectations() {
    let mut mock = http::HttpMock::new();
    mock.when(http::GET().uri("/foo")).reply(200);
    mock.when(http::GET().uri("/bar")).reply(404);
    let mut server = MockServer::new(mock.build());
    let port = server.start(0).unwrap();

    let mut client = connect(port);
    client
        .write_all(b"GET /foo HTTP/1.1\r\n\r\nGET /bar HTTP/1.1\r\n\r\n")
        .unwrap();

    let mut first = [0u8; 19];
    client.read_exact(&mut first).unwrap();
    assert_eq!(&first, b"HTTP/1.1 200 OK\r\n\r\n");

    let mut second = [0u8; 24];
    client.read_exact(&mut second).unwrap();
    assert_eq!(&second, b"HTTP/1.1 404 Not Found\r\n\r\n");

    server.stop();
    server.wait();
}

#[test]
fn unexpected_only_fires_once_nothing_more_specific_matched() {
    let mut mock = http::HttpMock::new();
    mock.when(http::GET().uri("/known")).reply(200);
    mock.when(http::unexpected()).order(1000).reply(404);
    let mut server = MockServer::new(mock.build());
    let port = server.start(0).unwrap();

    let mut client = connect(port);
    client
        .write_all(&http::serialize_request(Method::Get, "/missing", &[], b""))
        .unwrap();
    let mut reply = [0u8; 24];
    client.read_exact(&mut reply).unwrap();
    assert_eq!(&reply, b"HTTP/1.1 404 Not Found\r\n\r\n");

    server.stop();
    server.wait();
}

#[test]
fn shutdown_server_action_stops_the_acceptor() {
    let mut mock = TelnetMock::new();
    mock.when("die").shutdown_server();
    let mut server = MockServer::new(mock.build());
    let port = server.start(0).unwrap();

    let mut client = connect(port);
    client.write_all(b"die").unwrap();

    server.wait();
    assert!(!server.running());
}

#[test]
fn restart_cycle_serves_requests_again_on_a_new_port() {
    let mut mock = TelnetMock::new();
    mock.when("ping").reply("pong");
    let mut server = MockServer::new(mock.build());

    let first_port = server.start(0).unwrap();
    server.stop();
    server.wait();

    let second_port = server.start(0).unwrap();
    let mut client = connect(second_port);
    client.write_all(b"ping").unwrap();
    let mut reply = [0u8; 4];
    client.read_exact(&mut reply).unwrap();
    assert_eq!(&reply, b"pong");

    server.stop();
    server.wait();
    let _ = first_port;
}
