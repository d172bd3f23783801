mod common;

use common::TestServer;
use kvd::ServerConfig;
use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

fn idle_server() -> TestServer {
    TestServer::start_with(ServerConfig {
        idle_timeout: Duration::from_millis(300),
        shutdown_timeout: Duration::from_secs(1),
        ..ServerConfig::default()
    })
}

/// Read until the server closes the connection, returning everything read.
fn read_until_closed(stream: &mut TcpStream) -> Vec<u8> {
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();

    let mut received = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => return received,
            Ok(n) => received.extend_from_slice(&buf[..n]),
            Err(ref e) if e.kind() == ErrorKind::ConnectionReset => return received,
            Err(e) => panic!("connection was not closed: {}", e),
        }
    }
}

#[test]
fn silent_connection_is_closed() {
    let server = idle_server();
    let mut stream = TcpStream::connect(server.addr).unwrap();

    let start = Instant::now();
    let received = read_until_closed(&mut stream);

    assert!(received.is_empty());
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn keep_alive_connection_is_closed_once_idle() {
    let server = idle_server();
    let mut stream = TcpStream::connect(server.addr).unwrap();

    stream
        .write_all(b"PUT /v1/foo HTTP/1.1\r\nHost: kvd\r\nContent-Length: 3\r\n\r\nbar")
        .unwrap();

    let received = String::from_utf8(read_until_closed(&mut stream)).unwrap();
    assert!(received.starts_with("HTTP/1.1 201"), "got: {}", received);
}

#[test]
fn active_connection_survives() {
    let server = idle_server();
    let mut stream = TcpStream::connect(server.addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();

    // Each request lands well inside the idle window of the previous one.
    for _ in 0..4 {
        std::thread::sleep(Duration::from_millis(100));
        stream
            .write_all(b"GET /status HTTP/1.1\r\nHost: kvd\r\n\r\n")
            .unwrap();

        let mut buf = [0u8; 1024];
        let n = stream.read(&mut buf).unwrap();
        assert!(buf[..n].starts_with(b"HTTP/1.1 200"));
    }
}
