mod common;

use assert_cmd::prelude::*;
use common::TestServer;
use predicates::str::contains;
use std::process::Command;

fn client(server: &TestServer) -> Command {
    let mut cmd = Command::cargo_bin("kvd-client").unwrap();
    cmd.args(&["--url", &server.url()]);
    cmd
}

#[test]
fn cli_no_args() {
    Command::cargo_bin("kvd-client").unwrap().assert().failure();
}

#[test]
fn cli_set_get_rm() {
    let server = TestServer::start();

    client(&server).args(&["set", "foo=bar"]).assert().success();

    client(&server)
        .args(&["get", "foo"])
        .assert()
        .success()
        .stdout("bar\n");

    client(&server).args(&["rm", "foo"]).assert().success();

    client(&server)
        .args(&["get", "foo"])
        .assert()
        .failure()
        .stderr(contains("key not found"));
}

#[test]
fn cli_bulk() {
    let server = TestServer::start();

    client(&server)
        .args(&["set", "test=true", "cat=meow", "dog=woof"])
        .assert()
        .success();

    client(&server)
        .args(&["get", "test", "cat"])
        .assert()
        .success()
        .stdout("test: true\ncat: meow\n");

    client(&server)
        .args(&["rm", "cat", "dog"])
        .assert()
        .success();

    client(&server)
        .args(&["metrics"])
        .assert()
        .success()
        .stdout(contains("Keys Stored: 1"))
        .stdout(contains("Delete Operations: 2"));
}

#[test]
fn cli_malformed_pair() {
    let server = TestServer::start();

    client(&server)
        .args(&["set", "novalue"])
        .assert()
        .failure()
        .stderr(contains("expected KEY=VALUE"));
}

#[test]
fn cli_status() {
    let server = TestServer::start();

    client(&server)
        .args(&["status"])
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn server_rejects_bad_threads() {
    Command::cargo_bin("kvd-server")
        .unwrap()
        .args(&["--threads", "zero"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn server_reports_bind_failure() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = taken.local_addr().unwrap().to_string();

    Command::cargo_bin("kvd-server")
        .unwrap()
        .args(&["--addr", &addr])
        .assert()
        .failure()
        .code(1)
        .stderr(contains(format!("failed to bind {}", addr)));
}
