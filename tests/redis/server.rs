use std::{io::Write, net::SocketAddr, time::Duration};

use redis_streams_server::server::{CliError, RedisServer};
use tempfile::TempDir;

use crate::test_utils::{TestClient, TestUtils};

fn args(flags: &[&str]) -> Vec<String> {
    std::iter::once("redis-streams-server")
        .chain(flags.iter().copied())
        .map(String::from)
        .collect()
}

#[test]
fn test_redis_server_creation_with_flags() {
    let test_cases = vec![
        (args(&[]), (6379, "/tmp/redis-file", "rdbfile")),
        (args(&["--port", "6677"]), (6677, "/tmp/redis-file", "rdbfile")),
        (
            args(&["--dbfilename", "dump.rdb", "--dir", "/var/lib/redis"]),
            (6379, "/var/lib/redis", "dump.rdb"),
        ),
    ];

    for (arguments, (port, dir, dbfilename)) in test_cases {
        let server = RedisServer::new(arguments.clone()).unwrap();

        assert_eq!(server.port, port, "parsing {:?}", arguments);
        assert_eq!(server.config_value("dir"), Some(dir), "parsing {:?}", arguments);
        assert_eq!(
            server.config_value("dbfilename"),
            Some(dbfilename),
            "parsing {:?}",
            arguments
        );
    }
}

#[test]
fn test_redis_server_creation_with_invalid_flags() {
    let test_cases = vec![
        (args(&["--port", "invalid"]), CliError::InvalidCommandLineFlagValue),
        (args(&["--port", "70000"]), CliError::InvalidCommandLineFlagValue),
        (args(&["--dbfilename"]), CliError::InvalidCommandLineFlagValue),
        (args(&["--replicaof", "localhost 6379"]), CliError::InvalidCommandLineFlag),
    ];

    for (arguments, expected_error) in test_cases {
        assert_eq!(
            RedisServer::new(arguments.clone()),
            Err(expected_error),
            "parsing {:?}",
            arguments
        );
    }
}

#[tokio::test]
async fn test_run_loads_snapshot_before_serving() {
    let directory = TempDir::new().unwrap();
    let mut snapshot = std::fs::File::create(directory.path().join("dump.rdb")).unwrap();
    snapshot
        .write_all(b"REDIS0011\xFE\x00\xFB\x01\x00\x00\x05hello\x05world\xFF")
        .unwrap();
    drop(snapshot);

    let port = {
        let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        probe.local_addr().unwrap().port()
    };
    let directory_argument = directory.path().to_string_lossy().into_owned();
    let port_argument = port.to_string();

    let server = RedisServer::new(args(&[
        "--port",
        port_argument.as_str(),
        "--dir",
        directory_argument.as_str(),
        "--dbfilename",
        "dump.rdb",
    ]))
    .unwrap();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    let address: SocketAddr = ([127, 0, 0, 1], port).into();
    let mut client = loop {
        if tokio::net::TcpStream::connect(address).await.is_ok() {
            break TestClient::connect(address).await;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    };

    assert_eq!(client.request(&["GET", "hello"]).await, TestUtils::bulk_string("world"));
    assert_eq!(client.request(&["KEYS", "*"]).await, "*1\r\n$5\r\nhello\r\n");
    assert_eq!(
        client.request(&["CONFIG", "GET", "dbfilename"]).await,
        "*2\r\n$10\r\ndbfilename\r\n$8\r\ndump.rdb\r\n"
    );
}
