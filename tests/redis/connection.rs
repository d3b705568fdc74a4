use redis_streams_server::{commands::CommandError, stream_store::StreamError};

use crate::test_utils::{TestClient, TestEnv, TestUtils};

#[tokio::test]
async fn test_concrete_session_over_tcp() {
    let env = TestEnv::new();
    let address = env.spawn_server().await;
    let mut client = TestClient::connect(address).await;

    let test_cases = vec![
        (vec!["PING"], "+PONG\r\n".to_string()),
        (vec!["ECHO", "hey"], TestUtils::bulk_string("hey")),
        (vec!["SET", "foo", "bar"], "+OK\r\n".to_string()),
        (vec!["GET", "foo"], TestUtils::bulk_string("bar")),
        (vec!["GET", "missing"], "$-1\r\n".to_string()),
        (
            vec!["CONFIG", "GET", "dir"],
            "*2\r\n$3\r\ndir\r\n$15\r\n/tmp/redis-file\r\n".to_string(),
        ),
        (
            vec!["XADD", "s", "1-1", "field", "val"],
            TestUtils::bulk_string("1-1"),
        ),
        (
            vec!["XADD", "s", "1-1", "field", "val2"],
            CommandError::Stream(StreamError::StaleId).as_string(),
        ),
        (
            vec!["XRANGE", "s", "-", "+"],
            "*1\r\n*2\r\n$3\r\n1-1\r\n*2\r\n$5\r\nfield\r\n$3\r\nval\r\n".to_string(),
        ),
        (
            vec!["NOSUCHCOMMAND"],
            "-ERR unknown command 'NOSUCHCOMMAND'\r\n".to_string(),
        ),
        (vec!["PING"], "+PONG\r\n".to_string()),
    ];

    for (command, expected_reply) in test_cases {
        assert_eq!(client.request(&command).await, expected_reply, "sending {:?}", command);
    }
}

#[tokio::test]
async fn test_pipelined_requests_answered_in_order() {
    let env = TestEnv::new();
    let address = env.spawn_server().await;
    let mut client = TestClient::connect(address).await;

    client.send(&["SET", "a", "1"]).await;
    client.send(&["GET", "a"]).await;
    client.send(&["TYPE", "a"]).await;

    assert_eq!(client.read_reply().await, "+OK\r\n");
    assert_eq!(client.read_reply().await, TestUtils::bulk_string("1"));
    assert_eq!(client.read_reply().await, "+string\r\n");
}

#[tokio::test]
async fn test_blocked_client_woken_by_other_client() {
    let env = TestEnv::new();
    let address = env.spawn_server().await;
    let mut reader = TestClient::connect(address).await;
    let mut writer = TestClient::connect(address).await;

    reader
        .send(&["XREAD", "BLOCK", "0", "STREAMS", "sensor", "$"])
        .await;
    env.wait_for_blocked_readers(1).await;

    // The writer is served while the reader is parked
    assert_eq!(writer.request(&["PING"]).await, "+PONG\r\n");
    assert_eq!(
        writer.request(&["XADD", "sensor", "7-1", "t", "21"]).await,
        TestUtils::bulk_string("7-1")
    );

    assert_eq!(
        reader.read_reply().await,
        "*1\r\n*2\r\n$6\r\nsensor\r\n*1\r\n*2\r\n$3\r\n7-1\r\n*2\r\n$1\r\nt\r\n$2\r\n21\r\n"
    );
    assert_eq!(reader.request(&["PING"]).await, "+PONG\r\n");
}

#[tokio::test]
async fn test_disconnected_blocked_client_is_released() {
    let env = TestEnv::new();
    let address = env.spawn_server().await;
    let mut reader = TestClient::connect(address).await;

    reader
        .send(&["XREAD", "BLOCK", "0", "STREAMS", "sensor", "$"])
        .await;
    env.wait_for_blocked_readers(1).await;

    drop(reader);
    env.wait_for_blocked_readers(0).await;

    let mut writer = TestClient::connect(address).await;
    assert_eq!(
        writer.request(&["XADD", "sensor", "1-1", "t", "21"]).await,
        TestUtils::bulk_string("1-1")
    );
}

#[tokio::test]
async fn test_many_clients_concurrently() {
    let env = TestEnv::new();
    let address = env.spawn_server().await;

    let mut clients = Vec::new();

    for client_number in 0..10 {
        clients.push(tokio::spawn(async move {
            let mut client = TestClient::connect(address).await;
            let key = format!("key{}", client_number);
            let value = format!("value{}", client_number);

            for _ in 0..20 {
                assert_eq!(client.request(&["SET", key.as_str(), value.as_str()]).await, "+OK\r\n");
                assert_eq!(
                    client.request(&["GET", key.as_str()]).await,
                    TestUtils::bulk_string(&value)
                );
                assert!(
                    client
                        .request(&["XADD", "shared", "*", "client", key.as_str()])
                        .await
                        .starts_with('$')
                );
            }
        }));
    }

    for client in clients {
        client.await.unwrap();
    }

    assert_eq!(env.state.store.keys().await.len(), 10);
}

#[tokio::test]
async fn test_malformed_request_closes_only_that_connection() {
    let env = TestEnv::new();
    let address = env.spawn_server().await;
    let mut healthy = TestClient::connect(address).await;

    let mut broken = tokio::net::TcpStream::connect(address).await.unwrap();
    tokio::io::AsyncWriteExt::write_all(&mut broken, b"HELLO\r\n")
        .await
        .unwrap();

    let mut buffer = Vec::new();
    let read = tokio::io::AsyncReadExt::read_to_end(&mut broken, &mut buffer)
        .await
        .unwrap();
    assert_eq!(read, 0);

    assert_eq!(healthy.request(&["PING"]).await, "+PONG\r\n");
}
