use redis_streams_server::{
    commands::CommandError,
    stream_store::{RangeEnd, StreamError, StreamId},
};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_xadd_explicit_and_partial_ids() {
    let env = TestEnv::new();

    let test_cases = vec![
        (vec!["XADD", "s", "1-1", "field", "val"], "1-1"),
        (vec!["XADD", "s", "1-*", "field", "val"], "1-2"),
        (vec!["XADD", "s", "2-*", "field", "val"], "2-0"),
        (vec!["XADD", "s", "10-0", "a", "1", "b", "2"], "10-0"),
        (vec!["XADD", "fresh", "0-*", "field", "val"], "0-1"),
    ];

    for (command, expected_id) in test_cases {
        env.exec_command_ok(&command, &TestUtils::bulk_string(expected_id))
            .await;
    }
}

#[tokio::test]
async fn test_xadd_rejections_leave_stream_untouched() {
    let env = TestEnv::new();

    env.exec_command_err(
        &["XADD", "s", "0-0", "field", "val"],
        CommandError::Stream(StreamError::ZeroId),
    )
    .await;
    env.exec_command_ok(&["TYPE", "s"], "+none\r\n").await;

    env.exec_command_ok(&["XADD", "s", "5-3", "field", "val"], "$3\r\n5-3\r\n")
        .await;

    let test_cases = vec![
        (
            vec!["XADD", "s", "5-3", "field", "val2"],
            CommandError::Stream(StreamError::StaleId),
        ),
        (
            vec!["XADD", "s", "4-9", "field", "val2"],
            CommandError::Stream(StreamError::StaleId),
        ),
        (
            vec!["XADD", "s", "five-0", "field", "val2"],
            CommandError::Stream(StreamError::InvalidId("five-0".to_string())),
        ),
        (
            vec!["XADD", "s", "6-0", "field"],
            CommandError::InvalidXAddCommand,
        ),
    ];

    for (command, expected_error) in test_cases {
        env.exec_command_err(&command, expected_error).await;
    }

    env.exec_command_ok(
        &["XRANGE", "s", "-", "+"],
        "*1\r\n*2\r\n$3\r\n5-3\r\n*2\r\n$5\r\nfield\r\n$3\r\nval\r\n",
    )
    .await;
}

#[tokio::test]
async fn test_xadd_auto_ids_increase() {
    let env = TestEnv::new();

    for _ in 0..5 {
        env.exec_command(&["XADD", "s", "*", "field", "val"]).await.unwrap();
    }

    let entries = env
        .state
        .streams
        .range("s", StreamId::ZERO, RangeEnd::Unbounded)
        .await;
    let ids = entries.iter().map(|entry| entry.id).collect::<Vec<_>>();

    assert_eq!(ids.len(), 5);
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]), "ids {:?}", ids);
}
