use redis_streams_server::commands::CommandError;

use crate::test_utils::TestEnv;

fn entry(id: &str, value: &str) -> String {
    format!(
        "*2\r\n${}\r\n{}\r\n*2\r\n$1\r\nf\r\n${}\r\n{}\r\n",
        id.len(),
        id,
        value.len(),
        value
    )
}

#[tokio::test]
async fn test_xrange_orders_ids_numerically() {
    let env = TestEnv::new();

    for (id, value) in [("2-0", "two"), ("2-1", "two-again"), ("10-0", "ten")] {
        env.exec_command(&["XADD", "s", id, "f", value]).await.unwrap();
    }

    let test_cases = vec![
        (
            vec!["XRANGE", "s", "-", "+"],
            format!(
                "*3\r\n{}{}{}",
                entry("2-0", "two"),
                entry("2-1", "two-again"),
                entry("10-0", "ten")
            ),
        ),
        (
            vec!["XRANGE", "s", "2", "2"],
            format!("*2\r\n{}{}", entry("2-0", "two"), entry("2-1", "two-again")),
        ),
        (
            vec!["XRANGE", "s", "3", "+"],
            format!("*1\r\n{}", entry("10-0", "ten")),
        ),
        (
            vec!["XRANGE", "s", "2-1", "10-0"],
            format!("*2\r\n{}{}", entry("2-1", "two-again"), entry("10-0", "ten")),
        ),
        (vec!["XRANGE", "s", "11", "+"], "*0\r\n".to_string()),
        (vec!["XRANGE", "s", "10", "2"], "*0\r\n".to_string()),
        (vec!["XRANGE", "unknown", "-", "+"], "*0\r\n".to_string()),
    ];

    for (command, expected_response) in test_cases {
        env.exec_command_ok(&command, &expected_response).await;
    }

    env.exec_command_err(&["XRANGE", "s", "-"], CommandError::InvalidXRangeCommand)
        .await;
}
