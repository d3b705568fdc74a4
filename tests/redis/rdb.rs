use std::io::Write;

use jiff::{SignedDuration, Timestamp};
use redis_streams_server::{
    rdb::{RdbLoadReport, load_snapshot},
    server::RedisServer,
};
use tempfile::{NamedTempFile, TempDir};

use crate::test_utils::{TestEnv, TestUtils};

fn string_record(key: &str, value: &str) -> Vec<u8> {
    let mut record = vec![0x00, key.len() as u8];
    record.extend_from_slice(key.as_bytes());
    record.push(value.len() as u8);
    record.extend_from_slice(value.as_bytes());
    record
}

fn expiring_record(expires_at: Timestamp, key: &str, value: &str) -> Vec<u8> {
    let mut record = vec![0xFC];
    record.extend_from_slice(&expires_at.as_millisecond().to_le_bytes());
    record.extend(string_record(key, value));
    record
}

fn snapshot_file(records: &[Vec<u8>]) -> NamedTempFile {
    let mut contents = b"REDIS0011".to_vec();
    contents.extend([0xFE, 0x00, 0xFB, records.len() as u8, 0x00]);

    for record in records {
        contents.extend(record);
    }

    contents.push(0xFF);
    contents.extend([0u8; 8]);

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&contents).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn test_snapshot_keeps_only_live_keys() {
    let now = Timestamp::now();
    let file = snapshot_file(&[
        expiring_record(now - SignedDuration::from_secs(60), "elapsed", "old"),
        expiring_record(now + SignedDuration::from_secs(3600), "future", "new"),
    ]);
    let env = TestEnv::new();

    let report = load_snapshot(file.path(), &env.state.store).await;

    assert_eq!(
        report,
        RdbLoadReport {
            keys_loaded: 1,
            expired_skipped: 1,
            stopped_early: None,
        }
    );
    env.exec_command_ok(&["GET", "future"], &TestUtils::bulk_string("new"))
        .await;
    env.exec_command_ok(&["GET", "elapsed"], "$-1\r\n").await;
    env.exec_command_ok(&["KEYS", "*"], "*1\r\n$6\r\nfuture\r\n")
        .await;
}

#[tokio::test]
async fn test_snapshot_with_unexpiring_key() {
    let now = Timestamp::now();
    let file = snapshot_file(&[
        string_record("plain", "forever"),
        expiring_record(now - SignedDuration::from_millis(1), "elapsed", "old"),
        expiring_record(now + SignedDuration::from_secs(3600), "future", "new"),
    ]);
    let env = TestEnv::new();

    let report = load_snapshot(file.path(), &env.state.store).await;

    assert_eq!(report.keys_loaded, 2);
    assert_eq!(report.expired_skipped, 1);
    env.exec_command_ok(&["GET", "plain"], &TestUtils::bulk_string("forever"))
        .await;
    env.exec_command_ok(&["GET", "future"], &TestUtils::bulk_string("new"))
        .await;
    env.exec_command_ok(&["GET", "elapsed"], "$-1\r\n").await;
    env.exec_command_ok(&["TYPE", "plain"], "+string\r\n").await;
}

#[tokio::test]
async fn test_missing_snapshot_starts_empty() {
    let directory = TempDir::new().unwrap();
    let server = RedisServer {
        rdb_directory: directory.path().to_string_lossy().into_owned(),
        rdb_filename: "absent.rdb".to_string(),
        ..RedisServer::default()
    };
    let env = TestEnv::with_server(server);

    let report = load_snapshot(&env.state.server.rdb_path(), &env.state.store).await;

    assert_eq!(report, RdbLoadReport::default());
    env.exec_command_ok(&["KEYS", "*"], "*0\r\n").await;
}

#[tokio::test]
async fn test_truncated_snapshot_loads_what_it_can() {
    let mut contents = vec![0xFB, 0x02, 0x00];
    contents.extend(string_record("kept", "1"));
    contents.extend([0x00, 0x08, b'l', b'o', b's']);

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&contents).unwrap();
    file.flush().unwrap();

    let env = TestEnv::new();
    let report = load_snapshot(file.path(), &env.state.store).await;

    assert_eq!(report.keys_loaded, 1);
    assert!(report.stopped_early.is_some());
    env.exec_command_ok(&["GET", "kept"], &TestUtils::bulk_string("1"))
        .await;
}

#[tokio::test]
async fn test_snapshot_directory_is_not_fatal() {
    let directory = TempDir::new().unwrap();
    let env = TestEnv::new();

    let report = load_snapshot(directory.path(), &env.state.store).await;

    assert_eq!(report.keys_loaded, 0);
    assert!(report.stopped_early.is_some());
}
