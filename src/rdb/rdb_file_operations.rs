use std::path::Path;

use bytes::Bytes;
use jiff::Timestamp;

use crate::{
    key_value_store::KeyValueStore,
    rdb::{
        rdb_error::RdbError,
        rdb_parser::{RdbLoadReport, RdbParser},
    },
};

/// Reads the whole snapshot file. A missing file is `Ok(None)`.
async fn read_snapshot_file(path: &Path) -> Result<Option<Bytes>, RdbError> {
    match tokio::fs::read(path).await {
        Ok(contents) => Ok(Some(Bytes::from(contents))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Seeds `store` from the snapshot at `path`.
///
/// This never fails: a missing file means an empty start, an unreadable or
/// malformed one loads whatever could be decoded. The report says which.
pub async fn load_snapshot(path: &Path, store: &KeyValueStore) -> RdbLoadReport {
    let contents = match read_snapshot_file(path).await {
        Ok(Some(contents)) => contents,
        Ok(None) => {
            tracing::info!(path = %path.display(), "no snapshot file, starting empty");
            return RdbLoadReport::default();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "{}", e);
            return RdbLoadReport {
                stopped_early: Some(e.to_string()),
                ..RdbLoadReport::default()
            };
        }
    };

    let (entries, report) = RdbParser::new(contents, Timestamp::now()).parse();

    if let Some(reason) = &report.stopped_early {
        tracing::warn!(
            path = %path.display(),
            keys_loaded = report.keys_loaded,
            "snapshot only partially loaded: {}",
            reason
        );
    }

    store.extend(entries).await;

    report
}
