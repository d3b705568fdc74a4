use std::string::FromUtf8Error;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RdbError {
    #[error("Unsupported length encoding 0x{0:02X}")]
    UnsupportedEncoding(u8),
    #[error("Unsupported record type 0x{0:02X}")]
    UnsupportedRecordType(u8),
    #[error("Unexpected end of snapshot data")]
    UnexpectedEof,
    #[error("Invalid UTF-8 in snapshot string")]
    InvalidUtf8(#[from] FromUtf8Error),
    #[error("Invalid expiration timestamp {0}")]
    InvalidExpiration(u64),
    #[error("Snapshot ended without an end-of-file marker")]
    MissingEndOfFile,
    #[error("Snapshot has no database section")]
    MissingDatabaseSection,
    #[error("Could not read snapshot file: {0}")]
    Io(#[from] std::io::Error),
}
