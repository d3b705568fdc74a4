use bytes::{Buf, Bytes};
use jiff::Timestamp;

use crate::{
    key_value_store::Value,
    rdb::{
        encoding::{ensure_remaining, read_length, read_string},
        rdb_error::RdbError,
    },
};

const MAGIC_STRING: &[u8] = b"REDIS";
const HEADER_LENGTH: usize = 9;

const METADATA_OPCODE: u8 = 0xFA;
const RESIZE_DB_OPCODE: u8 = 0xFB;
const EXPIRATION_MILLISECONDS_OPCODE: u8 = 0xFC;
const EXPIRATION_SECONDS_OPCODE: u8 = 0xFD;
const DATABASE_OPCODE: u8 = 0xFE;
const END_OF_FILE_OPCODE: u8 = 0xFF;
const STRING_VALUE_TYPE: u8 = 0x00;

/// What a snapshot load did. Loading never fails; anything that cut it short
/// is described in `stopped_early`.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct RdbLoadReport {
    pub keys_loaded: usize,
    /// Records whose expiry had already passed when the file was read
    pub expired_skipped: usize,
    pub stopped_early: Option<String>,
}

/// Decodes a snapshot held in memory.
///
/// Anything ahead of the database section that is not a metadata record or a
/// database selector is skipped up to the first resize-db marker. From there
/// records are read until the end-of-file opcode. The first record that
/// cannot be decoded stops the parse; every key decoded before it is kept.
#[derive(Debug)]
pub struct RdbParser {
    buffer: Bytes,
    now: Timestamp,
    entries: Vec<(String, Value)>,
    report: RdbLoadReport,
}

impl RdbParser {
    /// `now` decides which expiring records are already dead.
    pub fn new(buffer: Bytes, now: Timestamp) -> Self {
        Self {
            buffer,
            now,
            entries: Vec::new(),
            report: RdbLoadReport::default(),
        }
    }

    pub fn parse(mut self) -> (Vec<(String, Value)>, RdbLoadReport) {
        if self.buffer.starts_with(MAGIC_STRING) && self.buffer.len() >= HEADER_LENGTH {
            self.buffer.advance(HEADER_LENGTH);
        }

        let result = self
            .skip_to_database_section()
            .and_then(|()| self.parse_records());

        if let Err(e) = result {
            self.report.stopped_early = Some(e.to_string());
        }

        self.report.keys_loaded = self.entries.len();
        (self.entries, self.report)
    }

    /// Consumes metadata records and stops at the database section. An
    /// unrecognized preamble byte falls back to a raw scan for `0xFB`.
    fn skip_to_database_section(&mut self) -> Result<(), RdbError> {
        loop {
            match self.buffer.first().copied() {
                None => return Err(RdbError::MissingEndOfFile),
                Some(RESIZE_DB_OPCODE | END_OF_FILE_OPCODE) => return Ok(()),
                Some(METADATA_OPCODE) => {
                    self.buffer.advance(1);
                    read_string(&mut self.buffer)?;
                    read_string(&mut self.buffer)?;
                }
                Some(DATABASE_OPCODE) => {
                    self.buffer.advance(1);
                    read_length(&mut self.buffer)?;
                    return Ok(());
                }
                Some(opcode) => {
                    tracing::debug!(opcode, "scanning past unrecognized snapshot preamble");
                    return self.scan_to_resize_db();
                }
            }
        }
    }

    fn scan_to_resize_db(&mut self) -> Result<(), RdbError> {
        match self.buffer.iter().position(|&byte| byte == RESIZE_DB_OPCODE) {
            Some(offset) => {
                self.buffer.advance(offset);
                Ok(())
            }
            None => {
                self.buffer.advance(self.buffer.len());
                Err(RdbError::MissingDatabaseSection)
            }
        }
    }

    fn parse_records(&mut self) -> Result<(), RdbError> {
        loop {
            if !self.buffer.has_remaining() {
                return Err(RdbError::MissingEndOfFile);
            }

            match self.buffer.get_u8() {
                END_OF_FILE_OPCODE => return Ok(()),
                METADATA_OPCODE => {
                    read_string(&mut self.buffer)?;
                    read_string(&mut self.buffer)?;
                }
                DATABASE_OPCODE => {
                    read_length(&mut self.buffer)?;
                }
                RESIZE_DB_OPCODE => {
                    read_length(&mut self.buffer)?;
                    read_length(&mut self.buffer)?;
                }
                EXPIRATION_MILLISECONDS_OPCODE => {
                    ensure_remaining(&self.buffer, 8)?;
                    let expiration = self.buffer.get_u64_le();
                    let expiration = i64::try_from(expiration)
                        .ok()
                        .and_then(|ms| Timestamp::from_millisecond(ms).ok())
                        .ok_or(RdbError::InvalidExpiration(expiration))?;

                    self.parse_typed_record(Some(expiration))?;
                }
                EXPIRATION_SECONDS_OPCODE => {
                    ensure_remaining(&self.buffer, 4)?;
                    let expiration = self.buffer.get_u32_le();
                    let expiration = Timestamp::from_second(i64::from(expiration))
                        .map_err(|_| RdbError::InvalidExpiration(u64::from(expiration)))?;

                    self.parse_typed_record(Some(expiration))?;
                }
                STRING_VALUE_TYPE => self.parse_string_record(None)?,
                opcode => return Err(RdbError::UnsupportedRecordType(opcode)),
            }
        }
    }

    /// Reads the value type that follows an expiry prefix, then the record.
    fn parse_typed_record(&mut self, expiration: Option<Timestamp>) -> Result<(), RdbError> {
        ensure_remaining(&self.buffer, 1)?;

        match self.buffer.get_u8() {
            STRING_VALUE_TYPE => self.parse_string_record(expiration),
            value_type => Err(RdbError::UnsupportedRecordType(value_type)),
        }
    }

    fn parse_string_record(&mut self, expiration: Option<Timestamp>) -> Result<(), RdbError> {
        let key = read_string(&mut self.buffer)?;
        let value = Value::new(read_string(&mut self.buffer)?, expiration);

        if value.is_expired_at(self.now) {
            tracing::debug!(key = %key, "skipping expired snapshot key");
            self.report.expired_skipped += 1;
        } else {
            self.entries.push((key, value));
        }

        Ok(())
    }
}
