//! Read-only loader for the binary snapshot consumed at startup.

mod encoding;
mod rdb_error;
mod rdb_file_operations;
mod rdb_parser;

pub use rdb_error::RdbError;
pub use rdb_file_operations::load_snapshot;
pub use rdb_parser::{RdbLoadReport, RdbParser};
