//! An in-memory key-value and stream server speaking the Redis protocol.
//!
//! Supported commands:
//!
//! - Keyspace: GET, SET (with PX expiry), KEYS, TYPE
//! - Streams: XADD, XRANGE, XREAD (with BLOCK)
//! - Server: PING, ECHO, CONFIG GET
//!
//! The keyspace can be seeded at startup from a binary snapshot file. Every
//! client connection runs in its own task; the string and stream tables are
//! shared by all of them.

pub mod commands;
pub mod connection;
pub mod input;
pub mod key_value_store;
pub mod rdb;
pub mod resp;
pub mod server;
pub mod state;
pub mod stream_store;
