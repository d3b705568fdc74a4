use std::sync::Arc;

use crate::{key_value_store::KeyValueStore, server::RedisServer, stream_store::StreamStore};

/// Everything a connection needs, shared by reference across all of them.
#[derive(Debug, Clone)]
pub struct State {
    pub server: Arc<RedisServer>,
    pub store: Arc<KeyValueStore>,
    pub streams: Arc<StreamStore>,
}

impl State {
    pub fn new(server: RedisServer) -> Self {
        Self {
            server: Arc::new(server),
            store: Arc::new(KeyValueStore::new()),
            streams: Arc::new(StreamStore::new()),
        }
    }
}
