//! Append-only per-key event streams.
//!
//! Entries are keyed by a numeric `(ms, seq)` pair so that `10-0` sorts after
//! `2-0`. Blocked XREAD callers park on a per-key channel; every successful
//! append signals the waiters of the key it touched while the table lock is
//! still held, which closes the gap between "checked, found nothing" and
//! "started waiting".

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt,
    ops::Bound,
    str::FromStr,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use jiff::Timestamp;
use thiserror::Error;
use tokio::{
    sync::{Mutex, mpsc},
    time::Instant,
};

#[derive(Error, Debug, PartialEq, Clone)]
pub enum StreamError {
    #[error("The ID specified in XADD must be greater than 0-0")]
    ZeroId,
    #[error("The ID specified in XADD is equal or smaller than the target stream top item")]
    StaleId,
    #[error("Invalid stream ID specified as stream command argument: '{0}'")]
    InvalidId(String),
    #[error("System time is before unix epoch")]
    ClockBeforeEpoch,
}

/// Composite entry id, ordered by milliseconds first, then sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId {
    pub ms: u64,
    pub seq: u64,
}

impl StreamId {
    pub const ZERO: StreamId = StreamId { ms: 0, seq: 0 };

    pub fn new(ms: u64, seq: u64) -> Self {
        Self { ms, seq }
    }

    /// Parses `<ms>` or `<ms>-<seq>`, leaving the sequence out when absent.
    pub fn parse_partial(input: &str) -> Result<(u64, Option<u64>), StreamError> {
        match input.split_once('-') {
            Some((ms, seq)) => Ok((parse_number(ms, input)?, Some(parse_number(seq, input)?))),
            None => Ok((parse_number(input, input)?, None)),
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

impl FromStr for StreamId {
    type Err = StreamError;

    /// Parses a complete `<ms>-<seq>` id.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match StreamId::parse_partial(input)? {
            (ms, Some(seq)) => Ok(StreamId { ms, seq }),
            (_, None) => Err(StreamError::InvalidId(input.to_string())),
        }
    }
}

fn parse_number(digits: &str, original: &str) -> Result<u64, StreamError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(StreamError::InvalidId(original.to_string()));
    }

    digits
        .parse::<u64>()
        .map_err(|_| StreamError::InvalidId(original.to_string()))
}

/// The id argument of XADD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StreamIdSpec {
    /// `*`: current time, next free sequence
    Auto,
    /// `<ms>-*`: explicit time, next free sequence for that time
    AutoSequence(u64),
    /// `<ms>-<seq>`
    Explicit(StreamId),
}

impl FromStr for StreamIdSpec {
    type Err = StreamError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input == "*" {
            return Ok(StreamIdSpec::Auto);
        }

        let Some((ms, seq)) = input.split_once('-') else {
            return Err(StreamError::InvalidId(input.to_string()));
        };

        let ms = parse_number(ms, input)?;

        if seq == "*" {
            return Ok(StreamIdSpec::AutoSequence(ms));
        }

        Ok(StreamIdSpec::Explicit(StreamId::new(ms, parse_number(seq, input)?)))
    }
}

/// Upper bound of an XRANGE query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeEnd {
    /// `+`
    Unbounded,
    /// `<ms>`: every entry stamped `ms`, whatever its sequence
    Millisecond(u64),
    /// `<ms>-<seq>`
    Exact(StreamId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamEntry {
    pub id: StreamId,
    /// Flat field/value pairs in insertion order.
    pub fields: Vec<String>,
}

/// One stream's ordered log.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Stream {
    entries: BTreeMap<StreamId, Vec<String>>,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_id(&self) -> Option<StreamId> {
        self.entries.keys().next_back().copied()
    }

    /// Highest sequence already used with timestamp `ms`.
    pub fn last_sequence_for(&self, ms: u64) -> Option<u64> {
        self.entries
            .range(StreamId::new(ms, 0)..=StreamId::new(ms, u64::MAX))
            .next_back()
            .map(|(id, _)| id.seq)
    }

    /// Turns an XADD id argument into a concrete id and validates it against
    /// the current top of the stream. `now_ms` is only consulted for `*`.
    pub fn resolve_id(&self, spec: StreamIdSpec, now_ms: u64) -> Result<StreamId, StreamError> {
        let id = match spec {
            StreamIdSpec::Auto => match self.last_id() {
                Some(last) if last.ms == now_ms => StreamId::new(
                    now_ms,
                    last.seq.checked_add(1).ok_or(StreamError::StaleId)?,
                ),
                _ => StreamId::new(now_ms, 0),
            },
            StreamIdSpec::AutoSequence(ms) => match self.last_sequence_for(ms) {
                Some(seq) => StreamId::new(ms, seq.checked_add(1).ok_or(StreamError::StaleId)?),
                None if ms == 0 => StreamId::new(0, 1),
                None => StreamId::new(ms, 0),
            },
            StreamIdSpec::Explicit(id) => id,
        };

        if id == StreamId::ZERO {
            return Err(StreamError::ZeroId);
        }

        if let Some(last) = self.last_id() {
            if id <= last {
                return Err(StreamError::StaleId);
            }
        }

        Ok(id)
    }

    /// Appends an already resolved id. Callers go through [`Stream::resolve_id`].
    fn push(&mut self, id: StreamId, fields: Vec<String>) {
        self.entries.insert(id, fields);
    }

    /// Closed range `[start, end]`; an inverted range is empty.
    pub fn range(&self, start: StreamId, end: RangeEnd) -> Vec<StreamEntry> {
        let end = match end {
            RangeEnd::Unbounded => Bound::Unbounded,
            RangeEnd::Millisecond(ms) => Bound::Included(StreamId::new(
                ms,
                self.last_sequence_for(ms).unwrap_or(u64::MAX),
            )),
            RangeEnd::Exact(id) => Bound::Included(id),
        };

        if let Bound::Included(end) = end {
            if start > end {
                return Vec::new();
            }
        }

        self.collect((Bound::Included(start), end))
    }

    /// Every entry with an id strictly greater than `after`.
    pub fn entries_after(&self, after: StreamId) -> Vec<StreamEntry> {
        self.collect((Bound::Excluded(after), Bound::Unbounded))
    }

    fn collect(&self, bounds: (Bound<StreamId>, Bound<StreamId>)) -> Vec<StreamEntry> {
        self.entries
            .range(bounds)
            .map(|(id, fields)| StreamEntry {
                id: *id,
                fields: fields.clone(),
            })
            .collect()
    }
}

/// How long an XREAD may wait for new entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockMode {
    NonBlocking,
    Forever,
    Timeout(Duration),
}

impl BlockMode {
    /// Maps the `BLOCK <ms>` argument, where `0` waits without a deadline.
    pub fn from_block_millis(blocking_duration: Option<u64>) -> Self {
        match blocking_duration {
            None => BlockMode::NonBlocking,
            Some(0) => BlockMode::Forever,
            Some(ms) => BlockMode::Timeout(Duration::from_millis(ms)),
        }
    }
}

/// One XREAD result slot: the stream key and its new entries (possibly none).
pub type StreamReadSlot = (String, Vec<StreamEntry>);

#[derive(Debug)]
struct Waiter {
    id: u64,
    sender: mpsc::Sender<()>,
}

#[derive(Debug, Default)]
struct StreamTables {
    streams: HashMap<String, Stream>,
    waiters: HashMap<String, Vec<Waiter>>,
}

impl StreamTables {
    fn read_after(&self, queries: &[(String, StreamId)]) -> Vec<StreamReadSlot> {
        queries
            .iter()
            .map(|(key, after)| {
                let entries = self
                    .streams
                    .get(key)
                    .map(|stream| stream.entries_after(*after))
                    .unwrap_or_default();

                (key.clone(), entries)
            })
            .collect()
    }

    fn add_waiter(&mut self, keys: &[(String, StreamId)], id: u64, sender: &mpsc::Sender<()>) {
        self.prune_closed_waiters();

        for (key, _) in keys {
            self.waiters.entry(key.clone()).or_default().push(Waiter {
                id,
                sender: sender.clone(),
            });
        }
    }

    fn remove_waiter(&mut self, keys: &[(String, StreamId)], id: u64) {
        for (key, _) in keys {
            if let Some(waiters) = self.waiters.get_mut(key) {
                waiters.retain(|waiter| waiter.id != id);

                if waiters.is_empty() {
                    self.waiters.remove(key);
                }
            }
        }
    }

    /// Drops waiters on every key whose reader went away without
    /// unregistering.
    fn prune_closed_waiters(&mut self) {
        self.waiters.retain(|_, waiters| {
            waiters.retain(|waiter| !waiter.sender.is_closed());
            !waiters.is_empty()
        });
    }

    /// Wakes everyone parked on `key`, dropping waiters whose reader is gone.
    fn notify(&mut self, key: &str) {
        let Some(waiters) = self.waiters.get_mut(key) else {
            return;
        };

        waiters.retain(|waiter| !waiter.sender.is_closed());

        for waiter in waiters.iter() {
            // A full channel already holds a pending wakeup
            let _ = waiter.sender.try_send(());
        }

        if waiters.is_empty() {
            self.waiters.remove(key);
        }
    }
}

/// Unregisters a blocked read when its future is dropped mid-wait.
///
/// The lock may be held elsewhere at that moment; the entry is then left
/// for [`StreamTables::prune_closed_waiters`].
struct WaiterRegistration<'a> {
    store: &'a StreamStore,
    queries: &'a [(String, StreamId)],
    id: u64,
    registered: bool,
}

impl Drop for WaiterRegistration<'_> {
    fn drop(&mut self) {
        if !self.registered {
            return;
        }

        if let Ok(mut tables_guard) = self.store.tables.try_lock() {
            tables_guard.remove_waiter(self.queries, self.id);
        }
    }
}

/// Process-wide stream table shared by every connection.
#[derive(Debug, Default)]
pub struct StreamStore {
    tables: Mutex<StreamTables>,
    next_waiter_id: AtomicU64,
}

impl StreamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `spec`, appends the entry and wakes blocked readers of `key`.
    ///
    /// A rejected id leaves the store untouched; in particular no empty
    /// stream is created for a key that did not exist.
    pub async fn append(
        &self,
        key: &str,
        spec: StreamIdSpec,
        fields: Vec<String>,
    ) -> Result<StreamId, StreamError> {
        let now_ms = match spec {
            StreamIdSpec::Auto => current_unix_millis()?,
            _ => 0,
        };

        let mut tables_guard = self.tables.lock().await;

        let id = match tables_guard.streams.get(key) {
            Some(stream) => stream.resolve_id(spec, now_ms)?,
            None => Stream::new().resolve_id(spec, now_ms)?,
        };

        tables_guard
            .streams
            .entry(key.to_string())
            .or_default()
            .push(id, fields);
        tables_guard.notify(key);

        Ok(id)
    }

    pub async fn contains_key(&self, key: &str) -> bool {
        self.tables.lock().await.streams.contains_key(key)
    }

    pub async fn last_id(&self, key: &str) -> Option<StreamId> {
        self.tables
            .lock()
            .await
            .streams
            .get(key)
            .and_then(Stream::last_id)
    }

    /// XRANGE over `key`; an unknown key yields no entries.
    pub async fn range(&self, key: &str, start: StreamId, end: RangeEnd) -> Vec<StreamEntry> {
        self.tables
            .lock()
            .await
            .streams
            .get(key)
            .map(|stream| stream.range(start, end))
            .unwrap_or_default()
    }

    /// XREAD: for each `(key, after)` collects entries with id `> after`.
    ///
    /// Returns `Some` with one slot per query, in query order, as soon as any
    /// slot is non-empty. Returns `None` when nothing arrived: immediately for
    /// [`BlockMode::NonBlocking`], otherwise once the deadline passes.
    /// Every wakeup re-checks all keys against the original deadline.
    pub async fn read(
        &self,
        queries: &[(String, StreamId)],
        mode: BlockMode,
    ) -> Option<Vec<StreamReadSlot>> {
        let deadline = match mode {
            BlockMode::Timeout(duration) => Some(Instant::now() + duration),
            _ => None,
        };

        // Keeping a sender here means `recv` can never observe a closed channel
        let (sender, mut receiver) = mpsc::channel::<()>(1);
        let mut registration = WaiterRegistration {
            store: self,
            queries,
            id: self.next_waiter_id.fetch_add(1, Ordering::Relaxed),
            registered: false,
        };

        loop {
            {
                let mut tables_guard = self.tables.lock().await;
                let slots = tables_guard.read_after(queries);

                if slots.iter().any(|(_, entries)| !entries.is_empty()) {
                    if registration.registered {
                        tables_guard.remove_waiter(queries, registration.id);
                        registration.registered = false;
                    }
                    return Some(slots);
                }

                if mode == BlockMode::NonBlocking {
                    return None;
                }

                if !registration.registered {
                    tables_guard.add_waiter(queries, registration.id, &sender);
                    registration.registered = true;
                }
            }

            let woken = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, receiver.recv())
                    .await
                    .is_ok(),
                None => receiver.recv().await.is_some(),
            };

            if !woken {
                self.tables
                    .lock()
                    .await
                    .remove_waiter(queries, registration.id);
                registration.registered = false;
                return None;
            }
        }
    }

    /// Number of XREAD calls currently parked, ignoring abandoned ones.
    pub async fn blocked_readers(&self) -> usize {
        let tables_guard = self.tables.lock().await;

        tables_guard
            .waiters
            .values()
            .flatten()
            .filter(|waiter| !waiter.sender.is_closed())
            .map(|waiter| waiter.id)
            .collect::<HashSet<u64>>()
            .len()
    }
}

/// Milliseconds since the unix epoch, as used by XADD `*`.
pub fn current_unix_millis() -> Result<u64, StreamError> {
    u64::try_from(Timestamp::now().as_millisecond()).map_err(|_| StreamError::ClockBeforeEpoch)
}
