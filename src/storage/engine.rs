//! Thread-Safe String Store with Expiry Support
//!
//! This module implements the core of stringkv: a concurrent map from keys to
//! byte-string values, with logical TTLs and the Redis string command set on top.
//!
//! ## Design Decisions
//!
//! 1. **Sharded Locks**: The key space is split across shards, each behind its
//!    own `RwLock`, so unrelated keys don't contend.
//! 2. **Lazy Expiry**: An expired entry is treated as absent and removed by
//!    whichever operation touches it next. The optional
//!    [`ExpirySweeper`](crate::storage::ExpirySweeper) only reclaims memory.
//! 3. **Validate, Then Mutate**: Every operation finishes all parsing and bounds
//!    checks before it changes an entry, so an error never leaves a half-applied
//!    write behind.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       StringStore                           │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │           │
//! │  │ HashMap │ │ HashMap │ │ HashMap │ │ HashMap │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Single-key operations lock exactly one shard. Multi-key operations (MGET,
//! MSET, MSETNX, DEL, EXISTS) lock every shard their keys hash to, always in
//! ascending shard order, and hold them all until the batch is done. Two batches
//! can therefore never wait on each other in a cycle, and no reader ever sees
//! half of an MSET.

use crate::storage::error::{StoreError, StoreResult};
use crate::storage::numeric;
use bytes::Bytes;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

/// Default number of shards.
/// More shards = less lock contention, but more memory overhead.
pub const DEFAULT_SHARDS: usize = 64;

/// Largest value the store will build, in bytes (512 MB, same as Redis).
pub const MAX_VALUE_SIZE: usize = 512 * 1024 * 1024;

/// Largest addressable bit offset for GETBIT/SETBIT.
pub const MAX_BIT_OFFSET: i64 = (MAX_VALUE_SIZE as i64) * 8 - 1;

type ShardMap = HashMap<Bytes, Entry>;

/// A stored value with an optional expiry time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The value bytes
    pub value: Bytes,
    /// When this entry expires (None = never expires)
    pub expires_at: Option<Instant>,
}

impl Entry {
    /// Creates a new entry without expiry.
    pub fn new(value: Bytes) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// Creates a new entry that expires at `deadline`.
    pub fn expiring_at(value: Bytes, deadline: Instant) -> Self {
        Self {
            value,
            expires_at: Some(deadline),
        }
    }

    /// Checks if this entry has expired.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|exp| Instant::now() >= exp)
            .unwrap_or(false)
    }

    /// Rewrites the value in place as a growable byte vector.
    ///
    /// When no reader holds a clone of the value the buffer is reused rather
    /// than copied.
    fn edit<T>(&mut self, f: impl FnOnce(&mut Vec<u8>) -> T) -> T {
        let mut buf = Vec::from(std::mem::take(&mut self.value));
        let out = f(&mut buf);
        self.value = Bytes::from(buf);
        out
    }
}

/// Options for [`StringStore::set`], mirroring `SET key value [NX|XX]
/// [EX seconds|PX milliseconds|KEEPTTL] [GET]`.
///
/// Conflicting combinations are representable here and rejected by `set`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Only write if the key is absent
    pub nx: bool,
    /// Only write if the key is present
    pub xx: bool,
    /// Expire after this many seconds
    pub ex: Option<u64>,
    /// Expire after this many milliseconds
    pub px: Option<u64>,
    /// Keep the existing expiry instead of clearing it
    pub keep_ttl: bool,
    /// Return the previous value
    pub get: bool,
}

impl SetOptions {
    pub fn nx(mut self) -> Self {
        self.nx = true;
        self
    }

    pub fn xx(mut self) -> Self {
        self.xx = true;
        self
    }

    pub fn ex(mut self, seconds: u64) -> Self {
        self.ex = Some(seconds);
        self
    }

    pub fn px(mut self, millis: u64) -> Self {
        self.px = Some(millis);
        self
    }

    pub fn keep_ttl(mut self) -> Self {
        self.keep_ttl = true;
        self
    }

    pub fn get(mut self) -> Self {
        self.get = true;
        self
    }

    /// Validates the combination and resolves what happens to the expiry.
    fn expiry(&self) -> StoreResult<ExpiryChange> {
        if self.nx && self.xx {
            return Err(StoreError::invalid("NX and XX options are mutually exclusive"));
        }
        match (self.ex, self.px, self.keep_ttl) {
            (None, None, false) => Ok(ExpiryChange::Clear),
            (None, None, true) => Ok(ExpiryChange::Keep),
            (Some(secs), None, false) => {
                deadline_after(Duration::from_secs(secs)).map(ExpiryChange::At)
            }
            (None, Some(ms), false) => {
                deadline_after(Duration::from_millis(ms)).map(ExpiryChange::At)
            }
            _ => Err(StoreError::invalid(
                "EX, PX and KEEPTTL options are mutually exclusive",
            )),
        }
    }
}

/// What a write does to the entry's existing expiry.
#[derive(Debug, Clone, Copy)]
enum ExpiryChange {
    Clear,
    Keep,
    At(Instant),
}

/// Outcome of [`StringStore::set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetReply {
    /// Whether the value was written (false when NX/XX blocked it)
    pub written: bool,
    /// The value before the call; only filled in when `SetOptions::get` is set
    pub previous: Option<Bytes>,
}

/// Remaining lifetime of a key, as reported by TTL/PTTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlState {
    /// The key does not exist
    Missing,
    /// The key exists and never expires
    Persistent,
    /// The key expires after this long
    Remaining(Duration),
}

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of lock shards (at least 1)
    pub shards: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            shards: DEFAULT_SHARDS,
        }
    }
}

/// A single shard containing a portion of the key-value pairs.
#[derive(Debug)]
struct Shard {
    data: RwLock<ShardMap>,
}

impl Shard {
    fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }
}

/// Write guards over every shard touched by a multi-key operation.
///
/// `slots[i]` is the position in `guards` of the shard owning the i-th key.
struct KeyLocks<'a> {
    guards: Vec<RwLockWriteGuard<'a, ShardMap>>,
    slots: Vec<usize>,
}

impl KeyLocks<'_> {
    fn shard(&mut self, key_pos: usize) -> &mut ShardMap {
        &mut self.guards[self.slots[key_pos]]
    }
}

/// The string store.
///
/// This is designed to be wrapped in an `Arc` and shared by every caller.
/// Each public method is one atomic, serializable operation.
///
/// # Example
///
/// ```
/// use stringkv::storage::{SetOptions, StringStore};
/// use bytes::Bytes;
///
/// let store = StringStore::new();
/// let key = Bytes::from("greeting");
///
/// store.set(key.clone(), Bytes::from("hello"), SetOptions::default()).unwrap();
/// assert_eq!(store.append(&key, b"--world").unwrap(), 12);
/// assert_eq!(store.get_range(&key, -5, -1), Bytes::from("world"));
/// ```
pub struct StringStore {
    shards: Vec<Shard>,

    /// Statistics: read operations served
    read_count: AtomicU64,

    /// Statistics: write operations attempted
    write_count: AtomicU64,

    /// Statistics: expired keys removed (lazily or by a purge)
    expired_count: AtomicU64,
}

impl std::fmt::Debug for StringStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StringStore")
            .field("shards", &self.shards.len())
            .field("read_count", &self.read_count.load(Ordering::Relaxed))
            .field("write_count", &self.write_count.load(Ordering::Relaxed))
            .field("expired_count", &self.expired_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for StringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StringStore {
    /// Creates a new store with default settings.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates a new store with the given configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        let shards = (0..config.shards.max(1)).map(|_| Shard::new()).collect();

        Self {
            shards,
            read_count: AtomicU64::new(0),
            write_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }

    /// Number of shards the key space is split into.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    // ========================================================================
    // Locking and lazy expiry
    // ========================================================================

    /// Determines which shard a key belongs to.
    #[inline]
    fn shard_index(&self, key: &[u8]) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shards.len()
    }

    // A poisoned shard is still consistent: no operation panics between its
    // first mutation and its return.
    fn read_shard(&self, idx: usize) -> RwLockReadGuard<'_, ShardMap> {
        self.shards[idx]
            .data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_shard(&self, idx: usize) -> RwLockWriteGuard<'_, ShardMap> {
        self.shards[idx]
            .data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Write-locks the shard owning `key` for a single-key write.
    fn writer(&self, key: &[u8]) -> RwLockWriteGuard<'_, ShardMap> {
        self.write_count.fetch_add(1, Ordering::Relaxed);
        self.write_shard(self.shard_index(key))
    }

    /// Write-locks every shard owning one of `keys`, in ascending shard order.
    fn lock_keys<'k>(&self, keys: impl IntoIterator<Item = &'k Bytes>) -> KeyLocks<'_> {
        let indices: Vec<usize> = keys.into_iter().map(|k| self.shard_index(k)).collect();

        let mut order = indices.clone();
        order.sort_unstable();
        order.dedup();

        let guards = order.iter().map(|&idx| self.write_shard(idx)).collect();
        let slots = indices
            .iter()
            .map(|idx| order.binary_search(idx).unwrap_or_else(|pos| pos))
            .collect();

        KeyLocks { guards, slots }
    }

    /// Removes `key` from `data` if it has expired.
    fn evict_if_expired(&self, data: &mut ShardMap, key: &[u8]) {
        if data.get(key).is_some_and(Entry::is_expired) {
            data.remove(key);
            self.expired_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Returns the live entry for `key`, evicting it first if it has expired.
    fn live_entry<'a>(&self, data: &'a mut ShardMap, key: &[u8]) -> Option<&'a mut Entry> {
        self.evict_if_expired(data, key);
        data.get_mut(key)
    }

    /// Returns the live entry for `key`, creating an empty one if absent.
    ///
    /// Callers must finish validation before calling this.
    fn entry_or_empty<'a>(&self, data: &'a mut ShardMap, key: &Bytes) -> &'a mut Entry {
        self.evict_if_expired(data, key);
        data.entry(key.clone())
            .or_insert_with(|| Entry::new(Bytes::new()))
    }

    /// Runs `f` against the live entry for `key`.
    ///
    /// Takes the shard's read lock on the fast path and only upgrades to the
    /// write lock when the entry turns out to be expired and must be evicted.
    fn read_live<T>(&self, key: &Bytes, f: impl FnOnce(&Entry) -> T) -> Option<T> {
        self.read_count.fetch_add(1, Ordering::Relaxed);
        let idx = self.shard_index(key);

        {
            let data = self.read_shard(idx);
            match data.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired() => return Some(f(entry)),
                Some(_) => {}
            }
        }

        // Expired: another thread may have replaced it in between, so look again
        let mut data = self.write_shard(idx);
        self.live_entry(&mut data, key).map(|entry| f(&*entry))
    }

    // ========================================================================
    // Plain reads and writes
    // ========================================================================

    /// Gets the value for a key.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    pub fn get(&self, key: &Bytes) -> Option<Bytes> {
        self.read_live(key, |entry| entry.value.clone())
    }

    /// Sets `key` to `value` according to `options`.
    ///
    /// NX on a live key or XX on an absent key is not an error: nothing is
    /// written and the reply says so.
    pub fn set(&self, key: Bytes, value: Bytes, options: SetOptions) -> StoreResult<SetReply> {
        let expiry = options.expiry()?;

        let mut data = self.writer(&key);
        let current = self.live_entry(&mut data, &key);
        let exists = current.is_some();
        let previous = match (&current, options.get) {
            (Some(entry), true) => Some(entry.value.clone()),
            _ => None,
        };
        let kept_deadline = current.and_then(|entry| entry.expires_at);

        if (options.nx && exists) || (options.xx && !exists) {
            return Ok(SetReply {
                written: false,
                previous,
            });
        }

        let expires_at = match expiry {
            ExpiryChange::Clear => None,
            ExpiryChange::Keep => kept_deadline,
            ExpiryChange::At(deadline) => Some(deadline),
        };
        data.insert(key, Entry { value, expires_at });

        Ok(SetReply {
            written: true,
            previous,
        })
    }

    /// Sets `key` only if it doesn't exist (SETNX).
    ///
    /// Returns `true` if the value was written.
    pub fn set_nx(&self, key: Bytes, value: Bytes) -> bool {
        let mut data = self.writer(&key);
        if self.live_entry(&mut data, &key).is_some() {
            return false;
        }
        data.insert(key, Entry::new(value));
        true
    }

    /// Sets `key` with a time-to-live (SETEX / PSETEX).
    ///
    /// A zero TTL is rejected.
    pub fn set_ex(&self, key: Bytes, value: Bytes, ttl: Duration) -> StoreResult<()> {
        let deadline = deadline_after(ttl)?;
        let mut data = self.writer(&key);
        data.insert(key, Entry::expiring_at(value, deadline));
        Ok(())
    }

    /// Replaces the value and returns the previous one (GETSET).
    ///
    /// Clears any expiry, like a plain SET.
    pub fn get_set(&self, key: Bytes, value: Bytes) -> Option<Bytes> {
        let mut data = self.writer(&key);
        self.evict_if_expired(&mut data, &key);
        data.insert(key, Entry::new(value)).map(|old| old.value)
    }

    /// Removes a key and returns its value (GETDEL).
    pub fn get_del(&self, key: &Bytes) -> Option<Bytes> {
        let mut data = self.writer(key);
        self.evict_if_expired(&mut data, key);
        data.remove(key).map(|old| old.value)
    }

    // ========================================================================
    // Byte and range operations
    // ========================================================================

    /// Appends to a string, creating it if absent. Keeps the expiry.
    ///
    /// # Returns
    ///
    /// Returns the length of the string after the append.
    pub fn append(&self, key: &Bytes, suffix: &[u8]) -> StoreResult<usize> {
        let mut data = self.writer(key);

        let current_len = self
            .live_entry(&mut data, key)
            .map_or(0, |entry| entry.value.len());
        let new_len = current_len.saturating_add(suffix.len());
        check_size(new_len)?;

        let entry = self.entry_or_empty(&mut data, key);
        entry.edit(|buf| buf.extend_from_slice(suffix));
        Ok(new_len)
    }

    /// Gets the length of a string value (0 if absent).
    pub fn strlen(&self, key: &Bytes) -> usize {
        self.read_live(key, |entry| entry.value.len()).unwrap_or(0)
    }

    /// Returns the substring between `start` and `end`, both inclusive.
    ///
    /// Negative indices count from the end (-1 = last byte) and both bounds
    /// are clamped to the value. An empty range or a missing key yields an
    /// empty result.
    pub fn get_range(&self, key: &Bytes, start: i64, end: i64) -> Bytes {
        self.read_live(key, |entry| {
            byte_range(entry.value.len(), start, end)
                .map(|range| entry.value.slice(range))
                .unwrap_or_default()
        })
        .unwrap_or_default()
    }

    /// Overwrites part of a string starting at `offset` (SETRANGE).
    ///
    /// A gap between the current end and `offset` is filled with zero bytes.
    /// An absent key starts out empty. Keeps the expiry.
    ///
    /// # Returns
    ///
    /// Returns the length of the string after the write.
    pub fn set_range(&self, key: &Bytes, offset: i64, value: &[u8]) -> StoreResult<usize> {
        let offset = usize::try_from(offset)
            .map_err(|_| StoreError::invalid("offset is out of range"))?;
        let required = offset.saturating_add(value.len());
        if !value.is_empty() {
            check_size(required)?;
        }

        let mut data = self.writer(key);
        let entry = self.entry_or_empty(&mut data, key);
        if value.is_empty() {
            return Ok(entry.value.len());
        }

        Ok(entry.edit(|buf| {
            if buf.len() < required {
                buf.resize(required, 0);
            }
            buf[offset..required].copy_from_slice(value);
            buf.len()
        }))
    }

    // ========================================================================
    // Bit operations
    // ========================================================================

    /// Returns the bit at `offset` (most significant bit of byte 0 is bit 0).
    ///
    /// Offsets past the end read as 0.
    pub fn get_bit(&self, key: &Bytes, offset: i64) -> StoreResult<u8> {
        let (byte, shift) = bit_position(offset)?;
        Ok(self
            .read_live(key, |entry| {
                entry
                    .value
                    .get(byte)
                    .map_or(0, |&b| (b >> shift) & 1)
            })
            .unwrap_or(0))
    }

    /// Sets or clears the bit at `offset` and returns its previous value.
    ///
    /// Grows the value with zero bytes as needed. Keeps the expiry.
    pub fn set_bit(&self, key: &Bytes, offset: i64, bit: u8) -> StoreResult<u8> {
        if bit > 1 {
            return Err(StoreError::invalid("bit is not an integer or out of range"));
        }
        let (byte, shift) = bit_position(offset)?;
        check_size(byte + 1)?;

        let mut data = self.writer(key);
        let entry = self.entry_or_empty(&mut data, key);

        Ok(entry.edit(|buf| {
            if buf.len() <= byte {
                buf.resize(byte + 1, 0);
            }
            let previous = (buf[byte] >> shift) & 1;
            if bit == 1 {
                buf[byte] |= 1 << shift;
            } else {
                buf[byte] &= !(1 << shift);
            }
            previous
        }))
    }

    /// Counts set bits, optionally within a byte range.
    ///
    /// The range follows the same index rules as [`get_range`](Self::get_range).
    pub fn bit_count(&self, key: &Bytes, range: Option<(i64, i64)>) -> usize {
        let count = |bytes: &[u8]| bytes.iter().map(|b| b.count_ones() as usize).sum::<usize>();

        self.read_live(key, |entry| match range {
            None => count(&entry.value[..]),
            Some((start, end)) => byte_range(entry.value.len(), start, end)
                .map_or(0, |r| count(&entry.value[r])),
        })
        .unwrap_or(0)
    }

    // ========================================================================
    // Numeric operations
    // ========================================================================

    /// Increments an integer value by 1.
    pub fn incr(&self, key: &Bytes) -> StoreResult<i64> {
        self.incr_by(key, 1)
    }

    /// Decrements an integer value by 1.
    pub fn decr(&self, key: &Bytes) -> StoreResult<i64> {
        self.incr_by(key, -1)
    }

    /// Decrements an integer value by a specified amount.
    pub fn decr_by(&self, key: &Bytes, delta: i64) -> StoreResult<i64> {
        let delta = delta.checked_neg().ok_or(StoreError::OutOfRange)?;
        self.incr_by(key, delta)
    }

    /// Increments an integer value by a specified amount.
    ///
    /// If the key doesn't exist, it's set to 0 before the operation.
    /// Keeps the expiry of an existing key.
    pub fn incr_by(&self, key: &Bytes, delta: i64) -> StoreResult<i64> {
        let mut data = self.writer(key);

        let current = match self.live_entry(&mut data, key) {
            Some(entry) => numeric::parse_i64(&entry.value)?,
            None => 0,
        };
        let next = current.checked_add(delta).ok_or(StoreError::OutOfRange)?;

        self.entry_or_empty(&mut data, key).value = Bytes::from(next.to_string());
        Ok(next)
    }

    /// Increments a float value and returns its new canonical text.
    ///
    /// If the key doesn't exist, it's treated as 0. Keeps the expiry.
    pub fn incr_by_float(&self, key: &Bytes, delta: f64) -> StoreResult<String> {
        let mut data = self.writer(key);

        let current = match self.live_entry(&mut data, key) {
            Some(entry) => numeric::parse_f64(&entry.value)?,
            None => 0.0,
        };
        let next = current + delta;
        if !next.is_finite() {
            return Err(StoreError::NanOrInfinity);
        }

        let text = numeric::format_f64(next);
        self.entry_or_empty(&mut data, key).value = Bytes::from(text.clone());
        Ok(text)
    }

    // ========================================================================
    // Multi-key operations
    // ========================================================================

    /// Gets several keys at once, in input order.
    pub fn mget(&self, keys: &[Bytes]) -> Vec<Option<Bytes>> {
        self.read_count.fetch_add(1, Ordering::Relaxed);
        let mut locks = self.lock_keys(keys);

        keys.iter()
            .enumerate()
            .map(|(pos, key)| {
                self.live_entry(locks.shard(pos), key)
                    .map(|entry| entry.value.clone())
            })
            .collect()
    }

    /// Sets several keys at once. Later pairs win over earlier ones.
    pub fn mset(&self, pairs: Vec<(Bytes, Bytes)>) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
        let mut locks = self.lock_keys(pairs.iter().map(|(key, _)| key));

        for (pos, (key, value)) in pairs.into_iter().enumerate() {
            locks.shard(pos).insert(key, Entry::new(value));
        }
    }

    /// Sets several keys only if none of them exists.
    ///
    /// Returns `true` if every pair was written, `false` if nothing was.
    pub fn msetnx(&self, pairs: Vec<(Bytes, Bytes)>) -> bool {
        self.write_count.fetch_add(1, Ordering::Relaxed);
        let mut locks = self.lock_keys(pairs.iter().map(|(key, _)| key));

        let any_live = pairs
            .iter()
            .enumerate()
            .any(|(pos, (key, _))| self.live_entry(locks.shard(pos), key).is_some());
        if any_live {
            return false;
        }

        for (pos, (key, value)) in pairs.into_iter().enumerate() {
            locks.shard(pos).insert(key, Entry::new(value));
        }
        true
    }

    /// Deletes keys from the store.
    ///
    /// # Returns
    ///
    /// Returns the number of keys that were deleted.
    pub fn delete(&self, keys: &[Bytes]) -> u64 {
        self.write_count.fetch_add(1, Ordering::Relaxed);
        let mut locks = self.lock_keys(keys);

        let mut deleted = 0;
        for (pos, key) in keys.iter().enumerate() {
            let data = locks.shard(pos);
            self.evict_if_expired(data, key);
            if data.remove(key).is_some() {
                deleted += 1;
            }
        }
        deleted
    }

    /// Counts how many of the given keys exist. Repeated keys count each time.
    pub fn exists(&self, keys: &[Bytes]) -> u64 {
        self.read_count.fetch_add(1, Ordering::Relaxed);
        let mut locks = self.lock_keys(keys);

        keys.iter()
            .enumerate()
            .filter(|(pos, key)| self.live_entry(locks.shard(*pos), key).is_some())
            .count() as u64
    }

    // ========================================================================
    // Expiry
    // ========================================================================

    /// Sets a time-to-live on an existing key.
    ///
    /// A zero TTL deletes the key right away.
    ///
    /// # Returns
    ///
    /// Returns `true` if the key existed.
    pub fn expire(&self, key: &Bytes, ttl: Duration) -> StoreResult<bool> {
        let deadline = if ttl.is_zero() {
            None
        } else {
            Some(deadline_after(ttl)?)
        };

        let mut data = self.writer(key);
        let Some(entry) = self.live_entry(&mut data, key) else {
            return Ok(false);
        };
        match deadline {
            Some(deadline) => entry.expires_at = Some(deadline),
            None => {
                data.remove(key);
            }
        }
        Ok(true)
    }

    /// Removes the expiry from a key.
    ///
    /// # Returns
    ///
    /// Returns `true` if the key existed and had an expiry.
    pub fn persist(&self, key: &Bytes) -> bool {
        let mut data = self.writer(key);
        self.live_entry(&mut data, key)
            .and_then(|entry| entry.expires_at.take())
            .is_some()
    }

    /// Reports how long a key has left to live.
    pub fn ttl(&self, key: &Bytes) -> TtlState {
        match self.read_live(key, |entry| entry.expires_at) {
            None => TtlState::Missing,
            Some(None) => TtlState::Persistent,
            Some(Some(deadline)) => {
                TtlState::Remaining(deadline.saturating_duration_since(Instant::now()))
            }
        }
    }

    /// Removes every expired key from every shard.
    ///
    /// This is called by the background expiry sweeper.
    ///
    /// # Returns
    ///
    /// Returns the number of keys that were removed.
    pub fn purge_expired(&self) -> u64 {
        let mut removed = 0u64;

        for idx in 0..self.shards.len() {
            let mut data = self.write_shard(idx);
            let before = data.len();
            data.retain(|_, entry| !entry.is_expired());
            removed += (before - data.len()) as u64;
        }

        if removed > 0 {
            self.expired_count.fetch_add(removed, Ordering::Relaxed);
        }
        removed
    }

    // ========================================================================
    // Whole-store operations
    // ========================================================================

    /// Returns the number of stored keys, including expired keys that have
    /// not been evicted yet.
    pub fn len(&self) -> u64 {
        (0..self.shards.len())
            .map(|idx| self.read_shard(idx).len() as u64)
            .sum()
    }

    /// Returns true if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears all data from the store.
    pub fn flush(&self) {
        for idx in 0..self.shards.len() {
            self.write_shard(idx).clear();
        }
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            keys: self.len(),
            reads: self.read_count.load(Ordering::Relaxed),
            writes: self.write_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
        }
    }
}

/// Store statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of keys currently stored
    pub keys: u64,
    /// Total read operations
    pub reads: u64,
    /// Total write operations
    pub writes: u64,
    /// Total expired keys removed
    pub expired: u64,
}

/// Computes an absolute expiry time, rejecting zero and overflowing TTLs.
///
/// A TTL must be reportable as signed milliseconds, so anything past
/// `i64::MAX` ms is rejected too.
fn deadline_after(ttl: Duration) -> StoreResult<Instant> {
    if ttl.is_zero() || ttl.as_millis() > i64::MAX as u128 {
        return Err(StoreError::invalid("invalid expire time"));
    }
    Instant::now()
        .checked_add(ttl)
        .ok_or_else(|| StoreError::invalid("invalid expire time"))
}

fn check_size(len: usize) -> StoreResult<()> {
    if len > MAX_VALUE_SIZE {
        Err(StoreError::ValueTooLarge)
    } else {
        Ok(())
    }
}

/// Splits a bit offset into a byte index and a right-shift (MSB first).
fn bit_position(offset: i64) -> StoreResult<(usize, u32)> {
    if !(0..=MAX_BIT_OFFSET).contains(&offset) {
        return Err(StoreError::invalid(
            "bit offset is not an integer or out of range",
        ));
    }
    Ok(((offset >> 3) as usize, 7 - (offset & 7) as u32))
}

/// Resolves inclusive, possibly negative `start`/`end` against a value of
/// `len` bytes. Returns `None` when the range selects nothing.
fn byte_range(len: usize, start: i64, end: i64) -> Option<Range<usize>> {
    if len == 0 || (start < 0 && end < 0 && start > end) {
        return None;
    }

    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let end = if end < 0 { (len + end).max(0) } else { end.min(len - 1) };

    if start > end {
        return None;
    }
    Some(start as usize..end as usize + 1)
}
