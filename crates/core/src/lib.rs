//! Core type aliases, identity types, and tunable constants for felt.
//!
//! This crate provides the foundational types and configuration parameters
//! used throughout the felt workspace.

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Chip counts: stacks, bets, pot amounts. Never negative.
pub type Chips = u64;
/// Seat index in table order (0 = first seat filled).
pub type Position = usize;
/// Strictly increasing per-table event counter.
pub type Sequence = u64;
/// Wall-clock instant in milliseconds since the unix epoch.
pub type Millis = u64;

// ============================================================================
// TRAITS
// ============================================================================
/// Unique identifier trait for domain entities.
pub trait Unique<T = Self> {
    fn id(&self) -> ID<T>;
}

// ============================================================================
// IDENTITY TYPES
// ============================================================================
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;
use std::str::FromStr;

/// A typed handle over a v7 uuid: `ID<Seat>` and `ID<TableState>` cannot
/// be mixed up at compile time even though both are uuids on the wire.
///
/// v7's timestamp prefix keeps freshly minted ids roughly creation-ordered,
/// so they double as stable sort keys in logs and replay metadata. The
/// phantom is `fn() -> T` rather than `T` so a handle is always
/// `Send + Sync + 'static`, whatever its marker type is.
pub struct ID<T> {
    raw: uuid::Uuid,
    tag: PhantomData<fn() -> T>,
}

impl<T> ID<T> {
    const fn wrap(raw: uuid::Uuid) -> Self {
        Self {
            raw,
            tag: PhantomData,
        }
    }
    /// Mints a fresh, creation-ordered id.
    pub fn fresh() -> Self {
        Self::wrap(uuid::Uuid::now_v7())
    }
    pub fn inner(&self) -> uuid::Uuid {
        self.raw
    }
    /// Reinterprets the marker type, keeping the underlying uuid.
    pub fn cast<U>(self) -> ID<U> {
        ID::wrap(self.raw)
    }
}

impl<T> Default for ID<T> {
    fn default() -> Self {
        Self::fresh()
    }
}

impl<T> From<uuid::Uuid> for ID<T> {
    fn from(raw: uuid::Uuid) -> Self {
        Self::wrap(raw)
    }
}
impl<T> From<ID<T>> for uuid::Uuid {
    fn from(id: ID<T>) -> Self {
        id.raw
    }
}

impl<T> FromStr for ID<T> {
    type Err = uuid::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<uuid::Uuid>().map(Self::wrap)
    }
}

// manual impls: derives would demand the marker type satisfy each trait,
// and markers are often zero-sized never-constructed types
impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}
impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.raw.cmp(&other.raw)
    }
}
impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Hash for ID<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for ID<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID({})", self.raw)
    }
}
impl<T> fmt::Display for ID<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

impl<T> serde::Serialize for ID<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.raw.serialize(serializer)
    }
}
impl<'de, T> serde::Deserialize<'de> for ID<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        uuid::Uuid::deserialize(deserializer).map(Self::wrap)
    }
}

// ============================================================================
// TABLE PARAMETERS
// ============================================================================
/// Fewest seats a hand can be dealt with.
pub const MIN_SEATS: usize = 2;
/// Default table capacity.
pub const DEFAULT_MAX_SEATS: usize = 9;
/// Default per-decision budget in seconds.
pub const DEFAULT_TURN_TIME_SECS: u64 = 30;
/// Fraction of the turn budget after which a warning is sent.
pub const TURN_WARNING_FRACTION: f64 = 0.8;
/// Default pause between hand end and the next hand start, in milliseconds.
pub const DEFAULT_HAND_START_DELAY_MS: Millis = 2_000;
/// How long an empty table lingers before it is torn down, in milliseconds.
pub const EMPTY_TABLE_CLEANUP_MS: Millis = 5_000;

// ============================================================================
// REPLAY PARAMETERS
// ============================================================================
/// A checkpoint snapshot is stored every this many recorded events.
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 50;
/// Completed replays retained in memory before oldest-first eviction.
pub const DEFAULT_MAX_REPLAYS_IN_MEMORY: usize = 100;

/// Current wall-clock time in milliseconds since the unix epoch.
pub fn now_millis() -> Millis {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as Millis)
        .unwrap_or(0)
}
