//! Async runtime for a fleet of live poker tables.
//!
//! Each table is a single-writer, serialized unit: a [`Room`] task owns its
//! [`Engine`](felt_gameplay::Engine) outright and drains an inbound command
//! queue, so timers, session messages, and lifecycle operations can never
//! interleave mid-mutation. Distinct tables share nothing mutable.
//!
//! ## Architecture
//!
//! - [`Controller`] — Owns the game map and seat map under one coarse lock,
//!   creates and removes rooms, and routes commands to them
//! - [`Room`] — Per-table actor: applies commands, fans events out to
//!   subscribers (projected per audience), feeds the replay recorder, and
//!   schedules hand starts and cleanups
//! - [`TurnTimer`] — Per-turn deadline with a warning at 80% of the budget;
//!   firings post commands back onto the table's queue and are checked for
//!   staleness at dequeue time
mod command;
mod controller;
mod registry;
mod room;
mod timer;

pub use command::*;
pub use controller::*;
pub use registry::*;
pub use room::*;
pub use timer::*;
