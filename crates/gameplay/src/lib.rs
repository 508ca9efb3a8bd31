//! Per-table game engine for No-Limit Texas Hold'em.
//!
//! This crate is the functional core of a live table: it enforces the rules
//! of the game, forms and distributes pots, and emits an ordered stream of
//! events describing everything that happened. It performs no I/O and holds
//! no locks; the gameroom crate drives it from a per-table command queue.
//!
//! ## Core Types
//!
//! - [`Engine`] — Orchestrates one table's hand lifecycle and emits events
//! - [`TableState`] — Seats, positions, board, phase, current-to-act
//! - [`Seat`] — Per-player chips, commitments, status, hole cards
//! - [`Pot`] — Side-pot layering derived from the contribution ledger
//! - [`Rules`] — Legality of a seat's intended action
//!
//! ## Events & Views
//!
//! - [`GameEvent`] — Tagged event envelope broadcast by the engine
//! - [`TableView`] / [`BotView`] — Per-audience projections with hole-card
//!   secrecy centralized in one place
mod action;
mod config;
mod engine;
mod event;
mod phase;
mod pot;
mod rules;
mod seat;
mod table;
mod view;

pub use action::*;
pub use config::*;
pub use engine::*;
pub use event::*;
pub use phase::*;
pub use pot::*;
pub use rules::*;
pub use seat::*;
pub use table::*;
pub use view::*;
