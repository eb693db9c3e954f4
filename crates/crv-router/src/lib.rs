//! `crv-router` — envelopes, visibility scopes and delivery inboxes.
//!
//! An agent's action becomes an *action envelope*.  The router resolves its
//! visibility scope to a recipient set and fans it out into one *observation
//! envelope* per recipient, due at `now + max(1, delay)`.  Nothing routed
//! during tick `t` is visible before `t + 1`.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                 |
//! |--------------|----------------------------------------------------------|
//! | [`envelope`] | `EventEnvelope`, `Scope`, `Origin`, status and kind enums |
//! | [`payload`]  | `Payload` (typed action grammar), `canonical_key`        |
//! | [`router`]   | `EventRouter`, `ActionIntent`, `RoutedBatch`             |
//! | [`error`]    | `RouteError`, `RouteResult`                              |
//!
//! # Two-step routing
//!
//! Routing is split so the scheduler can commit atomically:
//!
//! ```text
//! ACT     router.plan(intents, now, &agents)  -> RoutedBatch   (&self)
//! COMMIT  router.commit(now, batch)           -> delivered     (&mut self)
//! ```
//!
//! `plan` never mutates; a cancelled tick simply drops its batch.

pub mod envelope;
pub mod error;
pub mod payload;
pub mod router;

#[cfg(test)]
mod tests;

pub use envelope::{EnvelopeKind, EnvelopeStatus, EventEnvelope, Origin, Scope};
pub use error::{RouteError, RouteResult};
pub use payload::Payload;
pub use router::{ActionIntent, EventRouter, RoutedBatch, delivery_tick};
