//! `burrowworld`: the colony simulation behind burrowd.
//!
//! One [`World`] holds the dwarf roster, the named locations, a bounded
//! activity feed, and its own deterministic RNG stream. Time advances only
//! through [`SimClock`]: whole simulated seconds, caught up lazily under a
//! single lock, so request handlers and the background driver can share the
//! world without ever observing a stale or half-ticked state.

pub mod clock;
pub mod world;

pub use clock::{unix_now, SimClock, SimState};
pub use world::{Dwarf, Feed, FeedLine, Location, World};
