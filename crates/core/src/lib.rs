//! Domain logic shared by every evently crate.
//!
//! Nothing in here touches the network or the database; the audience
//! resolver works on a pre-loaded [`graph::EventGraph`].

pub mod audience;
pub mod device;
pub mod error;
pub mod graph;
pub mod invite_token;
pub mod membership;
pub mod push;
pub mod realtime;
pub mod recurrence;
pub mod types;
