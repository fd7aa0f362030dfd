//! Parent and child invitation workflows.
//!
//! Two structurally similar token-gated state machines, each
//! `pending -> {accepted | expired | cancelled}`, single-use, with a seven
//! day expiry computed at creation. Accepting a parent invite fans the new
//! relationship out to every child of the inviter; accepting a child invite
//! migrates the provisional child profile onto the authenticated one.

pub mod service;
pub mod token;

pub use service::InviteService;

/// Invite lifetime in days.
pub const INVITE_TTL_DAYS: i64 = 7;
