//! Parent/child relationship graph.
//!
//! Many-to-many edges between parent and child profiles. Adding an edge that
//! already exists is a no-op; the invite-acceptance fan-out relies on that.

pub mod service;

pub use service::FamilyService;
