//! Profile management.
//!
//! Parents create child profiles (with a starter account), edit profiles
//! they are related to, and remove a child together with everything the
//! child owns.

pub mod service;

pub use service::ProfileService;
