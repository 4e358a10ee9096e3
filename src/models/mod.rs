//! Persisted entities of the board that the admin backend reads directly.
//!
//! Rows edited only through the generic model views (posts, banners,
//! verified tripcodes) have no struct here; see `views`.

pub mod ban;
pub mod session;
pub mod user;
