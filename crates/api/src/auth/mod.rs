//! Authentication primitives.
//!
//! - [`jwt`] -- HS256 access-token validation (and generation, for tooling
//!   and tests; login itself is handled by a separate identity service).

pub mod jwt;
