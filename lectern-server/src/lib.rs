//! # Lectern Server
//!
//! Progress backend for the Lectern lesson platform:
//!
//! - **Catalog**: course and section/lecture listings
//! - **Progress**: per-(user, lecture) position and completion upserts with
//!   transactional per-course aggregate recomputation
//! - **Health**: the liveness probe playing clients use as their one-shot
//!   reachability check
//!
//! Built on Axum over PostgreSQL, with the schema owned by embedded sqlx
//! migrations. A demo user and course are seeded until real account
//! management lands.

pub mod config;
pub mod error;
pub mod handlers;
pub mod repo;
pub mod routes;
pub mod state;
