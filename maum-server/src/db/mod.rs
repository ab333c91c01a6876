//! Database layer - connection pool, schema and repositories
//!
//! - Connection pool, no shared connection behind a mutex
//! - Rely on DB constraints and ON CONFLICT, no check-then-insert
//! - Usage limits enforced inside the INSERT statement itself

pub mod migrations;
pub mod pool;
pub mod repos;

pub use pool::{create_pool, create_pool_with_options, ping};
pub use repos::*;
