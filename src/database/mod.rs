//! PostgreSQL Database Module
//!
//! Durable backing for the reputation store.

pub mod pool;
pub mod reputation;

pub use pool::DatabasePool;
pub use reputation::ReputationRepository;
