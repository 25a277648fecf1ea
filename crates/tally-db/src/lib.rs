//! Tally DB - Database abstractions
//!
//! SQLx-based database layer for Tally services.
//!
//! # Example
//!
//! ```rust,ignore
//! use tally_db::{create_pool, Repositories};
//!
//! let pool = create_pool("postgres://localhost/tally", 10).await?;
//! let repos = Repositories::new(pool);
//!
//! let account = repos.accounts.find_by_email("user@example.com").await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, DbPool};
pub use repo::*;
