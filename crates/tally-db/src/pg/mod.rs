//! PostgreSQL repository implementations

mod account;
mod code;
mod habit;

pub use account::PgAccountRepository;
pub use code::PgRedeemCodeRepository;
pub use habit::PgHabitRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub accounts: PgAccountRepository,
    pub codes: PgRedeemCodeRepository,
    pub habits: PgHabitRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            accounts: PgAccountRepository::new(pool.clone()),
            codes: PgRedeemCodeRepository::new(pool.clone()),
            habits: PgHabitRepository::new(pool),
        }
    }
}
