pub mod accounts;
pub mod attempts;
pub mod pool;

pub use accounts::PgCredentialStore;
pub use attempts::PgAttemptStore;
pub use pool::{create_pool, run_migrations};
