pub mod bootstrap;
pub mod pool;
pub mod tasks;

pub use bootstrap::{BootstrapOutcome, ensure_schema};
pub use pool::{ConnectionManager, DbConn};
