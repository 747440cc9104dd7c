//! The refresh-and-retry session protocol.

mod executor;
mod refresh;
mod terminate;

pub use executor::AuthenticatedRequestExecutor;
pub use refresh::RefreshCoordinator;
pub use terminate::{LoggingNavigator, Navigator, SessionTerminator};
