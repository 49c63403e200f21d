mod access_guard;
pub mod actions;
mod app_state;
mod credentials;
mod ingestion;
mod query;
mod session_store;
mod settings_store;

pub use access_guard::*;
pub use app_state::*;
pub use credentials::*;
pub use ingestion::*;
pub use query::*;
pub use session_store::*;
pub use settings_store::*;
