pub mod dashboard_orchestrator;
pub mod fetch_client;
pub mod preference_store;
pub mod synthetic_data;

pub use dashboard_orchestrator::*;
pub use fetch_client::*;
pub use preference_store::*;
pub use synthetic_data::*;
