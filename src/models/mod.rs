pub mod preferences;
pub mod protocol;
pub mod publish;
pub mod risk_data;
pub mod weights;

pub use preferences::*;
pub use protocol::*;
pub use publish::*;
pub use risk_data::*;
pub use weights::*;
