pub mod ccb;
pub mod config;
pub mod errors;
pub mod socket;
pub mod utils;

pub use ccb::{Bill, CcbClient};
pub use config::Configuration;
pub use errors::{PayError, Result};
