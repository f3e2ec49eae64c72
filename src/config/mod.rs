//! Configuration: environment-driven settings plus the constants shared by
//! the HTTP layer, the checkout code generator and the stores.

mod constants;
mod settings;

pub use constants::*;
pub use settings::Config;
