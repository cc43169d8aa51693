pub mod api;
mod cli;
pub mod combine;
pub mod config;
pub mod decode;
pub mod records;
pub mod schema;
#[cfg(feature = "tests")]
pub mod test_utils;
pub mod views;

pub use cli::CliOptions;

pub const STOREVIEW_VERSION: &str = env!("CARGO_PKG_VERSION");
