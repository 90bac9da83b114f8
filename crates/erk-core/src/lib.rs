pub mod config;
pub mod error;
pub mod io;
pub mod issue_store;
pub mod objective;
pub mod paths;
pub mod roadmap;
pub mod types;

pub use error::{ErkError, Result};
