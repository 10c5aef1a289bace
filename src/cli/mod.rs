//! CLI command implementations

pub mod download;
pub mod error;
pub mod validate;

pub use download::{Cli, Commands, DownloadArgs};
pub use error::CliError;
pub use validate::{validate_years, ValidateCommand};
