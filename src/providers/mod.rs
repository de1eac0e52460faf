//! Vault providers backed by the vendors' command line tools.

pub mod bitwarden;
pub mod cli;
pub mod onepassword;

pub use bitwarden::BitwardenCli;
pub use cli::{CliCommand, CliError, CliOutput};
pub use onepassword::OnePasswordCli;
