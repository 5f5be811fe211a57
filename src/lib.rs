mod parsing;
mod process;

pub mod btrfs;
pub mod config;
pub mod error;
pub mod locate;

pub use btrfs::{BtrfsClient, BtrfsVersion, SubvolumeInfo, SubvolumeSummary};
pub use config::Config;
pub use error::{BtrfsError, Result};
pub use process::{CommandResult, CommandRunner, DuctRunner};
