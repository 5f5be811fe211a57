use thiserror::Error;

#[derive(Error, Debug)]
pub enum BtrfsError {
    #[error("Could not find the {name} executable in the search path.")]
    ExecutableNotFound { name: String },

    #[error("Failed to run {command}.")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("btrfs exited with code {exit_code}: {}", stderr.trim())]
    Execution {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("Unexpected output from btrfs {command}: {:?}", stdout.trim())]
    MalformedOutput { command: &'static str, stdout: String },

    #[error("Failed loading information from btrfs subvolume output.")]
    UnexpectedSubvolumeInfo(#[source] envy::Error),
}

pub type Result<T> = std::result::Result<T, BtrfsError>;
