use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::iter::FromIterator;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{BtrfsError, Result};
use crate::locate;
use crate::parsing::{OutputParser, StringPair};
use crate::process::{run_logged, CommandResult, CommandRunner, DuctRunner};

pub const BTRFS_EXE_NAME: &str = "btrfs";

macro_rules! btrfs_args {
    ( $( $arg:expr ),+ ) => {
        [ $( AsRef::<OsStr>::as_ref(&$arg) ),+ ]
    };
}

/// Attributes printed by `btrfs subvolume show`, keyed by their label.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct SubvolumeInfo(BTreeMap<String, String>);

impl SubvolumeInfo {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Typed view of the well known attributes. `-` marks an absent value.
    pub fn summary(&self) -> Result<SubvolumeSummary> {
        envy::from_iter::<_, SubvolumeSummary>(self.iter().filter_map(|(k, v)| match v.as_str() {
            "-" => None,
            _ => Some((k.to_uppercase(), v.clone())),
        }))
        .map_err(BtrfsError::UnexpectedSubvolumeInfo)
    }
}

impl FromIterator<StringPair> for SubvolumeInfo {
    fn from_iter<I: IntoIterator<Item = StringPair>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a SubvolumeInfo {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SubvolumeSummary {
    pub name: Option<String>,
    pub uuid: Uuid,
    #[serde(rename = "parent uuid")]
    pub parent_uuid: Option<Uuid>,
    #[serde(rename = "received uuid")]
    pub received_uuid: Option<Uuid>,
    #[serde(rename = "subvolume id")]
    pub subvolume_id: Option<u64>,
}

/// `major.minor` of the installed btrfs-progs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BtrfsVersion {
    text: String,
    major: u32,
    minor: u32,
}

impl BtrfsVersion {
    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for BtrfsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Runs the `btrfs` executable and decodes what it prints.
///
/// The executable path is fixed at construction. Every operation spawns exactly
/// one child process and blocks until it has exited.
#[derive(Debug)]
pub struct BtrfsClient<R = DuctRunner> {
    executable: PathBuf,
    runner: R,
    parser: OutputParser,
}

impl BtrfsClient<DuctRunner> {
    /// Uses `executable` as given, or searches `PATH` for `btrfs` when `None`.
    pub fn new(executable: Option<PathBuf>) -> Result<Self> {
        let executable = match executable {
            Some(path) => path,
            None => locate::find_executable(BTRFS_EXE_NAME)?,
        };
        Ok(Self::with_runner(executable, DuctRunner))
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.btrfs_exe.clone())
    }
}

impl<R: CommandRunner> BtrfsClient<R> {
    pub fn with_runner(executable: PathBuf, runner: R) -> Self {
        Self {
            executable,
            runner,
            parser: OutputParser::new(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Runs `btrfs` with `args`. A non-zero exit code is returned, not raised.
    pub fn invoke<I, S>(&self, args: I) -> Result<CommandResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
        run_logged(&self.runner, &self.executable, &args)
    }

    fn invoke_checked(&self, args: &[&OsStr]) -> Result<CommandResult> {
        self.invoke(args)?.into_result()
    }

    pub fn create_snapshot<P: AsRef<Path>, Q: AsRef<Path>>(&self, source: P, dest: Q) -> Result<()> {
        self.invoke_checked(&btrfs_args!("subvolume", "snapshot", source.as_ref(), dest.as_ref()))?;
        Ok(())
    }

    pub fn delete_snapshot<P: AsRef<Path>>(&self, name: P) -> Result<()> {
        self.invoke_checked(&btrfs_args!("subvolume", "delete", name.as_ref()))?;
        Ok(())
    }

    pub fn list_subvolumes<P: AsRef<Path>>(&self, path: P) -> Result<Vec<String>> {
        let output = self.invoke_checked(&btrfs_args!("subvolume", "list", path.as_ref()))?;
        Ok(self.parser.subvolume_paths(&output.stdout))
    }

    pub fn show_subvolume<P: AsRef<Path>>(&self, path: P) -> Result<SubvolumeInfo> {
        let output = self.invoke_checked(&btrfs_args!("subvolume", "show", path.as_ref()))?;
        Ok(self.parser.subvolume_info(&output.stdout))
    }

    /// True when `btrfs subvolume list` succeeds on `path`. Never fails.
    pub fn is_btrfs_path<P: AsRef<Path>>(&self, path: P) -> bool {
        match self.invoke(&btrfs_args!("subvolume", "list", path.as_ref())) {
            Ok(output) => output.success(),
            Err(e) => {
                debug!("Treating {:?} as not btrfs: {}", path.as_ref(), e);
                false
            }
        }
    }

    pub fn version(&self) -> Result<BtrfsVersion> {
        let output = self.invoke_checked(&btrfs_args!("version"))?;
        let malformed = || BtrfsError::MalformedOutput {
            command: "version",
            stdout: output.stdout.clone(),
        };
        let (major, minor) = self.parser.version(&output.stdout).ok_or_else(malformed)?;
        Ok(BtrfsVersion {
            text: format!("{}.{}", major, minor),
            major: major.parse().map_err(|_| malformed())?,
            minor: minor.parse().map_err(|_| malformed())?,
        })
    }
}
