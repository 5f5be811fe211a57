use log::trace;
use std::env;
use std::ffi::OsStr;
use std::path::PathBuf;

use crate::error::{BtrfsError, Result};

/// Resolves `name` against the directories of the `PATH` environment variable.
pub fn find_executable(name: &str) -> Result<PathBuf> {
    match env::var_os("PATH") {
        Some(search_path) => find_executable_in(name, search_path),
        None => Err(not_found(name)),
    }
}

/// Resolves `name` against an explicit search path (directories separated the
/// same way as `PATH`). The first existing, executable file wins.
pub fn find_executable_in<S: AsRef<OsStr>>(name: &str, search_path: S) -> Result<PathBuf> {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
    let found = which::which_in(name, Some(search_path), cwd).map_err(|_| not_found(name))?;
    trace!("Resolved {} to {:?}.", name, found);
    Ok(found)
}

fn not_found(name: &str) -> BtrfsError {
    BtrfsError::ExecutableNotFound { name: name.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fake::write_script;
    use std::fs::File;

    fn join(dirs: &[&std::path::Path]) -> std::ffi::OsString {
        env::join_paths(dirs).unwrap()
    }

    #[test]
    fn first_match_in_path_order_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write_script(second.path(), "btrfs", "exit 0\n");
        let expected = write_script(first.path(), "btrfs", "exit 0\n");

        let found = find_executable_in("btrfs", join(&[first.path(), second.path()])).unwrap();

        assert_eq!(found, expected);
    }

    #[test]
    fn non_executable_file_is_skipped() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        File::create(first.path().join("btrfs")).unwrap();
        let expected = write_script(second.path(), "btrfs", "exit 0\n");

        let found = find_executable_in("btrfs", join(&[first.path(), second.path()])).unwrap();

        assert_eq!(found, expected);
    }

    #[test]
    fn absent_everywhere_is_not_found() {
        let empty = tempfile::tempdir().unwrap();

        let err = find_executable_in("btrfs", join(&[empty.path()])).unwrap_err();

        assert!(matches!(err, BtrfsError::ExecutableNotFound { name } if name == "btrfs"));
    }
}
