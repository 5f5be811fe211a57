use serde::Deserialize;
use std::path::PathBuf;

pub const ENV_PREFIX: &str = "SNAPROTATE_";

/// Settings read from `SNAPROTATE_*` environment variables.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Explicit path to the btrfs executable; skips the `PATH` search.
    pub btrfs_exe: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed(ENV_PREFIX).from_env::<Self>()
    }

    pub fn from_iter<I: IntoIterator<Item = (String, String)>>(vars: I) -> Result<Self, envy::Error> {
        envy::prefixed(ENV_PREFIX).from_iter::<_, Self>(vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn reads_prefixed_btrfs_exe() {
        let config = Config::from_iter(vars(&[
            ("SNAPROTATE_BTRFS_EXE", "/usr/local/sbin/btrfs"),
            ("BTRFS_EXE", "/ignored"),
        ]))
        .unwrap();

        assert_eq!(config.btrfs_exe, Some(PathBuf::from("/usr/local/sbin/btrfs")));
    }

    #[test]
    fn empty_environment_is_default() {
        assert_eq!(Config::from_iter(vars(&[("HOME", "/root")])).unwrap(), Config::default());
    }
}
