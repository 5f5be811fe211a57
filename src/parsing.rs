use regex::Regex;
use std::iter::FromIterator;

pub type StringPair = (String, String);

/// Parsers for the text formats printed by `btrfs`. Each format has exactly one
/// function here so that a change in the tool's layout stays local.
#[derive(Debug, Clone)]
pub struct OutputParser {
    show_line: Regex,
    version: Regex,
}

impl Default for OutputParser {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputParser {
    pub fn new() -> Self {
        Self {
            show_line: Regex::new(r"^([a-zA-Z ()]+):\s*(\S.*)").unwrap(),
            version: Regex::new(r"^btrfs-progs v([0-9]+)\.([0-9]+)").unwrap(),
        }
    }

    /// `btrfs subvolume list`: the path is the ninth space-separated field,
    /// following a literal `path` token.
    pub fn subvolume_paths(&self, data: &str) -> Vec<String> {
        data.lines()
            .filter_map(|line| {
                let fields: Vec<&str> = line.split(' ').collect();
                match fields.as_slice() {
                    [_, _, _, _, _, _, _, "path", path, ..] => Some(path.to_string()),
                    _ => None,
                }
            })
            .collect()
    }

    /// `btrfs subvolume show`: `Key: value` lines. Lines without a value are
    /// skipped.
    pub fn subvolume_info<T: FromIterator<StringPair>>(&self, data: &str) -> T {
        data.lines()
            .filter_map(|line| {
                self.show_line
                    .captures(line.trim())
                    .map(|c| (c[1].to_string(), c[2].to_string()))
            })
            .collect()
    }

    /// `btrfs version`: returns major and minor from the banner.
    pub fn version<'a>(&self, data: &'a str) -> Option<(&'a str, &'a str)> {
        self.version.captures(data).and_then(|c| {
            let major = c.get(1)?.as_str();
            let minor = c.get(2)?.as_str();
            Some((major, minor))
        })
    }
}
