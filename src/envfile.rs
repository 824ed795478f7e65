// Env file parsing - KEY=VALUE lines into an ordered mapping

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Error;

/// Key/value mapping parsed from one environment file.
///
/// Keys iterate in lexicographic order. A key repeated within one file keeps
/// the last value seen.
pub type EnvMap = BTreeMap<String, String>;

/// Read and parse one env file.
pub fn load(path: &Path) -> Result<EnvMap, Error> {
    let contents = std::fs::read_to_string(path)?;
    Ok(parse(&contents))
}

/// Each line is trimmed, then skipped if empty or starting with `#`.
/// The rest are split on the first `=` only; everything after it is the
/// value, kept verbatim (quotes, further `=` signs, leading spaces).
/// Lines without `=` are ignored. Existing env files in the wild rely on
/// this exact behavior, so no quoting or escape handling is applied.
pub fn parse(contents: &str) -> EnvMap {
    let mut vars = EnvMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            vars.insert(key.to_string(), value.to_string());
        }
    }
    vars
}
