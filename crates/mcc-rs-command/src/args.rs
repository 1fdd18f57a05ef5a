//! Helpers for splitting and validating command arguments.

use std::str::FromStr;

use crate::CommandResult;

/// Split `"/name arg1 arg2"` into a lowercase name and its arguments.
/// Returns `None` for a blank line.
pub fn split_line(line: &str) -> Option<(String, Vec<String>)> {
    let line = line.trim_start();
    let line = line.strip_prefix('/').unwrap_or(line);
    let mut words = line.split_whitespace();
    let name = words.next()?.to_ascii_lowercase();
    Some((name, words.map(String::from).collect()))
}

/// Parse a numeric argument, failing with a message the sender understands.
pub fn parse_number<T: FromStr>(arg: &str) -> Result<T, CommandResult> {
    arg.parse()
        .map_err(|_| CommandResult::err(format!("{arg} is not a valid number")))
}

/// Whether `name` is a usable player or level name: 1 to `max_len`
/// characters from `[A-Za-z0-9_.]`.
pub fn is_valid_name(name: &str, max_len: usize) -> bool {
    !name.is_empty()
        && name.len() <= max_len
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}
