use std::{fs, io, path::Path};

use crate::pattern::Pattern;

/// One entry of the ownership manifest: a compiled pattern, the owner tokens
/// that followed it, and the 1-based line it came from. Owners are carried
/// for diagnostics only; matching never looks at them.
#[derive(Debug, Clone)]
pub struct Rule {
    pub pattern: Pattern,
    pub owners: Vec<String>,
    pub line: usize,
}

/// Parse an ownership manifest from a string. A line is a rule when it is
/// non-empty after trimming and does not start with `#`; the first
/// whitespace-delimited token is the pattern, the remaining tokens up to a
/// `#` comment are owners.
pub fn parse(source: &str) -> Vec<Rule> {
    source
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let mut tokens = line.split_whitespace();
            let pattern = tokens.next()?;
            let owners = tokens
                .take_while(|token| !token.starts_with('#'))
                .map(str::to_owned)
                .collect();
            Some(Rule {
                pattern: Pattern::new(pattern),
                owners,
                line: idx + 1,
            })
        })
        .collect()
}

/// Parse an ownership manifest from a file path.
pub fn parse_file(path: &Path) -> io::Result<Vec<Rule>> {
    Ok(parse(&fs::read_to_string(path)?))
}
