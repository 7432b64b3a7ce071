use tracing::trace;

use crate::session::DirEntry;

/// Index of the first name token for toybox output: mode, links, owner,
/// group, size, `YYYY-MM-DD`, `HH:MM`.
const ISO_NAME_FIELD: usize = 7;
/// Same for the `Mon D HH:MM` date style, which takes one more token.
const CLASSIC_NAME_FIELD: usize = 8;

const SIZE_FIELD: usize = 4;
const DATE_FIELD: usize = 5;

fn name_field(tokens: &[&str]) -> usize {
    // device nodes print `major, minor` where the size goes
    let shift = match tokens.get(SIZE_FIELD) {
        Some(size) if size.ends_with(',') => 1,
        _ => 0,
    };
    match tokens.get(DATE_FIELD + shift) {
        Some(date) if date.starts_with(|c: char| c.is_ascii_digit()) && date.contains('-') => {
            ISO_NAME_FIELD + shift
        }
        _ => CLASSIC_NAME_FIELD + shift,
    }
}

/// Parse `ls -la` output from the device into entries, in output order.
///
/// The name is every token from the name field on, so names with spaces
/// survive. The `total` line, short lines and the `.`/`..` rows are skipped.
/// Symlink rows keep only the link name, not the `-> target` part.
pub fn parse_listing(raw: &str) -> Vec<DirEntry> {
    let mut entries = Vec::new();

    for line in raw.lines().filter(|line| !line.trim().is_empty()) {
        let tokens: Vec<&str> = line.split_whitespace().collect();

        if tokens.first() == Some(&"total") {
            continue;
        }
        let field = name_field(&tokens);
        if tokens.len() <= field {
            trace!("skipping malformed listing line: {:?}", line);
            continue;
        }

        let mut name = tokens[field..].join(" ");
        if tokens[0].starts_with('l') {
            if let Some(idx) = name.find(" -> ") {
                name.truncate(idx);
            }
        }
        if name == "." || name == ".." {
            continue;
        }

        let is_folder = tokens[0].starts_with('d');
        entries.push(DirEntry::new(name, is_folder));
    }

    entries
}
