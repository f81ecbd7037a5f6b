// IronClust installation probe and version lookup

use std::fs;
use std::path::{Path, PathBuf};

use crate::shell::absolute_path;

pub const UNKNOWN_VERSION: &str = "unknown";

/// Marker file whose presence identifies an IronClust checkout
pub fn marker_path(install_path: &Path) -> PathBuf {
    install_path.join("matlab").join("irc2.m")
}

pub fn version_path(install_path: &Path) -> PathBuf {
    install_path.join("matlab").join("version.txt")
}

fn strip_quotes(raw: &str) -> &str {
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

/// Strip one pair of enclosing quotes and make the path absolute
pub fn resolve_install_path(raw: &str) -> PathBuf {
    absolute_path(Path::new(strip_quotes(raw)))
}

/// True iff `<path>/matlab/irc2.m` is a file
pub fn check_if_installed(path: Option<&str>) -> bool {
    match path {
        Some(raw) => marker_path(&resolve_install_path(raw)).is_file(),
        None => false,
    }
}

/// Extract the literal from a `version = <literal>` line
///
/// Accepts single- or double-quoted strings and bare tokens; nothing is evaluated.
pub fn parse_version_line(line: &str) -> Option<String> {
    let rest = line.trim_start();
    let ident_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if &rest[..ident_len] != "version" {
        return None;
    }

    let rest = rest[ident_len..].trim_start().strip_prefix('=')?.trim_start();

    let (value, tail) = match rest.chars().next()? {
        quote @ ('"' | '\'') => {
            let body = &rest[1..];
            let mut value = String::new();
            let mut chars = body.char_indices();
            let mut end = None;
            while let Some((i, c)) = chars.next() {
                match c {
                    '\\' => {
                        if let Some((_, escaped)) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    c if c == quote => {
                        end = Some(i + 1);
                        break;
                    }
                    c => value.push(c),
                }
            }
            (value, &body[end?..])
        }
        _ => {
            let len = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+')))
                .unwrap_or(rest.len());
            (rest[..len].to_string(), &rest[len..])
        }
    };

    let tail = tail.trim_start();
    let tail = tail.strip_prefix(';').unwrap_or(tail).trim_start();
    if !(tail.is_empty() || tail.starts_with('#')) || value.is_empty() {
        return None;
    }

    Some(value)
}

/// Version declared in `<path>/matlab/version.txt`, or "unknown"
pub fn read_version(install_path: &Path) -> String {
    let contents = match fs::read_to_string(version_path(install_path)) {
        Ok(contents) => contents,
        Err(_) => return UNKNOWN_VERSION.to_string(),
    };

    let first_line = contents.lines().next().unwrap_or("");
    match parse_version_line(first_line) {
        Some(version) => version,
        None => {
            log::warn!("Could not parse IronClust version line: {:?}", first_line);
            UNKNOWN_VERSION.to_string()
        }
    }
}
