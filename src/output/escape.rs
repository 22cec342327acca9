//! Path rendering for line-oriented output.
//!
//! Reports and script comments are read line by line, so a path must never
//! contribute a line break. Control characters are written as Rust-style
//! escapes (`\n`, `\t`, `\u{1b}`) and bytes that are not UTF-8 as `\xNN`.

use std::fmt::Write as _;
use std::path::Path;

/// Single-line, lossless rendering of `path` for humans.
#[must_use]
pub fn display_path(path: &Path) -> String {
    let bytes = path.as_os_str().as_encoded_bytes();
    let mut out = String::with_capacity(bytes.len());

    for chunk in bytes.utf8_chunks() {
        for c in chunk.valid().chars() {
            if c.is_control() {
                out.extend(c.escape_default());
            } else {
                out.push(c);
            }
        }
        for byte in chunk.invalid() {
            let _ = write!(out, "\\x{byte:02x}");
        }
    }

    out
}

/// Whether `path` renders unchanged through [`display_path`].
#[must_use]
pub fn is_plain(path: &Path) -> bool {
    path.to_str()
        .is_some_and(|s| !s.chars().any(char::is_control))
}
