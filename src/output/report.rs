//! Human-readable duplicate report.
//!
//! ```text
//! # 2.0 KiB in potential savings
//! 1024	5e8f2a1c03b7d94e	/photos/a.jpg
//! 1024	5e8f2a1c03b7d94e	/photos/copy of a.jpg
//! 1024	5e8f2a1c03b7d94e	/backup/a.jpg
//! # 12 B in potential savings
//! 12	0b1c9d8e7f6a5b4c	/notes/todo.txt
//! 12	0b1c9d8e7f6a5b4c	/backup/todo.txt
//! ================================================================================
//! # 2.0 KiB in total potential savings
//! ```
//!
//! Groups appear in rank order; within a group the preserved copy comes
//! first. The separator and total are printed even when nothing was found.
//! Control characters in paths are escaped, so every member is one line.

use std::io::Write;

use bytesize::ByteSize;

use super::escape::display_path;
use crate::duplicates::SavingsReport;

/// Width of the separator line before the total.
pub const SEPARATOR_WIDTH: usize = 80;

/// Text formatter for a [`SavingsReport`].
#[derive(Debug, Clone, Copy)]
pub struct TextReport<'a> {
    report: &'a SavingsReport,
}

impl<'a> TextReport<'a> {
    /// Create a formatter over a ranked report.
    #[must_use]
    pub fn new(report: &'a SavingsReport) -> Self {
        Self { report }
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for entry in self.report {
            writeln!(
                writer,
                "# {} in potential savings",
                ByteSize::b(entry.redundant_bytes)
            )?;
            let hash = entry.group.hash_hex();
            for file in &entry.group.files {
                writeln!(writer, "{}\t{}\t{}", file.size, hash, display_path(&file.path))?;
            }
        }

        writeln!(writer, "{}", "=".repeat(SEPARATOR_WIDTH))?;
        writeln!(
            writer,
            "# {} in total potential savings",
            ByteSize::b(self.report.total_potential_savings)
        )
    }
}
