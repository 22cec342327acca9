//! Shell script rendering of remediation actions.
//!
//! Scripts are the only way dedupe changes a filesystem, and it never runs
//! them itself. Every generated script:
//!
//! * starts in dry-run mode and only acts when given `--confirm`
//!   (POSIX) or `-Confirm` (PowerShell),
//! * carries one comment block per group naming the preserved copy, the
//!   group's savings and the running total, in rank order,
//! * single-quotes every path, so spaces, `$` and backticks are inert.
//!
//! POSIX scripts quote the raw path bytes, so names that are not UTF-8 or
//! contain newlines are still addressed exactly. PowerShell cannot express
//! such names; groups containing one are left out of a PowerShell script
//! and listed in its header. Comment lines show paths through
//! [`display_path`], so no name can break out of a comment.
//!
//! Hard links only work within one filesystem (one volume on Windows); a
//! failed link leaves the duplicate in place.
//!
//! ```rust,ignore
//! use dedupe::output::script::{ScriptOutput, ScriptType};
//!
//! let actions = generate_removal_actions(&report);
//! ScriptOutput::removal(&actions, ScriptType::detect()).write_to(&mut std::io::stdout())?;
//! ```

use std::io::Write;
use std::path::Path;

use bytesize::ByteSize;
use clap::ValueEnum;

use super::escape::{display_path, is_plain};
use crate::duplicates::{HardlinkAction, RemovalAction};

/// Script dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScriptType {
    /// POSIX shell script (sh/bash/zsh)
    Posix,
    /// Windows PowerShell script
    #[value(name = "powershell", alias = "ps")]
    PowerShell,
}

impl ScriptType {
    /// Dialect native to the current platform.
    #[must_use]
    pub fn detect() -> Self {
        if cfg!(windows) {
            Self::PowerShell
        } else {
            Self::Posix
        }
    }

    /// Conventional file extension.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Posix => "sh",
            Self::PowerShell => "ps1",
        }
    }
}

/// What a script does to each duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    /// Delete the duplicate.
    Removal,
    /// Replace the duplicate with a hard link to the preserved copy.
    Hardlink,
}

#[derive(Debug, Clone, Copy)]
enum Command<'a> {
    Remove(&'a Path),
    Link { path: &'a Path, target: &'a Path },
}

#[derive(Debug, Clone)]
struct GroupBlock<'a> {
    preserved: &'a Path,
    redundant_bytes: u64,
    cumulative_savings: u64,
    commands: Vec<Command<'a>>,
}

impl GroupBlock<'_> {
    /// Whether every path in the group can be written in `script_type`.
    fn fits(&self, script_type: ScriptType) -> bool {
        is_scriptable(self.preserved, script_type)
            && self.commands.iter().all(|command| match *command {
                Command::Remove(path) => is_scriptable(path, script_type),
                Command::Link { path, target } => {
                    is_scriptable(path, script_type) && is_scriptable(target, script_type)
                }
            })
    }
}

/// Formatter for a removal or hard-link script.
#[derive(Debug, Clone)]
pub struct ScriptOutput<'a> {
    kind: ScriptKind,
    script_type: ScriptType,
    blocks: Vec<GroupBlock<'a>>,
    skipped: Vec<&'a Path>,
}

impl<'a> ScriptOutput<'a> {
    /// Script deleting every duplicate.
    #[must_use]
    pub fn removal(actions: &'a [RemovalAction], script_type: ScriptType) -> Self {
        let blocks = actions
            .iter()
            .map(|action| GroupBlock {
                preserved: action.preserved.as_path(),
                redundant_bytes: action.redundant_bytes,
                cumulative_savings: action.cumulative_savings,
                commands: action
                    .removed
                    .iter()
                    .map(|p| Command::Remove(p.as_path()))
                    .collect(),
            })
            .collect();
        Self::build(ScriptKind::Removal, script_type, blocks)
    }

    /// Script replacing every duplicate with a hard link.
    #[must_use]
    pub fn hardlink(actions: &'a [HardlinkAction], script_type: ScriptType) -> Self {
        let blocks = actions
            .iter()
            .map(|action| GroupBlock {
                preserved: action.preserved.as_path(),
                redundant_bytes: action.redundant_bytes,
                cumulative_savings: action.cumulative_savings,
                commands: action
                    .links
                    .iter()
                    .map(|(path, target)| Command::Link {
                        path: path.as_path(),
                        target: target.as_path(),
                    })
                    .collect(),
            })
            .collect();
        Self::build(ScriptKind::Hardlink, script_type, blocks)
    }

    /// Drop groups the dialect cannot address and re-thread the running total.
    fn build(kind: ScriptKind, script_type: ScriptType, blocks: Vec<GroupBlock<'a>>) -> Self {
        let mut kept = Vec::with_capacity(blocks.len());
        let mut skipped = Vec::new();
        let mut cumulative = 0u64;

        for mut block in blocks {
            if block.fits(script_type) {
                cumulative = cumulative.saturating_add(block.redundant_bytes);
                block.cumulative_savings = cumulative;
                kept.push(block);
            } else {
                log::warn!(
                    "Leaving group of {} out of the {:?} script: a path cannot be expressed",
                    display_path(block.preserved),
                    script_type
                );
                skipped.push(block.preserved);
            }
        }

        Self {
            kind,
            script_type,
            blocks: kept,
            skipped,
        }
    }

    /// Preserved paths of groups left out of the script.
    #[must_use]
    pub fn skipped(&self) -> &[&'a Path] {
        &self.skipped
    }

    /// Script kind.
    #[must_use]
    pub fn kind(&self) -> ScriptKind {
        self.kind
    }

    fn command_count(&self) -> usize {
        self.blocks.iter().map(|b| b.commands.len()).sum()
    }

    fn total_savings(&self) -> u64 {
        self.blocks.last().map_or(0, |b| b.cumulative_savings)
    }

    /// Write the script.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        match self.script_type {
            ScriptType::Posix => self.write_posix(writer),
            ScriptType::PowerShell => self.write_powershell(writer),
        }
    }

    fn write_header<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let (title, warning) = match self.kind {
            ScriptKind::Removal => (
                "dedupe removal script",
                "This script PERMANENTLY DELETES files.",
            ),
            ScriptKind::Hardlink => (
                "dedupe hard-link script",
                "This script REPLACES files with hard links to the preserved copy.",
            ),
        };
        writeln!(writer, "# {title}")?;
        writeln!(
            writer,
            "# Generated on: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(writer, "#")?;
        writeln!(writer, "# WARNING: {warning}")?;
        if self.kind == ScriptKind::Hardlink {
            writeln!(
                writer,
                "# Hard links require every path to be on the same filesystem."
            )?;
        }
        writeln!(writer, "# Review it carefully before running with the confirm flag.")?;
        writeln!(writer, "#")?;
        writeln!(writer, "# Groups: {}", self.blocks.len())?;
        writeln!(writer, "# Files affected: {}", self.command_count())?;
        writeln!(
            writer,
            "# Potential savings: {} ({} bytes)",
            ByteSize::b(self.total_savings()),
            self.total_savings()
        )?;
        if !self.skipped.is_empty() {
            writeln!(
                writer,
                "# Skipped groups: {} (paths this script type cannot express)",
                self.skipped.len()
            )?;
            for path in &self.skipped {
                writeln!(writer, "#   {}", display_path(path))?;
            }
        }
        writeln!(writer)
    }

    fn write_group_comment<W: Write>(
        writer: &mut W,
        index: usize,
        block: &GroupBlock<'_>,
    ) -> std::io::Result<()> {
        writeln!(writer, "# Group {}", index + 1)?;
        writeln!(writer, "# Preserved: {}", display_path(block.preserved))?;
        writeln!(
            writer,
            "# Group savings: {} ({} bytes)",
            ByteSize::b(block.redundant_bytes),
            block.redundant_bytes
        )?;
        writeln!(
            writer,
            "# Cumulative savings: {} ({} bytes)",
            ByteSize::b(block.cumulative_savings),
            block.cumulative_savings
        )
    }

    fn write_posix<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "#!/bin/sh")?;
        self.write_header(writer)?;

        writeln!(writer, "DRY_RUN=1")?;
        writeln!(writer, "if [ \"${{1:-}}\" = \"--confirm\" ]; then")?;
        writeln!(writer, "    DRY_RUN=0")?;
        writeln!(writer, "fi")?;
        writeln!(writer)?;
        writeln!(writer, "if [ \"$DRY_RUN\" -eq 1 ]; then")?;
        writeln!(writer, "    echo \"DRY RUN MODE. No files will be changed.\"")?;
        writeln!(writer, "    echo \"Run with --confirm to apply.\"")?;
        writeln!(writer, "    echo")?;
        writeln!(writer, "fi")?;
        writeln!(writer)?;
        writeln!(writer, "FAILED=0")?;
        writeln!(writer, "run() {{")?;
        writeln!(writer, "    if [ \"$DRY_RUN\" -eq 1 ]; then")?;
        writeln!(writer, "        echo \"would run: $*\"")?;
        writeln!(writer, "    else")?;
        writeln!(writer, "        \"$@\" || FAILED=$((FAILED + 1))")?;
        writeln!(writer, "    fi")?;
        writeln!(writer, "}}")?;
        writeln!(writer)?;

        for (i, block) in self.blocks.iter().enumerate() {
            Self::write_group_comment(writer, i, block)?;
            for command in &block.commands {
                match *command {
                    Command::Remove(path) => {
                        writer.write_all(b"run rm -f -- ")?;
                        writer.write_all(&escape_posix(path))?;
                    }
                    Command::Link { path, target } => {
                        writer.write_all(b"run ln -f -- ")?;
                        writer.write_all(&escape_posix(target))?;
                        writer.write_all(b" ")?;
                        writer.write_all(&escape_posix(path))?;
                    }
                }
                writer.write_all(b"\n")?;
            }
            writeln!(writer)?;
        }

        writeln!(writer, "if [ \"$DRY_RUN\" -eq 1 ]; then")?;
        writeln!(writer, "    echo \"Dry run complete. No files were changed.\"")?;
        writeln!(writer, "elif [ \"$FAILED\" -ne 0 ]; then")?;
        writeln!(writer, "    echo \"Done with $FAILED failed command(s).\"")?;
        writeln!(writer, "    exit 1")?;
        writeln!(writer, "else")?;
        writeln!(writer, "    echo \"Done. {} file(s) processed.\"", self.command_count())?;
        writeln!(writer, "fi")
    }

    fn write_powershell<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.write_header(writer)?;

        writeln!(writer, "param([switch]$Confirm)")?;
        writeln!(writer)?;
        writeln!(writer, "$DryRun = -not $Confirm")?;
        writeln!(writer, "$Failed = 0")?;
        writeln!(writer, "if ($DryRun) {{")?;
        writeln!(writer, "    Write-Host 'DRY RUN MODE. No files will be changed.'")?;
        writeln!(writer, "    Write-Host 'Run with -Confirm to apply.'")?;
        writeln!(writer, "    Write-Host ''")?;
        writeln!(writer, "}}")?;
        writeln!(writer)?;

        for (i, block) in self.blocks.iter().enumerate() {
            Self::write_group_comment(writer, i, block)?;
            for command in &block.commands {
                let line = match command {
                    Command::Remove(path) => format!(
                        "Remove-Item -LiteralPath {} -Force",
                        escape_powershell(path)
                    ),
                    Command::Link { path, target } => format!(
                        "New-Item -ItemType HardLink -Path {} -Target {} -Force",
                        escape_powershell(path),
                        escape_powershell(target)
                    ),
                };
                writeln!(
                    writer,
                    "if ($DryRun) {{ Write-Host {} }} else {{ try {{ {line} -ErrorAction Stop | Out-Null }} catch {{ $Failed++; Write-Warning $_ }} }}",
                    quote_powershell(&format!("would run: {line}")),
                )?;
            }
            writeln!(writer)?;
        }

        writeln!(writer, "if ($DryRun) {{")?;
        writeln!(writer, "    Write-Host 'Dry run complete. No files were changed.'")?;
        writeln!(writer, "}} elseif ($Failed -ne 0) {{")?;
        writeln!(writer, "    Write-Host \"Done with $Failed failed command(s).\"")?;
        writeln!(writer, "    exit 1")?;
        writeln!(writer, "}} else {{")?;
        writeln!(
            writer,
            "    Write-Host 'Done. {} file(s) processed.'",
            self.command_count()
        )?;
        writeln!(writer, "}}")
    }
}

fn is_scriptable(path: &Path, script_type: ScriptType) -> bool {
    match script_type {
        // Single quotes carry any byte but NUL, which no path contains.
        ScriptType::Posix => cfg!(unix) || path.to_str().is_some(),
        ScriptType::PowerShell => is_plain(path),
    }
}

/// Single-quote the raw path bytes for POSIX sh; embedded quotes become `'\''`.
fn escape_posix(path: &Path) -> Vec<u8> {
    let raw = path.as_os_str().as_encoded_bytes();
    let mut quoted = Vec::with_capacity(raw.len() + 2);
    quoted.push(b'\'');
    for &byte in raw {
        if byte == b'\'' {
            quoted.extend_from_slice(b"'\\''");
        } else {
            quoted.push(byte);
        }
    }
    quoted.push(b'\'');
    quoted
}

/// Single-quote a path for PowerShell.
///
/// Only called for paths accepted by [`is_scriptable`], which are valid
/// UTF-8.
fn escape_powershell(path: &Path) -> String {
    quote_powershell(&path.to_string_lossy())
}

/// PowerShell treats the typographic single quotes like `'`; all are doubled.
fn quote_powershell(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('\'');
    for c in s.chars() {
        if matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}') {
            quoted.push(c);
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}
