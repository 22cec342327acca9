//! Output formatters for ranked duplicate groups.
//!
//! - [`report`]: the human-readable text report
//! - [`json`]: a JSON document for automation
//! - [`script`]: removal and hard-link scripts
//! - [`writer`]: atomic delivery to stdout or files
//! - [`escape`]: single-line path rendering
//!
//! # Example
//!
//! ```no_run
//! use dedupe::duplicates::{analyze, DuplicateFinder};
//! use dedupe::output::TextReport;
//! use std::path::PathBuf;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, _summary) = finder.find_duplicates(&[PathBuf::from(".")]).unwrap();
//! let report = analyze(groups);
//!
//! TextReport::new(&report).write_to(&mut std::io::stdout()).unwrap();
//! ```

pub mod escape;
pub mod json;
pub mod report;
pub mod script;
pub mod writer;

pub use escape::display_path;
pub use json::JsonOutput;
pub use report::TextReport;
pub use script::{ScriptKind, ScriptOutput, ScriptType};
pub use writer::{write_all, Destination, PendingOutput, WriteError};
