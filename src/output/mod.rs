//! Report formatters for scan results.
//!
//! - [`text`]: the plain per-group listing
//! - [`json`]: groups and summary for automation
//!
//! # Example
//!
//! ```no_run
//! use dupfind::duplicates::DuplicateFinder;
//! use dupfind::output::TextOutput;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, summary) = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! TextOutput::new(&groups, &summary)
//!     .write_to(&mut std::io::stdout().lock())
//!     .unwrap();
//! ```

pub mod json;
pub mod text;

pub use json::JsonOutput;
pub use text::TextOutput;
