//! Plain-text report.
//!
//! Each duplicate group is printed as
//!
//! ```text
//! number of files: 2
//! Files:
//! /data/a.txt
//! /data/copy/a.txt
//! ```
//!
//! followed by a blank line. Groups keep the finder's order; paths keep
//! their order inside each group.

use std::io::{self, Write};

use crate::duplicates::{DuplicateGroup, ScanSummary};

pub struct TextOutput<'a> {
    groups: &'a [DuplicateGroup],
    summary: &'a ScanSummary,
}

impl<'a> TextOutput<'a> {
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup], summary: &'a ScanSummary) -> Self {
        Self { groups, summary }
    }

    /// Write every group, then a one-line summary.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for group in self.groups {
            writeln!(writer, "number of files: {}", group.len())?;
            writeln!(writer, "Files:")?;
            for path in &group.paths {
                writeln!(writer, "{}", path.display())?;
            }
            writeln!(writer)?;
        }

        let summary = self.summary;
        write!(
            writer,
            "{} duplicate group(s), {} duplicate file(s), {} reclaimable",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        )?;
        if summary.skipped_files() > 0 {
            write!(writer, " ({} unreadable file(s) skipped)", summary.skipped_files())?;
        }
        writeln!(writer)
    }
}
