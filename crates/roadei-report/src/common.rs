//! Shared utilities for output generation.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use tracing::warn;

/// Exchange Network header namespace.
pub const HEADER_NS: &str = "http://www.exchangenetwork.net/schema/header/2";

/// Combined Emissions Reporting namespace.
pub const CER_NS: &str = "http://www.exchangenetwork.net/schema/cer/1";

/// XML Schema instance namespace.
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

pub const CER_SCHEMA_LOCATION: &str = "http://www.exchangenetwork.net/schema/cer/1/index.xsd";

/// Aggregate workbook directory inside the output directory.
pub const AGGREGATE_DIR: &str = "aggregateTable";

/// Staging table file name.
pub const STAGING_FILE: &str = "xmlSCCStagingTable.csv";

/// Ensure a parent directory exists for a file path.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    Ok(())
}

/// Ensure an output subdirectory exists and return its path.
pub fn ensure_output_dir(base_dir: &Path, name: &str) -> Result<PathBuf> {
    let dir = base_dir.join(name);
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Hidden sibling a file is written to before it is renamed into place.
pub fn staged_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.partial"))
}

/// Files written to staged siblings and renamed together.
///
/// Dropping an uncommitted batch removes the staged files, so a failed
/// stage leaves nothing behind in the output directory.
#[derive(Debug, Default)]
pub struct StagedFiles {
    pending: Vec<(PathBuf, PathBuf)>,
}

impl StagedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the staged sibling of `target` and hands it to `write`.
    pub fn stage(
        &mut self,
        target: &Path,
        write: impl FnOnce(&mut fs::File) -> Result<()>,
    ) -> Result<()> {
        ensure_parent_dir(target)?;
        let staged = staged_path(target);
        self.pending.push((staged.clone(), target.to_path_buf()));
        let mut file =
            fs::File::create(&staged).with_context(|| format!("create {}", staged.display()))?;
        write(&mut file).with_context(|| format!("write {}", target.display()))?;
        file.flush()
            .with_context(|| format!("flush {}", staged.display()))?;
        Ok(())
    }

    /// Renames every staged file onto its target and returns the targets.
    ///
    /// A file leaves the batch only once its rename succeeds, so a failed
    /// rename still removes the staged files not yet moved.
    pub fn commit(mut self) -> Result<Vec<PathBuf>> {
        let mut committed = Vec::with_capacity(self.pending.len());
        self.pending.reverse();
        while let Some((staged, target)) = self.pending.last() {
            fs::rename(staged, target).with_context(|| {
                format!("rename {} to {}", staged.display(), target.display())
            })?;
            if let Some((_, target)) = self.pending.pop() {
                committed.push(target);
            }
        }
        Ok(committed)
    }
}

impl Drop for StagedFiles {
    fn drop(&mut self) {
        for (staged, _) in &self.pending {
            if staged.exists()
                && let Err(error) = fs::remove_file(staged)
            {
                warn!(path = %staged.display(), %error, "could not remove staged file");
            }
        }
    }
}

/// Write a simple text element.
pub fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
