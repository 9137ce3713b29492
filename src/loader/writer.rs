//! Per-aspect artifact files
//!
//! Each aspect is written to its own file as a JSON array. The file is opened
//! on the first element of that aspect and flushed after every element.

use crate::cx::AspectElement;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Append-only array-framed output for one aspect
#[derive(Debug)]
pub struct AspectWriter {
    aspect: String,
    path: PathBuf,
    out: Option<BufWriter<File>>,
    count: u64,
}

impl AspectWriter {
    /// Create the artifact and write the opening bracket
    pub fn create(dir: &Path, aspect: &str) -> io::Result<Self> {
        let path = dir.join(aspect);
        let mut out = BufWriter::new(File::create(&path)?);
        out.write_all(b"[")?;
        Ok(Self {
            aspect: aspect.to_string(),
            path,
            out: Some(out),
            count: 0,
        })
    }

    pub fn write_element(&mut self, element: &AspectElement) -> io::Result<()> {
        let out = self.out.as_mut().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::BrokenPipe,
                format!("aspect writer for {} is already closed", self.aspect),
            )
        })?;
        if self.count > 0 {
            out.write_all(b",")?;
        }
        element.write_json(&mut *out)?;
        out.flush()?;
        self.count += 1;
        Ok(())
    }

    /// Elements written so far
    pub fn element_count(&self) -> u64 {
        self.count
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.out.is_none()
    }

    /// Write the closing bracket and release the file. Later calls are no-ops.
    pub fn close(&mut self) -> io::Result<()> {
        match self.out.take() {
            Some(mut out) => {
                out.write_all(b"]")?;
                out.flush()
            }
            None => Ok(()),
        }
    }
}

/// Lazily created writers, one per aspect name.
///
/// Dropping the pool closes whatever is still open.
#[derive(Debug)]
pub struct AspectWriterPool {
    dir: PathBuf,
    writers: BTreeMap<String, AspectWriter>,
}

impl AspectWriterPool {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            writers: BTreeMap::new(),
        }
    }

    /// Append `element` to the artifact of its aspect, creating it if needed
    pub fn write(&mut self, element: &AspectElement) -> io::Result<()> {
        let aspect = element.aspect_name();
        if let Some(writer) = self.writers.get_mut(aspect) {
            return writer.write_element(element);
        }
        info!(aspect, dir = %self.dir.display(), "creating new file for aspect");
        let mut writer = AspectWriter::create(&self.dir, aspect)?;
        let result = writer.write_element(element);
        self.writers.insert(aspect.to_string(), writer);
        result
    }

    /// Written element count for `aspect`, `None` when nothing was written
    pub fn element_count(&self, aspect: &str) -> Option<u64> {
        self.writers.get(aspect).map(AspectWriter::element_count)
    }

    /// Aspect name → written element count
    pub fn element_counts(&self) -> BTreeMap<String, u64> {
        self.writers
            .iter()
            .map(|(name, writer)| (name.clone(), writer.element_count()))
            .collect()
    }

    pub fn aspect_names(&self) -> impl Iterator<Item = &str> {
        self.writers.keys().map(String::as_str)
    }

    /// Close every writer.
    ///
    /// A failing close does not stop the others from being released; the
    /// failures are logged and returned.
    pub fn close_all(&mut self) -> Vec<(String, io::Error)> {
        let mut failures = Vec::new();
        for (aspect, writer) in self.writers.iter_mut() {
            if writer.is_closed() {
                continue;
            }
            if let Err(e) = writer.close() {
                error!(aspect = %aspect, path = %writer.path().display(), "failed to close aspect writer: {}", e);
                failures.push((aspect.clone(), e));
            }
        }
        failures
    }
}

impl Drop for AspectWriterPool {
    fn drop(&mut self) {
        self.close_all();
    }
}
