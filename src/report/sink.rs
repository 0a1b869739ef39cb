use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::PipelineError;

/// Destination for rendered reports.
pub trait ReportSink {
    fn accept(&mut self, name: &str, bytes: &[u8]) -> Result<(), PipelineError>;
}

/// Writes each report into a directory.  The bytes go to a temporary file
/// next to the target and are renamed into place, so a failed write never
/// leaves a partial report behind.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectorySink { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

/// Atomically replace `path` with `bytes`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl ReportSink for DirectorySink {
    fn accept(&mut self, name: &str, bytes: &[u8]) -> Result<(), PipelineError> {
        let path = self.path_for(name);
        write_atomic(&path, bytes).map_err(|source| PipelineError::Sink {
            name: name.to_string(),
            source,
        })?;
        log::info!("Wrote report {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_sink_writes_named_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path());
        sink.accept("a.pdf", b"%PDF-1.5").unwrap();
        sink.accept("a.pdf", b"%PDF-1.7").unwrap();
        assert_eq!(std::fs::read(dir.path().join("a.pdf")).unwrap(), b"%PDF-1.7");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn unwritable_directory_is_a_sink_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path().join("missing"));
        let err = sink.accept("a.pdf", b"x").unwrap_err();
        assert!(matches!(err, PipelineError::Sink { ref name, .. } if name == "a.pdf"));
    }
}
