//! Line oriented runcard files.

use crate::error::RuncardError;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::File;
use std::io::{BufWriter, Write};

/// Writes one generator instruction per line.
///
/// The file is opened on creation and released on `close` or drop.
pub struct RuncardWriter {
    path: Utf8PathBuf,
    writer: BufWriter<File>,
}

impl RuncardWriter {
    /// Open (and truncate) `path` for writing.
    pub fn create(path: &Utf8Path) -> Result<Self, RuncardError> {
        let file = File::create(path).map_err(|source| RuncardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Append `instruction` followed by a newline. No syntax checks.
    pub fn write_instruction(&mut self, instruction: &str) -> Result<(), RuncardError> {
        writeln!(self.writer, "{}", instruction).map_err(|source| self.io_error(source))
    }

    /// Flush and release the file.
    pub fn close(mut self) -> Result<(), RuncardError> {
        self.writer.flush().map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: std::io::Error) -> RuncardError {
        RuncardError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Write all `lines` to a fresh runcard at `path`.
pub fn write_runcard(path: &Utf8Path, lines: &[String]) -> Result<(), RuncardError> {
    let mut writer = RuncardWriter::create(path)?;
    for line in lines {
        writer.write_instruction(line)?;
    }
    writer.close()?;
    tracing::debug!("Wrote {} instructions to {}", lines.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_lines_read_back_in_order() {
        let temp = TempDir::new().unwrap();
        let path = Utf8Path::from_path(temp.path()).unwrap().join("herwig.in");
        let instructions = ["read snippets/PPCollider.in", "", "  indented line", "saverun"];

        let mut writer = RuncardWriter::create(&path).unwrap();
        for instruction in instructions {
            writer.write_instruction(instruction).unwrap();
        }
        writer.close().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "read snippets/PPCollider.in\n\n  indented line\nsaverun\n");
        assert_eq!(content.lines().collect::<Vec<_>>(), instructions);
    }

    #[test]
    fn test_drop_releases_and_flushes() {
        let temp = TempDir::new().unwrap();
        let path = Utf8Path::from_path(temp.path()).unwrap().join("Run.dat");
        {
            let mut writer = RuncardWriter::create(&path).unwrap();
            writer.write_instruction("(run){").unwrap();
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "(run){\n");
    }

    #[test]
    fn test_create_truncates() {
        let temp = TempDir::new().unwrap();
        let path = Utf8Path::from_path(temp.path()).unwrap().join("herwig.in");
        fs::write(&path, "old content\n").unwrap();
        write_runcard(&path, &["new".to_string()]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
    }

    #[test]
    fn test_unwritable_path_fails_at_open() {
        let result = RuncardWriter::create(Utf8Path::new("/nonexistent-dir-12345/herwig.in"));
        assert!(matches!(result, Err(RuncardError::Io { .. })));
    }
}
