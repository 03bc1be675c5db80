use std::{
    error::Error,
    fs::{self, File},
    io::{self, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;

/// A buffered output file that reports its path in error messages.
#[derive(Debug)]
pub struct Output {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl Output {
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    pub fn write_json<T>(&mut self, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        Ok(())
    }

    /// Flushes the buffer and returns the file path.
    pub fn finish(mut self) -> anyhow::Result<PathBuf> {
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(self.path)
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// The directory every result file is written to.
#[derive(Debug, Clone)]
pub struct OutputDir {
    path: PathBuf,
}

impl OutputDir {
    /// Creates `path` and its parents when absent.
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create output directory: {}", path.display()))?;
        Ok(Self {
            path: path.to_owned(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Creates `name` in the directory and fills it with `write`.
    pub fn save_with<F, E>(&self, name: &str, write: F) -> anyhow::Result<PathBuf>
    where
        F: FnOnce(&mut Output) -> Result<(), E>,
        E: Error + Send + Sync + 'static,
    {
        let mut output = Output::open(self.file_path(name))?;
        write(&mut output).with_context(|| format!("Failed to write {}", output.display_path()))?;
        let path = output.finish()?;
        tracing::debug!(path = %path.display(), "saved");
        Ok(path)
    }

    pub fn save_json<T>(&self, name: &str, value: &T) -> anyhow::Result<PathBuf>
    where
        T: serde::Serialize,
    {
        let mut output = Output::open(self.file_path(name))?;
        output.write_json(value)?;
        let path = output.finish()?;
        tracing::debug!(path = %path.display(), "saved");
        Ok(path)
    }
}
