use std::fs::{self, File};
use std::io::{self, BufWriter, StdoutLock, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::client::target::Target;
use crate::error::ClientError;

/// Where the response body ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    /// `-o FILE`
    File(PathBuf),
    /// `-d DIR`, file named after the request path
    Directory(PathBuf),
}

impl Destination {
    /// The file that will be written, `None` for stdout.
    pub fn path_for(&self, target: &Target) -> Option<PathBuf> {
        match self {
            Destination::Stdout => None,
            Destination::File(path) => Some(path.clone()),
            Destination::Directory(dir) => Some(dir.join(target.file_name())),
        }
    }

    /// Opens the sink, creating missing parent directories.
    pub fn open(&self, target: &Target) -> Result<OutputSink, ClientError> {
        let Some(path) = self.path_for(target) else {
            return Ok(OutputSink::Stdout(io::stdout().lock()));
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(ClientError::Output)?;
        }

        let file = File::create(&path).map_err(ClientError::Output)?;
        debug!(path = %path.display(), "writing body to file");

        Ok(OutputSink::File {
            path,
            writer: BufWriter::new(file),
        })
    }
}

pub enum OutputSink {
    Stdout(StdoutLock<'static>),
    File { path: PathBuf, writer: BufWriter<File> },
}

impl OutputSink {
    pub fn path(&self) -> Option<&Path> {
        match self {
            OutputSink::Stdout(_) => None,
            OutputSink::File { path, .. } => Some(path),
        }
    }

    /// Flushes everything to its destination.
    pub fn finish(mut self) -> io::Result<()> {
        self.flush()?;
        if let OutputSink::File { writer, .. } = &self {
            writer.get_ref().sync_all()?;
        }
        Ok(())
    }

    /// Drops a partially written file so no truncated output is left behind.
    pub fn abandon(self) {
        if let OutputSink::File { path, writer } = self {
            drop(writer);
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "failed to remove partial output");
            }
        }
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputSink::Stdout(out) => out.write(buf),
            OutputSink::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputSink::Stdout(out) => out.flush(),
            OutputSink::File { writer, .. } => writer.flush(),
        }
    }
}
