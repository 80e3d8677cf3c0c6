use std::{
    fs::{self, File},
    io::{self, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::error::LoadError;

/// The full contents of one input file.
#[derive(Clone, Debug)]
pub struct SourceBuffer {
    path: PathBuf,
    bytes: Box<[u8]>,
}

impl SourceBuffer {
    pub fn new(path: impl Into<PathBuf>, bytes: impl Into<Box<[u8]>>) -> SourceBuffer {
        SourceBuffer {
            path: path.into(),
            bytes: bytes.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// One past the last byte.
    pub fn end(&self) -> usize {
        self.bytes.len()
    }

    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Reads the whole file at `path` into memory.
///
/// The existence check runs before the file is opened and is only a best
/// effort: a file removed in between is still reported as missing.
pub fn load(path: &Path) -> Result<SourceBuffer, LoadError> {
    let no_such_file = || LoadError::NoSuchFile {
        path: path.to_path_buf(),
    };
    let io_error = |source: io::Error| {
        if source.kind() == io::ErrorKind::NotFound {
            no_such_file()
        } else {
            LoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    };

    match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => {}
        _ => return Err(no_such_file()),
    }

    let mut file = File::open(path).map_err(io_error)?;
    let size = file.seek(SeekFrom::End(0)).map_err(io_error)?;
    file.rewind().map_err(io_error)?;

    let size = usize::try_from(size).map_err(|_| {
        io_error(io::Error::new(
            io::ErrorKind::OutOfMemory,
            "file does not fit in memory",
        ))
    })?;
    let mut bytes = vec![0; size];
    file.read_exact(&mut bytes).map_err(io_error)?;
    debug!(path = %path.display(), size, "loaded source");

    Ok(SourceBuffer::new(path, bytes))
}
