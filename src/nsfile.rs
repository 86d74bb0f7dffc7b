//! `NsFile` is the public surface: open a naming server backing file,
//! check whether its recorded size matches reality, and patch it.
//!
//! The core never touches the filesystem directly.  It works through the
//! [`NsStore`] capability, a narrow handle contract (sequential read,
//! absolute seek, in-place write, current length, name).  [`DiskStore`]
//! is the production implementation over [`std::fs::File`]; tests drive
//! the same code with an in-memory buffer.

use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::header::{Header, HeaderError, MIN_HEADER_SIZE};
use crate::size::ENCODED_LEN;

/// The file-handle capability the core operates through.
pub trait NsStore: Read + Write + Seek {
    /// Current total length in bytes, queried fresh on every call.
    fn len(&self) -> io::Result<u64>;
    /// Stable identifying name for reporting.
    fn name(&self) -> &str;
}

/// Production [`NsStore`] over a read-write [`std::fs::File`].
#[derive(Debug)]
pub struct DiskStore {
    file: fs::File,
    path: String,
}

impl DiskStore {
    /// Opens `path` read-write.  Fails early, before parsing, when the
    /// file is too short to hold a header at all.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, HeaderError> {
        let path = path.as_ref();
        let meta = fs::metadata(path)?;
        if meta.len() < MIN_HEADER_SIZE {
            return Err(HeaderError::NotRecognizedFormat);
        }
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self {
            file,
            path: path.display().to_string(),
        })
    }
}

impl Read for DiskStore {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for DiskStore {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Seek for DiskStore {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

impl NsStore for DiskStore {
    fn len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn name(&self) -> &str {
        &self.path
    }
}

/// An opened naming server backing file: one parsed [`Header`] plus the
/// owning store handle.  The store is released on drop, on every path.
#[derive(Debug)]
pub struct NsFile<S: NsStore> {
    header: Header,
    store: S,
}

impl NsFile<DiskStore> {
    /// Opens the file at `path` and parses its header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, HeaderError> {
        Self::from_store(DiskStore::open(path)?)
    }
}

impl<S: NsStore> NsFile<S> {
    /// Parses the header from an externally supplied store handle.
    pub fn from_store(mut store: S) -> Result<Self, HeaderError> {
        if store.len()? < MIN_HEADER_SIZE {
            return Err(HeaderError::NotRecognizedFormat);
        }
        store.seek(SeekFrom::Start(0))?;
        let header = Header::read(&mut store)?;
        Ok(Self { header, store })
    }

    /// Current real file size, from the store's metadata.
    pub fn size(&self) -> io::Result<u64> {
        self.store.len()
    }

    pub fn name(&self) -> &str {
        self.store.name()
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns true when the recorded size matches the real size.  Never
    /// fails: any read or decode problem counts as "not correct".
    pub fn is_header_correct(&mut self) -> bool {
        let real = match self.store.len() {
            Ok(n) => n,
            Err(_) => return false,
        };
        match self.header.read_encoded_size(&mut self.store) {
            Ok(recorded) => recorded == real as i64,
            Err(_) => false,
        }
    }

    /// Rewrites the checksum field with the real file size, whether or not
    /// it was already correct.  Returns the number of bytes written
    /// (always [`ENCODED_LEN`]).
    pub fn fix_size(&mut self) -> Result<usize, HeaderError> {
        let real = self.store.len()? as i64;
        let wrote = self.header.write_encoded_size(&mut self.store, real)?;
        debug_assert_eq!(wrote, ENCODED_LEN);
        Ok(wrote)
    }
}
