//! Corpus sources that can be opened once per pass.

use std::io::{self, BufRead, BufReader, Read};

use bzip2::read::BzDecoder;
use camino::{Utf8Path, Utf8PathBuf};
use flate2::read::GzDecoder;

use crate::error::SourceError;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const BZIP2_MAGIC: &[u8] = b"BZh";

/// Compression applied to a corpus file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Uncompressed text.
    None,
    /// Single-member gzip.
    Gzip,
    /// Single-stream bzip2.
    Bzip2,
}

impl Compression {
    /// Infer compression from the file extension, ignoring case.
    ///
    /// # Examples
    /// ```
    /// use camino::Utf8Path;
    /// use footprint_data::Compression;
    ///
    /// assert_eq!(Compression::from_path(Utf8Path::new("planet.osm.BZ2")), Compression::Bzip2);
    /// assert_eq!(Compression::from_path(Utf8Path::new("city.osm.gz")), Compression::Gzip);
    /// assert_eq!(Compression::from_path(Utf8Path::new("city.osm")), Compression::None);
    /// ```
    #[must_use]
    pub fn from_path(path: &Utf8Path) -> Self {
        match path.extension().map(str::to_ascii_lowercase).as_deref() {
            Some("bz2") => Self::Bzip2,
            Some("gz") => Self::Gzip,
            _ => Self::None,
        }
    }

    const fn magic(self) -> Option<&'static [u8]> {
        match self {
            Self::None => None,
            Self::Gzip => Some(GZIP_MAGIC),
            Self::Bzip2 => Some(BZIP2_MAGIC),
        }
    }
}

/// Something that yields a fresh corpus stream for every pass.
pub trait CorpusSource {
    /// Open an independent reader positioned at the start of the corpus.
    ///
    /// # Errors
    /// Returns [`SourceError`] when the corpus cannot be opened or does not
    /// carry the expected compression header.
    fn open(&self) -> Result<Box<dyn Read + '_>, SourceError>;

    /// Human-readable name for diagnostics.
    fn describe(&self) -> String;
}

/// A corpus on disk, decompressed according to its extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    path: Utf8PathBuf,
    compression: Compression,
}

impl FileSource {
    /// Source for `path`, with compression inferred from the extension.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        let path = path.into();
        let compression = Compression::from_path(&path);
        Self { path, compression }
    }

    /// Path of the corpus.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Compression that will be applied when opening.
    #[must_use]
    pub const fn compression(&self) -> Compression {
        self.compression
    }

    fn check_magic(&self, reader: &mut impl BufRead) -> Result<(), SourceError> {
        let Some(magic) = self.compression.magic() else {
            return Ok(());
        };
        let head = reader.fill_buf().map_err(|source| SourceError::Open {
            path: self.path.clone(),
            source,
        })?;
        if head.starts_with(magic) {
            Ok(())
        } else {
            Err(SourceError::Decompress {
                path: self.path.clone(),
                source: io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("missing {:?} header", self.compression),
                ),
            })
        }
    }
}

impl CorpusSource for FileSource {
    fn open(&self) -> Result<Box<dyn Read + '_>, SourceError> {
        let file = footprint_fs::open_utf8_file(&self.path).map_err(|source| SourceError::Open {
            path: self.path.clone(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        self.check_magic(&mut reader)?;
        Ok(match self.compression {
            Compression::None => Box::new(reader),
            Compression::Gzip => Box::new(GzDecoder::new(reader)),
            Compression::Bzip2 => Box::new(BzDecoder::new(reader)),
        })
    }

    fn describe(&self) -> String {
        self.path.to_string()
    }
}

/// An in-memory corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySource {
    bytes: Vec<u8>,
}

impl MemorySource {
    /// Serve `bytes` on every open.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl CorpusSource for MemorySource {
    fn open(&self) -> Result<Box<dyn Read + '_>, SourceError> {
        Ok(Box::new(self.bytes.as_slice()))
    }

    fn describe(&self) -> String {
        format!("<memory: {} bytes>", self.bytes.len())
    }
}
