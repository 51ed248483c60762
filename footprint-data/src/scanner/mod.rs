//! Quote-aware tag lexer over a refillable byte window.
//!
//! The scanner hands out one tag at a time: the text from the end of the
//! previous tag to the next `>` that is not inside a double-quoted attribute
//! value, trimmed of surrounding whitespace. Quote tracking is a plain toggle
//! on `"`; escaped quotes inside values are not recognised.
//!
//! The window holds the unconsumed tail of the stream. When no delimiter is
//! found the consumed prefix is discarded, another chunk is appended and the
//! search resumes where it stopped, so a tag may straddle any number of chunk
//! boundaries.

use std::io::{ErrorKind, Read};

use footprint_core::CancellationToken;

use crate::error::ScanError;

/// Bytes requested from the reader per refill.
pub const DEFAULT_CHUNK_SIZE: usize = 16_384 * 512;
/// Largest tag accepted before [`ScanError::TagTooLarge`] is raised.
pub const DEFAULT_TAG_LIMIT: usize = 64 * 1024 * 1024;

const PARTIAL_PREVIEW: usize = 64;

/// A single markup unit borrowed from the scanner window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'a> {
    text: &'a str,
    offset: u64,
}

impl<'a> Tag<'a> {
    /// Tag text from `<` to `>` inclusive.
    #[must_use]
    pub const fn text(&self) -> &'a str {
        self.text
    }

    /// Offset of the tag's first byte in the decompressed stream.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }
}

/// Streaming tag lexer.
///
/// # Examples
/// ```
/// use footprint_data::TagScanner;
///
/// let mut scanner = TagScanner::new(&br#"<tag k="a>b" v="c"/> <nd ref="1"/>"#[..]);
/// let first = scanner.next_tag()?.map(|tag| tag.text().to_owned());
/// assert_eq!(first.as_deref(), Some(r#"<tag k="a>b" v="c"/>"#));
/// let second = scanner.next_tag()?.map(|tag| tag.text().to_owned());
/// assert_eq!(second.as_deref(), Some(r#"<nd ref="1"/>"#));
/// assert!(scanner.next_tag()?.is_none());
/// # Ok::<(), footprint_data::ScanError>(())
/// ```
#[derive(Debug)]
pub struct TagScanner<R> {
    reader: R,
    window: Vec<u8>,
    cursor: usize,
    resume: usize,
    in_quote: bool,
    consumed: usize,
    window_offset: u64,
    bytes_read: u64,
    tags_scanned: u64,
    chunk_size: usize,
    tag_limit: Option<usize>,
    cancellation: Option<CancellationToken>,
    exhausted: bool,
}

impl<R: Read> TagScanner<R> {
    /// Wrap `reader` with the default chunk size and tag limit.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            window: Vec::new(),
            cursor: 0,
            resume: 0,
            in_quote: false,
            consumed: 0,
            window_offset: 0,
            bytes_read: 0,
            tags_scanned: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
            tag_limit: Some(DEFAULT_TAG_LIMIT),
            cancellation: None,
            exhausted: false,
        }
    }

    /// Override the refill size. Zero is treated as one byte.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Override the tag size limit; `None` lets the window grow unboundedly.
    #[must_use]
    pub fn with_tag_limit(mut self, tag_limit: Option<usize>) -> Self {
        self.tag_limit = tag_limit;
        self
    }

    /// Check `token` before every tag.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Decompressed bytes pulled from the reader so far.
    pub const fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Tags returned so far.
    pub const fn tags_scanned(&self) -> u64 {
        self.tags_scanned
    }

    /// Stream offset of the first unconsumed byte.
    pub fn position(&self) -> u64 {
        self.window_offset + (self.cursor + self.consumed) as u64
    }

    /// Return the next tag, or `None` once only whitespace remains.
    ///
    /// # Errors
    /// Returns [`ScanError`] when the reader fails, a tag exceeds the limit,
    /// the stream ends mid-tag, a tag is not UTF-8, or cancellation was
    /// requested.
    pub fn next_tag(&mut self) -> Result<Option<Tag<'_>>, ScanError> {
        self.cursor += self.consumed;
        self.consumed = 0;

        if let Some(token) = self.cancellation.as_ref()
            && token.is_cancelled()
        {
            return Err(ScanError::Cancelled {
                offset: self.position(),
            });
        }

        let end = loop {
            if let Some(delimiter) = self.find_delimiter() {
                break delimiter + 1;
            }
            self.check_limit()?;
            if !self.refill()? {
                return self.finish();
            }
        };

        let start = self.cursor;
        self.consumed = end - start;
        self.resume = end;
        self.tags_scanned += 1;

        let raw = &self.window[start..end];
        let leading = raw
            .iter()
            .take_while(|byte| byte.is_ascii_whitespace())
            .count();
        let offset = self.window_offset + (start + leading) as u64;
        let text = std::str::from_utf8(&raw[leading..])
            .map_err(|_| ScanError::InvalidUtf8 { offset })?
            .trim_end();
        Ok(Some(Tag { text, offset }))
    }

    fn find_delimiter(&mut self) -> Option<usize> {
        let mut in_quote = self.in_quote;
        let found = self.window[self.resume..]
            .iter()
            .position(|byte| match byte {
                b'"' => {
                    in_quote = !in_quote;
                    false
                }
                b'>' => !in_quote,
                _ => false,
            });
        match found {
            Some(relative) => {
                self.in_quote = false;
                Some(self.resume + relative)
            }
            None => {
                self.in_quote = in_quote;
                self.resume = self.window.len();
                None
            }
        }
    }

    fn check_limit(&self) -> Result<(), ScanError> {
        match self.tag_limit {
            Some(limit) if self.window.len() - self.cursor > limit => Err(ScanError::TagTooLarge {
                offset: self.window_offset + self.cursor as u64,
                limit,
            }),
            _ => Ok(()),
        }
    }

    /// Drop the consumed prefix and append one chunk. Returns `false` at end
    /// of stream.
    fn refill(&mut self) -> Result<bool, ScanError> {
        if self.exhausted {
            return Ok(false);
        }
        if self.cursor > 0 {
            self.window.drain(..self.cursor);
            self.window_offset += self.cursor as u64;
            self.resume -= self.cursor;
            self.cursor = 0;
        }

        let filled = self.window.len();
        self.window.resize(filled + self.chunk_size, 0);
        let read = loop {
            match self.reader.read(&mut self.window[filled..]) {
                Ok(read) => break read,
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(source) => {
                    self.window.truncate(filled);
                    return Err(ScanError::Read {
                        offset: self.window_offset + filled as u64,
                        source,
                    });
                }
            }
        };
        self.window.truncate(filled + read);
        self.bytes_read += read as u64;
        if read == 0 {
            self.exhausted = true;
        }
        Ok(read > 0)
    }

    fn finish(&mut self) -> Result<Option<Tag<'_>>, ScanError> {
        let tail = &self.window[self.cursor..];
        if tail.iter().all(u8::is_ascii_whitespace) {
            self.cursor = self.window.len();
            return Ok(None);
        }
        let leading = tail
            .iter()
            .take_while(|byte| byte.is_ascii_whitespace())
            .count();
        let partial = &tail[leading..];
        let preview = &partial[..partial.len().min(PARTIAL_PREVIEW)];
        Err(ScanError::UnexpectedEof {
            offset: self.window_offset + (self.cursor + leading) as u64,
            partial: String::from_utf8_lossy(preview).into_owned(),
        })
    }
}
