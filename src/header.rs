//! Header parser and patcher.
//!
//! A naming server backing file opens with a fixed four-line text header:
//!
//! ```text
//! [BOM?]Siebel Name Server Backing File[\r]\n
//! <siebel-version>[\r]\n
//! <nsfile-version>[\r]\n
//! <12-char-base64-size><padding spaces>[\r]\n
//! ```
//!
//! [`Header::read`] scans those lines once, classifying the text format
//! (UTF-8 BOM, DOS line endings) and recording the absolute byte offset of
//! the checksum line.  [`Header::read_encoded_size`] and
//! [`Header::write_encoded_size`] then operate against that offset through
//! a caller-supplied seekable handle; nothing outside the 12-byte field is
//! ever rewritten.

use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};

use thiserror::Error;

use crate::size::{decode_size, encode_size, ByteOrder, SizeError, ENCODED_LEN};

/// Literal the signature line must carry (after any BOM).
pub const SIGNATURE: &[u8] = b"Siebel Name Server Backing File";
/// Smallest byte length a well-formed file can have; anything shorter is
/// rejected before parsing.
pub const MIN_HEADER_SIZE: u64 = 82;

/// UTF-8 byte order mark.
const BOM: [u8; 3] = [0xef, 0xbb, 0xbf];
const CRLF: [u8; 2] = [b'\r', b'\n'];

/// Exact checksum line length including padding and terminator.
const CHECKSUM_LINE_LEN_LF: usize = 26;
const CHECKSUM_LINE_LEN_CRLF: usize = 27;

#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("not a Siebel Gateway file")]
    NotRecognizedFormat,
    #[error("file ends before the header is complete")]
    TruncatedHeader,
    #[error(
        "checksum part is corrupt.  Please fix it manually by\nopening the \
         file in the editor and deleting data from line 4 (leaving the\n\
         line 4 empty)."
    )]
    CorruptChecksum,
    #[error(transparent)]
    Size(#[from] SizeError),
    #[error("header i/o: {0}")]
    Io(#[from] io::Error),
}

/// One parse pass over the header.  Immutable afterwards except for
/// `byte_order`, which [`Header::read_encoded_size`] refreshes.
#[derive(Debug, Clone)]
pub struct Header {
    /// True if the first line begins with the 3-byte UTF-8 BOM.
    pub unicode_bom: bool,
    /// True if the signature line ends with CR LF rather than LF alone.
    pub dos_line_endings: bool,
    /// Absolute offset of the checksum line; fixed by the file format.
    pub checksum_offset: u64,
    /// Byte order resolved from the checksum field at parse time.
    pub byte_order: ByteOrder,
    /// Free-form version lines, stored trimmed, never validated.
    pub siebel_version: String,
    pub nsfile_version: String,
}

/// Line-oriented reader that tracks the byte offset consumed so far.
struct LineReader<R: Read> {
    inner: BufReader<R>,
    pos: u64,
}

impl<R: Read> LineReader<R> {
    fn new(reader: R) -> Self {
        Self {
            inner: BufReader::new(reader),
            pos: 0,
        }
    }

    /// Reads one raw line including its terminator.  A read that ends
    /// before an LF is a truncated header.
    fn read_line(&mut self) -> Result<Vec<u8>, HeaderError> {
        let mut line = Vec::new();
        self.inner.read_until(b'\n', &mut line)?;
        if !line.ends_with(b"\n") {
            return Err(HeaderError::TruncatedHeader);
        }
        self.pos += line.len() as u64;
        Ok(line)
    }

    /// Reads one line with the trailing CR/LF stripped.
    fn read_trimmed(&mut self) -> Result<String, HeaderError> {
        let line = self.read_line()?;
        Ok(String::from_utf8_lossy(&line)
            .trim_end_matches(['\r', '\n'])
            .to_string())
    }

    fn position(&self) -> u64 {
        self.pos
    }
}

impl Header {
    /// Parses the header from the start of `reader` in one forward pass.
    pub fn read<R: Read>(reader: R) -> Result<Self, HeaderError> {
        let mut lines = LineReader::new(reader);

        let sig_line = lines.read_line()?;
        let (unicode_bom, text_start) = detect_bom(&sig_line);
        if sig_line.len() < text_start + SIGNATURE.len()
            || &sig_line[text_start..text_start + SIGNATURE.len()] != SIGNATURE
        {
            return Err(HeaderError::NotRecognizedFormat);
        }
        let dos_line_endings = has_dos_line_ending(&sig_line);

        let siebel_version = lines.read_trimmed()?;
        let nsfile_version = lines.read_trimmed()?;

        let checksum_offset = lines.position();
        let checksum_line = lines.read_line()?;
        let expected_len = if dos_line_endings {
            CHECKSUM_LINE_LEN_CRLF
        } else {
            CHECKSUM_LINE_LEN_LF
        };
        if checksum_line.len() != expected_len {
            return Err(HeaderError::CorruptChecksum);
        }
        let (_, byte_order) = decode_size(&checksum_line)?;

        Ok(Self {
            unicode_bom,
            dos_line_endings,
            checksum_offset,
            byte_order,
            siebel_version,
            nsfile_version,
        })
    }

    /// Re-reads the 12-byte checksum field and decodes it, refreshing the
    /// stored byte order.
    pub fn read_encoded_size<R: Read + Seek>(&mut self, handle: &mut R) -> Result<i64, HeaderError> {
        handle.seek(SeekFrom::Start(self.checksum_offset))?;
        let mut field = [0u8; ENCODED_LEN];
        handle.read_exact(&mut field)?;
        let (size, byte_order) = decode_size(&field)?;
        self.byte_order = byte_order;
        Ok(size)
    }

    /// Encodes `size` in the current byte order and overwrites the
    /// checksum field in place.  Returns the number of bytes written.
    pub fn write_encoded_size<W: Write + Seek>(
        &self,
        handle: &mut W,
        size: i64,
    ) -> Result<usize, HeaderError> {
        let encoded = encode_size(size, self.byte_order)?;
        handle.seek(SeekFrom::Start(self.checksum_offset))?;
        handle.write_all(&encoded)?;
        Ok(encoded.len())
    }
}

/// Returns whether the line opens with a UTF-8 BOM and the offset of the
/// text after it.
fn detect_bom(line: &[u8]) -> (bool, usize) {
    if line.len() >= BOM.len() && line[..BOM.len()] == BOM {
        (true, BOM.len())
    } else {
        (false, 0)
    }
}

fn has_dos_line_ending(line: &[u8]) -> bool {
    line.len() >= CRLF.len() && line[line.len() - CRLF.len()..] == CRLF
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = b"Siebel Name Server Backing File\n\
                            16.0.0.0 [23057] ENU\n\
                            1.2\n\
                            DAMAAAAAAAA=             \n\
                            \n\
                            [/]\n\tPersistence=partial\n\tType=empty\n";

    #[test]
    fn parses_well_formed_header() {
        let hdr = Header::read(SAMPLE).unwrap();
        assert!(!hdr.unicode_bom);
        assert!(!hdr.dos_line_endings);
        assert_eq!(hdr.checksum_offset, 57);
        assert_eq!(hdr.byte_order, ByteOrder::LittleEndian);
        assert_eq!(hdr.siebel_version, "16.0.0.0 [23057] ENU");
        assert_eq!(hdr.nsfile_version, "1.2");
    }

    #[test]
    fn parses_bom_prefixed_header() {
        let mut data = vec![0xef, 0xbb, 0xbf];
        data.extend_from_slice(SAMPLE);
        let hdr = Header::read(&data[..]).unwrap();
        assert!(hdr.unicode_bom);
        assert_eq!(hdr.checksum_offset, 60);
    }

    #[test]
    fn parses_dos_line_endings() {
        let data = b"Siebel Name Server Backing File\r\n\
                     16.0.0.0 [23057] ENU\r\n\
                     1.2\r\n\
                     DAMAAAAAAAA=             \r\n\
                     \r\n";
        let hdr = Header::read(&data[..]).unwrap();
        assert!(hdr.dos_line_endings);
        assert_eq!(hdr.checksum_offset, 60);
        assert_eq!(hdr.byte_order, ByteOrder::LittleEndian);
    }

    #[test]
    fn rejects_wrong_signature() {
        let data = b"Not A Siebel File At All Really\n1\n2\nDAMAAAAAAAA=             \n";
        assert!(matches!(
            Header::read(&data[..]),
            Err(HeaderError::NotRecognizedFormat)
        ));
    }

    #[test]
    fn rejects_short_signature_line() {
        let data = b"Siebel\n";
        assert!(matches!(
            Header::read(&data[..]),
            Err(HeaderError::NotRecognizedFormat)
        ));
    }

    #[test]
    fn rejects_truncated_header() {
        let data = b"Siebel Name Server Backing File\n16.0.0.0 [23057] ENU\n";
        assert!(matches!(
            Header::read(&data[..]),
            Err(HeaderError::TruncatedHeader)
        ));
    }

    #[test]
    fn rejects_damaged_checksum_line() {
        let data = b"Siebel Name Server Backing File\n\
                     16.0.0.0 [23057] ENU\n\
                     1.2\n\
                     DA=     \n\n[/]\n";
        assert!(matches!(
            Header::read(&data[..]),
            Err(HeaderError::CorruptChecksum)
        ));
    }

    #[test]
    fn read_encoded_size_refreshes_byte_order() {
        let mut hdr = Header::read(SAMPLE).unwrap();
        let mut handle = std::io::Cursor::new(SAMPLE.to_vec());
        assert_eq!(hdr.read_encoded_size(&mut handle).unwrap(), 780);
        assert_eq!(hdr.byte_order, ByteOrder::LittleEndian);
    }

    #[test]
    fn write_encoded_size_patches_only_the_field() {
        let hdr = Header::read(SAMPLE).unwrap();
        let mut handle = std::io::Cursor::new(SAMPLE.to_vec());
        let wrote = hdr.write_encoded_size(&mut handle, 780).unwrap();
        assert_eq!(wrote, ENCODED_LEN);
        // Encoding 780 back little-endian reproduces the original bytes.
        assert_eq!(handle.into_inner(), SAMPLE);
    }
}
