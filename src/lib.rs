pub mod header;
pub mod nsfile;
pub mod size;

pub use header::{Header, HeaderError, MIN_HEADER_SIZE, SIGNATURE};
pub use nsfile::{DiskStore, NsFile, NsStore};
pub use size::{decode_size, encode_size, ByteOrder, SizeError, ENCODED_LEN};
