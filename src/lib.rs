pub mod wire;
pub mod header;
pub mod record;
pub mod index;
pub mod io_stream;
pub mod paths;
pub mod archive;
pub mod error;

pub use header::Header;
pub use record::{ArchiveRecord, DictionaryField, PayloadLocation, TextureEntry};
pub use index::{parse_index, write_index};
pub use io_stream::{PvmxReader, PvmxWriter};
pub use archive::{pack, unpack, list, PackOptions, UnpackOptions};
pub use error::PvmxError;
