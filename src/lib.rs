//! Split file trees into fixed-capacity chunk files and reassemble them.
//!
//! Encoding treats every input file as a slice of one logical byte stream,
//! cuts that stream into `chunk-N` files of at most `capacity` bytes and
//! writes a JSON `header` recording where each file starts. Decoding reads
//! the header back and slices the chunk sequence into the original files.

pub mod core;
pub mod decode;
pub mod encode;
pub mod enumerate;

pub use crate::core::{
    decode_header, encode_header, read_header, write_header, Aborted, ChunkConfig, ChunkReader,
    ChunkWriter, Error, FilePosition, Header, Result,
};
pub use decode::{decode, plan, DecodeReport, FileSpan};
pub use encode::{encode, encode_inputs, EncodeReport};
pub use enumerate::{enumerate, InputSet};
