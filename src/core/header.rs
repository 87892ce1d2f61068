//! Chunk set header.
//!
//! The header ties a chunk directory back to the original file set. It is a
//! JSON object with exactly three fields:
//!
//! ```text
//! {
//!   "bytes_per_chunk": <capacity>,
//!   "positions": { "<relative name>": <logical offset>, ... },
//!   "total_bytes": <logical stream length>
//! }
//! ```
//!
//! `positions` is written in enumeration order and decoded in document order.
//! Readers must not rely on it being sorted by offset.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::core::layout::header_path;
use crate::core::{Error, Result};

/// Where one file's first byte lands in the logical stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePosition {
    pub name: String,
    pub offset: u64,
}

impl FilePosition {
    pub fn new(name: impl Into<String>, offset: u64) -> Self {
        Self {
            name: name.into(),
            offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    #[serde(rename = "bytes_per_chunk")]
    pub capacity: u64,
    #[serde(with = "positions")]
    pub positions: Vec<FilePosition>,
    pub total_bytes: u64,
}

impl Header {
    pub fn new(capacity: u64, total_bytes: u64, positions: Vec<FilePosition>) -> Self {
        Self {
            capacity,
            positions,
            total_bytes,
        }
    }

    /// Checks that the record can describe a real chunk set.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::HeaderCorrupt("bytes_per_chunk is zero".to_string()));
        }
        for position in &self.positions {
            if position.offset > self.total_bytes {
                return Err(Error::HeaderCorrupt(format!(
                    "offset {} of `{}` exceeds total_bytes {}",
                    position.offset, position.name, self.total_bytes
                )));
            }
            if !is_safe_name(&position.name) {
                return Err(Error::HeaderCorrupt(format!(
                    "unsafe file name `{}`",
                    position.name
                )));
            }
        }
        Ok(())
    }
}

/// A name is safe when it stays below the output directory and is spelled
/// canonically, so no two distinct names map to the same output file.
fn is_safe_name(name: &str) -> bool {
    let mut parts = Vec::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => match part.to_str() {
                Some(part) => parts.push(part),
                None => return false,
            },
            _ => return false,
        }
    }
    !parts.is_empty() && parts.join("/") == name
}

pub fn encode_header(header: &Header) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(header)
        .map_err(Error::HeaderEncode)
}

pub fn decode_header(bytes: &[u8]) -> Result<Header> {
    let header: Header =
        serde_json::from_slice(bytes).map_err(|err| Error::HeaderCorrupt(err.to_string()))?;
    header.validate()?;
    Ok(header)
}

/// Persist the header as `<dir>/header`.
///
/// The record is staged in a temp file and renamed into place, so a header
/// is either absent or complete.
pub fn write_header(dir: &Path, header: &Header) -> Result<()> {
    let path = header_path(dir);
    let tmp = path.with_extension("tmp");
    let data = encode_header(header)?;
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp)
        .map_err(|err| Error::sink_write(tmp.display(), err))?;
    file.write_all(&data)
        .and_then(|()| file.sync_all())
        .map_err(|err| Error::sink_write(tmp.display(), err))?;
    drop(file);
    std::fs::rename(&tmp, &path).map_err(|err| Error::sink_write(path.display(), err))?;
    Ok(())
}

pub fn read_header(dir: &Path) -> Result<Header> {
    let path = header_path(dir);
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Err(Error::HeaderMissing(path)),
        Err(err) => return Err(Error::source_read(path.display(), err)),
    };
    decode_header(&bytes)
}

mod positions {
    use std::collections::HashSet;
    use std::fmt;

    use serde::de::{self, MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    use super::FilePosition;

    pub fn serialize<S: Serializer>(
        positions: &[FilePosition],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(positions.len()))?;
        for position in positions {
            map.serialize_entry(&position.name, &position.offset)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<FilePosition>, D::Error> {
        deserializer.deserialize_map(PositionsVisitor)
    }

    struct PositionsVisitor;

    impl<'de> Visitor<'de> for PositionsVisitor {
        type Value = Vec<FilePosition>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of file name to logical offset")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut seen = HashSet::new();
            let mut positions = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((name, offset)) = access.next_entry::<String, u64>()? {
                if !seen.insert(name.clone()) {
                    return Err(de::Error::custom(format!("duplicate file name `{name}`")));
                }
                positions.push(FilePosition { name, offset });
            }
            Ok(positions)
        }
    }
}
