//! Binary layout of persisted stubs.
//!
//! A stub is a MessagePack array `[format_version, kind_tag, name, namespace,
//! flags]`. A file's stubs are `[format_version, content_version, [stub...]]`.
//! Decoding checks every field; any deviation is [`IndexCorruption`].

use std::io::Cursor;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use thiserror::Error;

use super::{PerlStub, StubFlags, StubKind};

/// Version of the record layout. Bump when the layout changes.
pub const FORMAT_VERSION: u16 = 1;

/// Persisted bytes do not follow the record layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexCorruption {
    #[error("malformed stub record: {0}")]
    Malformed(String),

    #[error("unsupported stub format version {found} (expected {FORMAT_VERSION})")]
    UnsupportedFormat { found: u16 },

    #[error("unknown stub kind tag {0}")]
    UnknownKind(u16),

    #[error("undefined stub flag bits {0:#010b}")]
    InvalidFlags(u8),

    #[error("stub record has an empty name")]
    EmptyName,

    #[error("{0} trailing bytes after stub record")]
    TrailingBytes(usize),

    #[error("could not encode stub record: {0}")]
    Encode(String),
}

#[derive(Serialize, Deserialize)]
struct StubRecord(u16, u16, SmolStr, SmolStr, u8);

#[derive(Serialize, Deserialize)]
struct FileRecord(u16, u64, Vec<StubRecord>);

/// Stubs of one file as persisted, with the content version they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStubs {
    pub version: u64,
    pub stubs: Vec<PerlStub>,
}

impl From<&PerlStub> for StubRecord {
    fn from(stub: &PerlStub) -> Self {
        StubRecord(
            FORMAT_VERSION,
            stub.kind.tag(),
            stub.name.clone(),
            stub.namespace.clone(),
            stub.flags.bits(),
        )
    }
}

impl TryFrom<StubRecord> for PerlStub {
    type Error = IndexCorruption;

    fn try_from(record: StubRecord) -> Result<Self, Self::Error> {
        let StubRecord(format, tag, name, namespace, bits) = record;
        check_format(format)?;
        let kind = StubKind::from_tag(tag).ok_or(IndexCorruption::UnknownKind(tag))?;
        let flags = StubFlags::from_bits(bits).ok_or(IndexCorruption::InvalidFlags(bits))?;
        if name.is_empty() {
            return Err(IndexCorruption::EmptyName);
        }
        Ok(PerlStub {
            kind,
            name,
            namespace,
            flags,
        })
    }
}

fn check_format(found: u16) -> Result<(), IndexCorruption> {
    if found == FORMAT_VERSION {
        Ok(())
    } else {
        Err(IndexCorruption::UnsupportedFormat { found })
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, IndexCorruption> {
    rmp_serde::to_vec(value).map_err(|e| IndexCorruption::Encode(e.to_string()))
}

/// Decode exactly one value spanning all of `bytes`.
fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, IndexCorruption> {
    let mut cursor = Cursor::new(bytes);
    let value = rmp_serde::from_read(&mut cursor)
        .map_err(|e| IndexCorruption::Malformed(e.to_string()))?;
    let consumed = cursor.position() as usize;
    if consumed != bytes.len() {
        return Err(IndexCorruption::TrailingBytes(bytes.len() - consumed));
    }
    Ok(value)
}

pub fn encode_stub(stub: &PerlStub) -> Result<Vec<u8>, IndexCorruption> {
    encode(&StubRecord::from(stub))
}

pub fn decode_stub(bytes: &[u8]) -> Result<PerlStub, IndexCorruption> {
    decode::<StubRecord>(bytes)?.try_into()
}

pub fn encode_file_stubs(version: u64, stubs: &[PerlStub]) -> Result<Vec<u8>, IndexCorruption> {
    let records = stubs.iter().map(StubRecord::from).collect();
    encode(&FileRecord(FORMAT_VERSION, version, records))
}

pub fn decode_file_stubs(bytes: &[u8]) -> Result<FileStubs, IndexCorruption> {
    let FileRecord(format, version, records) = decode(bytes)?;
    check_format(format)?;
    let stubs = records
        .into_iter()
        .map(PerlStub::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FileStubs { version, stubs })
}
