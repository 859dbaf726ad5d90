#![forbid(unsafe_code)]
//! Byte layout primitives for the OPCLW task marketplace and knowledge
//! vault programs.
//!
//! All integers are little-endian. Strings are a `u32` byte length followed
//! by UTF-8 bytes; string vectors are a `u32` element count followed by each
//! string. This matches the Borsh encoding the deployed programs use.

mod error;
mod reader;
mod writer;

pub use error::CodecError;
pub use reader::ByteReader;
pub use writer::ByteWriter;

pub const KEY_LEN: usize = 32;
pub const LEN_PREFIX_LEN: usize = 4;
pub const U64_LEN: usize = 8;

pub type KeyBytes = [u8; KEY_LEN];

pub fn encode_string(value: &str) -> Result<Vec<u8>, CodecError> {
    let mut writer = ByteWriter::with_capacity(LEN_PREFIX_LEN + value.len());
    writer.put_string(value)?;
    Ok(writer.into_bytes())
}

pub fn encode_string_vec<S: AsRef<str>>(items: &[S]) -> Result<Vec<u8>, CodecError> {
    let mut writer = ByteWriter::new();
    writer.put_string_vec(items)?;
    Ok(writer.into_bytes())
}

pub fn encode_u64(value: u64) -> [u8; U64_LEN] {
    value.to_le_bytes()
}

pub fn encode_i64(value: i64) -> [u8; U64_LEN] {
    value.to_le_bytes()
}

pub fn encode_u8(value: u64) -> [u8; 1] {
    [(value & 0xff) as u8]
}

pub fn encode_compact_u16(value: u16) -> Vec<u8> {
    let mut writer = ByteWriter::with_capacity(3);
    writer.put_compact_u16(value);
    writer.into_bytes()
}

/// Returns the decoded string and the offset just past it.
pub fn read_string(buf: &[u8], offset: usize) -> Result<(String, usize), CodecError> {
    let mut reader = ByteReader::at(buf, offset);
    let value = reader.read_string()?;
    Ok((value, reader.offset()))
}

pub fn read_string_vec(buf: &[u8], offset: usize) -> Result<(Vec<String>, usize), CodecError> {
    let mut reader = ByteReader::at(buf, offset);
    let value = reader.read_string_vec()?;
    Ok((value, reader.offset()))
}

pub fn read_u64(buf: &[u8], offset: usize) -> Result<u64, CodecError> {
    ByteReader::at(buf, offset).read_u64()
}

pub fn read_i64(buf: &[u8], offset: usize) -> Result<i64, CodecError> {
    ByteReader::at(buf, offset).read_i64()
}

pub fn read_u8(buf: &[u8], offset: usize) -> Result<u8, CodecError> {
    ByteReader::at(buf, offset).read_u8()
}

pub fn read_key(buf: &[u8], offset: usize) -> Result<KeyBytes, CodecError> {
    ByteReader::at(buf, offset).read_key()
}
