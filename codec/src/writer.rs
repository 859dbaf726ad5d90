use crate::{CodecError, KeyBytes};

/// Append-only builder for instruction payloads.
///
/// Every `put_*` call appends to the end of the buffer; nothing already
/// written is ever inspected or rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Single byte, masked to 0..=255.
    pub fn put_u8(&mut self, value: u64) -> &mut Self {
        self.buf.push((value & 0xff) as u8);
        self
    }

    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        self.put_bytes(&value.to_le_bytes())
    }

    pub fn put_u64(&mut self, value: u64) -> &mut Self {
        self.put_bytes(&value.to_le_bytes())
    }

    pub fn put_i64(&mut self, value: i64) -> &mut Self {
        self.put_bytes(&value.to_le_bytes())
    }

    pub fn put_key(&mut self, key: &KeyBytes) -> &mut Self {
        self.put_bytes(key)
    }

    /// u32 LE byte length followed by the UTF-8 bytes.
    pub fn put_string(&mut self, value: &str) -> Result<&mut Self, CodecError> {
        let len = prefix_len(value.len())?;
        self.put_u32(len);
        Ok(self.put_bytes(value.as_bytes()))
    }

    /// u32 LE element count followed by each element as a string.
    pub fn put_string_vec<S: AsRef<str>>(&mut self, items: &[S]) -> Result<&mut Self, CodecError> {
        let count = prefix_len(items.len())?;
        self.put_u32(count);
        for item in items {
            self.put_string(item.as_ref())?;
        }
        Ok(self)
    }

    pub fn put_compact_u16(&mut self, value: u16) -> &mut Self {
        let mut rem = value;
        loop {
            let mut byte = (rem & 0x7f) as u8;
            rem >>= 7;
            if rem == 0 {
                self.buf.push(byte);
                return self;
            }
            byte |= 0x80;
            self.buf.push(byte);
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

fn prefix_len(len: usize) -> Result<u32, CodecError> {
    u32::try_from(len).map_err(|_| CodecError::LengthOverflow { len })
}
