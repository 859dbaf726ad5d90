use crate::{CodecError, KeyBytes, KEY_LEN};

/// Offset-tracking cursor over a borrowed account buffer.
///
/// Reads never mutate the source slice. A failed read leaves the cursor
/// where it was.
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    pub fn at(buf: &'a [u8], offset: usize) -> Self {
        Self { buf, offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.offset)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), CodecError> {
        self.take(len).map(|_| ())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        self.take(len)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        Ok(i64::from_le_bytes(self.take_array()?))
    }

    pub fn read_key(&mut self) -> Result<KeyBytes, CodecError> {
        self.take_array::<KEY_LEN>()
    }

    pub fn read_string(&mut self) -> Result<String, CodecError> {
        let start = self.offset;
        let len = self.read_u32()? as usize;
        let body_offset = self.offset;
        let bytes = match self.take(len) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.offset = start;
                return Err(err);
            }
        };
        match std::str::from_utf8(bytes) {
            Ok(value) => Ok(value.to_owned()),
            Err(_) => {
                self.offset = start;
                Err(CodecError::InvalidUtf8 {
                    offset: body_offset,
                })
            }
        }
    }

    pub fn read_string_vec(&mut self) -> Result<Vec<String>, CodecError> {
        let start = self.offset;
        let count = self.read_u32()? as usize;
        // Each element costs at least its 4-byte prefix; never trust the
        // declared count for the allocation.
        let mut items = Vec::with_capacity(count.min(self.remaining() / 4));
        for _ in 0..count {
            match self.read_string() {
                Ok(item) => items.push(item),
                Err(err) => {
                    self.offset = start;
                    return Err(err);
                }
            }
        }
        Ok(items)
    }

    pub fn read_compact_u16(&mut self) -> Result<u16, CodecError> {
        let start = self.offset;
        let mut value: u32 = 0;
        for i in 0..3 {
            let byte = match self.read_u8() {
                Ok(byte) => byte,
                Err(err) => {
                    self.offset = start;
                    return Err(err);
                }
            };
            value |= u32::from(byte & 0x7f) << (i * 7);
            if byte & 0x80 == 0 {
                return u16::try_from(value).map_err(|_| {
                    self.offset = start;
                    CodecError::CompactU16Overflow { offset: start }
                });
            }
        }
        self.offset = start;
        Err(CodecError::CompactU16Overflow { offset: start })
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let remaining = self.remaining();
        let eof = CodecError::UnexpectedEof {
            offset: self.offset,
            needed: len,
            remaining,
        };
        if len > remaining {
            return Err(eof);
        }
        // `at` may start past the end; zero-length reads still fail there.
        let end = self.offset + len;
        let out = self.buf.get(self.offset..end).ok_or(eof)?;
        self.offset = end;
        Ok(out)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0_u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }
}
