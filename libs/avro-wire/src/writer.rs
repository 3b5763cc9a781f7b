use bytes::BufMut;

use crate::{varint, WireError};

/// Forward-only sink of Avro primitives.
///
/// Object safe, so custom marshalers can be handed `&mut dyn PrimitiveWrite`
/// without knowing the buffer behind it.
pub trait PrimitiveWrite {
    fn write_int(&mut self, value: i32) -> Result<(), WireError>;
    fn write_long(&mut self, value: i64) -> Result<(), WireError>;
    fn write_float(&mut self, value: f32) -> Result<(), WireError>;
    fn write_double(&mut self, value: f64) -> Result<(), WireError>;
    fn write_bool(&mut self, value: bool) -> Result<(), WireError>;
    fn write_string(&mut self, value: &str) -> Result<(), WireError>;
    fn write_bytes(&mut self, value: &[u8]) -> Result<(), WireError>;
    /// Raw bytes without a length prefix (Avro `fixed`).
    fn write_fixed(&mut self, value: &[u8]) -> Result<(), WireError>;
}

/// [`PrimitiveWrite`] over any [`BufMut`].
///
/// A bounded buffer that runs out of space fails with
/// [`WireError::BufferFull`] rather than panicking.
#[derive(Debug, Default)]
pub struct Writer<B> {
    buf: B,
}

impl<B: BufMut> Writer<B> {
    pub fn new(buf: B) -> Self {
        Self { buf }
    }

    pub fn into_inner(self) -> B {
        self.buf
    }

    fn reserve(&self, needed: usize) -> Result<(), WireError> {
        let remaining = self.buf.remaining_mut();
        if remaining < needed {
            return Err(WireError::BufferFull { needed, remaining });
        }
        Ok(())
    }

    fn put_len_prefixed(&mut self, value: &[u8]) -> Result<(), WireError> {
        let len = value.len() as i64;
        self.reserve(varint::size(len) + value.len())?;
        varint::write(len, &mut self.buf);
        self.buf.put_slice(value);
        Ok(())
    }
}

impl Writer<Vec<u8>> {
    /// Writer over a fresh growable buffer.
    pub fn with_vec() -> Self {
        Self::new(Vec::new())
    }
}

impl<B: BufMut> PrimitiveWrite for Writer<B> {
    fn write_int(&mut self, value: i32) -> Result<(), WireError> {
        self.write_long(i64::from(value))
    }

    fn write_long(&mut self, value: i64) -> Result<(), WireError> {
        self.reserve(varint::size(value))?;
        varint::write(value, &mut self.buf);
        Ok(())
    }

    fn write_float(&mut self, value: f32) -> Result<(), WireError> {
        self.reserve(4)?;
        self.buf.put_f32_le(value);
        Ok(())
    }

    fn write_double(&mut self, value: f64) -> Result<(), WireError> {
        self.reserve(8)?;
        self.buf.put_f64_le(value);
        Ok(())
    }

    fn write_bool(&mut self, value: bool) -> Result<(), WireError> {
        self.reserve(1)?;
        self.buf.put_u8(u8::from(value));
        Ok(())
    }

    fn write_string(&mut self, value: &str) -> Result<(), WireError> {
        self.put_len_prefixed(value.as_bytes())
    }

    fn write_bytes(&mut self, value: &[u8]) -> Result<(), WireError> {
        self.put_len_prefixed(value)
    }

    fn write_fixed(&mut self, value: &[u8]) -> Result<(), WireError> {
        self.reserve(value.len())?;
        self.buf.put_slice(value);
        Ok(())
    }
}
