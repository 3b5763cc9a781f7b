use bytes::Buf;

use crate::{varint, WireError};

/// Default ceiling for a single length-prefixed allocation (512 MiB).
pub const DEFAULT_MAX_ALLOCATION_BYTES: usize = 512 * 1024 * 1024;

/// Forward-only source of Avro primitives, symmetric to
/// [`PrimitiveWrite`](crate::PrimitiveWrite).
pub trait PrimitiveRead {
    fn read_int(&mut self) -> Result<i32, WireError>;
    fn read_long(&mut self) -> Result<i64, WireError>;
    fn read_float(&mut self) -> Result<f32, WireError>;
    fn read_double(&mut self) -> Result<f64, WireError>;
    fn read_bool(&mut self) -> Result<bool, WireError>;
    fn read_string(&mut self) -> Result<String, WireError>;
    fn read_bytes(&mut self) -> Result<Vec<u8>, WireError>;
    /// Exactly `len` raw bytes (Avro `fixed`).
    fn read_fixed(&mut self, len: usize) -> Result<Vec<u8>, WireError>;
    /// Advances past `len` bytes without interpreting them.
    fn skip(&mut self, len: usize) -> Result<(), WireError>;

    /// Input bytes left, for sources that know it. Lets decoders reject
    /// counts the input cannot possibly hold.
    fn remaining_bytes(&self) -> Option<usize> {
        None
    }
}

/// [`PrimitiveRead`] over any [`Buf`].
#[derive(Debug)]
pub struct Reader<B> {
    buf: B,
    max_allocation_bytes: usize,
}

impl<B: Buf> Reader<B> {
    pub fn new(buf: B) -> Self {
        Self { buf, max_allocation_bytes: DEFAULT_MAX_ALLOCATION_BYTES }
    }

    /// Caps the size of any single string, bytes or fixed value.
    pub fn with_max_allocation(mut self, limit: usize) -> Self {
        self.max_allocation_bytes = limit;
        self
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn into_inner(self) -> B {
        self.buf
    }

    fn ensure(&self, needed: usize) -> Result<(), WireError> {
        let remaining = self.buf.remaining();
        if remaining < needed {
            return Err(WireError::EndOfInput { needed, remaining });
        }
        Ok(())
    }

    fn read_len(&mut self) -> Result<usize, WireError> {
        let len = varint::read(&mut self.buf)?;
        if len < 0 {
            return Err(WireError::NegativeLength(len));
        }
        let len = usize::try_from(len).map_err(|_| WireError::NegativeLength(len))?;
        self.check_allocation(len)?;
        Ok(len)
    }

    fn check_allocation(&self, len: usize) -> Result<(), WireError> {
        if len > self.max_allocation_bytes {
            return Err(WireError::AllocationLimit { len, limit: self.max_allocation_bytes });
        }
        Ok(())
    }

    fn take(&mut self, len: usize) -> Result<Vec<u8>, WireError> {
        self.ensure(len)?;
        let mut out = vec![0u8; len];
        self.buf.copy_to_slice(&mut out);
        Ok(out)
    }
}

impl<B: Buf> PrimitiveRead for Reader<B> {
    fn read_int(&mut self) -> Result<i32, WireError> {
        let value = self.read_long()?;
        i32::try_from(value).map_err(|_| WireError::IntOverflow(value))
    }

    fn read_long(&mut self) -> Result<i64, WireError> {
        varint::read(&mut self.buf)
    }

    fn read_float(&mut self) -> Result<f32, WireError> {
        self.ensure(4)?;
        Ok(self.buf.get_f32_le())
    }

    fn read_double(&mut self) -> Result<f64, WireError> {
        self.ensure(8)?;
        Ok(self.buf.get_f64_le())
    }

    fn read_bool(&mut self) -> Result<bool, WireError> {
        self.ensure(1)?;
        match self.buf.get_u8() {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(WireError::InvalidBool(other)),
        }
    }

    fn read_string(&mut self) -> Result<String, WireError> {
        let bytes = self.read_bytes()?;
        Ok(String::from_utf8(bytes)?)
    }

    fn read_bytes(&mut self) -> Result<Vec<u8>, WireError> {
        let len = self.read_len()?;
        self.take(len)
    }

    fn read_fixed(&mut self, len: usize) -> Result<Vec<u8>, WireError> {
        self.check_allocation(len)?;
        self.take(len)
    }

    fn skip(&mut self, len: usize) -> Result<(), WireError> {
        self.ensure(len)?;
        self.buf.advance(len);
        Ok(())
    }

    fn remaining_bytes(&self) -> Option<usize> {
        Some(self.buf.remaining())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PrimitiveWrite, Writer};

    #[test]
    fn test_read_back_primitives() {
        let mut w = Writer::with_vec();
        w.write_int(-42).unwrap();
        w.write_long(i64::MIN).unwrap();
        w.write_double(29.99).unwrap();
        w.write_bytes(&[1, 2, 3]).unwrap();
        w.write_fixed(&[9, 9]).unwrap();
        let bytes = w.into_inner();

        let mut r = Reader::new(bytes.as_slice());
        assert_eq!(r.read_int().unwrap(), -42);
        assert_eq!(r.read_long().unwrap(), i64::MIN);
        assert_eq!(r.read_double().unwrap(), 29.99);
        assert_eq!(r.read_bytes().unwrap(), vec![1, 2, 3]);
        assert_eq!(r.read_fixed(2).unwrap(), vec![9, 9]);
        assert_eq!(r.remaining(), 0);
        assert_eq!(PrimitiveRead::remaining_bytes(&r), Some(0));
    }

    #[test]
    fn test_int_range_checked() {
        let mut w = Writer::with_vec();
        w.write_long(i64::from(i32::MAX) + 1).unwrap();
        let bytes = w.into_inner();
        let err = Reader::new(bytes.as_slice()).read_int().unwrap_err();
        assert!(matches!(err, WireError::IntOverflow(_)));
    }

    #[test]
    fn test_rejects_bad_lengths() {
        // -1 as a length prefix
        let err = Reader::new(&[0x01][..]).read_bytes().unwrap_err();
        assert!(matches!(err, WireError::NegativeLength(-1)));

        // length 4 with 1 byte of payload
        let err = Reader::new(&[0x08, b'a'][..]).read_string().unwrap_err();
        assert!(matches!(err, WireError::EndOfInput { needed: 4, remaining: 1 }));

        let err = Reader::new(&[0x08, 0, 0, 0, 0][..])
            .with_max_allocation(2)
            .read_bytes()
            .unwrap_err();
        assert!(matches!(err, WireError::AllocationLimit { len: 4, limit: 2 }));
    }

    #[test]
    fn test_rejects_bad_bool_and_utf8() {
        assert!(matches!(Reader::new(&[0x02][..]).read_bool(), Err(WireError::InvalidBool(2))));
        assert!(matches!(
            Reader::new(&[0x02, 0xFF][..]).read_string(),
            Err(WireError::Utf8(_))
        ));
    }
}
