// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Sequential little-endian reader over a borrowed account buffer.

use crate::error::{DecodeError, Result};

pub struct RecordCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> RecordCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    pub fn read_fixed<const N: usize>(&mut self) -> Result<[u8; N]> {
        let end = self.offset + N;
        let Some(slice) = self.data.get(self.offset..end) else {
            return Err(DecodeError::Truncated {
                needed: end,
                available: self.data.len(),
            });
        };
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.offset = end;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let [byte] = self.read_fixed::<1>()?;
        Ok(byte)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_fixed::<8>().map(u64::from_le_bytes)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_fixed::<8>().map(i64::from_le_bytes)
    }

    /// Strict bool: only `0` and `1` are accepted.
    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError::InvalidBool(other)),
        }
    }

    /// Presence-tagged optional value. The tag alone decides whether `read`
    /// consumes any further bytes.
    pub fn read_option<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<Option<T>> {
        match self.read_u8()? {
            0 => Ok(None),
            1 => read(self).map(Some),
            other => Err(DecodeError::InvalidPresenceTag(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_advance_offset() {
        let mut data = vec![9u8];
        data.extend_from_slice(&(-5i64).to_le_bytes());
        data.extend_from_slice(&7u64.to_le_bytes());
        let mut cursor = RecordCursor::new(&data);
        assert_eq!(cursor.read_u8().unwrap(), 9);
        assert_eq!(cursor.read_i64().unwrap(), -5);
        assert_eq!(cursor.read_u64().unwrap(), 7);
        assert_eq!(cursor.offset(), 17);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn short_read_reports_needed_length() {
        let mut cursor = RecordCursor::new(&[1, 2, 3]);
        assert_eq!(
            cursor.read_u64(),
            Err(DecodeError::Truncated {
                needed: 8,
                available: 3
            })
        );
        // failed read leaves the cursor in place
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn option_branches_on_tag() {
        let mut cursor = RecordCursor::new(&[0, 1, 42, 2]);
        assert_eq!(cursor.read_option(|c| c.read_u8()).unwrap(), None);
        assert_eq!(cursor.offset(), 1);
        assert_eq!(cursor.read_option(|c| c.read_u8()).unwrap(), Some(42));
        assert_eq!(cursor.offset(), 3);
        assert_eq!(
            cursor.read_option(|c| c.read_u8()),
            Err(DecodeError::InvalidPresenceTag(2))
        );
    }

    #[test]
    fn bool_is_strict() {
        let mut cursor = RecordCursor::new(&[0, 1, 2]);
        assert!(!cursor.read_bool().unwrap());
        assert!(cursor.read_bool().unwrap());
        assert_eq!(cursor.read_bool(), Err(DecodeError::InvalidBool(2)));
    }
}
