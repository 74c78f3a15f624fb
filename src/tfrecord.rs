//! TFRecord framing, the container format TensorFlow Serving reads warm-up
//! requests from.
//!
//! Each record is laid out as
//! `u64 length | u32 masked_crc32c(length) | data | u32 masked_crc32c(data)`,
//! all integers little-endian.

use std::io::{ErrorKind, Read, Write};

use crate::error::{Error, Result};

const MASK_DELTA: u32 = 0xa282_ead8;

pub fn masked_crc(data: &[u8]) -> u32 {
    let crc = crc32c::crc32c(data);
    crc.rotate_right(15).wrapping_add(MASK_DELTA)
}

pub struct TfRecordWriter<W: Write> {
    inner: W,
}

impl<W: Write> TfRecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write_record(&mut self, data: &[u8]) -> Result<()> {
        let len = (data.len() as u64).to_le_bytes();
        self.inner.write_all(&len)?;
        self.inner.write_all(&masked_crc(&len).to_le_bytes())?;
        self.inner.write_all(data)?;
        self.inner.write_all(&masked_crc(data).to_le_bytes())?;
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Reads every record of a TFRecord stream, verifying both checksums.
pub fn read_records<R: Read>(mut reader: R) -> Result<Vec<Vec<u8>>> {
    let mut records = Vec::new();
    loop {
        let mut len_buf = [0u8; 8];
        match reader.read_exact(&mut len_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        let mut crc_buf = [0u8; 4];
        reader.read_exact(&mut crc_buf)?;
        if u32::from_le_bytes(crc_buf) != masked_crc(&len_buf) {
            return Err(Error::Record(format!("corrupted length in record {}", records.len())));
        }

        let len = usize::try_from(u64::from_le_bytes(len_buf))
            .map_err(|_| Error::Record("record length overflows usize".into()))?;
        let mut data = vec![0u8; len];
        reader.read_exact(&mut data)?;
        reader.read_exact(&mut crc_buf)?;
        if u32::from_le_bytes(crc_buf) != masked_crc(&data) {
            return Err(Error::Record(format!("corrupted data in record {}", records.len())));
        }
        records.push(data);
    }
    Ok(records)
}
