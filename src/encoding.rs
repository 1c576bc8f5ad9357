// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

//! The `BinaryCodable` trait, decoding limits and the little-endian
//! primitive read/write helpers everything else is built from.

use std::{
    io::{self, Cursor, Read, Write},
    sync::Arc,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use parking_lot::Mutex;

use crate::{constants, error::CodecError};

pub use crate::error::EncodingResult;

/// Guards recursive values such as nested structures and extension objects
/// against unbounded recursion while decoding.
#[derive(Debug)]
pub struct DepthGauge {
    max_depth: usize,
    current_depth: usize,
}

impl Default for DepthGauge {
    fn default() -> Self {
        Self {
            max_depth: constants::MAX_DECODING_DEPTH,
            current_depth: 0,
        }
    }
}

impl DepthGauge {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            current_depth: 0,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

/// Holds one increment on the depth gauge. Dropping the lock decrements the
/// depth again, also during an unwind.
#[derive(Debug)]
pub struct DepthLock {
    depth_gauge: Arc<Mutex<DepthGauge>>,
}

impl Drop for DepthLock {
    fn drop(&mut self) {
        let mut gauge = self.depth_gauge.lock();
        if gauge.current_depth > 0 {
            gauge.current_depth -= 1;
        }
    }
}

impl DepthLock {
    pub fn obtain(depth_gauge: Arc<Mutex<DepthGauge>>) -> EncodingResult<DepthLock> {
        {
            let mut gauge = depth_gauge.lock();
            if gauge.current_depth >= gauge.max_depth {
                warn!("Decoding aborted, maximum recursion depth reached");
                return Err(CodecError::DepthExceeded);
            }
            gauge.current_depth += 1;
        }
        Ok(Self { depth_gauge })
    }
}

/// Limits the decoder applies to protect against malformed or hostile
/// streams. The transport layer that owns the stream decides the values.
#[derive(Clone, Debug)]
pub struct DecodingOptions {
    /// Maximum length in bytes of a string. 0 means no string permitted.
    pub max_string_length: usize,
    /// Maximum length in bytes of a byte string. 0 means no byte string permitted.
    pub max_byte_string_length: usize,
    /// Maximum number of array elements. 0 means no array permitted.
    pub max_array_length: usize,
    /// Shared recursion gauge for nested values.
    pub depth_gauge: Arc<Mutex<DepthGauge>>,
}

impl Default for DecodingOptions {
    fn default() -> Self {
        DecodingOptions {
            max_string_length: constants::MAX_STRING_LENGTH,
            max_byte_string_length: constants::MAX_BYTE_STRING_LENGTH,
            max_array_length: constants::MAX_ARRAY_LENGTH,
            depth_gauge: Arc::new(Mutex::new(DepthGauge::default())),
        }
    }
}

impl DecodingOptions {
    /// Tight limits for decoding payloads that are not expected to contain
    /// large values, e.g. extension object bodies from untrusted relays.
    pub fn minimal() -> Self {
        DecodingOptions {
            max_string_length: 8192,
            max_byte_string_length: 8192,
            max_array_length: 8192,
            depth_gauge: Arc::new(Mutex::new(DepthGauge::new(1))),
        }
    }

    #[cfg(test)]
    pub fn test() -> Self {
        Self::default()
    }

    pub fn depth_lock(&self) -> EncodingResult<DepthLock> {
        DepthLock::obtain(self.depth_gauge.clone())
    }
}

/// Implemented by every value with a fixed binary wire form. `byte_len`
/// must return exactly the number of bytes `encode` will write.
pub trait BinaryCodable: Sized {
    /// The exact byte length of the value as `encode` would write it.
    fn byte_len(&self) -> usize;
    /// Encodes the value to the stream, returning the number of bytes written.
    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize>;
    /// Decodes a value from the stream, honouring the supplied limits.
    fn decode<S: Read>(stream: &mut S, options: &DecodingOptions) -> EncodingResult<Self>;

    /// Convenience for encoding into a fresh buffer. Prefer reusing buffers
    /// on hot paths.
    fn encode_to_vec(&self) -> EncodingResult<Vec<u8>> {
        let mut stream = Cursor::new(Vec::with_capacity(self.byte_len()));
        self.encode(&mut stream)?;
        Ok(stream.into_inner())
    }
}

/// Maps an I/O error on read. An unexpected end of stream is a truncation,
/// anything else propagates unchanged.
pub(crate) fn io_read_error(err: io::Error) -> CodecError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        trace!("Stream ended mid-value - {}", err);
        CodecError::TruncatedStream
    } else {
        CodecError::Io(err)
    }
}

pub(crate) fn io_write_error(err: io::Error) -> CodecError {
    trace!("Write failed - {}", err);
    CodecError::Io(err)
}

pub fn write_u8<S: Write>(stream: &mut S, value: u8) -> EncodingResult<usize> {
    stream.write_u8(value).map_err(io_write_error)?;
    Ok(1)
}

pub fn write_i16<S: Write>(stream: &mut S, value: i16) -> EncodingResult<usize> {
    stream.write_i16::<LittleEndian>(value).map_err(io_write_error)?;
    Ok(2)
}

pub fn write_u16<S: Write>(stream: &mut S, value: u16) -> EncodingResult<usize> {
    stream.write_u16::<LittleEndian>(value).map_err(io_write_error)?;
    Ok(2)
}

pub fn write_i32<S: Write>(stream: &mut S, value: i32) -> EncodingResult<usize> {
    stream.write_i32::<LittleEndian>(value).map_err(io_write_error)?;
    Ok(4)
}

pub fn write_u32<S: Write>(stream: &mut S, value: u32) -> EncodingResult<usize> {
    stream.write_u32::<LittleEndian>(value).map_err(io_write_error)?;
    Ok(4)
}

pub fn write_i64<S: Write>(stream: &mut S, value: i64) -> EncodingResult<usize> {
    stream.write_i64::<LittleEndian>(value).map_err(io_write_error)?;
    Ok(8)
}

pub fn write_u64<S: Write>(stream: &mut S, value: u64) -> EncodingResult<usize> {
    stream.write_u64::<LittleEndian>(value).map_err(io_write_error)?;
    Ok(8)
}

pub fn write_f32<S: Write>(stream: &mut S, value: f32) -> EncodingResult<usize> {
    stream.write_f32::<LittleEndian>(value).map_err(io_write_error)?;
    Ok(4)
}

pub fn write_f64<S: Write>(stream: &mut S, value: f64) -> EncodingResult<usize> {
    stream.write_f64::<LittleEndian>(value).map_err(io_write_error)?;
    Ok(8)
}

pub fn write_all<S: Write>(stream: &mut S, buf: &[u8]) -> EncodingResult<usize> {
    stream.write_all(buf).map_err(io_write_error)?;
    Ok(buf.len())
}

pub fn read_u8<S: Read>(stream: &mut S) -> EncodingResult<u8> {
    stream.read_u8().map_err(io_read_error)
}

pub fn read_i16<S: Read>(stream: &mut S) -> EncodingResult<i16> {
    stream.read_i16::<LittleEndian>().map_err(io_read_error)
}

pub fn read_u16<S: Read>(stream: &mut S) -> EncodingResult<u16> {
    stream.read_u16::<LittleEndian>().map_err(io_read_error)
}

pub fn read_i32<S: Read>(stream: &mut S) -> EncodingResult<i32> {
    stream.read_i32::<LittleEndian>().map_err(io_read_error)
}

pub fn read_u32<S: Read>(stream: &mut S) -> EncodingResult<u32> {
    stream.read_u32::<LittleEndian>().map_err(io_read_error)
}

pub fn read_i64<S: Read>(stream: &mut S) -> EncodingResult<i64> {
    stream.read_i64::<LittleEndian>().map_err(io_read_error)
}

pub fn read_u64<S: Read>(stream: &mut S) -> EncodingResult<u64> {
    stream.read_u64::<LittleEndian>().map_err(io_read_error)
}

pub fn read_f32<S: Read>(stream: &mut S) -> EncodingResult<f32> {
    stream.read_f32::<LittleEndian>().map_err(io_read_error)
}

pub fn read_f64<S: Read>(stream: &mut S) -> EncodingResult<f64> {
    stream.read_f64::<LittleEndian>().map_err(io_read_error)
}

pub fn read_exact<S: Read>(stream: &mut S, buf: &mut [u8]) -> EncodingResult<()> {
    stream.read_exact(buf).map_err(io_read_error)
}

/// Reads and validates an Int32 length prefix. Returns `None` for a null
/// (-1) prefix. `max` is the applicable decoding limit.
pub fn read_length_prefix<S: Read>(
    stream: &mut S,
    kind: &'static str,
    max: usize,
) -> EncodingResult<Option<usize>> {
    let len = read_i32(stream)?;
    if len == -1 {
        Ok(None)
    } else if len < -1 {
        error!("{} length prefix {} is invalid", kind, len);
        Err(CodecError::MalformedLength(i64::from(len)))
    } else if len as usize > max {
        error!("{} length {} exceeds decoding limit {}", kind, len, max);
        Err(CodecError::LimitExceeded {
            kind,
            len: len as usize,
            max,
        })
    } else {
        Ok(Some(len as usize))
    }
}

/// Byte length of an array of codable values, including the length prefix.
pub fn byte_len_array<T: BinaryCodable>(values: &Option<Vec<T>>) -> usize {
    let mut size = 4;
    if let Some(ref values) = values {
        size += values.iter().map(|v| v.byte_len()).sum::<usize>();
    }
    size
}

/// Writes an array of codable values, preserving the distinction between a
/// null array and an empty one.
pub fn write_array<S: Write, T: BinaryCodable>(
    stream: &mut S,
    values: &Option<Vec<T>>,
) -> EncodingResult<usize> {
    let mut size = 0;
    match values {
        Some(values) => {
            size += write_i32(stream, values.len() as i32)?;
            for value in values {
                size += value.encode(stream)?;
            }
        }
        None => size += write_i32(stream, -1)?,
    }
    Ok(size)
}

/// Reads an array of codable values, preserving the distinction between a
/// null array and an empty one.
pub fn read_array<S: Read, T: BinaryCodable>(
    stream: &mut S,
    options: &DecodingOptions,
) -> EncodingResult<Option<Vec<T>>> {
    let len = match read_length_prefix(stream, "Array", options.max_array_length)? {
        None => return Ok(None),
        Some(len) => len,
    };
    let mut values = Vec::with_capacity(len);
    for _ in 0..len {
        values.push(T::decode(stream, options)?);
    }
    Ok(Some(values))
}

// The fixed-width scalars of OPC UA Part 6 map directly onto Rust
// primitives, all little-endian on the wire.

impl BinaryCodable for bool {
    fn byte_len(&self) -> usize {
        1
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        write_u8(stream, u8::from(*self))
    }

    fn decode<S: Read>(stream: &mut S, _: &DecodingOptions) -> EncodingResult<Self> {
        Ok(read_u8(stream)? == 1)
    }
}

impl BinaryCodable for i8 {
    fn byte_len(&self) -> usize {
        1
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        write_u8(stream, *self as u8)
    }

    fn decode<S: Read>(stream: &mut S, _: &DecodingOptions) -> EncodingResult<Self> {
        Ok(read_u8(stream)? as i8)
    }
}

impl BinaryCodable for u8 {
    fn byte_len(&self) -> usize {
        1
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        write_u8(stream, *self)
    }

    fn decode<S: Read>(stream: &mut S, _: &DecodingOptions) -> EncodingResult<Self> {
        read_u8(stream)
    }
}

impl BinaryCodable for i16 {
    fn byte_len(&self) -> usize {
        2
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        write_i16(stream, *self)
    }

    fn decode<S: Read>(stream: &mut S, _: &DecodingOptions) -> EncodingResult<Self> {
        read_i16(stream)
    }
}

impl BinaryCodable for u16 {
    fn byte_len(&self) -> usize {
        2
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        write_u16(stream, *self)
    }

    fn decode<S: Read>(stream: &mut S, _: &DecodingOptions) -> EncodingResult<Self> {
        read_u16(stream)
    }
}

impl BinaryCodable for i32 {
    fn byte_len(&self) -> usize {
        4
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        write_i32(stream, *self)
    }

    fn decode<S: Read>(stream: &mut S, _: &DecodingOptions) -> EncodingResult<Self> {
        read_i32(stream)
    }
}

impl BinaryCodable for u32 {
    fn byte_len(&self) -> usize {
        4
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        write_u32(stream, *self)
    }

    fn decode<S: Read>(stream: &mut S, _: &DecodingOptions) -> EncodingResult<Self> {
        read_u32(stream)
    }
}

impl BinaryCodable for i64 {
    fn byte_len(&self) -> usize {
        8
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        write_i64(stream, *self)
    }

    fn decode<S: Read>(stream: &mut S, _: &DecodingOptions) -> EncodingResult<Self> {
        read_i64(stream)
    }
}

impl BinaryCodable for u64 {
    fn byte_len(&self) -> usize {
        8
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        write_u64(stream, *self)
    }

    fn decode<S: Read>(stream: &mut S, _: &DecodingOptions) -> EncodingResult<Self> {
        read_u64(stream)
    }
}

impl BinaryCodable for f32 {
    fn byte_len(&self) -> usize {
        4
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        write_f32(stream, *self)
    }

    fn decode<S: Read>(stream: &mut S, _: &DecodingOptions) -> EncodingResult<Self> {
        read_f32(stream)
    }
}

impl BinaryCodable for f64 {
    fn byte_len(&self) -> usize {
        8
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        write_f64(stream, *self)
    }

    fn decode<S: Read>(stream: &mut S, _: &DecodingOptions) -> EncodingResult<Self> {
        read_f64(stream)
    }
}
