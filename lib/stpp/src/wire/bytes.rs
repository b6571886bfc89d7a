use crate::wire::{FrameError, FrameResult};
use byteorder::{ByteOrder, LittleEndian};

/// Long string lengths are introduced by this sentinel in place of the
/// 1-byte short form, followed by a 4-byte little-endian length.
const LONG_STRING: u8 = 0xff;

/// Cursor over an inbound frame. All reads advance; a failed read leaves
/// the cursor untouched so callers can fall back to softer parses.
pub struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    #[inline]
    pub fn new(data: &'a [u8]) -> Reader<'a> {
        Reader { data }
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn u8(&mut self) -> FrameResult<u8> {
        match self.data.split_first() {
            Some((&b, rest)) => {
                self.data = rest;
                Ok(b)
            }
            None => Err(FrameError::Short),
        }
    }

    #[inline]
    pub fn u16(&mut self) -> FrameResult<u16> {
        let bytes = self.take(2)?;
        Ok(LittleEndian::read_u16(bytes))
    }

    #[inline]
    pub fn u32(&mut self) -> FrameResult<u32> {
        let bytes = self.take(4)?;
        Ok(LittleEndian::read_u32(bytes))
    }

    #[inline]
    pub fn take(&mut self, count: usize) -> FrameResult<&'a [u8]> {
        if count > self.data.len() {
            return Err(FrameError::Short);
        }
        let (head, rest) = self.data.split_at(count);
        self.data = rest;
        Ok(head)
    }

    /// Remaining payload, consuming the reader.
    #[inline]
    pub fn rest(&mut self) -> &'a [u8] {
        std::mem::replace(&mut self.data, &[])
    }

    /// Remaining payload up to the first NUL, consuming the reader. Used
    /// for the trailing-string fields that rely on the transport's zero
    /// padding in the original framing.
    pub fn cstr(&mut self) -> String {
        let rest = self.rest();
        let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        String::from_utf8_lossy(&rest[..end]).into_owned()
    }

    /// Length-prefixed string: 1-byte short form, or the 0xff sentinel
    /// followed by a 4-byte little-endian length.
    pub fn string(&mut self) -> FrameResult<String> {
        let prefix = self.u8().map_err(|_| FrameError::TruncatedString)?;
        let len = if prefix == LONG_STRING {
            self.u32().map_err(|_| FrameError::TruncatedString)? as usize
        } else {
            prefix as usize
        };
        let bytes = self.take(len).map_err(|_| FrameError::TruncatedString)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// String vector: members carry a single-byte length, a zero-length
    /// member terminates. Running out of payload also ends the vector; a
    /// member overrunning the payload is a defect.
    pub fn string_vector(&mut self) -> FrameResult<Vec<String>> {
        let mut members = Vec::new();
        while self.remaining() > 0 {
            let len = self.u8().map_err(|_| FrameError::TruncatedVector)? as usize;
            if len == 0 {
                break;
            }
            let bytes = self.take(len).map_err(|_| FrameError::TruncatedVector)?;
            members.push(String::from_utf8_lossy(bytes).into_owned());
        }
        Ok(members)
    }
}

/// Frame builder for the binary encoding.
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    #[inline]
    pub fn new() -> Writer {
        Writer { buf: Vec::new() }
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Writer {
        Writer {
            buf: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    #[inline]
    pub fn u16(&mut self, value: u16) {
        let mut bytes = [0u8; 2];
        LittleEndian::write_u16(&mut bytes, value);
        self.buf.extend_from_slice(&bytes);
    }

    #[inline]
    pub fn u32(&mut self, value: u32) {
        let mut bytes = [0u8; 4];
        LittleEndian::write_u32(&mut bytes, value);
        self.buf.extend_from_slice(&bytes);
    }

    #[inline]
    pub fn bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn string(&mut self, value: &str) {
        let bytes = value.as_bytes();
        if bytes.len() < LONG_STRING as usize {
            self.u8(bytes.len() as u8);
        } else {
            self.u8(LONG_STRING);
            self.u32(bytes.len() as u32);
        }
        self.bytes(bytes);
    }

    /// Vector members use the single-byte length form only.
    pub fn string_vector(&mut self, members: &[String]) {
        for member in members {
            let bytes = member.as_bytes();
            self.u8(bytes.len() as u8);
            self.bytes(bytes);
        }
        self.u8(0);
    }

    #[inline]
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Wire reference to a property: a session-local id plus an optional name
/// path to descend from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropRef {
    pub id: u32,
    pub names: Vec<String>,
}

impl PropRef {
    /// Id plus trailing string vector. The shortest valid encoding is the
    /// id and the vector terminator.
    pub fn read(reader: &mut Reader) -> FrameResult<PropRef> {
        if reader.remaining() < 5 {
            return Err(FrameError::Short);
        }
        let id = reader.u32()?;
        let names = reader.string_vector()?;
        Ok(PropRef { id, names })
    }

    pub fn write(&self, writer: &mut Writer) {
        writer.u32(self.id);
        writer.string_vector(&self.names);
    }
}
