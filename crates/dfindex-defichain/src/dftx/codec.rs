//! Byte-level reader/writer for DfTx payloads and script op-code stacks.
//!
//! Integers are little-endian. Lengths use Bitcoin's compact-size encoding;
//! token ids use the node's MSB base-128 `VARINT`.

use thiserror::Error;

/// `OP_RETURN`
pub const OP_RETURN: u8 = 0x6a;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;

/// Errors that can occur while decoding a DfTx.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unexpected end of data: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid UTF-8 string: {0}")]
    InvalidString(String),

    #[error("Not a DfTx script: {reason}")]
    NotDfTx { reason: String },

    #[error("VarInt overflow")]
    VarIntOverflow,
}

/// Cursor over a byte slice.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::UnexpectedEof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    pub fn read_compact_size(&mut self) -> Result<u64, DecodeError> {
        match self.read_u8()? {
            0xfd => self.read_u16().map(u64::from),
            0xfe => self.read_u32().map(u64::from),
            0xff => self.read_u64(),
            n => Ok(u64::from(n)),
        }
    }

    pub fn read_var_int(&mut self) -> Result<u64, DecodeError> {
        let mut n: u64 = 0;
        loop {
            let byte = self.read_u8()?;
            if n > (u64::MAX >> 7) {
                return Err(DecodeError::VarIntOverflow);
            }
            n = (n << 7) | u64::from(byte & 0x7f);
            if byte & 0x80 == 0 {
                return Ok(n);
            }
            n = n.checked_add(1).ok_or(DecodeError::VarIntOverflow)?;
        }
    }

    /// Compact-size length followed by that many bytes.
    pub fn read_var_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_compact_size()?;
        let len = usize::try_from(len).map_err(|_| DecodeError::UnexpectedEof {
            needed: usize::MAX,
            remaining: self.remaining(),
        })?;
        self.read_bytes(len)
    }

    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let bytes = self.read_var_bytes()?;
        String::from_utf8(bytes.to_vec()).map_err(|e| DecodeError::InvalidString(e.to_string()))
    }

    /// A serialized `CScript`, returned as hex.
    pub fn read_script_hex(&mut self) -> Result<String, DecodeError> {
        Ok(hex::encode(self.read_var_bytes()?))
    }

    pub fn read_rest(&mut self) -> &'a [u8] {
        let out = &self.buf[self.pos..];
        self.pos = self.buf.len();
        out
    }
}

/// Growable byte buffer, the inverse of [`Reader`].
#[derive(Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn write_u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn write_u32(&mut self, v: u32) -> &mut Self {
        self.write_bytes(&v.to_le_bytes())
    }

    pub fn write_i64(&mut self, v: i64) -> &mut Self {
        self.write_bytes(&v.to_le_bytes())
    }

    pub fn write_compact_size(&mut self, n: u64) -> &mut Self {
        match n {
            0..=0xfc => self.write_u8(n as u8),
            0xfd..=0xffff => self.write_u8(0xfd).write_bytes(&(n as u16).to_le_bytes()),
            0x1_0000..=0xffff_ffff => self.write_u8(0xfe).write_bytes(&(n as u32).to_le_bytes()),
            _ => self.write_u8(0xff).write_bytes(&n.to_le_bytes()),
        }
    }

    pub fn write_var_int(&mut self, mut n: u64) -> &mut Self {
        let mut tmp = Vec::with_capacity(10);
        loop {
            let flag = if tmp.is_empty() { 0x00 } else { 0x80 };
            tmp.push((n & 0x7f) as u8 | flag);
            if n <= 0x7f {
                break;
            }
            n = (n >> 7) - 1;
        }
        tmp.reverse();
        self.write_bytes(&tmp)
    }

    pub fn write_var_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_compact_size(bytes.len() as u64).write_bytes(bytes)
    }

    pub fn write_string(&mut self, s: &str) -> &mut Self {
        self.write_var_bytes(s.as_bytes())
    }

    pub fn write_script_hex(&mut self, script_hex: &str) -> Result<&mut Self, DecodeError> {
        let bytes = hex::decode(script_hex).map_err(|e| DecodeError::InvalidHex(e.to_string()))?;
        Ok(self.write_var_bytes(&bytes))
    }
}

// ─── Script op-code stack ─────────────────────────────────────────────────────

/// One element of a decoded script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOp {
    Code(u8),
    Push(Vec<u8>),
}

/// Split script bytes into op-codes and pushed data.
pub fn decode_script(bytes: &[u8]) -> Result<Vec<ScriptOp>, DecodeError> {
    let mut reader = Reader::new(bytes);
    let mut ops = Vec::new();
    while !reader.is_empty() {
        let code = reader.read_u8()?;
        let push_len = match code {
            0x00 => Some(0),
            0x01..=0x4b => Some(code as usize),
            OP_PUSHDATA1 => Some(reader.read_u8()? as usize),
            OP_PUSHDATA2 => Some(reader.read_u16()? as usize),
            OP_PUSHDATA4 => Some(reader.read_u32()? as usize),
            _ => None,
        };
        match push_len {
            Some(len) => ops.push(ScriptOp::Push(reader.read_bytes(len)?.to_vec())),
            None => ops.push(ScriptOp::Code(code)),
        }
    }
    Ok(ops)
}

/// `OP_RETURN <data>` using the smallest push op-code.
pub fn encode_op_return(data: &[u8]) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_u8(OP_RETURN);
    match data.len() {
        0..=0x4b => w.write_u8(data.len() as u8),
        0x4c..=0xff => w.write_u8(OP_PUSHDATA1).write_u8(data.len() as u8),
        0x100..=0xffff => w.write_u8(OP_PUSHDATA2).write_bytes(&(data.len() as u16).to_le_bytes()),
        _ => w.write_u8(OP_PUSHDATA4).write_u32(data.len() as u32),
    };
    w.write_bytes(data);
    w.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_size_boundaries() {
        for n in [0u64, 0xfc, 0xfd, 0xffff, 0x1_0000, 0xffff_ffff, 0x1_0000_0000] {
            let mut w = Writer::new();
            w.write_compact_size(n);
            let bytes = w.into_bytes();
            assert_eq!(Reader::new(&bytes).read_compact_size().unwrap(), n, "n={n}");
        }
    }

    #[test]
    fn var_int_matches_node_encoding() {
        // Known encodings from the node's serialize.h
        let cases: [(u64, &[u8]); 5] = [
            (0, &[0x00]),
            (127, &[0x7f]),
            (128, &[0x80, 0x00]),
            (255, &[0x80, 0x7f]),
            (16511, &[0xff, 0x7f]),
        ];
        for (n, expected) in cases {
            let mut w = Writer::new();
            w.write_var_int(n);
            assert_eq!(w.into_bytes(), expected, "encode {n}");
            assert_eq!(Reader::new(expected).read_var_int().unwrap(), n, "decode {n}");
        }
    }

    #[test]
    fn reader_reports_eof() {
        let mut r = Reader::new(&[0x01, 0x02]);
        assert_eq!(
            r.read_u32().unwrap_err(),
            DecodeError::UnexpectedEof {
                needed: 4,
                remaining: 2
            }
        );
    }

    #[test]
    fn decode_op_return_stack() {
        let script = encode_op_return(b"DfTxs");
        let ops = decode_script(&script).unwrap();
        assert_eq!(ops, vec![ScriptOp::Code(OP_RETURN), ScriptOp::Push(b"DfTxs".to_vec())]);

        let long = vec![0xab; 100];
        let script = encode_op_return(&long);
        assert_eq!(script[1], OP_PUSHDATA1);
        assert_eq!(decode_script(&script).unwrap()[1], ScriptOp::Push(long));
    }

    #[test]
    fn decode_script_rejects_truncated_push() {
        assert!(decode_script(&[OP_RETURN, 0x05, 0x44, 0x66]).is_err());
    }
}
