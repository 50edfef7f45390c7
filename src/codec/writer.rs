use byteorder::{ByteOrder, LittleEndian};

/// Little-endian byte sink used by the lot pack and header encoders
pub struct BinaryWriter {
    data: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { data: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    pub fn write_i32_le(&mut self, v: i32) {
        let mut buf = [0u8; 4];
        LittleEndian::write_i32(&mut buf, v);
        self.write_bytes(&buf);
    }

    pub fn write_u32_le(&mut self, v: u32) {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, v);
        self.write_bytes(&buf);
    }

    pub fn write_i64_le(&mut self, v: i64) {
        let mut buf = [0u8; 8];
        LittleEndian::write_i64(&mut buf, v);
        self.write_bytes(&buf);
    }

    /// Overwrite 8 bytes at `pos` (used to back-patch offset tables).
    pub fn patch_i64_le(&mut self, pos: usize, v: i64) {
        LittleEndian::write_i64(&mut self.data[pos..pos + 8], v);
    }

    /// Write a `\n`-terminated line.
    pub fn write_line(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
        self.write_u8(b'\n');
    }
}

impl Default for BinaryWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BinaryWriter> for Vec<u8> {
    fn from(writer: BinaryWriter) -> Self {
        writer.into_vec()
    }
}
