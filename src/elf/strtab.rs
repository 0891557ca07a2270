/// Section-name string table.
///
/// Offset 0 is the leading empty string and means "no name". Names are
/// appended NUL-terminated. A name already present anywhere in the buffer,
/// including as the tail of a longer name, reuses that offset.
#[derive(Debug, Clone)]
pub struct NameTable {
    data: Vec<u8>,
}

impl NameTable {
    pub fn new() -> Self {
        NameTable { data: vec![0] }
    }

    pub fn offset_of(&self, name: &str) -> Option<u32> {
        let needle: Vec<u8> = name.bytes().chain([0]).collect();
        self.data
            .windows(needle.len())
            .position(|window| window == needle.as_slice())
            .map(|offset| offset as u32)
    }

    pub fn get_or_add(&mut self, name: &str) -> u32 {
        if let Some(offset) = self.offset_of(name) {
            return offset;
        }
        let offset = self.data.len() as u32;
        self.data.extend(name.as_bytes());
        self.data.push(0);
        offset
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl Default for NameTable {
    fn default() -> Self {
        NameTable::new()
    }
}
