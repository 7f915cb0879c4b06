//! Wasm module section assembly.
//!
//! Collects per-entry encodings for every section and serializes them in
//! the binary format's required order: header, type, import, function,
//! table, memory, tag, global, export, element, data-count, the optional
//! branch-hint custom section, code, data. Every section body is
//! ULEB128-length-prefixed; empty sections are omitted entirely.

use crate::wasm::leb;

const WASM_MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6D];
const WASM_VERSION: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

pub const SECTION_CUSTOM: u8 = 0;
pub const SECTION_TYPE: u8 = 1;
pub const SECTION_IMPORT: u8 = 2;
pub const SECTION_FUNCTION: u8 = 3;
pub const SECTION_TABLE: u8 = 4;
pub const SECTION_MEMORY: u8 = 5;
pub const SECTION_GLOBAL: u8 = 6;
pub const SECTION_EXPORT: u8 = 7;
pub const SECTION_ELEMENT: u8 = 9;
pub const SECTION_CODE: u8 = 10;
pub const SECTION_DATA: u8 = 11;
pub const SECTION_DATA_COUNT: u8 = 12;
pub const SECTION_TAG: u8 = 13;

/// Name of the branch-hint custom section, fixed by the proposal.
pub const BRANCH_HINT_SECTION_NAME: &str = "metadata.code.branch_hint";

/// Accumulates section entries and assembles the final byte stream.
#[derive(Debug, Default)]
pub struct ModuleBuilder {
    types: Vec<Vec<u8>>,
    imports: Vec<Vec<u8>>,
    /// Type indices of defined functions, in order.
    functions: Vec<u32>,
    tables: Vec<Vec<u8>>,
    memories: Vec<Vec<u8>>,
    tags: Vec<Vec<u8>>,
    globals: Vec<Vec<u8>>,
    exports: Vec<Vec<u8>>,
    elements: Vec<Vec<u8>>,
    /// Complete size-prefixed function bodies.
    code: Vec<Vec<u8>>,
    data: Vec<Vec<u8>>,
    /// Payload of the branch-hint custom section, absent when no function
    /// recorded hints.
    branch_hints: Option<Vec<u8>>,
}

impl ModuleBuilder {
    pub fn new() -> ModuleBuilder {
        ModuleBuilder::default()
    }

    /// Adds one type-section entry: a whole recursion group or a standalone
    /// signature.
    pub fn add_type_entry(&mut self, entry: Vec<u8>) {
        self.types.push(entry);
    }

    pub fn add_import(&mut self, entry: Vec<u8>) {
        self.imports.push(entry);
    }

    pub fn add_function(&mut self, type_index: u32) {
        self.functions.push(type_index);
    }

    pub fn add_table(&mut self, entry: Vec<u8>) {
        self.tables.push(entry);
    }

    pub fn add_memory(&mut self, entry: Vec<u8>) {
        self.memories.push(entry);
    }

    pub fn add_tag(&mut self, entry: Vec<u8>) {
        self.tags.push(entry);
    }

    pub fn add_global(&mut self, entry: Vec<u8>) {
        self.globals.push(entry);
    }

    pub fn add_export(&mut self, name: &str, kind: u8, index: u32) {
        let mut entry = Vec::new();
        encode_name(&mut entry, name);
        entry.push(kind);
        leb::encode_u32(&mut entry, index);
        self.exports.push(entry);
    }

    pub fn add_element_segment(&mut self, entry: Vec<u8>) {
        self.elements.push(entry);
    }

    pub fn add_code_entry(&mut self, body: Vec<u8>) {
        let mut entry = Vec::new();
        leb::encode_usize(&mut entry, body.len());
        entry.extend_from_slice(&body);
        self.code.push(entry);
    }

    pub fn add_data_segment(&mut self, bytes: &[u8]) {
        // Passive form: flag byte then the raw contents.
        let mut entry = vec![0x01];
        leb::encode_usize(&mut entry, bytes.len());
        entry.extend_from_slice(bytes);
        self.data.push(entry);
    }

    pub fn set_branch_hints(&mut self, payload: Vec<u8>) {
        self.branch_hints = Some(payload);
    }

    pub fn data_segment_count(&self) -> usize {
        self.data.len()
    }

    /// Serializes the module.
    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&WASM_MAGIC);
        out.extend_from_slice(&WASM_VERSION);

        emit_vector_section(&mut out, SECTION_TYPE, &self.types);
        emit_vector_section(&mut out, SECTION_IMPORT, &self.imports);

        if !self.functions.is_empty() {
            let mut body = Vec::new();
            leb::encode_usize(&mut body, self.functions.len());
            for type_index in &self.functions {
                leb::encode_u32(&mut body, *type_index);
            }
            emit_section(&mut out, SECTION_FUNCTION, &body);
        }

        emit_vector_section(&mut out, SECTION_TABLE, &self.tables);
        emit_vector_section(&mut out, SECTION_MEMORY, &self.memories);
        emit_vector_section(&mut out, SECTION_TAG, &self.tags);
        emit_vector_section(&mut out, SECTION_GLOBAL, &self.globals);
        emit_vector_section(&mut out, SECTION_EXPORT, &self.exports);
        emit_vector_section(&mut out, SECTION_ELEMENT, &self.elements);

        if !self.data.is_empty() {
            let mut body = Vec::new();
            leb::encode_usize(&mut body, self.data.len());
            emit_section(&mut out, SECTION_DATA_COUNT, &body);
        }

        if let Some(payload) = &self.branch_hints {
            let mut body = Vec::new();
            encode_name(&mut body, BRANCH_HINT_SECTION_NAME);
            body.extend_from_slice(payload);
            emit_section(&mut out, SECTION_CUSTOM, &body);
        }

        emit_vector_section(&mut out, SECTION_CODE, &self.code);
        emit_vector_section(&mut out, SECTION_DATA, &self.data);

        out
    }
}

pub fn encode_name(out: &mut Vec<u8>, name: &str) {
    leb::encode_usize(out, name.len());
    out.extend_from_slice(name.as_bytes());
}

fn emit_section(out: &mut Vec<u8>, id: u8, body: &[u8]) {
    out.push(id);
    leb::encode_usize(out, body.len());
    out.extend_from_slice(body);
}

fn emit_vector_section(out: &mut Vec<u8>, id: u8, entries: &[Vec<u8>]) {
    if entries.is_empty() {
        return;
    }
    let mut body = Vec::new();
    leb::encode_usize(&mut body, entries.len());
    for entry in entries {
        body.extend_from_slice(entry);
    }
    emit_section(out, id, &body);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_module_is_just_the_header() {
        let bytes = ModuleBuilder::new().finish();
        assert_eq!(bytes, vec![0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn sections_are_emitted_in_binary_order() {
        let mut builder = ModuleBuilder::new();
        builder.add_type_entry(vec![0x60, 0x00, 0x00]);
        builder.add_function(0);
        builder.add_code_entry(vec![0x00, 0x0B]);
        builder.add_data_segment(&[1, 2, 3]);

        let bytes = builder.finish();
        let ids: Vec<u8> = section_ids(&bytes);
        assert_eq!(
            ids,
            vec![SECTION_TYPE, SECTION_FUNCTION, SECTION_DATA_COUNT, SECTION_CODE, SECTION_DATA]
        );
    }

    #[test]
    fn branch_hint_section_sits_before_code() {
        let mut builder = ModuleBuilder::new();
        builder.add_type_entry(vec![0x60, 0x00, 0x00]);
        builder.add_function(0);
        builder.set_branch_hints(vec![0x00]);
        builder.add_code_entry(vec![0x00, 0x0B]);

        let bytes = builder.finish();
        let ids = section_ids(&bytes);
        assert_eq!(
            ids,
            vec![SECTION_TYPE, SECTION_FUNCTION, SECTION_CUSTOM, SECTION_CODE]
        );

        // The custom section payload starts with the fixed name.
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains(BRANCH_HINT_SECTION_NAME));
    }

    fn section_ids(bytes: &[u8]) -> Vec<u8> {
        let mut ids = Vec::new();
        let mut offset = 8;
        while offset < bytes.len() {
            ids.push(bytes[offset]);
            let (size, consumed) = crate::wasm::leb::decode_u64(&bytes[offset + 1..]).unwrap();
            offset += 1 + consumed + size as usize;
        }
        ids
    }
}
