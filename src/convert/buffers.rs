//! Buffer payload resolution.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use base64::Engine;

use crate::document::Document;

use super::error::ConvertError;

/// Decodes buffer payloads and serves byte ranges out of them.
///
/// A buffer's payload is decoded at most once per update cycle; every
/// region request after the first slices the cached bytes. The cache is
/// cleared when a new update begins so edited documents are re-decoded.
pub struct BufferCache {
    base_dir: Option<PathBuf>,
    decoded: HashMap<String, Vec<u8>>,
}

impl BufferCache {
    /// Create a cache. `base_dir` anchors relative external-file URIs.
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self {
            base_dir,
            decoded: HashMap::new(),
        }
    }

    /// Directory anchoring relative external-file URIs, if any.
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Drop all decoded payloads. Called at the start of each update.
    pub fn clear(&mut self) {
        self.decoded.clear();
    }

    /// Resolve a byte range of a buffer, decoding its payload on first
    /// access.
    pub fn resolve(
        &mut self,
        document: &Document,
        buffer_id: &str,
        byte_offset: usize,
        byte_length: usize,
    ) -> Result<&[u8], ConvertError> {
        if !self.decoded.contains_key(buffer_id) {
            let data = self.decode(document, buffer_id)?;
            self.decoded.insert(buffer_id.to_string(), data);
        }
        let data = &self.decoded[buffer_id];
        let end = byte_offset + byte_length;
        if end > data.len() {
            return Err(ConvertError::BufferRange {
                buffer: buffer_id.to_string(),
                end,
                len: data.len(),
            });
        }
        Ok(&data[byte_offset..end])
    }

    fn decode(&self, document: &Document, buffer_id: &str) -> Result<Vec<u8>, ConvertError> {
        let buffer = document
            .buffers
            .get(buffer_id)
            .ok_or_else(|| ConvertError::Decode(format!("unknown buffer '{buffer_id}'")))?;
        let uri = buffer
            .uri
            .as_deref()
            .ok_or_else(|| ConvertError::Decode(format!("buffer '{buffer_id}' has no uri")))?;
        if let Some(encoded) = uri.strip_prefix("data:") {
            let payload = encoded
                .split_once(',')
                .map(|(_, tail)| tail)
                .ok_or_else(|| {
                    ConvertError::Decode(format!("buffer '{buffer_id}' has a malformed data uri"))
                })?;
            return base64::engine::general_purpose::STANDARD
                .decode(payload)
                .map_err(|e| {
                    ConvertError::Decode(format!("buffer '{buffer_id}' base64 decode: {e}"))
                });
        }
        let path = match &self.base_dir {
            Some(dir) => dir.join(uri),
            None => PathBuf::from(uri),
        };
        Ok(std::fs::read(path)?)
    }
}
