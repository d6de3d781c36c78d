//! Flat option bundle shared by every frame source
//!
//! Options arrive from several layers (manifest metadata, launch extras,
//! saved instance state) and are merged into one flat key → value map.
//! Later layers override earlier ones.

use crate::error::TexFrameError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Recognized option keys
pub mod keys {
    /// `bool`: FRONT when true, BACK when false, ANY when absent
    pub const CAMERA_FACING_FRONT: &str = "cameraFacingFront";
    /// `int`: number of textures in the conversion buffer pool
    pub const CONVERTER_NUM_BUFFERS: &str = "converterNumBuffers";
    /// `string`: file URI played by the file-backed source
    pub const MEDIA_FILE: &str = "mediaFile";
    /// `bool`: loop file playback
    pub const MEDIA_LOOP: &str = "mediaLoop";
    /// `bool`: flip frames vertically on display
    pub const FLIP_FRAMES_VERTICALLY: &str = "flipFramesVertically";
    /// `string`: which frame source variant to build
    pub const TEXTURE_FRAME_SOURCE: &str = "textureFrameSource";
}

/// A single option value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Boolean flag
    Bool(bool),
    /// Integer value
    Int(i64),
    /// String value
    Str(String),
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(value as i64)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Str(value)
    }
}

/// Flat mapping of named options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options {
    values: BTreeMap<String, OptionValue>,
}

impl Options {
    /// Create an empty bundle
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of options
    pub fn from_json_str(json: &str) -> Result<Self, TexFrameError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Merge optional layers in order; later layers win
    pub fn merged<'a>(layers: impl IntoIterator<Item = Option<&'a Options>>) -> Self {
        let mut options = Options::new();
        for layer in layers.into_iter().flatten() {
            options.put_all(layer);
        }
        options
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: impl Into<OptionValue>) -> Self {
        self.put(key, value);
        self
    }

    /// Insert or replace a value
    pub fn put(&mut self, key: &str, value: impl Into<OptionValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Copy every entry of `other` into this bundle
    pub fn put_all(&mut self, other: &Options) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Whether the key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Raw value lookup
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    /// Boolean lookup; `None` when absent or not a bool
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.values.get(key) {
            Some(OptionValue::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    /// Boolean lookup with a default
    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    /// Integer lookup; `None` when absent or not an int
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.values.get(key) {
            Some(OptionValue::Int(value)) => Some(*value),
            _ => None,
        }
    }

    /// String lookup; `None` when absent or not a string
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(OptionValue::Str(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the bundle is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
