//! Turning raw downloaded bytes into cacheable values.

use crate::{KartError, Result};
use image::RgbaImage;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// Decodes raw resource bytes into the value the cache stores.
pub trait ResourceDecoder: Send + Sync + 'static {
    type Output: Send + Sync + 'static;

    /// Decode `bytes` fetched for `name`.
    fn decode(&self, name: &str, bytes: &[u8]) -> Result<Self::Output>;

    /// Payload size charged against the memory budget.
    fn payload_size(&self, _value: &Self::Output, raw: &[u8]) -> u64 {
        raw.len() as u64
    }
}

/// Decodes PNG, WebP and JPEG images to RGBA8 pixels.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageDecoder;

impl ResourceDecoder for ImageDecoder {
    type Output = RgbaImage;

    fn decode(&self, name: &str, bytes: &[u8]) -> Result<RgbaImage> {
        let image = image::load_from_memory(bytes).map_err(|e| KartError::decode(name, e))?;
        Ok(image.to_rgba8())
    }

    /// Decoded images are charged by their pixel buffer, not the compressed
    /// download.
    fn payload_size(&self, value: &RgbaImage, _raw: &[u8]) -> u64 {
        value.as_raw().len() as u64
    }
}

/// Decodes a JSON document into `T`.
#[derive(Debug)]
pub struct JsonDecoder<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDecoder<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResourceDecoder for JsonDecoder<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    type Output = T;

    fn decode(&self, name: &str, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| KartError::decode(name, e))
    }
}
