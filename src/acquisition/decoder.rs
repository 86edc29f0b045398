// src/acquisition/decoder.rs
//! Transport payload decoding

use crate::config::TransportConfig;
use crate::error::{PipelineError, Result};

/// Decodes notification payloads into float sample vectors.
///
/// Payloads carry little-endian i16 fixed-point words; the divisor maps
/// them back onto the device's amplitude range.
pub struct SampleDecoder {
    divisor: f32,
}

impl SampleDecoder {
    /// Create a decoder from transport configuration.
    pub fn new(config: &TransportConfig) -> Self {
        Self {
            divisor: config.fixed_point_divisor,
        }
    }

    /// Decode a raw payload into amplitude values.
    ///
    /// Rejects empty and odd-length payloads; a rejected payload mutates no
    /// pipeline state.
    pub fn decode(&self, payload: &[u8]) -> Result<Vec<f32>> {
        if payload.is_empty() {
            return Err(PipelineError::Decode {
                len: 0,
                reason: "empty payload".to_string(),
            });
        }
        if payload.len() % 2 != 0 {
            return Err(PipelineError::Decode {
                len: payload.len(),
                reason: "odd length, expected whole i16 words".to_string(),
            });
        }

        let values = payload
            .chunks_exact(2)
            .map(|word| i16::from_le_bytes([word[0], word[1]]) as f32 / self.divisor)
            .collect();

        Ok(values)
    }
}
