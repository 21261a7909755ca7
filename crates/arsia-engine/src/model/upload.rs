//! Host-side preparation of vertex data for GPU upload.

use std::fmt;

/// Components per vertex position: `(x, y, z)`.
pub const POSITION_COMPONENTS: usize = 3;

/// Errors raised while preparing or uploading vertex data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelError {
    /// No vertex data was supplied.
    Empty,
    /// The float count is not a whole number of `(x, y, z)` triples.
    NotTriples { len: usize },
    /// Vertex count does not fit the draw call range.
    TooLarge { len: usize },
    /// The loader has issued every possible id.
    IdsExhausted,
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("vertex data is empty"),
            Self::NotTriples { len } => write!(
                f,
                "vertex data has {len} floats, expected a multiple of {POSITION_COMPONENTS}"
            ),
            Self::TooLarge { len } => write!(f, "vertex data has too many floats ({len})"),
            Self::IdsExhausted => f.write_str("model id space exhausted"),
        }
    }
}

impl std::error::Error for ModelError {}

/// Copies `data` into a tightly packed, native-endian byte buffer ready to be
/// written to a GPU buffer.
pub fn floats_to_upload_bytes(data: &[f32]) -> Vec<u8> {
    bytemuck::cast_slice::<f32, u8>(data).to_vec()
}

/// Number of vertices described by a flat `(x, y, z)` position list.
pub fn vertex_count(positions: &[f32]) -> Result<u32, ModelError> {
    let len = positions.len();
    if len == 0 {
        return Err(ModelError::Empty);
    }
    if len % POSITION_COMPONENTS != 0 {
        return Err(ModelError::NotTriples { len });
    }
    u32::try_from(len / POSITION_COMPONENTS).map_err(|_| ModelError::TooLarge { len })
}
