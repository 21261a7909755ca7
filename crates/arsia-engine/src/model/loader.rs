use std::collections::BTreeMap;
use std::num::NonZeroU32;

use wgpu::util::DeviceExt;

use super::raw_model::{ModelId, RawModel};
use super::upload::{floats_to_upload_bytes, vertex_count, ModelError, POSITION_COMPONENTS};

/// Vertex layout shared by every buffer the loader creates.
pub const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![0 => Float32x3];

/// Returns the vertex buffer layout for loader-created buffers.
pub fn position_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: (POSITION_COMPONENTS * std::mem::size_of::<f32>()) as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &POSITION_ATTRIBUTES,
    }
}

/// Uploads vertex positions to the GPU and owns the resulting buffers.
///
/// Every buffer stays alive until [`delete`](Self::delete) or
/// [`clean_up`](Self::clean_up) is called for it. Call `clean_up` before the
/// device is dropped.
#[derive(Default)]
pub struct ModelLoader {
    buffers: BTreeMap<ModelId, wgpu::Buffer>,
    next_id: u32,
}

impl ModelLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads `positions` (flat `(x, y, z)` triples) into a new static vertex
    /// buffer and returns the model describing it.
    pub fn load_to_vao(
        &mut self,
        device: &wgpu::Device,
        positions: &[f32],
    ) -> Result<RawModel, ModelError> {
        let count = vertex_count(positions)?;
        let id = self.allocate_id()?;

        log::debug!("creating vertex buffer {id} ({count} vertices)");

        let label = format!("arsia model {id}");
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&label),
            contents: &floats_to_upload_bytes(positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        self.buffers.insert(id, buffer);

        log::debug!("created vertex buffer {id}");
        Ok(RawModel::new(id, count))
    }

    /// Returns the buffer for a live id.
    pub fn buffer(&self, id: ModelId) -> Option<&wgpu::Buffer> {
        self.buffers.get(&id)
    }

    /// Destroys a single buffer. Returns `false` if the id is not live.
    pub fn delete(&mut self, id: ModelId) -> bool {
        match self.buffers.remove(&id) {
            Some(buffer) => {
                buffer.destroy();
                true
            }
            None => false,
        }
    }

    /// Destroys every buffer this loader created.
    pub fn clean_up(&mut self) {
        let n = self.buffers.len();
        for (_, buffer) in std::mem::take(&mut self.buffers) {
            buffer.destroy();
        }
        if n > 0 {
            log::debug!("destroyed {n} vertex buffer(s)");
        }
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    fn allocate_id(&mut self) -> Result<ModelId, ModelError> {
        let next = self
            .next_id
            .checked_add(1)
            .ok_or(ModelError::IdsExhausted)?;
        let raw = NonZeroU32::new(next).ok_or(ModelError::IdsExhausted)?;
        self.next_id = next;
        Ok(ModelId::new(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_one_and_increase() {
        let mut loader = ModelLoader::new();
        let a = loader.allocate_id().unwrap();
        let b = loader.allocate_id().unwrap();
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);
    }

    #[test]
    fn delete_unknown_id_is_false() {
        let mut loader = ModelLoader::new();
        let id = loader.allocate_id().unwrap();
        assert!(!loader.delete(id));
        assert!(loader.buffer(id).is_none());
    }

    #[test]
    fn position_layout_is_packed_vec3() {
        let layout = position_layout();
        assert_eq!(layout.array_stride, 12);
        assert_eq!(layout.attributes[0].shader_location, 0);
        assert_eq!(layout.attributes[0].format, wgpu::VertexFormat::Float32x3);
    }

    #[test]
    fn fresh_loader_is_empty() {
        let mut loader = ModelLoader::new();
        assert!(loader.is_empty());
        loader.clean_up();
        assert_eq!(loader.len(), 0);
    }
}
