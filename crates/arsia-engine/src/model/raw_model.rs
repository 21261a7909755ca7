use std::fmt;
use std::num::NonZeroU32;

/// Opaque identifier of a vertex buffer owned by a [`ModelLoader`].
///
/// Ids are never zero and never reused by the loader that issued them.
///
/// [`ModelLoader`]: super::ModelLoader
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ModelId(NonZeroU32);

impl ModelId {
    pub(crate) fn new(raw: NonZeroU32) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A model resident on the GPU: the buffer id plus how many vertices to draw.
///
/// Attribute slot 0 of the buffer holds `(x, y, z)` positions.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RawModel {
    id: ModelId,
    vertex_count: u32,
}

impl RawModel {
    pub fn new(id: ModelId, vertex_count: u32) -> Self {
        Self { id, vertex_count }
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}
