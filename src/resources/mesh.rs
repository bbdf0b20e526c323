use crate::device::{DrawMode, GraphicsDevice, VertexArrayId};

/// A mesh handle: vertex array with its buffer bindings, counts and the
/// primitive mode. An `index_count` of zero means non-indexed drawing.
#[derive(Clone, Copy, Debug)]
pub struct Mesh {
    pub vertex_array: VertexArrayId,
    pub vertex_count: i32,
    pub index_count: i32,
    pub mode: DrawMode,
}

impl Mesh {
    #[must_use]
    pub fn new(vertex_array: VertexArrayId, vertex_count: i32, index_count: i32) -> Self {
        Self {
            vertex_array,
            vertex_count,
            index_count,
            mode: DrawMode::Triangles,
        }
    }

    pub fn draw<D: GraphicsDevice>(&self, device: &mut D) {
        device.bind_vertex_array(Some(self.vertex_array));
        if self.index_count > 0 {
            device.draw_elements(self.mode, self.index_count);
        } else {
            device.draw_arrays(self.mode, 0, self.vertex_count);
        }
        device.bind_vertex_array(None);
    }

    pub fn draw_instanced<D: GraphicsDevice>(&self, device: &mut D, instances: i32) {
        device.bind_vertex_array(Some(self.vertex_array));
        if self.index_count > 0 {
            device.draw_elements_instanced(self.mode, self.index_count, instances);
        } else {
            device.draw_arrays_instanced(self.mode, 0, self.vertex_count, instances);
        }
        device.bind_vertex_array(None);
    }
}
