use crate::device::{GraphicsDevice, TextureId, TextureTarget};

/// A GPU texture handle plus its bind target.
#[derive(Clone, Copy, Debug)]
pub struct Texture {
    pub id: TextureId,
    pub target: TextureTarget,
}

impl Texture {
    #[must_use]
    pub fn new(id: TextureId, target: TextureTarget) -> Self {
        Self { id, target }
    }

    pub fn bind<D: GraphicsDevice>(&self, device: &mut D, unit: u32) {
        device.bind_texture(unit, self.target, Some(self.id));
    }
}
