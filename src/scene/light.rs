//! Lights
//!
//! A [`Light`] carries its shading parameters plus an owned shadow-map
//! render target: a 2D depth map for directional and spot lights, a cube
//! map for point lights. A light whose shadow target failed to build simply
//! casts no shadow; nothing else degrades.

use glam::{Mat4, Vec3, Vec4};
use log::{error, info};

use crate::device::{
    AttachmentFlags, FilterMode, GraphicsDevice, TextureTarget, WrapMode,
};
use crate::renderer::{FrameResource, FrameResourceDesc};

/// Shadow maps are square and fixed-size.
pub const SHADOW_MAP_SIZE: u32 = 1024;

/// Light kind; discriminants match the uniform-block `type` field.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LightKind {
    Directional = 1,
    Point = 2,
    Spot = 3,
}

/// Identity key of a light in the scene registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct LightId(pub u32);

pub struct Light {
    pub enable: bool,
    pub kind: LightKind,
    pub color: Vec4,
    pub intensity: f32,
    pub position: Vec3,
    /// Orientation for directional and spot lights.
    pub direction: Vec3,
    /// Attenuation range for point and spot lights.
    pub range: f32,
    /// Cosine of the inner spot cone angle.
    pub cut_off: f32,
    /// Cosine of the outer spot cone angle.
    pub outer_cut_off: f32,
    pub cast_shadows: bool,
    /// Orthographic shadow frustum (left, right, bottom, top) for
    /// directional lights.
    pub frustum: Vec4,
    pub near_plane: f32,
    pub far_plane: f32,
    shadow: Option<FrameResource>,
    pub(crate) id: LightId,
}

impl Light {
    #[must_use]
    pub fn new(kind: LightKind) -> Self {
        Self {
            enable: true,
            kind,
            color: Vec4::ONE,
            intensity: 1.0,
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            range: 10.0,
            cut_off: 12.5f32.to_radians().cos(),
            outer_cut_off: 17.5f32.to_radians().cos(),
            cast_shadows: false,
            frustum: Vec4::new(-10.0, 10.0, -10.0, 10.0),
            near_plane: 1.0,
            far_plane: 25.0,
            shadow: None,
            id: LightId(0),
        }
    }

    #[must_use]
    pub fn id(&self) -> LightId {
        self.id
    }

    /// Builds the owned shadow target. Failure is logged and leaves the
    /// light shadowless.
    pub fn build_shadow_map<D: GraphicsDevice>(&mut self, device: &mut D) {
        let point = self.kind == LightKind::Point;
        let desc = FrameResourceDesc {
            width: SHADOW_MAP_SIZE,
            height: SHADOW_MAP_SIZE,
            target: if point {
                TextureTarget::CubeMap
            } else {
                TextureTarget::Texture2D
            },
            // border clamp keeps everything outside a 2D map lit
            wrap: if point {
                WrapMode::ClampToEdge
            } else {
                WrapMode::ClampToBorder
            },
            filter: FilterMode::Nearest,
            border_color: Vec4::ONE,
            attachments: AttachmentFlags::DEPTH,
            color_formats: Vec::new(),
        };
        match FrameResource::build(device, &desc) {
            Ok(resource) => self.shadow = Some(resource),
            Err(err) => {
                error!("failed to create light shadow map frame buffer: {err}");
                info!("light {:?}", self.id);
            }
        }
    }

    pub fn release_shadow_map<D: GraphicsDevice>(&mut self, device: &mut D) {
        if let Some(mut shadow) = self.shadow.take() {
            shadow.release(device);
        }
    }

    #[must_use]
    pub fn shadow_map(&self) -> Option<&FrameResource> {
        self.shadow.as_ref()
    }

    /// Light-space view. Directional lights look from the opposite of their
    /// direction toward the origin; point and spot lights from their
    /// position.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        if self.kind == LightKind::Directional {
            Mat4::look_at_rh(-self.direction, Vec3::ZERO, Vec3::Y)
        } else {
            Mat4::look_at_rh(self.position, Vec3::ZERO, Vec3::Y)
        }
    }

    /// Orthographic frustum for directional lights, a 90° perspective over
    /// the shadow map aspect otherwise.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        if self.kind == LightKind::Directional {
            Mat4::orthographic_rh_gl(
                self.frustum.x,
                self.frustum.y,
                self.frustum.z,
                self.frustum.w,
                self.near_plane,
                self.far_plane,
            )
        } else {
            let aspect = self
                .shadow
                .as_ref()
                .map_or(1.0, |s| s.width() as f32 / s.height() as f32);
            Mat4::perspective_rh_gl(90f32.to_radians(), aspect, self.near_plane, self.far_plane)
        }
    }

    /// Combined light-space matrix used by the shadow shaders and the
    /// uniform block; identity for point lights (they use the six
    /// omnidirectional matrices instead).
    #[must_use]
    pub fn light_matrix(&self) -> Mat4 {
        if self.kind == LightKind::Point {
            Mat4::IDENTITY
        } else {
            self.projection_matrix() * self.view_matrix()
        }
    }

    /// Six cube-face view-projections, ordered +X, −X, +Y, −Y, +Z, −Z. The
    /// up vectors avoid a degenerate look-at at the ±Y poles.
    #[must_use]
    pub fn omnidirectional_matrices(&self, projection: Mat4) -> [Mat4; 6] {
        let p = self.position;
        let face = |direction: Vec3, up: Vec3| projection * Mat4::look_at_rh(p, p + direction, up);
        [
            face(Vec3::X, Vec3::NEG_Y),
            face(Vec3::NEG_X, Vec3::NEG_Y),
            face(Vec3::Y, Vec3::Z),
            face(Vec3::NEG_Y, Vec3::NEG_Z),
            face(Vec3::Z, Vec3::NEG_Y),
            face(Vec3::NEG_Z, Vec3::NEG_Y),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPSILON
    }

    #[test]
    fn cube_faces_cover_the_axes_in_order() {
        let mut light = Light::new(LightKind::Point);
        light.position = Vec3::new(1.0, 2.0, 3.0);
        let faces = light.omnidirectional_matrices(Mat4::IDENTITY);
        let directions = [
            Vec3::X,
            Vec3::NEG_X,
            Vec3::Y,
            Vec3::NEG_Y,
            Vec3::Z,
            Vec3::NEG_Z,
        ];
        for (face, direction) in faces.iter().zip(directions) {
            assert!(
                close(face.transform_point3(light.position), Vec3::ZERO),
                "face view must be centered on the light"
            );
            assert!(
                close(face.transform_point3(light.position + direction), Vec3::NEG_Z),
                "face for {direction:?} must look down its own axis"
            );
        }
    }

    #[test]
    fn cube_face_up_vectors_match_the_face_axis() {
        let light = Light::new(LightKind::Point);
        let faces = light.omnidirectional_matrices(Mat4::IDENTITY);
        let ups = [
            Vec3::NEG_Y,
            Vec3::NEG_Y,
            Vec3::Z,
            Vec3::NEG_Z,
            Vec3::NEG_Y,
            Vec3::NEG_Y,
        ];
        for (face, up) in faces.iter().zip(ups) {
            assert!(
                close(face.transform_vector3(up), Vec3::Y),
                "up vector {up:?} must map to view-space +Y"
            );
        }
    }

    #[test]
    fn point_lights_have_an_identity_record_matrix() {
        let light = Light::new(LightKind::Point);
        assert_eq!(light.light_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn directional_view_looks_back_along_the_direction() {
        let mut light = Light::new(LightKind::Directional);
        light.direction = Vec3::NEG_Z;
        let view = light.view_matrix();
        assert!(
            close(view.transform_point3(Vec3::Z), Vec3::ZERO),
            "eye sits opposite the light direction"
        );
        assert!(
            close(view.transform_point3(Vec3::ZERO), Vec3::NEG_Z),
            "the origin lies one unit ahead of the eye"
        );
    }
}
