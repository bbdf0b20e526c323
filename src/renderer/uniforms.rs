//! Uniform Blocks
//!
//! The three fixed-index uniform blocks shared by every shader in the
//! pipeline, laid out byte-exact (std140-equivalent packing) with
//! `bytemuck` so they upload as plain byte slices. Shaders are compiled
//! against these layouts once; they never change at runtime.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::scene::{Light, LightKind};

/// Block 0: per-frame global flags.
pub const VIDEO_BLOCK_BINDING: u32 = 0;
/// Block 1: per-camera matrices and viewport.
pub const CAMERA_BLOCK_BINDING: u32 = 1;
/// Block 2: the active light records.
pub const SCENE_BLOCK_BINDING: u32 = 2;

/// Block 0 "Video", 24 bytes.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct VideoBlock {
    pub ambient: [f32; 4],
    pub ssao: i32,
    pub bloom: i32,
}

/// Block 1 "Camera", 164 bytes.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct CameraBlock {
    pub view: [f32; 16],
    pub projection: [f32; 16],
    pub position: [f32; 4],
    pub viewport: [f32; 4],
    pub image_based_lighting: i32,
}

/// One per active light in block 2 "Scene", 144 bytes.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct LightRecord {
    pub id: i32,
    pub kind: i32,
    pub cast_shadows: i32,
    pub shadow_map_id: u32,
    pub color: [f32; 4],
    pub position: [f32; 4],
    pub direction: [f32; 4],
    pub range: f32,
    pub cut_off: f32,
    pub outer_cut_off: f32,
    pub far_plane: f32,
    pub matrix: [f32; 16],
}

/// Builds the records for the first `max_lights` list entries. Shadow-map
/// ids 0..`max_shadows` go to shadow-casting lights in list order; lights
/// past the cap get id 0 and render unshadowed. Color is premultiplied by
/// intensity; the light-space matrix is identity for point lights.
#[must_use]
pub fn build_light_records(
    lights: &[Light],
    max_lights: usize,
    max_shadows: usize,
) -> Vec<LightRecord> {
    let mut records = Vec::new();
    let mut shadow_map_id = 0u32;
    for (index, light) in lights.iter().take(max_lights).enumerate() {
        if !light.enable {
            continue;
        }
        let shadowed = light.cast_shadows && (shadow_map_id as usize) < max_shadows;
        let record = LightRecord {
            id: index as i32,
            kind: light.kind as i32,
            cast_shadows: i32::from(light.cast_shadows),
            shadow_map_id: if shadowed { shadow_map_id } else { 0 },
            color: (light.color * light.intensity).to_array(),
            position: light.position.extend(0.0).to_array(),
            direction: light.direction.extend(0.0).to_array(),
            range: light.range,
            cut_off: light.cut_off,
            outer_cut_off: light.outer_cut_off,
            far_plane: light.far_plane,
            matrix: if light.kind == LightKind::Point {
                Mat4::IDENTITY.to_cols_array()
            } else {
                light.light_matrix().to_cols_array()
            },
        };
        if shadowed {
            shadow_map_id += 1;
        }
        records.push(record);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn block_layouts_are_byte_exact() {
        assert_eq!(std::mem::size_of::<VideoBlock>(), 24);
        assert_eq!(std::mem::size_of::<CameraBlock>(), 164);
        assert_eq!(std::mem::size_of::<LightRecord>(), 144);
    }

    #[test]
    fn shadow_ids_are_sequential_in_list_order() {
        let mut lights: Vec<Light> = (0..6)
            .map(|_| {
                let mut light = Light::new(LightKind::Spot);
                light.cast_shadows = true;
                light
            })
            .collect();
        lights[2].cast_shadows = false;

        let records = build_light_records(&lights, 8, 4);
        assert_eq!(records.len(), 6);
        let ids: Vec<u32> = records.iter().map(|r| r.shadow_map_id).collect();
        // light 2 casts none; lights past the 4-map cap fall back to id 0
        assert_eq!(ids, vec![0, 1, 0, 2, 3, 0]);
        assert_eq!(records[2].cast_shadows, 0);
    }

    #[test]
    fn disabled_lights_produce_no_record_but_keep_their_index() {
        let mut lights: Vec<Light> = (0..3).map(|_| Light::new(LightKind::Point)).collect();
        lights[1].enable = false;

        let records = build_light_records(&lights, 4, 4);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 0);
        assert_eq!(records[1].id, 2);
    }

    #[test]
    fn color_is_premultiplied_by_intensity() {
        let mut light = Light::new(LightKind::Directional);
        light.color = Vec4::new(1.0, 0.5, 0.25, 1.0);
        light.intensity = 2.0;

        let records = build_light_records(std::slice::from_ref(&light), 4, 4);
        assert_eq!(records[0].color, [2.0, 1.0, 0.5, 2.0]);
    }
}
