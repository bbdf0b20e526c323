//! Pipeline State Cache
//!
//! [`PipelineState`] owns the graphics device and filters redundant state
//! changes: each setter compares the requested value against the cached
//! snapshot and only reaches the device on a difference. Fields start out
//! unknown, so the first call on every axis always issues.
//!
//! [`reset`](PipelineState::reset) applies one canonical baseline (tests
//! enabled, standard depth/stencil functions, opaque blend, back-face
//! culling). The renderer invokes it at pipeline initialization, after each
//! renderable draw and at the start of the post-process stage, which bounds
//! how far per-material state can drift between passes.

use glam::Vec4;

use super::{
    BlendEquation, BlendFactor, CompareFunc, CullSide, GraphicsDevice, StencilOp, Winding,
};

/// Record of the last state values actually issued to the device.
#[derive(Clone, Default, Debug)]
struct Snapshot {
    color_mask: Option<bool>,
    depth_test: Option<bool>,
    depth_func: Option<CompareFunc>,
    depth_mask: Option<bool>,
    stencil_test: Option<bool>,
    stencil_func: Option<(CompareFunc, i32, u32)>,
    stencil_op: Option<(StencilOp, StencilOp, StencilOp)>,
    stencil_mask: Option<u32>,
    blend: Option<bool>,
    blend_func: Option<(BlendFactor, BlendFactor)>,
    blend_equation: Option<BlendEquation>,
    blend_color: Option<Vec4>,
    face_cull: Option<bool>,
    face_side: Option<CullSide>,
    face_winding: Option<Winding>,
}

/// The graphics device wrapped in a redundant-state filter.
pub struct PipelineState<D: GraphicsDevice> {
    device: D,
    snapshot: Snapshot,
}

impl<D: GraphicsDevice> PipelineState<D> {
    /// Wraps `device` with an empty snapshot; call
    /// [`reset`](Self::reset) afterwards to establish the baseline.
    pub fn new(device: D) -> Self {
        Self {
            device,
            snapshot: Snapshot::default(),
        }
    }

    /// Direct device access for non-cached operations (binds, draws,
    /// resource management). State setters issued through the device
    /// bypass the snapshot.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Read-only device access.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Consumes the cache and returns the device.
    pub fn into_device(self) -> D {
        self.device
    }

    pub fn set_color_mask(&mut self, mask: bool) {
        if self.snapshot.color_mask != Some(mask) {
            self.snapshot.color_mask = Some(mask);
            self.device.set_color_mask(mask);
        }
    }

    pub fn set_depth_test(&mut self, enable: bool) {
        if self.snapshot.depth_test != Some(enable) {
            self.snapshot.depth_test = Some(enable);
            self.device.set_depth_test(enable);
        }
    }

    pub fn set_depth_func(&mut self, func: CompareFunc) {
        if self.snapshot.depth_func != Some(func) {
            self.snapshot.depth_func = Some(func);
            self.device.set_depth_func(func);
        }
    }

    pub fn set_depth_mask(&mut self, mask: bool) {
        if self.snapshot.depth_mask != Some(mask) {
            self.snapshot.depth_mask = Some(mask);
            self.device.set_depth_mask(mask);
        }
    }

    pub fn set_stencil_test(&mut self, enable: bool) {
        if self.snapshot.stencil_test != Some(enable) {
            self.snapshot.stencil_test = Some(enable);
            self.device.set_stencil_test(enable);
        }
    }

    pub fn set_stencil_func(&mut self, func: CompareFunc, reference: i32, mask: u32) {
        if self.snapshot.stencil_func != Some((func, reference, mask)) {
            self.snapshot.stencil_func = Some((func, reference, mask));
            self.device.set_stencil_func(func, reference, mask);
        }
    }

    pub fn set_stencil_op(&mut self, fail: StencilOp, zfail: StencilOp, zpass: StencilOp) {
        if self.snapshot.stencil_op != Some((fail, zfail, zpass)) {
            self.snapshot.stencil_op = Some((fail, zfail, zpass));
            self.device.set_stencil_op(fail, zfail, zpass);
        }
    }

    pub fn set_stencil_mask(&mut self, mask: u32) {
        if self.snapshot.stencil_mask != Some(mask) {
            self.snapshot.stencil_mask = Some(mask);
            self.device.set_stencil_mask(mask);
        }
    }

    pub fn set_blend(&mut self, enable: bool) {
        if self.snapshot.blend != Some(enable) {
            self.snapshot.blend = Some(enable);
            self.device.set_blend(enable);
        }
    }

    pub fn set_blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        if self.snapshot.blend_func != Some((src, dst)) {
            self.snapshot.blend_func = Some((src, dst));
            self.device.set_blend_func(src, dst);
        }
    }

    pub fn set_blend_equation(&mut self, equation: BlendEquation) {
        if self.snapshot.blend_equation != Some(equation) {
            self.snapshot.blend_equation = Some(equation);
            self.device.set_blend_equation(equation);
        }
    }

    pub fn set_blend_color(&mut self, color: Vec4) {
        if self.snapshot.blend_color != Some(color) {
            self.snapshot.blend_color = Some(color);
            self.device.set_blend_color(color);
        }
    }

    pub fn set_face_cull(&mut self, enable: bool) {
        if self.snapshot.face_cull != Some(enable) {
            self.snapshot.face_cull = Some(enable);
            self.device.set_face_cull(enable);
        }
    }

    pub fn set_face_side(&mut self, side: CullSide) {
        if self.snapshot.face_side != Some(side) {
            self.snapshot.face_side = Some(side);
            self.device.set_face_side(side);
        }
    }

    pub fn set_face_winding(&mut self, winding: Winding) {
        if self.snapshot.face_winding != Some(winding) {
            self.snapshot.face_winding = Some(winding);
            self.device.set_face_winding(winding);
        }
    }

    /// Applies the canonical state baseline.
    pub fn reset(&mut self) {
        self.set_color_mask(true);

        self.set_depth_test(true);
        self.set_depth_func(CompareFunc::Less);
        self.set_depth_mask(true);

        self.set_stencil_test(true);
        self.set_stencil_func(CompareFunc::Always, 1, 0xFF);
        self.set_stencil_op(StencilOp::Keep, StencilOp::Keep, StencilOp::Replace);
        self.set_stencil_mask(0xFF);

        self.set_blend(true);
        self.set_blend_func(BlendFactor::One, BlendFactor::Zero);
        self.set_blend_equation(BlendEquation::Add);
        self.set_blend_color(Vec4::ONE);

        self.set_face_cull(true);
        self.set_face_side(CullSide::Back);
        self.set_face_winding(Winding::CounterClockwise);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::TraceDevice;

    fn state() -> PipelineState<TraceDevice> {
        PipelineState::new(TraceDevice::new())
    }

    #[test]
    fn repeated_values_issue_once() {
        let mut state = state();
        state.set_depth_test(true);
        state.set_depth_test(true);
        state.set_depth_test(true);
        assert_eq!(state.device().state_changes(), 1);
    }

    #[test]
    fn distinct_consecutive_values_all_issue() {
        let mut state = state();
        state.set_face_side(CullSide::Front);
        state.set_face_side(CullSide::Back);
        state.set_face_side(CullSide::Front);
        assert_eq!(state.device().state_changes(), 3);
    }

    #[test]
    fn compound_setter_compares_all_fields() {
        let mut state = state();
        state.set_stencil_func(CompareFunc::Always, 1, 0xFF);
        state.set_stencil_func(CompareFunc::Always, 1, 0xFF);
        state.set_stencil_func(CompareFunc::Always, 2, 0xFF);
        assert_eq!(state.device().state_changes(), 2);
    }

    #[test]
    fn second_reset_is_free() {
        let mut state = state();
        state.reset();
        let after_first = state.device().state_changes();
        state.reset();
        assert_eq!(state.device().state_changes(), after_first);
    }
}
