//! Pipeline Integration Tests
//!
//! Full frames recorded through the trace backend. Tests for:
//! - Forward and deferred frame draw sequences
//! - Shadow pass gating (cap, missing targets, transparent and
//!   shadow-only casters, point-light cube targets)
//! - Transparency ordering (reverse submission)
//! - Skybox state bracketing
//! - Post-process flag gating and the main-camera backbuffer copy
//! - Instanced draws

use std::sync::Arc;

use glam::{IVec4, Mat4, Vec4};

use harrier::device::{Command, CompareFunc, CullSide, FilterMode, VertexArrayId};
use harrier::device::{ClearFlags, TextureDesc, TextureFormat, TextureTarget, WrapMode};
use harrier::{
    Camera, GraphicsDevice, Light, LightKind, Material, MaterialKind, Mesh, PipelineKit,
    PipelineMode, RenderScene, RenderSettings, Renderable, SceneRenderer, Shader, ShadowMode,
    Texture, TraceDevice,
};

const VERTEX_SRC: &str = "#version 330 core\nvoid main() { gl_Position = vec4(0.0); }\n";
const FRAGMENT_SRC: &str = "#version 330 core\nvoid main() {}\n";

fn make_shader(device: &mut TraceDevice, name: &str) -> Arc<Shader> {
    Arc::new(Shader::compile(device, name, VERTEX_SRC, FRAGMENT_SRC, "").unwrap())
}

fn make_material(device: &mut TraceDevice, name: &str, kind: MaterialKind) -> Material {
    let shader = make_shader(device, name);
    Material::new(name, kind, shader)
}

fn make_kit(device: &mut TraceDevice, deferred: bool) -> PipelineKit {
    let brdf_id = device
        .create_texture(&TextureDesc {
            target: TextureTarget::Texture2D,
            format: TextureFormat::Rg16F,
            width: 512,
            height: 512,
            wrap: WrapMode::ClampToEdge,
            filter: FilterMode::Linear,
            border_color: Vec4::ONE,
            data: None,
        })
        .unwrap();
    PipelineKit {
        screen_mesh: Mesh::new(device.create_vertex_array(), 6, 0),
        skybox_mesh: Mesh::new(device.create_vertex_array(), 36, 0),
        shadow_material: make_material(device, "shadow", MaterialKind::Unlit),
        point_shadow_material: make_material(device, "point_shadow", MaterialKind::Unlit),
        deferred_material: deferred.then(|| make_material(device, "deferred", MaterialKind::Unlit)),
        screen_material: make_material(device, "screen", MaterialKind::Unlit),
        ssao_material: make_material(device, "ssao", MaterialKind::Unlit),
        ssao_blur_material: make_material(device, "ssao_blur", MaterialKind::Unlit),
        fxaa_material: make_material(device, "fxaa", MaterialKind::Unlit),
        blur_material: make_material(device, "blur", MaterialKind::Unlit),
        final_material: make_material(device, "final", MaterialKind::Unlit),
        brdf_texture: Texture::new(brdf_id, TextureTarget::Texture2D),
    }
}

struct Rig {
    renderer: SceneRenderer<TraceDevice>,
    scene: RenderScene,
    screen_va: VertexArrayId,
}

fn make_rig(settings: RenderSettings) -> Rig {
    let mut device = TraceDevice::new();
    let kit = make_kit(&mut device, settings.mode == PipelineMode::Deferred);
    let screen_va = kit.screen_mesh.vertex_array;
    let renderer = SceneRenderer::new(device, settings, kit).unwrap();
    Rig {
        renderer,
        scene: RenderScene::new(),
        screen_va,
    }
}

impl Rig {
    fn add_camera(&mut self) {
        let camera = Camera::new(Vec4::ZERO, IVec4::new(0, 0, 1280, 720));
        self.renderer.activate_camera(&mut self.scene, camera);
    }

    fn add_shadow_light(&mut self) {
        let mut light = Light::new(LightKind::Directional);
        light.cast_shadows = true;
        self.renderer.activate_light(&mut self.scene, light);
    }

    fn add_object(&mut self, kind: MaterialKind) -> VertexArrayId {
        let va = self.renderer.device_mut().create_vertex_array();
        let material = make_material(self.renderer.device_mut(), "object", kind);
        self.renderer
            .activate_renderable(&mut self.scene, Renderable::new(Mesh::new(va, 36, 0), material));
        va
    }

    /// Renders one frame over a clean command log.
    fn render_frame(&mut self) {
        self.renderer.device_mut().clear_commands();
        self.renderer.render(&mut self.scene);
    }

    fn commands(&mut self) -> Vec<Command> {
        self.renderer.device_mut().commands().to_vec()
    }
}

// ============================================================================
// Forward frames
// ============================================================================

#[test]
fn forward_frame_draw_sequence() {
    let mut rig = make_rig(RenderSettings::new(1280, 720, PipelineMode::Forward));
    rig.add_camera();
    rig.add_shadow_light();
    let object = rig.add_object(MaterialKind::Lit);

    rig.render_frame();

    // shadow map, opaque, then screen/final/backbuffer quads
    let order = rig.renderer.device_mut().draw_order();
    let expected: Vec<_> = [object, object, rig.screen_va, rig.screen_va, rig.screen_va]
        .into_iter()
        .map(Some)
        .collect();
    assert_eq!(order, expected);
    assert_eq!(rig.renderer.device_mut().blit_count(), 0);
}

#[test]
fn transparent_objects_draw_in_reverse_submission_order() {
    let mut rig = make_rig(RenderSettings::new(1280, 720, PipelineMode::Forward));
    rig.add_camera();
    let first = rig.add_object(MaterialKind::Transparent);
    let second = rig.add_object(MaterialKind::Transparent);

    rig.render_frame();

    let order = rig.renderer.device_mut().draw_order();
    // no shadow draws: transparent objects never render into shadow maps
    let expected: Vec<_> = [second, first, rig.screen_va, rig.screen_va, rig.screen_va]
        .into_iter()
        .map(Some)
        .collect();
    assert_eq!(order, expected);
}

#[test]
fn instanced_renderable_issues_one_instanced_draw() {
    let mut rig = make_rig(RenderSettings::new(1280, 720, PipelineMode::Forward));
    rig.add_camera();
    rig.add_object(MaterialKind::Unlit);
    let id = rig.scene.renderables()[0].id();
    rig.scene.renderable_mut(id).unwrap().instances = vec![Mat4::IDENTITY; 8];

    rig.render_frame();

    let instanced = rig.commands().iter().any(|c| {
        matches!(c, Command::Draw { instances, .. } if *instances == 8)
    });
    assert!(instanced, "expected one draw with 8 instances");
}

#[test]
fn disabled_renderable_is_skipped() {
    let mut rig = make_rig(RenderSettings::new(1280, 720, PipelineMode::Forward));
    rig.add_camera();
    rig.add_object(MaterialKind::Unlit);
    let id = rig.scene.renderables()[0].id();
    rig.scene.renderable_mut(id).unwrap().enable = false;

    rig.render_frame();

    // only the post-process quads remain
    let order = rig.renderer.device_mut().draw_order();
    assert_eq!(order, vec![Some(rig.screen_va); 3]);
}

// ============================================================================
// Shadow pass gating
// ============================================================================

#[test]
fn shadow_pass_stops_at_the_shadow_cap() {
    let mut settings = RenderSettings::new(1280, 720, PipelineMode::Forward);
    settings.max_shadows = 2;
    let mut rig = make_rig(settings);
    rig.add_camera();
    rig.add_shadow_light();
    rig.add_shadow_light();
    rig.add_shadow_light();
    let object = rig.add_object(MaterialKind::Unlit);

    rig.render_frame();

    let object_draws = rig
        .renderer
        .device_mut()
        .draw_order()
        .iter()
        .filter(|va| **va == Some(object))
        .count();
    // two shadow passes plus the opaque draw
    assert_eq!(object_draws, 3);
}

#[test]
fn light_without_shadow_target_casts_nothing() {
    let mut rig = make_rig(RenderSettings::new(1280, 720, PipelineMode::Forward));
    rig.add_camera();
    // inserted behind the renderer's back: no shadow map gets built
    let mut light = Light::new(LightKind::Directional);
    light.cast_shadows = true;
    rig.scene.insert_light(light);
    let object = rig.add_object(MaterialKind::Unlit);

    rig.render_frame();

    let object_draws = rig
        .renderer
        .device_mut()
        .draw_order()
        .iter()
        .filter(|va| **va == Some(object))
        .count();
    assert_eq!(object_draws, 1, "opaque draw only, no shadow pass");
}

#[test]
fn only_shadows_renderable_casts_but_never_draws_in_color() {
    let mut rig = make_rig(RenderSettings::new(1280, 720, PipelineMode::Forward));
    rig.add_camera();
    rig.add_shadow_light();
    let object = rig.add_object(MaterialKind::Lit);
    let id = rig.scene.renderables()[0].id();
    rig.scene.renderable_mut(id).unwrap().shadows = ShadowMode::OnlyShadows;

    rig.render_frame();

    // one shadow-pass draw, then only the post-process quads
    let order = rig.renderer.device_mut().draw_order();
    let expected: Vec<_> = [object, rig.screen_va, rig.screen_va, rig.screen_va]
        .into_iter()
        .map(Some)
        .collect();
    assert_eq!(order, expected);
}

#[test]
fn point_light_builds_a_cube_shadow_target_and_casts() {
    let mut rig = make_rig(RenderSettings::new(1280, 720, PipelineMode::Forward));
    rig.add_camera();

    let mut light = Light::new(LightKind::Point);
    light.cast_shadows = true;
    rig.renderer.device_mut().clear_commands();
    rig.renderer.activate_light(&mut rig.scene, light);

    let cube_depth = rig
        .commands()
        .iter()
        .any(|c| matches!(c, Command::CreateTexture(_, TextureTarget::CubeMap)));
    assert!(cube_depth, "point shadow targets use a cube depth texture");

    let object = rig.add_object(MaterialKind::Unlit);
    rig.render_frame();

    let object_draws = rig
        .renderer
        .device_mut()
        .draw_order()
        .iter()
        .filter(|va| **va == Some(object))
        .count();
    assert_eq!(object_draws, 2, "shadow pass plus the opaque draw");
}

#[test]
fn shadow_pass_culls_front_faces_and_restores_back() {
    let mut rig = make_rig(RenderSettings::new(1280, 720, PipelineMode::Forward));
    rig.add_camera();
    rig.add_shadow_light();
    rig.add_object(MaterialKind::Unlit);

    rig.render_frame();

    let commands = rig.commands();
    let front = commands
        .iter()
        .position(|c| *c == Command::FaceSide(CullSide::Front))
        .expect("shadow pass should cull front faces");
    let back = commands[front..]
        .iter()
        .position(|c| *c == Command::FaceSide(CullSide::Back))
        .expect("culling should be restored after the shadow pass");
    let shadow_draw = commands[front..]
        .iter()
        .position(Command::is_draw)
        .expect("shadow pass should draw the caster");
    assert!(shadow_draw < back, "caster draws under front-face culling");
}

// ============================================================================
// Deferred frames
// ============================================================================

#[test]
fn deferred_frame_draw_sequence() {
    let mut rig = make_rig(RenderSettings::new(1280, 720, PipelineMode::Deferred));
    rig.add_camera();
    rig.add_shadow_light();
    let opaque = rig.add_object(MaterialKind::Lit);
    let transparent = rig.add_object(MaterialKind::Transparent);

    rig.render_frame();

    // shadow, geometry buffer, resolve quad, forward transparent tail,
    // then the post-process quads
    let order = rig.renderer.device_mut().draw_order();
    let expected: Vec<_> = [
        opaque,
        opaque,
        rig.screen_va,
        transparent,
        rig.screen_va,
        rig.screen_va,
        rig.screen_va,
    ]
    .into_iter()
    .map(Some)
    .collect();
    assert_eq!(order, expected);
}

#[test]
fn deferred_depth_carries_over_in_a_single_nearest_blit() {
    let mut rig = make_rig(RenderSettings::new(1280, 720, PipelineMode::Deferred));
    rig.add_camera();
    rig.add_object(MaterialKind::Lit);

    rig.render_frame();

    let blits: Vec<_> = rig
        .commands()
        .into_iter()
        .filter_map(|c| match c {
            Command::Blit(src, dst, flags, filter) => Some((src, dst, flags, filter)),
            _ => None,
        })
        .collect();
    assert_eq!(blits.len(), 1);
    let (src, dst, flags, filter) = blits[0];
    assert_eq!(src, [0, 0, 1280, 720]);
    assert_eq!(dst, [0, 0, 1280, 720]);
    assert_eq!(flags, ClearFlags::DEPTH);
    assert_eq!(filter, FilterMode::Nearest);
}

#[test]
fn deferred_camera_without_geometry_buffer_falls_back_to_forward() {
    let mut rig = make_rig(RenderSettings::new(1280, 720, PipelineMode::Deferred));
    // inserted behind the renderer's back: no targets at all, so the
    // forward fallback has nothing to bind and nothing draws
    rig.scene
        .insert_camera(Camera::new(Vec4::ZERO, IVec4::new(0, 0, 1280, 720)));
    rig.add_object(MaterialKind::Lit);

    rig.render_frame();

    assert_eq!(rig.renderer.device_mut().draw_calls(), 0);
    assert_eq!(rig.renderer.device_mut().blit_count(), 0);
}

// ============================================================================
// Skybox
// ============================================================================

#[test]
fn skybox_draw_brackets_depth_and_cull_state() {
    let mut rig = make_rig(RenderSettings::new(1280, 720, PipelineMode::Forward));
    let mut camera = Camera::new(Vec4::ZERO, IVec4::new(0, 0, 1280, 720));
    let skybox = make_material(rig.renderer.device_mut(), "skybox", MaterialKind::Unlit);
    camera.skybox = Some(skybox);
    rig.renderer.activate_camera(&mut rig.scene, camera);

    rig.render_frame();

    let commands = rig.commands();
    let relaxed = commands
        .iter()
        .position(|c| *c == Command::DepthFunc(CompareFunc::LessOrEqual))
        .expect("skybox relaxes the depth test");
    let front = commands
        .iter()
        .position(|c| *c == Command::FaceSide(CullSide::Front))
        .expect("skybox is drawn from the inside");
    let draw = commands[relaxed..]
        .iter()
        .position(Command::is_draw)
        .map(|i| i + relaxed)
        .expect("skybox draw");
    let restored_func = commands[draw..]
        .iter()
        .position(|c| *c == Command::DepthFunc(CompareFunc::Less));
    let restored_side = commands[draw..]
        .iter()
        .position(|c| *c == Command::FaceSide(CullSide::Back));
    assert!(relaxed < draw && front < draw);
    assert!(restored_func.is_some(), "depth func restored after skybox");
    assert!(restored_side.is_some(), "cull side restored after skybox");
}

// ============================================================================
// Post-process chain
// ============================================================================

#[test]
fn post_chain_flags_gate_full_screen_passes() {
    // flags off: resolve + screen + final + backbuffer
    let mut rig = make_rig(RenderSettings::new(1280, 720, PipelineMode::Deferred));
    rig.add_camera();
    rig.add_object(MaterialKind::Lit);
    rig.render_frame();
    let quads = |rig: &mut Rig| {
        rig.renderer
            .device_mut()
            .draw_order()
            .iter()
            .filter(|va| **va == Some(rig.screen_va))
            .count()
    };
    assert_eq!(quads(&mut rig), 4);

    // all flags: + 2 ssao, + 1 fxaa, + 10 bloom iterations
    let mut settings = RenderSettings::new(1280, 720, PipelineMode::Deferred);
    settings.ssao = true;
    settings.fxaa = true;
    settings.bloom = true;
    let mut rig = make_rig(settings);
    rig.add_camera();
    rig.add_object(MaterialKind::Lit);
    rig.render_frame();
    assert_eq!(quads(&mut rig), 17);
}

#[test]
fn only_the_main_camera_reaches_the_backbuffer() {
    let mut rig = make_rig(RenderSettings::new(1280, 720, PipelineMode::Forward));
    rig.add_camera();
    rig.add_camera();

    rig.render_frame();

    // main camera: screen, final, backbuffer; secondary: screen, final
    let quads = rig
        .renderer
        .device_mut()
        .draw_order()
        .iter()
        .filter(|va| **va == Some(rig.screen_va))
        .count();
    assert_eq!(quads, 5);

    let backbuffer_binds = rig
        .commands()
        .iter()
        .filter(|c| **c == Command::BindFramebuffer(None))
        .count();
    assert!(backbuffer_binds >= 1);
}

// ============================================================================
// Teardown
// ============================================================================

#[test]
fn destroy_releases_scene_targets_and_uniform_blocks() {
    let mut rig = make_rig(RenderSettings::new(1280, 720, PipelineMode::Deferred));
    rig.add_camera();
    rig.add_shadow_light();
    rig.renderer.device_mut().clear_commands();

    let Rig {
        renderer,
        mut scene,
        ..
    } = rig;
    let device = renderer.destroy(&mut scene);

    let buffer_deletes = device
        .commands()
        .iter()
        .filter(|c| matches!(c, Command::DeleteBuffer(_)))
        .count();
    assert_eq!(buffer_deletes, 3, "video, camera and scene blocks");

    // camera targets (default + gbuffer + screen + final), the shadow map
    // and the shared post-process targets all give their framebuffers back
    let framebuffer_deletes = device
        .commands()
        .iter()
        .filter(|c| matches!(c, Command::DeleteFramebuffer(_)))
        .count();
    assert_eq!(framebuffer_deletes, 9);
}
