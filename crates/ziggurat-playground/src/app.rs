//! Frame orchestration.
//!
//! Each frame: bind the GPU once, react to hotkeys, forward pointer traffic
//! to the scripts when the overlay is hidden, drain scene commands, tick the
//! script runtime, queue the HUD draw data, then render. The overlay draws
//! itself from the post-render queue after the clear pass.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use ziggurat_engine::color::ColorRgba;
use ziggurat_engine::core::{App, AppControl, FrameCtx};
use ziggurat_engine::device::{DeviceContext, TransientConfig};
use ziggurat_engine::input::{InputEvent, Key, MouseButton, MouseButtonState, MouseWheelDelta};
use ziggurat_overlay::{OverlayConfig, OverlayRenderer};
use ziggurat_script::{
    BUTTON_LEFT, BUTTON_MIDDLE, BUTTON_RIGHT, InputBridge, SceneApi, SceneCommand, ScriptLoader,
    ScriptRuntime,
};

use crate::hud;

const DT_HISTORY_LEN: usize = 90;

const PRELUDE_SRC: &str = include_str!("../scripts/prelude.rhai");
const SCENE_SRC: &str = include_str!("../scripts/scene.rhai");

/// Inline expression evaluated before any script file loads.
const BOOTSTRAP_SRC: &str = r#"print("script host ready");"#;

/// Script files in load order. The embedded copies back up the on-disk ones
/// so the binary still runs away from the source tree.
const SCRIPTS: [(&str, &str); 2] = [
    ("prelude.rhai", PRELUDE_SRC),
    ("scene.rhai", SCENE_SRC),
];

// ── scene state ──────────────────────────────────────────────────────────────

/// Host-owned scene values, written only through script commands.
struct SceneState {
    clear_color: ColorRgba,
    status: String,
    spin_rate: f32,
    spin_angle: f32,
}

impl Default for SceneState {
    fn default() -> Self {
        Self {
            clear_color: ColorRgba::new(0.03, 0.05, 0.09, 1.0),
            status: "waiting for scripts".to_owned(),
            spin_rate: 1.0,
            spin_angle: 0.0,
        }
    }
}

fn apply_scene_commands(scene: &mut SceneState, commands: Vec<SceneCommand>) {
    for command in commands {
        match command {
            SceneCommand::SetClearColor { r, g, b } => {
                let color = ColorRgba::new(r, g, b, 1.0);
                if color.is_finite() {
                    scene.clear_color = color;
                } else {
                    log::warn!("script sent a non-finite clear color, keeping the old one");
                }
            }
            SceneCommand::SetStatusLine(text) => scene.status = text,
            SceneCommand::SetSpinRate(rate) if rate.is_finite() => scene.spin_rate = rate,
            SceneCommand::SetSpinRate(_) => {
                log::warn!("script sent a non-finite spin rate, keeping the old one");
            }
        }
    }
}

// ── input mapping ────────────────────────────────────────────────────────────

fn script_button(button: MouseButton) -> Option<usize> {
    match button {
        MouseButton::Left => Some(BUTTON_LEFT),
        MouseButton::Middle => Some(BUTTON_MIDDLE),
        MouseButton::Right => Some(BUTTON_RIGHT),
        _ => None,
    }
}

/// Wheel deltas arrive in two unit systems; both land on one accumulated
/// axis where positive means scrolling toward the user.
fn wheel_amount(delta: MouseWheelDelta) -> f32 {
    match delta {
        MouseWheelDelta::Line { y, .. } => -y * 100.0,
        MouseWheelDelta::Pixel { y, .. } => -y,
    }
}

// ── the app ──────────────────────────────────────────────────────────────────

pub struct PlaygroundApp {
    overlay: OverlayRenderer,
    device_ctx: Option<Arc<DeviceContext>>,
    scripts: ScriptRuntime,
    input_bridge: InputBridge,
    scene_api: SceneApi,
    scene: SceneState,
    overlay_visible: bool,
    dt_history: VecDeque<f32>,
    fps: f32,
}

impl PlaygroundApp {
    pub fn new() -> Self {
        let scripts = ScriptRuntime::new();
        let input_bridge = InputBridge::new();
        let scene_api = SceneApi::new();
        input_bridge.install(&scripts);
        scene_api.install(&scripts);

        let app = Self {
            overlay: OverlayRenderer::new(),
            device_ctx: None,
            scripts,
            input_bridge,
            scene_api,
            scene: SceneState::default(),
            overlay_visible: true,
            dt_history: VecDeque::with_capacity(DT_HISTORY_LEN),
            fps: 0.0,
        };
        app.load_scripts();
        app
    }

    fn load_scripts(&self) {
        let loader = ScriptLoader::new(&self.scripts);
        loader.eval("<bootstrap>", BOOTSTRAP_SRC);
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("scripts");
        for (name, embedded) in SCRIPTS {
            if let Err(err) = loader.load_script(&dir.join(name)) {
                log::warn!("{err:#}; using the embedded copy of {name}");
                loader.eval(name, embedded);
            }
        }
    }

    /// Creates the shared device context and initializes the overlay the
    /// first time a frame sees the GPU.
    fn ensure_gpu_bound(&mut self, ctx: &FrameCtx<'_, '_>) -> anyhow::Result<()> {
        if self.device_ctx.is_none() {
            let device_ctx = Arc::new(DeviceContext::new(
                ctx.gpu.device(),
                ctx.gpu.queue(),
                ctx.gpu.surface_format(),
                &TransientConfig::default(),
            ));
            self.overlay.set_context(Some(Arc::clone(&device_ctx)));
            self.device_ctx = Some(device_ctx);
        }
        if !self.overlay.is_initialized() {
            self.overlay
                .init(
                    ctx.gpu.device(),
                    ctx.gpu.queue(),
                    ctx.gpu.surface_format(),
                    &OverlayConfig::default(),
                )
                .context("initializing the overlay renderer")?;
        }
        Ok(())
    }

    fn handle_keys(&mut self, ctx: &FrameCtx<'_, '_>) {
        if ctx.input_frame.pressed(Key::F1) {
            self.overlay_visible = !self.overlay_visible;
            log::info!(
                "overlay {}",
                if self.overlay_visible { "shown" } else { "hidden" }
            );
        }
        if ctx.input_frame.pressed(Key::R) {
            log::info!("reloading scripts");
            self.scripts.dispatch(|host| host.reset());
            self.load_scripts();
        }
    }

    /// Pointer traffic reaches the scripts only while the overlay is out of
    /// the way; a visible overlay swallows it.
    fn forward_pointer_events(&self, ctx: &FrameCtx<'_, '_>) {
        if self.overlay_visible {
            return;
        }
        for event in &ctx.input_frame.events {
            match event {
                InputEvent::PointerMoved(moved) => {
                    self.input_bridge.mouse_move(moved.x, moved.y);
                }
                InputEvent::PointerButton(button) => {
                    let Some(id) = script_button(button.button) else {
                        continue;
                    };
                    match button.state {
                        MouseButtonState::Pressed => self.input_bridge.mouse_down(id),
                        MouseButtonState::Released => self.input_bridge.mouse_up(id),
                    }
                }
                InputEvent::MouseWheel { delta, .. } => {
                    self.input_bridge.mouse_wheel(wheel_amount(*delta));
                }
                _ => {}
            }
        }
    }

    fn record_frame_time(&mut self, dt: f32) {
        if self.dt_history.len() == DT_HISTORY_LEN {
            self.dt_history.pop_front();
        }
        self.dt_history.push_back(dt);

        let instant = if dt > 0.0 { 1.0 / dt } else { 0.0 };
        if self.fps == 0.0 {
            self.fps = instant;
        } else {
            // Light smoothing keeps the readout legible.
            self.fps = self.fps * 0.95 + instant * 0.05;
        }
    }

    fn submit_hud(&mut self, ctx: &FrameCtx<'_, '_>) {
        let Some(atlas) = self.overlay.atlas().map(Arc::clone) else {
            return;
        };
        let size = ctx.gpu.size();
        let pointer = self.input_bridge.snapshot();
        let history = self.dt_history.make_contiguous();

        let data = hud::build(&hud::HudFrame {
            atlas: &atlas,
            display_size: [size.width as f32, size.height as f32],
            status: &self.scene.status,
            fps: self.fps,
            frame_index: ctx.time.frame_index,
            dt_history: history,
            spin_angle: self.scene.spin_angle,
            pointer: [pointer.x, pointer.y],
            wheel: pointer.wheel,
        });
        self.overlay.render_draw_data(&data);
    }
}

impl App for PlaygroundApp {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if let Err(err) = self.ensure_gpu_bound(ctx) {
            log::error!("{err:#}");
            return AppControl::Exit;
        }

        self.handle_keys(ctx);
        self.forward_pointer_events(ctx);

        let Some(device_ctx) = self.device_ctx.as_ref().map(Arc::clone) else {
            return AppControl::Continue;
        };
        device_ctx.begin_frame();
        self.overlay.new_frame();

        apply_scene_commands(&mut self.scene, self.scene_api.drain());

        let dt = ctx.time.dt;
        self.scene.spin_angle =
            (self.scene.spin_angle + self.scene.spin_rate * dt) % std::f32::consts::TAU;
        self.record_frame_time(dt);
        self.scripts.tick(dt);

        if self.overlay_visible {
            self.submit_hud(ctx);
        }

        let size = ctx.gpu.size();
        ctx.render(self.scene.clear_color, move |target| {
            device_ctx.run_post_render(target.encoder, target.color_view, (size.width, size.height));
        })
    }

    fn on_exit(&mut self) {
        log::info!("shutting down");
        self.overlay.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_map_left_middle_right() {
        assert_eq!(script_button(MouseButton::Left), Some(0));
        assert_eq!(script_button(MouseButton::Middle), Some(1));
        assert_eq!(script_button(MouseButton::Right), Some(2));
        assert_eq!(script_button(MouseButton::Back), None);
        assert_eq!(script_button(MouseButton::Other(7)), None);
    }

    #[test]
    fn wheel_lines_scale_pixels_do_not() {
        assert_eq!(wheel_amount(MouseWheelDelta::Line { x: 0.0, y: 1.0 }), -100.0);
        assert_eq!(wheel_amount(MouseWheelDelta::Line { x: 0.0, y: -2.0 }), 200.0);
        assert_eq!(wheel_amount(MouseWheelDelta::Pixel { x: 0.0, y: 30.0 }), -30.0);
    }

    #[test]
    fn scene_commands_apply_in_order() {
        let mut scene = SceneState::default();
        apply_scene_commands(
            &mut scene,
            vec![
                SceneCommand::SetSpinRate(3.0),
                SceneCommand::SetStatusLine("a".to_owned()),
                SceneCommand::SetStatusLine("b".to_owned()),
                SceneCommand::SetClearColor { r: 0.5, g: 0.25, b: 0.125 },
            ],
        );
        assert_eq!(scene.spin_rate, 3.0);
        assert_eq!(scene.status, "b");
        assert_eq!(scene.clear_color, ColorRgba::new(0.5, 0.25, 0.125, 1.0));
    }

    #[test]
    fn non_finite_scene_values_are_rejected() {
        let mut scene = SceneState::default();
        let before_color = scene.clear_color;
        apply_scene_commands(
            &mut scene,
            vec![
                SceneCommand::SetSpinRate(f32::NAN),
                SceneCommand::SetClearColor { r: f32::INFINITY, g: 0.0, b: 0.0 },
            ],
        );
        assert_eq!(scene.spin_rate, 1.0);
        assert_eq!(scene.clear_color, before_color);
    }

    #[test]
    fn frame_time_history_is_bounded() {
        let mut app = PlaygroundApp::new();
        for _ in 0..(DT_HISTORY_LEN * 2) {
            app.record_frame_time(0.016);
        }
        assert_eq!(app.dt_history.len(), DT_HISTORY_LEN);
        assert!(app.fps > 0.0);
    }
}
