use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::input::platform::translate_window_event;
use crate::input::{InputFrame, InputState};
use crate::time::FrameClock;

/// Window settings for [`Runtime::run`].
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "ziggurat".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Loop controls available to the application during a frame.
///
/// Requests take effect after the current callback returns.
#[derive(Default)]
pub struct RuntimeCtx {
    exit_requested: bool,
}

impl RuntimeCtx {
    pub fn exit(&mut self) {
        self.exit_requested = true;
    }
}

/// Runs one window and one [`App`] until either asks to stop.
pub struct Runtime;

impl Runtime {
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + App,
    {
        let event_loop = EventLoop::new().context("creating the event loop")?;
        let mut host = Host::new(config, gpu_init, app);
        event_loop
            .run_app(&mut host)
            .context("event loop terminated abnormally")?;
        Ok(())
    }
}

// The surface inside `Gpu` borrows the window, so the two live together in
// a self-referencing entry that winit callbacks can hold mutably.
#[self_referencing]
struct WindowEntry {
    input_state: InputState,
    input_frame: InputFrame,
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct Host<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry>,
    stopping: bool,
}

impl<A> Host<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            entry: None,
            stopping: false,
        }
    }

    fn open_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);
        let window = event_loop
            .create_window(attrs)
            .context("creating the window")?;

        let gpu_init = self.gpu_init.clone();
        self.entry = Some(
            WindowEntryBuilder {
                input_state: InputState::default(),
                input_frame: InputFrame::default(),
                clock: FrameClock::default(),
                window,
                gpu_builder: |w| {
                    pollster::block_on(Gpu::new(w, gpu_init))
                        .expect("GPU initialization failed for window")
                },
            }
            .build(),
        );
        Ok(())
    }

    fn resize_surface(&mut self, size: winit::dpi::PhysicalSize<u32>) {
        if let Some(entry) = self.entry.as_mut() {
            entry.with_gpu_mut(|gpu| gpu.resize(size));
            entry.with_window(|w| w.request_redraw());
        }
    }

    /// Ticks the clock, runs the app's frame callback and resets per-frame
    /// input deltas.
    fn redraw(&mut self, window_id: WindowId) {
        let mut runtime_ctx = RuntimeCtx::default();
        let mut control = AppControl::Continue;

        if let Some(entry) = self.entry.as_mut() {
            entry.with_mut(|fields| {
                let time = fields.clock.tick();
                {
                    let mut ctx = FrameCtx {
                        window: WindowCtx {
                            id: window_id,
                            window: fields.window,
                        },
                        gpu: fields.gpu,
                        input: fields.input_state,
                        input_frame: fields.input_frame,
                        time,
                        runtime: &mut runtime_ctx,
                    };
                    control = self.app.on_frame(&mut ctx);
                }
                fields.input_frame.clear();
            });
        }

        if control == AppControl::Exit || runtime_ctx.exit_requested {
            self.stopping = true;
        }
    }
}

impl<A> ApplicationHandler for Host<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }
        if let Err(err) = self.open_window(event_loop) {
            log::error!("window setup failed: {err:#}");
            self.stopping = true;
            event_loop.exit();
            return;
        }
        if let Some(entry) = &self.entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.stopping {
            event_loop.exit();
            return;
        }
        event_loop.set_control_flow(ControlFlow::Wait);

        // The hosted scene animates, so every presented frame immediately
        // requests the next one.
        if let Some(entry) = &self.entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.stopping {
            event_loop.exit();
            return;
        }

        // Feed the input layer and the app's raw-event hook first. Borrows
        // of `app` and `entry` are split so the ouroboros closure does not
        // capture all of `self`.
        let (app, entry_slot) = (&mut self.app, &mut self.entry);
        let Some(entry) = entry_slot.as_mut() else {
            return;
        };

        let mut app_requested_exit = false;
        entry.with_mut(|fields| {
            if let Some(ev) = translate_window_event(fields.window, fields.input_state, &event) {
                fields.input_state.apply_event(fields.input_frame, ev);
            }
            if app.on_window_event(window_id, &event) == AppControl::Exit {
                app_requested_exit = true;
            }
        });
        if app_requested_exit {
            self.stopping = true;
            event_loop.exit();
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.entry = None;
                self.stopping = true;
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => self.resize_surface(*new_size),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.entry.as_mut() {
                    let size = entry.with_window(|w| w.inner_size());
                    entry.with_gpu_mut(|gpu| gpu.resize(size));
                    entry.with_window(|w| w.request_redraw());
                }
            }
            WindowEvent::RedrawRequested => self.redraw(window_id),
            _ => {}
        }

        if self.stopping {
            event_loop.exit();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.app.on_exit();
    }
}
