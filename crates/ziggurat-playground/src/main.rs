//! Playground binary: a script-driven scene in a native window with a GPU
//! debug overlay on top.

mod app;
mod hud;

use anyhow::Result;
use winit::dpi::LogicalSize;

use ziggurat_engine::device::GpuInit;
use ziggurat_engine::logging::{LoggingConfig, init_logging};
use ziggurat_engine::window::{Runtime, RuntimeConfig};

use crate::app::PlaygroundApp;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    // Banner goes out before the window opens.
    println!();
    println!("  ╔══════════════════════════════════════════╗");
    println!("  ║         ZIGGURAT PLAYGROUND v0.1         ║");
    println!("  ║   wgpu overlay  ·  rhai script runtime   ║");
    println!("  ╠══════════════════════════════════════════╣");
    println!("  ║   [R]   reload scripts                   ║");
    println!("  ║   [F1]  toggle the debug overlay         ║");
    println!("  ╚══════════════════════════════════════════╝");
    println!();

    let config = RuntimeConfig {
        title: "Ziggurat Playground".to_string(),
        initial_size: LogicalSize::new(1920.0, 1080.0),
    };
    let gpu_init = GpuInit {
        present_mode: wgpu::PresentMode::Fifo,
        ..GpuInit::default()
    };

    Runtime::run(config, gpu_init, PlaygroundApp::new())
}
