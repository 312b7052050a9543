use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::transient::{TransientBuffers, TransientConfig};

/// Work item executed after the frame's main passes.
///
/// Tasks run exactly once, in scheduling order, with the frame's encoder and
/// color view. There is no cancellation: a scheduled task either runs on the
/// next drain or is dropped unexecuted when the context is dropped.
pub type PostRenderTask = Box<dyn FnOnce(&mut PostRenderCtx<'_>) + Send>;

/// Execution context handed to each post-render task.
pub struct PostRenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
    /// Physical size of the color attachment, in pixels.
    pub target_size: (u32, u32),
    /// Per-frame geometry pool; exclusive for the duration of the drain.
    pub transients: &'a mut TransientBuffers,
}

/// Shareable device handle bundle with a deferred-work queue.
///
/// Collaborators that must not touch the encoder mid-frame (overlay
/// renderers, capture tools) schedule their GPU work here; the frame owner
/// drains the queue once per frame after its own passes.
pub struct DeviceContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    tasks: Mutex<VecDeque<PostRenderTask>>,
    transients: Mutex<TransientBuffers>,
}

impl DeviceContext {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        transient_config: &TransientConfig,
    ) -> Self {
        let transients = TransientBuffers::new(device, transient_config);
        Self {
            device: device.clone(),
            queue: queue.clone(),
            surface_format,
            tasks: Mutex::new(VecDeque::new()),
            transients: Mutex::new(transients),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Resets per-frame state. Call once at the start of each frame, before
    /// any collaborator allocates transient space.
    pub fn begin_frame(&self) {
        lock_recover(&self.transients).reset();
    }

    /// Enqueues a work item to run when the frame owner drains the queue.
    ///
    /// FIFO order is preserved across callers.
    pub fn schedule_post_render<F>(&self, task: F)
    where
        F: FnOnce(&mut PostRenderCtx<'_>) + Send + 'static,
    {
        lock_recover(&self.tasks).push_back(Box::new(task));
    }

    /// Number of tasks currently waiting to run.
    pub fn pending_post_render(&self) -> usize {
        lock_recover(&self.tasks).len()
    }

    /// Drains and runs all scheduled tasks in order.
    ///
    /// Tasks scheduled while the drain is running land in the queue for the
    /// next drain.
    pub fn run_post_render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        color_view: &wgpu::TextureView,
        target_size: (u32, u32),
    ) {
        let drained: Vec<PostRenderTask> = {
            let mut queue = lock_recover(&self.tasks);
            queue.drain(..).collect()
        };

        if drained.is_empty() {
            return;
        }

        let mut transients = lock_recover(&self.transients);
        let mut ctx = PostRenderCtx {
            device: &self.device,
            queue: &self.queue,
            encoder,
            color_view,
            target_size,
            transients: &mut transients,
        };

        for task in drained {
            task(&mut ctx);
        }
    }
}

/// Recovers the guard from a poisoned mutex.
///
/// The protected state is plain bookkeeping; a panic in an unrelated task
/// must not wedge rendering for the rest of the session.
fn lock_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
