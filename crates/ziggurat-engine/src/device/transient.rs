/// Capacity configuration for the per-frame transient pool.
///
/// Defaults follow the sizing of comparable per-frame pools in native
/// renderers: UI geometry rarely approaches these limits, and overlay
/// renderers are expected to check availability and truncate rather than
/// grow.
#[derive(Debug, Clone)]
pub struct TransientConfig {
    pub vertex_bytes: u64,
    pub index_bytes: u64,
}

impl Default for TransientConfig {
    fn default() -> Self {
        Self {
            vertex_bytes: 6 << 20, // 6 MiB
            index_bytes: 2 << 20,  // 2 MiB
        }
    }
}

/// Byte range handed out by the pool, valid for the current frame only.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TransientRange {
    pub offset: u64,
    pub bytes: u64,
}

impl TransientRange {
    #[inline]
    pub fn end(&self) -> u64 {
        self.offset + self.bytes
    }
}

/// Bump accounting over a fixed byte capacity.
///
/// All handed-out sizes are rounded up to wgpu's copy alignment so that
/// `queue.write_buffer` offsets stay valid.
#[derive(Debug, Clone)]
struct BumpRegion {
    capacity: u64,
    used: u64,
}

impl BumpRegion {
    fn new(capacity: u64) -> Self {
        Self { capacity, used: 0 }
    }

    fn aligned(bytes: u64) -> u64 {
        bytes.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT)
    }

    fn fits(&self, bytes: u64) -> bool {
        Self::aligned(bytes) <= self.capacity - self.used
    }

    fn try_alloc(&mut self, bytes: u64) -> Option<TransientRange> {
        let aligned = Self::aligned(bytes);
        if aligned > self.capacity - self.used {
            return None;
        }
        let offset = self.used;
        self.used += aligned;
        Some(TransientRange {
            offset,
            bytes: aligned,
        })
    }

    fn reset(&mut self) {
        self.used = 0;
    }

    fn remaining(&self) -> u64 {
        self.capacity - self.used
    }
}

/// Per-frame vertex/index pool.
///
/// One GPU buffer per kind, bump-allocated during the frame and reset at the
/// start of the next one. Ranges handed out earlier in a frame are never
/// reused within it, so writes and draws may be recorded in any order.
pub struct TransientBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    vertex_region: BumpRegion,
    index_region: BumpRegion,
}

impl TransientBuffers {
    pub fn new(device: &wgpu::Device, config: &TransientConfig) -> Self {
        let vertex = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ziggurat transient vertices"),
            size: config.vertex_bytes,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let index = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ziggurat transient indices"),
            size: config.index_bytes,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            vertex,
            index,
            vertex_region: BumpRegion::new(config.vertex_bytes),
            index_region: BumpRegion::new(config.index_bytes),
        }
    }

    /// Forgets all allocations of the previous frame.
    pub fn reset(&mut self) {
        self.vertex_region.reset();
        self.index_region.reset();
    }

    /// True when both requested byte counts fit in the remaining space.
    ///
    /// Callers should check before copying and skip the work entirely when
    /// the pool cannot hold it.
    pub fn check_avail(&self, vertex_bytes: u64, index_bytes: u64) -> bool {
        self.vertex_region.fits(vertex_bytes) && self.index_region.fits(index_bytes)
    }

    /// Allocates a vertex range and an index range for the current frame.
    ///
    /// Both succeed or neither does.
    pub fn alloc(
        &mut self,
        vertex_bytes: u64,
        index_bytes: u64,
    ) -> Option<(TransientRange, TransientRange)> {
        if !self.check_avail(vertex_bytes, index_bytes) {
            return None;
        }
        let v = self.vertex_region.try_alloc(vertex_bytes)?;
        let i = self.index_region.try_alloc(index_bytes)?;
        Some((v, i))
    }

    /// Remaining capacity as `(vertex_bytes, index_bytes)`.
    pub fn remaining(&self) -> (u64, u64) {
        (self.vertex_region.remaining(), self.index_region.remaining())
    }

    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex
    }

    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.index
    }
}
