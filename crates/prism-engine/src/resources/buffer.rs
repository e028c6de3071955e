use crate::device::{BufferDesc, GpuApi, GpuError};

/// Size and offset alignment required by buffer copies and index buffers.
pub const COPY_ALIGNMENT: u64 = wgpu::COPY_BUFFER_ALIGNMENT;

/// Rounds `len` up to the next multiple of [`COPY_ALIGNMENT`].
#[inline]
pub fn aligned_size(len: u64) -> u64 {
    len.div_ceil(COPY_ALIGNMENT) * COPY_ALIGNMENT
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BufferKind {
    Vertex,
    Index,
}

impl BufferKind {
    fn usage(self) -> wgpu::BufferUsages {
        match self {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            BufferKind::Index => wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        }
    }
}

/// A device buffer filled once through the queue.
///
/// `len` is the number of meaningful bytes; `size` is the aligned backing size.
/// Dropping the value releases the buffer.
pub struct GpuBuffer<A: GpuApi + ?Sized> {
    handle: A::Buffer,
    len: u64,
    size: u64,
}

impl<A: GpuApi + ?Sized> GpuBuffer<A> {
    /// Creates a buffer sized for `contents` and uploads them, zero-padded to
    /// the aligned size.
    pub fn create_init(
        api: &mut A,
        device: &A::Device,
        queue: &A::Queue,
        label: &str,
        kind: BufferKind,
        contents: &[u8],
    ) -> Result<Self, GpuError> {
        let len = contents.len() as u64;
        let size = aligned_size(len);

        let handle = api.create_buffer(
            device,
            &BufferDesc {
                label,
                size,
                usage: kind.usage(),
            },
        )?;

        if size == len {
            api.write_buffer(queue, &handle, 0, contents);
        } else {
            let mut padded = Vec::with_capacity(size as usize);
            padded.extend_from_slice(contents);
            padded.resize(size as usize, 0);
            api.write_buffer(queue, &handle, 0, &padded);
        }

        log::debug!("{label}: {len} bytes uploaded ({size} allocated)");

        Ok(Self { handle, len, size })
    }

    pub fn handle(&self) -> &A::Buffer {
        &self.handle
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}
