// The recording boundary. The scheduler replays sorted queues through these
// traits; the wgpu adapters in `backend` are the production implementation,
// tests substitute a command log.
use std::ops::Range;

use crate::pipeline::PipelineStateId;
use crate::scene::{BufferId, DescriptorSetId, InputAssemblerId};

/// Fixed descriptor-set bind points shared by every pipeline layout this
/// scheduler records against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorSlot {
    Global = 0,
    Material = 1,
    Local = 2,
}

impl DescriptorSlot {
    pub fn index(self) -> u32 {
        self as u32
    }
}

/// An open, in-order command stream for one render pass. Implementations
/// append; the scheduler never inserts barriers and never reorders.
pub trait RecordingContext {
    fn bind_pipeline_state(&mut self, pipeline: PipelineStateId);

    fn bind_descriptor_set(
        &mut self,
        slot: DescriptorSlot,
        set: DescriptorSetId,
        dynamic_offsets: &[u32],
    );

    fn bind_input_assembler(&mut self, input_assembler: InputAssemblerId);

    /// Draw the bound input assembler for the given instance range.
    fn draw(&mut self, input_assembler: InputAssemblerId, instances: Range<u32>);
}

/// Transfer-phase writes into GPU-visible storage. All uploads for a frame
/// complete before any draw is recorded.
pub trait UploadContext {
    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]);
}

/// Counters returned by every record operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecordStats {
    pub draw_calls: u32,
    pub instances: u32,
    pub pipeline_binds: u32,
    /// Binds skipped because the pipeline state matched the previous bind.
    pub binds_elided: u32,
}

impl std::ops::Add for RecordStats {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            draw_calls: self.draw_calls + rhs.draw_calls,
            instances: self.instances + rhs.instances,
            pipeline_binds: self.pipeline_binds + rhs.pipeline_binds,
            binds_elided: self.binds_elided + rhs.binds_elided,
        }
    }
}

impl std::ops::AddAssign for RecordStats {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
