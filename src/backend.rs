// wgpu adapters for the recording boundary. The engine registers its GPU
// objects in a catalog; the contexts resolve scheduler ids against it
// while a pass is open. Missing entries are an engine registration race,
// not a scheduler bug: warn and skip, never abort the frame.
use std::collections::HashMap;
use std::ops::Range;

use crate::pipeline::PipelineStateId;
use crate::record::{DescriptorSlot, RecordingContext, UploadContext};
use crate::scene::{BufferId, DescriptorSetId, InputAssemblerId};

/// Vertex/index buffers plus counts for one input assembler.
pub struct GpuInputAssembler {
    pub vertex_buffers: Vec<wgpu::Buffer>,
    pub index: Option<(wgpu::Buffer, wgpu::IndexFormat, u32)>,
    pub vertex_count: u32,
}

/// Id-to-object registry for everything the recording contexts bind.
/// Registration is the engine's responsibility; the scheduler only reads.
#[derive(Default)]
pub struct GpuCatalog {
    pipelines: HashMap<PipelineStateId, wgpu::RenderPipeline>,
    descriptor_sets: HashMap<DescriptorSetId, wgpu::BindGroup>,
    input_assemblers: HashMap<InputAssemblerId, GpuInputAssembler>,
    buffers: HashMap<BufferId, wgpu::Buffer>,
}

impl GpuCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_pipeline(&mut self, id: PipelineStateId, pipeline: wgpu::RenderPipeline) {
        self.pipelines.insert(id, pipeline);
    }

    pub fn register_descriptor_set(&mut self, id: DescriptorSetId, set: wgpu::BindGroup) {
        self.descriptor_sets.insert(id, set);
    }

    pub fn register_input_assembler(&mut self, id: InputAssemblerId, ia: GpuInputAssembler) {
        self.input_assemblers.insert(id, ia);
    }

    pub fn register_buffer(&mut self, id: BufferId, buffer: wgpu::Buffer) {
        self.buffers.insert(id, buffer);
    }

    pub fn pipeline(&self, id: PipelineStateId) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(&id)
    }

    pub fn descriptor_set(&self, id: DescriptorSetId) -> Option<&wgpu::BindGroup> {
        self.descriptor_sets.get(&id)
    }

    pub fn input_assembler(&self, id: InputAssemblerId) -> Option<&GpuInputAssembler> {
        self.input_assemblers.get(&id)
    }

    pub fn buffer(&self, id: BufferId) -> Option<&wgpu::Buffer> {
        self.buffers.get(&id)
    }
}

/// `RecordingContext` over an open `wgpu::RenderPass`.
pub struct WgpuRecordingContext<'a, 'e> {
    pass: &'a mut wgpu::RenderPass<'e>,
    catalog: &'a GpuCatalog,
}

impl<'a, 'e> WgpuRecordingContext<'a, 'e> {
    pub fn new(pass: &'a mut wgpu::RenderPass<'e>, catalog: &'a GpuCatalog) -> Self {
        Self { pass, catalog }
    }
}

impl RecordingContext for WgpuRecordingContext<'_, '_> {
    fn bind_pipeline_state(&mut self, pipeline: PipelineStateId) {
        let Some(pso) = self.catalog.pipeline(pipeline) else {
            log::warn!("Skipping bind of unregistered pipeline state {:?}", pipeline);
            return;
        };
        self.pass.set_pipeline(pso);
    }

    fn bind_descriptor_set(
        &mut self,
        slot: DescriptorSlot,
        set: DescriptorSetId,
        dynamic_offsets: &[u32],
    ) {
        let Some(group) = self.catalog.descriptor_set(set) else {
            log::warn!("Skipping bind of unregistered descriptor set {:?}", set);
            return;
        };
        self.pass.set_bind_group(slot.index(), group, dynamic_offsets);
    }

    fn bind_input_assembler(&mut self, input_assembler: InputAssemblerId) {
        let Some(ia) = self.catalog.input_assembler(input_assembler) else {
            log::warn!(
                "Skipping bind of unregistered input assembler {:?}",
                input_assembler
            );
            return;
        };

        for (slot, buffer) in ia.vertex_buffers.iter().enumerate() {
            self.pass.set_vertex_buffer(slot as u32, buffer.slice(..));
        }
        if let Some((index_buffer, index_format, _)) = &ia.index {
            self.pass.set_index_buffer(index_buffer.slice(..), *index_format);
        }
    }

    fn draw(&mut self, input_assembler: InputAssemblerId, instances: Range<u32>) {
        let Some(ia) = self.catalog.input_assembler(input_assembler) else {
            log::warn!("Skipping draw with unregistered input assembler {:?}", input_assembler);
            return;
        };

        if let Some((_, _, index_count)) = &ia.index {
            self.pass.draw_indexed(0..*index_count, 0, instances);
        } else {
            self.pass.draw(0..ia.vertex_count, instances);
        }
    }
}

/// `UploadContext` over the wgpu queue; runs before any pass opens.
pub struct WgpuUploadContext<'a> {
    queue: &'a wgpu::Queue,
    catalog: &'a GpuCatalog,
}

impl<'a> WgpuUploadContext<'a> {
    pub fn new(queue: &'a wgpu::Queue, catalog: &'a GpuCatalog) -> Self {
        Self { queue, catalog }
    }
}

impl UploadContext for WgpuUploadContext<'_> {
    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) {
        let Some(target) = self.catalog.buffer(buffer) else {
            log::warn!("Skipping upload to unregistered buffer {:?}", buffer);
            return;
        };
        self.queue.write_buffer(target, offset, data);
    }
}
