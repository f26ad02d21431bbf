#![allow(dead_code)]

use std::ops::Range;

use draw_queue::{
    BufferId, DescriptorSetId, DescriptorSlot, InputAssemblerId, PipelineStateId, RecordingContext,
    UploadContext,
};

pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    BindPipeline(PipelineStateId),
    BindDescriptorSet {
        slot: DescriptorSlot,
        set: DescriptorSetId,
        dynamic_offsets: Vec<u32>,
    },
    BindInputAssembler(InputAssemblerId),
    Draw {
        input_assembler: InputAssemblerId,
        instances: Range<u32>,
    },
}

/// Recording context that logs every command instead of talking to a GPU.
#[derive(Default)]
pub struct TestRecorder {
    pub commands: Vec<Command>,
}

impl TestRecorder {
    pub fn draw_calls(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::Draw { .. }))
            .count()
    }

    pub fn pipeline_binds(&self) -> Vec<PipelineStateId> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::BindPipeline(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn descriptor_binds(&self, slot: DescriptorSlot) -> Vec<(DescriptorSetId, Vec<u32>)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::BindDescriptorSet {
                    slot: s,
                    set,
                    dynamic_offsets,
                } if *s == slot => Some((*set, dynamic_offsets.clone())),
                _ => None,
            })
            .collect()
    }
}

impl RecordingContext for TestRecorder {
    fn bind_pipeline_state(&mut self, pipeline: PipelineStateId) {
        self.commands.push(Command::BindPipeline(pipeline));
    }

    fn bind_descriptor_set(
        &mut self,
        slot: DescriptorSlot,
        set: DescriptorSetId,
        dynamic_offsets: &[u32],
    ) {
        self.commands.push(Command::BindDescriptorSet {
            slot,
            set,
            dynamic_offsets: dynamic_offsets.to_vec(),
        });
    }

    fn bind_input_assembler(&mut self, input_assembler: InputAssemblerId) {
        self.commands.push(Command::BindInputAssembler(input_assembler));
    }

    fn draw(&mut self, input_assembler: InputAssemblerId, instances: Range<u32>) {
        self.commands.push(Command::Draw {
            input_assembler,
            instances,
        });
    }
}

/// Upload context that captures buffer writes.
#[derive(Default)]
pub struct TestUploader {
    pub writes: Vec<(BufferId, u64, Vec<u8>)>,
}

impl UploadContext for TestUploader {
    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) {
        self.writes.push((buffer, offset, data.to_vec()));
    }
}
