//! Per-frame draw-order scheduling: collect culled draw candidates,
//! sort opaque geometry front-to-back and transparent geometry
//! back-to-front, aggregate instanced batches, and replay everything into
//! a command-recording context with as few pipeline binds as possible.
//!
//! Visibility, GPU memory, and shading are collaborators, not residents:
//! upstream culling feeds already-visible drawables with computed depth,
//! the pipeline-state cache hands out ids for (pass, shader, input
//! assembler, render pass) queries, and recording goes through the
//! [`record::RecordingContext`] seam (`backend` provides the wgpu
//! implementation).

pub mod backend;
pub mod handle;
pub mod pipeline;
pub mod queue;
pub mod record;
pub mod scene;
pub mod settings;

pub use handle::{Handle, Store};
pub use pipeline::{PipelineQuery, PipelineStateCache, PipelineStateId};
pub use queue::{
    BatchIdentity, DrawInstance, DrawQueue, FrameRenderQueue, InstanceBatch, InstanceBatchStore,
    InstancingQueue, QueueCategory, QueueKind,
};
pub use record::{DescriptorSlot, RecordStats, RecordingContext, UploadContext};
pub use scene::{
    BufferId, DescriptorSetId, Drawable, InputAssemblerId, InputLayoutId, MaterialPass, PassFlags,
    RenderPassId, RenderScene, ResolvedPass, ShaderId,
};
pub use settings::QueueSettings;
