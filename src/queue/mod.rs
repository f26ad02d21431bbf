pub mod draw;
pub mod frame;
pub mod instance;
pub mod instancing;

pub use draw::DrawQueue;
pub use frame::{FrameRenderQueue, QueueKind};
pub use instance::{DrawInstance, QueueCategory};
pub use instancing::{BatchIdentity, InstanceBatch, InstanceBatchStore, InstancingQueue};
