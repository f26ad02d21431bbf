use crate::handle::Handle;
use crate::scene::{Drawable, MaterialPass, PassFlags, ShaderId};

/// Coarse category occupying the top two sort-key bits. Alpha-tested
/// geometry sorts after plain opaque; blended geometry lives in the
/// transparent queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueCategory {
    Opaque = 0,
    Cutout = 1,
    Transparent = 2,
}

impl QueueCategory {
    pub fn from_flags(flags: PassFlags) -> Self {
        if flags.contains(PassFlags::ALPHA_BLEND) {
            QueueCategory::Transparent
        } else if flags.contains(PassFlags::ALPHA_TEST) {
            QueueCategory::Cutout
        } else {
            QueueCategory::Opaque
        }
    }
}

/// Pack the composite 32-bit sort key:
/// category in bits 30..32, pass priority in 16..30, drawable priority in
/// 8..16, pass index in 0..8. Pass indices above 255 are a caller contract
/// violation.
pub fn pack_sort_key(
    category: QueueCategory,
    pass_priority: u8,
    drawable_priority: u8,
    pass_index: u32,
) -> u32 {
    debug_assert!(pass_index < 256, "pass index does not fit the sort key");
    ((category as u32) << 30)
        | ((pass_priority as u32) << 16)
        | ((drawable_priority as u32) << 8)
        | (pass_index & 0xFF)
}

/// Immutable snapshot of one submittable draw. Built by `DrawQueue::add`,
/// never mutated afterwards, removed only by queue reset.
#[derive(Debug, Clone, Copy)]
pub struct DrawInstance {
    pub drawable: Handle<Drawable>,
    pub pass: Handle<MaterialPass>,
    pub shader: ShaderId,
    pub sort_key: u32,
    pub depth: f32,
    /// Application-assigned override; dominates transparent ordering.
    pub priority: u8,
    pub pass_index: u32,
}
