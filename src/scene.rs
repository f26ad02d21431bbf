// Scene-side records the scheduler borrows during a frame. The scene owns
// the stores; queues only keep handles, and only until the next reset().
use glam::{Mat4, Vec3};

use crate::handle::{Handle, Store};

/// Identity of a compiled shader variant. Assigned by the shader system at
/// variant creation; its total order is the final sort tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShaderId(pub u32);

/// Identity of a vertex/index buffer set plus layout, resolved by the
/// backend catalog at record time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InputAssemblerId(pub u32);

/// Identity of a bound descriptor set (bind group).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DescriptorSetId(pub u32);

/// Identity of a GPU-visible buffer used as an instance-data target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferId(pub u32);

/// Identity of the render pass configuration a recording targets. Part of
/// the pipeline-state key together with the subpass index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderPassId(pub u32);

/// Identity of a geometry input layout, the third leg of a batch identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InputLayoutId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassFlags(u32);

impl PassFlags {
    pub const NONE: Self = Self(0);
    pub const ALPHA_BLEND: Self = Self(1 << 0);
    pub const ALPHA_TEST: Self = Self(1 << 1);
    pub const INSTANCED: Self = Self(1 << 2);

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl std::ops::BitOr for PassFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for PassFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// One rendering technique of a material: fixed-function state summarized
/// as flags, a priority, and the material descriptor set to bind.
#[derive(Debug, Clone, Copy)]
pub struct MaterialPass {
    pub priority: u8,
    pub flags: PassFlags,
    pub descriptor_set: DescriptorSetId,
}

impl MaterialPass {
    pub fn new(descriptor_set: DescriptorSetId) -> Self {
        Self {
            priority: 0,
            flags: PassFlags::NONE,
            descriptor_set,
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_alpha_blend(mut self) -> Self {
        self.flags |= PassFlags::ALPHA_BLEND;
        self
    }

    pub fn with_alpha_test(mut self) -> Self {
        self.flags |= PassFlags::ALPHA_TEST;
        self
    }

    pub fn with_instancing(mut self) -> Self {
        self.flags |= PassFlags::INSTANCED;
        self
    }

    pub fn is_blended(&self) -> bool {
        self.flags.contains(PassFlags::ALPHA_BLEND)
    }

    pub fn uses_instancing(&self) -> bool {
        self.flags.contains(PassFlags::INSTANCED)
    }
}

/// A material pass resolved against a drawable: the pass handle paired with
/// the shader variant compiled for this drawable's geometry.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedPass {
    pub pass: Handle<MaterialPass>,
    pub shader: ShaderId,
}

/// One submittable unit of geometry plus its per-drawable shading state.
pub struct Drawable {
    pub input_assembler: InputAssemblerId,
    pub descriptor_set: DescriptorSetId,
    /// Drawable priority, packed into the sort key.
    pub priority: u8,
    /// Explicit draw-order override; lower draws first and dominates
    /// transparent ordering.
    pub draw_order: u8,
    passes: Vec<ResolvedPass>,
}

impl Drawable {
    pub fn new(input_assembler: InputAssemblerId, descriptor_set: DescriptorSetId) -> Self {
        Self {
            input_assembler,
            descriptor_set,
            priority: 0,
            draw_order: 0,
            passes: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_draw_order(mut self, draw_order: u8) -> Self {
        self.draw_order = draw_order;
        self
    }

    pub fn with_pass(mut self, pass: Handle<MaterialPass>, shader: ShaderId) -> Self {
        self.passes.push(ResolvedPass { pass, shader });
        self
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Resolved pass at `index`. Precondition: `index < pass_count()`;
    /// violating it is a caller contract bug, not a recoverable state.
    pub fn resolved_pass(&self, index: u32) -> ResolvedPass {
        self.passes[index as usize]
    }
}

/// The borrowed view of scene data the scheduler resolves against. All
/// referenced GPU resources stay alive for the frame by the caller's
/// contract.
#[derive(Default)]
pub struct RenderScene {
    pub drawables: Store<Drawable>,
    pub passes: Store<MaterialPass>,
}

impl RenderScene {
    pub fn drawable(&self, h: Handle<Drawable>) -> &Drawable {
        self.drawables.get(h).expect("dead drawable handle")
    }

    pub fn pass(&self, h: Handle<MaterialPass>) -> &MaterialPass {
        self.passes.get(h).expect("dead material pass handle")
    }
}

/// Camera-relative depth for a world-space position: distance along the
/// view direction, positive in front of the camera. Upstream culling feeds
/// this into `add`.
pub fn view_depth(view: &Mat4, world: Vec3) -> f32 {
    -(*view * world.extend(1.0)).z
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_flags_routing() {
        let blended = MaterialPass::new(DescriptorSetId(0)).with_alpha_blend();
        let cutout = MaterialPass::new(DescriptorSetId(0)).with_alpha_test();

        assert!(blended.is_blended());
        assert!(!cutout.is_blended());
        assert!(cutout.flags.contains(PassFlags::ALPHA_TEST));
    }

    #[test]
    fn view_depth_is_distance_along_forward() {
        // Camera at origin looking down -Z: a point 5 units ahead has depth 5.
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let depth = view_depth(&view, Vec3::new(0.0, 0.0, -5.0));
        assert!((depth - 5.0).abs() < 1e-5);

        let behind = view_depth(&view, Vec3::new(0.0, 0.0, 3.0));
        assert!(behind < 0.0);
    }
}
