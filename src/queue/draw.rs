use std::cmp::Ordering;

use crate::handle::Handle;
use crate::pipeline::{PipelineQuery, PipelineStateCache};
use crate::queue::instance::{pack_sort_key, DrawInstance, QueueCategory};
use crate::record::{DescriptorSlot, RecordStats, RecordingContext};
use crate::scene::{Drawable, RenderPassId, RenderScene};

/// Collects draw instances for one frame, sorts them with either the
/// opaque or the transparent comparator, and replays them in order.
///
/// Not internally synchronized: parallel culling workers either own their
/// own queue (then `append` into one) or serialize access externally.
#[derive(Default)]
pub struct DrawQueue {
    instances: Vec<DrawInstance>,
}

impl DrawQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            instances: Vec::with_capacity(capacity),
        }
    }

    /// Append one draw of `drawable` using its pass at `pass_index`.
    /// `depth` is the camera-relative depth computed upstream.
    ///
    /// Precondition: `pass_index < drawable.pass_count()` and all handles
    /// valid for the frame. Violations panic; they are caller bugs, not
    /// recoverable states.
    pub fn add(
        &mut self,
        scene: &RenderScene,
        drawable: Handle<Drawable>,
        pass_index: u32,
        depth: f32,
    ) {
        let d = scene.drawable(drawable);
        let resolved = d.resolved_pass(pass_index);
        let pass = scene.pass(resolved.pass);

        let category = QueueCategory::from_flags(pass.flags);
        let sort_key = pack_sort_key(category, pass.priority, d.priority, pass_index);

        self.instances.push(DrawInstance {
            drawable,
            pass: resolved.pass,
            shader: resolved.shader,
            sort_key,
            depth,
            priority: d.draw_order,
            pass_index,
        });
    }

    /// Front-to-back order for depth-tested geometry: ascending
    /// `(sort_key, depth, shader)`.
    ///
    /// The sort is unstable; instances whose full tuple compares equal do
    /// not keep insertion order. Shader identity breaks all remaining
    /// ties, so the result is deterministic for any input set.
    pub fn sort_opaque(&mut self) {
        self.instances.sort_unstable_by(opaque_order);
    }

    /// Back-to-front order for blended geometry: ascending
    /// `(priority, sort_key, -depth, shader)`. The depth comparison swaps
    /// its operands instead of negating the float, reusing the same
    /// ascending comparator shape as the opaque path.
    ///
    /// Unstable, same as `sort_opaque`; equal full tuples do not keep
    /// insertion order.
    pub fn sort_transparent(&mut self) {
        self.instances.sort_unstable_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.sort_key.cmp(&b.sort_key))
                .then_with(|| b.depth.total_cmp(&a.depth))
                .then_with(|| a.shader.cmp(&b.shader))
        });
    }

    /// Replay the sorted sequence into `rec`, in order: acquire pipeline
    /// state, bind it, bind the material set, bind the drawable's local
    /// set, bind the input assembler, draw one instance. A pure projection
    /// of the sequence onto the command stream; no reordering happens
    /// here.
    pub fn record_commands(
        &self,
        scene: &RenderScene,
        cache: &mut PipelineStateCache,
        render_pass: RenderPassId,
        subpass: u32,
        rec: &mut dyn RecordingContext,
    ) -> RecordStats {
        let mut stats = RecordStats::default();

        for instance in &self.instances {
            let drawable = scene.drawable(instance.drawable);
            let pass = scene.pass(instance.pass);

            let pso = cache.acquire_or_create(PipelineQuery {
                pass: instance.pass,
                shader: instance.shader,
                input_assembler: drawable.input_assembler,
                render_pass,
                subpass,
            });

            rec.bind_pipeline_state(pso);
            rec.bind_descriptor_set(DescriptorSlot::Material, pass.descriptor_set, &[]);
            rec.bind_descriptor_set(DescriptorSlot::Local, drawable.descriptor_set, &[]);
            rec.bind_input_assembler(drawable.input_assembler);
            rec.draw(drawable.input_assembler, 0..1);

            stats.pipeline_binds += 1;
            stats.draw_calls += 1;
            stats.instances += 1;
        }

        stats
    }

    /// Drain another worker's queue into this one. The collect-then-merge
    /// strategy for parallel culling: each worker fills its own queue,
    /// then one thread appends them all before sorting.
    pub fn append(&mut self, other: &mut DrawQueue) {
        self.instances.append(&mut other.instances);
    }

    /// Clear the sequence without releasing referenced resources.
    pub fn reset(&mut self) {
        self.instances.clear();
    }

    pub fn instances(&self) -> &[DrawInstance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Compare two instances with the opaque tuple. Exposed for callers that
/// pre-sort worker-local slices.
pub fn opaque_order(a: &DrawInstance, b: &DrawInstance) -> Ordering {
    a.sort_key
        .cmp(&b.sort_key)
        .then_with(|| a.depth.total_cmp(&b.depth))
        .then_with(|| a.shader.cmp(&b.shader))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{DescriptorSetId, Drawable, InputAssemblerId, MaterialPass, ShaderId};

    fn scene_with_one_pass() -> (RenderScene, Handle<Drawable>) {
        let mut scene = RenderScene::default();
        let pass = scene
            .passes
            .insert(MaterialPass::new(DescriptorSetId(10)).with_priority(2));
        let drawable = scene.drawables.insert(
            Drawable::new(InputAssemblerId(1), DescriptorSetId(20))
                .with_priority(5)
                .with_pass(pass, ShaderId(7)),
        );
        (scene, drawable)
    }

    #[test]
    fn add_packs_key_from_pass_and_drawable() {
        let (scene, drawable) = scene_with_one_pass();
        let mut queue = DrawQueue::new();
        queue.add(&scene, drawable, 0, 1.5);

        let inst = &queue.instances()[0];
        assert_eq!(inst.sort_key, (2 << 16) | (5 << 8));
        assert_eq!(inst.shader, ShaderId(7));
        assert_eq!(inst.depth, 1.5);
    }

    #[test]
    fn sort_twice_is_idempotent() {
        let (scene, drawable) = scene_with_one_pass();
        let mut queue = DrawQueue::new();
        for depth in [4.0, 1.0, 3.0, 2.0] {
            queue.add(&scene, drawable, 0, depth);
        }

        queue.sort_opaque();
        let first: Vec<f32> = queue.instances().iter().map(|i| i.depth).collect();
        queue.sort_opaque();
        let second: Vec<f32> = queue.instances().iter().map(|i| i.depth).collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn reset_clears_but_keeps_nothing_referenced() {
        let (scene, drawable) = scene_with_one_pass();
        let mut queue = DrawQueue::new();
        queue.add(&scene, drawable, 0, 1.0);
        queue.reset();
        assert!(queue.is_empty());
    }

    #[test]
    fn append_moves_instances() {
        let (scene, drawable) = scene_with_one_pass();
        let mut a = DrawQueue::new();
        let mut b = DrawQueue::new();
        a.add(&scene, drawable, 0, 1.0);
        b.add(&scene, drawable, 0, 2.0);

        a.append(&mut b);
        assert_eq!(a.len(), 2);
        assert!(b.is_empty());
    }
}
