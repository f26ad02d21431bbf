use crate::handle::Handle;
use crate::queue::draw::DrawQueue;
use crate::queue::instancing::{InstanceBatch, InstanceBatchStore, InstancingQueue};
use crate::record::UploadContext;
use crate::scene::{Drawable, RenderScene};
use crate::settings::QueueSettings;

/// Which side of the blend split an instanced batch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    Opaque,
    Transparent,
}

/// Top-level coordinator for one render view: an opaque and a transparent
/// draw queue plus one instancing aggregator for each. Created once per
/// view, reset every frame.
///
/// The coordinator does not record commands itself; the pass executor
/// pulls the four sub-collections and replays them into its open passes.
#[derive(Default)]
pub struct FrameRenderQueue {
    opaque: DrawQueue,
    transparent: DrawQueue,
    opaque_instancing: InstancingQueue,
    transparent_instancing: InstancingQueue,
}

impl FrameRenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: &QueueSettings) -> Self {
        Self {
            opaque: DrawQueue::with_capacity(settings.opaque_capacity),
            transparent: DrawQueue::with_capacity(settings.transparent_capacity),
            opaque_instancing: InstancingQueue::new(),
            transparent_instancing: InstancingQueue::new(),
        }
    }

    /// Route one draw candidate: blended passes go to the transparent
    /// queue, everything else front-to-back. Instanced passes are fed
    /// through `add_instanced` instead.
    pub fn add(
        &mut self,
        scene: &RenderScene,
        drawable: Handle<Drawable>,
        pass_index: u32,
        depth: f32,
    ) {
        let resolved = scene.drawable(drawable).resolved_pass(pass_index);
        let pass = scene.pass(resolved.pass);
        debug_assert!(
            !pass.uses_instancing(),
            "instanced passes are submitted via add_instanced"
        );

        if pass.is_blended() {
            self.transparent.add(scene, drawable, pass_index, depth);
        } else {
            self.opaque.add(scene, drawable, pass_index, depth);
        }
    }

    pub fn add_instanced(&mut self, kind: QueueKind, batch: Handle<InstanceBatch>) {
        match kind {
            QueueKind::Opaque => self.opaque_instancing.add(batch),
            QueueKind::Transparent => self.transparent_instancing.add(batch),
        }
    }

    /// Run the frame's sort phase: opaque sort, transparent sort, then
    /// both instancing finalizes. All four complete before any command
    /// recording for the frame.
    pub fn sort(&mut self) {
        self.opaque.sort_opaque();
        self.transparent.sort_transparent();
        self.opaque_instancing.sort();
        self.transparent_instancing.sort();
    }

    /// Upload all pending instance data, both aggregators, before any
    /// draw is recorded.
    pub fn upload_pending(&self, store: &InstanceBatchStore, ctx: &mut dyn UploadContext) {
        self.opaque_instancing.upload_pending(store, ctx);
        self.transparent_instancing.upload_pending(store, ctx);
    }

    pub fn opaque(&self) -> &DrawQueue {
        &self.opaque
    }

    pub fn opaque_mut(&mut self) -> &mut DrawQueue {
        &mut self.opaque
    }

    pub fn transparent(&self) -> &DrawQueue {
        &self.transparent
    }

    pub fn transparent_mut(&mut self) -> &mut DrawQueue {
        &mut self.transparent
    }

    pub fn opaque_instancing(&self) -> &InstancingQueue {
        &self.opaque_instancing
    }

    pub fn opaque_instancing_mut(&mut self) -> &mut InstancingQueue {
        &mut self.opaque_instancing
    }

    pub fn transparent_instancing(&self) -> &InstancingQueue {
        &self.transparent_instancing
    }

    pub fn transparent_instancing_mut(&mut self) -> &mut InstancingQueue {
        &mut self.transparent_instancing
    }

    /// Clear all four sub-collections for the next frame. References are
    /// dropped, nothing is destroyed.
    pub fn reset(&mut self) {
        self.opaque.reset();
        self.transparent.reset();
        self.opaque_instancing.reset();
        self.transparent_instancing.reset();
    }

    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty()
            && self.transparent.is_empty()
            && self.opaque_instancing.is_empty()
            && self.transparent_instancing.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{DescriptorSetId, Drawable, InputAssemblerId, MaterialPass, ShaderId};

    fn scene_with_blend_split() -> (RenderScene, Handle<Drawable>, Handle<Drawable>) {
        let mut scene = RenderScene::default();
        let opaque_pass = scene.passes.insert(MaterialPass::new(DescriptorSetId(0)));
        let blended_pass = scene
            .passes
            .insert(MaterialPass::new(DescriptorSetId(1)).with_alpha_blend());

        let solid = scene.drawables.insert(
            Drawable::new(InputAssemblerId(0), DescriptorSetId(2)).with_pass(opaque_pass, ShaderId(0)),
        );
        let glass = scene.drawables.insert(
            Drawable::new(InputAssemblerId(1), DescriptorSetId(3))
                .with_pass(blended_pass, ShaderId(1)),
        );
        (scene, solid, glass)
    }

    #[test]
    fn add_routes_by_blend_flag() {
        let (scene, solid, glass) = scene_with_blend_split();
        let mut frame = FrameRenderQueue::new();

        frame.add(&scene, solid, 0, 1.0);
        frame.add(&scene, glass, 0, 2.0);

        assert_eq!(frame.opaque().len(), 1);
        assert_eq!(frame.transparent().len(), 1);
    }

    #[test]
    fn reset_clears_everything() {
        let (scene, solid, glass) = scene_with_blend_split();
        let mut frame = FrameRenderQueue::new();
        frame.add(&scene, solid, 0, 1.0);
        frame.add(&scene, glass, 0, 2.0);
        assert!(!frame.is_empty());

        frame.reset();
        assert!(frame.is_empty());
    }
}
