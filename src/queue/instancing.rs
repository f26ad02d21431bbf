use std::collections::HashMap;

use crate::handle::{Handle, Store};
use crate::pipeline::{PipelineQuery, PipelineStateCache, PipelineStateId};
use crate::record::{DescriptorSlot, RecordStats, RecordingContext, UploadContext};
use crate::scene::{
    BufferId, DescriptorSetId, InputAssemblerId, InputLayoutId, MaterialPass, RenderPassId,
    RenderScene, ShaderId,
};
use crate::settings::QueueSettings;

pub const DEFAULT_INSTANCE_CAPACITY: u32 = 128;

/// Batches with the same identity merge; everything in one batch is drawn
/// with one pipeline-state family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchIdentity {
    pub pass: Handle<MaterialPass>,
    pub shader: ShaderId,
    pub layout: InputLayoutId,
}

/// Per-geometry slice of a batch: the packed instance stream headed for
/// one GPU-visible buffer.
pub struct InstanceRecord {
    pub input_assembler: InputAssemblerId,
    pub descriptor_set: DescriptorSetId,
    pub buffer: BufferId,
    pub stride: u32,
    pub capacity: u32,
    pub count: u32,
    data: Vec<u8>,
}

impl InstanceRecord {
    /// Bytes accepted this frame; always `count * stride` long.
    pub fn pending_bytes(&self) -> &[u8] {
        debug_assert_eq!(self.data.len(), (self.count * self.stride) as usize);
        &self.data
    }
}

/// Accumulates per-instance data for one (pass, shader, layout) identity.
/// Batches live in an `InstanceBatchStore` and are reused across frames;
/// `clear_pending` drops the frame's instances but keeps allocations.
pub struct InstanceBatch {
    identity: BatchIdentity,
    records: Vec<InstanceRecord>,
    pub dynamic_offsets: Vec<u32>,
    capacity: u32,
    dropped: u32,
}

impl InstanceBatch {
    pub fn new(identity: BatchIdentity, capacity: u32) -> Self {
        Self {
            identity,
            records: Vec::new(),
            dynamic_offsets: Vec::new(),
            capacity,
            dropped: 0,
        }
    }

    pub fn identity(&self) -> BatchIdentity {
        self.identity
    }

    pub fn records(&self) -> &[InstanceRecord] {
        &self.records
    }

    /// Instances dropped this frame because a record hit capacity.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Submit one instance. Finds the record keyed by (input assembler,
    /// descriptor set) or starts a new one whose stride is this
    /// submission's byte length. A record at capacity drops the instance
    /// deterministically instead of failing the frame.
    pub fn merge(
        &mut self,
        input_assembler: InputAssemblerId,
        descriptor_set: DescriptorSetId,
        buffer: BufferId,
        data: &[u8],
    ) {
        if self.capacity == 0 {
            self.dropped += 1;
            return;
        }

        if let Some(record) = self
            .records
            .iter_mut()
            .find(|r| r.input_assembler == input_assembler && r.descriptor_set == descriptor_set)
        {
            if record.count == record.capacity {
                self.dropped += 1;
                return;
            }
            debug_assert_eq!(
                data.len(),
                record.stride as usize,
                "instance stride changed within a record"
            );
            record.data.extend_from_slice(data);
            record.count += 1;
        } else {
            self.records.push(InstanceRecord {
                input_assembler,
                descriptor_set,
                buffer,
                stride: data.len() as u32,
                capacity: self.capacity,
                count: 1,
                data: data.to_vec(),
            });
        }
    }

    /// `merge` for a typed instance payload.
    pub fn merge_pod<T: bytemuck::Pod>(
        &mut self,
        input_assembler: InputAssemblerId,
        descriptor_set: DescriptorSetId,
        buffer: BufferId,
        value: &T,
    ) {
        self.merge(input_assembler, descriptor_set, buffer, bytemuck::bytes_of(value));
    }

    pub fn has_pending_work(&self) -> bool {
        self.records.iter().any(|r| r.count > 0)
    }

    /// Write every non-empty record's packed instance bytes to its target
    /// buffer. All uploads for a frame happen before any draw is recorded.
    pub fn upload_pending(&self, ctx: &mut dyn UploadContext) {
        for record in &self.records {
            if record.count == 0 {
                continue;
            }
            ctx.write_buffer(record.buffer, 0, record.pending_bytes());
        }
    }

    /// Drop the frame's instances but keep record slots and their
    /// allocations for reuse next frame.
    pub fn clear_pending(&mut self) {
        for record in &mut self.records {
            record.count = 0;
            record.data.clear();
        }
        self.dropped = 0;
    }
}

/// Persistent registry of instance batches, keyed by identity. Acquiring
/// an identity twice returns the same batch, so repeated submissions merge
/// instead of duplicating.
pub struct InstanceBatchStore {
    batches: Store<InstanceBatch>,
    lookup: HashMap<BatchIdentity, Handle<InstanceBatch>>,
    default_capacity: u32,
}

impl Default for InstanceBatchStore {
    fn default() -> Self {
        Self::new(DEFAULT_INSTANCE_CAPACITY)
    }
}

impl InstanceBatchStore {
    pub fn new(default_capacity: u32) -> Self {
        Self {
            batches: Store::default(),
            lookup: HashMap::new(),
            default_capacity,
        }
    }

    pub fn with_settings(settings: &QueueSettings) -> Self {
        Self::new(settings.instance_capacity)
    }

    /// Get the batch for `identity`, creating it on first sight.
    pub fn acquire(&mut self, identity: BatchIdentity) -> Handle<InstanceBatch> {
        if let Some(&handle) = self.lookup.get(&identity) {
            return handle;
        }
        let handle = self
            .batches
            .insert(InstanceBatch::new(identity, self.default_capacity));
        self.lookup.insert(identity, handle);
        handle
    }

    pub fn get(&self, h: Handle<InstanceBatch>) -> &InstanceBatch {
        self.batches.get(h).expect("dead instance batch handle")
    }

    pub fn get_mut(&mut self, h: Handle<InstanceBatch>) -> &mut InstanceBatch {
        self.batches.get_mut(h).expect("dead instance batch handle")
    }

    /// Frame-end sweep: clear every batch's pending instances.
    pub fn clear_pending(&mut self) {
        for batch in self.batches.iter_mut() {
            batch.clear_pending();
        }
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

/// Per-frame aggregator: deduplicates batch submissions and finalizes a
/// deterministic replay order.
#[derive(Default)]
pub struct InstancingQueue {
    pending: HashMap<Handle<InstanceBatch>, u32>,
    sorted: Vec<Handle<InstanceBatch>>,
}

impl InstancingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a batch for this frame. Re-adding the same handle is a
    /// no-op; the first insertion fixes its place in the replay order.
    pub fn add(&mut self, batch: Handle<InstanceBatch>) {
        let next = self.pending.len() as u32;
        self.pending.entry(batch).or_insert(next);
    }

    fn ordered_handles(&self) -> Vec<Handle<InstanceBatch>> {
        let mut entries: Vec<(Handle<InstanceBatch>, u32)> =
            self.pending.iter().map(|(&h, &idx)| (h, idx)).collect();
        entries.sort_unstable_by_key(|&(_, idx)| idx);
        entries.into_iter().map(|(h, _)| h).collect()
    }

    /// Finalize the submission order: ascending first-insertion index.
    /// Deterministic for identical submission sequences; hash-map
    /// iteration order is never observed. Idempotent.
    pub fn sort(&mut self) {
        self.sorted = self.ordered_handles();
    }

    /// The finalized sequence. Empty before `sort`.
    pub fn batches(&self) -> &[Handle<InstanceBatch>] {
        &self.sorted
    }

    /// Upload accumulated instance data for every batch with pending work.
    /// Iterates the same deterministic order as `sort`, independent of
    /// whether `sort` ran yet.
    pub fn upload_pending(&self, store: &InstanceBatchStore, ctx: &mut dyn UploadContext) {
        for handle in self.ordered_handles() {
            let batch = store.get(handle);
            if batch.has_pending_work() {
                batch.upload_pending(ctx);
            }
        }
    }

    /// Replay every pending batch: the material set binds once per batch,
    /// pipeline state rebinds only when it differs from the previous bind,
    /// zero-count records are skipped entirely.
    ///
    /// `global_set` optionally binds a shared set at one dynamic offset;
    /// caller-supplied `dynamic_offsets` take precedence over each batch's
    /// own when binding local sets.
    #[allow(clippy::too_many_arguments)]
    pub fn record_commands(
        &self,
        scene: &RenderScene,
        store: &InstanceBatchStore,
        cache: &mut PipelineStateCache,
        render_pass: RenderPassId,
        subpass: u32,
        rec: &mut dyn RecordingContext,
        global_set: Option<(DescriptorSetId, u32)>,
        dynamic_offsets: Option<&[u32]>,
    ) -> RecordStats {
        let mut stats = RecordStats::default();

        for &handle in &self.sorted {
            let batch = store.get(handle);
            if !batch.has_pending_work() {
                continue;
            }

            let identity = batch.identity();
            let pass = scene.pass(identity.pass);
            rec.bind_descriptor_set(DescriptorSlot::Material, pass.descriptor_set, &[]);

            // Previous-bind state is local to this replay, never carried
            // across batches or frames.
            let mut last_pipeline: Option<PipelineStateId> = None;

            for record in batch.records() {
                if record.count == 0 {
                    continue;
                }

                let pso = cache.acquire_or_create(PipelineQuery {
                    pass: identity.pass,
                    shader: identity.shader,
                    input_assembler: record.input_assembler,
                    render_pass,
                    subpass,
                });

                if last_pipeline != Some(pso) {
                    rec.bind_pipeline_state(pso);
                    last_pipeline = Some(pso);
                    stats.pipeline_binds += 1;
                } else {
                    stats.binds_elided += 1;
                }

                if let Some((set, offset)) = global_set {
                    rec.bind_descriptor_set(DescriptorSlot::Global, set, &[offset]);
                }

                let offsets = dynamic_offsets.unwrap_or(&batch.dynamic_offsets);
                rec.bind_descriptor_set(DescriptorSlot::Local, record.descriptor_set, offsets);

                rec.bind_input_assembler(record.input_assembler);
                rec.draw(record.input_assembler, 0..record.count);

                stats.draw_calls += 1;
                stats.instances += record.count;
            }
        }

        stats
    }

    /// Forget this frame's submissions. Batch contents are the store's
    /// concern, not the aggregator's.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.sorted.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(shader: u32) -> BatchIdentity {
        BatchIdentity {
            pass: Handle::new(0),
            shader: ShaderId(shader),
            layout: InputLayoutId(0),
        }
    }

    #[test]
    fn acquire_merges_identical_identities() {
        let mut store = InstanceBatchStore::default();
        let a = store.acquire(identity(1));
        let b = store.acquire(identity(1));
        let c = store.acquire(identity(2));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn add_deduplicates_and_keeps_first_insertion_order() {
        let mut store = InstanceBatchStore::default();
        let p = store.acquire(identity(1));
        let q = store.acquire(identity(2));

        let mut queue = InstancingQueue::new();
        queue.add(p);
        queue.add(q);
        queue.add(p);
        queue.add(p);

        queue.sort();
        assert_eq!(queue.batches(), &[p, q]);
    }

    #[test]
    fn merge_clamps_at_capacity() {
        let mut batch = InstanceBatch::new(identity(1), 2);
        let ia = InputAssemblerId(0);
        let ds = DescriptorSetId(0);
        let buf = BufferId(0);

        batch.merge(ia, ds, buf, &[1, 2, 3, 4]);
        batch.merge(ia, ds, buf, &[5, 6, 7, 8]);
        batch.merge(ia, ds, buf, &[9, 9, 9, 9]);

        let record = &batch.records()[0];
        assert_eq!(record.count, 2);
        assert_eq!(record.pending_bytes(), &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(batch.dropped(), 1);
    }

    #[test]
    fn clear_pending_keeps_record_slots() {
        let mut batch = InstanceBatch::new(identity(1), 4);
        batch.merge(InputAssemblerId(0), DescriptorSetId(0), BufferId(0), &[0u8; 8]);
        assert!(batch.has_pending_work());

        batch.clear_pending();
        assert!(!batch.has_pending_work());
        assert_eq!(batch.records().len(), 1);
        assert_eq!(batch.dropped(), 0);
    }

    #[test]
    fn merge_pod_packs_bytes() {
        #[repr(C)]
        #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
        struct Xform {
            row: [f32; 4],
        }

        let mut batch = InstanceBatch::new(identity(1), 4);
        batch.merge_pod(
            InputAssemblerId(0),
            DescriptorSetId(0),
            BufferId(0),
            &Xform {
                row: [1.0, 2.0, 3.0, 4.0],
            },
        );

        let record = &batch.records()[0];
        assert_eq!(record.stride, 16);
        assert_eq!(record.count, 1);
    }
}
