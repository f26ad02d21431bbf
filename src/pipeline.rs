// Pipeline-state cache collaborator. The scheduler only looks up or
// creates; eviction and the backing GPU objects belong to the engine.
use std::collections::HashMap;

use crate::handle::Handle;
use crate::scene::{InputAssemblerId, MaterialPass, RenderPassId, ShaderId};

/// Everything that selects one pipeline-state object: shading state plus
/// the pass/subpass the commands are recorded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineQuery {
    pub pass: Handle<MaterialPass>,
    pub shader: ShaderId,
    pub input_assembler: InputAssemblerId,
    pub render_pass: RenderPassId,
    pub subpass: u32,
}

/// Handle to a cached pipeline-state object. Ids are dense and assigned in
/// creation order, so identical acquire sequences yield identical ids
/// across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PipelineStateId(pub u32);

#[derive(Default)]
pub struct PipelineStateCache {
    states: HashMap<PipelineQuery, PipelineStateId>,
}

impl PipelineStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the pipeline state for `query`, creating a new entry on
    /// first sight. Idempotent for identical queries, within and across
    /// frames.
    pub fn acquire_or_create(&mut self, query: PipelineQuery) -> PipelineStateId {
        let next = PipelineStateId(self.states.len() as u32);
        let id = *self.states.entry(query).or_insert_with(|| {
            log::debug!("pipeline cache grew to {} states", next.0 + 1);
            next
        });
        id
    }

    pub fn contains(&self, query: &PipelineQuery) -> bool {
        self.states.contains_key(query)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(shader: u32, ia: u32) -> PipelineQuery {
        PipelineQuery {
            pass: Handle::new(0),
            shader: ShaderId(shader),
            input_assembler: InputAssemblerId(ia),
            render_pass: RenderPassId(0),
            subpass: 0,
        }
    }

    #[test]
    fn acquire_is_idempotent() {
        let mut cache = PipelineStateCache::new();
        let first = cache.acquire_or_create(query(1, 1));
        let second = cache.acquire_or_create(query(1, 1));
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_queries_get_distinct_ids() {
        let mut cache = PipelineStateCache::new();
        let a = cache.acquire_or_create(query(1, 1));
        let b = cache.acquire_or_create(query(2, 1));
        let c = cache.acquire_or_create(query(1, 2));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn ids_follow_creation_order() {
        let mut cache = PipelineStateCache::new();
        assert_eq!(cache.acquire_or_create(query(7, 0)), PipelineStateId(0));
        assert_eq!(cache.acquire_or_create(query(8, 0)), PipelineStateId(1));
        // Re-acquiring the first query keeps its original id.
        assert_eq!(cache.acquire_or_create(query(7, 0)), PipelineStateId(0));
    }
}
