//! ═══════════════════════════════════════════════════════════════════════════════
//! GENERATOR — Injected Hypothesis Source
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Hypothesis generation is a capability handed to the engine, not a call
//! baked into it. Production callers may wire a text-generation service;
//! the core ships a deterministic seeded stub and a null source so every
//! test runs offline. The engine tolerates empty batches and absorbs
//! source failures as recorded collaborator errors.
//! ═══════════════════════════════════════════════════════════════════════════════

use crate::error::FoamResult;
use crate::noise::{NoiseSource, Xorshift64};
use crate::state::{Hypothesis, HypothesisOrigin};

/// Context handed to a source for one batch request
#[derive(Debug, Clone)]
pub struct PromptContext<'a> {
    pub goal: &'a str,
    /// State entropy at request time; becomes base_entropy of the batch
    pub entropy: f64,
    /// Outer iteration index making the request
    pub outer_iteration: usize,
}

/// A generator of candidate hypotheses
pub trait HypothesisSource: Send {
    fn generate(&mut self, ctx: &PromptContext) -> FoamResult<Vec<Hypothesis>>;
}

/// Source that never produces anything. The engine must run fine on it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHypothesisSource;

impl HypothesisSource for NullHypothesisSource {
    fn generate(&mut self, _ctx: &PromptContext) -> FoamResult<Vec<Hypothesis>> {
        Ok(Vec::new())
    }
}

/// Deterministic seeded stub: a fixed-size batch per request, novelty and
/// risk drawn from a replayable generator, ids unique across the run.
#[derive(Debug, Clone)]
pub struct StubHypothesisSource {
    rng: Xorshift64,
    batch_size: usize,
    counter: u64,
}

impl StubHypothesisSource {
    pub fn new(seed: u64, batch_size: usize) -> Self {
        Self {
            rng: Xorshift64::new(seed),
            batch_size,
            counter: 0,
        }
    }
}

impl HypothesisSource for StubHypothesisSource {
    fn generate(&mut self, ctx: &PromptContext) -> FoamResult<Vec<Hypothesis>> {
        let mut batch = Vec::with_capacity(self.batch_size);
        for _ in 0..self.batch_size {
            self.counter += 1;
            let novelty = self.rng.next_unit();
            let risk = self.rng.next_unit();
            batch.push(Hypothesis::new(
                format!("hyp-{:04}", self.counter),
                format!("candidate {} for iteration {}", self.counter, ctx.outer_iteration),
                novelty,
                risk,
                HypothesisOrigin::Internal,
                ctx.entropy,
            ));
        }
        Ok(batch)
    }
}
