//! Batch characterization of independent nodes.
//!
//! Every [`StreamNode`] owns its model, so nodes share no simulator state and
//! can be characterized concurrently. With the `parallel` feature the batch
//! runs on a rayon pool; without it the same API runs sequentially.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::characterize::{CharacterizeOutcome, Characterizer};
use crate::error::SimResult;
use crate::node::StreamNode;
use crate::stats::{BatchStats, Timer};
use crate::types::Cycle;

/// Result of characterizing one node of a batch.
#[derive(Debug)]
pub struct NodeOutcome {
    /// Node name
    pub node: String,
    pub result: SimResult<CharacterizeOutcome>,
}

/// Characterizes a list of nodes for a common period.
#[derive(Debug)]
pub struct ParallelCharacterizer {
    characterizer: Characterizer,
    /// Number of worker threads (0 = rayon default)
    num_threads: usize,
    stats: RwLock<BatchStats>,
}

impl ParallelCharacterizer {
    /// Creates a batch characterizer.
    pub fn new(characterizer: Characterizer) -> Self {
        Self {
            characterizer,
            num_threads: 0,
            stats: RwLock::new(BatchStats::default()),
        }
    }

    /// Sets the number of worker threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = threads;
        self
    }

    /// Characterizes every node, returning one outcome per node in input order.
    ///
    /// A failing node does not stop the batch; its error is reported in its
    /// outcome and its characterization stays untouched.
    #[cfg(not(feature = "parallel"))]
    pub fn characterize_all(&self, nodes: &mut [StreamNode], period: Cycle) -> Vec<NodeOutcome> {
        let timer = Timer::start();
        let outcomes = nodes
            .iter_mut()
            .map(|node| self.characterize_one(node, period))
            .collect();
        self.finish(timer, nodes.len());
        outcomes
    }

    /// Characterizes every node, returning one outcome per node in input order.
    ///
    /// A failing node does not stop the batch; its error is reported in its
    /// outcome and its characterization stays untouched.
    #[cfg(feature = "parallel")]
    pub fn characterize_all(&self, nodes: &mut [StreamNode], period: Cycle) -> Vec<NodeOutcome> {
        if self.num_threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.num_threads)
                .build_global()
                .ok(); // Ignore if already configured
        }

        let timer = Timer::start();
        let outcomes = nodes
            .par_iter_mut()
            .map(|node| self.characterize_one(node, period))
            .collect();
        self.finish(timer, nodes.len());
        outcomes
    }

    fn characterize_one(&self, node: &mut StreamNode, period: Cycle) -> NodeOutcome {
        let result = self.characterizer.characterize(node, period, None);
        {
            let mut stats = self.stats.write();
            match &result {
                Ok(CharacterizeOutcome::Derived(report)) => {
                    stats.derived += 1;
                    stats.total_cycles += report.cycles;
                }
                Ok(CharacterizeOutcome::AlreadyCharacterized { .. }) => stats.skipped += 1,
                Err(err) => {
                    stats.failed += 1;
                    warn!("Characterization of {} failed: {}", node.name(), err);
                }
            }
        }
        NodeOutcome {
            node: node.name().to_string(),
            result,
        }
    }

    fn finish(&self, timer: Timer, count: usize) {
        let mut stats = self.stats.write();
        stats.wall_time_ms += timer.elapsed_ms();
        info!(
            "Characterized {} nodes: {} derived, {} skipped, {} failed",
            count, stats.derived, stats.skipped, stats.failed
        );
    }

    /// Returns the accumulated batch statistics.
    pub fn stats(&self) -> BatchStats {
        self.stats.read().clone()
    }

    /// Exports statistics as JSON.
    pub fn export_stats(&self) -> serde_json::Value {
        let stats = self.stats.read();
        serde_json::json!({
            "derived": stats.derived,
            "skipped": stats.skipped,
            "failed": stats.failed,
            "total_cycles": stats.total_cycles,
            "wall_time_ms": stats.wall_time_ms,
            "threads": self.num_threads,
            "parallel": cfg!(feature = "parallel"),
        })
    }
}

impl Default for ParallelCharacterizer {
    fn default() -> Self {
        Self::new(Characterizer::default())
    }
}

/// Characterizes every node with default settings.
pub fn characterize_all(nodes: &mut [StreamNode], period: Cycle) -> Vec<NodeOutcome> {
    ParallelCharacterizer::default().characterize_all(nodes, period)
}
