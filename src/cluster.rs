//! ═══════════════════════════════════════════════════════════════════════════════
//! CLUSTER — Hypothesis Affinity Clustering
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Builds coherence clusters over the hypothesis pool. Two hypotheses are
//! linked when their pairwise affinity reaches the configured threshold;
//! clusters are the connected components of that graph.
//!
//! Selection is fully deterministic: best coherence wins, ties broken by
//! larger member count, then smaller diameter, then earliest insertion.
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};

use crate::config::ClusterParams;
use crate::state::Hypothesis;
use crate::stats::float_cmp;

/// Transient result of cluster detection. Lives only for the evaluation
/// that produced it; never persisted beyond the step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalCluster {
    pub hypotheses: Vec<Hypothesis>,
    /// Mean pairwise affinity of the members
    pub coherence: f64,
    /// Largest pairwise distance between members
    pub diameter: f64,
}

/// Pairwise distance: mean of the novelty gap, the risk gap, and the
/// injection-entropy gap normalized by the entropy ceiling.
fn distance(a: &Hypothesis, b: &Hypothesis, entropy_ceiling: f64) -> f64 {
    let entropy_gap = (a.base_entropy - b.base_entropy).abs() / entropy_ceiling.max(1e-9);
    ((a.novelty - b.novelty).abs() + (a.risk - b.risk).abs() + entropy_gap) / 3.0
}

fn affinity(a: &Hypothesis, b: &Hypothesis, entropy_ceiling: f64) -> f64 {
    1.0 - distance(a, b, entropy_ceiling)
}

/// All clusters over the pool, in order of their earliest member.
pub fn clusters(
    hypotheses: &[Hypothesis],
    params: &ClusterParams,
    entropy_ceiling: f64,
) -> Vec<CriticalCluster> {
    let n = hypotheses.len();
    if n == 0 {
        return Vec::new();
    }

    // Union-find over edge pairs at or above the affinity threshold
    let mut parent: Vec<usize> = (0..n).collect();
    fn root(parent: &mut Vec<usize>, mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }
    for i in 0..n {
        for j in (i + 1)..n {
            if affinity(&hypotheses[i], &hypotheses[j], entropy_ceiling)
                >= params.coherence_threshold
            {
                let (ri, rj) = (root(&mut parent, i), root(&mut parent, j));
                if ri != rj {
                    // Attach the later root under the earlier one so component
                    // ids stay in insertion order
                    let (lo, hi) = if ri < rj { (ri, rj) } else { (rj, ri) };
                    parent[hi] = lo;
                }
            }
        }
    }

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n {
        let r = root(&mut parent, i);
        members[r].push(i);
    }

    members
        .into_iter()
        .filter(|m| !m.is_empty())
        .map(|m| build_cluster(hypotheses, &m, params, entropy_ceiling))
        .collect()
}

fn build_cluster(
    hypotheses: &[Hypothesis],
    member_indices: &[usize],
    params: &ClusterParams,
    entropy_ceiling: f64,
) -> CriticalCluster {
    let members: Vec<Hypothesis> = member_indices
        .iter()
        .map(|&i| hypotheses[i].clone())
        .collect();

    if members.len() == 1 {
        return CriticalCluster {
            hypotheses: members,
            coherence: params.singleton_coherence,
            diameter: 0.0,
        };
    }

    let mut affinity_sum = 0.0;
    let mut pairs = 0usize;
    let mut diameter: f64 = 0.0;
    for i in 0..members.len() {
        for j in (i + 1)..members.len() {
            let d = distance(&members[i], &members[j], entropy_ceiling);
            affinity_sum += 1.0 - d;
            diameter = diameter.max(d);
            pairs += 1;
        }
    }

    CriticalCluster {
        hypotheses: members,
        coherence: affinity_sum / pairs as f64,
        diameter,
    }
}

/// The best cluster under the deterministic ordering, or None for an
/// empty pool.
pub fn best_cluster(
    hypotheses: &[Hypothesis],
    params: &ClusterParams,
    entropy_ceiling: f64,
) -> Option<CriticalCluster> {
    let mut all = clusters(hypotheses, params, entropy_ceiling);
    if all.is_empty() {
        return None;
    }
    // `clusters` yields components in earliest-member order, so a stable
    // max-by keeps the earliest on full ties
    all.sort_by(|a, b| {
        float_cmp(&b.coherence, &a.coherence)
            .then(b.hypotheses.len().cmp(&a.hypotheses.len()))
            .then(float_cmp(&a.diameter, &b.diameter))
    });
    all.into_iter().next()
}

/// Best coherence over the pool; 0.0 when no hypotheses exist.
pub fn best_coherence(
    hypotheses: &[Hypothesis],
    params: &ClusterParams,
    entropy_ceiling: f64,
) -> f64 {
    best_cluster(hypotheses, params, entropy_ceiling)
        .map(|c| c.coherence)
        .unwrap_or(0.0)
}
