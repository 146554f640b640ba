// External crates
use anyhow::{bail, Error, Result};
use dashmap::DashMap;

// Standard library
use std::sync::Arc;

/// Binomial coefficient C(n, m), multiplicative form over the smaller of m
/// and n - m.
pub fn binomial(n: usize, m: usize) -> f64 {
    let small = m.min(n - m);
    let large = n - small;
    let mut c = 1.0f64;
    for i in 0..small {
        c = c * (large + 1 + i) as f64 / (i + 1) as f64;
    }
    c
}

/// Feasible range for the number of masked positions of an n-item password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskPlan {
    pub min_masked: usize,
    pub max_masked: usize,
}

/// Per-item-count cumulative distributions over the masked-position count,
/// built at most once per item count per run.
///
/// The cache is shared across length groups, but groups have disjoint item
/// counts by construction of the reader's grouping, so concurrent workers
/// never contend on a key.
pub struct ProbCache {
    p: f64,
    min_visible: usize,
    min_masked: usize,
    cache: DashMap<usize, Arc<Vec<f64>>>,
}

impl ProbCache {
    pub fn new(p: f64, min_visible: usize, min_masked: usize) -> Self {
        Self {
            p,
            min_visible,
            min_masked,
            cache: DashMap::new(),
        }
    }

    /// Shortest password that can satisfy both visibility constraints.
    pub fn required_items(&self) -> usize {
        self.min_visible + self.min_masked
    }

    /// The feasible masked-position range for an n-item password, or None if
    /// no m can satisfy both constraints.
    pub fn plan(&self, n: usize) -> Option<MaskPlan> {
        let max_masked = n.checked_sub(self.min_visible)?;
        if max_masked < self.min_masked {
            return None;
        }
        Some(MaskPlan {
            min_masked: self.min_masked,
            max_masked,
        })
    }

    /// Cumulative probabilities over m in [min_masked, max_masked] for item
    /// count n: a truncated, renormalized binomial over "how many positions
    /// get masked". Monotonically non-decreasing, final element 1.0.
    pub fn cumulative(&self, n: usize) -> Result<Arc<Vec<f64>>, Error> {
        if let Some(entry) = self.cache.get(&n) {
            return Ok(entry.value().clone());
        }
        let plan = match self.plan(n) {
            Some(plan) => plan,
            None => bail!(
                "no feasible masked-position count for {}-item passwords (min_visible = {}, min_masked = {})",
                n,
                self.min_visible,
                self.min_masked
            ),
        };

        let mut cumulative = Vec::with_capacity(plan.max_masked - plan.min_masked + 1);
        let mut total = 0.0f64;
        for m in plan.min_masked..=plan.max_masked {
            let weight =
                binomial(n, m) * self.p.powi(m as i32) * (1.0 - self.p).powi((n - m) as i32);
            total += weight;
            cumulative.push(total);
        }
        if total <= 0.0 {
            // p at an extreme with constraints that zero out every feasible m;
            // config validation rejects these up front
            bail!(
                "degenerate masking distribution for {}-item passwords (p = {})",
                n,
                self.p
            );
        }
        let cumulative: Vec<f64> = cumulative.into_iter().map(|c| c / total).collect();

        let cumulative = Arc::new(cumulative);
        self.cache.insert(n, cumulative.clone());
        Ok(cumulative)
    }
}
