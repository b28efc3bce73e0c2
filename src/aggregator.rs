//! Risk aggregation over the two-level threat tree.
//!
//! Each immediate child of the root is reduced to a monetary total and an
//! occurrence probability. Leaves of a branch are treated as independent
//! events: their probabilities multiply, their amounts add up. The root is
//! then summarized as the sum of the totals and the mean of the
//! probabilities.

use crate::errors::{AttackTreeError, AttackTreeResult};
use crate::models::{MonetaryAmount, ThreatId, ThreatNode};

/// Aggregated risk of one immediate child of the root.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedBranch {
    pub id: ThreatId,
    pub name: String,
    pub monetary_total: MonetaryAmount,
    /// Rounded to the aggregator's precision
    pub probability: f64,
}

/// Aggregated risk of the whole tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RootAggregate {
    pub total_monetary_amount: MonetaryAmount,
    pub overall_probability: f64,
}

/// Largest precision for which `10^precision` and the scaled products stay exact.
pub const MAX_PRECISION: u32 = 15;

#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    precision: u32,
}

impl Aggregator {
    pub fn new(precision: u32) -> AttackTreeResult<Self> {
        if precision > MAX_PRECISION {
            return Err(AttackTreeError::InvalidConfig(format!(
                "precision {} is above the supported maximum of {}",
                precision, MAX_PRECISION
            )));
        }
        Ok(Self { precision })
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Round a probability to the configured number of decimal digits.
    pub fn round_probability(&self, probability: f64) -> f64 {
        round_to(probability, self.precision)
    }

    /// Reduce one immediate child of the root.
    ///
    /// A branch yields the sum of its leaves' amounts and the rounded product
    /// of their probabilities. A leaf yields its own data with the probability
    /// rounded. Grandchildren that have children of their own are rejected.
    pub fn aggregate_branch(&self, node: &ThreatNode) -> AttackTreeResult<AggregatedBranch> {
        let (monetary_total, probability) = if node.is_branch() {
            let mut probability = 1.0;
            let mut total = MonetaryAmount::zero();
            for leaf in node.children() {
                if leaf.is_branch() {
                    return Err(AttackTreeError::UnsupportedDepth { id: leaf.id });
                }
                let (amount, leaf_probability) = leaf.leaf_data()?;
                probability *= leaf_probability;
                total = total + amount;
            }
            (total, probability)
        } else {
            node.leaf_data()?
        };

        Ok(AggregatedBranch {
            id: node.id,
            name: node.name.clone(),
            monetary_total,
            probability: self.round_probability(probability),
        })
    }

    /// Aggregate every immediate child, keeping input order.
    pub fn aggregate_branches(&self, children: &[ThreatNode]) -> AttackTreeResult<Vec<AggregatedBranch>> {
        children.iter().map(|c| self.aggregate_branch(c)).collect()
    }

    /// Parallel `(monetary totals, probabilities)` for the immediate children.
    /// An empty slice gives an empty pair.
    pub fn aggregate_children(
        &self,
        children: &[ThreatNode],
    ) -> AttackTreeResult<(Vec<MonetaryAmount>, Vec<f64>)> {
        let branches = self.aggregate_branches(children)?;
        Ok(branches
            .into_iter()
            .map(|b| (b.monetary_total, b.probability))
            .unzip())
    }

    /// Sum of the branch totals and rounded mean of the branch probabilities.
    pub fn aggregate_root(&self, branches: &[AggregatedBranch]) -> AttackTreeResult<RootAggregate> {
        if branches.is_empty() {
            return Err(AttackTreeError::EmptyChildren);
        }

        let total_monetary_amount = branches.iter().map(|b| b.monetary_total).sum();
        let mean = branches.iter().map(|b| b.probability).sum::<f64>() / branches.len() as f64;

        Ok(RootAggregate {
            total_monetary_amount,
            overall_probability: self.round_probability(mean),
        })
    }
}

/// Round `value` to `decimals` decimal digits, ties to even.
///
/// Ties are decided on the exact binary value: 0.125 is a true tie and
/// gives 0.12, while 0.385 sits just above its tie and gives 0.39.
/// `decimals` must not exceed [`MAX_PRECISION`].
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals.min(MAX_PRECISION) as i32);
    let scaled = value * factor;
    // Exact residue of the product
    let error = value.mul_add(factor, -scaled);
    let floor = scaled.floor();

    let rounded = if scaled - floor == 0.5 {
        if error > 0.0 {
            floor + 1.0
        } else if error < 0.0 || floor % 2.0 == 0.0 {
            floor
        } else {
            floor + 1.0
        }
    } else {
        scaled.round()
    };
    rounded / factor
}
