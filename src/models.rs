use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

use crate::errors::{AttackTreeError, AttackTreeResult};

/// Identifier of a threat inside a catalog.
pub type ThreatId = u64;

/// Monetary impact of a threat, keeping the numeric kind it was written with
/// so labels show `1800` for integer catalogs and `1800.5` for decimal ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MonetaryAmount {
    Integer(i64),
    Decimal(f64),
}

impl MonetaryAmount {
    pub fn zero() -> Self {
        MonetaryAmount::Integer(0)
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            MonetaryAmount::Integer(v) => v as f64,
            MonetaryAmount::Decimal(v) => v,
        }
    }
}

impl Add for MonetaryAmount {
    type Output = MonetaryAmount;

    fn add(self, rhs: MonetaryAmount) -> MonetaryAmount {
        match (self, rhs) {
            (MonetaryAmount::Integer(a), MonetaryAmount::Integer(b)) => match a.checked_add(b) {
                Some(sum) => MonetaryAmount::Integer(sum),
                None => MonetaryAmount::Decimal(a as f64 + b as f64),
            },
            (a, b) => MonetaryAmount::Decimal(a.as_f64() + b.as_f64()),
        }
    }
}

impl std::iter::Sum for MonetaryAmount {
    fn sum<I: Iterator<Item = MonetaryAmount>>(iter: I) -> Self {
        iter.fold(MonetaryAmount::zero(), |acc, amount| acc + amount)
    }
}

impl From<i64> for MonetaryAmount {
    fn from(value: i64) -> Self {
        MonetaryAmount::Integer(value)
    }
}

impl From<f64> for MonetaryAmount {
    fn from(value: f64) -> Self {
        MonetaryAmount::Decimal(value)
    }
}

impl fmt::Display for MonetaryAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MonetaryAmount::Integer(v) => write!(f, "{}", v),
            // Integral decimals keep a trailing ".0" so they never read as integers
            MonetaryAmount::Decimal(v) if v.is_finite() && v.fract() == 0.0 => {
                write!(f, "{:.1}", v)
            }
            MonetaryAmount::Decimal(v) => write!(f, "{}", v),
        }
    }
}

/// A security threat. Branches carry `has_children`, leaves carry
/// `probability` and `monetary_amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatNode {
    pub id: ThreatId,
    pub name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monetary_amount: Option<MonetaryAmount>,
    #[serde(
        default,
        rename = "has_children",
        alias = "children",
        skip_serializing_if = "Option::is_none"
    )]
    pub children: Option<Vec<ThreatNode>>,
}

impl ThreatNode {
    pub fn leaf(
        id: ThreatId,
        name: impl Into<String>,
        category: impl Into<String>,
        probability: f64,
        monetary_amount: impl Into<MonetaryAmount>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category: category.into(),
            probability: Some(probability),
            monetary_amount: Some(monetary_amount.into()),
            children: None,
        }
    }

    pub fn branch(
        id: ThreatId,
        name: impl Into<String>,
        category: impl Into<String>,
        children: Vec<ThreatNode>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category: category.into(),
            probability: None,
            monetary_amount: None,
            children: Some(children),
        }
    }

    /// Children of this threat, empty for leaves.
    pub fn children(&self) -> &[ThreatNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// A threat is a branch only when it has at least one child.
    pub fn is_branch(&self) -> bool {
        !self.children().is_empty()
    }

    /// Directly stated `(monetary_amount, probability)` of a leaf.
    pub fn leaf_data(&self) -> AttackTreeResult<(MonetaryAmount, f64)> {
        let (amount, probability) = match (self.monetary_amount, self.probability) {
            (Some(amount), Some(probability)) => (amount, probability),
            (None, None) => {
                return Err(AttackTreeError::malformed(
                    self.id,
                    "has neither children nor probability/monetary_amount",
                ))
            }
            (None, Some(_)) => {
                return Err(AttackTreeError::malformed(self.id, "missing monetary_amount"))
            }
            (Some(_), None) => {
                return Err(AttackTreeError::malformed(self.id, "missing probability"))
            }
        };

        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(AttackTreeError::malformed(
                self.id,
                format!("probability {} is outside [0, 1]", probability),
            ));
        }
        if !amount.as_f64().is_finite() {
            return Err(AttackTreeError::malformed(self.id, "monetary_amount is not finite"));
        }

        Ok((amount, probability))
    }
}
