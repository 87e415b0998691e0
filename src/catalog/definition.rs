//! The metric definition model.
//!
//! Construction is the only validation point: the smart constructors on
//! [`MetricDefinition`] either return a valid definition or a definition
//! error. No definition observable from a catalog is ever invalid.

use crate::core::{Alias, Discriminator, Result, StatError, StatKind, StatisticId};
use crate::provider::StatisticRegistry;
use std::hash::{Hash, Hasher};

/// Arithmetic operator applied between derived-metric components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
}

impl Operator {
    /// Parses an operator from its symbol, if valid.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '*' => Some(Operator::Mul),
            _ => None,
        }
    }

    /// Returns the operator's symbol.
    pub fn as_symbol(&self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
        }
    }

    /// Applies the operator. Saturates at the i64 boundaries.
    pub fn apply(&self, lhs: i64, rhs: i64) -> i64 {
        match self {
            Operator::Add => lhs.saturating_add(rhs),
            Operator::Sub => lhs.saturating_sub(rhs),
            Operator::Mul => lhs.saturating_mul(rhs),
        }
    }
}

/// Reference to one raw counter of the statistic provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafRef {
    /// The statistic to query.
    pub statistic: StatisticId,
    /// Declared shape of the statistic; must match the intrinsic shape.
    pub kind: StatKind,
    /// Fixed discriminator for keyed statistics. `None` for untyped leaves
    /// and for the single leaf of a total definition.
    pub discriminator: Option<Discriminator>,
}

impl LeafRef {
    /// Creates an untyped leaf reference.
    pub fn untyped(statistic: impl Into<StatisticId>) -> Self {
        LeafRef {
            statistic: statistic.into(),
            kind: StatKind::Untyped,
            discriminator: None,
        }
    }

    /// Creates a keyed leaf reference with a fixed discriminator.
    pub fn keyed(statistic: impl Into<StatisticId>, discriminator: impl Into<Discriminator>) -> Self {
        LeafRef {
            statistic: statistic.into(),
            kind: StatKind::Keyed,
            discriminator: Some(discriminator.into()),
        }
    }

    /// Creates a keyed leaf reference without a discriminator, for use with
    /// the total flag.
    pub fn keyed_total(statistic: impl Into<StatisticId>) -> Self {
        LeafRef {
            statistic: statistic.into(),
            kind: StatKind::Keyed,
            discriminator: None,
        }
    }
}

/// One component of a derived metric: another metric plus the operator that
/// combines it into the running value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedRef {
    /// Alias of the metric this component refers to.
    pub alias_ref: Alias,
    /// Operator applied with this component's value. Ignored on the first
    /// component (it has no left operand).
    pub operator: Operator,
}

/// The two shapes a metric definition can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricKind {
    /// A sum of one or more raw counters.
    LeafSet {
        /// The leaves to sum, in declaration order.
        components: Vec<LeafRef>,
        /// Sum the single keyed leaf across its whole discriminator domain
        /// instead of one fixed discriminator.
        is_total: bool,
    },
    /// An arithmetic fold over the values of other metrics.
    Derived {
        /// The components to fold left-to-right, in declaration order.
        components: Vec<DerivedRef>,
    },
}

/// A named metric exposed to callers, identified by its unique alias.
///
/// Equality and hashing are by alias alone.
#[derive(Debug, Clone)]
pub struct MetricDefinition {
    alias: Alias,
    display_name: String,
    kind: MetricKind,
}

impl MetricDefinition {
    /// Builds a leaf-set definition, validating every component against the
    /// registry's intrinsic statistic kinds.
    pub fn leaf_set(
        alias: impl Into<Alias>,
        display_name: impl Into<String>,
        components: Vec<LeafRef>,
        is_total: bool,
        registry: &dyn StatisticRegistry,
    ) -> Result<Self> {
        let alias = alias.into();

        if components.is_empty() {
            return Err(StatError::EmptyComponentList {
                alias: alias.as_str().to_owned(),
            });
        }

        for leaf in &components {
            let intrinsic = registry.kind_of(&leaf.statistic).ok_or_else(|| {
                StatError::UnknownStatistic {
                    alias: alias.as_str().to_owned(),
                    statistic: leaf.statistic.as_str().to_owned(),
                }
            })?;
            if leaf.kind != intrinsic {
                return Err(StatError::TypeMismatch {
                    alias: alias.as_str().to_owned(),
                    statistic: leaf.statistic.as_str().to_owned(),
                    declared: leaf.kind,
                    intrinsic,
                });
            }
            if leaf.kind == StatKind::Untyped && leaf.discriminator.is_some() {
                return Err(StatError::TypeMismatch {
                    alias: alias.as_str().to_owned(),
                    statistic: leaf.statistic.as_str().to_owned(),
                    declared: StatKind::Keyed,
                    intrinsic: StatKind::Untyped,
                });
            }
            if leaf.kind == StatKind::Keyed && leaf.discriminator.is_none() && !is_total {
                return Err(StatError::MissingDiscriminator {
                    alias: alias.as_str().to_owned(),
                    statistic: leaf.statistic.as_str().to_owned(),
                });
            }
        }

        if is_total && (components.len() != 1 || components[0].kind != StatKind::Keyed) {
            return Err(StatError::InvalidTotalFlag {
                alias: alias.as_str().to_owned(),
            });
        }

        Ok(MetricDefinition {
            alias,
            display_name: display_name.into(),
            kind: MetricKind::LeafSet { components, is_total },
        })
    }

    /// Builds a derived definition from `(alias, operator-symbol)` pairs.
    pub fn derived(
        alias: impl Into<Alias>,
        display_name: impl Into<String>,
        components: Vec<(Alias, char)>,
    ) -> Result<Self> {
        let alias = alias.into();

        if components.is_empty() {
            return Err(StatError::EmptyComponentList {
                alias: alias.as_str().to_owned(),
            });
        }

        let components = components
            .into_iter()
            .map(|(alias_ref, symbol)| {
                let operator =
                    Operator::from_symbol(symbol).ok_or(StatError::InvalidOperator {
                        alias: alias.as_str().to_owned(),
                        symbol,
                    })?;
                Ok(DerivedRef { alias_ref, operator })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(MetricDefinition {
            alias,
            display_name: display_name.into(),
            kind: MetricKind::Derived { components },
        })
    }

    /// The unique alias of this metric (lowercase).
    pub fn alias(&self) -> &Alias {
        &self.alias
    }

    /// The user-facing display name. Cosmetic; not used by the engine.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The definition's shape.
    pub fn kind(&self) -> &MetricKind {
        &self.kind
    }

    /// Returns true if this is a derived definition.
    pub fn is_derived(&self) -> bool {
        matches!(self.kind, MetricKind::Derived { .. })
    }
}

impl PartialEq for MetricDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.alias == other.alias
    }
}

impl Eq for MetricDefinition {}

impl Hash for MetricDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.alias.hash(state);
    }
}
