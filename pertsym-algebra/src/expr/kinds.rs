//! Payloads of the tagged and chemistry-specific node kinds.

use crate::perturbation::{Dependencies, Derivatives, Perturbation};
use std::fmt;
use super::Node;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Writes `name` followed by `^(derivatives)` if there are any.
fn write_tagged(f: &mut fmt::Formatter<'_>, name: &str, derivatives: &Derivatives) -> fmt::Result {
    if derivatives.is_empty() {
        write!(f, "{}", name)
    } else {
        write!(f, "{}^({})", name, derivatives)
    }
}

/// Writes a comma-separated argument list.
fn write_args(f: &mut fmt::Formatter<'_>, args: &[Node]) -> fmt::Result {
    let mut iter = args.iter();
    if let Some(arg) = iter.next() {
        write!(f, "{}", arg)?;
        for arg in iter {
            write!(f, ", {}", arg)?;
        }
    }
    Ok(())
}

/// A state-like matrix symbol: a one-electron density or a Lagrangian multiplier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct State {
    pub name: String,
    pub derivatives: Derivatives,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), derivatives: Derivatives::new() }
    }

    /// Returns the state differentiated once more by the given perturbation.
    pub fn differentiate(&self, perturbation: Perturbation) -> Self {
        Self { name: self.name.clone(), derivatives: self.derivatives.clone().with(perturbation) }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tagged(f, &self.name, &self.derivatives)
    }
}

/// A symbol that depends on a set of perturbations: a one-electron operator, a non-electron
/// function, or the time-derivative overlap operator.
///
/// Two-electron operators and energies embed one of these for their integrals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Operator {
    pub name: String,

    /// The perturbations the symbol depends on. Derivatives with respect to any other
    /// perturbation vanish.
    pub dependencies: Dependencies,

    pub derivatives: Derivatives,
}

impl Operator {
    pub fn new(name: impl Into<String>, dependencies: Dependencies) -> Self {
        Self { name: name.into(), dependencies, derivatives: Derivatives::new() }
    }

    /// Returns the operator differentiated once more by the given perturbation.
    pub fn differentiate(&self, perturbation: Perturbation) -> Self {
        Self {
            name: self.name.clone(),
            dependencies: self.dependencies.clone(),
            derivatives: self.derivatives.clone().with(perturbation),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tagged(f, &self.name, &self.derivatives)
    }
}

/// A two-electron operator `G(D)`, built from the two-electron integrals and a state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TwoElecOperator {
    /// The two-electron integrals.
    pub integrals: Operator,

    /// The (matrix-valued) state contracted with the integrals.
    pub state: Node,
}

impl fmt::Display for TwoElecOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.integrals, self.state)
    }
}

/// A two-electron energy `E(D_inner, D_outer)`, bilinear in its two states.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TwoElecEnergy {
    pub integrals: Operator,
    pub inner: Node,
    pub outer: Node,
}

impl fmt::Display for TwoElecEnergy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {})", self.integrals, self.inner, self.outer)
    }
}

/// A named function of a single inner expression, such as `f(g(x))`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompositeFunction {
    pub name: String,
    pub inner: Node,
}

impl fmt::Display for CompositeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.inner)
    }
}

/// A named function with an ordered argument list.
///
/// Used for exchange-correlation energies and potentials, and for generic uninterpreted
/// functions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Functional {
    pub name: String,
    pub args: Vec<Node>,
}

impl fmt::Display for Functional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        write_args(f, &self.args)?;
        write!(f, ")")
    }
}

/// Which side of an inner product a time-derivative operator acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TemporumType {
    Bra,
    Ket,
}

/// The time-derivative operator `i d/dt` applied to a target expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Temporum {
    pub target: Node,
    pub kind: TemporumType,
}

impl fmt::Display for Temporum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TemporumType::Bra => write!(f, "dt_bra({})", self.target),
            TemporumType::Ket => write!(f, "dt_ket({})", self.target),
        }
    }
}

/// The derivative of a matrix symbol with respect to a multiset of perturbations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatrixDerivative {
    pub arg: Node,
    pub derivatives: Derivatives,
}

impl fmt::Display for MatrixDerivative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d({})/d({})", self.arg, self.derivatives)
    }
}
