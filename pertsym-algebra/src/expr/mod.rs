//! Immutable expression trees.
//!
//! An expression is a tree of [`Node`]s. Each node is a cheap, reference-counted handle to an
//! [`Expr`], so unchanged subtrees are shared between an input tree and every tree rewritten from
//! it, and trees can be sent to other threads.
//!
//! # Equality
//!
//! Nodes implement **structural** equality, hashing, and total ordering: two nodes are equal if
//! they are the same kind of node with equal payloads, independent of where they live in memory.
//! Because sums and products are stored as sorted dictionaries, the order terms and factors were
//! added in does not matter. Structural equality is not mathematical equality: `x*(y + z)` and
//! `x*y + x*z` are different nodes.
//!
//! Nodes should be built with the constructors on [`Node`], the arithmetic operators, and the
//! builders in [`sum`], [`product`], and [`matrix`], which keep sums and products canonical.

mod iter;
pub mod kinds;
pub mod matrix;
mod ops;
pub mod product;
pub mod sum;

use crate::{number::Number, perturbation::{Dependencies, Derivatives, Perturbation}};
use iter::NodeIter;
use kinds::{
    CompositeFunction,
    Functional,
    MatrixDerivative,
    Operator,
    State,
    Temporum,
    TemporumType,
    TwoElecEnergy,
    TwoElecOperator,
};
use product::Product;
use std::{fmt, ops::Deref, sync::Arc};
use sum::Sum;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single node of an expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Expr {
    /// A generic scalar symbol, such as `x`.
    Symbol(String),

    /// An exact numeric literal.
    Number(Number),

    /// A named constant, such as `pi`.
    Constant(String),

    /// A perturbation used as a scalar quantity.
    Perturbation(Perturbation),

    /// A scalar sum `coef + Σ m·t`.
    Add(Sum),

    /// A scalar product `coef · Π b^e`.
    Mul(Product),

    /// A generic uninterpreted function. No traversal has a rule for it.
    Function(Functional),

    /// A scalar function of the perturbations only, such as the nuclear repulsion energy.
    NonElecFunction(Operator),

    /// A two-electron energy, bilinear in two states.
    TwoElecEnergy(TwoElecEnergy),

    /// A named function of one inner expression.
    CompositeFunction(CompositeFunction),

    /// An exchange-correlation energy functional.
    ExchCorrEnergy(Functional),

    /// A generic named matrix. No traversal has a rule for it.
    MatrixSymbol(String),

    /// The zero matrix.
    ZeroOperator,

    /// A one-electron density matrix.
    Density(State),

    /// A Lagrangian multiplier matrix.
    LagMultiplier(State),

    /// A one-electron operator.
    OneElecOperator(Operator),

    /// A two-electron operator of a state.
    TwoElecOperator(TwoElecOperator),

    /// An exchange-correlation potential.
    ExchCorrPotential(Functional),

    /// The time-derivative operator applied to a target.
    Temporum(Temporum),

    /// The time-derivative overlap operator.
    TemporumOverlap(Operator),

    /// A sum of matrices.
    MatrixAdd(Vec<Node>),

    /// An ordered product of matrices, optionally preceded by one scalar factor.
    MatrixMul(Vec<Node>),

    /// The trace of a matrix.
    Trace(Node),

    /// The complex conjugate of a matrix.
    Conjugate(Node),

    /// The transpose of a matrix.
    Transpose(Node),

    /// A matrix symbol differentiated by perturbations.
    MatrixDerivative(MatrixDerivative),
}

/// The binding strength of a rendered node, used to decide where parentheses are needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Add,
    Mul,
    Pow,
    Atom,
}

impl Expr {
    /// Returns the name of the kind of this node, as used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Symbol(_) => "Symbol",
            Self::Number(_) => "Number",
            Self::Constant(_) => "Constant",
            Self::Perturbation(_) => "Perturbation",
            Self::Add(_) => "Add",
            Self::Mul(_) => "Mul",
            Self::Function(_) => "Function",
            Self::NonElecFunction(_) => "NonElecFunction",
            Self::TwoElecEnergy(_) => "TwoElecEnergy",
            Self::CompositeFunction(_) => "CompositeFunction",
            Self::ExchCorrEnergy(_) => "ExchCorrEnergy",
            Self::MatrixSymbol(_) => "MatrixSymbol",
            Self::ZeroOperator => "ZeroOperator",
            Self::Density(_) => "Density",
            Self::LagMultiplier(_) => "LagMultiplier",
            Self::OneElecOperator(_) => "OneElecOperator",
            Self::TwoElecOperator(_) => "TwoElecOperator",
            Self::ExchCorrPotential(_) => "ExchCorrPotential",
            Self::Temporum(_) => "Temporum",
            Self::TemporumOverlap(_) => "TemporumOverlap",
            Self::MatrixAdd(_) => "MatrixAdd",
            Self::MatrixMul(_) => "MatrixMul",
            Self::Trace(_) => "Trace",
            Self::Conjugate(_) => "Conjugate",
            Self::Transpose(_) => "Transpose",
            Self::MatrixDerivative(_) => "MatrixDerivative",
        }
    }

    /// Returns true if the node is matrix-valued.
    pub fn is_matrix(&self) -> bool {
        match self {
            Self::MatrixSymbol(_)
                | Self::ZeroOperator
                | Self::Density(_)
                | Self::LagMultiplier(_)
                | Self::OneElecOperator(_)
                | Self::TwoElecOperator(_)
                | Self::ExchCorrPotential(_)
                | Self::Temporum(_)
                | Self::TemporumOverlap(_)
                | Self::Conjugate(_)
                | Self::Transpose(_)
                | Self::MatrixDerivative(_) => true,
            Self::MatrixAdd(terms) => terms.iter().any(|term| term.is_matrix()),
            Self::MatrixMul(factors) => factors.iter().any(|factor| factor.is_matrix()),
            _ => false,
        }
    }

    /// If the node is an [`Expr::Number`], returns a reference to the contained number.
    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Self::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Returns true if the node is the number zero.
    pub fn is_zero(&self) -> bool {
        self.as_number().is_some_and(Number::is_zero)
    }

    /// Returns true if the node is the number one.
    pub fn is_one(&self) -> bool {
        self.as_number().is_some_and(Number::is_one)
    }

    /// Returns the operands of the node, in order.
    ///
    /// The operands of a sum are its coefficient (if non-zero) followed by each `m·t` pair; the
    /// operands of a product are its coefficient (if not one) followed by each `b^e` pair, and
    /// the operands of a single power `b^e` are `b` and `e`.
    pub fn args(&self) -> Vec<Node> {
        match self {
            Self::Symbol(_)
                | Self::Number(_)
                | Self::Constant(_)
                | Self::Perturbation(_)
                | Self::NonElecFunction(_)
                | Self::MatrixSymbol(_)
                | Self::ZeroOperator
                | Self::Density(_)
                | Self::LagMultiplier(_)
                | Self::OneElecOperator(_)
                | Self::TemporumOverlap(_) => Vec::new(),
            Self::Add(sum) => {
                let mut args = Vec::with_capacity(sum.dict.len() + 1);
                if !sum.coef.is_zero() {
                    args.push(Node::number(sum.coef.clone()));
                }
                args.extend(sum.dict.iter().map(|(term, mult)| Sum::unit(term, mult)));
                args
            },
            Self::Mul(product) => {
                if let Some((base, exp)) = product.as_power() {
                    return vec![base.clone(), exp.clone()];
                }
                let mut args = Vec::with_capacity(product.dict.len() + 1);
                if !product.coef.is_one() {
                    args.push(Node::number(product.coef.clone()));
                }
                args.extend(product.dict.iter().map(|(base, exp)| Product::unit(base, exp)));
                args
            },
            Self::Function(func) | Self::ExchCorrEnergy(func) | Self::ExchCorrPotential(func) => func.args.clone(),
            Self::TwoElecEnergy(energy) => vec![energy.inner.clone(), energy.outer.clone()],
            Self::CompositeFunction(func) => vec![func.inner.clone()],
            Self::TwoElecOperator(op) => vec![op.state.clone()],
            Self::Temporum(temporum) => vec![temporum.target.clone()],
            Self::MatrixAdd(operands) | Self::MatrixMul(operands) => operands.clone(),
            Self::Trace(arg) | Self::Conjugate(arg) | Self::Transpose(arg) => vec![arg.clone()],
            Self::MatrixDerivative(derivative) => vec![derivative.arg.clone()],
        }
    }

    /// Returns the precedence of the rendered node.
    fn precedence(&self) -> Precedence {
        match self {
            Self::Number(n) if n.is_negative() => Precedence::Add,
            Self::Number(Number::Integer(_)) => Precedence::Atom,
            Self::Number(Number::Rational(_)) => Precedence::Mul,
            Self::Number(Number::Complex(re, _)) if re.cmp0().is_eq() => Precedence::Mul,
            Self::Number(Number::Complex(..)) => Precedence::Add,
            Self::Add(_) | Self::MatrixAdd(_) => Precedence::Add,
            Self::Mul(product) if product.as_power().is_some() => Precedence::Pow,
            Self::Mul(product) if product.coef.is_negative() => Precedence::Add,
            Self::Mul(_) => Precedence::Mul,
            Self::MatrixMul(factors) if factors.first().and_then(|f| f.as_number()).is_some_and(Number::is_negative) => {
                Precedence::Add
            },
            Self::MatrixMul(_) => Precedence::Mul,
            _ => Precedence::Atom,
        }
    }
}

/// Writes `node`, wrapped in parentheses if it binds less tightly than `min`.
fn write_operand(f: &mut fmt::Formatter<'_>, node: &Node, min: Precedence) -> fmt::Result {
    if node.precedence() < min {
        write!(f, "({})", node)
    } else {
        write!(f, "{}", node)
    }
}

/// Writes a sequence of rendered terms joined with `+`, turning a leading minus sign of any term
/// after the first into a `-` separator.
fn write_terms(f: &mut fmt::Formatter<'_>, terms: impl IntoIterator<Item = String>) -> fmt::Result {
    let mut iter = terms.into_iter();
    if let Some(first) = iter.next() {
        write!(f, "{}", first)?;
        for term in iter {
            match term.strip_prefix('-') {
                Some(positive) => write!(f, " - {}", positive)?,
                None => write!(f, " + {}", term)?,
            }
        }
    }
    Ok(())
}

/// Writes the factors of a product joined with `*`, with a coefficient of `-1` rendered as a
/// leading minus sign.
fn write_factors<'a>(
    f: &mut fmt::Formatter<'_>,
    coef: Option<&Number>,
    factors: impl IntoIterator<Item = (&'a Node, Option<&'a Node>)>,
) -> fmt::Result {
    let mut first = true;
    if let Some(coef) = coef {
        if coef.is_minus_one() {
            write!(f, "-")?;
        } else if !coef.is_one() {
            write_operand(f, &Node::number(coef.clone()), Precedence::Mul)?;
            first = false;
        }
    }

    for (base, exp) in factors {
        if !first {
            write!(f, "*")?;
        }
        first = false;
        match exp {
            Some(exp) if !exp.is_one() => {
                write_operand(f, base, Precedence::Atom)?;
                write!(f, "^")?;
                write_operand(f, exp, Precedence::Atom)?;
            },
            _ => write_operand(f, base, Precedence::Mul)?,
        }
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(name) | Self::Constant(name) | Self::MatrixSymbol(name) => write!(f, "{}", name),
            Self::Number(n) => write!(f, "{}", n),
            Self::Perturbation(p) => write!(f, "{}", p),
            Self::Add(sum) => {
                let coef = (!sum.coef.is_zero()).then(|| sum.coef.to_string());
                write_terms(f, coef.into_iter().chain(
                    sum.dict.iter().map(|(term, mult)| Sum::unit(term, mult).to_string()),
                ))
            },
            Self::Mul(product) => write_factors(
                f,
                Some(&product.coef),
                product.dict.iter().map(|(base, exp)| (base, Some(exp))),
            ),
            Self::Function(func) | Self::ExchCorrEnergy(func) | Self::ExchCorrPotential(func) => write!(f, "{}", func),
            Self::NonElecFunction(op) | Self::OneElecOperator(op) | Self::TemporumOverlap(op) => write!(f, "{}", op),
            Self::TwoElecEnergy(energy) => write!(f, "{}", energy),
            Self::CompositeFunction(func) => write!(f, "{}", func),
            Self::ZeroOperator => write!(f, "0"),
            Self::Density(state) | Self::LagMultiplier(state) => write!(f, "{}", state),
            Self::TwoElecOperator(op) => write!(f, "{}", op),
            Self::Temporum(temporum) => write!(f, "{}", temporum),
            Self::MatrixAdd(terms) => write_terms(f, terms.iter().map(ToString::to_string)),
            Self::MatrixMul(factors) => {
                let (coef, rest) = match factors.split_first() {
                    Some((first, rest)) if first.as_number().is_some() => (first.as_number(), rest),
                    _ => (None, factors.as_slice()),
                };
                write_factors(f, coef, rest.iter().map(|factor| (factor, None)))
            },
            Self::Trace(arg) => write!(f, "tr({})", arg),
            Self::Conjugate(arg) => write!(f, "conj({})", arg),
            Self::Transpose(arg) => write!(f, "transpose({})", arg),
            Self::MatrixDerivative(derivative) => write!(f, "{}", derivative),
        }
    }
}

/// A shared handle to an immutable [`Expr`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Node(Arc<Expr>);

impl Deref for Node {
    type Target = Expr;

    fn deref(&self) -> &Expr {
        &self.0
    }
}

impl From<Expr> for Node {
    fn from(expr: Expr) -> Self {
        Self::new(expr)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Node {
    /// Wraps an [`Expr`] in a new handle. No canonicalization is done.
    pub fn new(expr: Expr) -> Self {
        Self(Arc::new(expr))
    }

    /// Returns true if both handles point to the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Self::new(Expr::Symbol(name.into()))
    }

    pub fn number(n: impl Into<Number>) -> Self {
        Self::new(Expr::Number(n.into()))
    }

    pub fn constant(name: impl Into<String>) -> Self {
        Self::new(Expr::Constant(name.into()))
    }

    pub fn perturbation(perturbation: Perturbation) -> Self {
        Self::new(Expr::Perturbation(perturbation))
    }

    /// Creates a generic uninterpreted function `name(args...)`.
    pub fn function(name: impl Into<String>, args: Vec<Node>) -> Self {
        Self::new(Expr::Function(Functional { name: name.into(), args }))
    }

    pub fn non_elec_function(op: Operator) -> Self {
        Self::new(Expr::NonElecFunction(op))
    }

    pub fn two_elec_energy(integrals: Operator, inner: Node, outer: Node) -> Self {
        Self::new(Expr::TwoElecEnergy(TwoElecEnergy { integrals, inner, outer }))
    }

    pub fn composite_function(name: impl Into<String>, inner: Node) -> Self {
        Self::new(Expr::CompositeFunction(CompositeFunction { name: name.into(), inner }))
    }

    pub fn exch_corr_energy(name: impl Into<String>, args: Vec<Node>) -> Self {
        Self::new(Expr::ExchCorrEnergy(Functional { name: name.into(), args }))
    }

    /// Creates a generic named matrix.
    pub fn matrix_symbol(name: impl Into<String>) -> Self {
        Self::new(Expr::MatrixSymbol(name.into()))
    }

    pub fn zero_operator() -> Self {
        Self::new(Expr::ZeroOperator)
    }

    pub fn density(state: State) -> Self {
        Self::new(Expr::Density(state))
    }

    pub fn lag_multiplier(state: State) -> Self {
        Self::new(Expr::LagMultiplier(state))
    }

    pub fn one_elec_operator(op: Operator) -> Self {
        Self::new(Expr::OneElecOperator(op))
    }

    pub fn two_elec_operator(integrals: Operator, state: Node) -> Self {
        Self::new(Expr::TwoElecOperator(TwoElecOperator { integrals, state }))
    }

    pub fn exch_corr_potential(name: impl Into<String>, args: Vec<Node>) -> Self {
        Self::new(Expr::ExchCorrPotential(Functional { name: name.into(), args }))
    }

    pub fn temporum(target: Node, kind: TemporumType) -> Self {
        Self::new(Expr::Temporum(Temporum { target, kind }))
    }

    /// Creates the time-derivative overlap operator, named `T`.
    pub fn temporum_overlap(dependencies: Dependencies, derivatives: Derivatives) -> Self {
        Self::new(Expr::TemporumOverlap(Operator { name: "T".to_string(), dependencies, derivatives }))
    }

    pub fn trace(arg: Node) -> Self {
        Self::new(Expr::Trace(arg))
    }

    pub fn conjugate(arg: Node) -> Self {
        Self::new(Expr::Conjugate(arg))
    }

    pub fn transpose(arg: Node) -> Self {
        Self::new(Expr::Transpose(arg))
    }

    pub fn matrix_derivative(arg: Node, derivatives: Derivatives) -> Self {
        Self::new(Expr::MatrixDerivative(MatrixDerivative { arg, derivatives }))
    }

    /// Returns an iterator that traverses the tree in left-to-right post-order (i.e.
    /// depth-first), ending with the node itself.
    pub fn post_order_iter(&self) -> NodeIter {
        NodeIter::new(self.clone())
    }

    /// Raises the node to the given power.
    pub fn pow(&self, exp: &Node) -> Node {
        let mut product = product::ProductBuilder::default();
        product.mul_factor(self, exp);
        product.build()
    }
}
