//! The traversal core shared by [`remove_if`](crate::remove_if) and [`keep_if`](crate::keep_if).
//!
//! Both traversals walk the tree the same way and differ only in how they judge a node before
//! looking inside it, and in how they rewrite products, matrix products, and two-electron
//! energies. An [`Engine`] supplies those pieces; [`rewrite`] does the rest.

use crate::{error::Fault, options::{FunctionalPolicy, RewriteOptions}};
use log::trace;
use pertsym_algebra::{
    matrix_add,
    Expr,
    Node,
    Product,
    Sum,
    SumBuilder,
    TwoElecEnergy,
};

/// The verdict an engine gives a node before looking inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fate {
    /// The node is removed as a whole.
    Drop,

    /// The node is kept verbatim.
    Retain,

    /// The node is rewritten operand by operand.
    Open,
}

/// The parts of a traversal that differ between Remove and Keep.
///
/// Methods returning `Ok(None)` mean the node is absent from the result.
pub(crate) trait Engine {
    /// The name of the traversal, used in faults and logs.
    fn traversal(&self) -> &'static str;

    fn options(&self) -> &RewriteOptions;

    /// Judges a node as a whole.
    fn fate(&self, node: &Node) -> Fate;

    /// Rewrites a node that has no operands to look into.
    fn atom(&self, node: &Node) -> Option<Node>;

    /// Rewrites a scalar product.
    fn product(&self, node: &Node, product: &Product) -> Result<Option<Node>, Fault>;

    /// Rewrites an ordered matrix product.
    fn matrix_product(&self, node: &Node, factors: &[Node]) -> Result<Option<Node>, Fault>;

    /// Rewrites a two-electron energy.
    fn bilinear(&self, node: &Node, energy: &TwoElecEnergy) -> Result<Option<Node>, Fault>;

    /// Rewrites any node with this engine.
    fn apply(&self, node: &Node) -> Result<Option<Node>, Fault> {
        rewrite(self, node)
    }
}

/// Rewrites `node` with the given engine.
///
/// Unchanged subtrees are returned as the same shared node.
pub(crate) fn rewrite<E: Engine + ?Sized>(engine: &E, node: &Node) -> Result<Option<Node>, Fault> {
    trace!("{}: visiting {} node `{}`", engine.traversal(), node.kind(), node);
    match engine.fate(node) {
        Fate::Drop => return Ok(None),
        Fate::Retain => return Ok(Some(node.clone())),
        Fate::Open => {},
    }

    match &**node {
        Expr::Symbol(_)
            | Expr::Number(_)
            | Expr::Constant(_)
            | Expr::Perturbation(_)
            | Expr::ZeroOperator
            | Expr::Density(_)
            | Expr::LagMultiplier(_)
            | Expr::OneElecOperator(_)
            | Expr::NonElecFunction(_)
            | Expr::TemporumOverlap(_)
            | Expr::MatrixDerivative(_) => Ok(engine.atom(node)),
        Expr::Add(sum) => sum_terms(engine, node, sum).map(Some),
        Expr::Mul(product) => engine.product(node, product),
        Expr::MatrixAdd(terms) => matrix_terms(engine, node, terms),
        Expr::MatrixMul(factors) => engine.matrix_product(node, factors),
        Expr::TwoElecEnergy(energy) => engine.bilinear(node, energy),
        Expr::TwoElecOperator(op) => wrapped(engine, node, &op.state, |state| {
            Node::two_elec_operator(op.integrals.clone(), state)
        }),
        Expr::Temporum(temporum) => wrapped(engine, node, &temporum.target, |target| {
            Node::temporum(target, temporum.kind)
        }),
        Expr::CompositeFunction(func) => wrapped(engine, node, &func.inner, |inner| {
            Node::composite_function(func.name.clone(), inner)
        }),
        Expr::Trace(arg) => wrapped(engine, node, arg, Node::trace),
        Expr::Conjugate(arg) => wrapped(engine, node, arg, Node::conjugate),
        Expr::Transpose(arg) => wrapped(engine, node, arg, Node::transpose),
        Expr::ExchCorrEnergy(_) | Expr::ExchCorrPotential(_) => match engine.options().functionals {
            FunctionalPolicy::PassThrough => Ok(Some(node.clone())),
            FunctionalPolicy::Atomic => Ok(engine.atom(node)),
        },
        Expr::Function(_) | Expr::MatrixSymbol(_) => Err(Fault::unclassified(engine.traversal(), node)),
    }
}

/// Rewrites a scalar sum pair by pair.
///
/// A pair whose unit `m*t` or multiplier `m` is dropped or retained by the engine is dropped or
/// kept whole. Otherwise the term is rewritten and re-inserted with its multiplier. A rewritten
/// coefficient that is absent becomes zero, and so does a sum whose terms are all absent.
fn sum_terms<E: Engine + ?Sized>(engine: &E, node: &Node, sum: &Sum) -> Result<Node, Fault> {
    let mut changed = false;
    let mut rebuilt = SumBuilder::default();

    if !sum.coef.is_zero() {
        let coef = Node::number(sum.coef.clone());
        match engine.apply(&coef)? {
            Some(new_coef) => {
                changed |= new_coef != coef;
                rebuilt.add(&new_coef);
            },
            None => changed = true,
        }
    }

    for (term, mult) in &sum.dict {
        match engine.fate(&Sum::unit(term, mult)) {
            Fate::Drop => {
                changed = true;
                continue;
            },
            Fate::Retain => {
                rebuilt.add_term(mult, term);
                continue;
            },
            Fate::Open => {},
        }

        match engine.fate(&Node::number(mult.clone())) {
            Fate::Drop => {
                changed = true;
                continue;
            },
            Fate::Retain => {
                rebuilt.add_term(mult, term);
                continue;
            },
            Fate::Open => {},
        }

        match engine.apply(term)? {
            Some(new_term) => {
                changed |= !new_term.ptr_eq(term);
                rebuilt.add_term(mult, &new_term);
            },
            None => changed = true,
        }
    }

    if changed {
        Ok(rebuilt.build())
    } else {
        Ok(node.clone())
    }
}

/// Rewrites a matrix sum operand by operand, dropping absent operands. The sum is absent if no
/// operand survives.
fn matrix_terms<E: Engine + ?Sized>(engine: &E, node: &Node, terms: &[Node]) -> Result<Option<Node>, Fault> {
    let mut changed = false;
    let mut survivors = Vec::with_capacity(terms.len());
    for term in terms {
        match engine.apply(term)? {
            Some(new_term) => {
                changed |= !new_term.ptr_eq(term);
                survivors.push(new_term);
            },
            None => changed = true,
        }
    }

    if survivors.is_empty() {
        Ok(None)
    } else if changed {
        Ok(Some(matrix_add(survivors)))
    } else {
        Ok(Some(node.clone()))
    }
}

/// Rewrites a node with a single operand. The node is absent if the operand is, unchanged if the
/// operand is, and rebuilt around the new operand with `rebuild` otherwise.
fn wrapped<E: Engine + ?Sized>(
    engine: &E,
    node: &Node,
    operand: &Node,
    rebuild: impl FnOnce(Node) -> Node,
) -> Result<Option<Node>, Fault> {
    Ok(engine.apply(operand)?.map(|new_operand| {
        if new_operand.ptr_eq(operand) {
            node.clone()
        } else {
            rebuild(new_operand)
        }
    }))
}
