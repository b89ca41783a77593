//! Decides whether a node represents the same mathematical object as a target.

use pertsym_algebra::{Expr, Functional, Node, Operator};

/// Returns true if `node` is equivalent to `target`.
///
/// Nodes are compared structurally, except for:
///
/// - densities and Lagrangian multipliers, which match by name, ignoring their derivatives;
/// - operators and functions that carry dependencies, which match by name and
///   [`dependency_equivalent`];
/// - composite functions and functionals, which match by name and by matching their inner
///   expression or arguments;
/// - traces, conjugates, transposes, and time-derivatives. Against a target of the same kind,
///   their operands are matched. Against any other target, the target is matched against the
///   wrapped operand.
pub fn matches(target: &Node, node: &Node) -> bool {
    match (&**target, &**node) {
        (Expr::Density(t), Expr::Density(n))
            | (Expr::LagMultiplier(t), Expr::LagMultiplier(n)) => t.name == n.name,
        (Expr::OneElecOperator(t), Expr::OneElecOperator(n))
            | (Expr::NonElecFunction(t), Expr::NonElecFunction(n))
            | (Expr::TemporumOverlap(t), Expr::TemporumOverlap(n)) => dependency_equivalent(t, n),
        (Expr::TwoElecOperator(t), Expr::TwoElecOperator(n)) => dependency_equivalent(&t.integrals, &n.integrals),
        (Expr::TwoElecEnergy(t), Expr::TwoElecEnergy(n)) => dependency_equivalent(&t.integrals, &n.integrals),
        (Expr::CompositeFunction(t), Expr::CompositeFunction(n)) => {
            t.name == n.name && matches(&t.inner, &n.inner)
        },
        (Expr::ExchCorrEnergy(t), Expr::ExchCorrEnergy(n))
            | (Expr::ExchCorrPotential(t), Expr::ExchCorrPotential(n)) => functionals_match(t, n),
        (Expr::Trace(t), Expr::Trace(n))
            | (Expr::Conjugate(t), Expr::Conjugate(n))
            | (Expr::Transpose(t), Expr::Transpose(n)) => matches(t, n),
        (Expr::Temporum(t), Expr::Temporum(n)) => t.kind == n.kind && matches(&t.target, &n.target),
        (_, Expr::Trace(n) | Expr::Conjugate(n) | Expr::Transpose(n)) => matches(target, n),
        (_, Expr::Temporum(n)) => matches(target, &n.target),
        _ => target == node,
    }
}

/// Returns true if both functionals have the same name and pairwise matching arguments.
fn functionals_match(target: &Functional, node: &Functional) -> bool {
    target.name == node.name
        && target.args.len() == node.args.len()
        && target.args.iter().zip(&node.args).all(|(t, n)| matches(t, n))
}

/// Returns true if two dependency-bearing symbols are equivalent.
///
/// They must have the same name, and either identical dependencies and derivatives, or the same
/// derivatives once the derivatives of both are restricted to the perturbations `target` depends
/// on. The second case lets a target match every derivative of itself with respect to
/// perturbations it does not depend on.
pub fn dependency_equivalent(target: &Operator, node: &Operator) -> bool {
    if target.name != node.name {
        return false;
    }

    if target.dependencies == node.dependencies && target.derivatives == node.derivatives {
        return true;
    }

    node.derivatives.filtered(&target.dependencies) == target.derivatives.filtered(&target.dependencies)
}
