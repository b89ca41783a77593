//! Removes the zeros left behind by rewriting.
//!
//! Removing or keeping symbols can leave zero operators and zero terms in a tree, such as
//! `tr(G(0)*D)`, which are not simplified away when the tree is rebuilt. This pass cleans them up
//! bottom-up, so a zero found deep in the tree can make every node above it vanish.

pub mod step;

use crate::step_collector::StepCollector;
use pertsym_algebra::{
    matrix_add,
    matrix_mul,
    Expr,
    Node,
    Number,
    Product,
    ProductBuilder,
    Sum,
    SumBuilder,
};
use step::Step;

/// Removes zero terms, factors, and operators from an expression.
///
/// See [`remove_zeros_with_steps`] for the rules.
pub fn remove_zeros(expr: &Node) -> Node {
    clean(expr, &mut ())
}

/// Removes zero terms, factors, and operators from an expression, and returns the steps taken.
///
/// - a term of a sum with a zero multiplier or a zero value is dropped. A sum where every term
///   vanishes is its coefficient, usually `0`.
/// - a product with a zero coefficient, or a zero base raised to a positive numeric power, is `0`.
/// - a matrix sum loses its zero operands, and is the zero operator if none survive.
/// - a matrix product with a zero operand is the zero operator.
/// - the trace of the zero operator is `0`, and its conjugate and transpose are the zero operator.
/// - a two-electron operator, time-derivative, or matrix derivative of the zero operator is the
///   zero operator, and a two-electron energy with a zero state is `0`.
///
/// Every other node has its operands cleaned. Unchanged subtrees are returned as the same shared
/// node.
pub fn remove_zeros_with_steps(expr: &Node) -> (Node, Vec<Step>) {
    let mut steps = Vec::new();
    let cleaned = clean(expr, &mut steps);
    (cleaned, steps)
}

/// Returns true if the node is the number zero or the zero operator.
fn is_zero(node: &Node) -> bool {
    node.is_zero() || matches!(**node, Expr::ZeroOperator)
}

fn clean(expr: &Node, step_collector: &mut dyn StepCollector<Step>) -> Node {
    match &**expr {
        Expr::Add(sum) => add_zero(expr, sum, step_collector),
        Expr::Mul(product) => multiply_zero(expr, product, step_collector),
        Expr::MatrixAdd(terms) => matrix_add_zero(expr, terms, step_collector),
        Expr::MatrixMul(factors) => matrix_mul_zero(expr, factors, step_collector),
        Expr::Trace(arg) => wrap_zero(expr, arg, step_collector, Node::number(0), Node::trace),
        Expr::Conjugate(arg) => wrap_zero(expr, arg, step_collector, Node::zero_operator(), Node::conjugate),
        Expr::Transpose(arg) => wrap_zero(expr, arg, step_collector, Node::zero_operator(), Node::transpose),
        Expr::TwoElecOperator(op) => operator_zero(expr, &op.state, step_collector, |state| {
            Node::two_elec_operator(op.integrals.clone(), state)
        }),
        Expr::Temporum(temporum) => operator_zero(expr, &temporum.target, step_collector, |target| {
            Node::temporum(target, temporum.kind)
        }),
        Expr::MatrixDerivative(derivative) => operator_zero(expr, &derivative.arg, step_collector, |arg| {
            Node::matrix_derivative(arg, derivative.derivatives.clone())
        }),
        Expr::TwoElecEnergy(energy) => {
            let inner = clean(&energy.inner, step_collector);
            let outer = clean(&energy.outer, step_collector);
            if is_zero(&inner) || is_zero(&outer) {
                step_collector.push(Step::OperatorZero);
                Node::number(0)
            } else if inner.ptr_eq(&energy.inner) && outer.ptr_eq(&energy.outer) {
                expr.clone()
            } else {
                Node::two_elec_energy(energy.integrals.clone(), inner, outer)
            }
        },
        Expr::CompositeFunction(func) => clean_operand(expr, &func.inner, step_collector, |inner| {
            Node::composite_function(func.name.clone(), inner)
        }),
        Expr::Function(func) | Expr::ExchCorrEnergy(func) | Expr::ExchCorrPotential(func) => {
            let args = func.args.iter()
                .map(|arg| clean(arg, step_collector))
                .collect::<Vec<_>>();
            if args.iter().zip(&func.args).all(|(new, old)| new.ptr_eq(old)) {
                return expr.clone();
            }
            match &**expr {
                Expr::ExchCorrEnergy(_) => Node::exch_corr_energy(func.name.clone(), args),
                Expr::ExchCorrPotential(_) => Node::exch_corr_potential(func.name.clone(), args),
                _ => Node::function(func.name.clone(), args),
            }
        },
        Expr::Symbol(_)
            | Expr::Number(_)
            | Expr::Constant(_)
            | Expr::Perturbation(_)
            | Expr::NonElecFunction(_)
            | Expr::MatrixSymbol(_)
            | Expr::ZeroOperator
            | Expr::Density(_)
            | Expr::LagMultiplier(_)
            | Expr::OneElecOperator(_)
            | Expr::TemporumOverlap(_) => expr.clone(),
    }
}

/// Cleans the single operand of `expr`, rebuilding `expr` around it with `rebuild` if it changed.
fn clean_operand(
    expr: &Node,
    operand: &Node,
    step_collector: &mut dyn StepCollector<Step>,
    rebuild: impl FnOnce(Node) -> Node,
) -> Node {
    let cleaned = clean(operand, step_collector);
    if cleaned.ptr_eq(operand) {
        expr.clone()
    } else {
        rebuild(cleaned)
    }
}

/// `0*a + b = b`
/// `0 + b = b`
fn add_zero(expr: &Node, sum: &Sum, step_collector: &mut dyn StepCollector<Step>) -> Node {
    let mut changed = false;
    let mut dropped = false;
    let mut rebuilt = SumBuilder::new(sum.coef.clone());
    for (term, mult) in &sum.dict {
        let cleaned = clean(term, step_collector);
        if mult.is_zero() || is_zero(&cleaned) {
            dropped = true;
            continue;
        }
        changed |= !cleaned.ptr_eq(term);
        rebuilt.add_term(mult, &cleaned);
    }

    if dropped {
        step_collector.push(Step::AddZero);
    }

    if changed || dropped {
        rebuilt.build()
    } else {
        expr.clone()
    }
}

/// `0*a = 0`
/// `0^n * a = 0`
fn multiply_zero(expr: &Node, product: &Product, step_collector: &mut dyn StepCollector<Step>) -> Node {
    if product.coef.is_zero() {
        step_collector.push(Step::MultiplyZero);
        return Node::number(0);
    }

    let mut changed = false;
    let mut rebuilt = ProductBuilder::new(product.coef.clone());
    for (base, exp) in &product.dict {
        let new_base = clean(base, step_collector);
        let new_exp = clean(exp, step_collector);
        if new_base.is_zero() && new_exp.as_number().is_some_and(Number::is_positive) {
            step_collector.push(Step::MultiplyZero);
            return Node::number(0);
        }
        changed |= !new_base.ptr_eq(base) || !new_exp.ptr_eq(exp);
        rebuilt.mul_factor(&new_base, &new_exp);
    }

    if changed {
        rebuilt.build()
    } else {
        expr.clone()
    }
}

/// `0 + A = A`
fn matrix_add_zero(expr: &Node, terms: &[Node], step_collector: &mut dyn StepCollector<Step>) -> Node {
    let mut changed = false;
    let mut dropped = false;
    let mut survivors = Vec::with_capacity(terms.len());
    for term in terms {
        let cleaned = clean(term, step_collector);
        if is_zero(&cleaned) {
            dropped = true;
            continue;
        }
        changed |= !cleaned.ptr_eq(term);
        survivors.push(cleaned);
    }

    if dropped {
        step_collector.push(Step::MatrixAddZero);
    }

    if survivors.is_empty() {
        Node::zero_operator()
    } else if changed || dropped {
        matrix_add(survivors)
    } else {
        expr.clone()
    }
}

/// `0*A = 0`
/// `A*0 = 0`
fn matrix_mul_zero(expr: &Node, factors: &[Node], step_collector: &mut dyn StepCollector<Step>) -> Node {
    let cleaned = factors.iter()
        .map(|factor| clean(factor, step_collector))
        .collect::<Vec<_>>();

    if cleaned.iter().any(is_zero) {
        step_collector.push(Step::MatrixMulZero);
        return Node::zero_operator();
    }

    if cleaned.iter().zip(factors).all(|(new, old)| new.ptr_eq(old)) {
        expr.clone()
    } else {
        matrix_mul(cleaned)
    }
}

/// `tr(0) = 0`
/// `conj(0) = 0`
/// `transpose(0) = 0`
fn wrap_zero(
    expr: &Node,
    arg: &Node,
    step_collector: &mut dyn StepCollector<Step>,
    zero: Node,
    rebuild: impl FnOnce(Node) -> Node,
) -> Node {
    let cleaned = clean(arg, step_collector);
    if is_zero(&cleaned) {
        step_collector.push(Step::WrapZero);
        zero
    } else if cleaned.ptr_eq(arg) {
        expr.clone()
    } else {
        rebuild(cleaned)
    }
}

/// `G(0) = 0`
/// `dt(0) = 0`
fn operator_zero(
    expr: &Node,
    operand: &Node,
    step_collector: &mut dyn StepCollector<Step>,
    rebuild: impl FnOnce(Node) -> Node,
) -> Node {
    let cleaned = clean(operand, step_collector);
    if matches!(*cleaned, Expr::ZeroOperator) {
        step_collector.push(Step::OperatorZero);
        Node::zero_operator()
    } else if cleaned.ptr_eq(operand) {
        expr.clone()
    } else {
        rebuild(cleaned)
    }
}
