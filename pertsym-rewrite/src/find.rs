//! Collects every sub-expression equivalent to a target.

use crate::{equivalence::matches, error::Fault};
use log::trace;
use pertsym_algebra::{Expr, Node, Product, Sum};
use pertsym_error::Error;
use std::collections::BTreeSet;

const TRAVERSAL: &str = "find_all";

/// Returns every sub-expression of `expr` that is equivalent to `target`, as decided by
/// [`matches`](crate::matches).
///
/// A matching node is reported as a whole and its operands are not searched. Find never builds
/// partial expressions: a term of a sum is reported as `m*t` only if that pair exists in the
/// tree. A trace, conjugate, transpose, or time-derivative is reported as a whole when the target
/// is the same kind of wrapper and the target's operand is found in its operand.
///
/// # Errors
///
/// Returns an [`UnclassifiedNode`](crate::UnclassifiedNode) error if the tree contains a generic
/// function or a generic matrix symbol.
pub fn find_all(expr: &Node, target: &Node) -> Result<BTreeSet<Node>, Error> {
    let mut finder = Finder::new(target);
    finder.visit(expr).map_err(|fault| fault.locate(expr))?;
    Ok(finder.found)
}

/// The state of one search.
struct Finder<'a> {
    target: &'a Node,
    found: BTreeSet<Node>,
}

impl<'a> Finder<'a> {
    fn new(target: &'a Node) -> Self {
        Self { target, found: BTreeSet::new() }
    }

    /// Records `node` if it matches the target. Returns true if it did.
    fn insert_if_matches(&mut self, node: &Node) -> bool {
        if matches(self.target, node) {
            self.found.insert(node.clone());
            true
        } else {
            false
        }
    }

    /// Returns true if the target's operand occurs within `operand`.
    fn operand_contains(&self, target_operand: &Node, operand: &Node) -> Result<bool, Fault> {
        let mut inner = Finder::new(target_operand);
        inner.visit(operand)?;
        Ok(!inner.found.is_empty())
    }

    /// Searches a wrapper node. `target_operand` is the operand of the target when the target is
    /// the same kind of wrapper.
    fn visit_wrapper(&mut self, node: &Node, operand: &Node, target_operand: Option<&Node>) -> Result<(), Fault> {
        match target_operand {
            Some(target_operand) => {
                if self.operand_contains(target_operand, operand)? {
                    self.found.insert(node.clone());
                }
                Ok(())
            },
            None => self.visit(operand),
        }
    }

    fn visit(&mut self, node: &Node) -> Result<(), Fault> {
        trace!("{}: visiting {} node `{}`", TRAVERSAL, node.kind(), node);
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
                | Expr::TemporumOverlap(_) => {
                self.insert_if_matches(node);
            },
            Expr::Add(sum) => {
                if self.insert_if_matches(node) {
                    return Ok(());
                }
                // an implicit zero coefficient is not part of the tree
                if !sum.coef.is_zero() && self.insert_if_matches(&Node::number(sum.coef.clone())) {
                    return Ok(());
                }
                for (term, mult) in &sum.dict {
                    // with a unit multiplier the pair is the term itself, which `visit` classifies
                    if !mult.is_one() && self.insert_if_matches(&Sum::unit(term, mult)) {
                        continue;
                    }
                    if self.insert_if_matches(&Node::number(mult.clone())) {
                        continue;
                    }
                    self.visit(term)?;
                }
            },
            Expr::Mul(product) => {
                if self.insert_if_matches(node) {
                    return Ok(());
                }
                if !product.coef.is_one() && self.insert_if_matches(&Node::number(product.coef.clone())) {
                    return Ok(());
                }
                for (base, exp) in &product.dict {
                    if !exp.is_one() && self.insert_if_matches(&Product::unit(base, exp)) {
                        continue;
                    }
                    self.visit(base)?;
                    self.visit(exp)?;
                }
            },
            Expr::TwoElecOperator(op) => {
                if !self.insert_if_matches(node) {
                    self.visit(&op.state)?;
                }
            },
            Expr::TwoElecEnergy(energy) => {
                if !self.insert_if_matches(node) {
                    self.visit(&energy.inner)?;
                    self.visit(&energy.outer)?;
                }
            },
            Expr::CompositeFunction(func) => {
                if let Expr::CompositeFunction(target) = &**self.target {
                    if target.name == func.name && target.inner == func.inner {
                        self.found.insert(node.clone());
                        return Ok(());
                    }
                }
                self.visit(&func.inner)?;
            },
            Expr::ExchCorrEnergy(func) | Expr::ExchCorrPotential(func) => {
                let target = match (&**self.target, &**node) {
                    (Expr::ExchCorrEnergy(t), Expr::ExchCorrEnergy(_))
                        | (Expr::ExchCorrPotential(t), Expr::ExchCorrPotential(_)) => Some(t),
                    _ => None,
                };
                if target.is_some_and(|target| target == func) {
                    self.found.insert(node.clone());
                    return Ok(());
                }
                for arg in &func.args {
                    self.visit(arg)?;
                }
            },
            Expr::Trace(arg) => {
                let target_operand = match &**self.target {
                    Expr::Trace(t) => Some(t),
                    _ => None,
                };
                self.visit_wrapper(node, arg, target_operand)?;
            },
            Expr::Conjugate(arg) => {
                let target_operand = match &**self.target {
                    Expr::Conjugate(t) => Some(t),
                    _ => None,
                };
                self.visit_wrapper(node, arg, target_operand)?;
            },
            Expr::Transpose(arg) => {
                let target_operand = match &**self.target {
                    Expr::Transpose(t) => Some(t),
                    _ => None,
                };
                self.visit_wrapper(node, arg, target_operand)?;
            },
            Expr::Temporum(temporum) => {
                let target_operand = match &**self.target {
                    Expr::Temporum(t) if t.kind == temporum.kind => Some(&t.target),
                    _ => None,
                };
                self.visit_wrapper(node, &temporum.target, target_operand)?;
            },
            Expr::MatrixAdd(operands) | Expr::MatrixMul(operands) => {
                if !self.insert_if_matches(node) {
                    for operand in operands {
                        self.visit(operand)?;
                    }
                }
            },
            Expr::MatrixDerivative(derivative) => {
                if derivative.arg == *self.target || node == self.target {
                    self.found.insert(node.clone());
                }
            },
            Expr::Function(_) | Expr::MatrixSymbol(_) => return Err(Fault::unclassified(TRAVERSAL, node)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pertsym_algebra::{Dependencies, Operator, Perturbation, State, TemporumType};
    use pretty_assertions::assert_eq;
    use crate::UnclassifiedNode;
    use super::*;

    fn set<const N: usize>(nodes: [Node; N]) -> BTreeSet<Node> {
        nodes.into_iter().collect()
    }

    #[test]
    fn finds_terms_of_sum() {
        let (a, b, c) = (Node::symbol("a"), Node::symbol("b"), Node::symbol("c"));
        let expr = &(&a + &(&Node::number(2) * &b)) + &(&b * &c);
        assert_eq!(find_all(&expr, &b).unwrap(), set([b.clone()]));
        assert_eq!(
            find_all(&expr, &(&Node::number(2) * &b)).unwrap(),
            set([&Node::number(2) * &b]),
        );
        assert_eq!(find_all(&expr, &Node::symbol("d")).unwrap(), BTreeSet::new());
    }

    #[test]
    fn zero_coefficient_is_not_a_term() {
        let (a, b) = (Node::symbol("a"), Node::symbol("b"));
        assert_eq!(find_all(&(&a + &b), &Node::number(0)).unwrap(), BTreeSet::new());

        let two = Node::number(2);
        assert_eq!(find_all(&(&(&a + &b) + &two), &two).unwrap(), set([two.clone()]));
    }

    #[test]
    fn wrapped_term_reports_operand_regardless_of_multiplier() {
        let x = Node::symbol("x");
        let d = Node::density(State::new("D"));
        let trace = Node::trace(d.clone());

        assert_eq!(find_all(&trace, &d).unwrap(), set([d.clone()]));
        assert_eq!(find_all(&(&trace + &x), &d).unwrap(), set([d.clone()]));
        assert_eq!(find_all(&(&(&Node::number(2) * &trace) + &x), &d).unwrap(), set([d.clone()]));
        assert_eq!(find_all(&(&x * &trace), &d).unwrap(), set([d.clone()]));
        assert_eq!(find_all(&trace.pow(&Node::number(2)), &d).unwrap(), set([d]));
    }

    #[test]
    fn densities_match_any_derivative() {
        let a = Perturbation::new("a");
        let d = Node::density(State::new("D"));
        let da = Node::density(State::new("D").differentiate(a));
        let h = Node::one_elec_operator(Operator::new("h", Dependencies::new()));
        let expr = Node::trace(&h * &d) + Node::trace(&h * &da);
        assert_eq!(find_all(&expr, &d).unwrap(), set([d.clone(), da]));
    }

    #[test]
    fn operator_without_dependency_on_perturbation() {
        let (p1, p2) = (Perturbation::new("p1"), Perturbation::new("p2"));
        let op = Operator::new("V", [&p1].into_iter().collect());
        let target = Node::one_elec_operator(op.clone());
        let differentiated = Node::one_elec_operator(op.differentiate(p2));
        let expr = Node::trace(&differentiated * &Node::density(State::new("D")));
        assert_eq!(find_all(&expr, &target).unwrap(), set([differentiated]));
    }

    #[test]
    fn two_electron_operator_searches_its_state() {
        let d = Node::density(State::new("D"));
        let g = Node::two_elec_operator(Operator::new("G", Dependencies::new()), d.clone());
        assert_eq!(find_all(&Node::trace(&g * &d), &d).unwrap(), set([d]));
    }

    #[test]
    fn wrapper_target_matches_whole_wrapper() {
        let d = Node::density(State::new("D"));
        let h = Node::one_elec_operator(Operator::new("h", Dependencies::new()));
        let ket = Node::temporum(&h * &d, TemporumType::Ket);
        let expr = Node::trace(&ket * &d);

        assert_eq!(find_all(&expr, &Node::temporum(d.clone(), TemporumType::Ket)).unwrap(), set([ket.clone()]));
        assert_eq!(find_all(&expr, &Node::temporum(d.clone(), TemporumType::Bra)).unwrap(), BTreeSet::new());
        assert_eq!(find_all(&expr, &h).unwrap(), set([h]));
    }

    #[test]
    fn conjugate_and_transpose_targets() {
        let d = Node::density(State::new("D"));
        let h = Node::one_elec_operator(Operator::new("h", Dependencies::new()));
        let conjugate = Node::conjugate(&h * &d);
        let transpose = Node::transpose(d.clone());
        let expr = Node::trace(&conjugate * &transpose);

        assert_eq!(find_all(&expr, &Node::conjugate(d.clone())).unwrap(), set([conjugate]));
        assert_eq!(find_all(&expr, &Node::transpose(d.clone())).unwrap(), set([transpose]));
        assert_eq!(find_all(&expr, &Node::transpose(h)).unwrap(), BTreeSet::new());
    }

    #[test]
    fn composite_functions_compare_inner_strictly() {
        let (x, y) = (Node::symbol("x"), Node::symbol("y"));
        let f = Node::composite_function("f", &x + &y);
        let expr = &f * &x;
        assert_eq!(find_all(&expr, &f).unwrap(), set([f.clone()]));
        assert_eq!(find_all(&expr, &x).unwrap(), set([x.clone()]));
        assert_eq!(find_all(&expr, &Node::composite_function("f", x)).unwrap(), BTreeSet::new());
    }

    #[test]
    fn matrix_derivative_matches_its_symbol() {
        let a = Perturbation::new("a");
        let s = Node::one_elec_operator(Operator::new("S", Dependencies::new()));
        let ds = Node::matrix_derivative(s.clone(), [a].into_iter().collect());
        let expr = Node::trace(&ds * &Node::density(State::new("D")));
        assert_eq!(find_all(&expr, &s).unwrap(), set([ds]));
    }

    #[test]
    fn unclassified_node_is_a_fault() {
        let f = Node::function("f", vec![Node::symbol("x")]);
        let error = find_all(&(&f + &Node::symbol("y")), &Node::symbol("y")).unwrap_err();
        assert!(error.kind_is::<UnclassifiedNode>());
    }
}
