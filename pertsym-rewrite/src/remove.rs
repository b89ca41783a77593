//! Removes every sub-expression that satisfies a predicate.

use crate::{
    engine::{Engine, Fate},
    error::Fault,
    options::RewriteOptions,
};
use pertsym_algebra::{matrix_mul, Node, Product, ProductBuilder, TwoElecEnergy};
use pertsym_error::Error;
use std::collections::BTreeSet;

/// Removes every sub-expression of `expr` that is structurally equal to one of `symbols`.
///
/// Returns `Ok(None)` if nothing of `expr` survives. See [`remove_if_with_options`] for the rules.
///
/// # Errors
///
/// See [`remove_if_with_options`].
pub fn remove_if(expr: &Node, symbols: &BTreeSet<Node>) -> Result<Option<Node>, Error> {
    remove_if_with(expr, |node| symbols.contains(node))
}

/// Removes every sub-expression of `expr` for which `predicate` returns true.
///
/// # Errors
///
/// See [`remove_if_with_options`].
pub fn remove_if_with(expr: &Node, predicate: impl Fn(&Node) -> bool) -> Result<Option<Node>, Error> {
    remove_if_with_options(expr, predicate, RewriteOptions::default())
}

/// Removes every sub-expression of `expr` for which `predicate` returns true, with the given
/// options.
///
/// The predicate is tested against whole nodes first, so a matching sum or product disappears as
/// a whole. Otherwise:
///
/// - a term `m*t` of a sum is dropped if the term as a whole or its multiplier matches; other terms
///   are rewritten in turn. A matching coefficient becomes zero, and so may the whole sum.
/// - a product is absent if its coefficient, one of its factors `b^e`, or one of its bases is
///   removed.
/// - a matrix sum loses its removed operands, and is absent if none survive.
/// - a matrix product, a two-electron energy, or a wrapper (trace, transpose, two-electron
///   operator, ...) is absent if any operand is.
///
/// Returns `Ok(None)` if nothing of `expr` survives.
///
/// # Errors
///
/// Returns an [`ExponentRemoval`](crate::ExponentRemoval) error if an exponent of a power would
/// be removed while its base survives, and an [`UnclassifiedNode`](crate::UnclassifiedNode) error
/// if the tree contains a generic function or a generic matrix symbol.
pub fn remove_if_with_options(
    expr: &Node,
    predicate: impl Fn(&Node) -> bool,
    options: RewriteOptions,
) -> Result<Option<Node>, Error> {
    RemoveEngine::new(predicate, options)
        .apply(expr)
        .map_err(|fault| fault.locate(expr))
}

/// Removes the nodes a predicate holds for.
pub(crate) struct RemoveEngine<P> {
    predicate: P,
    options: RewriteOptions,
}

impl<P: Fn(&Node) -> bool> RemoveEngine<P> {
    pub(crate) fn new(predicate: P, options: RewriteOptions) -> Self {
        Self { predicate, options }
    }

    pub(crate) fn should_remove(&self, node: &Node) -> bool {
        (self.predicate)(node)
    }
}

impl<P: Fn(&Node) -> bool> Engine for RemoveEngine<P> {
    fn traversal(&self) -> &'static str {
        "remove_if"
    }

    fn options(&self) -> &RewriteOptions {
        &self.options
    }

    fn fate(&self, node: &Node) -> Fate {
        if self.should_remove(node) {
            Fate::Drop
        } else {
            Fate::Open
        }
    }

    fn atom(&self, node: &Node) -> Option<Node> {
        (!self.should_remove(node)).then(|| node.clone())
    }

    fn product(&self, node: &Node, product: &Product) -> Result<Option<Node>, Fault> {
        if !product.coef.is_one() && self.apply(&Node::number(product.coef.clone()))?.is_none() {
            return Ok(None);
        }

        let mut changed = false;
        let mut rebuilt = ProductBuilder::new(product.coef.clone());
        for (base, exp) in &product.dict {
            if self.fate(&Product::unit(base, exp)) == Fate::Drop {
                return Ok(None);
            }
            let Some(new_base) = self.apply(base)? else {
                return Ok(None);
            };
            let Some(new_exp) = self.apply(exp)? else {
                return Err(Fault::exponent(self.traversal(), node, exp));
            };
            changed |= !new_base.ptr_eq(base) || !new_exp.ptr_eq(exp);
            rebuilt.mul_factor(&new_base, &new_exp);
        }

        if changed {
            Ok(Some(rebuilt.build()))
        } else {
            Ok(Some(node.clone()))
        }
    }

    fn matrix_product(&self, node: &Node, factors: &[Node]) -> Result<Option<Node>, Fault> {
        let mut changed = false;
        let mut rebuilt = Vec::with_capacity(factors.len());
        for factor in factors {
            let Some(new_factor) = self.apply(factor)? else {
                return Ok(None);
            };
            changed |= !new_factor.ptr_eq(factor);
            rebuilt.push(new_factor);
        }

        if changed {
            Ok(Some(matrix_mul(rebuilt)))
        } else {
            Ok(Some(node.clone()))
        }
    }

    fn bilinear(&self, node: &Node, energy: &TwoElecEnergy) -> Result<Option<Node>, Fault> {
        let Some(inner) = self.apply(&energy.inner)? else {
            return Ok(None);
        };
        let Some(outer) = self.apply(&energy.outer)? else {
            return Ok(None);
        };

        if inner.ptr_eq(&energy.inner) && outer.ptr_eq(&energy.outer) {
            Ok(Some(node.clone()))
        } else {
            Ok(Some(Node::two_elec_energy(energy.integrals.clone(), inner, outer)))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{find_all, ExponentRemoval, UnclassifiedNode};
    use pertsym_algebra::{Dependencies, Operator, Perturbation, State, TemporumType};
    use pretty_assertions::assert_eq;
    use super::*;

    fn set<const N: usize>(nodes: [Node; N]) -> BTreeSet<Node> {
        nodes.into_iter().collect()
    }

    fn density(name: &str) -> Node {
        Node::density(State::new(name))
    }

    fn operator(name: &str) -> Node {
        Node::one_elec_operator(Operator::new(name, Dependencies::new()))
    }

    #[test]
    fn remove_term_of_sum() {
        let (a, b, c) = (Node::symbol("a"), Node::symbol("b"), Node::symbol("c"));
        let expr = &(&a + &b) + &c;
        assert_eq!(remove_if(&expr, &set([b.clone()])).unwrap(), Some(&a + &c));
    }

    #[test]
    fn remove_factor_of_product() {
        let (x, y) = (Node::symbol("x"), Node::symbol("y"));
        assert_eq!(remove_if(&(&x * &y), &set([x.clone()])).unwrap(), None);
        assert_eq!(remove_if(&(&Node::number(3) * &y), &set([Node::number(3)])).unwrap(), None);
    }

    #[test]
    fn remove_whole_sum() {
        let (a, b) = (Node::symbol("a"), Node::symbol("b"));
        let expr = &a + &b;
        assert_eq!(remove_if(&expr, &set([expr.clone()])).unwrap(), None);
        assert_eq!(remove_if(&expr, &set([a.clone(), b.clone()])).unwrap(), Some(Node::number(0)));
    }

    #[test]
    fn remove_coefficient_of_sum() {
        let a = Node::symbol("a");
        let expr = &Node::number(5) + &a;
        assert_eq!(remove_if(&expr, &set([Node::number(5)])).unwrap(), Some(a));
    }

    #[test]
    fn remove_by_multiplier() {
        let (a, b) = (Node::symbol("a"), Node::symbol("b"));
        let expr = &(&Node::number(2) * &a) + &b;
        assert_eq!(remove_if(&expr, &set([Node::number(2)])).unwrap(), Some(b));
    }

    #[test]
    fn unchanged_tree_is_shared() {
        let d = density("D");
        let h = operator("h");
        let expr = Node::trace(&h * &d) + Node::symbol("x");
        let result = remove_if(&expr, &set([Node::symbol("y")])).unwrap().unwrap();
        assert!(result.ptr_eq(&expr));
    }

    #[test]
    fn remove_inside_trace() {
        let (d, h, f) = (density("D"), operator("h"), operator("F"));
        let expr = Node::trace(&(&h + &f) * &d);
        assert_eq!(
            remove_if(&expr, &set([f.clone()])).unwrap(),
            Some(Node::trace(&h * &d)),
        );
        assert_eq!(remove_if(&expr, &set([d.clone()])).unwrap(), None);
    }

    #[test]
    fn removed_matrix_sum_operands() {
        let (h, f) = (operator("h"), operator("F"));
        let expr = &h + &f;
        assert_eq!(remove_if(&expr, &set([f.clone()])).unwrap(), Some(h.clone()));
        assert_eq!(remove_if(&expr, &set([f, h])).unwrap(), None);
    }

    #[test]
    fn matrix_product_keeps_order() {
        let (a, b, c) = (operator("A"), operator("B"), operator("C"));
        let expr = Node::trace(matrix_mul([a.clone(), &b + &c, a.clone()]));
        assert_eq!(
            remove_if(&expr, &set([c.clone()])).unwrap(),
            Some(Node::trace(matrix_mul([a.clone(), b.clone(), a.clone()]))),
        );
    }

    #[test]
    fn two_electron_operator_and_energy() {
        let (d, p) = (density("D"), density("P"));
        let g = Operator::new("G", Dependencies::new());
        let expr = Node::trace(&Node::two_elec_operator(g.clone(), &d + &p) * &d);
        assert_eq!(
            remove_if(&expr, &set([p.clone()])).unwrap(),
            Some(Node::trace(&Node::two_elec_operator(g.clone(), d.clone()) * &d)),
        );

        let energy = Node::two_elec_energy(g, &d + &p, d.clone());
        assert_eq!(remove_if(&energy, &set([d.clone()])).unwrap(), None);
    }

    #[test]
    fn time_derivative_rebuilt_around_operand() {
        let (d, p) = (density("D"), density("P"));
        let expr = Node::trace(Node::temporum(&d + &p, TemporumType::Bra));
        assert_eq!(
            remove_if(&expr, &set([p])).unwrap(),
            Some(Node::trace(Node::temporum(d, TemporumType::Bra))),
        );
    }

    #[test]
    fn conjugate_and_transpose_rebuilt_around_operand() {
        let (d, p, h) = (density("D"), density("P"), operator("h"));
        let expr = Node::trace(&Node::conjugate(&d + &p) * &Node::transpose(&h * &p));
        assert_eq!(
            remove_if(&expr, &set([d.clone()])).unwrap(),
            Some(Node::trace(&Node::conjugate(p.clone()) * &Node::transpose(&h * &p))),
        );
        assert_eq!(remove_if(&expr, &set([h.clone()])).unwrap(), None);
    }

    #[test]
    fn tagged_leaves_are_atoms() {
        let a = Perturbation::new("a");
        let d = density("D");
        let s = operator("S");
        let lambda = Node::lag_multiplier(State::new("Z"));
        let nuclear = Node::non_elec_function(Operator::new("hnuc", [&a].into_iter().collect()));
        let overlap = Node::temporum_overlap([&a].into_iter().collect(), [a.clone()].into_iter().collect());
        let ds = Node::matrix_derivative(s.clone(), [a.clone()].into_iter().collect());

        let terms = [
            Node::trace(&lambda * &d),
            Node::trace(&overlap * &d),
            nuclear.clone(),
            Node::trace(&ds * &d),
        ];
        let expr = terms.iter().fold(Node::number(0), |sum, term| &sum + term);

        for (i, leaf) in [lambda, overlap, nuclear, ds].into_iter().enumerate() {
            let rest = terms.iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .fold(Node::number(0), |sum, (_, term)| &sum + term);
            assert_eq!(remove_if(&expr, &set([leaf])).unwrap(), Some(rest));
        }

        // the differentiated symbol is not a sub-expression of its derivative
        assert_eq!(remove_if(&expr, &set([s])).unwrap(), Some(expr.clone()));
    }

    #[test]
    fn idempotent() {
        let (a, b, c) = (Node::symbol("a"), Node::symbol("b"), Node::symbol("c"));
        let (d, h) = (density("D"), operator("h"));
        let expr = &(&(&a * &b) + &c) + &Node::trace(&(&h * &d) + &(&d * &h));
        let symbols = set([b.clone(), d.clone()]);

        let once = remove_if(&expr, &symbols).unwrap().unwrap();
        assert_eq!(once, c);
        assert_eq!(remove_if(&once, &symbols).unwrap(), Some(once.clone()));
    }

    #[test]
    fn removed_nodes_cannot_be_found() {
        let (x, y, z) = (Node::symbol("x"), Node::symbol("y"), Node::symbol("z"));
        let expr = &(&x * &(&y + &z)) + &Node::composite_function("f", &y + &x);
        let symbols = set([y.clone()]);
        let result = remove_if(&expr, &symbols).unwrap().unwrap();
        assert_eq!(find_all(&result, &y).unwrap(), BTreeSet::new());
        assert_eq!(result, &(&x * &z) + &Node::composite_function("f", x.clone()));
    }

    #[test]
    fn removed_nodes_cannot_be_found_inside_wrappers() {
        let (d, p, h) = (density("D"), density("P"), operator("h"));
        let expr = &Node::trace(&Node::conjugate(&h + &p) * &d)
            + &Node::trace(&Node::temporum(&d + &p, TemporumType::Ket) * &h);
        let symbols = set([p.clone()]);

        let result = remove_if(&expr, &symbols).unwrap().unwrap();
        assert_eq!(
            result,
            &Node::trace(&Node::conjugate(h.clone()) * &d)
                + &Node::trace(&Node::temporum(d.clone(), TemporumType::Ket) * &h),
        );
        for symbol in &symbols {
            assert_eq!(find_all(&result, symbol).unwrap(), BTreeSet::new());
        }
    }

    #[test]
    fn removing_exponent_is_a_fault() {
        let (x, y) = (Node::symbol("x"), Node::symbol("y"));
        let expr = &Node::symbol("z") + &x.pow(&y);
        let error = remove_if(&expr, &set([y])).unwrap_err();
        assert!(error.kind_is::<ExponentRemoval>());
    }

    #[test]
    fn predicate_form() {
        let d = density("D");
        let da = Node::density(State::new("D").differentiate(Perturbation::new("a")));
        let h = operator("h");
        let expr = Node::trace(&h * &d) + Node::trace(&h * &da);
        let result = remove_if_with(&expr, |node| *node == da).unwrap();
        assert_eq!(result, Some(Node::trace(&h * &d)));
    }

    #[test]
    fn functionals_pass_through() {
        let d = density("D");
        let exc = Node::exch_corr_energy("Exc", vec![d.clone()]);
        let expr = &exc + &Node::symbol("x");

        assert_eq!(remove_if(&expr, &set([d.clone()])).unwrap(), Some(expr.clone()));
        assert_eq!(remove_if(&expr, &set([exc.clone()])).unwrap(), Some(Node::symbol("x")));
    }

    #[test]
    fn unclassified_node_is_a_fault() {
        let expr = Node::trace(&Node::matrix_symbol("A") * &density("D"));
        let error = remove_if(&expr, &set([Node::symbol("x")])).unwrap_err();
        let kind = error.downcast_ref::<UnclassifiedNode>().unwrap();
        assert_eq!(kind.traversal, "remove_if");
        assert_eq!(kind.kind, "MatrixSymbol");
    }
}
