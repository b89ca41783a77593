//! Keeps only the parts of an expression that contain given symbols.
//!
//! Keep runs the Remove traversal with the inverted predicate (remove everything that is not one
//! of the symbols), except where a node can be partially kept. A sum simply loses the terms
//! without a kept part. A factor of a product that is kept only in part would give an expression
//! that is not a sub-expression of the original, so products and two-electron energies are
//! rewritten through a remainder identity, `kept = original - removed`. The matrix product `A*B`
//! with `A = Ak + Ar` keeps `A*B - Ar*B`.
//!
//! In a scalar product the remainder raises each partially kept base to its original exponent,
//! and that exponent must itself be kept. This includes the implicit exponent `1`, so `(a + b)*c`
//! with only `a` kept raises [`ExponentRemoval`](crate::ExponentRemoval).

use crate::{
    engine::{Engine, Fate},
    error::Fault,
    options::RewriteOptions,
    remove::RemoveEngine,
    zeros::remove_zeros,
};
use log::debug;
use pertsym_algebra::{matrix_add, matrix_mul, Expr, Node, Product, ProductBuilder, TwoElecEnergy};
use pertsym_error::Error;
use std::collections::BTreeSet;

/// Keeps the sub-expressions of `expr` that are structurally equal to one of `symbols`, together
/// with whatever they are multiplied by.
///
/// If `remove_zero_residues` is true, the result is passed through
/// [`remove_zeros`](crate::remove_zeros). Returns `Ok(None)` if nothing of `expr` is kept.
///
/// # Errors
///
/// See [`keep_if_with_options`].
pub fn keep_if(expr: &Node, symbols: &BTreeSet<Node>, remove_zero_residues: bool) -> Result<Option<Node>, Error> {
    keep_if_with_options(expr, symbols, remove_zero_residues, RewriteOptions::default())
}

/// Keeps the sub-expressions of `expr` that are structurally equal to one of `symbols`, with the
/// given options.
///
/// A node in `symbols` is kept verbatim, and so is any product, matrix product, or two-electron
/// energy with a factor or state kept verbatim. A factor that is only partially kept makes the
/// result `original - remainder`, where the remainder replaces each partially kept factor `F`
/// by `F - Fk`.
///
/// # Errors
///
/// Returns an [`ExponentRemoval`](crate::ExponentRemoval) error if a base of a scalar product is
/// partially kept while its exponent (possibly the implicit `1`) is not kept, and an
/// [`UnclassifiedNode`](crate::UnclassifiedNode) error if the tree contains a generic function or
/// a generic matrix symbol.
pub fn keep_if_with_options(
    expr: &Node,
    symbols: &BTreeSet<Node>,
    remove_zero_residues: bool,
    options: RewriteOptions,
) -> Result<Option<Node>, Error> {
    let kept = KeepEngine::new(symbols, options)
        .apply(expr)
        .map_err(|fault| fault.locate(expr))?;

    if remove_zero_residues {
        Ok(kept.map(|kept| remove_zeros(&kept)))
    } else {
        Ok(kept)
    }
}

/// Treats a kept part that is zero as not kept at all.
fn survived(kept: Option<Node>) -> Option<Node> {
    kept.filter(|kept| !kept.is_zero() && !matches!(**kept, Expr::ZeroOperator))
}

/// Keeps the nodes in a set of symbols.
pub(crate) struct KeepEngine<'a> {
    symbols: &'a BTreeSet<Node>,
    remove: RemoveEngine<Box<dyn Fn(&Node) -> bool + 'a>>,
}

impl<'a> KeepEngine<'a> {
    pub(crate) fn new(symbols: &'a BTreeSet<Node>, options: RewriteOptions) -> Self {
        let predicate: Box<dyn Fn(&Node) -> bool + 'a> = Box::new(move |node: &Node| !symbols.contains(node));
        Self { symbols, remove: RemoveEngine::new(predicate, options) }
    }
}

impl Engine for KeepEngine<'_> {
    fn traversal(&self) -> &'static str {
        "keep_if"
    }

    fn options(&self) -> &RewriteOptions {
        self.remove.options()
    }

    fn fate(&self, node: &Node) -> Fate {
        if self.symbols.contains(node) {
            Fate::Retain
        } else {
            Fate::Open
        }
    }

    fn atom(&self, node: &Node) -> Option<Node> {
        self.remove.atom(node)
    }

    fn product(&self, node: &Node, product: &Product) -> Result<Option<Node>, Fault> {
        if !product.coef.is_one() && self.fate(&Node::number(product.coef.clone())) == Fate::Retain {
            return Ok(Some(node.clone()));
        }

        let mut remainder = ProductBuilder::new(product.coef.clone());
        let mut partial = false;
        for (base, exp) in &product.dict {
            if self.fate(&Product::unit(base, exp)) == Fate::Retain {
                return Ok(Some(node.clone()));
            }

            match survived(self.apply(base)?) {
                None => remainder.mul_factor(base, exp),
                Some(kept) if kept == *base => return Ok(Some(node.clone())),
                Some(kept) => {
                    if self.apply(exp)?.is_none() {
                        return Err(Fault::exponent(self.traversal(), node, exp));
                    }
                    remainder.mul_factor(&(base - &kept), exp);
                    partial = true;
                },
            }
        }

        if partial {
            let remainder = remainder.build();
            debug!("{}: keeping `{}` as `{} - ({})`", self.traversal(), node, node, remainder);
            Ok(Some(node - &remainder))
        } else {
            Ok(None)
        }
    }

    fn matrix_product(&self, node: &Node, factors: &[Node]) -> Result<Option<Node>, Fault> {
        let mut remainders = vec![Node::number(-1)];
        let mut partial = false;
        for factor in factors {
            match survived(self.apply(factor)?) {
                None => remainders.push(factor.clone()),
                Some(kept) if kept == *factor => return Ok(Some(node.clone())),
                Some(kept) => {
                    remainders.push(factor - &kept);
                    partial = true;
                },
            }
        }

        if partial {
            let remainder = matrix_mul(remainders);
            debug!("{}: keeping `{}` as `{} + ({})`", self.traversal(), node, node, remainder);
            Ok(Some(matrix_add([node.clone(), remainder])))
        } else {
            Ok(None)
        }
    }

    fn bilinear(&self, node: &Node, energy: &TwoElecEnergy) -> Result<Option<Node>, Fault> {
        let inner = survived(self.apply(&energy.inner)?);
        let outer = survived(self.apply(&energy.outer)?);
        if inner.as_ref() == Some(&energy.inner) || outer.as_ref() == Some(&energy.outer) {
            return Ok(Some(node.clone()));
        }
        if inner.is_none() && outer.is_none() {
            return Ok(None);
        }

        let removed = |state: &Node, kept: Option<Node>| match kept {
            Some(kept) => state - &kept,
            None => state.clone(),
        };
        let remainder = Node::two_elec_energy(
            energy.integrals.clone(),
            removed(&energy.inner, inner),
            removed(&energy.outer, outer),
        );
        debug!("{}: keeping `{}` as `{} - {}`", self.traversal(), node, node, remainder);
        Ok(Some(node - &remainder))
    }
}

#[cfg(test)]
mod tests {
    use crate::{remove_if, ExponentRemoval, FunctionalPolicy, UnclassifiedNode};
    use pertsym_algebra::{Dependencies, Operator, State, TemporumType};
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
    fn keep_term_of_sum() {
        let (a, b, c) = (Node::symbol("a"), Node::symbol("b"), Node::symbol("c"));
        let expr = &(&a + &b) + &c;
        assert_eq!(keep_if(&expr, &set([b.clone()]), false).unwrap(), Some(b));
    }

    #[test]
    fn kept_factor_keeps_product() {
        let (x, y) = (Node::symbol("x"), Node::symbol("y"));
        let expr = &x * &y;
        assert_eq!(keep_if(&expr, &set([x.clone()]), false).unwrap(), Some(expr.clone()));
        assert_eq!(keep_if(&expr, &set([Node::symbol("z")]), false).unwrap(), None);
    }

    #[test]
    fn keep_and_remove_complement_on_sums() {
        let (a, b, c) = (Node::symbol("a"), Node::symbol("b"), Node::symbol("c"));
        let expr = &(&a + &(&Node::number(2) * &b)) + &(&Node::number(3) * &(&b * &c));
        let symbols = set([b.clone()]);

        let kept = keep_if(&expr, &symbols, false).unwrap().unwrap();
        let removed = remove_if(&expr, &symbols).unwrap().unwrap();
        assert_eq!(removed, a);
        assert_eq!(&kept + &removed, expr);
    }

    #[test]
    fn partially_kept_matrix_factor() {
        let (d, h, f) = (density("D"), operator("h"), operator("F"));
        let expr = Node::trace(&(&h + &f) * &d);
        assert_eq!(
            keep_if(&expr, &set([f.clone()]), false).unwrap(),
            Some(Node::trace(&(&(&h + &f) * &d) - &(&h * &d))),
        );
        assert_eq!(keep_if(&expr, &set([d.clone()]), false).unwrap(), Some(expr.clone()));
    }

    #[test]
    fn partially_kept_power() {
        let (a, b, n) = (Node::symbol("a"), Node::symbol("b"), Node::symbol("n"));
        let expr = (&a + &b).pow(&n);
        assert_eq!(
            keep_if(&expr, &set([a.clone(), n.clone()]), false).unwrap(),
            Some(&expr - &b.pow(&n)),
        );

        let error = keep_if(&expr, &set([a.clone()]), false).unwrap_err();
        assert!(error.kind_is::<ExponentRemoval>());
    }

    #[test]
    fn partially_kept_factor_needs_its_exponent() {
        let (a, b, c) = (Node::symbol("a"), Node::symbol("b"), Node::symbol("c"));
        let expr = &(&a + &b) * &c;

        let error = keep_if(&expr, &set([a.clone()]), false).unwrap_err();
        let kind = error.downcast_ref::<ExponentRemoval>().unwrap();
        assert_eq!(kind.traversal, "keep_if");
        assert_eq!(kind.exponent, "1");
    }

    #[test]
    fn kept_coefficient_keeps_product() {
        let (x, y) = (Node::symbol("x"), Node::symbol("y"));
        let expr = &Node::number(3) * &(&x * &y);
        assert_eq!(keep_if(&expr, &set([Node::number(3)]), false).unwrap(), Some(expr.clone()));
        assert_eq!(keep_if(&expr, &set([Node::number(2)]), false).unwrap(), None);
    }

    #[test]
    fn wrappers_rebuilt_around_kept_operand() {
        let (d, p) = (density("D"), density("P"));
        let g = Operator::new("G", Dependencies::new());
        let symbols = set([p.clone()]);

        let cases = [
            (Node::two_elec_operator(g.clone(), &d + &p), Node::two_elec_operator(g.clone(), p.clone())),
            (Node::temporum(&d + &p, TemporumType::Ket), Node::temporum(p.clone(), TemporumType::Ket)),
            (Node::conjugate(&d + &p), Node::conjugate(p.clone())),
            (Node::transpose(&d + &p), Node::transpose(p.clone())),
        ];
        for (expr, kept) in cases {
            assert_eq!(keep_if(&expr, &symbols, false).unwrap(), Some(kept));
        }

        let whole = Node::transpose(&d + &p);
        assert_eq!(keep_if(&whole, &set([whole.clone()]), false).unwrap(), Some(whole.clone()));
        assert_eq!(keep_if(&Node::conjugate(d.clone()), &symbols, false).unwrap(), None);
    }

    #[test]
    fn partially_kept_energy_state() {
        let (d, p) = (density("D"), density("P"));
        let g = Operator::new("G", Dependencies::new());
        let energy = Node::two_elec_energy(g.clone(), &d + &p, d.clone());
        assert_eq!(
            keep_if(&energy, &set([p.clone()]), false).unwrap(),
            Some(&energy - &Node::two_elec_energy(g.clone(), d.clone(), d.clone())),
        );
        assert_eq!(keep_if(&energy, &set([d.clone()]), false).unwrap(), Some(energy.clone()));
        assert_eq!(keep_if(&energy, &set([Node::symbol("x")]), false).unwrap(), None);
    }

    #[test]
    fn functionals_follow_policy() {
        let x = Node::symbol("x");
        let exc = Node::exch_corr_energy("Exc", vec![density("D")]);
        let expr = &exc + &x;
        let symbols = set([x.clone()]);

        assert_eq!(keep_if(&expr, &symbols, false).unwrap(), Some(expr.clone()));

        let options = RewriteOptions::default().with_functionals(FunctionalPolicy::Atomic);
        assert_eq!(keep_if_with_options(&expr, &symbols, false, options).unwrap(), Some(x));
    }

    #[test]
    fn zero_residues_are_removed() {
        let d = density("D");
        let expr = Node::trace(matrix_add([d.clone(), Node::zero_operator()]));
        let symbols = set([d.clone(), Node::zero_operator()]);
        assert_eq!(keep_if(&expr, &symbols, false).unwrap(), Some(expr.clone()));
        assert_eq!(keep_if(&expr, &symbols, true).unwrap(), Some(Node::trace(d)));
    }

    #[test]
    fn unclassified_node_is_a_fault() {
        let y = Node::symbol("y");
        let expr = &Node::function("f", vec![Node::symbol("x")]) + &y;
        let error = keep_if(&expr, &set([y]), false).unwrap_err();
        let kind = error.downcast_ref::<UnclassifiedNode>().unwrap();
        assert_eq!(kind.traversal, "keep_if");
        assert_eq!(kind.kind, "Function");
    }
}
