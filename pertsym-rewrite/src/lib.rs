//! Selective rewriting of response-theory expression trees.
//!
//! Response functions are derived as long expressions over densities, operators, and energies.
//! This crate extracts the parts of such an expression that involve chosen symbols:
//!
//! - [`find_all`] collects every sub-expression equivalent to a target, where equivalence is
//!   decided by [`matches`];
//! - [`remove_if`] removes every sub-expression in a set, or satisfying a predicate
//!   ([`remove_if_with`]);
//! - [`keep_if`] keeps only the parts containing symbols in a set, using a remainder identity
//!   where a factor is only partially kept;
//! - [`remove_zeros`] cleans up zero terms and operators left behind by the other two.
//!
//! Every traversal returns a new tree, sharing unchanged subtrees with its input. Remove and Keep
//! return `None` when nothing of the input survives, which is distinct from the number zero.
//!
//! ```
//! use pertsym_algebra::Node;
//! use pertsym_rewrite::{keep_if, remove_if};
//! use std::collections::BTreeSet;
//!
//! let (a, b, c) = (Node::symbol("a"), Node::symbol("b"), Node::symbol("c"));
//! let expr = &(&a + &b) + &c;
//! let symbols = BTreeSet::from([b.clone()]);
//!
//! assert_eq!(remove_if(&expr, &symbols).unwrap(), Some(&a + &c));
//! assert_eq!(keep_if(&expr, &symbols, false).unwrap(), Some(b));
//! ```
//!
//! # Errors
//!
//! The traversals fail with an [`Error`] when they reach a node kind they have no rule for
//! ([`UnclassifiedNode`]), or when a rewrite would eliminate the exponent of a power
//! ([`ExponentRemoval`]). The error's report points into the rendering of the input expression:
//!
//! ```
//! use pertsym_algebra::Node;
//! use pertsym_rewrite::{find_all, UnclassifiedNode};
//!
//! let expr = &Node::function("f", vec![Node::symbol("x")]) + &Node::symbol("y");
//! let error = find_all(&expr, &Node::symbol("y")).unwrap_err();
//! assert!(error.kind_is::<UnclassifiedNode>());
//!
//! assert_eq!(error.to_string(), "`find_all` has no rule for nodes of kind `Function`");
//! error.eprint("expr", &expr.to_string()).unwrap();
//! ```

mod engine;
pub mod equivalence;
pub mod error;
mod find;
mod keep;
pub mod options;
mod remove;
pub mod step_collector;
pub mod zeros;

pub use equivalence::{dependency_equivalent, matches};
pub use error::{ExponentRemoval, UnclassifiedNode};
pub use find::find_all;
pub use keep::{keep_if, keep_if_with_options};
pub use options::{FunctionalPolicy, RewriteOptions};
pub use pertsym_error::Error;
pub use remove::{remove_if, remove_if_with, remove_if_with_options};
pub use step_collector::StepCollector;
pub use zeros::{remove_zeros, remove_zeros_with_steps, step::Step};

#[cfg(test)]
mod tests {
    use pertsym_algebra::{Dependencies, Node, Operator, Perturbation, State};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;
    use super::*;

    /// `tr(h*D) + tr(V^(b)*D) + 1/2*G(D, D)`, with `V` depending on `a` only.
    fn energy() -> (Node, Operator) {
        let (a, b) = (Perturbation::new("a"), Perturbation::new("b"));
        let d = Node::density(State::new("D"));
        let h = Node::one_elec_operator(Operator::new("h", Dependencies::new()));
        let v = Operator::new("V", [&a].into_iter().collect());
        let vb = Node::one_elec_operator(v.differentiate(b));
        let g = Operator::new("G", Dependencies::new());

        let half = Node::number(pertsym_algebra::number::frac(1, 2));
        let expr = &(&Node::trace(&h * &d) + &Node::trace(&vb * &d))
            + &(&half * &Node::two_elec_energy(g, d.clone(), d));
        (expr, v)
    }

    #[test]
    fn derivative_by_independent_perturbation_is_found() {
        let (expr, v) = energy();
        let target = Node::one_elec_operator(v.clone());
        let found = find_all(&expr, &target).unwrap();
        assert_eq!(found.len(), 1);

        let vb = Node::one_elec_operator(v.differentiate(Perturbation::new("b")));
        assert_eq!(found, BTreeSet::from([vb]));
    }

    #[test]
    fn unclassified_node_from_every_traversal() {
        let x = Node::symbol("x");
        let expr = &Node::function("f", vec![x.clone()]) + &Node::symbol("y");
        let symbols = BTreeSet::from([x.clone()]);

        let errors = [
            find_all(&expr, &x).unwrap_err(),
            remove_if(&expr, &symbols).unwrap_err(),
            keep_if(&expr, &symbols, false).unwrap_err(),
        ];
        let traversals = errors.iter()
            .map(|error| error.downcast_ref::<UnclassifiedNode>().unwrap().traversal)
            .collect::<Vec<_>>();
        assert_eq!(traversals, vec!["find_all", "remove_if", "keep_if"]);
    }

    #[test]
    fn traversals_share_trees_across_threads() {
        let (expr, _) = energy();
        let d = Node::density(State::new("D"));
        let symbols = BTreeSet::from([d.clone()]);

        let (found, kept) = std::thread::scope(|s| {
            let found = s.spawn(|| find_all(&expr, &d).unwrap());
            let kept = s.spawn(|| keep_if(&expr, &symbols, true).unwrap());
            (found.join().unwrap(), kept.join().unwrap())
        });
        assert_eq!(found, BTreeSet::from([d.clone()]));
        assert_eq!(kept, Some(expr.clone()));
    }
}
