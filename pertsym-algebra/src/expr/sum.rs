//! Scalar sums and the accumulator used to build them.

use crate::number::{Number, ONE, ZERO};
use std::collections::{btree_map::Entry, BTreeMap};
use super::{product::Product, Expr, Node};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A scalar sum `coef + Σ m·t`, mapping each term `t` to its numeric multiplier `m`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sum {
    pub coef: Number,
    pub dict: BTreeMap<Node, Number>,
}

impl Sum {
    /// Builds the canonical node for `coef + Σ m·t`.
    ///
    /// Terms with a zero multiplier are dropped. A sum with no terms is its coefficient, and a sum
    /// of a single term with no coefficient is that term scaled by its multiplier.
    pub fn from_dict(coef: Number, mut dict: BTreeMap<Node, Number>) -> Node {
        dict.retain(|_, mult| !mult.is_zero());
        if dict.is_empty() {
            return Node::number(coef);
        }

        if coef.is_zero() && dict.len() == 1 {
            if let Some((term, mult)) = dict.pop_first() {
                return Product::scaled(&mult, &term);
            }
        }

        Node::new(Expr::Add(Sum { coef, dict }))
    }

    /// Returns the pair `m·t` of a sum as a node on its own.
    pub fn unit(term: &Node, mult: &Number) -> Node {
        Product::scaled(mult, term)
    }
}

/// Accumulates the terms of a sum.
#[derive(Debug, Clone)]
pub struct SumBuilder {
    coef: Number,
    dict: BTreeMap<Node, Number>,
}

impl Default for SumBuilder {
    fn default() -> Self {
        Self::new(ZERO.clone())
    }
}

impl From<SumBuilder> for Node {
    fn from(value: SumBuilder) -> Self {
        value.build()
    }
}

impl SumBuilder {
    /// Creates an accumulator starting from the given coefficient.
    pub fn new(coef: Number) -> Self {
        Self { coef, dict: BTreeMap::new() }
    }

    /// Adds a term with multiplier one.
    pub fn add(&mut self, term: &Node) {
        self.add_term(&ONE, term);
    }

    /// Adds `mult·term`.
    ///
    /// Numbers fold into the coefficient and sums are merged term by term. A product with a
    /// coefficient other than one is recorded as its unit part, with the coefficient moved into
    /// the multiplier.
    pub fn add_term(&mut self, mult: &Number, term: &Node) {
        if mult.is_zero() {
            return;
        }

        match &**term {
            Expr::Number(n) => self.coef = &self.coef + &(mult * n),
            Expr::Add(sum) => {
                self.coef = &self.coef + &(mult * &sum.coef);
                for (t, m) in &sum.dict {
                    self.insert(t.clone(), mult * m);
                }
            },
            Expr::Mul(product) if !product.coef.is_one() => {
                self.insert(product.unit_part(), mult * &product.coef);
            },
            _ => self.insert(term.clone(), mult.clone()),
        }
    }

    /// Adds `mult` to the multiplier of `term`, dropping the entry if it cancels.
    fn insert(&mut self, term: Node, mult: Number) {
        match self.dict.entry(term) {
            Entry::Vacant(entry) => {
                if !mult.is_zero() {
                    entry.insert(mult);
                }
            },
            Entry::Occupied(mut entry) => {
                let total = &*entry.get() + &mult;
                if total.is_zero() {
                    entry.remove();
                } else {
                    *entry.get_mut() = total;
                }
            },
        }
    }

    /// Builds the canonical sum.
    pub fn build(self) -> Node {
        Sum::from_dict(self.coef, self.dict)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn like_terms_combine() {
        let x = Node::symbol("x");
        let mut sum = SumBuilder::default();
        sum.add(&x);
        sum.add_term(&Number::from(2), &x);
        sum.add(&Node::number(5));
        assert_eq!(sum.build().to_string(), "5 + 3*x");
    }

    #[test]
    fn cancelling_terms_vanish() {
        let x = Node::symbol("x");
        let y = Node::symbol("y");
        let expr = &(&x + &y) - &x;
        assert_eq!(expr, y);
        assert_eq!(&x - &x, Node::number(0));
    }

    #[test]
    fn scaled_products_are_unit_parts() {
        let (x, y) = (Node::symbol("x"), Node::symbol("y"));
        let xy = &x * &y;
        let expr = &(&Node::number(3) * &xy) + &xy;

        let Expr::Mul(product) = &*expr else {
            panic!("expected a product, got {}", expr);
        };
        assert_eq!(product.coef, Number::from(4));
        assert_eq!(product.unit_part(), xy);
    }
}
