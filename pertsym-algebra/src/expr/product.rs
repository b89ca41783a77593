//! Scalar products and the accumulator used to build them.

use crate::number::{Number, ONE};
use std::collections::{btree_map::Entry, BTreeMap};
use super::{sum::SumBuilder, Expr, Node};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A scalar product `coef · Π b^e`, mapping each base `b` to its exponent `e`.
///
/// A single power `b^e` is a product with coefficient one and one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Product {
    pub coef: Number,
    pub dict: BTreeMap<Node, Node>,
}

impl Product {
    /// Builds the canonical node for `coef · Π b^e`.
    ///
    /// Entries with a zero exponent are dropped. A zero coefficient gives zero, a product with no
    /// entries is its coefficient, and a single base with exponent one and coefficient one is the
    /// base itself. A number times a single sum distributes over the sum.
    pub fn from_dict(coef: Number, mut dict: BTreeMap<Node, Node>) -> Node {
        dict.retain(|_, exp| !exp.is_zero());
        if coef.is_zero() {
            return Node::number(coef);
        }
        if dict.is_empty() {
            return Node::number(coef);
        }

        if dict.len() == 1 {
            if let Some((base, exp)) = dict.first_key_value() {
                if exp.is_one() {
                    if coef.is_one() {
                        return base.clone();
                    }
                    if let Expr::Add(_) = &**base {
                        let mut sum = SumBuilder::default();
                        sum.add_term(&coef, base);
                        return sum.build();
                    }
                }
            }
        }

        Node::new(Expr::Mul(Product { coef, dict }))
    }

    /// Returns the pair `b^e` of a product as a node on its own.
    pub fn unit(base: &Node, exp: &Node) -> Node {
        Self::from_dict(ONE.clone(), BTreeMap::from([(base.clone(), exp.clone())]))
    }

    /// Returns `mult·term` for a term that is not a number or a sum.
    pub(crate) fn scaled(mult: &Number, term: &Node) -> Node {
        if mult.is_one() {
            return term.clone();
        }

        match &**term {
            Expr::Mul(product) => Self::from_dict(mult * &product.coef, product.dict.clone()),
            _ => Self::from_dict(mult.clone(), BTreeMap::from([(term.clone(), Node::number(1))])),
        }
    }

    /// Returns the product with its coefficient replaced by one.
    pub fn unit_part(&self) -> Node {
        Self::from_dict(ONE.clone(), self.dict.clone())
    }

    /// If the product is a single power `b^e`, returns the base and exponent.
    pub fn as_power(&self) -> Option<(&Node, &Node)> {
        if self.coef.is_one() && self.dict.len() == 1 {
            self.dict.first_key_value().filter(|(_, exp)| !exp.is_one())
        } else {
            None
        }
    }
}

/// Accumulates the factors of a product.
#[derive(Debug, Clone)]
pub struct ProductBuilder {
    coef: Number,
    dict: BTreeMap<Node, Node>,
}

impl Default for ProductBuilder {
    fn default() -> Self {
        Self::new(ONE.clone())
    }
}

impl From<ProductBuilder> for Node {
    fn from(value: ProductBuilder) -> Self {
        value.build()
    }
}

impl ProductBuilder {
    /// Creates an accumulator starting from the given coefficient.
    pub fn new(coef: Number) -> Self {
        Self { coef, dict: BTreeMap::new() }
    }

    /// Multiplies by a factor with exponent one.
    pub fn mul(&mut self, factor: &Node) {
        self.mul_factor(factor, &Node::number(1));
    }

    /// Multiplies by `base^exp`.
    ///
    /// Numbers raised to integer powers fold into the coefficient, and products raised to integer
    /// powers are merged factor by factor. Equal bases add their exponents.
    pub fn mul_factor(&mut self, base: &Node, exp: &Node) {
        if exp.is_zero() {
            return;
        }

        if let Some(k) = exp.as_number().and_then(Number::as_integer) {
            match &**base {
                Expr::Number(n) => {
                    if let Some(value) = n.powi(k) {
                        self.coef = &self.coef * &value;
                        return;
                    }
                },
                Expr::Mul(product) => {
                    if let Some(value) = product.coef.powi(k) {
                        self.coef = &self.coef * &value;
                        for (b, e) in &product.dict {
                            self.insert(b.clone(), e * exp);
                        }
                        return;
                    }
                },
                _ => {},
            }
        }

        self.insert(base.clone(), exp.clone());
    }

    /// Adds `exp` to the exponent of `base`, dropping the entry if it cancels.
    fn insert(&mut self, base: Node, exp: Node) {
        match self.dict.entry(base) {
            Entry::Vacant(entry) => {
                if !exp.is_zero() {
                    entry.insert(exp);
                }
            },
            Entry::Occupied(mut entry) => {
                let total = entry.get() + &exp;
                if total.is_zero() {
                    entry.remove();
                } else {
                    *entry.get_mut() = total;
                }
            },
        }
    }

    /// Builds the canonical product.
    pub fn build(self) -> Node {
        Product::from_dict(self.coef, self.dict)
    }
}
