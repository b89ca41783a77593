//! Arithmetic operators on [`Node`]s.
//!
//! Each operator picks the matrix constructors when either operand is matrix-valued, and the
//! scalar builders otherwise.

use crate::number::MINUS_ONE;
use std::ops::{Add, Mul, Neg, Sub};
use super::{
    matrix::{matrix_add, matrix_mul},
    product::ProductBuilder,
    sum::SumBuilder,
    Node,
};

impl Add<&Node> for &Node {
    type Output = Node;

    fn add(self, rhs: &Node) -> Node {
        if self.is_matrix() || rhs.is_matrix() {
            return matrix_add([self.clone(), rhs.clone()]);
        }

        let mut sum = SumBuilder::default();
        sum.add(self);
        sum.add(rhs);
        sum.build()
    }
}

impl Sub<&Node> for &Node {
    type Output = Node;

    fn sub(self, rhs: &Node) -> Node {
        self + &-rhs
    }
}

impl Mul<&Node> for &Node {
    type Output = Node;

    fn mul(self, rhs: &Node) -> Node {
        if self.is_matrix() || rhs.is_matrix() {
            return matrix_mul([self.clone(), rhs.clone()]);
        }

        let mut product = ProductBuilder::default();
        product.mul(self);
        product.mul(rhs);
        product.build()
    }
}

impl Neg for &Node {
    type Output = Node;

    fn neg(self) -> Node {
        &Node::number(MINUS_ONE.clone()) * self
    }
}

impl Add for Node {
    type Output = Node;

    fn add(self, rhs: Node) -> Node {
        &self + &rhs
    }
}

impl Sub for Node {
    type Output = Node;

    fn sub(self, rhs: Node) -> Node {
        &self - &rhs
    }
}

impl Mul for Node {
    type Output = Node;

    fn mul(self, rhs: Node) -> Node {
        &self * &rhs
    }
}

impl Neg for Node {
    type Output = Node;

    fn neg(self) -> Node {
        -&self
    }
}
