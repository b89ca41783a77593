//! Constructors for matrix sums and products.

use crate::number::{Number, ONE};
use std::collections::BTreeMap;
use super::{product::ProductBuilder, Expr, Node};

/// Splits a matrix term into its numeric coefficient and the remaining matrix.
fn split_coef(term: &Node) -> (Number, Node) {
    if let Expr::MatrixMul(factors) = &**term {
        if let Some((first, rest)) = factors.split_first() {
            if let Some(n) = first.as_number() {
                return (n.clone(), matrix_mul(rest.iter().cloned()));
            }
            if let Expr::Mul(product) = &**first {
                if !product.coef.is_one() {
                    let factors = std::iter::once(product.unit_part()).chain(rest.iter().cloned());
                    return (product.coef.clone(), matrix_mul(factors));
                }
            }
        }
    }
    (ONE.clone(), term.clone())
}

/// Pushes the terms of `term` into `combined`, flattening nested matrix sums.
fn collect_terms(term: Node, combined: &mut BTreeMap<Node, Number>, has_zero: &mut bool) {
    match &*term {
        Expr::MatrixAdd(terms) => {
            for term in terms {
                collect_terms(term.clone(), combined, has_zero);
            }
        },
        Expr::ZeroOperator => *has_zero = true,
        _ => {
            let (coef, matrix) = split_coef(&term);
            let total = combined.get(&matrix).map(|c| c + &coef).unwrap_or(coef);
            combined.insert(matrix, total);
        },
    }
}

/// Builds the sum of the given matrices.
///
/// Nested matrix sums are flattened and like terms combined, so `X - X` cancels. Explicit zero
/// operators are kept once; a sum where everything cancels is the zero operator.
pub fn matrix_add(terms: impl IntoIterator<Item = Node>) -> Node {
    let mut combined = BTreeMap::new();
    let mut has_zero = false;
    for term in terms {
        collect_terms(term, &mut combined, &mut has_zero);
    }

    let mut operands = combined
        .into_iter()
        .filter(|(_, coef)| !coef.is_zero())
        .map(|(matrix, coef)| if coef.is_one() {
            matrix
        } else {
            matrix_mul([Node::number(coef), matrix])
        })
        .collect::<Vec<_>>();
    if has_zero {
        operands.push(Node::zero_operator());
    }

    match operands.len() {
        0 => Node::zero_operator(),
        1 => operands.remove(0),
        _ => Node::new(Expr::MatrixAdd(operands)),
    }
}

/// Pushes the factors of `factor` into `scalar` or `matrices`, flattening nested matrix products.
fn collect_factors(factor: Node, scalar: &mut ProductBuilder, matrices: &mut Vec<Node>) {
    match &*factor {
        Expr::MatrixMul(factors) => {
            for factor in factors {
                collect_factors(factor.clone(), scalar, matrices);
            }
        },
        _ if factor.is_matrix() => matrices.push(factor),
        _ => scalar.mul(&factor),
    }
}

/// Builds the ordered product of the given factors.
///
/// Nested matrix products are flattened. Scalar factors are multiplied together into a single
/// leading factor, which is omitted when it is one. The order of the matrix factors is kept.
pub fn matrix_mul(factors: impl IntoIterator<Item = Node>) -> Node {
    let mut scalar = ProductBuilder::default();
    let mut matrices = Vec::new();
    for factor in factors {
        collect_factors(factor, &mut scalar, &mut matrices);
    }

    let scalar = scalar.build();
    if matrices.is_empty() {
        return scalar;
    }
    if scalar.is_one() && matrices.len() == 1 {
        return matrices.remove(0);
    }

    let mut operands = Vec::with_capacity(matrices.len() + 1);
    if !scalar.is_one() {
        operands.push(scalar);
    }
    operands.extend(matrices);
    Node::new(Expr::MatrixMul(operands))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    fn matrices() -> (Node, Node, Node) {
        (Node::matrix_symbol("A"), Node::matrix_symbol("B"), Node::matrix_symbol("C"))
    }

    #[test]
    fn like_terms_cancel() {
        let (a, b, _) = matrices();
        let ab = &a * &b;
        assert_eq!(matrix_add([ab.clone(), -&ab]), Node::zero_operator());
        assert_eq!(matrix_add([ab.clone(), a.clone(), ab.clone()]).to_string(), "A + 2*A*B");
    }

    #[test]
    fn nested_products_flatten() {
        let (a, b, c) = matrices();
        let x = Node::symbol("x");
        let expr = matrix_mul([a.clone(), &x * &b, c.clone()]);
        assert_eq!(expr, Node::new(Expr::MatrixMul(vec![x, a, b, c])));
    }

    #[test]
    fn scalars_gather_in_front() {
        let (a, b, _) = matrices();
        let expr = matrix_mul([Node::number(2), a.clone(), Node::number(3), b.clone()]);
        assert_eq!(expr.to_string(), "6*A*B");
        assert_eq!(matrix_mul([Node::number(1), a.clone()]), a);
    }

    #[test]
    fn zero_operator_is_kept_once() {
        let (a, _, _) = matrices();
        let expr = matrix_add([a.clone(), Node::zero_operator(), Node::zero_operator()]);
        assert_eq!(expr, Node::new(Expr::MatrixAdd(vec![a, Node::zero_operator()])));
    }
}
