//! Faults raised by the traversals.
//!
//! Inside a traversal, faults are propagated as a lightweight [`Fault`] holding the offending
//! nodes. The public entry points locate the fault in the rendering of the expression they were
//! called on and return an [`Error`], whose report uses that rendering (`expr.to_string()`) as its
//! source text.

use log::debug;
use pertsym_algebra::Node;
use pertsym_attrs::ErrorKind;
use pertsym_error::{Error, ErrorKind};
use std::ops::Range;

/// A traversal reached a node kind it has no rule for, such as a generic function or a generic
/// matrix symbol.
#[derive(Debug, Clone, PartialEq, Eq, ErrorKind)]
#[error(
    message = format!("`{}` has no rule for nodes of kind `{}`", traversal, kind),
    labels = [format!("this {} node", kind)],
    help = "build the expression from named operators, densities, and functionals instead of generic functions or matrices",
    note = format!("the node is `{}`", node),
)]
pub struct UnclassifiedNode {
    /// The traversal that raised the fault.
    pub traversal: &'static str,

    /// The kind of the offending node.
    pub kind: &'static str,

    /// The rendering of the offending node.
    pub node: String,
}

/// Removing or keeping symbols would eliminate the exponent of a power inside a product.
#[derive(Debug, Clone, PartialEq, Eq, ErrorKind)]
#[error(
    message = format!("`{}` would eliminate the exponent `{}` of a product", traversal, exponent),
    labels = ["in this product", "this exponent would become absent"],
    help = "an exponent cannot be removed from a power; remove or keep the whole power instead",
)]
pub struct ExponentRemoval {
    /// The traversal that raised the fault.
    pub traversal: &'static str,

    /// The rendering of the product.
    pub product: String,

    /// The rendering of the exponent.
    pub exponent: String,
}

/// A fault raised while traversing a tree, before it is located in the tree's rendering.
#[derive(Debug, Clone)]
pub(crate) enum Fault {
    Unclassified {
        traversal: &'static str,
        node: Node,
    },
    Exponent {
        traversal: &'static str,
        product: Node,
        exponent: Node,
    },
}

impl Fault {
    pub(crate) fn unclassified(traversal: &'static str, node: &Node) -> Self {
        debug!("{}: no rule for {} node `{}`", traversal, node.kind(), node);
        Self::Unclassified { traversal, node: node.clone() }
    }

    pub(crate) fn exponent(traversal: &'static str, product: &Node, exponent: &Node) -> Self {
        debug!("{}: exponent `{}` of `{}` would become absent", traversal, exponent, product);
        Self::Exponent { traversal, product: product.clone(), exponent: exponent.clone() }
    }

    /// Converts the fault into an [`Error`] whose spans point into the rendering of `root`.
    pub(crate) fn locate(self, root: &Node) -> Error {
        let src = root.to_string();
        match self {
            Self::Unclassified { traversal, node } => {
                let kind = node.kind();
                let node = node.to_string();
                let span = span_of(&src, &node, 0..src.len());
                Error::new(vec![span], UnclassifiedNode { traversal, kind, node })
            },
            Self::Exponent { traversal, product, exponent } => {
                let (product, exponent) = (product.to_string(), exponent.to_string());
                let product_span = span_of(&src, &product, 0..src.len());
                let exponent_span = span_of(&src, &exponent, product_span.clone());
                Error::new(
                    vec![product_span, exponent_span],
                    ExponentRemoval { traversal, product, exponent },
                )
            },
        }
    }
}

/// Returns the span of the first occurrence of `text` within `within` of `src`, or `within`
/// itself if there is none.
fn span_of(src: &str, text: &str, within: Range<usize>) -> Range<usize> {
    src.get(within.clone())
        .and_then(|region| region.find(text))
        .map(|offset| within.start + offset..within.start + offset + text.len())
        .unwrap_or(within)
}

#[cfg(test)]
mod tests {
    use ariadne::Source;
    use pertsym_algebra::{Dependencies, Node, Operator};
    use pretty_assertions::assert_eq;
    use super::*;

    /// Renders the report of an error against its source, without colors.
    fn render(error: &Error, src: &str) -> String {
        let mut buf = Vec::new();
        error.build_report("expr")
            .write(("expr", Source::from(src)), &mut buf)
            .unwrap();
        String::from_utf8(strip_ansi_escapes::strip(buf)).unwrap()
    }

    #[test]
    fn unclassified_node_points_at_node() {
        let h = Node::one_elec_operator(Operator::new("h", Dependencies::new()));
        let f = Node::function("f", vec![Node::symbol("x")]);
        let root = Node::trace(&h * &h) + f.clone();

        let error = Fault::unclassified("remove_if", &f).locate(&root);
        let src = root.to_string();
        assert_eq!(&src[error.spans[0].clone()], "f(x)");

        let kind = error.downcast_ref::<UnclassifiedNode>().unwrap();
        assert_eq!(kind.kind, "Function");

        assert_eq!(error.to_string(), "`remove_if` has no rule for nodes of kind `Function`");
        let report = render(&error, &src);
        assert!(report.contains("`remove_if` has no rule for nodes of kind `Function`"));
        assert!(report.contains("this Function node"));
        assert!(report.contains("the node is `f(x)`"));
    }

    #[test]
    fn exponent_removal_points_at_exponent() {
        let (x, y) = (Node::symbol("x"), Node::symbol("y"));
        let power = x.pow(&y);
        let root = &y + &power;

        let error = Fault::exponent("remove_if", &power, &y).locate(&root);
        let src = root.to_string();
        assert!(error.kind_is::<ExponentRemoval>());
        assert_eq!(&src[error.spans[0].clone()], "x^y");
        assert_eq!(&src[error.spans[1].clone()], "y");
        assert_eq!(src, "y + x^y");
        assert_eq!(error.spans[1].start, 6);
    }
}
