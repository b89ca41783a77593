//! The expression algebra of response theory.
//!
//! Expressions are immutable trees of [`Node`]s, built from scalar symbols and numbers, sums and
//! products, matrix sums and products, and the quantities a response calculation is made of:
//! densities and Lagrangian multipliers, one- and two-electron operators, two-electron and
//! exchange-correlation energies, and time-derivative operators. Tagged nodes carry the
//! [`Derivatives`] they have been differentiated by, and operators carry the [`Dependencies`]
//! they depend on.
//!
//! ```
//! use pertsym_algebra::{Node, Operator, Perturbation, State};
//!
//! let field = Perturbation::new("el");
//! let h = Node::one_elec_operator(Operator::new("h", [&field].into_iter().collect()));
//! let d = Node::density(State::new("D"));
//! let energy = Node::trace(&h * &d);
//! assert_eq!(energy.to_string(), "tr(h*D)");
//! ```

pub mod expr;
pub mod number;
pub mod perturbation;

pub use expr::{
    kinds::{
        CompositeFunction,
        Functional,
        MatrixDerivative,
        Operator,
        State,
        Temporum,
        TemporumType,
        TwoElecEnergy,
        TwoElecOperator,
    },
    matrix::{matrix_add, matrix_mul},
    product::{Product, ProductBuilder},
    sum::{Sum, SumBuilder},
    Expr,
    Node,
};
pub use number::Number;
pub use perturbation::{Dependencies, Derivatives, Perturbation};
