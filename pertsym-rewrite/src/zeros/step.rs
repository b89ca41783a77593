/// A single simplification made by [`remove_zeros_with_steps`](crate::remove_zeros_with_steps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// `0*a + b = b`
    /// `0 + b = b`
    AddZero,

    /// `0*a = 0`
    /// `0^n * a = 0` for a positive number `n`
    MultiplyZero,

    /// `0 + A = A`
    MatrixAddZero,

    /// `0*A = 0`
    /// `A*0 = 0`
    MatrixMulZero,

    /// `tr(0) = 0`
    /// `conj(0) = 0`
    /// `transpose(0) = 0`
    WrapZero,

    /// `G(0) = 0`
    /// `dt(0) = 0`
    /// `d(0)/d(a) = 0`
    /// `E(0, D) = E(D, 0) = 0`
    OperatorZero,
}
