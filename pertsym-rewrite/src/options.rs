/// How exchange-correlation energies and potentials are treated by
/// [`remove_if`](crate::remove_if) and [`keep_if`](crate::keep_if).
///
/// The default value is [`FunctionalPolicy::PassThrough`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FunctionalPolicy {
    /// The functional is never removed and never decomposed. Unless it matches as a whole, both
    /// traversals return it unchanged.
    #[default]
    PassThrough,

    /// The functional is treated like a symbol: removed if it matches as a whole and kept
    /// otherwise by `remove_if`, and kept only if it matches as a whole by `keep_if`.
    Atomic,
}

/// Options that configure one call to `remove_if` or `keep_if`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteOptions {
    /// The policy for exchange-correlation energies and potentials.
    ///
    /// The default value is [`FunctionalPolicy::PassThrough`].
    pub functionals: FunctionalPolicy,
}

impl RewriteOptions {
    /// Sets the policy for exchange-correlation energies and potentials.
    pub fn with_functionals(mut self, functionals: FunctionalPolicy) -> Self {
        self.functionals = functionals;
        self
    }
}
