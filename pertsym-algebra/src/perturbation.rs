//! Perturbations, and the derivative and dependency metadata that tagged nodes carry.

use crate::number::{Number, ZERO};
use std::{collections::{BTreeMap, BTreeSet}, fmt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A perturbation applied to the system, such as an external electric field.
///
/// Two perturbations are equal iff their names, frequencies, and component sets are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Perturbation {
    /// The name of the perturbation.
    pub name: String,

    /// The frequency of the perturbation. Static perturbations have frequency zero.
    pub frequency: Number,

    /// The component indices of the perturbation, for example `{0, 1, 2}` for the three
    /// Cartesian components of an electric field.
    pub components: BTreeSet<usize>,
}

impl Perturbation {
    /// Creates a static perturbation with no components.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frequency: ZERO.clone(),
            components: BTreeSet::new(),
        }
    }

    /// Sets the frequency of the perturbation.
    pub fn with_frequency(mut self, frequency: impl Into<Number>) -> Self {
        self.frequency = frequency.into();
        self
    }

    /// Sets the components of the perturbation.
    pub fn with_components(mut self, components: impl IntoIterator<Item = usize>) -> Self {
        self.components = components.into_iter().collect();
        self
    }

    /// Returns the identity of the perturbation as used in a [`Dependencies`] map.
    fn source(&self) -> (String, Number) {
        (self.name.clone(), self.frequency.clone())
    }
}

impl fmt::Display for Perturbation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.frequency.is_zero() {
            write!(f, "@{}", self.frequency)?;
        }
        if !self.components.is_empty() {
            let components = self.components
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>();
            write!(f, "[{}]", components.join(","))?;
        }
        Ok(())
    }
}

/// The perturbations a node has been differentiated by, as a multiset.
///
/// The perturbations are stored sorted, so two multisets compare equal regardless of the order the
/// derivatives were taken in, while repeated derivatives are counted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Derivatives(Vec<Perturbation>);

impl Derivatives {
    /// Creates an empty multiset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one derivative with respect to the given perturbation.
    pub fn insert(&mut self, perturbation: Perturbation) {
        let index = self.0.partition_point(|p| *p <= perturbation);
        self.0.insert(index, perturbation);
    }

    /// Returns the multiset with one more derivative with respect to the given perturbation.
    pub fn with(mut self, perturbation: Perturbation) -> Self {
        self.insert(perturbation);
        self
    }

    /// Returns the derivatives whose perturbation is allowed by the given dependency map.
    pub fn filtered(&self, dependencies: &Dependencies) -> Self {
        Self(self.0.iter().filter(|p| dependencies.allows(p)).cloned().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Perturbation> for Derivatives {
    fn from_iter<T: IntoIterator<Item = Perturbation>>(iter: T) -> Self {
        let mut perturbations = iter.into_iter().collect::<Vec<_>>();
        perturbations.sort();
        Self(perturbations)
    }
}

impl fmt::Display for Derivatives {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iter = self.0.iter();
        if let Some(p) = iter.next() {
            write!(f, "{}", p)?;
            for p in iter {
                write!(f, ",{}", p)?;
            }
        }
        Ok(())
    }
}

/// The perturbations an operator or function depends on.
///
/// Maps each perturbation identity (name and frequency) to the subset of its components the
/// operator depends on. An empty subset means the operator depends on every component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Dependencies(BTreeMap<(String, Number), BTreeSet<usize>>);

impl Dependencies {
    /// Creates a map with no dependencies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a dependency on the given perturbation, restricted to its components (or on every
    /// component if it has none).
    pub fn insert(&mut self, perturbation: &Perturbation) {
        let allowed = self.0.entry(perturbation.source()).or_insert_with(|| perturbation.components.clone());
        if allowed.is_empty() || perturbation.components.is_empty() {
            allowed.clear();
        } else {
            allowed.extend(perturbation.components.iter().copied());
        }
    }

    /// Returns true if a derivative with respect to the given perturbation can be non-zero.
    pub fn allows(&self, perturbation: &Perturbation) -> bool {
        match self.0.get(&perturbation.source()) {
            Some(allowed) => allowed.is_empty()
                || perturbation.components.is_empty()
                || !allowed.is_disjoint(&perturbation.components),
            None => false,
        }
    }
}

impl<'a> FromIterator<&'a Perturbation> for Dependencies {
    fn from_iter<T: IntoIterator<Item = &'a Perturbation>>(iter: T) -> Self {
        let mut dependencies = Self::new();
        for perturbation in iter {
            dependencies.insert(perturbation);
        }
        dependencies
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn derivative_order_is_irrelevant() {
        let a = Perturbation::new("a");
        let b = Perturbation::new("b").with_frequency(1);
        let ab = Derivatives::new().with(a.clone()).with(b.clone());
        let ba = Derivatives::new().with(b).with(a.clone());
        assert_eq!(ab, ba);
        assert_ne!(ab, ab.clone().with(a));
    }

    #[test]
    fn dependencies_restrict_components() {
        let field = Perturbation::new("el").with_components([0]);
        let dependencies = [&field].into_iter().collect::<Dependencies>();

        assert!(dependencies.allows(&Perturbation::new("el").with_components([0, 1])));
        assert!(!dependencies.allows(&Perturbation::new("el").with_components([2])));
        assert!(!dependencies.allows(&Perturbation::new("el").with_frequency(1)));
        assert!(!dependencies.allows(&Perturbation::new("mag")));
    }

    #[test]
    fn filter_derivatives() {
        let el = Perturbation::new("el");
        let mag = Perturbation::new("mag");
        let dependencies = [&el].into_iter().collect::<Dependencies>();
        let derivatives = Derivatives::from_iter([mag.clone(), el.clone(), mag]);
        assert_eq!(derivatives.filtered(&dependencies), Derivatives::from_iter([el]));
    }
}
