//! Cartesian product over parameter domains
//!
//! Combinations are produced lazily in odometer order: the last parameter
//! varies fastest. The order depends only on the specs, so enumerating the
//! same specs twice visits the same sequence.

use crate::domain::{DomainValue, Enumerable, ParameterSpec};
use std::iter::FusedIterator;

/// One point of the combination space, in declared parameter order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combination {
    pairs: Vec<(String, DomainValue)>,
}

impl Combination {
    pub fn new(pairs: Vec<(String, DomainValue)>) -> Self {
        Self { pairs }
    }

    pub fn pairs(&self) -> &[(String, DomainValue)] {
        &self.pairs
    }

    /// Value bound to `name`
    pub fn get(&self, name: &str) -> Option<&DomainValue> {
        self.pairs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(DomainValue::as_str)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(DomainValue::as_int)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(DomainValue::as_bool)
    }

    /// Value bound to `name`, converted back into its enumeration member
    pub fn member<E: Enumerable>(&self, name: &str) -> Option<E> {
        self.get(name).and_then(E::from_value)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Arguments handed to a target function
pub type Arguments = Combination;

/// Number of combinations for the given specs
///
/// Specs produced by `resolve` never overflow; anything larger is
/// reported as `usize::MAX`.
pub fn total_combinations(specs: &[ParameterSpec]) -> usize {
    specs
        .iter()
        .try_fold(1usize, |acc, spec| acc.checked_mul(spec.values.len()))
        .unwrap_or(usize::MAX)
}

/// Enumerate the full combination space of `specs`
pub fn enumerate(specs: &[ParameterSpec]) -> Combinations<'_> {
    let total = if specs.is_empty() {
        0
    } else {
        total_combinations(specs)
    };
    Combinations {
        specs,
        indices: vec![0; specs.len()],
        remaining: total,
    }
}

/// Lazy iterator returned by [`enumerate`]
#[derive(Debug, Clone)]
pub struct Combinations<'a> {
    specs: &'a [ParameterSpec],
    indices: Vec<usize>,
    remaining: usize,
}

impl Combinations<'_> {
    fn advance(&mut self) {
        for pos in (0..self.indices.len()).rev() {
            self.indices[pos] += 1;
            if self.indices[pos] < self.specs[pos].values.len() {
                return;
            }
            self.indices[pos] = 0;
        }
        // Wrapped past the last combination
        self.remaining = 0;
    }
}

impl Iterator for Combinations<'_> {
    type Item = Combination;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let pairs = self
            .specs
            .iter()
            .zip(&self.indices)
            .map(|(spec, &i)| (spec.name.clone(), spec.values[i].clone()))
            .collect();

        self.remaining -= 1;
        self.advance();
        Some(Combination::new(pairs))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Combinations<'_> {}

impl FusedIterator for Combinations<'_> {}
