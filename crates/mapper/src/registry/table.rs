//! Converter tables.

use std::cmp::Reverse;
use std::fmt;

use indexmap::IndexMap;

use super::{Converter, TypePair};
use crate::types::ValueType;

/// Registration-ordered table of converters keyed by exact [`TypePair`].
#[derive(Clone, Default)]
pub struct ConverterTable {
    entries: IndexMap<TypePair, Converter>,
}

impl ConverterTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the converter for `pair`.
    ///
    /// Overwriting keeps the original registration position.
    pub fn insert(&mut self, pair: TypePair, converter: Converter) -> Option<Converter> {
        self.entries.insert(pair, converter)
    }

    /// Converter registered for exactly `pair`.
    pub fn get(&self, pair: &TypePair) -> Option<&Converter> {
        self.entries.get(pair)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best entry whose registered source is a supertype of `source` and
    /// whose registered target is a supertype of `target`.
    ///
    /// Ties go to the most specific source, then the most specific target,
    /// then the earliest registration.
    pub fn find_widening(&self, source: &ValueType, target: &ValueType) -> Option<(&TypePair, &Converter)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, (pair, _))| {
                pair.source.is_assignable_from(source) && pair.target.is_assignable_from(target)
            })
            .max_by_key(|(index, (pair, _))| widening_rank(*index, pair))
            .map(|(_, entry)| entry)
    }
}

/// Ordering key of a widening candidate; the greatest key wins.
fn widening_rank(index: usize, pair: &TypePair) -> (usize, usize, Reverse<usize>) {
    (
        pair.source.specificity(),
        pair.target.specificity(),
        Reverse(index),
    )
}

impl fmt::Debug for ConverterTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.keys().map(ToString::to_string))
            .finish()
    }
}
