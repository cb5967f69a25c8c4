//! Palette: assigns dense, bitset-indexable ids to an opaque color type.
//!
//! Per `spec.md` §9 ("re-architect as a generic color type with equality +
//! hashing"), the core never looks at what a color *is* — only at whether
//! two colors are equal. `Palette<C>` is the one place that equality is
//! actually exercised, interning each distinct observed value into a
//! [`ColorId`] used everywhere else in the solver.

use std::collections::HashMap;
use std::hash::Hash;

/// A dense index into the palette. Used directly as a bit position in a
/// [`fixedbitset::FixedBitSet`] domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColorId(pub u32);

#[derive(Debug, Clone, Default)]
pub struct Palette<C> {
    ids: HashMap<C, ColorId>,
    values: Vec<C>,
}

impl<C> Palette<C>
where
    C: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
            values: Vec::new(),
        }
    }

    /// Intern a color, assigning it a fresh id if this is the first time it
    /// has been seen.
    pub fn intern(&mut self, color: C) -> ColorId {
        if let Some(id) = self.ids.get(&color) {
            return *id;
        }
        let id = ColorId(self.values.len() as u32);
        self.values.push(color.clone());
        self.ids.insert(color, id);
        id
    }

    pub fn get(&self, color: &C) -> Option<ColorId> {
        self.ids.get(color).copied()
    }

    pub fn color(&self, id: ColorId) -> &C {
        &self.values[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter_ids(&self) -> impl Iterator<Item = ColorId> {
        (0..self.values.len() as u32).map(ColorId)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn interning_is_stable() {
        let mut p: Palette<String> = Palette::new();
        let a = p.intern("red".to_string());
        let b = p.intern("blue".to_string());
        let a2 = p.intern("red".to_string());
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(p.len(), 2);
        assert_eq!(p.color(a), "red");
    }
}
