//! Percentage modifiers
//!
//! Damage, inaccuracy and range modifiers are integer percentages that
//! compose multiplicatively. The product is taken exactly before the single
//! final truncation, so the result does not depend on modifier order.

use serde::{Deserialize, Serialize};

/// Which stat a modifier trait adjusts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierKind {
    Damage,
    Inaccuracy,
    Range,
}

/// A modifier carried by an actor, optionally gated by a granted condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierTrait {
    pub kind: ModifierKind,
    pub percent: i32,
    #[serde(default)]
    pub requires_condition: Option<String>,
}

impl ModifierTrait {
    pub fn new(kind: ModifierKind, percent: i32) -> Self {
        Self {
            kind,
            percent,
            requires_condition: None,
        }
    }

    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.requires_condition = Some(condition.into());
        self
    }
}

/// The three modifier lists snapshotted from a firer when it shoots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotModifiers {
    pub damage: Vec<i32>,
    pub inaccuracy: Vec<i32>,
    pub range: Vec<i32>,
}

impl ShotModifiers {
    pub fn from_traits<'a>(traits: impl IntoIterator<Item = &'a ModifierTrait>, active: impl Fn(&str) -> bool) -> Self {
        let mut modifiers = ShotModifiers::default();
        for t in traits {
            if let Some(condition) = t.requires_condition.as_deref() {
                if !active(condition) {
                    continue;
                }
            }
            match t.kind {
                ModifierKind::Damage => modifiers.damage.push(t.percent),
                ModifierKind::Inaccuracy => modifiers.inaccuracy.push(t.percent),
                ModifierKind::Range => modifiers.range.push(t.percent),
            }
        }
        modifiers
    }
}

/// Applies every percentage in `percentages` to `value`, truncating toward zero once.
pub fn apply_percentage_modifiers(value: i32, percentages: &[i32]) -> i32 {
    let mut numerator = value as i128;
    let mut denominator: i128 = 1;
    for &p in percentages {
        match (numerator.checked_mul(p as i128), denominator.checked_mul(100)) {
            (Some(n), Some(d)) => {
                numerator = n;
                denominator = d;
            }
            _ => {
                // Overflow only happens with absurdly long chains; fold what we have.
                numerator = numerator / denominator * p as i128;
                denominator = 100;
            }
        }
    }
    (numerator / denominator).clamp(i32::MIN as i128, i32::MAX as i128) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_no_modifiers_is_identity() {
        assert_eq!(apply_percentage_modifiers(123, &[]), 123);
    }

    #[test]
    fn test_single_truncation() {
        // 33% of 33% of 100 is 10.89, truncated once to 10
        assert_eq!(apply_percentage_modifiers(100, &[33, 33]), 10);
        assert_eq!(apply_percentage_modifiers(-100, &[50]), -50);
        assert_eq!(apply_percentage_modifiers(100, &[150, 0]), 0);
    }

    proptest! {
        #[test]
        fn test_order_does_not_matter(value in -100_000i32..100_000, mut mods in prop::collection::vec(0i32..300, 0..8)) {
            let forward = apply_percentage_modifiers(value, &mods);
            mods.reverse();
            prop_assert_eq!(forward, apply_percentage_modifiers(value, &mods));
        }
    }
}
