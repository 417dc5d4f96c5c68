//! Ordering of merged catalogs.
//!
//! Each catalog kind ranks its variants in a fixed order, then sorts by a
//! key parsed out of the name (`K45/120/3.5Z` -> `("K", [45, 120, 3.5], "Z")`),
//! then by the variant's own dimensions.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::entities::{ConcreteShape, Design, DesignKind, Material, MaterialKind, Section, SectionShape};

static NAME_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_]+").expect("static pattern"));
static NAME_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("static pattern"));
static NAME_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d(?:[^\d]*?)([A-Za-z]+)$").expect("static pattern"));

/// Parsed name: alphabetic prefix, every number in order, trailing letters.
#[derive(Debug, Clone, PartialEq)]
pub struct NameKey {
    pub prefix: String,
    pub numbers: Vec<f64>,
    pub suffix: String,
}

impl NameKey {
    pub fn parse(name: &str) -> Self {
        let prefix = NAME_PREFIX
            .find(name)
            .map(|m| m.as_str().to_uppercase())
            .unwrap_or_default();
        let mut numbers: Vec<f64> = NAME_NUMBER
            .find_iter(name)
            .filter_map(|m| m.as_str().parse().ok())
            .collect();
        if numbers.is_empty() {
            numbers.push(f64::INFINITY);
        }
        let suffix = NAME_SUFFIX
            .captures(name)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        NameKey {
            prefix,
            numbers,
            suffix,
        }
    }

    /// Same as [`parse`](Self::parse) but ignoring any suffix.
    pub fn parse_plain(name: &str) -> Self {
        NameKey {
            suffix: String::new(),
            ..Self::parse(name)
        }
    }
}

fn cmp_floats(a: &[f64], b: &[f64]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        match x.total_cmp(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

/// Total order used to sort a merged catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub rank: u32,
    pub name: Option<NameKey>,
    /// Dimension tie-break, or the numeric key itself
    pub values: Vec<f64>,
    pub text: String,
}

impl SortKey {
    pub fn new(rank: u32) -> Self {
        SortKey {
            rank,
            name: None,
            values: Vec::new(),
            text: String::new(),
        }
    }

    pub fn with_name(mut self, name: NameKey) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_values(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.values = values.into_iter().collect();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

impl Eq for SortKey {}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| match (&self.name, &other.name) {
                (Some(a), Some(b)) => a
                    .prefix
                    .cmp(&b.prefix)
                    .then_with(|| cmp_floats(&a.numbers, &b.numbers))
                    .then_with(|| a.suffix.cmp(&b.suffix)),
                (a, b) => a.is_some().cmp(&b.is_some()),
            })
            .then_with(|| cmp_floats(&self.values, &other.values))
            .then_with(|| self.text.cmp(&other.text))
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Per-kind ordering strategy for [`merge_and_reorder`](super::merge_and_reorder).
pub trait MergeOrder {
    fn sort_key(&self) -> SortKey;
}

/// Isotropic materials by `fc1`, then springs by lowercased name.
impl MergeOrder for Material {
    fn sort_key(&self) -> SortKey {
        match &self.kind {
            MaterialKind::Isotropic(iso) => SortKey::new(0).with_values([iso.fc1]),
            MaterialKind::Spring(_) => SortKey::new(1).with_text(self.name.to_lowercase()),
        }
    }
}

/// Slabs, girders, biaxial columns, circular columns, walls; everything else
/// (tee columns, steel) last by name.
impl MergeOrder for Design {
    fn sort_key(&self) -> SortKey {
        let name = NameKey::parse(&self.name);
        match &self.kind {
            DesignKind::Concrete { shape, .. } => match *shape {
                ConcreteShape::Slab { tp } => SortKey::new(0).with_name(name).with_values([tp]),
                ConcreteShape::Girder { bw, ht, .. } => SortKey::new(1).with_name(name).with_values([bw, ht]),
                ConcreteShape::BiaxialColumn { b, h, .. } => SortKey::new(2).with_name(name).with_values([b, h]),
                ConcreteShape::CircularColumn { d } => SortKey::new(3).with_name(name).with_values([d]),
                ConcreteShape::Wall { tp } => SortKey::new(4).with_name(name).with_values([tp]),
                ConcreteShape::TeeColumn { .. } => SortKey::new(5).with_name(name),
            },
            DesignKind::SteelFrame(_) => SortKey::new(5).with_name(name),
        }
    }
}

/// Thickness, rectangle, circle; tee and user sections last.
impl MergeOrder for Section {
    fn sort_key(&self) -> SortKey {
        let name = NameKey::parse_plain(&self.name);
        match self.shape {
            SectionShape::Thickness { thickness } => SortKey::new(0).with_name(name).with_values([thickness]),
            SectionShape::Rect { width, height, .. } => SortKey::new(1).with_name(name).with_values([width, height]),
            SectionShape::Circle { diameter } => SortKey::new(2).with_name(name).with_values([diameter]),
            SectionShape::Tee { .. } | SectionShape::User { .. } => SortKey::new(3).with_name(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_key_parsing() {
        let key = NameKey::parse("K45/120/3.5Z");
        assert_eq!(key.prefix, "K");
        assert_eq!(key.numbers, vec![45.0, 120.0, 3.5]);
        assert_eq!(key.suffix, "Z");

        let key = NameKey::parse("rect_200X400");
        assert_eq!(key.prefix, "RECT_");
        assert_eq!(key.numbers, vec![200.0, 400.0]);
        assert_eq!(key.suffix, "");

        let key = NameKey::parse("B15/20A");
        assert_eq!((key.numbers.as_slice(), key.suffix.as_str()), (&[15.0, 20.0][..], "A"));

        let key = NameKey::parse("");
        assert_eq!(key.numbers, vec![f64::INFINITY]);
        assert_eq!(NameKey::parse_plain("B15/20A").suffix, "");
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        let small = SortKey::new(0).with_name(NameKey::parse("B9"));
        let large = SortKey::new(0).with_name(NameKey::parse("B10"));
        assert!(small < large);
    }

    #[test]
    fn test_rank_dominates() {
        let slab = SortKey::new(0).with_name(NameKey::parse("Z99"));
        let girder = SortKey::new(1).with_name(NameKey::parse("A1"));
        assert!(slab < girder);
    }

    #[test]
    fn test_dimension_tie_break() {
        let a = SortKey::new(1).with_name(NameKey::parse("G30")).with_values([30.0, 50.0]);
        let b = SortKey::new(1).with_name(NameKey::parse("G30")).with_values([30.0, 60.0]);
        assert!(a < b);
    }
}
