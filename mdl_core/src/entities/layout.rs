//! # Floor Layouts
//!
//! Beams and columns are grouped per floor. A [`Layout`] is one floor's item
//! store (indices restart at 1 on every floor); [`Layouts`] is the store of
//! floors, keyed by floor number, so a second layout for the same floor is a
//! `DuplicateIndex` error.

use serde::{Deserialize, Serialize};

use crate::errors::ModelResult;
use crate::store::{EntityStore, HasElsetRef, Indexed};

use super::{Beam, Column};

/// An entity that lives in a per-floor layout.
pub trait LayoutItem: Indexed + HasElsetRef + Clone {
    /// Kind name of the layout itself, for diagnostics
    const LAYOUT_KIND: &'static str;
}

impl LayoutItem for Beam {
    const LAYOUT_KIND: &'static str = "BeamLayout";
}

impl LayoutItem for Column {
    const LAYOUT_KIND: &'static str = "ColumnLayout";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize",
    deserialize = "T: Indexed + Deserialize<'de>"
))]
pub struct Layout<T> {
    pub floor: u32,
    pub items: EntityStore<T>,
}

impl<T: LayoutItem> Layout<T> {
    pub fn new(floor: u32) -> Self {
        Layout {
            floor,
            items: EntityStore::new(),
        }
    }

    pub fn with_items(floor: u32, items: impl IntoIterator<Item = T>) -> ModelResult<Self> {
        Ok(Layout {
            floor,
            items: EntityStore::from_items(items)?,
        })
    }

    /// Floor-local index for the next appended item.
    pub fn next_index(&self) -> u32 {
        self.items.max_index() + 1
    }

    pub fn get_item(&self, index: u32) -> Option<&T> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: LayoutItem> Indexed for Layout<T> {
    const KIND: &'static str = T::LAYOUT_KIND;

    fn index(&self) -> u32 {
        self.floor
    }

    fn set_index(&mut self, index: u32) {
        self.floor = index;
    }
}

/// All floors of one layout kind.
pub type Layouts<T> = EntityStore<Layout<T>>;
pub type BeamLayouts = Layouts<Beam>;
pub type ColumnLayouts = Layouts<Column>;
