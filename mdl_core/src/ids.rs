//! # Entity Handles
//!
//! Typed integer references between entities. A handle is only the target's
//! index; it resolves through the store that owns the target kind. Handles
//! serialize as bare numbers.
//!
//! ```rust
//! use mdl_core::ids::{ElsetRef, NodeRef};
//!
//! let n = NodeRef(12);
//! assert_eq!(n.get(), 12);
//! assert_eq!(ElsetRef::from(3).to_string(), "3");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            pub fn get(self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            fn from(index: u32) -> Self {
                $name(index)
            }
        }

        impl From<$name> for u32 {
            fn from(handle: $name) -> Self {
                handle.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

// ============================================================================
// Geometry
// ============================================================================

handle!(
    /// Reference into the node store
    NodeRef
);

// ============================================================================
// Property catalog
// ============================================================================

handle!(
    /// Reference into the material store
    MaterialRef
);
handle!(
    /// Reference into the section store
    SectionRef
);
handle!(
    /// Reference into the design store
    DesignRef
);
handle!(
    /// Reference into the elset store
    ElsetRef
);

// ============================================================================
// Slabs and loads
// ============================================================================

handle!(
    /// Reference into the slab store
    SlabRef
);
handle!(
    /// Reference into the frame load table
    LoadTableRef
);
