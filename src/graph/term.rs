//! The capabilities the graph needs from values and operation tags.
//!
//! The graph never looks inside a value or an operation. It only compares,
//! hashes and orders them, asks a value for a display name when choosing a
//! storage name, and asks an operation whether it overwrites any of its inputs.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Maps an output slot index to the input slot index whose storage it overwrites.
///
/// `{1: 2}` means output 1 is written into the storage bound to input 2.
pub type InplaceMap = BTreeMap<usize, usize>;

/// A mathematical quantity flowing between computations.
pub trait Variable: Clone + Eq + Hash + Ord + Debug {
    /// Preferred storage name, if the value has one.
    fn name(&self) -> Option<String> {
        None
    }
}

/// The tag identifying what a computation does.
pub trait Operator: Clone + Eq + Hash + Ord + Debug {
    /// Which outputs overwrite which inputs. Empty for pure operations.
    fn inplace(&self) -> InplaceMap {
        InplaceMap::new()
    }
}

impl Variable for String {
    fn name(&self) -> Option<String> {
        Some(self.clone())
    }
}

impl Variable for &'static str {
    fn name(&self) -> Option<String> {
        Some((*self).to_string())
    }
}

impl Operator for String {}

impl Operator for &'static str {}
