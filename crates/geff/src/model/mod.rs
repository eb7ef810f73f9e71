//! Data model types for GEFF.
//!
//! - Element dtypes and the allow-list of storable types
//! - Typed N-dimensional arrays (the unit exchanged with the store)
//! - Per-element property values and ragged elements

pub mod array;
pub mod dtype;
pub mod value;

pub use array::{ArrayData, Element, NdArray};
pub use dtype::DType;
pub use value::{PropMap, PropValue, Ragged, present};
