//! Contiguous collection types: [`Stack`], a growable array, and [`StackString`], a null
//! terminated string built on top of it.

pub mod stack;
pub mod string;

#[doc(inline)]
pub use stack::{GrowthPolicy, Stack};
#[doc(inline)]
pub use string::StackString;
