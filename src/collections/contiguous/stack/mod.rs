//! A module containing [`Stack`] and associated types.
//!
//! [`IntoIter`] provides owned iteration over a Stack, while borrowed iteration uses
//! [`Iter`](std::slice::Iter) and [`IterMut`](std::slice::IterMut) from [`std::slice`]. The
//! capacity growth of every Stack is controlled by a [`GrowthPolicy`].
//!
//! [`Stack`] is also re-exported under the parent module.

mod growth;
mod iter;
mod stack;

pub use growth::*;
pub use iter::*;
pub use stack::*;
