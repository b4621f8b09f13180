//! Dynamic neural fields built from a graph of layers.
//!
//! A `Network` owns named layers of a given `Shape`, connected to each other
//! and evaluated synchronously, one step at a time. Lateral interactions are
//! computed by Gaussian links through FFT-based convolutions, see the
//! `convolution` module.

extern crate itertools;
extern crate rand;
#[macro_use]
extern crate serde_derive;

pub mod activator;
pub mod convolution;
pub mod error;
pub mod layers;
pub mod network;

mod shape;
mod utils;

pub use crate::activator::Activator;
pub use crate::error::{Error, Result};
pub use crate::network::{LayerId, Network};
pub use crate::shape::Shape;
