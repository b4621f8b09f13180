//! Layer kinds and the contract shared by all of them.
//!
//! Every layer owns its parameters and derived resources, while its output
//! buffer and its connections are kept by the `Network`. Evaluating a layer
//! reads the current buffers of its predecessors and overwrites its own.

mod function;
mod gaussian;
mod input;
mod integrator;
mod sum;

pub use self::function::{Constant, Function};
pub use self::gaussian::{Gaussian, GaussianConfig, Profile};
pub use self::input::{Fill, Input, Stimulus};
pub use self::integrator::LeakyIntegrator;
pub use self::sum::Sum;

use crate::error::Result;
use crate::shape::Shape;

use std::fmt;

/// The number of predecessors a layer kind accepts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Arity::Exactly(n) => write!(f, "exactly {}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

pub trait Layer {
    /// Returns the number of predecessors this layer needs.
    fn arity(&self) -> Arity;

    /// Allocates derived resources for a field of the given `shape`.
    ///
    /// Called once, after the graph is validated and before the first step.
    fn prepare(&mut self, _shape: Shape) -> Result<()> {
        Ok(())
    }

    /// Computes one step, overwriting `output` from the `inputs` buffers of
    /// the predecessors, in connection order.
    fn evaluate(&mut self, inputs: &[&[f64]], output: &mut [f64]) -> Result<()>;

    /// Returns the layer's owned parameters.
    fn parameters(&self) -> Vec<f64>;

    /// Replaces the layer's owned parameters, returning the reason they were
    /// rejected otherwise.
    fn set_parameters(&mut self, values: &[f64]) -> std::result::Result<(), String>;
}

/// The closed set of layer kinds a network is built from.
#[derive(Debug)]
pub enum LayerKind {
    Input(Input),
    Function(Function),
    Constant(Constant),
    Sum(Sum),
    Gaussian(Gaussian),
    LeakyIntegrator(LeakyIntegrator),
}

impl LayerKind {
    /// A short name for the kind, used in generated layer names and listings.
    pub fn kind_name(&self) -> &'static str {
        match self {
            LayerKind::Input(_) => "input",
            LayerKind::Function(_) => "function",
            LayerKind::Constant(_) => "constant",
            LayerKind::Sum(_) => "sum",
            LayerKind::Gaussian(_) => "gaussian",
            LayerKind::LeakyIntegrator(_) => "leaky_integrator",
        }
    }

    fn as_layer(&self) -> &dyn Layer {
        match self {
            LayerKind::Input(layer) => layer,
            LayerKind::Function(layer) => layer,
            LayerKind::Constant(layer) => layer,
            LayerKind::Sum(layer) => layer,
            LayerKind::Gaussian(layer) => layer,
            LayerKind::LeakyIntegrator(layer) => layer,
        }
    }

    fn as_layer_mut(&mut self) -> &mut dyn Layer {
        match self {
            LayerKind::Input(layer) => layer,
            LayerKind::Function(layer) => layer,
            LayerKind::Constant(layer) => layer,
            LayerKind::Sum(layer) => layer,
            LayerKind::Gaussian(layer) => layer,
            LayerKind::LeakyIntegrator(layer) => layer,
        }
    }
}

impl Layer for LayerKind {
    fn arity(&self) -> Arity {
        self.as_layer().arity()
    }

    fn prepare(&mut self, shape: Shape) -> Result<()> {
        self.as_layer_mut().prepare(shape)
    }

    fn evaluate(&mut self, inputs: &[&[f64]], output: &mut [f64]) -> Result<()> {
        self.as_layer_mut().evaluate(inputs, output)
    }

    fn parameters(&self) -> Vec<f64> {
        self.as_layer().parameters()
    }

    fn set_parameters(&mut self, values: &[f64]) -> std::result::Result<(), String> {
        self.as_layer_mut().set_parameters(values)
    }
}

macro_rules! impl_from_kind {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for LayerKind {
                fn from(layer: $variant) -> LayerKind {
                    LayerKind::$variant(layer)
                }
            }
        )*
    };
}

impl_from_kind!(Input, Function, Constant, Sum, Gaussian, LeakyIntegrator);

/// Checks that `values` holds exactly `expected` parameters.
fn expect_parameters(values: &[f64], expected: usize) -> std::result::Result<(), String> {
    if values.len() != expected {
        return Err(format!(
            "expected {} parameter(s), got {}",
            expected,
            values.len()
        ));
    }
    if let Some(v) = values.iter().find(|v| !v.is_finite()) {
        return Err(format!("parameter {} is not finite", v));
    }
    Ok(())
}
