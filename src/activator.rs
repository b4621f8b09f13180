//! Pointwise transfer functions.

use crate::error::Error;

use std::fmt;
use std::str::FromStr;

/// [Activation function](https://en.wikipedia.org/wiki/Activation_function)
/// types applied elementwise by function layers.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Activator {
    /// Passes values through unchanged.
    Identity,
    /// Logistic function `1 / (1 + exp(-slope * (x - threshold)))`.
    Sigmoid { slope: f64, threshold: f64 },
    /// Rectified Linear Unit
    ReLU,
    /// Leaky Rectified Linear Unit
    ///
    /// Takes an `alpha` value to use for negative inputs.
    LeakyReLU(f64),
    /// Hyperbolic tan function
    TanH,
    /// Step function, 1 at or above the threshold and 0 below.
    Heaviside(f64),
}

impl Activator {
    /// Evaluates `f(x)` for the selected the activation function.
    pub fn f(&self, x: f64) -> f64 {
        match *self {
            Activator::Identity => x,
            Activator::Sigmoid { slope, threshold } => {
                1.0 / (1.0 + (-slope * (x - threshold)).exp())
            }
            Activator::ReLU => if x > 0.0 { x } else { 0.0 },
            Activator::LeakyReLU(alpha) => if x > 0.0 { x } else { alpha * x },
            Activator::TanH => x.tanh(),
            Activator::Heaviside(threshold) => if x >= threshold { 1.0 } else { 0.0 },
        }
    }

    /// Returns the name this activator is parsed from.
    pub fn name(&self) -> &'static str {
        match self {
            Activator::Identity => "identity",
            Activator::Sigmoid { .. } => "sigmoid",
            Activator::ReLU => "relu",
            Activator::LeakyReLU(_) => "leaky_relu",
            Activator::TanH => "tanh",
            Activator::Heaviside(_) => "heaviside",
        }
    }

    /// Returns the scalar parameters of the function.
    pub fn parameters(&self) -> Vec<f64> {
        match *self {
            Activator::Sigmoid { slope, threshold } => vec![slope, threshold],
            Activator::LeakyReLU(alpha) => vec![alpha],
            Activator::Heaviside(threshold) => vec![threshold],
            Activator::Identity | Activator::ReLU | Activator::TanH => vec![],
        }
    }

    /// Replaces the scalar parameters of the function.
    ///
    /// `values` must hold exactly as many values as `parameters` returns.
    pub fn set_parameters(&mut self, values: &[f64]) -> Result<(), String> {
        let expected = self.parameters().len();
        if values.len() != expected {
            return Err(format!(
                "{} takes {} parameter(s), got {}",
                self.name(),
                expected,
                values.len()
            ));
        }
        match self {
            Activator::Sigmoid { slope, threshold } => {
                *slope = values[0];
                *threshold = values[1];
            }
            Activator::LeakyReLU(alpha) => *alpha = values[0],
            Activator::Heaviside(threshold) => *threshold = values[0],
            Activator::Identity | Activator::ReLU | Activator::TanH => {}
        }
        Ok(())
    }
}

impl FromStr for Activator {
    type Err = Error;

    /// Parses an activator by name, with default parameters.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "identity" => Ok(Activator::Identity),
            "sigmoid" => Ok(Activator::Sigmoid {
                slope: 1.0,
                threshold: 0.0,
            }),
            "relu" => Ok(Activator::ReLU),
            "leaky_relu" => Ok(Activator::LeakyReLU(0.01)),
            "tanh" => Ok(Activator::TanH),
            "heaviside" => Ok(Activator::Heaviside(0.0)),
            _ => Err(Error::UnknownFunction(name.to_string())),
        }
    }
}

impl fmt::Display for Activator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
