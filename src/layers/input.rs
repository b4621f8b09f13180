use super::{Arity, Layer};
use crate::error::{Error, Result};

use std::fmt;

/// An externally supplied value driving an input layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Stimulus {
    Scalar(f64),
    Values(Vec<f64>),
}

impl Default for Stimulus {
    fn default() -> Self {
        Stimulus::Scalar(0.0)
    }
}

impl From<f64> for Stimulus {
    fn from(value: f64) -> Stimulus {
        Stimulus::Scalar(value)
    }
}

impl From<Vec<f64>> for Stimulus {
    fn from(values: Vec<f64>) -> Stimulus {
        Stimulus::Values(values)
    }
}

impl<'a> From<&'a [f64]> for Stimulus {
    /// A single value becomes a scalar stimulus.
    fn from(values: &[f64]) -> Stimulus {
        if values.len() == 1 {
            Stimulus::Scalar(values[0])
        } else {
            Stimulus::Values(values.to_vec())
        }
    }
}

/// Writes a stimulus into every position of an input buffer.
pub type Fill = Box<dyn FnMut(&Stimulus, &mut [f64])>;

/// A source layer whose values come from outside the network.
pub struct Input {
    stimulus: Stimulus,
    fill: Option<Fill>,
}

impl Input {
    /// Creates an input that broadcasts a scalar stimulus or copies a vector
    /// stimulus of the field's length.
    pub fn new() -> Self {
        Input {
            stimulus: Stimulus::default(),
            fill: None,
        }
    }

    /// Creates an input filled by `fill` on every step.
    ///
    /// `fill` must write every position of the buffer it receives.
    pub fn with_fill<F>(fill: F) -> Self
    where
        F: FnMut(&Stimulus, &mut [f64]) + 'static,
    {
        Input {
            stimulus: Stimulus::default(),
            fill: Some(Box::new(fill)),
        }
    }

    pub fn stimulus(&self) -> &Stimulus {
        &self.stimulus
    }

    pub fn set_stimulus(&mut self, stimulus: Stimulus) {
        self.stimulus = stimulus;
    }

    /// Returns true if a user callback fills the buffer.
    pub fn has_custom_fill(&self) -> bool {
        self.fill.is_some()
    }
}

impl Default for Input {
    fn default() -> Self {
        Input::new()
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Input")
            .field("stimulus", &self.stimulus)
            .field("custom_fill", &self.has_custom_fill())
            .finish()
    }
}

impl Layer for Input {
    fn arity(&self) -> Arity {
        Arity::Exactly(0)
    }

    fn evaluate(&mut self, _: &[&[f64]], output: &mut [f64]) -> Result<()> {
        match self.fill {
            Some(ref mut fill) => fill(&self.stimulus, output),
            None => match self.stimulus {
                Stimulus::Scalar(value) => {
                    for y in output.iter_mut() {
                        *y = value;
                    }
                }
                Stimulus::Values(ref values) => {
                    if values.len() != output.len() {
                        return Err(Error::InvalidShape(format!(
                            "stimulus of {} values for an input of {}",
                            values.len(),
                            output.len()
                        )));
                    }
                    output.copy_from_slice(values)
                }
            },
        }
        Ok(())
    }

    fn parameters(&self) -> Vec<f64> {
        match self.stimulus {
            Stimulus::Scalar(value) => vec![value],
            Stimulus::Values(ref values) => values.clone(),
        }
    }

    fn set_parameters(&mut self, values: &[f64]) -> std::result::Result<(), String> {
        if values.is_empty() {
            return Err("an input needs at least one value".to_string());
        }
        self.stimulus = Stimulus::from(values);
        Ok(())
    }
}
