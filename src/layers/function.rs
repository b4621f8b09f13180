use super::{expect_parameters, Arity, Layer};
use crate::activator::Activator;
use crate::error::Result;

/// Applies an activator elementwise to its single predecessor.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Function {
    activator: Activator,
}

impl Function {
    pub fn new(activator: Activator) -> Self {
        Function { activator }
    }

    pub fn activator(&self) -> Activator {
        self.activator
    }
}

impl Layer for Function {
    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn evaluate(&mut self, inputs: &[&[f64]], output: &mut [f64]) -> Result<()> {
        assert_eq!(inputs[0].len(), output.len());
        for (y, &x) in output.iter_mut().zip(inputs[0]) {
            *y = self.activator.f(x);
        }
        Ok(())
    }

    fn parameters(&self) -> Vec<f64> {
        self.activator.parameters()
    }

    fn set_parameters(&mut self, values: &[f64]) -> std::result::Result<(), String> {
        self.activator.set_parameters(values)
    }
}

/// A source layer holding the same value at every position, such as the
/// resting level of a field.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    value: f64,
}

impl Constant {
    pub fn new(value: f64) -> Self {
        Constant { value }
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl Layer for Constant {
    fn arity(&self) -> Arity {
        Arity::Exactly(0)
    }

    fn evaluate(&mut self, _: &[&[f64]], output: &mut [f64]) -> Result<()> {
        for y in output.iter_mut() {
            *y = self.value;
        }
        Ok(())
    }

    fn parameters(&self) -> Vec<f64> {
        vec![self.value]
    }

    fn set_parameters(&mut self, values: &[f64]) -> std::result::Result<(), String> {
        expect_parameters(values, 1)?;
        self.value = values[0];
        Ok(())
    }
}
