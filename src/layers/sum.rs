use super::{expect_parameters, Arity, Layer};
use crate::error::Result;

/// Sums the buffers of two or more predecessors elementwise.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Sum;

impl Sum {
    pub fn new() -> Self {
        Sum
    }
}

impl Layer for Sum {
    fn arity(&self) -> Arity {
        Arity::AtLeast(2)
    }

    fn evaluate(&mut self, inputs: &[&[f64]], output: &mut [f64]) -> Result<()> {
        output.copy_from_slice(inputs[0]);
        for input in &inputs[1..] {
            assert_eq!(input.len(), output.len());
            for (y, x) in output.iter_mut().zip(input.iter()) {
                *y += x;
            }
        }
        Ok(())
    }

    fn parameters(&self) -> Vec<f64> {
        vec![]
    }

    fn set_parameters(&mut self, values: &[f64]) -> std::result::Result<(), String> {
        expect_parameters(values, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_constant_buffers() {
        let a = [1.0; 5];
        let b = [2.5; 5];
        let c = [-0.5; 5];
        let mut out = [0.0; 5];
        Sum::new().evaluate(&[&a, &b, &c], &mut out).unwrap();
        assert_eq!(out, [3.0; 5]);
    }

    #[test]
    fn has_no_parameters() {
        let mut sum = Sum::new();
        assert!(sum.parameters().is_empty());
        assert!(sum.set_parameters(&[]).is_ok());
        assert!(sum.set_parameters(&[1.0]).is_err());
    }
}
