use super::{expect_parameters, Arity, Layer};
use crate::error::Result;

/// A first order low-pass filter of its predecessor.
///
/// Integrates `du/dt = (input - u) / tau` with explicit Euler steps of
/// `dt / tau`. The output buffer holds the state `u` and is carried over
/// from one step to the next.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeakyIntegrator {
    dt_tau: f64,
}

impl LeakyIntegrator {
    pub fn new(dt_tau: f64) -> Self {
        LeakyIntegrator { dt_tau }
    }

    pub fn dt_tau(&self) -> f64 {
        self.dt_tau
    }
}

impl Layer for LeakyIntegrator {
    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn evaluate(&mut self, inputs: &[&[f64]], output: &mut [f64]) -> Result<()> {
        assert_eq!(inputs[0].len(), output.len());
        for (u, &x) in output.iter_mut().zip(inputs[0]) {
            *u += self.dt_tau * (x - *u);
        }
        Ok(())
    }

    fn parameters(&self) -> Vec<f64> {
        vec![self.dt_tau]
    }

    fn set_parameters(&mut self, values: &[f64]) -> std::result::Result<(), String> {
        expect_parameters(values, 1)?;
        self.dt_tau = values[0];
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn unit_ratio_reaches_input_in_one_step() {
        let mut u = LeakyIntegrator::new(1.0);
        let mut state = [0.0; 3];
        u.evaluate(&[&[2.0; 3]], &mut state).unwrap();
        assert_eq!(state, [2.0; 3]);
    }

    #[test]
    fn converges_geometrically() {
        let dt_tau = 0.1;
        let c = 3.0;
        let mut u = LeakyIntegrator::new(dt_tau);
        let mut state = [0.0];
        for n in 1..=50 {
            u.evaluate(&[&[c]], &mut state).unwrap();
            let expected = c * (1.0 - (1.0 - dt_tau).powi(n));
            assert_relative_eq!(state[0], expected, max_relative = 1e-12);
        }
    }
}
