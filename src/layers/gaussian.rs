use super::{expect_parameters, Arity, Layer};
use crate::convolution::{Mode, Workspace};
use crate::error::{Error, Result};
use crate::shape::Shape;

use std::f64::consts::SQRT_2;

/// The radial shape of a lateral kernel, as a function of the distance `d`
/// and the spread `sigma`. Every profile is 1 at `d = 0`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// `exp(-d^2 / (2 sigma^2))`
    Gaussian,
    /// `exp(-4 d / sigma^2)`
    Exponential,
    /// `max(0, 1 - d / (2 sigma))`
    Linear,
    /// 1 when `d < sigma`, 0 beyond.
    Step,
}

impl Profile {
    pub fn at(&self, d2: f64, sigma: f64) -> f64 {
        match *self {
            Profile::Gaussian => (-d2 / (2.0 * sigma * sigma)).exp(),
            Profile::Exponential => (-4.0 * d2.sqrt() / (sigma * sigma)).exp(),
            Profile::Linear => (1.0 - d2.sqrt() / (2.0 * sigma)).max(0.0),
            Profile::Step => {
                if d2 < sigma * sigma {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Profile::Gaussian
    }
}

/// Amplitude, spread and boundary handling of a lateral link.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GaussianConfig {
    pub amplitude: f64,
    pub sigma: f64,
    #[serde(default)]
    pub profile: Profile,
    /// Wrap the field around its edges.
    pub toric: bool,
    /// Compensate the kernel mass lost past the edges of a non-toric field.
    pub scaling: bool,
}

/// Convolves its predecessor with `A * exp(-d^2 / (2 sigma^2))`, or with
/// another radial `Profile` scaled by `A`.
///
/// Distances are measured in grid positions. On a toric field the
/// convolution is circular. Otherwise the field is zero beyond its edges
/// and, with scaling enabled, every output position is divided by the
/// fraction of the kernel mass that falls inside the field when centered
/// there.
#[derive(Debug)]
pub struct Gaussian {
    config: GaussianConfig,
    shape: Option<Shape>,
    workspace: Option<Workspace>,
    kernel: Vec<f64>,
    scaling_factors: Vec<f64>,
}

impl Gaussian {
    /// Creates a non-toric, unscaled link.
    pub fn new(amplitude: f64, sigma: f64) -> Self {
        Gaussian::from(GaussianConfig {
            amplitude,
            sigma,
            profile: Profile::Gaussian,
            toric: false,
            scaling: false,
        })
    }

    pub fn toric(mut self, toric: bool) -> Self {
        self.config.toric = toric;
        self
    }

    pub fn profile(mut self, profile: Profile) -> Self {
        self.config.profile = profile;
        self
    }

    pub fn scaling(mut self, scaling: bool) -> Self {
        self.config.scaling = scaling;
        self
    }

    pub fn config(&self) -> GaussianConfig {
        self.config
    }

    /// Returns the per-position edge compensation, empty unless the link is
    /// prepared, non-toric and scaling.
    pub fn scaling_factors(&self) -> &[f64] {
        &self.scaling_factors
    }

    /// Returns the sampled kernel, empty until the link is prepared.
    pub fn kernel(&self) -> &[f64] {
        &self.kernel
    }

    /// Checks that the amplitude and spread describe a usable kernel.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.config.amplitude.is_finite() {
            return Err(format!("amplitude {} is not finite", self.config.amplitude));
        }
        if !(self.config.sigma > 0.0) || !self.config.sigma.is_finite() {
            return Err(format!("sigma must be positive, got {}", self.config.sigma));
        }
        // The edge compensation integrates a Gaussian.
        if self.config.scaling && !self.config.toric && self.config.profile != Profile::Gaussian {
            return Err(format!(
                "edge scaling needs a gaussian profile, got {:?}",
                self.config.profile
            ));
        }
        Ok(())
    }

    fn value(&self, d2: f64) -> f64 {
        self.config.amplitude * self.config.profile.at(d2, self.config.sigma)
    }

    /// Samples the kernel, caches its spectrum and recomputes the scaling
    /// factors for the current parameters.
    fn rebuild(&mut self, shape: Shape) {
        let (h, w) = (shape.height as isize, shape.width as isize);
        let mut kernel = Vec::with_capacity(self.kernel.len());
        if self.config.toric {
            for i in 0..h {
                let di = i.min(h - i) as f64;
                for j in 0..w {
                    let dj = j.min(w - j) as f64;
                    kernel.push(self.value(di * di + dj * dj));
                }
            }
        } else {
            for i in 0..(2 * h - 1) {
                let di = (i - (h - 1)) as f64;
                for j in 0..(2 * w - 1) {
                    let dj = (j - (w - 1)) as f64;
                    kernel.push(self.value(di * di + dj * dj));
                }
            }
        }
        self.kernel = kernel;
        if let Some(ref mut workspace) = self.workspace {
            workspace.set_kernel(&self.kernel);
        }

        self.scaling_factors.clear();
        if !self.config.toric && self.config.scaling {
            let rows = axis_mass(shape.height, self.config.sigma);
            let cols = if shape.is_1d() {
                vec![1.0]
            } else {
                axis_mass(shape.width, self.config.sigma)
            };
            for r in &rows {
                for c in &cols {
                    self.scaling_factors.push(1.0 / (r * c));
                }
            }
        }
    }
}

impl From<GaussianConfig> for Gaussian {
    fn from(config: GaussianConfig) -> Gaussian {
        Gaussian {
            config,
            shape: None,
            workspace: None,
            kernel: Vec::new(),
            scaling_factors: Vec::new(),
        }
    }
}

/// Fraction of a unit Gaussian mass, centered on each position of an axis of
/// `len` cells, that falls inside `[-0.5, len - 0.5]`.
fn axis_mass(len: usize, sigma: f64) -> Vec<f64> {
    let scale = 1.0 / (sigma * SQRT_2);
    (0..len)
        .map(|x| {
            let x = x as f64;
            let upper = libm::erf((len as f64 - 0.5 - x) * scale);
            let lower = libm::erf((x + 0.5) * scale);
            0.5 * (upper + lower)
        })
        .collect()
}

impl Layer for Gaussian {
    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn prepare(&mut self, shape: Shape) -> Result<()> {
        let (mode, kernel_shape) = if self.config.toric {
            (Mode::CircularSame, shape)
        } else {
            (
                Mode::LinearSame,
                Shape::new(2 * shape.height - 1, 2 * shape.width - 1),
            )
        };
        self.workspace = Some(Workspace::new(mode, shape, kernel_shape)?);
        self.shape = Some(shape);
        self.rebuild(shape);
        Ok(())
    }

    fn evaluate(&mut self, inputs: &[&[f64]], output: &mut [f64]) -> Result<()> {
        let workspace = self.workspace.as_mut().ok_or(Error::NotInitialized)?;
        output.copy_from_slice(workspace.convolve(inputs[0])?);
        for (y, s) in output.iter_mut().zip(self.scaling_factors.iter()) {
            *y *= s;
        }
        Ok(())
    }

    fn parameters(&self) -> Vec<f64> {
        vec![self.config.amplitude, self.config.sigma]
    }

    fn set_parameters(&mut self, values: &[f64]) -> std::result::Result<(), String> {
        expect_parameters(values, 2)?;
        let previous = self.config;
        self.config.amplitude = values[0];
        self.config.sigma = values[1];
        if let Err(reason) = self.validate() {
            self.config = previous;
            return Err(reason);
        }
        if let Some(shape) = self.shape {
            if let Some(ref mut workspace) = self.workspace {
                workspace.invalidate_kernel();
            }
            self.rebuild(shape);
            log::debug!(
                "gaussian kernel rebuilt with amplitude {} and sigma {}",
                values[0],
                values[1]
            );
        }
        Ok(())
    }
}
