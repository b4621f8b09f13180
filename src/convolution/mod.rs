//! FFT-based convolution of 1D and 2D fields.
//!
//! A `Workspace` is bound to a source shape, a kernel shape and a `Mode`. It
//! picks transform sizes, plans the transforms, caches the spectrum of the
//! kernel and then convolves any number of sources:
//!
//! ```
//! # use neuralfield::convolution::{Mode, Workspace};
//! # use neuralfield::Shape;
//! let mut ws = Workspace::new(Mode::LinearFull, Shape::line(3), Shape::line(2)).unwrap();
//! ws.set_kernel(&[1.0, 1.0]);
//! let out = ws.convolve(&[1.0, 2.0, 3.0]).unwrap();
//! assert_eq!(out.len(), 4);
//! assert!((out[1] - 3.0).abs() < 1e-12);
//! ```

pub mod factor;

use crate::error::{Error, Result};
use crate::shape::Shape;
use crate::utils::{wrap, ZeroOut};

use self::factor::{find_closest_factor, is_optimal};

use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::fmt;
use std::sync::Arc;

/// Convolution semantics.
///
/// Linear modes treat the source as zero outside its extent and return a crop
/// of the full linear convolution. Circular modes treat the source as
/// periodic with its own extent as period, with the kernel origin at index 0:
/// `out[i] = sum_m k[m] * s[(i - m) mod len]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// The full linear convolution, `src + kernel - 1` long.
    LinearFull,
    /// `LinearSame` computed at the exact required transform size.
    LinearSameUnpadded,
    /// The central part of the full convolution, as long as the source.
    LinearSame,
    /// Only the positions where the kernel fully overlaps the source.
    LinearValid,
    /// Periodic convolution using the source length as transform size.
    CircularSame,
    /// Periodic convolution computed on a larger, optimal transform size.
    CircularSamePadded,
    /// The periodic convolution read over `src + kernel - 1` positions.
    CircularFullUnpadded,
    /// `CircularFullUnpadded` computed on an optimal transform size.
    CircularFull,
}

impl Mode {
    pub fn is_circular(&self) -> bool {
        match self {
            Mode::CircularSame
            | Mode::CircularSamePadded
            | Mode::CircularFullUnpadded
            | Mode::CircularFull => true,
            _ => false,
        }
    }

    /// Returns true if the transform size is rounded up to an optimal size.
    pub fn is_padded(&self) -> bool {
        match self {
            Mode::LinearSameUnpadded
            | Mode::CircularSame
            | Mode::CircularFullUnpadded => false,
            _ => true,
        }
    }

    /// The source is replicated over the whole transform buffer rather than
    /// written once.
    fn wraps_source(&self) -> bool {
        self.is_circular() && *self != Mode::CircularSame
    }

    /// Computes the transform length, output length and crop offset along one
    /// axis.
    fn axis(&self, src: usize, kernel: usize) -> Axis {
        use self::Mode::*;
        let (required, dst, offset) = match self {
            LinearFull => (src + kernel - 1, src + kernel - 1, 0),
            LinearSameUnpadded | LinearSame => (src + kernel / 2, src, kernel / 2),
            LinearValid => (src, src + 1 - kernel, kernel - 1),
            CircularSame => (src, src, 0),
            CircularSamePadded => (src + kernel - 1, src, kernel - 1),
            CircularFullUnpadded | CircularFull => {
                (src + 2 * kernel - 2, src + kernel - 1, kernel - 1)
            }
        };
        let fft = if self.is_padded() {
            find_closest_factor(required)
        } else {
            required
        };
        Axis { fft, dst, offset }
    }
}

#[derive(Copy, Clone, Debug)]
struct Axis {
    fft: usize,
    dst: usize,
    offset: usize,
}

/// Forward and inverse plans for both axes.
struct Plans {
    row_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
}

impl Plans {
    fn new(transform: Shape) -> Self {
        let mut planner = FftPlanner::new();
        Plans {
            row_forward: planner.plan_fft_forward(transform.width),
            row_inverse: planner.plan_fft_inverse(transform.width),
            col_forward: planner.plan_fft_forward(transform.height),
            col_inverse: planner.plan_fft_inverse(transform.height),
        }
    }
}

/// Buffers and cached kernel spectrum for repeated convolutions.
pub struct Workspace {
    mode: Mode,
    source: Shape,
    kernel: Shape,
    transform: Shape,
    output: Shape,
    offset: (usize, usize),
    /// Padded source, then the product spectrum, then the raw result.
    signal: Vec<Complex64>,
    /// Spectrum of the current kernel.
    spectrum: Vec<Complex64>,
    /// Transposition scratch for the column transforms.
    columns: Vec<Complex64>,
    dst: Vec<f64>,
    kernel_ready: bool,
    plans: Option<Plans>,
}

impl Workspace {
    /// Allocates a workspace convolving `source`-shaped fields with
    /// `kernel`-shaped kernels.
    ///
    /// A `LinearValid` workspace whose kernel is larger than its source has
    /// an empty output and never transforms anything.
    pub fn new(mode: Mode, source: Shape, kernel: Shape) -> Result<Self> {
        if source.is_empty() {
            return Err(Error::InvalidShape(format!(
                "empty convolution source {}",
                source
            )));
        }
        if kernel.is_empty() {
            return Err(Error::InvalidShape(format!(
                "empty convolution kernel {}",
                kernel
            )));
        }

        if mode == Mode::LinearValid
            && (kernel.height > source.height || kernel.width > source.width)
        {
            log::warn!(
                "valid convolution of {} by {} results in an empty field",
                source,
                kernel
            );
            return Ok(Workspace {
                mode,
                source,
                kernel,
                transform: Shape::new(0, 0),
                output: Shape::new(0, 0),
                offset: (0, 0),
                signal: Vec::new(),
                spectrum: Vec::new(),
                columns: Vec::new(),
                dst: Vec::new(),
                kernel_ready: false,
                plans: None,
            });
        }

        let rows = mode.axis(source.height, kernel.height);
        let cols = mode.axis(source.width, kernel.width);
        let transform = Shape::new(rows.fft, cols.fft);
        let output = Shape::new(rows.dst, cols.dst);
        if !is_optimal(transform.height) || !is_optimal(transform.width) {
            log::debug!(
                "{:?} workspace uses a suboptimal transform size {}",
                mode,
                transform
            );
        }
        log::debug!(
            "{:?} workspace: source {}, kernel {}, transform {}, output {}",
            mode,
            source,
            kernel,
            transform,
            output
        );

        Ok(Workspace {
            mode,
            source,
            kernel,
            transform,
            output,
            offset: (rows.offset, cols.offset),
            signal: vec![Complex64::default(); transform.len()],
            spectrum: vec![Complex64::default(); transform.len()],
            columns: vec![Complex64::default(); transform.len()],
            dst: vec![0.0; output.len()],
            kernel_ready: false,
            plans: Some(Plans::new(transform)),
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn source_shape(&self) -> Shape {
        self.source
    }

    pub fn kernel_shape(&self) -> Shape {
        self.kernel
    }

    pub fn transform_shape(&self) -> Shape {
        self.transform
    }

    pub fn output_shape(&self) -> Shape {
        self.output
    }

    /// Returns true if both transform lengths only use implemented factors.
    pub fn is_optimal(&self) -> bool {
        is_optimal(self.transform.height) && is_optimal(self.transform.width)
    }

    /// Returns true if a kernel spectrum is cached and up to date.
    pub fn has_kernel(&self) -> bool {
        self.kernel_ready
    }

    /// Marks the cached kernel spectrum as stale.
    pub fn invalidate_kernel(&mut self) {
        self.kernel_ready = false;
    }

    /// Computes and caches the spectrum of `kernel`.
    ///
    /// Kernel entries beyond the transform size wrap around, which is exact
    /// for every mode.
    pub fn set_kernel(&mut self, kernel: &[f64]) {
        assert_eq!(kernel.len(), self.kernel.len());
        let plans = match self.plans {
            Some(ref plans) => plans,
            None => {
                self.kernel_ready = true;
                return;
            }
        };
        let transform = self.transform;
        self.spectrum.zero_out();
        for i in 0..self.kernel.height {
            for j in 0..self.kernel.width {
                let k = transform.index(i % transform.height, j % transform.width);
                self.spectrum[k].re += kernel[self.kernel.index(i, j)];
            }
        }
        fft_2d(
            &*plans.row_forward,
            &*plans.col_forward,
            transform,
            &mut self.spectrum,
            &mut self.columns,
        );
        self.kernel_ready = true;
    }

    /// Convolves `src` with the cached kernel, returning the output field.
    pub fn convolve(&mut self, src: &[f64]) -> Result<&[f64]> {
        assert_eq!(src.len(), self.source.len());
        let plans = match self.plans {
            Some(ref plans) => plans,
            None => return Ok(&self.dst[..]),
        };
        if !self.kernel_ready {
            return Err(Error::StaleKernelTransform);
        }

        let transform = self.transform;
        let source = self.source;
        if self.mode.wraps_source() {
            let (shift_h, shift_w) = (
                self.kernel.height as isize - 1,
                self.kernel.width as isize - 1,
            );
            for t in 0..transform.height {
                let i = wrap(t as isize - shift_h, source.height);
                for u in 0..transform.width {
                    let j = wrap(u as isize - shift_w, source.width);
                    self.signal[transform.index(t, u)] =
                        Complex64::new(src[source.index(i, j)], 0.0);
                }
            }
        } else {
            self.signal.zero_out();
            for i in 0..source.height {
                for j in 0..source.width {
                    let k = transform.index(i % transform.height, j % transform.width);
                    self.signal[k].re += src[source.index(i, j)];
                }
            }
        }

        fft_2d(
            &*plans.row_forward,
            &*plans.col_forward,
            transform,
            &mut self.signal,
            &mut self.columns,
        );
        for (s, k) in self.signal.iter_mut().zip(self.spectrum.iter()) {
            *s *= *k;
        }
        fft_2d(
            &*plans.row_inverse,
            &*plans.col_inverse,
            transform,
            &mut self.signal,
            &mut self.columns,
        );

        let scale = 1.0 / transform.len() as f64;
        let (offset_h, offset_w) = self.offset;
        for i in 0..self.output.height {
            let row = transform.index(i + offset_h, offset_w);
            let dst_row = &mut self.dst[self.output.index(i, 0)..][..self.output.width];
            for (d, s) in dst_row.iter_mut().zip(&self.signal[row..]) {
                *d = s.re * scale;
            }
        }
        Ok(&self.dst[..])
    }
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("mode", &self.mode)
            .field("source", &self.source)
            .field("kernel", &self.kernel)
            .field("transform", &self.transform)
            .field("output", &self.output)
            .field("kernel_ready", &self.kernel_ready)
            .finish()
    }
}

/// Transforms a row-major `shape` buffer in place, rows first.
fn fft_2d(
    rows: &dyn Fft<f64>,
    cols: &dyn Fft<f64>,
    shape: Shape,
    buffer: &mut [Complex64],
    columns: &mut [Complex64],
) {
    let (h, w) = (shape.height, shape.width);
    if w > 1 {
        rows.process(buffer);
    }
    if h > 1 {
        for i in 0..h {
            for j in 0..w {
                columns[j * h + i] = buffer[i * w + j];
            }
        }
        cols.process(columns);
        for i in 0..h {
            for j in 0..w {
                buffer[i * w + j] = columns[j * h + i];
            }
        }
    }
}
