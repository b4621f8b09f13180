use rustfft::num_complex::Complex64;

/// A trait to replace all elements in a container with zeros.
pub trait ZeroOut {
    fn zero_out(&mut self);
}

impl ZeroOut for f64 {
    fn zero_out(&mut self) {
        *self = 0.0;
    }
}

impl ZeroOut for Complex64 {
    fn zero_out(&mut self) {
        self.re = 0.0;
        self.im = 0.0;
    }
}

impl<T> ZeroOut for [T]
where
    T: ZeroOut,
{
    fn zero_out(&mut self) {
        for elem in self {
            elem.zero_out();
        }
    }
}

impl<T> ZeroOut for Vec<T>
where
    T: ZeroOut,
{
    fn zero_out(&mut self) {
        for elem in self {
            elem.zero_out();
        }
    }
}

/// Wraps a possibly negative index into `0..len`.
#[inline(always)]
pub fn wrap(index: isize, len: usize) -> usize {
    index.rem_euclid(len as isize) as usize
}
