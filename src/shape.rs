use std::fmt;

/// The extent of a field, stored row-major.
///
/// A `width` of 1 denotes a 1D field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    pub height: usize,
    pub width: usize,
}

impl Shape {
    pub fn new(height: usize, width: usize) -> Self {
        Shape { height, width }
    }

    /// Creates the shape of a 1D field of `len` positions.
    pub fn line(len: usize) -> Self {
        Shape::new(len, 1)
    }

    /// Returns the number of positions in the field.
    pub fn len(&self) -> usize {
        self.height * self.width
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_1d(&self) -> bool {
        self.width == 1
    }

    /// Returns the row-major index of `(row, col)`.
    #[inline(always)]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }
}

impl From<usize> for Shape {
    fn from(len: usize) -> Shape {
        Shape::line(len)
    }
}

impl From<(usize, usize)> for Shape {
    fn from((height, width): (usize, usize)) -> Shape {
        Shape::new(height, width)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_1d() {
            write!(f, "{}", self.height)
        } else {
            write!(f, "{}x{}", self.height, self.width)
        }
    }
}
