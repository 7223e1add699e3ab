/// In-plane pixel layout of one slice.
///
/// Rows are emitted bottom-to-top: flattened index `k` walks the slice with
/// its row order reversed, so output row 0 is the last row of the stored
/// image. Both directions of the mapping live here so the convention is
/// written down exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceGrid {
    rows: usize,
    cols: usize,
}

impl SliceGrid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub fn from_dim((rows, cols): (usize, usize)) -> Self {
        Self::new(rows, cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn pixel_count(&self) -> usize {
        self.rows * self.cols
    }

    /// `(row, col)` of flattened index `k` in output coordinates.
    #[inline]
    pub fn position(&self, k: usize) -> (usize, usize) {
        (k / self.cols, k % self.cols)
    }

    /// `[row, col]` of flattened index `k` in the stored image.
    #[inline]
    pub fn source_index(&self, k: usize) -> [usize; 2] {
        let (row, col) = self.position(k);
        [self.rows - 1 - row, col]
    }
}
