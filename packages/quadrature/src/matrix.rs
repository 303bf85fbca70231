use std::fmt::{self, Display};
use std::iter::{Skip, StepBy, Take};
use std::num::NonZero;
use std::ops::Range;
use std::slice;
use std::sync::Arc;

use task_pool::Pool;

use crate::{Error, Result};

/// Relative tolerance used by [`matches_reference()`].
pub const REFERENCE_TOLERANCE: f64 = 1e-9;

/// How the flattened matrix buffer maps to rows and columns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum Layout {
    /// Element `(i, j)` is at `i * size + j`.
    #[default]
    RowMajor,

    /// Element `(i, j)` is at `i + j * size`.
    ColumnMajor,
}

impl Layout {
    /// Every layout, in a stable order.
    pub const ALL: [Self; 2] = [Self::RowMajor, Self::ColumnMajor];

    /// Offset of the first element and distance between consecutive elements of one row.
    fn row(self, size: usize, row: usize) -> (usize, usize) {
        match self {
            Self::RowMajor => (row.saturating_mul(size), 1),
            Self::ColumnMajor => (row, size),
        }
    }

    /// Offset of the first element and distance between consecutive elements of one column.
    fn column(self, size: usize, column: usize) -> (usize, usize) {
        match self {
            Self::RowMajor => (column, size),
            Self::ColumnMajor => (column.saturating_mul(size), 1),
        }
    }
}

impl Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RowMajor => "row major",
            Self::ColumnMajor => "column major",
        })
    }
}

/// How a pooled matrix-vector product is split into tasks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Decomposition {
    /// Each task computes the final values of a block of result elements.
    RowBlocks,

    /// Each task multiplies a block of columns by the matching vector elements, producing a
    /// partial result for every element. The partial results are added up by index.
    ColumnBlocks,
}

impl Decomposition {
    /// Every decomposition, in a stable order.
    pub const ALL: [Self; 2] = [Self::RowBlocks, Self::ColumnBlocks];
}

impl Display for Decomposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RowBlocks => "row blocks",
            Self::ColumnBlocks => "column blocks",
        })
    }
}

/// A dense square matrix together with the vector it is multiplied by.
///
/// Element `k` of the flattened matrix is `1.0001 * k` and element `j` of the vector is
/// `size - j`, which gives large, distinct values that make ordering mistakes visible. The
/// same buffer can be read in either [`Layout`], which yields two different matrices, so every
/// product must be checked against the reference of the same layout.
///
/// # Example
///
/// ```rust
/// use std::num::NonZero;
///
/// use quadrature::{Decomposition, Layout, MatrixVector, matches_reference};
/// use task_pool::Pool;
///
/// let problem = MatrixVector::new(NonZero::new(64).unwrap()).unwrap();
/// let pool = Pool::new(4).unwrap();
///
/// let reference = problem.reference(Layout::ColumnMajor);
/// let parallel = problem
///     .multiply_pooled(
///         &pool,
///         Layout::ColumnMajor,
///         Decomposition::ColumnBlocks,
///         NonZero::new(8).unwrap(),
///     )
///     .unwrap();
///
/// assert!(matches_reference(&parallel, &reference));
/// ```
#[derive(Clone, Debug)]
pub struct MatrixVector {
    size: NonZero<usize>,
    matrix: Arc<[f64]>,
    vector: Arc<[f64]>,
}

impl MatrixVector {
    /// Creates the `size` x `size` problem.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MatrixTooLarge`] if the element count overflows `usize`.
    pub fn new(size: NonZero<usize>) -> Result<Self> {
        let element_count = size
            .get()
            .checked_mul(size.get())
            .ok_or(Error::MatrixTooLarge { size: size.get() })?;

        #[expect(
            clippy::cast_precision_loss,
            reason = "exact values are irrelevant, only reproducibility matters"
        )]
        let matrix = (0..element_count).map(|i| 1.0001 * i as f64).collect();

        #[expect(
            clippy::cast_precision_loss,
            reason = "exact values are irrelevant, only reproducibility matters"
        )]
        let vector = (0..size.get()).map(|j| (size.get() - j) as f64).collect();

        Ok(Self {
            size,
            matrix,
            vector,
        })
    }

    /// Number of rows and columns.
    #[must_use]
    pub fn size(&self) -> NonZero<usize> {
        self.size
    }

    /// Multiplies the row-major matrix by the vector on the calling thread, one row at a time.
    #[must_use]
    pub fn multiply_sequential(&self) -> Vec<f64> {
        multiply_rows(
            &self.matrix,
            &self.vector,
            self.size,
            Layout::RowMajor,
            0..self.size.get(),
        )
    }

    /// Multiplies the column-major matrix by the vector on the calling thread, accumulating
    /// one column at a time.
    #[must_use]
    pub fn multiply_col_sequential(&self) -> Vec<f64> {
        multiply_columns(
            &self.matrix,
            &self.vector,
            self.size,
            Layout::ColumnMajor,
            0..self.size.get(),
        )
    }

    /// The sequential result for the given layout, for use with [`matches_reference()`].
    #[must_use]
    pub fn reference(&self, layout: Layout) -> Vec<f64> {
        match layout {
            Layout::RowMajor => self.multiply_sequential(),
            Layout::ColumnMajor => self.multiply_col_sequential(),
        }
    }

    /// Multiplies the matrix, read in `layout`, by the vector. Submits one pool task per block
    /// of `block_size` rows or columns, depending on `decomposition`.
    ///
    /// Row blocks are assembled by their first row index. Partial results of column blocks are
    /// added up in block order. Neither depends on the order in which the tasks finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool rejects a task or a task fails.
    pub fn multiply_pooled(
        &self,
        pool: &Pool,
        layout: Layout,
        decomposition: Decomposition,
        block_size: NonZero<usize>,
    ) -> Result<Vec<f64>> {
        let size = self.size.get();

        let handles = (0..size)
            .step_by(block_size.get())
            .map(|first| {
                let matrix = Arc::clone(&self.matrix);
                let vector = Arc::clone(&self.vector);
                let matrix_size = self.size;
                let block = first..first.saturating_add(block_size.get()).min(size);

                pool.submit(move || match decomposition {
                    Decomposition::RowBlocks => {
                        multiply_rows(&matrix, &vector, matrix_size, layout, block)
                    }
                    Decomposition::ColumnBlocks => {
                        multiply_columns(&matrix, &vector, matrix_size, layout, block)
                    }
                })
            })
            .collect::<task_pool::Result<Vec<_>>>()?;

        match decomposition {
            Decomposition::RowBlocks => {
                let mut result = Vec::with_capacity(size);

                for handle in &handles {
                    result.extend_from_slice(handle.wait()?);
                }

                Ok(result)
            }
            Decomposition::ColumnBlocks => {
                let mut result = vec![0.0; size];

                for handle in &handles {
                    for (total, partial) in result.iter_mut().zip(handle.wait()?) {
                        *total += partial;
                    }
                }

                Ok(result)
            }
        }
    }

    /// Floating point operations performed by one multiplication.
    #[must_use]
    pub fn flop_count(&self) -> f64 {
        #[expect(
            clippy::cast_precision_loss,
            reason = "only used for reporting throughput"
        )]
        let n = self.size.get() as f64;

        2.0 * n * n
    }

    /// Bytes of matrix data read by one multiplication.
    #[must_use]
    pub fn matrix_bytes(&self) -> f64 {
        #[expect(
            clippy::cast_precision_loss,
            reason = "only used for reporting throughput"
        )]
        let bytes = size_of_val(&*self.matrix) as f64;

        bytes
    }
}

type Line<'a> = Take<StepBy<Skip<slice::Iter<'a, f64>>>>;

fn line(matrix: &[f64], size: NonZero<usize>, (offset, stride): (usize, usize)) -> Line<'_> {
    matrix.iter().skip(offset).step_by(stride).take(size.get())
}

/// Final values of the result elements in `rows`.
fn multiply_rows(
    matrix: &[f64],
    vector: &[f64],
    size: NonZero<usize>,
    layout: Layout,
    rows: Range<usize>,
) -> Vec<f64> {
    rows.map(|row| {
        line(matrix, size, layout.row(size.get(), row))
            .zip(vector)
            .map(|(a, x)| a * x)
            .sum()
    })
    .collect()
}

/// Contribution of the columns in `columns` to every result element.
fn multiply_columns(
    matrix: &[f64],
    vector: &[f64],
    size: NonZero<usize>,
    layout: Layout,
    columns: Range<usize>,
) -> Vec<f64> {
    let mut partial = vec![0.0; size.get()];

    for (column, x) in columns.clone().zip(vector.iter().skip(columns.start)) {
        for (total, a) in partial
            .iter_mut()
            .zip(line(matrix, size, layout.column(size.get(), column)))
        {
            *total += a * x;
        }
    }

    partial
}

/// Whether every element of `actual` is within [`REFERENCE_TOLERANCE`] of the corresponding
/// element of `reference`, relative to the reference value.
#[must_use]
pub fn matches_reference(actual: &[f64], reference: &[f64]) -> bool {
    actual.len() == reference.len()
        && actual
            .iter()
            .zip(reference)
            .all(|(a, r)| (a - r).abs() <= REFERENCE_TOLERANCE * r.abs())
}
