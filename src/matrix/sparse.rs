// Complex CSR matrix used as a matrix-free operator for A or B.

use crate::core::traits::{Indexing, MatVec};
use crate::error::GsError;
use faer::sparse::{CreationError, SparseRowMat, Triplet};
use num_complex::Complex64 as C64;
use num_traits::Zero;

/// Square complex matrix in compressed sparse row form, stored as a faer `SparseRowMat`.
#[derive(Clone, Debug)]
pub struct CsrMatrix {
    inner: SparseRowMat<usize, C64>,
}

impl CsrMatrix {
    /// Build a CSR from raw row‐ptr, col‐idx, and values.
    ///
    /// Entries are handed to faer's fallible triplet constructor, which checks column
    /// bounds, sorts each row and sums duplicates.
    pub fn from_csr(
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<C64>,
    ) -> Result<Self, GsError> {
        if row_ptr.is_empty() {
            return Err(GsError::UnsupportedFormat("CSR row pointer is empty".into()));
        }
        let n = row_ptr.len() - 1;
        let nnz = values.len();
        if col_idx.len() != nnz {
            return Err(GsError::mismatch("CSR column indices", nnz, col_idx.len()));
        }
        if row_ptr[0] != 0 || row_ptr[n] != nnz || row_ptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(GsError::UnsupportedFormat(
                "CSR row pointer must start at 0, be non-decreasing and end at nnz".into(),
            ));
        }

        let triplets: Vec<Triplet<usize, usize, C64>> = row_ptr
            .windows(2)
            .enumerate()
            .flat_map(|(row, w)| (w[0]..w[1]).map(move |k| (row, k)))
            .map(|(row, k)| Triplet { row, col: col_idx[k], val: values[k] })
            .collect();
        let inner = SparseRowMat::try_new_from_triplets(n, n, &triplets).map_err(|err| match err {
            CreationError::OutOfBounds { .. } => {
                GsError::UnsupportedFormat(format!("CSR column index out of range for n = {n}"))
            }
            CreationError::Generic(err) => GsError::UnsupportedFormat(format!("CSR construction failed: {err:?}")),
        })?;
        Ok(Self { inner })
    }

    pub fn size(&self) -> usize {
        self.inner.nrows()
    }

    /// Stored entries after duplicates were merged.
    pub fn nnz(&self) -> usize {
        self.inner.val().len()
    }

    fn row_dot(&self, i: usize, x: &[C64]) -> C64 {
        let sym = self.inner.symbolic();
        sym.col_idx_of_row_raw(i)
            .iter()
            .zip(self.inner.val_of_row(i))
            .fold(C64::zero(), |acc, (&j, &v)| acc + v * x[j])
    }

    /// Compute y = A * x.
    pub fn spmv(&self, x: &[C64], y: &mut [C64]) {
        let n = self.size();
        assert_eq!(x.len(), n, "Input vector x has incorrect length");
        assert_eq!(y.len(), n, "Output vector y has incorrect length");
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            y.par_iter_mut()
                .enumerate()
                .for_each(|(i, yi)| *yi = self.row_dot(i, x));
        }
        #[cfg(not(feature = "rayon"))]
        {
            for (i, yi) in y.iter_mut().enumerate() {
                *yi = self.row_dot(i, x);
            }
        }
    }
}

impl MatVec<[C64]> for CsrMatrix {
    fn matvec(&self, x: &[C64], y: &mut [C64]) {
        self.spmv(x, y);
    }
}

impl Indexing for CsrMatrix {
    fn nrows(&self) -> usize {
        self.size()
    }
}
