//! Loaders for test problems.
//!
//! - Matrix Market coordinate files (`real symmetric` or `complex hermitian`) into
//!   packed upper Hermitian storage.
//! - Plain vector files: the element count followed by `re im` pairs.
//! - CSR text files: `#` comment lines, a header `rows+1 nnz _`, then `nnz` lines of
//!   `row col re im` where the `row` field of the first `rows+1` lines is the row pointer.
//!
//! Every reader takes any `BufRead`; the `load_*` wrappers open a file.

use crate::error::GsError;
use crate::matrix::{CsrMatrix, HermitianPacked};
use num_complex::Complex64 as C64;
use num_traits::{One, Zero};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

/// Whitespace-separated tokens with their 1-based line numbers.
struct Tokens {
    tokens: std::vec::IntoIter<(usize, String)>,
    last_line: usize,
}

impl Tokens {
    fn new(lines: Vec<(usize, String)>) -> Self {
        let last_line = lines.last().map_or(0, |(n, _)| *n);
        let tokens: Vec<(usize, String)> = lines
            .into_iter()
            .flat_map(|(n, line)| {
                line.split_whitespace()
                    .map(|t| (n, t.to_string()))
                    .collect::<Vec<_>>()
            })
            .collect();
        Self { tokens: tokens.into_iter(), last_line }
    }

    fn next<T: FromStr>(&mut self, what: &str) -> Result<T, GsError> {
        match self.tokens.next() {
            Some((line, tok)) => tok.parse().map_err(|_| GsError::Parse {
                line,
                msg: format!("invalid {what} '{tok}'"),
            }),
            None => Err(GsError::Parse {
                line: self.last_line,
                msg: format!("unexpected end of input while reading {what}"),
            }),
        }
    }

    fn next_complex(&mut self) -> Result<C64, GsError> {
        let re = self.next::<f64>("real part")?;
        let im = self.next::<f64>("imaginary part")?;
        Ok(C64::new(re, im))
    }
}

fn numbered_lines<R: BufRead>(reader: R) -> Result<Vec<(usize, String)>, GsError> {
    reader
        .lines()
        .enumerate()
        .map(|(i, line)| line.map(|l| (i + 1, l)).map_err(GsError::from))
        .collect()
}

/// Read a Matrix Market coordinate file into packed Hermitian storage.
pub fn read_matrix_market<R: BufRead>(reader: R) -> Result<HermitianPacked, GsError> {
    let mut lines = numbered_lines(reader)?.into_iter();
    let (_, header) = lines
        .next()
        .ok_or_else(|| GsError::UnsupportedFormat("empty Matrix Market file".into()))?;
    let header = header.to_lowercase();
    if !header.starts_with("%%matrixmarket matrix coordinate") {
        return Err(GsError::UnsupportedFormat(format!("not a coordinate Matrix Market header: {header}")));
    }
    let is_complex = if header.contains("real") && header.contains("symmetric") {
        false
    } else if header.contains("complex") && header.contains("hermitian") {
        true
    } else {
        return Err(GsError::UnsupportedFormat(format!(
            "only real symmetric or complex hermitian matrices are supported: {header}"
        )));
    };

    let body: Vec<(usize, String)> = lines
        .filter(|(_, l)| !l.trim_start().starts_with('%'))
        .collect();
    let mut tokens = Tokens::new(body);
    let rows: usize = tokens.next("row count")?;
    let cols: usize = tokens.next("column count")?;
    let nnz: usize = tokens.next("entry count")?;
    if rows != cols {
        return Err(GsError::UnsupportedFormat(format!("matrix is not square ({rows} x {cols})")));
    }

    let mut a = HermitianPacked::from_fn(rows, |_, _| C64::zero());
    for _ in 0..nnz {
        let row: usize = tokens.next("row index")?;
        let col: usize = tokens.next("column index")?;
        let value = if is_complex {
            tokens.next_complex()?
        } else {
            C64::new(tokens.next::<f64>("value")?, 0.0)
        };
        if row == 0 || col == 0 || row > rows || col > rows {
            return Err(GsError::UnsupportedFormat(format!(
                "entry ({row}, {col}) outside a {rows} x {rows} matrix"
            )));
        }
        a.set(row - 1, col - 1, value);
    }
    Ok(a)
}

/// Read a vector: element count followed by `re im` pairs.
pub fn read_vector<R: BufRead>(reader: R) -> Result<Vec<C64>, GsError> {
    let mut tokens = Tokens::new(numbered_lines(reader)?);
    let len: usize = tokens.next("element count")?;
    (0..len).map(|_| tokens.next_complex()).collect()
}

/// Read a CSR text file.
pub fn read_csr<R: BufRead>(reader: R) -> Result<CsrMatrix, GsError> {
    let body: Vec<(usize, String)> = numbered_lines(reader)?
        .into_iter()
        .filter(|(_, l)| !l.trim_start().starts_with('#'))
        .collect();
    let mut tokens = Tokens::new(body);
    let row_ptr_len: usize = tokens.next("row pointer length")?;
    let nnz: usize = tokens.next("entry count")?;
    let _: usize = tokens.next("header field")?;
    if nnz < row_ptr_len {
        return Err(GsError::UnsupportedFormat(format!(
            "CSR file carries {nnz} entries but needs at least {row_ptr_len} for the row pointer"
        )));
    }

    let mut row_ptr = vec![0; row_ptr_len];
    let mut col_idx = vec![0; nnz];
    let mut values = vec![C64::zero(); nnz];
    for i in 0..nnz {
        let row: usize = tokens.next("row pointer entry")?;
        col_idx[i] = tokens.next("column index")?;
        values[i] = tokens.next_complex()?;
        if i < row_ptr_len {
            row_ptr[i] = row;
        }
    }
    CsrMatrix::from_csr(row_ptr, col_idx, values)
}

pub fn load_matrix_market<P: AsRef<Path>>(path: P) -> Result<HermitianPacked, GsError> {
    read_matrix_market(BufReader::new(File::open(path)?))
}

pub fn load_vector<P: AsRef<Path>>(path: P) -> Result<Vec<C64>, GsError> {
    read_vector(BufReader::new(File::open(path)?))
}

pub fn load_csr<P: AsRef<Path>>(path: P) -> Result<CsrMatrix, GsError> {
    read_csr(BufReader::new(File::open(path)?))
}

/// All-ones right-hand side.
pub fn ones(n: usize) -> Vec<C64> {
    vec![C64::one(); n]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_real_symmetric_matrix_market() {
        let text = "%%MatrixMarket matrix coordinate real symmetric\n% comment\n3 3 4\n1 1 2.0\n2 1 -1.0\n2 2 2.0\n3 3 5.0\n";
        let a = read_matrix_market(text.as_bytes()).unwrap();
        assert_eq!(a.size(), 3);
        assert_eq!(a.get(0, 1), C64::new(-1.0, 0.0));
        assert_eq!(a.get(1, 0), C64::new(-1.0, 0.0));
        assert_eq!(a.get(2, 2), C64::new(5.0, 0.0));
    }

    #[test]
    fn reads_complex_hermitian_lower_entries_as_conjugates() {
        let text = "%%MatrixMarket matrix coordinate complex hermitian\n2 2 3\n1 1 1.0 0.0\n2 1 0.5 2.0\n2 2 3.0 0.0\n";
        let a = read_matrix_market(text.as_bytes()).unwrap();
        assert_eq!(a.get(1, 0), C64::new(0.5, 2.0));
        assert_eq!(a.get(0, 1), C64::new(0.5, -2.0));
    }

    #[test]
    fn rejects_general_matrices() {
        let text = "%%MatrixMarket matrix coordinate real general\n1 1 1\n1 1 1.0\n";
        assert!(matches!(read_matrix_market(text.as_bytes()), Err(GsError::UnsupportedFormat(_))));
    }

    #[test]
    fn reports_truncated_vector() {
        let text = "3\n1.0 0.0\n2.0 0.0\n";
        match read_vector(text.as_bytes()) {
            Err(GsError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {other:?}"),
        }
        let v = read_vector("2\n1 2\n3 -4\n".as_bytes()).unwrap();
        assert_eq!(v, vec![C64::new(1.0, 2.0), C64::new(3.0, -4.0)]);
    }

    #[test]
    fn reads_csr_text() {
        // [[2, 0], [1, 3]]: row_ptr = [0, 1, 3]
        let text = "# CSR\n3 3 0\n0 0 2.0 0.0\n1 0 1.0 0.0\n3 1 3.0 0.0\n";
        let a = read_csr(text.as_bytes()).unwrap();
        assert_eq!(a.size(), 2);
        assert_eq!(a.nnz(), 3);
    }
}
