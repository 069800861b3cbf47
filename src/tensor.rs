//! Dense matrix abstraction used by the model, with an in-memory backend.
//!
//! The regression code only talks to [`Tensor`], so any dense 2-D backend
//! can be plugged in. [`Matrix`] is the default row-major implementation;
//! enabling the `ndarray` feature adds an implementation for
//! `ndarray::Array2<f64>`.
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operations a dense 2-D numeric backend must provide.
///
/// All binary operations validate shapes and return
/// [`Error::ShapeMismatch`] rather than panicking.
pub trait Tensor: Clone + fmt::Debug + Sized {
    /// Build from row vectors. All rows must have the same length.
    fn from_rows(rows: &[Vec<f64>]) -> Result<Self>;
    fn filled(rows: usize, cols: usize, value: f64) -> Self;
    fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }
    /// `(rows, cols)`
    fn shape(&self) -> (usize, usize);
    fn nrows(&self) -> usize {
        self.shape().0
    }
    fn ncols(&self) -> usize {
        self.shape().1
    }
    fn get(&self, row: usize, col: usize) -> f64;
    fn matmul(&self, rhs: &Self) -> Result<Self>;
    fn transpose(&self) -> Self;
    /// Elementwise `self - rhs`.
    fn sub(&self, rhs: &Self) -> Result<Self>;
    /// Elementwise (Hadamard) product.
    fn mul_elem(&self, rhs: &Self) -> Result<Self>;
    fn map<F: Fn(f64) -> f64>(&self, f: F) -> Self;
    fn scale(&self, factor: f64) -> Self {
        self.map(move |x| x * factor)
    }
    /// Rows `start..start + len`, all columns.
    fn slice_rows(&self, start: usize, len: usize) -> Result<Self>;
    /// Concatenate columns: `[self | rhs]`.
    fn hstack(&self, rhs: &Self) -> Result<Self>;
    /// Per-column population mean and variance (divides by N).
    fn column_moments(&self) -> Result<(Vec<f64>, Vec<f64>)>;
    /// Subtract `row` from every row.
    fn sub_row(&self, row: &[f64]) -> Result<Self>;
    /// Divide every row elementwise by `row`.
    fn div_row(&self, row: &[f64]) -> Result<Self>;
    fn sum(&self) -> f64;
    fn to_rows(&self) -> Vec<Vec<f64>>;
}

/// Row-major dense matrix of `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Wrap a row-major buffer of `rows * cols` values.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::ShapeMismatch {
                operation: "from_vec",
                expected: format!("{} values", rows * cols),
                got: format!("{} values", data.len()),
            });
        }
        Ok(Self { rows, cols, data })
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn row(&self, index: usize) -> &[f64] {
        &self.data[index * self.cols..(index + 1) * self.cols]
    }

    fn zip_with(
        &self,
        rhs: &Self,
        operation: &'static str,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Self> {
        if self.shape() != rhs.shape() {
            return Err(Error::shape(operation, self.shape(), rhs.shape()));
        }
        let data = self
            .data
            .iter()
            .zip(&rhs.data)
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    fn broadcast_row(
        &self,
        row: &[f64],
        operation: &'static str,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Self> {
        if row.len() != self.cols {
            return Err(Error::shape(operation, (1, self.cols), (1, row.len())));
        }
        let data = self
            .data
            .chunks(self.cols.max(1))
            .flat_map(|r| r.iter().zip(row).map(|(&a, &b)| f(a, b)))
            .collect();
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }
}

impl Tensor for Matrix {
    fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::ShapeMismatch {
                    operation: "from_rows",
                    expected: format!("{cols} columns"),
                    got: format!("{} columns in row {i}", row.len()),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    fn matmul(&self, rhs: &Self) -> Result<Self> {
        if self.cols != rhs.rows {
            return Err(Error::shape(
                "matmul",
                (self.cols, rhs.cols),
                (rhs.rows, rhs.cols),
            ));
        }
        let mut data = vec![0.0; self.rows * rhs.cols];
        for i in 0..self.rows {
            let out = &mut data[i * rhs.cols..(i + 1) * rhs.cols];
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                for (o, &b) in out.iter_mut().zip(rhs.row(k)) {
                    *o += a * b;
                }
            }
        }
        Ok(Self {
            rows: self.rows,
            cols: rhs.cols,
            data,
        })
    }

    fn transpose(&self) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for j in 0..self.cols {
            for i in 0..self.rows {
                data.push(self.data[i * self.cols + j]);
            }
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    fn sub(&self, rhs: &Self) -> Result<Self> {
        self.zip_with(rhs, "sub", |a, b| a - b)
    }

    fn mul_elem(&self, rhs: &Self) -> Result<Self> {
        self.zip_with(rhs, "mul_elem", |a, b| a * b)
    }

    fn map<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    fn slice_rows(&self, start: usize, len: usize) -> Result<Self> {
        if start + len > self.rows {
            return Err(Error::ShapeMismatch {
                operation: "slice_rows",
                expected: format!("at most {} rows", self.rows),
                got: format!("rows {}..{}", start, start + len),
            });
        }
        Ok(Self {
            rows: len,
            cols: self.cols,
            data: self.data[start * self.cols..(start + len) * self.cols].to_vec(),
        })
    }

    fn hstack(&self, rhs: &Self) -> Result<Self> {
        if self.rows != rhs.rows {
            return Err(Error::shape(
                "hstack",
                (self.rows, rhs.cols),
                (rhs.rows, rhs.cols),
            ));
        }
        let cols = self.cols + rhs.cols;
        let mut data = Vec::with_capacity(self.rows * cols);
        for i in 0..self.rows {
            data.extend_from_slice(self.row(i));
            data.extend_from_slice(rhs.row(i));
        }
        Ok(Self {
            rows: self.rows,
            cols,
            data,
        })
    }

    fn column_moments(&self) -> Result<(Vec<f64>, Vec<f64>)> {
        if self.rows == 0 {
            return Err(Error::EmptyDataset);
        }
        let n = self.rows as f64;
        let mut mean = vec![0.0; self.cols];
        for i in 0..self.rows {
            for (m, &x) in mean.iter_mut().zip(self.row(i)) {
                *m += x;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);
        let mut variance = vec![0.0; self.cols];
        for i in 0..self.rows {
            for ((v, &x), &m) in variance.iter_mut().zip(self.row(i)).zip(&mean) {
                *v += (x - m).powi(2);
            }
        }
        variance.iter_mut().for_each(|v| *v /= n);
        Ok((mean, variance))
    }

    fn sub_row(&self, row: &[f64]) -> Result<Self> {
        self.broadcast_row(row, "sub_row", |a, b| a - b)
    }

    fn div_row(&self, row: &[f64]) -> Result<Self> {
        self.broadcast_row(row, "div_row", |a, b| a / b)
    }

    fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.rows).map(|i| self.row(i).to_vec()).collect()
    }
}

#[cfg(feature = "ndarray")]
mod ndarray_backend {
    use super::Tensor;
    use crate::error::{Error, Result};
    use ndarray::{s, Array1, Array2, Axis};

    impl Tensor for Array2<f64> {
        fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
            let cols = rows.first().map_or(0, Vec::len);
            let mut flat = Vec::with_capacity(rows.len() * cols);
            for (i, row) in rows.iter().enumerate() {
                if row.len() != cols {
                    return Err(Error::ShapeMismatch {
                        operation: "from_rows",
                        expected: format!("{cols} columns"),
                        got: format!("{} columns in row {i}", row.len()),
                    });
                }
                flat.extend_from_slice(row);
            }
            Array2::from_shape_vec((rows.len(), cols), flat).map_err(|e| Error::ShapeMismatch {
                operation: "from_rows",
                expected: format!("{}x{}", rows.len(), cols),
                got: e.to_string(),
            })
        }

        fn filled(rows: usize, cols: usize, value: f64) -> Self {
            Array2::from_elem((rows, cols), value)
        }

        fn shape(&self) -> (usize, usize) {
            self.dim()
        }

        fn get(&self, row: usize, col: usize) -> f64 {
            self[[row, col]]
        }

        fn matmul(&self, rhs: &Self) -> Result<Self> {
            if self.ncols() != rhs.nrows() {
                return Err(Error::shape("matmul", (self.ncols(), rhs.ncols()), rhs.dim()));
            }
            Ok(self.dot(rhs))
        }

        fn transpose(&self) -> Self {
            self.t().to_owned()
        }

        fn sub(&self, rhs: &Self) -> Result<Self> {
            if self.dim() != rhs.dim() {
                return Err(Error::shape("sub", self.dim(), rhs.dim()));
            }
            Ok(self - rhs)
        }

        fn mul_elem(&self, rhs: &Self) -> Result<Self> {
            if self.dim() != rhs.dim() {
                return Err(Error::shape("mul_elem", self.dim(), rhs.dim()));
            }
            Ok(self * rhs)
        }

        fn map<F: Fn(f64) -> f64>(&self, f: F) -> Self {
            self.mapv(f)
        }

        fn slice_rows(&self, start: usize, len: usize) -> Result<Self> {
            if start + len > self.nrows() {
                return Err(Error::ShapeMismatch {
                    operation: "slice_rows",
                    expected: format!("at most {} rows", self.nrows()),
                    got: format!("rows {}..{}", start, start + len),
                });
            }
            Ok(self.slice(s![start..start + len, ..]).to_owned())
        }

        fn hstack(&self, rhs: &Self) -> Result<Self> {
            ndarray::concatenate(Axis(1), &[self.view(), rhs.view()])
                .map_err(|_| Error::shape("hstack", (self.nrows(), rhs.ncols()), rhs.dim()))
        }

        fn column_moments(&self) -> Result<(Vec<f64>, Vec<f64>)> {
            let mean = self.mean_axis(Axis(0)).ok_or(Error::EmptyDataset)?;
            let variance = self.var_axis(Axis(0), 0.0);
            Ok((mean.to_vec(), variance.to_vec()))
        }

        fn sub_row(&self, row: &[f64]) -> Result<Self> {
            if row.len() != self.ncols() {
                return Err(Error::shape("sub_row", (1, self.ncols()), (1, row.len())));
            }
            Ok(self - &Array1::from(row.to_vec()))
        }

        fn div_row(&self, row: &[f64]) -> Result<Self> {
            if row.len() != self.ncols() {
                return Err(Error::shape("div_row", (1, self.ncols()), (1, row.len())));
            }
            Ok(self / &Array1::from(row.to_vec()))
        }

        fn sum(&self) -> f64 {
            self.iter().sum()
        }

        fn to_rows(&self) -> Vec<Vec<f64>> {
            self.outer_iter().map(|r| r.to_vec()).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rows: &[&[f64]]) -> Matrix {
        Matrix::from_rows(&rows.iter().map(|r| r.to_vec()).collect::<Vec<_>>()).unwrap()
    }

    #[test]
    fn matmul_and_transpose() {
        let a = m(&[&[1.0, 2.0], &[3.0, 4.0], &[5.0, 6.0]]);
        let b = m(&[&[1.0], &[-1.0]]);
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.to_rows(), vec![vec![-1.0], vec![-1.0], vec![-1.0]]);
        assert_eq!(a.transpose().shape(), (2, 3));
        assert_eq!(a.transpose().get(1, 2), 6.0);
        assert!(matches!(
            a.matmul(&a),
            Err(Error::ShapeMismatch { operation: "matmul", .. })
        ));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(Matrix::from_rows(&rows).is_err());
    }

    #[test]
    fn population_moments() {
        let a = m(&[&[1.0, 5.0], &[3.0, 5.0]]);
        let (mean, variance) = a.column_moments().unwrap();
        assert_eq!(mean, vec![2.0, 5.0]);
        assert_eq!(variance, vec![1.0, 0.0]);
        let empty = Matrix::zeros(0, 2);
        assert!(matches!(empty.column_moments(), Err(Error::EmptyDataset)));
    }

    #[test]
    fn broadcasting_and_stacking() {
        let a = m(&[&[2.0, 4.0], &[6.0, 8.0]]);
        let shifted = a.sub_row(&[1.0, 2.0]).unwrap().div_row(&[1.0, 2.0]).unwrap();
        assert_eq!(shifted.to_rows(), vec![vec![1.0, 1.0], vec![5.0, 3.0]]);
        let stacked = Matrix::filled(2, 1, 1.0).hstack(&a).unwrap();
        assert_eq!(stacked.row(1), &[1.0, 6.0, 8.0]);
        assert!(a.sub_row(&[1.0]).is_err());
    }

    #[test]
    fn slice_rows_bounds() {
        let a = m(&[&[1.0], &[2.0], &[3.0]]);
        assert_eq!(a.slice_rows(1, 2).unwrap().as_slice(), &[2.0, 3.0]);
        assert!(a.slice_rows(2, 2).is_err());
    }

    #[cfg(feature = "ndarray")]
    #[test]
    fn ndarray_backend_agrees_with_matrix() {
        use ndarray::Array2;
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 9.0]];
        let ours = Matrix::from_rows(&rows).unwrap();
        let theirs = <Array2<f64> as Tensor>::from_rows(&rows).unwrap();
        let lhs = ours.transpose().matmul(&ours).unwrap();
        let rhs = Tensor::transpose(&theirs).matmul(&theirs).unwrap();
        assert_eq!(lhs.to_rows(), Tensor::to_rows(&rhs));
        let (m1, v1) = ours.column_moments().unwrap();
        let (m2, v2) = theirs.column_moments().unwrap();
        for (a, b) in m1.iter().chain(&v1).zip(m2.iter().chain(&v2)) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
