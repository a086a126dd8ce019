//! Forward-mode Jacobians of discretised expressions
//!
//! Each node yields its value together with the derivative of that value with respect to
//! the global state vector, one row per element of the value.

use super::evaluate::broadcast_len;
use super::{BinaryOperator, Bindings, Symbol, SymbolId, SymbolKind, Value};
use crate::errors::{RSBMError, RSBMResult};
use nalgebra::DMatrix;
use std::collections::HashMap;

type Dual = (Value, DMatrix<f64>);

/// Repeat a single-row Jacobian so that it has `rows` rows
fn expand_rows(jac: &DMatrix<f64>, rows: usize) -> DMatrix<f64> {
    if jac.nrows() == rows {
        jac.clone()
    } else {
        DMatrix::from_fn(rows, jac.ncols(), |_, j| jac[(0, j)])
    }
}

impl Symbol {
    /// Evaluate the expression and its Jacobian with respect to the state vector
    ///
    /// `n_states` is the length of the state vector. Only discretised expressions can be
    /// differentiated this way: a continuous [`SymbolKind::Variable`] has no column in the
    /// state vector.
    pub fn evaluate_with_jacobian(
        &self,
        bindings: &Bindings,
        n_states: usize,
    ) -> RSBMResult<(Value, DMatrix<f64>)> {
        let mut cache = HashMap::new();
        self.dual(bindings, n_states, &mut cache)
    }

    fn dual(
        &self,
        bindings: &Bindings,
        n: usize,
        cache: &mut HashMap<SymbolId, Dual>,
    ) -> RSBMResult<Dual> {
        if let Some(found) = cache.get(&self.id()) {
            return Ok(found.clone());
        }
        let result = match self.kind() {
            SymbolKind::StateVector { slice, .. } => {
                let value = self.evaluate(bindings)?;
                let jac = DMatrix::from_fn(slice.len(), n, |i, j| {
                    if j == slice.start + i {
                        1.0
                    } else {
                        0.0
                    }
                });
                (value, jac)
            }
            SymbolKind::Variable { name } => {
                return Err(RSBMError::Model(format!(
                    "cannot take the Jacobian of continuous variable '{}'; discretise the model first",
                    name
                )))
            }
            SymbolKind::Scalar(_)
            | SymbolKind::Vector(_)
            | SymbolKind::Time
            | SymbolKind::Parameter { .. }
            | SymbolKind::SpatialVariable { .. } => {
                let value = self.evaluate(bindings)?;
                let rows = value.len();
                (value, DMatrix::zeros(rows, n))
            }
            SymbolKind::Unary { op, child } => {
                let (value, jac) = child.dual(bindings, n, cache)?;
                let mut out = jac.clone();
                let inner = value.clone().into_vector();
                for (i, x) in inner.iter().enumerate() {
                    let scale = op.derivative_value(*x);
                    out.row_mut(i).scale_mut(scale);
                }
                (value.map(|x| op.apply(x)), out)
            }
            SymbolKind::Binary { op, left, right } => {
                let (a, ja) = left.dual(bindings, n, cache)?;
                let (b, jb) = right.dual(bindings, n, cache)?;
                let rows = broadcast_len(a.len(), b.len(), self)?;
                let value = a.zip_with(&b, |x, y| op.apply(x, y), self)?;
                let av = a.to_vector(rows);
                let bv = b.to_vector(rows);
                let ja = expand_rows(&ja, rows);
                let jb = expand_rows(&jb, rows);
                let mut jac = DMatrix::zeros(rows, n);
                for i in 0..rows {
                    let (x, y) = (av[i], bv[i]);
                    let row = match op {
                        BinaryOperator::Add => ja.row(i) + jb.row(i),
                        BinaryOperator::Subtract => ja.row(i) - jb.row(i),
                        BinaryOperator::Multiply => ja.row(i) * y + jb.row(i) * x,
                        BinaryOperator::Divide => ja.row(i) / y - jb.row(i) * (x / (y * y)),
                        BinaryOperator::Power => {
                            let mut row = ja.row(i) * (y * x.powf(y - 1.0));
                            // d/dy x^y = x^y ln x, only needed when the exponent varies
                            if jb.row(i).iter().any(|v| *v != 0.0) {
                                row += jb.row(i) * (x.powf(y) * x.ln());
                            }
                            row
                        }
                    };
                    jac.set_row(i, &row);
                }
                (value, jac)
            }
            SymbolKind::NumericConcatenation(children) => {
                let mut values = vec![];
                let mut blocks = vec![];
                for child in children {
                    let (value, jac) = child.dual(bindings, n, cache)?;
                    values.extend(value.into_vector().iter());
                    blocks.push(jac);
                }
                let mut jac = DMatrix::zeros(values.len(), n);
                let mut offset = 0;
                for block in blocks {
                    jac.rows_mut(offset, block.nrows()).copy_from(&block);
                    offset += block.nrows();
                }
                (Value::Vector(nalgebra::DVector::from_vec(values)), jac)
            }
            SymbolKind::MatrixMultiplication { matrix, child } => {
                let (value, jac) = child.dual(bindings, n, cache)?;
                if value.len() != matrix.ncols() && value.as_scalar().is_none() {
                    return Err(RSBMError::ShapeMismatch {
                        symbol: self.to_string(),
                        expected: matrix.ncols(),
                        found: value.len(),
                    });
                }
                let operand = value.to_vector(matrix.ncols());
                let jac = expand_rows(&jac, matrix.ncols());
                (
                    Value::Vector(matrix.as_ref() * operand),
                    matrix.as_ref() * jac,
                )
            }
            SymbolKind::Gradient(_)
            | SymbolKind::Divergence(_)
            | SymbolKind::Integral(_)
            | SymbolKind::BoundaryValue { .. }
            | SymbolKind::Broadcast(_)
            | SymbolKind::DomainConcatenation(_) => {
                return Err(RSBMError::NotImplemented(format!(
                    "'{}' must be discretised before its Jacobian can be evaluated",
                    self
                )))
            }
        };
        cache.insert(self.id(), result.clone());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;
    use approx::assert_relative_eq;
    use nalgebra::{dvector, DMatrix, DVector};

    fn finite_difference(expr: &Symbol, y: &DVector<f64>) -> DMatrix<f64> {
        let base = expr
            .evaluate(&Bindings::new().with_state(y))
            .unwrap()
            .into_vector();
        let h = 1e-7;
        let mut jac = DMatrix::zeros(base.len(), y.len());
        for j in 0..y.len() {
            let mut shifted = y.clone();
            shifted[j] += h;
            let value = expr
                .evaluate(&Bindings::new().with_state(&shifted))
                .unwrap()
                .into_vector();
            jac.set_column(j, &((value - &base) / h));
        }
        jac
    }

    #[test]
    fn matches_finite_differences() {
        let y = dvector![0.5, 1.5, 2.0];
        let u = Symbol::state_vector("u", 0..2, Domain::Separator, None);
        let v = Symbol::state_vector("v", 2..3, Domain::Separator, None);
        let m = DMatrix::from_row_slice(2, 2, &[-1.0, 1.0, 2.0, 0.5]);
        let expr = Symbol::matrix_multiplication(m, &u, Domain::Separator)
            .mul(&v.exp())
            .unwrap()
            .div(&u.pow(2.0).unwrap().add(1.0).unwrap())
            .unwrap()
            .sub(&v.pow(&u).unwrap())
            .unwrap();

        let (value, jac) = expr
            .evaluate_with_jacobian(&Bindings::new().with_state(&y), 3)
            .unwrap();
        assert_eq!(
            value,
            expr.evaluate(&Bindings::new().with_state(&y)).unwrap()
        );
        assert_relative_eq!(jac, finite_difference(&expr, &y), epsilon = 1e-4);
    }

    #[test]
    fn stacked_children() {
        let y = dvector![1.0, 2.0];
        let a = Symbol::state_vector("a", 0..1, Domain::Separator, None);
        let b = Symbol::state_vector("b", 1..2, Domain::Separator, None);
        let stack = Symbol::numeric_concatenation(
            vec![a.mul(&b).unwrap(), b.sin()],
            Domain::Separator,
        );
        let (_, jac) = stack
            .evaluate_with_jacobian(&Bindings::new().with_state(&y), 2)
            .unwrap();
        assert_relative_eq!(jac, DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 0.0, 2.0_f64.cos()]));
    }

    #[test]
    fn abs_is_flat_at_origin() {
        let y = dvector![0.0, -2.0];
        let u = Symbol::state_vector("u", 0..2, Domain::Separator, None);
        let (_, jac) = u
            .abs()
            .evaluate_with_jacobian(&Bindings::new().with_state(&y), 2)
            .unwrap();
        assert_eq!(jac, DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 0.0, -1.0]));
    }

    #[test]
    fn continuous_variables_are_rejected() {
        let c = Symbol::variable("c", Domain::Separator);
        assert!(c.evaluate_with_jacobian(&Bindings::new(), 1).is_err());
    }
}
