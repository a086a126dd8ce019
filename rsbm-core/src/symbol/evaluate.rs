//! Numerical evaluation of expressions

use super::{Symbol, SymbolId, SymbolKind};
use crate::errors::{RSBMError, RSBMResult};
use crate::parameters::ParameterValues;
use nalgebra::DVector;
use std::collections::HashMap;

/// Result of evaluating an expression
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    Vector(DVector<f64>),
}

impl Value {
    pub fn len(&self) -> usize {
        match self {
            Value::Scalar(_) => 1,
            Value::Vector(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The single value of a scalar or length-one vector
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(x) => Some(*x),
            Value::Vector(v) if v.len() == 1 => Some(v[0]),
            Value::Vector(_) => None,
        }
    }

    /// Expand to a vector of length `len`, broadcasting scalars
    pub fn to_vector(&self, len: usize) -> DVector<f64> {
        match self.as_scalar() {
            Some(x) => DVector::from_element(len, x),
            None => match self {
                Value::Vector(v) => v.clone(),
                Value::Scalar(x) => DVector::from_element(len, *x),
            },
        }
    }

    pub fn into_vector(self) -> DVector<f64> {
        match self {
            Value::Scalar(x) => DVector::from_element(1, x),
            Value::Vector(v) => v,
        }
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Value {
        match self {
            Value::Scalar(x) => Value::Scalar(f(*x)),
            Value::Vector(v) => Value::Vector(v.map(f)),
        }
    }

    /// Combine elementwise, broadcasting scalars and length-one vectors
    pub fn zip_with(
        &self,
        other: &Value,
        f: impl Fn(f64, f64) -> f64,
        context: &Symbol,
    ) -> RSBMResult<Value> {
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => Ok(Value::Scalar(f(*a, *b))),
            _ => {
                let len = broadcast_len(self.len(), other.len(), context)?;
                let a = self.to_vector(len);
                let b = other.to_vector(len);
                Ok(Value::Vector(a.zip_map(&b, f)))
            }
        }
    }
}

/// Length of the result of combining operands of lengths `a` and `b`
pub(crate) fn broadcast_len(a: usize, b: usize, context: &Symbol) -> RSBMResult<usize> {
    if a == b || b == 1 {
        Ok(a)
    } else if a == 1 {
        Ok(b)
    } else {
        Err(RSBMError::ShapeMismatch {
            symbol: context.to_string(),
            expected: a,
            found: b,
        })
    }
}

/// Values available while evaluating an expression
///
/// Variables are bound by node, parameters by name.
#[derive(Debug, Clone, Default)]
pub struct Bindings<'a> {
    t: f64,
    y: Option<&'a DVector<f64>>,
    variables: HashMap<SymbolId, Value>,
    parameters: Option<&'a ParameterValues>,
}

impl<'a> Bindings<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at_time(mut self, t: f64) -> Self {
        self.t = t;
        self
    }

    /// Global state vector read by discretised variables
    pub fn with_state(mut self, y: &'a DVector<f64>) -> Self {
        self.y = Some(y);
        self
    }

    pub fn with_parameters(mut self, parameters: &'a ParameterValues) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Bind a variable (or any other leaf) to a value
    pub fn bind(mut self, symbol: &Symbol, value: Value) -> Self {
        self.variables.insert(symbol.id(), value);
        self
    }

    pub fn time(&self) -> f64 {
        self.t
    }

    pub(crate) fn state(&self) -> Option<&'a DVector<f64>> {
        self.y
    }

    pub(crate) fn lookup(&self, symbol: &Symbol) -> RSBMResult<Value> {
        if let Some(value) = self.variables.get(&symbol.id()) {
            return Ok(value.clone());
        }
        if let SymbolKind::Parameter { name } = symbol.kind() {
            if let Some(value) = self.parameters.and_then(|p| p.get(name)) {
                return Ok(Value::Scalar(value));
            }
        }
        Err(RSBMError::UnboundSymbol {
            name: symbol.name(),
        })
    }
}

impl Symbol {
    /// Evaluate the expression
    ///
    /// Shared subexpressions are evaluated once per call. Evaluation does not modify the
    /// expression, so it can be run repeatedly and from several threads.
    pub fn evaluate(&self, bindings: &Bindings) -> RSBMResult<Value> {
        let mut cache = HashMap::new();
        self.evaluate_cached(bindings, &mut cache)
    }

    pub(crate) fn evaluate_cached(
        &self,
        bindings: &Bindings,
        cache: &mut HashMap<SymbolId, Value>,
    ) -> RSBMResult<Value> {
        if let Some(value) = cache.get(&self.id()) {
            return Ok(value.clone());
        }
        let value = match self.kind() {
            SymbolKind::Scalar(x) => Value::Scalar(*x),
            SymbolKind::Vector(v) => Value::Vector(v.as_ref().clone()),
            SymbolKind::Time => Value::Scalar(bindings.time()),
            SymbolKind::Parameter { .. }
            | SymbolKind::Variable { .. }
            | SymbolKind::SpatialVariable { .. } => bindings.lookup(self)?,
            SymbolKind::StateVector { name, slice } => {
                let y = bindings.state().ok_or_else(|| RSBMError::UnboundSymbol {
                    name: format!("state vector (needed by '{}')", name),
                })?;
                if y.len() < slice.end {
                    return Err(RSBMError::ShapeMismatch {
                        symbol: name.clone(),
                        expected: slice.end,
                        found: y.len(),
                    });
                }
                Value::Vector(y.rows(slice.start, slice.len()).into_owned())
            }
            SymbolKind::Unary { op, child } => {
                child.evaluate_cached(bindings, cache)?.map(|x| op.apply(x))
            }
            SymbolKind::Binary { op, left, right } => {
                let a = left.evaluate_cached(bindings, cache)?;
                let b = right.evaluate_cached(bindings, cache)?;
                a.zip_with(&b, |x, y| op.apply(x, y), self)?
            }
            SymbolKind::NumericConcatenation(children) => {
                let mut values = vec![];
                for child in children {
                    values.extend(child.evaluate_cached(bindings, cache)?.into_vector().iter());
                }
                Value::Vector(DVector::from_vec(values))
            }
            SymbolKind::MatrixMultiplication { matrix, child } => {
                let value = child.evaluate_cached(bindings, cache)?;
                let operand = if matrix.ncols() == value.len() {
                    value.into_vector()
                } else if value.as_scalar().is_some() {
                    value.to_vector(matrix.ncols())
                } else {
                    return Err(RSBMError::ShapeMismatch {
                        symbol: self.to_string(),
                        expected: matrix.ncols(),
                        found: value.len(),
                    });
                };
                Value::Vector(matrix.as_ref() * operand)
            }
            SymbolKind::Gradient(_)
            | SymbolKind::Divergence(_)
            | SymbolKind::Integral(_)
            | SymbolKind::BoundaryValue { .. }
            | SymbolKind::Broadcast(_)
            | SymbolKind::DomainConcatenation(_) => {
                return Err(RSBMError::NotImplemented(format!(
                    "'{}' must be discretised before it can be evaluated",
                    self
                )))
            }
        };
        cache.insert(self.id(), value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Domain, DomainSet};
    use crate::errors::ErrorKind;
    use nalgebra::{dvector, DMatrix};

    #[test]
    fn scalar_arithmetic() {
        let a = Symbol::variable("a", DomainSet::empty());
        let b = Symbol::parameter("b");
        let params = ParameterValues::from([("b", 4.0)]);
        let expr = a.mul(&b).unwrap().sub(1.0).unwrap().exp();
        let bindings = Bindings::new()
            .bind(&a, Value::Scalar(0.25))
            .with_parameters(&params);
        assert_eq!(expr.evaluate(&bindings).unwrap(), Value::Scalar(1.0));
    }

    #[test]
    fn broadcasting_scalar_with_vector() {
        let c = Symbol::variable("c", Domain::Separator);
        let expr = c.mul(2.0).unwrap().add(&Symbol::time()).unwrap();
        let bindings = Bindings::new()
            .at_time(1.0)
            .bind(&c, Value::Vector(dvector![1.0, 2.0, 3.0]));
        assert_eq!(
            expr.evaluate(&bindings).unwrap(),
            Value::Vector(dvector![3.0, 5.0, 7.0])
        );
    }

    #[test]
    fn vector_length_mismatch() {
        let a = Symbol::vector(dvector![1.0, 2.0], Domain::Separator);
        let b = Symbol::vector(dvector![1.0, 2.0, 3.0], Domain::Separator);
        let err = a.add(&b).unwrap().evaluate(&Bindings::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Model);
    }

    #[test]
    fn state_vector_and_matrix() {
        let y = dvector![1.0, 2.0, 3.0, 4.0];
        let u = Symbol::state_vector("u", 1..3, Domain::Separator, None);
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 0.0, 2.0]);
        let expr = Symbol::matrix_multiplication(m, &u, Domain::Separator);
        let value = expr.evaluate(&Bindings::new().with_state(&y)).unwrap();
        assert_eq!(value, Value::Vector(dvector![5.0, 6.0]));

        let stacked =
            Symbol::numeric_concatenation(vec![u.clone(), Symbol::scalar(9.0)], DomainSet::empty());
        let value = stacked.evaluate(&Bindings::new().with_state(&y)).unwrap();
        assert_eq!(value, Value::Vector(dvector![2.0, 3.0, 9.0]));
    }

    #[test]
    fn unbound_variable_is_named() {
        let c = Symbol::variable("Electrolyte concentration", DomainSet::empty());
        let err = c.evaluate(&Bindings::new()).unwrap_err();
        assert!(err.to_string().contains("Electrolyte concentration"));
    }

    #[test]
    fn continuous_operators_need_discretisation() {
        let c = Symbol::variable("c", Domain::Separator);
        let err = c
            .gradient()
            .unwrap()
            .evaluate(&Bindings::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotImplemented);
    }
}
