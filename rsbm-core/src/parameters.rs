//! Parameter values
//!
//! A [`ParameterValues`] table is a flat map from parameter name to value. It is used in two
//! ways: to replace [`Parameter`](crate::symbol::Parameter) leaves by literal constants before
//! discretisation, or as the parameter bindings of a discretised model.
//!
//! Tables can be loaded from TOML:
//!
//! ```rust
//! use rsbm_core::parameters::ParameterValues;
//!
//! let values = ParameterValues::from_toml_str(
//!     r#"
//!     "Current function [A]" = 0.68
//!     "Nominal cell capacity [A.h]" = 0.68
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(values.get("Current function [A]"), Some(0.68));
//! ```

use crate::errors::{RSBMError, RSBMResult};
use crate::model::Model;
use crate::symbol::{Symbol, SymbolId, SymbolKind};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterValues(BTreeMap<String, f64>);

impl ParameterValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(source: &str) -> RSBMResult<Self> {
        toml::from_str(source)
            .map_err(|e| RSBMError::Model(format!("invalid parameter values: {}", e)))
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        self.0.insert(name.into(), value)
    }

    /// Update existing values and add new ones
    pub fn update(&mut self, other: &ParameterValues) {
        for (name, value) in &other.0 {
            self.0.insert(name.clone(), *value);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }

    /// Replace every parameter in `symbol` by its value
    ///
    /// Parameters defined on a domain become a constant broadcast onto that domain.
    /// A parameter without a value is an error.
    pub fn process_symbol(&self, symbol: &Symbol) -> RSBMResult<Symbol> {
        self.process_cached(symbol, &mut HashMap::new())
    }

    /// Replace every parameter in the model by its value
    ///
    /// The variables keying the equations are kept, so the processed model can be
    /// discretised in place of the original.
    pub fn process_model(&self, model: &Model) -> RSBMResult<Model> {
        let mut cache = HashMap::new();
        let processed = model.map_expressions(&mut |s| self.process_cached(s, &mut cache))?;
        debug!(
            "Substituted {} parameter values into model '{}'",
            self.len(),
            model.name()
        );
        Ok(processed)
    }

    fn process_cached(
        &self,
        symbol: &Symbol,
        cache: &mut HashMap<SymbolId, Symbol>,
    ) -> RSBMResult<Symbol> {
        if let Some(done) = cache.get(&symbol.id()) {
            return Ok(done.clone());
        }
        let result = match symbol.kind() {
            SymbolKind::Parameter { name } => {
                let value = self.get(name).ok_or_else(|| {
                    RSBMError::Model(format!("no value given for parameter '{}'", name))
                })?;
                let constant = Symbol::from_parts(
                    SymbolKind::Scalar(value),
                    Default::default(),
                    symbol.family().cloned(),
                    None,
                );
                if symbol.domain().is_empty() {
                    constant
                } else {
                    constant.broadcast(symbol.domain().clone())?
                }
            }
            _ => {
                let children = symbol.children();
                if children.is_empty() {
                    symbol.clone()
                } else {
                    let mut processed = Vec::with_capacity(children.len());
                    for child in &children {
                        processed.push(self.process_cached(child, cache)?);
                    }
                    if processed.iter().zip(&children).all(|(a, b)| a == *b) {
                        symbol.clone()
                    } else {
                        symbol.with_children(processed)
                    }
                }
            }
        };
        cache.insert(symbol.id(), result.clone());
        Ok(result)
    }
}

impl<S: Into<String>, const N: usize> From<[(S, f64); N]> for ParameterValues {
    fn from(values: [(S, f64); N]) -> Self {
        Self(values.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ParameterValues {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;
    use crate::errors::ErrorKind;
    use crate::symbol::{Bindings, Parameter, Value};

    #[test]
    fn substitutes_values() {
        let a = Symbol::parameter("a");
        let b = Parameter::new("b").family("large").build();
        let expr = a.mul(&b).unwrap().add(&a).unwrap();
        let values = ParameterValues::from([("a", 2.0), ("b", 3.0)]);
        let processed = values.process_symbol(&expr).unwrap();
        assert_eq!(
            processed.evaluate(&Bindings::new()).unwrap(),
            Value::Scalar(8.0)
        );
        // The source expression is untouched
        assert!(expr.evaluate(&Bindings::new()).is_err());
        assert_eq!(processed.family(), expr.family());
    }

    #[test]
    fn domain_parameter_is_broadcast() {
        let p = Parameter::new("Electrode conductivity")
            .domain(Domain::NegativeElectrode)
            .build();
        let values = ParameterValues::from([("Electrode conductivity", 100.0)]);
        let processed = values.process_symbol(&p).unwrap();
        assert_eq!(processed.domain(), p.domain());
        assert!(matches!(processed.kind(), SymbolKind::Broadcast(_)));
    }

    #[test]
    fn missing_value() {
        let values = ParameterValues::new();
        let err = values
            .process_symbol(&Symbol::parameter("Faraday constant [C.mol-1]"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Model);
        assert!(err.to_string().contains("Faraday constant"));
    }

    #[test]
    fn serde_roundtrip() {
        let values = ParameterValues::from([("a", 1.5), ("b", -2.0)]);
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"{"a":1.5,"b":-2.0}"#);
        let back: ParameterValues = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }
}
