use crate::errors::{RSBMError, RSBMResult};
use crate::mesh::Mesh;
use crate::model::{state_variables, EquationKind, Model};
use crate::symbol::{Symbol, SymbolId};
use log::debug;
use std::collections::HashMap;
use std::ops::Range;

/// The part of the state vector holding one variable
#[derive(Debug, Clone)]
pub struct StateSlice {
    pub variable: Symbol,
    pub range: Range<usize>,
    pub kind: EquationKind,
}

/// Assignment of every governed variable to a contiguous range of the state vector
///
/// Differential variables come first, then algebraic ones, each in the order their
/// equations were registered. The variables of a concatenated key are laid out in
/// domain order, so the key itself also occupies a contiguous range.
#[derive(Debug, Clone, Default)]
pub struct StateLayout {
    slices: Vec<StateSlice>,
    by_id: HashMap<SymbolId, usize>,
    len: usize,
}

impl StateLayout {
    pub(crate) fn new(model: &Model, mesh: &Mesh) -> RSBMResult<Self> {
        let mut layout = Self::default();
        let keyed = model
            .rhs()
            .iter()
            .map(|(key, _)| (key, EquationKind::Differential))
            .chain(
                model
                    .algebraic()
                    .iter()
                    .map(|(key, _)| (key, EquationKind::Algebraic)),
            );
        for (key, kind) in keyed {
            for variable in state_variables(key)? {
                let npts = mesh.npts(variable.domain())?;
                if let Some(expected) = variable.shape_hint() {
                    if expected != npts {
                        return Err(RSBMError::ShapeMismatch {
                            symbol: variable.name(),
                            expected,
                            found: npts,
                        });
                    }
                }
                let range = layout.len..layout.len + npts;
                debug!("'{}' occupies y[{}:{}]", variable.name(), range.start, range.end);
                layout.len = range.end;
                layout.by_id.insert(variable.id(), layout.slices.len());
                layout.slices.push(StateSlice {
                    variable,
                    range,
                    kind,
                });
            }
        }
        Ok(layout)
    }

    /// Total length of the state vector
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateSlice> {
        self.slices.iter()
    }

    pub fn get(&self, variable: &Symbol) -> Option<&StateSlice> {
        self.by_id.get(&variable.id()).map(|i| &self.slices[*i])
    }

    /// Range of an equation key, which may be a concatenation of variables
    pub fn range_of_key(&self, key: &Symbol) -> RSBMResult<Range<usize>> {
        let mut range: Option<Range<usize>> = None;
        for variable in state_variables(key)? {
            let slice = self.get(&variable).ok_or_else(|| {
                RSBMError::Model(format!("'{}' has no slice of the state vector", variable))
            })?;
            range = Some(match range {
                None => slice.range.clone(),
                Some(r) => r.start..slice.range.end,
            });
        }
        range.ok_or_else(|| RSBMError::Model(format!("'{}' governs no variables", key)))
    }

    /// Range of the first variable called `name`
    pub fn range_by_name(&self, name: &str) -> RSBMResult<Range<usize>> {
        self.slices
            .iter()
            .find(|s| s.variable.name() == name)
            .map(|s| s.range.clone())
            .ok_or_else(|| RSBMError::MissingVariable {
                name: name.to_string(),
            })
    }
}
