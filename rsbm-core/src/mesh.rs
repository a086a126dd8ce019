//! One-dimensional meshes
//!
//! A [`Mesh`] holds one [`SubMesh`] per domain. Each submesh is an ordered sequence of cell
//! edges, with the nodes at the cell centres. Expressions spanning several adjacent domains
//! are discretised on the combination of their submeshes.
//!
//! ```rust
//! use rsbm_core::domain::{Domain, DomainSet};
//! use rsbm_core::mesh::{Geometry, Mesh};
//! use std::collections::BTreeMap;
//!
//! let geometry = Geometry::new()
//!     .with_interval(Domain::NegativeElectrode, 0.0, 0.4)
//!     .with_interval(Domain::Separator, 0.4, 0.6)
//!     .with_interval(Domain::PositiveElectrode, 0.6, 1.0);
//! let points = BTreeMap::from([
//!     (Domain::NegativeElectrode, 4),
//!     (Domain::Separator, 2),
//!     (Domain::PositiveElectrode, 4),
//! ]);
//! let mesh = Mesh::new(&geometry, &points).unwrap();
//! let cell = mesh.combine(&DomainSet::whole_cell()).unwrap();
//! assert_eq!(cell.npts(), 10);
//! ```

use crate::domain::{CoordinateSystem, Domain, DomainSet};
use crate::errors::{RSBMError, RSBMResult};
use ndarray::{s, Array1};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Extent of a domain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Extent {
    /// The interval `[min, max]`
    Interval { min: f64, max: f64 },
    /// A lumped, zero-dimensional domain
    Point,
}

/// Extent of every domain in a model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry(BTreeMap<Domain, Extent>);

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(mut self, domain: Domain, min: f64, max: f64) -> Self {
        self.0.insert(domain, Extent::Interval { min, max });
        self
    }

    pub fn with_point(mut self, domain: Domain) -> Self {
        self.0.insert(domain, Extent::Point);
        self
    }

    pub fn get(&self, domain: Domain) -> Option<&Extent> {
        self.0.get(&domain)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Domain, &Extent)> {
        self.0.iter()
    }
}

/// Cells covering a single domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubMesh {
    pub edges: Array1<f64>,
    pub nodes: Array1<f64>,
    pub coord_sys: CoordinateSystem,
}

impl SubMesh {
    /// A submesh with the given edges and nodes at the cell centres
    ///
    /// Edges must be strictly increasing.
    pub fn from_edges(edges: Array1<f64>, coord_sys: CoordinateSystem) -> RSBMResult<Self> {
        if edges.len() < 2 {
            return Err(RSBMError::Model(
                "a submesh needs at least two edges".to_string(),
            ));
        }
        if edges.windows(2).into_iter().any(|w| w[1] <= w[0]) {
            return Err(RSBMError::Model(
                "submesh edges must be strictly increasing".to_string(),
            ));
        }
        let nodes = (&edges.slice(s![1..]) + &edges.slice(s![..-1])) / 2.0;
        Ok(Self {
            edges,
            nodes,
            coord_sys,
        })
    }

    /// `npts` equally sized cells covering `[min, max]`
    pub fn uniform(
        min: f64,
        max: f64,
        npts: usize,
        coord_sys: CoordinateSystem,
    ) -> RSBMResult<Self> {
        if npts == 0 {
            return Err(RSBMError::Model(
                "a submesh needs at least one point".to_string(),
            ));
        }
        Self::from_edges(Array1::linspace(min, max, npts + 1), coord_sys)
    }

    /// The single node of a lumped domain
    pub fn point() -> Self {
        Self {
            edges: Array1::zeros(2),
            nodes: Array1::zeros(1),
            coord_sys: CoordinateSystem::Cartesian,
        }
    }

    pub fn npts(&self) -> usize {
        self.nodes.len()
    }

    /// Distance between consecutive nodes
    pub fn d_nodes(&self) -> Array1<f64> {
        &self.nodes.slice(s![1..]) - &self.nodes.slice(s![..-1])
    }

    /// Width of each cell
    pub fn d_edges(&self) -> Array1<f64> {
        &self.edges.slice(s![1..]) - &self.edges.slice(s![..-1])
    }

    /// Whether this is the submesh of a lumped domain
    pub fn is_point(&self) -> bool {
        self.npts() == 1 && self.edges[0] == self.edges[1]
    }
}

/// The submeshes of every domain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    submeshes: BTreeMap<Domain, SubMesh>,
}

impl Mesh {
    /// Build uniform submeshes for every domain of `geometry`
    ///
    /// `points` gives the number of cells for every interval domain.
    pub fn new(geometry: &Geometry, points: &BTreeMap<Domain, usize>) -> RSBMResult<Self> {
        let mut submeshes = BTreeMap::new();
        for (domain, extent) in geometry.iter() {
            let submesh = match extent {
                Extent::Point => SubMesh::point(),
                Extent::Interval { min, max } => {
                    let npts = points.get(domain).ok_or_else(|| {
                        RSBMError::Model(format!("no number of points given for {}", domain))
                    })?;
                    SubMesh::uniform(*min, *max, *npts, domain.coordinate_system())?
                }
            };
            submeshes.insert(*domain, submesh);
        }
        Ok(Self { submeshes })
    }

    pub fn insert(&mut self, domain: Domain, submesh: SubMesh) {
        self.submeshes.insert(domain, submesh);
    }

    pub fn get(&self, domain: Domain) -> RSBMResult<&SubMesh> {
        self.submeshes
            .get(&domain)
            .ok_or(RSBMError::MeshMissingDomain { domain })
    }

    pub fn contains(&self, domain: Domain) -> bool {
        self.submeshes.contains_key(&domain)
    }

    /// Join the submeshes of adjacent domains
    ///
    /// Each submesh must start where the previous one ends, in the same coordinate system.
    pub fn combine(&self, domains: &DomainSet) -> RSBMResult<SubMesh> {
        let mut iter = domains.iter();
        let Some(first) = iter.next() else {
            return Ok(SubMesh::point());
        };
        let first = self.get(*first)?;
        if domains.len() == 1 {
            return Ok(first.clone());
        }
        let mut edges = first.edges.to_vec();
        let coord_sys = first.coord_sys;
        for domain in iter {
            let next = self.get(*domain)?;
            let end = edges[edges.len() - 1];
            let start = next.edges[0];
            if next.coord_sys != coord_sys {
                return Err(RSBMError::NonContiguousMesh {
                    domains: domains.clone(),
                    reason: format!("{} uses a different coordinate system", domain),
                });
            }
            if (end - start).abs() > 1e-12 * end.abs().max(1.0) {
                return Err(RSBMError::NonContiguousMesh {
                    domains: domains.clone(),
                    reason: format!(
                        "{} starts at {} but the previous domain ends at {}",
                        domain, start, end
                    ),
                });
            }
            edges.extend(next.edges.iter().skip(1));
        }
        SubMesh::from_edges(Array1::from_vec(edges), coord_sys)
    }

    /// Number of nodes on `domains`, or 1 for a domain-free expression
    pub fn npts(&self, domains: &DomainSet) -> RSBMResult<usize> {
        if domains.is_empty() {
            return Ok(1);
        }
        let mut total = 0;
        for domain in domains.iter() {
            total += self.get(*domain)?.npts();
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use approx::assert_relative_eq;

    #[test]
    fn uniform_nodes_are_cell_centres() {
        let submesh = SubMesh::uniform(0.0, 1.0, 4, CoordinateSystem::Cartesian).unwrap();
        assert_relative_eq!(
            submesh.nodes.as_slice().unwrap(),
            [0.125, 0.375, 0.625, 0.875].as_slice()
        );
        assert_relative_eq!(submesh.d_edges().sum(), 1.0);
        assert_eq!(submesh.d_nodes().len(), 3);
    }

    #[test]
    fn non_increasing_edges() {
        let err = SubMesh::from_edges(
            Array1::from_vec(vec![0.0, 0.5, 0.5]),
            CoordinateSystem::Cartesian,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Model);
    }

    #[test]
    fn missing_domain() {
        let mesh = Mesh::default();
        let err = mesh.get(Domain::Separator).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);
    }

    #[test]
    fn combine_requires_contiguous_submeshes() {
        let geometry = Geometry::new()
            .with_interval(Domain::NegativeElectrode, 0.0, 0.4)
            .with_interval(Domain::PositiveElectrode, 0.6, 1.0)
            .with_interval(Domain::NegativeParticle, 0.0, 1.0);
        let points = BTreeMap::from([
            (Domain::NegativeElectrode, 4),
            (Domain::PositiveElectrode, 4),
            (Domain::NegativeParticle, 4),
        ]);
        let mesh = Mesh::new(&geometry, &points).unwrap();
        let err = mesh
            .combine(&DomainSet::from([
                Domain::NegativeElectrode,
                Domain::PositiveElectrode,
            ]))
            .unwrap_err();
        assert!(matches!(err, RSBMError::NonContiguousMesh { .. }));

        // Different coordinate systems
        let err = mesh
            .combine(&DomainSet::from([
                Domain::NegativeElectrode,
                Domain::NegativeParticle,
            ]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);
    }

    #[test]
    fn point_domains() {
        let geometry = Geometry::new().with_point(Domain::CurrentCollector);
        let mesh = Mesh::new(&geometry, &BTreeMap::new()).unwrap();
        let submesh = mesh.get(Domain::CurrentCollector).unwrap();
        assert!(submesh.is_point());
        assert_eq!(mesh.npts(&Domain::CurrentCollector.into()).unwrap(), 1);
    }
}
