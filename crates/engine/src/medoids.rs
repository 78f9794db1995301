//! Medoid resolution - one representative item per cluster
//!
//! The medoid of a cluster is the member whose mean distance to all
//! other members is smallest. Unlike a centroid it is a real catalog
//! item, so its feature vector is copied verbatim, never averaged.
//!
//! ## Algorithm
//! 1. Group catalog positions by cluster label (once per call)
//! 2. Compute the full pairwise distance matrix once (rows in parallel)
//! 3. Clusters with 1 or 2 members take their first member
//! 4. Larger clusters take the member with minimum mean distance to the
//!    others; ties go to the earliest member in catalog order
//!
//! The matrix is O(n²) in catalog size. Resolve once and share the
//! resulting `MedoidSet`; it is immutable.

use crate::distance::distance;
use crate::error::{EngineError, Result};
use catalog::{CatalogItem, ClusterLabel, FeatureVector, SerialId};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, instrument};

/// Symmetric pairwise distances over a list of vectors, zero diagonal
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    size: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// Compute all pairwise distances.
    ///
    /// Each row computes only its upper-triangle entries; the lower
    /// triangle is mirrored afterwards.
    pub fn compute(vectors: &[&FeatureVector]) -> Result<Self> {
        let size = vectors.len();

        let upper: Vec<Vec<f64>> = (0..size)
            .into_par_iter()
            .map(|i| {
                (i + 1..size)
                    .map(|j| distance(vectors[i], vectors[j]))
                    .collect::<Result<Vec<f64>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let mut values = vec![0.0; size * size];
        for (i, row) in upper.into_iter().enumerate() {
            for (offset, d) in row.into_iter().enumerate() {
                let j = i + 1 + offset;
                values[i * size + j] = d;
                values[j * size + i] = d;
            }
        }

        Ok(Self { size, values })
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }
}

/// The representative of one cluster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Medoid {
    pub cluster_label: ClusterLabel,
    /// Catalog item the vector was copied from
    pub serial_id: SerialId,
    pub features: FeatureVector,
}

/// One medoid per cluster, indexed by cluster label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedoidSet {
    medoids: Vec<Medoid>,
}

impl MedoidSet {
    /// Number of clusters
    pub fn len(&self) -> usize {
        self.medoids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.medoids.is_empty()
    }

    pub fn get(&self, cluster: ClusterLabel) -> Option<&Medoid> {
        self.medoids.get(cluster)
    }

    /// Medoid vector of a cluster
    pub fn features(&self, cluster: ClusterLabel) -> Option<&FeatureVector> {
        self.get(cluster).map(|m| &m.features)
    }

    /// Medoids in cluster order
    pub fn iter(&self) -> impl Iterator<Item = &Medoid> {
        self.medoids.iter()
    }
}

/// Resolves the medoid of every cluster in a catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct MedoidResolver;

impl MedoidResolver {
    pub fn new() -> Self {
        Self
    }

    /// Compute one medoid per cluster label in `[0, num_clusters)`.
    ///
    /// # Errors
    /// - `ClusterOutOfRange` if an item's label is `>= num_clusters`
    /// - `EmptyCluster` if a label in range has no members
    /// - `LengthMismatch` if two catalog vectors differ in length
    #[instrument(skip(self, catalog), fields(items = catalog.len()))]
    pub fn resolve(&self, catalog: &[CatalogItem], num_clusters: usize) -> Result<MedoidSet> {
        let clusters = group_by_cluster(catalog, num_clusters)?;

        if let Some(cluster) = clusters.iter().position(|members| members.is_empty()) {
            return Err(EngineError::EmptyCluster { cluster });
        }

        let vectors: Vec<&FeatureVector> = catalog.iter().map(|item| &item.features).collect();
        let matrix = DistanceMatrix::compute(&vectors)?;
        debug!("Computed {}x{} distance matrix", matrix.len(), matrix.len());

        let medoids = clusters
            .iter()
            .enumerate()
            .map(|(cluster_label, members)| {
                let position = medoid_position(members, &matrix);
                let item = &catalog[position];
                debug!(
                    "Cluster {} ({} members): medoid is item {}",
                    cluster_label,
                    members.len(),
                    item.serial_id
                );
                Medoid {
                    cluster_label,
                    serial_id: item.serial_id,
                    features: item.features.clone(),
                }
            })
            .collect();

        Ok(MedoidSet { medoids })
    }
}

/// Catalog positions of each cluster's members, in catalog order
fn group_by_cluster(catalog: &[CatalogItem], num_clusters: usize) -> Result<Vec<Vec<usize>>> {
    let mut clusters = vec![Vec::new(); num_clusters];
    for (position, item) in catalog.iter().enumerate() {
        let members = clusters.get_mut(item.cluster_label).ok_or(
            EngineError::ClusterOutOfRange {
                serial_id: item.serial_id,
                cluster_label: item.cluster_label,
                num_clusters,
            },
        )?;
        members.push(position);
    }
    Ok(clusters)
}

/// Mean distance from `member` to every other position in `members`
pub fn mean_distance(matrix: &DistanceMatrix, member: usize, members: &[usize]) -> f64 {
    let total: f64 = members
        .iter()
        .filter(|&&other| other != member)
        .map(|&other| matrix.get(member, other))
        .sum();
    total / (members.len() - 1) as f64
}

/// Pick the medoid among `members` (non-empty, catalog order).
///
/// Mean distance cannot discriminate with fewer than 3 points, so 1- and
/// 2-member clusters take their first member.
fn medoid_position(members: &[usize], matrix: &DistanceMatrix) -> usize {
    if members.len() <= 2 {
        return members[0];
    }

    let mut best = members[0];
    let mut best_mean = f64::INFINITY;
    for &candidate in members {
        let mean = mean_distance(matrix, candidate, members);
        // strict comparison keeps the first minimum
        if mean < best_mean {
            best_mean = mean;
            best = candidate;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(serial_id: SerialId, cluster_label: ClusterLabel, bits: &str) -> CatalogItem {
        CatalogItem {
            serial_id,
            cluster_label,
            features: bits.parse().unwrap(),
        }
    }

    #[test]
    fn test_distance_matrix_symmetric() {
        let a: FeatureVector = "1100".parse().unwrap();
        let b: FeatureVector = "1010".parse().unwrap();
        let c: FeatureVector = "0001".parse().unwrap();
        let matrix = DistanceMatrix::compute(&[&a, &b, &c]).unwrap();

        assert_eq!(matrix.len(), 3);
        for i in 0..3 {
            assert_eq!(matrix.get(i, i), 0.0);
            for j in 0..3 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
            }
        }
        assert_eq!(matrix.get(0, 1), 0.5);
        assert_eq!(matrix.get(0, 2), 0.75);
    }

    #[test]
    fn test_medoid_is_most_central_member() {
        // Item 2 is one bit away from both neighbours; 1 and 3 are two apart
        let catalog = vec![
            item(1, 0, "110000"),
            item(2, 0, "111000"),
            item(3, 0, "011000"),
            item(4, 1, "000111"),
        ];

        let medoids = MedoidResolver.resolve(&catalog, 2).unwrap();
        assert_eq!(medoids.len(), 2);
        assert_eq!(medoids.get(0).unwrap().serial_id, 2);
        assert_eq!(medoids.features(0).unwrap().to_string(), "111000");
        assert_eq!(medoids.get(1).unwrap().serial_id, 4);
    }

    #[test]
    fn test_small_clusters_take_first_member() {
        let catalog = vec![
            item(10, 0, "1111"),
            item(11, 1, "0000"),
            item(12, 0, "1110"),
        ];

        let medoids = MedoidResolver.resolve(&catalog, 2).unwrap();
        assert_eq!(medoids.get(0).unwrap().serial_id, 10);
        assert_eq!(medoids.get(1).unwrap().serial_id, 11);
    }

    #[test]
    fn test_tie_breaks_to_first_in_catalog_order() {
        // Every pair is equally far apart, so every mean ties
        let catalog = vec![
            item(7, 0, "100"),
            item(8, 0, "010"),
            item(9, 0, "001"),
        ];

        let medoids = MedoidResolver.resolve(&catalog, 1).unwrap();
        assert_eq!(medoids.get(0).unwrap().serial_id, 7);
    }

    #[test]
    fn test_empty_cluster() {
        let catalog = vec![item(1, 0, "10"), item(2, 2, "01")];
        let err = MedoidResolver.resolve(&catalog, 3).unwrap_err();
        assert_eq!(err, EngineError::EmptyCluster { cluster: 1 });
    }

    #[test]
    fn test_label_out_of_range() {
        let catalog = vec![item(1, 0, "10"), item(2, 5, "01")];
        let err = MedoidResolver.resolve(&catalog, 2).unwrap_err();
        assert!(matches!(
            err,
            EngineError::ClusterOutOfRange {
                serial_id: 2,
                cluster_label: 5,
                num_clusters: 2
            }
        ));
    }

    #[test]
    fn test_length_mismatch_propagates() {
        let catalog = vec![item(1, 0, "10"), item(2, 1, "011")];
        let err = MedoidResolver.resolve(&catalog, 2).unwrap_err();
        assert_eq!(err, EngineError::LengthMismatch { left: 2, right: 3 });
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let catalog = vec![
            item(1, 0, "110010"),
            item(2, 0, "111000"),
            item(3, 0, "011001"),
            item(4, 1, "000111"),
            item(5, 1, "001011"),
            item(6, 1, "100111"),
        ];

        let first = MedoidResolver.resolve(&catalog, 2).unwrap();
        let second = MedoidResolver.resolve(&catalog, 2).unwrap();
        assert_eq!(first, second);
    }
}
