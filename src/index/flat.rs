use serde::{Deserialize, Serialize};

use crate::error::{upstream_error, Error};

/// Exhaustive inner-product index over row-major vectors of one dimension.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: vec![],
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn add(&mut self, vector: Vec<f32>) -> Result<(), Error> {
        if vector.len() != self.dimension {
            return Err(upstream_error(format!(
                "embedding has {} dimensions, index expects {}",
                vector.len(),
                self.dimension
            )));
        }

        self.vectors.push(vector);
        Ok(())
    }

    /// The `k` rows with the largest inner product against `query`, best first.
    /// Equal scores keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, Error> {
        if query.len() != self.dimension {
            return Err(upstream_error(format!(
                "query embedding has {} dimensions, index expects {}",
                query.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .map(|v| dot(v, query))
            .enumerate()
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k.min(self.len()));

        Ok(scored)
    }
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Scales `vector` to unit length in place.
pub fn normalize(vector: &mut [f32]) -> Result<(), Error> {
    let norm = dot(vector, vector).sqrt();

    if !norm.is_finite() || norm == 0.0 {
        return Err(upstream_error("embedding provider returned a zero-length vector"));
    }

    vector.iter_mut().for_each(|x| *x /= norm);
    Ok(())
}

#[test]
fn normalizes_to_unit_length() {
    let mut v = vec![3.0, 4.0];
    normalize(&mut v).unwrap();

    assert_eq!(v, vec![0.6, 0.8]);
    assert!((dot(&v, &v) - 1.0).abs() < 1e-6);
    assert!(normalize(&mut [0.0, 0.0]).is_err());
}

#[test]
fn searches_by_inner_product() {
    let mut index = FlatIndex::new(2);
    index.add(vec![1.0, 0.0]).unwrap();
    index.add(vec![0.0, 1.0]).unwrap();
    index.add(vec![0.6, 0.8]).unwrap();

    let hits = index.search(&[0.0, 1.0], 2).unwrap();
    assert_eq!(hits.iter().map(|h| h.0).collect::<Vec<_>>(), vec![1, 2]);
    assert!(hits.iter().all(|h| (-1.0..=1.0).contains(&h.1)));

    // k beyond the row count returns every row
    assert_eq!(index.search(&[1.0, 0.0], 10).unwrap().len(), 3);
}

#[test]
fn rejects_dimension_mismatch() {
    let mut index = FlatIndex::new(3);
    assert!(index.add(vec![1.0]).is_err());
    assert!(index.search(&[1.0, 0.0], 1).is_err());
}
