//! Grouping of catalog layers by coverage label.

use std::collections::HashMap;

use crate::catalog::{DataLayer, LayerProjection};
use crate::error::Result;

/// Coverage label -> layers tagged with it.
///
/// Labels keep first-seen order; layers within a label keep catalog order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageIndex {
    labels: Vec<String>,
    buckets: HashMap<String, Vec<LayerProjection>>,
}

impl CoverageIndex {
    /// Builds the index from a full catalog listing.
    ///
    /// Fails with `MalformedCatalog` if any layer lacks its coverage field.
    pub fn build(layers: &[DataLayer]) -> Result<Self> {
        let mut labels: Vec<String> = Vec::new();
        for layer in layers {
            for label in layer.coverage_labels()? {
                if !labels.contains(label) {
                    labels.push(label.clone());
                }
            }
        }

        let mut buckets: HashMap<String, Vec<LayerProjection>> = labels
            .iter()
            .map(|l| (l.clone(), Vec::new()))
            .collect();

        for layer in layers {
            let tagged = layer.coverage_labels()?;
            for label in &labels {
                if tagged.contains(label) {
                    if let Some(bucket) = buckets.get_mut(label) {
                        bucket.push(layer.projection());
                    }
                }
            }
        }

        tracing::debug!(
            layers = layers.len(),
            labels = labels.len(),
            "built coverage index"
        );

        Ok(Self { labels, buckets })
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn layers(&self, label: &str) -> Option<&[LayerProjection]> {
        self.buckets.get(label).map(Vec::as_slice)
    }

    /// `(label, layers)` pairs in first-seen label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[LayerProjection])> {
        self.labels.iter().map(move |l| {
            let layers = self.buckets.get(l).map(Vec::as_slice).unwrap_or(&[]);
            (l.as_str(), layers)
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_catalog;
    use crate::error::CoverageError;
    use serde_json::json;

    fn catalog() -> Vec<DataLayer> {
        parse_catalog(json!([
            { "id": "1", "name": "ERA5 temperature", "spatial_coverage": { "country": ["Global"] } },
            { "id": "2", "name": "Soil moisture", "spatial_coverage": { "country": ["Indonesia", "Global"] } },
            { "id": "3", "name": "Unlabelled", "spatial_coverage": { "country": [] } },
            { "id": "4", "name": "Landsat", "spatial_coverage": { "country": ["United States", "Indonesia", "Indonesia"] } }
        ]))
        .unwrap()
    }

    fn ids(layers: &[LayerProjection]) -> Vec<&str> {
        layers.iter().map(|l| l.id.as_str()).collect()
    }

    #[test]
    fn labels_in_first_seen_order() {
        let index = CoverageIndex::build(&catalog()).unwrap();
        let labels: Vec<_> = index.labels().collect();
        assert_eq!(labels, ["Global", "Indonesia", "United States"]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn layers_land_only_in_their_own_buckets() {
        let layers = catalog();
        let index = CoverageIndex::build(&layers).unwrap();

        assert_eq!(ids(index.layers("Global").unwrap()), ["1", "2"]);
        assert_eq!(ids(index.layers("Indonesia").unwrap()), ["2", "4"]);
        assert_eq!(ids(index.layers("United States").unwrap()), ["4"]);

        for layer in &layers {
            let tagged = layer.coverage_labels().unwrap();
            for (label, bucket) in index.iter() {
                let present = bucket.iter().any(|p| p.id == layer.id);
                assert_eq!(present, tagged.iter().any(|t| t == label), "{} / {}", layer.id, label);
            }
        }
    }

    #[test]
    fn no_empty_buckets() {
        let index = CoverageIndex::build(&catalog()).unwrap();
        assert!(index.iter().all(|(_, layers)| !layers.is_empty()));
        assert!(index.layers("").is_none());
    }

    #[test]
    fn rebuilding_is_idempotent() {
        let layers = catalog();
        let a = CoverageIndex::build(&layers).unwrap();
        let b = CoverageIndex::build(&layers).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.labels().collect::<Vec<_>>(), b.labels().collect::<Vec<_>>());
    }

    #[test]
    fn empty_catalog() {
        let index = CoverageIndex::build(&[]).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn missing_coverage_field_fails() {
        let layers = parse_catalog(json!([
            { "id": "1", "name": "ok", "spatial_coverage": { "country": ["Global"] } },
            { "id": "2", "name": "bad", "spatial_coverage": {} }
        ]))
        .unwrap();
        assert!(matches!(
            CoverageIndex::build(&layers),
            Err(CoverageError::MalformedCatalog(_))
        ));
    }
}
