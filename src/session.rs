//! One run of the tool: a catalog snapshot indexed once, a fixed run
//! configuration, and the batches derived from both.

use crate::catalog::{DataLayer, LayerProjection};
use crate::config::RunConfig;
use crate::error::{CoverageError, Result};
use crate::export::ExportRecord;
use crate::index::CoverageIndex;
use crate::plan::{self, Batch};
use crate::probe::{self, ProbeObserver};
use crate::service::{CatalogService, QueryService};

#[derive(Debug, Clone)]
pub struct Session {
    catalog: Vec<DataLayer>,
    index: CoverageIndex,
    config: RunConfig,
}

impl Session {
    /// Fetches the catalog once and indexes it.
    pub fn open<C: CatalogService + ?Sized>(catalog: &C, config: RunConfig) -> Result<Self> {
        let layers = catalog.data_layers()?;
        Self::from_catalog(layers, config)
    }

    pub fn from_catalog(catalog: Vec<DataLayer>, config: RunConfig) -> Result<Self> {
        let index = CoverageIndex::build(&catalog)?;
        Ok(Self {
            catalog,
            index,
            config,
        })
    }

    pub fn catalog(&self) -> &[DataLayer] {
        &self.catalog
    }

    pub fn index(&self) -> &CoverageIndex {
        &self.index
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// The same session with another batch size; the index is kept.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Layers carrying the configured coverage label.
    pub fn layers(&self) -> Result<&[LayerProjection]> {
        self.index
            .layers(&self.config.coverage_label)
            .ok_or_else(|| CoverageError::UnknownCoverageLabel(self.config.coverage_label.clone()))
    }

    pub fn plan(&self) -> Result<Vec<Batch>> {
        plan::plan(self.layers()?.len(), self.config.batch_size)
    }

    pub fn batch(&self, batch_number: usize) -> Result<Batch> {
        plan::range_for(batch_number, self.layers()?.len(), self.config.batch_size)
    }

    /// Probes batch `batch_number` of the configured label.
    pub fn probe_batch<Q, O>(
        &self,
        service: &Q,
        batch_number: usize,
        observer: &mut O,
    ) -> Result<ExportRecord>
    where
        Q: QueryService + ?Sized,
        O: ProbeObserver + ?Sized,
    {
        let layers = self.layers()?;
        let batch = self.batch(batch_number)?;
        probe::run(service, layers, batch, &self.config.probe, observer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_catalog;
    use serde_json::json;

    fn catalog() -> Vec<DataLayer> {
        parse_catalog(json!([
            { "id": "1", "name": "a", "spatial_coverage": { "country": ["Global"] } },
            { "id": "2", "name": "b", "spatial_coverage": { "country": ["Global"] } },
            { "id": "3", "name": "c", "spatial_coverage": { "country": ["Indonesia"] } },
            { "id": "4", "name": "d", "spatial_coverage": { "country": ["Global"] } }
        ]))
        .unwrap()
    }

    #[test]
    fn plans_the_configured_label() {
        let config = RunConfig {
            batch_size: 2,
            ..Default::default()
        };
        let session = Session::open(&catalog(), config).unwrap();

        assert_eq!(session.layers().unwrap().len(), 3);
        let plan = session.plan().unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(session.batch(2).unwrap(), plan[1]);
        assert_eq!((plan[1].start, plan[1].end), (3, 3));
    }

    #[test]
    fn batch_size_change_replans() {
        let session = Session::from_catalog(catalog(), RunConfig::default()).unwrap();
        assert_eq!(session.plan().unwrap().len(), 3);
        let session = session.with_batch_size(3);
        assert_eq!(session.plan().unwrap().len(), 1);
    }

    #[test]
    fn unknown_label() {
        let config = RunConfig {
            coverage_label: "Atlantis".into(),
            ..Default::default()
        };
        let session = Session::from_catalog(catalog(), config).unwrap();
        assert!(matches!(
            session.plan(),
            Err(CoverageError::UnknownCoverageLabel(l)) if l == "Atlantis"
        ));
    }

    #[test]
    fn zero_batch_size() {
        let session = Session::from_catalog(catalog(), RunConfig::default()).unwrap();
        let session = session.with_batch_size(0);
        assert!(matches!(session.plan(), Err(CoverageError::InvalidBatchSize(0))));
    }
}
