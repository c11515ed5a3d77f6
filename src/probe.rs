//! Sequential point probes over one batch of layers.

use chrono::NaiveDate;
use serde::Serialize;

use crate::catalog::LayerProjection;
use crate::error::{CoverageError, Result};
use crate::export::ExportRecord;
use crate::plan::Batch;
use crate::query::{Coordinate, PointObservation, ProbeQuery, TimeWindow};
use crate::service::QueryService;

pub const DEFAULT_QUERY_NAME: &str = "Test - Indonesia";
pub const DEFAULT_LAYER_TYPE: &str = "raster";
/// Jakarta, Indonesia.
pub const DEFAULT_COORDINATE: Coordinate = Coordinate {
    lat: -6.2087634,
    lon: 106.845599,
};

/// What every probe in a run asks for.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSettings {
    pub query_name: String,
    pub layer_type: String,
    pub coordinate: Coordinate,
    pub window: TimeWindow,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        let at = |y, m, d, h| {
            NaiveDate::from_ymd_opt(y, m, d)
                .and_then(|date| date.and_hms_opt(h, 0, 0))
                .unwrap_or_default()
        };
        Self {
            query_name: DEFAULT_QUERY_NAME.to_string(),
            layer_type: DEFAULT_LAYER_TYPE.to_string(),
            coordinate: DEFAULT_COORDINATE,
            window: TimeWindow {
                start: at(2023, 12, 31, 0),
                end: at(2024, 1, 1, 1),
            },
        }
    }
}

impl ProbeSettings {
    pub fn query_for(&self, layer_id: &str) -> ProbeQuery {
        ProbeQuery::point(
            &self.query_name,
            layer_id,
            &self.layer_type,
            self.coordinate,
            self.window,
        )
    }
}

/// Outcome of probing one layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    /// 1-based position in the probed layer list.
    pub position: usize,
    pub layer_id: String,
    pub layer_name: String,
    pub has_data: bool,
    pub observations: Vec<PointObservation>,
}

/// Receives per-layer progress while a batch runs.
pub trait ProbeObserver {
    fn probe_started(&mut self, _position: usize, _layer: &LayerProjection) {}

    fn probe_finished(&mut self, _result: &ProbeResult) {}
}

impl ProbeObserver for () {}

/// Probes every layer of `batch`, one at a time, and summarizes the batch.
///
/// The first query failure aborts the run; probes already finished have
/// been reported to `observer` but no record is returned.
pub fn run<Q, O>(
    service: &Q,
    layers: &[LayerProjection],
    batch: Batch,
    settings: &ProbeSettings,
    observer: &mut O,
) -> Result<ExportRecord>
where
    Q: QueryService + ?Sized,
    O: ProbeObserver + ?Sized,
{
    let slice = batch
        .slice(layers)
        .ok_or(CoverageError::BatchOutOfRange {
            index: batch.index,
            start: batch.start,
            end: batch.end,
            total: layers.len(),
        })?;

    tracing::info!(
        batch = batch.index,
        start = batch.start,
        end = batch.end,
        "probing batch"
    );

    let mut record = ExportRecord::new(batch.index, batch.len());

    for (position, layer) in batch.positions().zip(slice) {
        observer.probe_started(position, layer);

        let query = settings.query_for(&layer.id);
        let response = service.submit(&query)?;

        let result = if response.has_data() {
            let id = response.layer_id.clone().unwrap_or_else(|| layer.id.clone());
            record.mark_available(id);
            let observations = service.point_data(&response)?;
            ProbeResult {
                position,
                layer_id: layer.id.clone(),
                layer_name: layer.name.clone(),
                has_data: true,
                observations,
            }
        } else {
            ProbeResult {
                position,
                layer_id: layer.id.clone(),
                layer_name: layer.name.clone(),
                has_data: false,
                observations: Vec::new(),
            }
        };

        tracing::info!(
            position,
            layer = %layer.id,
            has_data = result.has_data,
            points = result.observations.len(),
            "probed layer"
        );
        observer.probe_finished(&result);
    }

    tracing::info!(
        batch = record.batch_number,
        observed = record.observed,
        available = record.available,
        "batch finished"
    );

    Ok(record)
}
