#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ei_coverage::{CoverageError, DataLayer, ProbeQuery, QueryResponse, QueryService, Result};
use serde_json::json;

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn catalog() -> Vec<DataLayer> {
    ei_coverage::load_catalog_file(&fixture("catalog.json")).expect("fixture catalog")
}

/// Answers point queries from a fixed table of layer id -> number of points;
/// unknown layers come back empty, listed layers in `failing` fail.
#[derive(Default)]
pub struct FakeQueryService {
    pub points: HashMap<String, usize>,
    pub failing: Vec<String>,
    pub submitted: RefCell<Vec<ProbeQuery>>,
}

impl FakeQueryService {
    pub fn with_points(points: &[(&str, usize)]) -> Self {
        Self {
            points: points.iter().map(|(id, n)| (id.to_string(), *n)).collect(),
            ..Default::default()
        }
    }

    pub fn failing_on(mut self, id: &str) -> Self {
        self.failing.push(id.to_string());
        self
    }

    pub fn submitted_ids(&self) -> Vec<String> {
        self.submitted
            .borrow()
            .iter()
            .filter_map(|q| q.layer_id().map(str::to_string))
            .collect()
    }
}

impl QueryService for FakeQueryService {
    fn submit(&self, query: &ProbeQuery) -> Result<QueryResponse> {
        self.submitted.borrow_mut().push(query.clone());
        let id = query.layer_id().unwrap_or_default().to_string();

        if self.failing.contains(&id) {
            return Err(CoverageError::QueryServiceFailure(format!(
                "HTTP 503 for layer {}",
                id
            )));
        }

        let n = self.points.get(&id).copied().unwrap_or(0);
        let data: Vec<serde_json::Value> = (0..n)
            .map(|i| {
                json!({
                    "layerId": id,
                    "timestamp": 1704067200000_i64 + i as i64 * 3_600_000,
                    "value": format!("{}", 300.0 + i as f64),
                })
            })
            .collect();

        QueryResponse::from_reply(json!({
            "submit_response": { "id": format!("q-{}", id), "data": data },
            "layers": [ { "id": id, "type": "raster" } ]
        }))
    }
}
