//! Coverage checker for the IBM Environmental Intelligence (EI) geospatial API.
//!
//! The flow mirrors how the tool is used by hand:
//! list the catalog, bucket layers by coverage label, split one bucket into
//! batches, then probe every layer of a chosen batch at a fixed point and
//! time window to see which layers actually return data.
//!
//! ## Quick start
//! - Put `api.org_id`, `api.tenant_id` and `api.api_key` in the `[EI]` section
//!   of `auth/secrets.ini` (or set `EI_ORG_ID`, `EI_TENANT_ID`, `EI_API_KEY`).
//! - Open a [`Session`] against a [`Client`] and probe a batch.
//!
//! ```no_run
//! use ei_coverage::{Client, RunConfig, Session, export_to_dir};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::from_env()?;
//!     let config = RunConfig { batch_size: 3, ..Default::default() };
//!     let session = Session::open(&client, config)?;
//!
//!     for batch in session.plan()? {
//!         println!("batch {}: {}", batch.index, batch.describe());
//!     }
//!
//!     let record = session.probe_batch(&client, 1, &mut ())?;
//!     export_to_dir(&record, &session.config().export_dir)?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

mod catalog;
mod client;
mod config;
mod error;
mod export;
mod index;
mod plan;
mod probe;
mod query;
mod service;
mod session;
mod util;

pub use catalog::{DataLayer, LayerProjection, SpatialCoverage, load_catalog_file, parse_catalog};
pub use client::Client;
pub use config::{
    ClientConfig, DEFAULT_API_URL, DEFAULT_AUTH_URL, DEFAULT_COVERAGE_LABEL, DEFAULT_EXPORT_DIR,
    Overrides, RunConfig, load_config,
};
pub use error::{CoverageError, Result};
pub use export::{ExportRecord, export, export_to_dir, write_record};
pub use index::CoverageIndex;
pub use plan::{Batch, batch_count, checked_size, plan, range_for};
pub use probe::{
    DEFAULT_COORDINATE, DEFAULT_LAYER_TYPE, DEFAULT_QUERY_NAME, ProbeObserver, ProbeResult,
    ProbeSettings, run as run_probes,
};
pub use query::{
    Coordinate, Interval, PointObservation, ProbeQuery, QueryLayer, QueryResponse, Spatial,
    TIME_FORMAT, Temporal, TimeWindow, millis_to_datetime,
};
pub use service::{CatalogService, QueryService};
pub use session::Session;
