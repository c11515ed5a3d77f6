//! Seams between the coverage logic and the remote EI services.

use crate::catalog::DataLayer;
use crate::error::Result;
use crate::query::{PointObservation, ProbeQuery, QueryResponse};

/// Lists the data layers available to the tenant.
pub trait CatalogService {
    fn data_layers(&self) -> Result<Vec<DataLayer>>;
}

/// Submits point queries.
pub trait QueryService {
    fn submit(&self, query: &ProbeQuery) -> Result<QueryResponse>;

    /// Point observations of a reply as a table.
    fn point_data(&self, response: &QueryResponse) -> Result<Vec<PointObservation>> {
        Ok(response.point_table())
    }
}

/// A catalog already in memory, e.g. loaded from a snapshot file.
impl CatalogService for Vec<DataLayer> {
    fn data_layers(&self) -> Result<Vec<DataLayer>> {
        Ok(self.clone())
    }
}

impl<T: CatalogService + ?Sized> CatalogService for &T {
    fn data_layers(&self) -> Result<Vec<DataLayer>> {
        (**self).data_layers()
    }
}

impl<T: QueryService + ?Sized> QueryService for &T {
    fn submit(&self, query: &ProbeQuery) -> Result<QueryResponse> {
        (**self).submit(query)
    }

    fn point_data(&self, response: &QueryResponse) -> Result<Vec<PointObservation>> {
        (**self).point_data(response)
    }
}
