use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::{CoverageError, Result};

/// A data layer as listed by the EI catalog.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DataLayer {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub latitude_min: Option<f64>,
    #[serde(default)]
    pub latitude_max: Option<f64>,
    #[serde(default)]
    pub longitude_min: Option<f64>,
    #[serde(default)]
    pub longitude_max: Option<f64>,
    #[serde(default)]
    pub spatial_coverage: Option<SpatialCoverage>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SpatialCoverage {
    #[serde(default)]
    pub country: Option<Vec<String>>,
}

/// Identity and bounding box of a layer, as kept in the coverage index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerProjection {
    pub id: String,
    pub name: String,
    pub latitude_max: Option<f64>,
    pub latitude_min: Option<f64>,
    pub longitude_max: Option<f64>,
    pub longitude_min: Option<f64>,
}

impl DataLayer {
    /// Coverage labels (`spatial_coverage.country`) this layer is tagged with.
    pub fn coverage_labels(&self) -> Result<&[String]> {
        self.spatial_coverage
            .as_ref()
            .and_then(|c| c.country.as_deref())
            .ok_or_else(|| {
                CoverageError::MalformedCatalog(format!(
                    "data layer {} has no spatial_coverage.country field",
                    self.id
                ))
            })
    }

    pub fn projection(&self) -> LayerProjection {
        LayerProjection {
            id: self.id.clone(),
            name: self.name.clone(),
            latitude_max: self.latitude_max,
            latitude_min: self.latitude_min,
            longitude_max: self.longitude_max,
            longitude_min: self.longitude_min,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogListing {
    Bare(Vec<DataLayer>),
    Wrapped { data_layers: Vec<DataLayer> },
}

/// Parses a catalog listing, either a bare array or `{"data_layers": [...]}`.
pub fn parse_catalog(value: Value) -> Result<Vec<DataLayer>> {
    match value {
        Value::Array(_) | Value::Object(_) => {}
        other => {
            return Err(CoverageError::MalformedCatalog(format!(
                "expected a list of data layers, got {}",
                json_kind(&other)
            )));
        }
    }

    match serde_json::from_value::<CatalogListing>(value) {
        Ok(CatalogListing::Bare(layers)) | Ok(CatalogListing::Wrapped { data_layers: layers }) => {
            Ok(layers)
        }
        Err(e) => Err(CoverageError::MalformedCatalog(e.to_string())),
    }
}

/// Loads a catalog snapshot previously saved as JSON.
pub fn load_catalog_file(path: &Path) -> Result<Vec<DataLayer>> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        CoverageError::MalformedCatalog(format!("failed to read {}: {}", path.display(), e))
    })?;
    let value: Value = serde_json::from_str(&text).map_err(|e| {
        CoverageError::MalformedCatalog(format!("{} is not valid JSON: {}", path.display(), e))
    })?;
    parse_catalog(value)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// Layer ids come back as strings from v3 and as integers from older catalogs.
fn de_id<'de, D>(d: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Num(i64),
    }

    Ok(match Id::deserialize(d)? {
        Id::Str(s) => s,
        Id::Num(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_wrapped_listing_with_numeric_ids() {
        let layers = parse_catalog(json!({
            "data_layers": [
                {
                    "id": 49464,
                    "name": "Temperature",
                    "latitude_min": -90.0,
                    "latitude_max": 90.0,
                    "longitude_min": -180.0,
                    "longitude_max": 180.0,
                    "spatial_coverage": { "country": ["Global"] }
                }
            ]
        }))
        .unwrap();

        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].id, "49464");
        assert_eq!(layers[0].coverage_labels().unwrap(), ["Global".to_string()]);
    }

    #[test]
    fn parses_bare_listing_with_missing_bbox() {
        let layers = parse_catalog(json!([
            { "id": "1", "name": "A", "spatial_coverage": { "country": [] } }
        ]))
        .unwrap();

        let p = layers[0].projection();
        assert_eq!(p.id, "1");
        assert_eq!(p.latitude_min, None);
        assert!(layers[0].coverage_labels().unwrap().is_empty());
    }

    #[test]
    fn missing_coverage_is_malformed() {
        let layers = parse_catalog(json!([{ "id": "7", "name": "B" }])).unwrap();
        let err = layers[0].coverage_labels().unwrap_err();
        assert!(matches!(err, CoverageError::MalformedCatalog(_)));
        assert!(err.to_string().contains("7"));
    }

    #[test]
    fn scalar_listing_is_malformed() {
        let err = parse_catalog(json!("nope")).unwrap_err();
        assert!(err.to_string().contains("a string"));
    }
}
