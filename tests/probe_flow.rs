mod common;

use common::{FakeQueryService, catalog};
use ei_coverage::{
    CoverageError, CoverageIndex, ExportRecord, LayerProjection, ProbeObserver, ProbeResult,
    RunConfig, Session, export_to_dir,
};

#[derive(Default)]
struct Log {
    events: Vec<String>,
    points: usize,
}

impl ProbeObserver for Log {
    fn probe_started(&mut self, position: usize, layer: &LayerProjection) {
        self.events.push(format!("start {} {}", position, layer.id));
    }

    fn probe_finished(&mut self, result: &ProbeResult) {
        self.points += result.observations.len();
        self.events
            .push(format!("done {} {}", result.position, result.has_data));
    }
}

fn session(batch_size: usize) -> Session {
    let config = RunConfig {
        batch_size,
        ..Default::default()
    };
    Session::from_catalog(catalog(), config).unwrap()
}

#[test]
fn fixture_catalog_buckets() {
    let index = CoverageIndex::build(&catalog()).unwrap();
    let labels: Vec<_> = index.labels().collect();
    assert_eq!(
        labels,
        ["Global", "Indonesia", "Global provisioning on-demand"]
    );

    let global: Vec<_> = index
        .layers("Global")
        .unwrap()
        .iter()
        .map(|l| l.id.as_str())
        .collect();
    assert_eq!(global, ["49464", "49423", "92"]);
}

#[test]
fn second_layer_with_one_point() {
    let s = session(2);
    let service = FakeQueryService::with_points(&[("49423", 1)]);
    let mut log = Log::default();

    let record = s.probe_batch(&service, 1, &mut log).unwrap();

    assert_eq!(
        record,
        ExportRecord {
            batch_number: 1,
            observed: 2,
            available: 1,
            layer_ids: vec!["49423".to_string()],
        }
    );
    assert_eq!(
        log.events,
        ["start 1 49464", "done 1 false", "start 2 49423", "done 2 true"]
    );
    assert_eq!(log.points, 1);
}

#[test]
fn last_batch_is_short_and_probes_in_order() {
    let s = session(2);
    let service = FakeQueryService::with_points(&[("92", 3)]);
    let mut log = Log::default();

    let record = s.probe_batch(&service, 2, &mut log).unwrap();

    assert_eq!(service.submitted_ids(), ["92"]);
    assert_eq!(record.observed, 1);
    assert_eq!(record.layer_ids, ["92"]);
    assert_eq!(log.points, 3);
}

#[test]
fn every_query_uses_the_run_settings() {
    let s = session(3);
    let service = FakeQueryService::default();

    s.probe_batch(&service, 1, &mut ()).unwrap();

    let submitted = service.submitted.borrow();
    assert_eq!(submitted.len(), 3);
    for q in submitted.iter() {
        assert_eq!(q.name, "Test - Indonesia");
        assert_eq!(q.spatial.kind, "point");
        assert_eq!(q.spatial.coordinates, [-6.2087634, 106.845599]);
        assert_eq!(q.temporal.intervals.len(), 1);
        assert_eq!(q.layers.len(), 1);
    }
}

#[test]
fn failure_aborts_remaining_probes() {
    let s = session(3);
    let service = FakeQueryService::with_points(&[("49464", 1)]).failing_on("49423");
    let mut log = Log::default();

    let err = s.probe_batch(&service, 1, &mut log).unwrap_err();

    assert!(matches!(err, CoverageError::QueryServiceFailure(_)));
    assert_eq!(service.submitted_ids(), ["49464", "49423"]);
    assert_eq!(log.events, ["start 1 49464", "done 1 true", "start 2 49423"]);
}

#[test]
fn batch_outside_the_plan() {
    let s = session(2);
    let err = s
        .probe_batch(&FakeQueryService::default(), 3, &mut ())
        .unwrap_err();
    assert!(matches!(
        err,
        CoverageError::InvalidBatchNumber { index: 3, count: 2 }
    ));
}

#[test]
fn probe_then_export() {
    let dir = tempfile::tempdir().unwrap();
    let s = session(3);
    let service = FakeQueryService::with_points(&[("49464", 2), ("92", 1)]);

    let record = s.probe_batch(&service, 1, &mut ()).unwrap();
    let path = export_to_dir(&record, &dir.path().join("export")).unwrap();

    assert!(path.ends_with("export/batch_1.json"));
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["batch number"], 1);
    assert_eq!(json["total observed data layers"], 3);
    assert_eq!(json["available data layers (value)"], 2);
    assert_eq!(json["id data layers"], serde_json::json!(["49464", "92"]));
}
