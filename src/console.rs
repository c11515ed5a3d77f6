//! Plain-text rendering for the command-line shell.

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use ei_coverage::{
    Batch, CoverageIndex, DataLayer, ExportRecord, LayerProjection, ProbeObserver, ProbeResult,
    TIME_FORMAT,
};

pub fn print_layers(layers: &[DataLayer]) {
    println!(
        "{:<8} {:<48} {:>9} {:>9} {:>10} {:>10}  COVERAGE",
        "ID", "NAME", "LAT_MIN", "LAT_MAX", "LON_MIN", "LON_MAX"
    );
    for l in layers {
        let coverage = l
            .spatial_coverage
            .as_ref()
            .and_then(|c| c.country.as_ref())
            .map(|c| c.join(", "))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<8} {:<48} {:>9} {:>9} {:>10} {:>10}  {}",
            l.id,
            truncate(&l.name, 48),
            bound(l.latitude_min),
            bound(l.latitude_max),
            bound(l.longitude_min),
            bound(l.longitude_max),
            coverage
        );
    }
    println!("{} data layer(s)", layers.len());
}

pub fn print_coverage(index: &CoverageIndex) {
    println!("{:<40} {:>6}", "COVERAGE", "LAYERS");
    for (label, layers) in index.iter() {
        println!("{:<40} {:>6}", label, layers.len());
    }
}

pub fn print_plan(label: &str, total: usize, batch_size: usize, plan: &[Batch]) {
    println!("Total {} data layers available: {}", label, total);
    println!("Batch size: {}", batch_size);
    println!("Number of batches: {}", plan.len());
    if plan.is_empty() {
        return;
    }
    println!();
    println!("{:>12}  DATA LAYERS", "BATCH NUMBER");
    for b in plan {
        println!("{:>12}  {}", b.index, b.describe());
    }
}

pub fn print_record(record: &ExportRecord) -> std::io::Result<()> {
    ei_coverage::write_record(record, std::io::stdout().lock())
}

/// Shows a progress bar over the batch and prints each layer's outcome as
/// soon as it is known.
pub struct ConsoleObserver {
    bar: ProgressBar,
}

impl ConsoleObserver {
    pub fn new(batch: &Batch) -> Self {
        let bar = ProgressBar::new(batch.len() as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.green} [{pos}/{len}] {wide_bar} {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProbeObserver for ConsoleObserver {
    fn probe_started(&mut self, position: usize, layer: &LayerProjection) {
        self.bar.set_message(format!("#{} {}", position, layer.id));
        self.bar
            .suspend(|| println!("[{}] {} ({})", position, layer.name, layer.id));
    }

    fn probe_finished(&mut self, result: &ProbeResult) {
        self.bar.suspend(|| {
            if result.has_data {
                print_points(result);
            } else {
                println!("    no data found");
            }
        });
        self.bar.inc(1);
    }
}

fn print_points(result: &ProbeResult) {
    println!(
        "    {:<10} {:>15} {:<20} {:>12} {:>12}  VALUE",
        "LAYER", "TIMESTAMP", "DATETIME", "LATITUDE", "LONGITUDE"
    );
    for p in &result.observations {
        println!(
            "    {:<10} {:>15} {:<20} {:>12} {:>12}  {}",
            p.layer_id.as_deref().unwrap_or("-"),
            p.timestamp.map(|t| t.to_string()).unwrap_or_else(|| "-".into()),
            p.datetime
                .map(|d| d.format(TIME_FORMAT).to_string())
                .unwrap_or_else(|| "NaT".into()),
            bound(p.latitude),
            bound(p.longitude),
            value_text(&p.value)
        );
    }
}

fn value_text(v: &Value) -> String {
    match v {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn bound(v: Option<f64>) -> String {
    v.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "-".into())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truncates_long_names() {
        assert_eq!(truncate("short", 10), "short");
        let t = truncate("a very long data layer name", 10);
        assert_eq!(t.chars().count(), 10);
        assert!(t.ends_with('…'));
    }

    #[test]
    fn renders_values() {
        assert_eq!(value_text(&json!("301.2")), "301.2");
        assert_eq!(value_text(&json!(3.5)), "3.5");
        assert_eq!(value_text(&Value::Null), "-");
        assert_eq!(bound(None), "-");
        assert_eq!(bound(Some(-6.2087634)), "-6.2088");
    }
}
