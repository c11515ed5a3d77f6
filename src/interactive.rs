//! Prompt-driven flow: pick a batch size, pick a batch, confirm, probe.

use anyhow::{Result, bail};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};

use ei_coverage::{QueryService, Session, checked_size};

use crate::cli::OutputArgs;
use crate::console::{self, ConsoleObserver};

pub fn run<Q: QueryService>(session: Session, service: &Q, output: &OutputArgs) -> Result<()> {
    let theme = ColorfulTheme::default();
    let label = session.config().coverage_label.clone();
    let total = session.layers()?.len();
    println!("Total {} data layers available: {}", label, total);
    if total == 0 {
        bail!("no data layers carry the `{}` coverage label", label);
    }

    let batch_size = loop {
        let raw: i64 = Input::with_theme(&theme)
            .with_prompt("Batch size")
            .default(1)
            .interact_text()?;
        match checked_size(raw) {
            Ok(size) => break size,
            Err(e) => eprintln!("{}", e),
        }
    };

    let session = session.with_batch_size(batch_size);
    let plan = session.plan()?;
    console::print_plan(&label, total, batch_size, &plan);

    let items: Vec<String> = plan
        .iter()
        .map(|b| format!("Batch {}: data layers {}", b.index, b.describe()))
        .collect();
    let selected = Select::with_theme(&theme)
        .with_prompt("Batch number")
        .items(&items)
        .default(0)
        .interact()?;
    let batch = plan[selected];

    let execute = Confirm::with_theme(&theme)
        .with_prompt(format!("Probe batch {} ({} layers)?", batch.index, batch.len()))
        .default(true)
        .interact()?;
    if !execute {
        println!("Batch {} not executed.", batch.index);
        return Ok(());
    }

    crate::probe_and_export(&session, service, batch.index, output)
}
