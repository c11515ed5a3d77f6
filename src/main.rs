use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use ei_coverage::{
    Client, Coordinate, DataLayer, Overrides, ProbeSettings, QueryService, RunConfig, Session,
    TimeWindow, checked_size, export_to_dir, load_catalog_file, load_config,
};

mod cli;
mod console;
mod interactive;

use cli::{Cli, Commands, OutputArgs, ProbeArgs};
use console::ConsoleObserver;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("ei_coverage=info"),
        _ => EnvFilter::new("ei_coverage=debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Layers { json } => {
            let layers = fetch_catalog(&cli, None)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&layers)?);
            } else {
                console::print_layers(&layers);
            }
        }
        Commands::Coverage => {
            let session = Session::from_catalog(fetch_catalog(&cli, None)?, run_config(&cli))?;
            console::print_coverage(session.index());
        }
        Commands::Plan { batch_size } => {
            let batch_size = checked_size(*batch_size)?;
            let config = RunConfig {
                batch_size,
                ..run_config(&cli)
            };
            let session = Session::from_catalog(fetch_catalog(&cli, None)?, config)?;
            let plan = session.plan()?;
            console::print_plan(&cli.label, session.layers()?.len(), batch_size, &plan);
        }
        Commands::Probe {
            batch_size,
            batch,
            probe,
            output,
        } => {
            let batch_size = checked_size(*batch_size)?;
            let config = RunConfig {
                batch_size,
                probe: probe_settings(probe)?,
                export_dir: output.out_dir.clone(),
                ..run_config(&cli)
            };
            let client = connect(&cli)?;
            let session = Session::from_catalog(fetch_catalog(&cli, Some(&client))?, config)?;
            probe_and_export(&session, &client, *batch, output)?;
        }
        Commands::Interactive { probe, output } => {
            let config = RunConfig {
                probe: probe_settings(probe)?,
                export_dir: output.out_dir.clone(),
                ..run_config(&cli)
            };
            let client = connect(&cli)?;
            let session = Session::from_catalog(fetch_catalog(&cli, Some(&client))?, config)?;
            interactive::run(session, &client, output)?;
        }
    }
    Ok(())
}

fn run_config(cli: &Cli) -> RunConfig {
    RunConfig {
        coverage_label: cli.label.clone(),
        ..Default::default()
    }
}

fn probe_settings(args: &ProbeArgs) -> Result<ProbeSettings> {
    let coordinate: Coordinate = args.at.parse()?;
    let window = TimeWindow::parse(&args.start, &args.end)?;
    Ok(ProbeSettings {
        query_name: args.query_name.clone(),
        layer_type: args.layer_type.clone(),
        coordinate,
        window,
    })
}

fn connect(cli: &Cli) -> Result<Client> {
    let cfg = load_config(Overrides {
        org_id: cli.org_id.clone(),
        tenant_id: cli.tenant_id.clone(),
        api_key: cli.api_key.clone(),
        secrets: cli.secrets.clone(),
        ..Default::default()
    })?;
    Ok(Client::connect(&cfg, Duration::from_secs(cli.timeout))?)
}

fn fetch_catalog(cli: &Cli, client: Option<&Client>) -> Result<Vec<DataLayer>> {
    if let Some(path) = &cli.catalog_file {
        return Ok(load_catalog_file(path)?);
    }
    match client {
        Some(client) => Ok(client.data_layers()?),
        None => Ok(connect(cli)?.data_layers()?),
    }
}

pub(crate) fn probe_and_export<Q: QueryService + ?Sized>(
    session: &Session,
    service: &Q,
    batch_number: usize,
    output: &OutputArgs,
) -> Result<()> {
    let batch = session.batch(batch_number)?;
    println!(
        "Probing batch {} of `{}`: data layers {}",
        batch.index,
        session.config().coverage_label,
        batch.describe()
    );

    let mut observer = ConsoleObserver::new(&batch);
    let outcome = session.probe_batch(service, batch_number, &mut observer);
    observer.finish();
    let record = outcome?;

    println!(
        "{} of {} data layer(s) returned data",
        record.available, record.observed
    );

    if output.stdout {
        console::print_record(&record).context("failed to write summary to stdout")?;
    } else {
        let path = export_to_dir(&record, &session.config().export_dir)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}
