use clap::Parser;
use dcsim_rs::config::SimConfig;
use dcsim_rs::error::SimError;
use dcsim_rs::net::NetWorld;
use dcsim_rs::report::Summary;
use dcsim_rs::viz::VizLogger;
use dcsim_rs::workload::generate_flows;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "dcsim", about = "Packet-level datacenter network simulator")]
struct Args {
    /// 1 = run the simulation, 2 = only generate and print the flows
    experiment_type: u32,

    /// Path to the `key: value` experiment config
    config: PathBuf,

    /// Write per-flow results as a JSON array
    #[arg(long)]
    results_json: Option<PathBuf>,

    /// Write link/drop/timeout/finish trace events as a JSON array
    #[arg(long)]
    trace_json: Option<PathBuf>,
}

fn run(args: Args) -> Result<(), SimError> {
    if !matches!(args.experiment_type, 1 | 2) {
        return Err(SimError::UnsupportedExperiment(args.experiment_type));
    }
    let cfg = SimConfig::from_file(&args.config)?;
    let mut world = NetWorld::new(cfg);
    let flows = generate_flows(&world.net.cfg, &world.net.topo)?;

    if args.experiment_type == 2 {
        for f in &flows {
            println!("{}", f.line());
        }
        return Ok(());
    }

    if args.trace_json.is_some() {
        world.net.viz = Some(VizLogger::default());
        world.net.emit_viz_meta();
    }

    world.run(&flows);

    for r in &world.net.results {
        println!("{}", r.line());
    }
    for line in Summary::from_network(&world.net).lines() {
        println!("{line}");
    }

    if let Some(path) = args.results_json {
        let json = serde_json::to_string_pretty(&world.net.results)?;
        fs::write(&path, json)?;
        eprintln!("wrote flow results to {}", path.display());
    }
    if let Some(path) = args.trace_json {
        if let Some(v) = world.net.viz.take() {
            let json = serde_json::to_string_pretty(&v.events)?;
            fs::write(&path, json)?;
            eprintln!("wrote trace events to {}", path.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
