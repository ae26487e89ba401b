use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use coterie::{BootstrapReport, Orchestrator, OrchestratorConfig, TmuxGateway};

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("coterie: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("coterie=info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

fn load_config() -> anyhow::Result<OrchestratorConfig> {
    match std::env::var_os("COTERIE_CONFIG") {
        Some(path) => {
            let path = Path::new(&path);
            OrchestratorConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))
        }
        None => Ok(OrchestratorConfig::default()),
    }
}

async fn run() -> anyhow::Result<()> {
    let config = load_config()?;
    let orchestrator = Orchestrator::new(TmuxGateway::new(), config);

    // Per-pane bootstrap failures are logged inside run(); only substrate
    // or construction failures surface here as a non-zero exit.
    let report = orchestrator.run().await?;
    print_status(&orchestrator, &report).await;
    Ok(())
}

async fn print_status(orchestrator: &Orchestrator<TmuxGateway>, report: &BootstrapReport) {
    let config = orchestrator.config();

    println!();
    println!("Sessions running:");
    for name in orchestrator.live_sessions().await {
        println!("  tmux attach -t {name}");
    }

    println!();
    if report.all_succeeded() {
        println!("All {} roles bootstrapped.", report.bootstrapped.len());
    } else {
        for role in &report.failed {
            println!("Pane for {role} did not bootstrap; see the log above.");
        }
        println!(
            "{} of {} roles bootstrapped.",
            report.bootstrapped.len(),
            report.bootstrapped.len() + report.failed.len()
        );
    }

    println!();
    println!(
        "Workers signal completion by creating {}/worker<N>_done.",
        config.marker_dir.display()
    );
    println!(
        "Shared task brief: {} (edit before the agents pick it up).",
        config.instructions_path.display()
    );
}
