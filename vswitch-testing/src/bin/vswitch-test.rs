//! Scenario runner
//!
//! Runs one named scenario against the switch under test, using every
//! local interface matching the prefix as a tester port. The scenario
//! outcome is the process exit code: 0 pass, 1 fail, 2 in-progress.

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;
use vswitch_capture::open_ports_with_prefix;
use vswitch_testing::{scenarios, wave, TestBed, TestStatus};

#[derive(Parser, Debug)]
#[command(name = "vswitch-test")]
#[command(version, about = "Run one vswitch integration scenario", long_about = None)]
struct Args {
    /// Scenario name
    scenario: String,

    /// Bind every interface whose name starts with this prefix
    #[arg(long, default_value = "test")]
    prefix: String,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let Some(setup) = scenarios::lookup(&args.scenario) else {
        eprintln!(
            "'{}' is not a valid scenario. Choose one of: {}",
            args.scenario,
            scenarios::names().join(", ")
        );
        std::process::exit(TestStatus::Fail.exit_code());
    };

    let ports = open_ports_with_prefix(&args.prefix);
    if ports.is_empty() {
        eprintln!("no usable interface with prefix '{}'", args.prefix);
        std::process::exit(TestStatus::Fail.exit_code());
    }

    let mut bed = TestBed::new(ports);
    setup(&mut bed);

    match wave::run(bed) {
        Ok(status) => std::process::exit(status.exit_code()),
        Err(e) => {
            error!("scenario aborted: {}", e);
            std::process::exit(TestStatus::Fail.exit_code());
        }
    }
}
