//! vswitch — user-space learning Ethernet bridge
//!
//! Binds every host interface whose name starts with the configured
//! prefix, bridges traffic between them, and serves an interactive CLI on
//! stdin. Exits when the CLI receives `exit` (or stdin closes).

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;
use vswitch_bridge::Switch;
use vswitch_cli::Repl;
use vswitch_core::Result;

#[derive(Parser, Debug)]
#[command(name = "vswitch")]
#[command(version, about = "User-space learning Ethernet bridge", long_about = None)]
struct Args {
    /// Bind every interface whose name starts with this prefix
    #[arg(long, default_value = "vswitch")]
    prefix: String,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn run(args: Args) -> Result<()> {
    let switch = Switch::open(&args.prefix)?;
    switch.start()?;

    println!("vswitch ready; type 'exit' to quit");
    Repl::new(switch.state()).run()?;

    switch.shutdown();
    Ok(())
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(args.verbose))),
        )
        .init();

    if let Err(e) = run(args) {
        error!("{}", e);
        std::process::exit(1);
    }
}
