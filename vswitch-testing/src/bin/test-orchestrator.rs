//! Test orchestrator
//!
//! Drives the containerized integration setup: for each scenario, starts a
//! switch instance in the switch container, feeds it the scenario's CLI
//! configuration over stdin, runs the tester in the testing container, and
//! records the tester's exit code. Prints a summary once every scenario
//! has run.
//!
//! Requires the two containers (sharing veth pairs) to exist already; see
//! the deployment notes in the repository. Must run as a user allowed to
//! invoke docker.

use clap::Parser;
use std::io::Write;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use vswitch_testing::TestStatus;

/// Scenario name and the switch CLI configuration it needs.
const TESTS: &[(&str, &str)] = &[
    ("broadcast", ""),
    ("learning", ""),
    ("aging", "mac address-table aging-time 1\n"),
    ("mult-mac", "mac address-table aging-time 128\n"),
];

#[derive(Parser, Debug)]
#[command(name = "test-orchestrator")]
#[command(version, about = "Run every vswitch integration scenario", long_about = None)]
struct Args {
    /// Container running the switch
    #[arg(long, default_value = "vswitch")]
    switch_container: String,

    /// Container running the tester
    #[arg(long, default_value = "vswitch-testing")]
    tester_container: String,

    /// Path of the switch binary inside its container
    #[arg(long, default_value = "/vswitch/target/release/vswitch")]
    switch_bin: String,

    /// Path of the tester binary inside its container
    #[arg(long, default_value = "/vswitch/target/release/vswitch-test")]
    tester_bin: String,
}

fn spawn_switch(args: &Args) -> std::io::Result<Child> {
    Command::new("docker")
        .args(["exec", "-i", &args.switch_container, &args.switch_bin])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
}

fn run_tester(args: &Args, scenario: &str) -> std::io::Result<i32> {
    let status = Command::new("docker")
        .args(["exec", "-i", &args.tester_container, &args.tester_bin, scenario])
        .status()?;
    Ok(status.code().unwrap_or(TestStatus::Fail.exit_code()))
}

fn run_scenario(args: &Args, scenario: &str, config: &str) -> std::io::Result<i32> {
    let mut switch = spawn_switch(args)?;

    {
        let stdin = switch
            .stdin
            .as_mut()
            .ok_or_else(|| std::io::Error::other("switch stdin not piped"))?;

        stdin.write_all(config.as_bytes())?;
        stdin.flush()?;
        // Give the switch a moment to come up and apply the configuration
        // before traffic starts.
        thread::sleep(Duration::from_secs(1));
    }

    let code = run_tester(args, scenario)?;

    if let Some(stdin) = switch.stdin.as_mut() {
        let _ = stdin.write_all(b"exit\n");
        let _ = stdin.flush();
    }
    drop(switch.stdin.take());
    let _ = switch.wait()?;

    Ok(code)
}

fn print_results(failed: &[usize]) {
    let line = "=".repeat(80);
    println!("\n{}", line);
    println!("| {}/{} tests passed!", TESTS.len() - failed.len(), TESTS.len());

    if !failed.is_empty() {
        println!("|");
        println!("| The following tests failed:");
        for &index in failed {
            println!("|     [{}]: {}", index + 1, TESTS[index].0);
        }
    }
    println!("{}", line);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut failed = Vec::new();

    for (index, (scenario, config)) in TESTS.iter().enumerate() {
        println!("Running test {} [{}]...", index + 1, scenario);

        match run_scenario(&args, scenario, config) {
            Ok(code) if code == TestStatus::Pass.exit_code() => {}
            Ok(_) => failed.push(index),
            Err(e) => {
                eprintln!("could not run {}: {}", scenario, e);
                failed.push(index);
            }
        }
    }

    print_results(&failed);
}
