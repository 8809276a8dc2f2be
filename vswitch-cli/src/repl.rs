//! Interactive shell
//!
//! Reads commands from stdin until `exit` or EOF, executing each against
//! the shared bridge state. Configuration mistakes are reported inline and
//! never terminate the shell.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use vswitch_bridge::SwitchState;
use vswitch_capture::get_interface;
use vswitch_core::Result;

use crate::command::{Command, CommandParser};

const PROMPT: &str = "vswitch# ";

/// The interactive command loop.
pub struct Repl {
    state: Arc<SwitchState>,
}

enum Flow {
    Continue,
    Exit,
}

impl Repl {
    pub fn new(state: Arc<SwitchState>) -> Self {
        Self { state }
    }

    /// Run until `exit` or end of input.
    pub fn run(&self) -> Result<()> {
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();

        loop {
            print!("{}", PROMPT);
            io::stdout().flush()?;

            let line = match lines.next() {
                Some(line) => line?,
                None => break,
            };
            if line.trim().is_empty() {
                continue;
            }

            match CommandParser::parse(&line) {
                Ok(command) => {
                    if let Flow::Exit = self.execute(command) {
                        break;
                    }
                }
                Err(message) => println!("{}", message),
            }
        }

        Ok(())
    }

    fn execute(&self, command: Command) -> Flow {
        let state = &self.state;

        match command {
            Command::ShowMacTable => {
                print!("{}", state.mac_table.render(&state.port_names()));
            }
            Command::ShowInterfaces => {
                for name in state.port_names() {
                    match get_interface(&name) {
                        Ok(info) => println!("{}", info),
                        Err(e) => println!("{}: {}", name, e),
                    }
                }
            }
            Command::ShowCounters => {
                print!("{}", state.counters.render(&state.port_names()));
            }
            Command::ShowVlans => {
                print!("{}", state.vlans.render(&state.port_names()));
            }
            Command::AddVlan(vlan) => {
                if let Err(e) = state.vlans.add_vlan(vlan) {
                    println!("{}", e);
                }
            }
            Command::RemoveVlan(vlan) => {
                if let Err(e) = state.vlans.remove_vlan(vlan) {
                    println!("{}", e);
                }
            }
            Command::AssignVlan { port, vlan } => match state.port_index(&port) {
                Some(index) => {
                    if let Err(e) = state.vlans.assign(index, vlan) {
                        println!("{}", e);
                    }
                }
                None => println!("No port named '{}'", port),
            },
            Command::ClearCounters => {
                state.counters.snapshot();
            }
            Command::SetAgingTime(secs) => {
                if !state.mac_table.set_max_age(secs) {
                    println!("Aging time must be at least 1 second");
                }
            }
            Command::Exit => return Flow::Exit,
        }

        Flow::Continue
    }
}
