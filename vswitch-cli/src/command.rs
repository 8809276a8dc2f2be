//! Command parser
//!
//! Turns one line of REPL input into a typed command. Tokenization is
//! whitespace splitting; any line whose first token is not a keyword is
//! tried as `<port-name> vlan <id>`.

use vswitch_core::VlanId;

/// A parsed CLI command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `show mac address-table`
    ShowMacTable,
    /// `show interfaces`
    ShowInterfaces,
    /// `show interfaces counters`
    ShowCounters,
    /// `show vlan`
    ShowVlans,
    /// `vlan <id>`
    AddVlan(VlanId),
    /// `no vlan <id>`
    RemoveVlan(VlanId),
    /// `<port-name> vlan <id>`
    AssignVlan { port: String, vlan: VlanId },
    /// `clear counters`
    ClearCounters,
    /// `mac address-table aging-time <secs>`
    SetAgingTime(u64),
    /// `exit`
    Exit,
}

/// Command parser
pub struct CommandParser;

impl CommandParser {
    /// Parse a command line
    pub fn parse(line: &str) -> Result<Command, String> {
        let tokens: Vec<&str> = line.split_whitespace().collect();

        match tokens.as_slice() {
            [] => Err("Empty command".to_string()),
            ["show", "mac", "address-table"] => Ok(Command::ShowMacTable),
            ["show", "interfaces"] => Ok(Command::ShowInterfaces),
            ["show", "interfaces", "counters"] => Ok(Command::ShowCounters),
            ["show", "vlan"] => Ok(Command::ShowVlans),
            ["vlan", id] => Ok(Command::AddVlan(parse_vlan_id(id)?)),
            ["no", "vlan", id] => Ok(Command::RemoveVlan(parse_vlan_id(id)?)),
            ["clear", "counters"] => Ok(Command::ClearCounters),
            ["mac", "address-table", "aging-time", secs] => {
                let secs = secs
                    .parse::<u64>()
                    .map_err(|_| format!("Invalid aging time: {}", secs))?;
                Ok(Command::SetAgingTime(secs))
            }
            ["exit"] | ["quit"] => Ok(Command::Exit),
            [port, "vlan", id] => Ok(Command::AssignVlan {
                port: port.to_string(),
                vlan: parse_vlan_id(id)?,
            }),
            _ => Err("Bad command".to_string()),
        }
    }
}

fn parse_vlan_id(token: &str) -> Result<VlanId, String> {
    token
        .parse::<VlanId>()
        .map_err(|_| format!("Invalid VLAN id: {}", token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_commands() {
        assert_eq!(
            CommandParser::parse("show mac address-table"),
            Ok(Command::ShowMacTable)
        );
        assert_eq!(
            CommandParser::parse("show interfaces"),
            Ok(Command::ShowInterfaces)
        );
        assert_eq!(
            CommandParser::parse("show interfaces counters"),
            Ok(Command::ShowCounters)
        );
        assert_eq!(CommandParser::parse("show vlan"), Ok(Command::ShowVlans));
    }

    #[test]
    fn test_vlan_commands() {
        assert_eq!(CommandParser::parse("vlan 42"), Ok(Command::AddVlan(42)));
        assert_eq!(
            CommandParser::parse("no vlan 42"),
            Ok(Command::RemoveVlan(42))
        );
        assert_eq!(
            CommandParser::parse("vswitch-port2 vlan 7"),
            Ok(Command::AssignVlan {
                port: "vswitch-port2".to_string(),
                vlan: 7
            })
        );
    }

    #[test]
    fn test_counters_and_aging() {
        assert_eq!(
            CommandParser::parse("clear counters"),
            Ok(Command::ClearCounters)
        );
        assert_eq!(
            CommandParser::parse("mac address-table aging-time 30"),
            Ok(Command::SetAgingTime(30))
        );
    }

    #[test]
    fn test_exit() {
        assert_eq!(CommandParser::parse("exit"), Ok(Command::Exit));
        assert_eq!(CommandParser::parse("quit"), Ok(Command::Exit));
    }

    #[test]
    fn test_whitespace_tolerated() {
        assert_eq!(
            CommandParser::parse("  show   vlan  "),
            Ok(Command::ShowVlans)
        );
    }

    #[test]
    fn test_bad_input() {
        assert!(CommandParser::parse("").is_err());
        assert!(CommandParser::parse("show").is_err());
        assert!(CommandParser::parse("vlan").is_err());
        assert!(CommandParser::parse("vlan abc").is_err());
        assert!(CommandParser::parse("no vlan 70000").is_err());
        assert!(CommandParser::parse("mac address-table aging-time x").is_err());
        assert!(CommandParser::parse("one two three four").is_err());
    }
}
