//! CLI argument parsing

use clap::{Args, Parser, Subcommand};
use kraken_core::{EtherCatTarget, MacAddr, ModuleParams, Result, Target};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "kraken")]
#[command(version, about = "EtherCAT security probe runner", long_about = None)]
pub struct Cli {
    /// Verbose output (-v, -vv, -vvv for increasing verbosity)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available network interfaces
    Interfaces,

    /// List registered modules
    Modules,

    /// Run one module against an EtherCAT segment
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Module id (see `kraken modules`)
    #[arg(short, long)]
    pub module: String,

    /// Network interface attached to the segment
    #[arg(short, long)]
    pub interface: String,

    /// Master MAC address observed on the segment; defaults to the interface address
    #[arg(long, value_name = "MAC", value_parser = parse_mac)]
    pub master_mac: Option<MacAddr>,

    /// Observed slave station address, hex (0x1001) or decimal; repeatable
    #[arg(long = "slave", value_name = "ADDR", value_parser = parse_station_address)]
    pub slaves: Vec<u16>,

    /// Report against a host instead of the EtherCAT segment
    #[arg(long, requires = "port")]
    pub host: Option<String>,

    /// Port for --host
    #[arg(long, requires = "host")]
    pub port: Option<u16>,

    /// Overall deadline in milliseconds (0 = none)
    #[arg(short = 't', long, value_name = "MS", default_value_t = 0)]
    pub timeout_ms: u64,

    /// Module parameters (key=value pairs)
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Run against an in-memory connection instead of the interface
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    /// Target descriptor for this run; `interface_mac` stands in for a missing --master-mac
    pub fn target(&self, interface_mac: MacAddr) -> Target {
        if let (Some(host), Some(port)) = (&self.host, self.port) {
            return Target::network(host.clone(), port);
        }

        let master = self.master_mac.unwrap_or(interface_mac);
        Target::EtherCat(
            EtherCatTarget::new(self.interface.clone(), master.to_string())
                .with_slaves(self.slaves.clone()),
        )
    }

    pub fn module_params(&self) -> Result<ModuleParams> {
        ModuleParams::from_pairs(&self.params)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn parse_mac(s: &str) -> std::result::Result<MacAddr, String> {
    s.parse::<MacAddr>().map_err(|e| e.to_string())
}

/// Parse a station address given as `0x`-prefixed hex or decimal
pub fn parse_station_address(s: &str) -> std::result::Result<u16, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid station address '{}': {}", s, e))
}
