//! Subcommand dispatch

use kraken_attack::{run_module, ModuleRegistry};
use kraken_core::{Interface, MacAddr, RunResult, ScriptedConnection};
use tracing::info;

use crate::args::{Cli, Commands, RunArgs};
use crate::output;
use crate::transport::EthernetConnection;
use crate::CliError;

/// Execute the parsed command line
pub fn execute(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Commands::Interfaces => {
            list_interfaces();
            Ok(())
        }
        Commands::Modules => {
            list_modules(&registry()?);
            Ok(())
        }
        Commands::Run(args) => {
            let result = run(args)?;
            let rendered = if args.json {
                output::render_json(&result)?
            } else {
                output::render_text(&result)
            };
            println!("{}", rendered);
            Ok(())
        }
    }
}

fn registry() -> kraken_core::Result<ModuleRegistry> {
    ModuleRegistry::with_modules(kraken_modules::all())
}

fn list_interfaces() {
    for iface in Interface::list_all() {
        println!("{}", iface);
    }
}

fn list_modules(registry: &ModuleRegistry) {
    for module in registry.list() {
        println!("{:<12} {:<16} {}", module.id, module.finding_id, module.description);
    }
}

/// Resolve the module and run it against the interface, or in memory for --dry-run
pub fn run(args: &RunArgs) -> Result<RunResult, CliError> {
    let module = registry()?.require(&args.module)?;
    let params = args.module_params()?;

    let result = if args.dry_run {
        info!(module = %args.module, "Dry run on in-memory connection");
        let mut conn = ScriptedConnection::new().with_retain(0);
        let target = args.target(MacAddr::zero());
        run_module(module, &mut conn, &target, args.timeout(), &params)?
    } else {
        let mut conn = EthernetConnection::open(&args.interface)?;
        let target = args.target(conn.mac_address());
        run_module(module, &mut conn, &target, args.timeout(), &params)?
    };

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use kraken_core::{Error, Target};

    fn run_args(argv: &[&str]) -> RunArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Run(args) => args,
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_dry_run_inject() {
        let args = run_args(&[
            "kraken", "run", "-m", "ecat_inject", "-i", "eth0", "--slave", "0x1001", "--dry-run",
        ]);
        let result = run(&args).unwrap();

        assert_eq!(result.findings.len(), 1);
        assert!(result.findings[0].success);
        assert!(result
            .logs
            .contains(&"  Sent FPRD response impersonating slave 0x1001".to_string()));
        match &result.target {
            Target::EtherCat(t) => assert_eq!(t.mac_address, "00:00:00:00:00:00"),
            other => panic!("unexpected target {:?}", other),
        }
    }

    #[test]
    fn test_unknown_module() {
        let args = run_args(&["kraken", "run", "-m", "ecat_fuzz", "-i", "eth0", "--dry-run"]);
        assert!(matches!(run(&args), Err(CliError::Kraken(Error::NotFound(_)))));
    }

    #[test]
    fn test_bad_param() {
        let args = run_args(&["kraken", "run", "-m", "ecat_dos", "-i", "eth0", "-p", "flood_ms", "--dry-run"]);
        assert!(matches!(
            run(&args),
            Err(CliError::Kraken(Error::InvalidParameter { .. }))
        ));
    }

    #[test]
    fn test_registry_lists_all_modules() {
        let ids: Vec<&str> = registry().unwrap().list().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["ecat_dos", "ecat_inject", "ecat_mitm"]);
    }
}
