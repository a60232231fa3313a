use std::path::PathBuf;
use std::process;

use abi_diff::commands::{compare_command, format_dump_command, inspect_command, CompareArgs};
use anyhow::Result;
use clap::{Parser, Subcommand};

/// Structural ABI compatibility checker CLI.
///
/// Loading, diffing and report building live in `abi-core`; this binary
/// merges flags with the optional config file and maps the verdict to an
/// exit code.
#[derive(Parser, Debug)]
#[command(
    name = "abi-diff",
    version,
    about = "Compare two ABI dumps of a library and report compatibility",
    long_about = None
)]
struct Cli {
    /// Enable debug logging (RUST_LOG still takes precedence).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Diff an old dump against a new one and write a JSON report.
    ///
    /// The exit code is 0 when the verdict is compatible (or every raised
    /// status bit is allowed), otherwise the bitmask of the offending bits:
    /// 1 = unreferenced changes, 4 = extension, 8 = incompatible,
    /// 16 = ELF symbols removed.
    Compare(CompareArgs),

    /// Validate a dump and print entity counts.
    Inspect {
        #[arg(long)]
        dump: PathBuf,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Rewrite a dump in canonical form.
    FormatDump {
        #[arg(long)]
        dump: PathBuf,

        #[arg(long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Compare(args) => {
            let code = compare_command(&args)?;
            if code != 0 {
                process::exit(code);
            }
        }
        Command::Inspect { dump, json } => inspect_command(&dump, json)?,
        Command::FormatDump { dump, output } => format_dump_command(&dump, &output)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}
