use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use gdump::DumperConfig;
use tracing_subscriber::EnvFilter;

mod commands;
mod shutdown;

#[derive(Parser)]
#[command(name = "gdump")]
#[command(about = "Godot ClassDB dumper")]
#[command(version)]
struct Cli {
    /// Attach to this process instead of searching by window class
    #[arg(long, global = true, env = "GDUMP_PID")]
    pid: Option<u32>,

    /// Window class of the engine's main window
    #[arg(long, global = true, default_value = gdump::memory::ENGINE_WINDOW_CLASS)]
    window_class: String,

    /// Which process to use when several are running
    #[arg(long, global = true, default_value = "0")]
    index: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List running engine processes
    Processes,

    /// Rank class registry candidates
    Scan {
        /// Number of candidates to show
        #[arg(short, long, default_value = "10")]
        top: usize,
    },

    /// Decode every class and write them as JSON
    Dump {
        /// Registry address (skips the scan)
        #[arg(short, long)]
        address: Option<String>,

        /// Output file
        #[arg(short, long, env = "GDUMP_OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Show raw memory
    Hexdump {
        /// Start address (hex)
        address: String,

        /// Number of bytes
        #[arg(short, long, default_value = "256")]
        size: usize,

        /// Show ASCII column
        #[arg(long)]
        ascii: bool,
    },

    /// Distance between two addresses
    Offset {
        /// From address (hex)
        from: String,
        /// To address (hex)
        to: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("gdump=info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut config = DumperConfig::builder()
        .window_class(cli.window_class)
        .process_index(cli.index);

    match cli.command {
        Command::Processes => commands::processes::run(&config.build()),
        Command::Scan { top } => commands::scan::run(&config.build(), cli.pid, top),
        Command::Dump { address, output } => {
            if let Some(path) = output {
                config = config.output_path(path);
            }
            commands::dump::run(&config.build(), cli.pid, address.as_deref())
        }
        Command::Hexdump {
            address,
            size,
            ascii,
        } => {
            let address = commands::offset::parse_hex_address(&address)?;
            commands::hexdump::run(&config.build(), cli.pid, address, size, ascii)
        }
        Command::Offset { from, to } => commands::offset::run(&from, &to),
    }
}
