//! MIC-1 Simulator - CLI Entry Point
//!
//! Commands:
//! - `mic1-sim run <micro> <program>` - Run an IJVM program on a microcode image
//! - `mic1-sim debug <micro> <program>` - Interactive debugger
//! - `mic1-sim disasm-micro <micro>` - List a microcode image as MAL text
//! - `mic1-sim disasm-macro <program>` - List an IJVM program

use clap::{Parser, Subcommand};
use mic1::cpu::format;
use mic1::disasm::{disassemble_memory, disassemble_store, format_micro};
use mic1::{Controller, Mic1, MicroInstruction, Register, SimulatorConfig, StopReason};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mic1-sim")]
#[command(version)]
#[command(about = "A MIC-1 microarchitecture simulator running IJVM programs")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Microcode image (.mic1)
        micro: PathBuf,
        /// IJVM program image (.ijvm)
        program: PathBuf,
        /// Maximum number of ticks to run (default from config)
        #[arg(short, long)]
        max_ticks: Option<u64>,
        /// Print every executed microinstruction
        #[arg(short, long)]
        trace: bool,
        /// Text fed to the console input port
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Interactive debugger
    Debug {
        micro: PathBuf,
        program: PathBuf,
    },
    /// Disassemble a microcode image
    DisasmMicro {
        micro: PathBuf,
    },
    /// Disassemble the method area of an IJVM image
    DisasmMacro {
        program: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Run { micro, program, max_ticks, trace, input } => {
            let max_ticks = max_ticks.unwrap_or(config.max_ticks);
            run_program(&micro, &program, &config, max_ticks, trace, input.as_deref());
        }
        Commands::Debug { micro, program } => debug_program(&micro, &program, &config),
        Commands::DisasmMicro { micro } => disassemble_micro(&micro),
        Commands::DisasmMacro { program } => disassemble_macro(&program, &config),
    }
}

fn load_config(path: Option<&std::path::Path>) -> SimulatorConfig {
    let Some(path) = path else {
        return SimulatorConfig::default();
    };
    SimulatorConfig::from_file(path).unwrap_or_else(|e| {
        eprintln!("❌ {e}");
        process::exit(1);
    })
}

fn load(micro: &std::path::Path, program: &std::path::Path, config: &SimulatorConfig) -> Mic1 {
    Mic1::from_files_with_config(micro, program, config).unwrap_or_else(|e| {
        eprintln!("❌ Failed to load images: {e}");
        process::exit(1);
    })
}

/// Prints each microinstruction as it retires.
struct TraceController {
    ticks: u64,
}

impl Controller for TraceController {
    fn tick_done(&mut self, executed: &MicroInstruction, macro_fetch: bool) {
        self.ticks += 1;
        let marker = if macro_fetch { '*' } else { ' ' };
        println!("{:>8} {marker} {}", self.ticks, format_micro(executed));
    }
}

fn run_program(
    micro: &std::path::Path,
    program: &std::path::Path,
    config: &SimulatorConfig,
    max_ticks: u64,
    trace: bool,
    input: Option<&str>,
) {
    let mut sim = load(micro, program, config);
    println!(
        "🔧 Loaded {} microinstructions, {} program blocks",
        sim.control_store().len(),
        sim.memory().segments().len()
    );

    if let Some(input) = input {
        sim.push_input(input.as_bytes());
    }
    if trace {
        sim.set_controller(Box::new(TraceController { ticks: 0 }));
    }

    let summary = match sim.run_limited(max_ticks) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("❌ Simulation error at MPC={:#05X}: {e}", sim.mpc());
            process::exit(1);
        }
    };

    println!();
    println!("━━━ Output ━━━");
    println!("{}", String::from_utf8_lossy(sim.output()));
    println!("━━━ Result ━━━");
    println!("Ticks: {}", summary.ticks);
    match summary.stop {
        StopReason::Halted(reason) => println!("State: halted ({reason})"),
        StopReason::TickLimit => {
            println!("State: stopped");
            println!();
            println!("⚠️  Reached tick limit ({max_ticks}). Use --max-ticks to increase.");
        }
        stop => println!("State: {stop:?}"),
    }
    for reg in [Register::Pc, Register::Sp, Register::Lv, Register::Tos] {
        let value = sim.register(reg);
        println!("{:>4}: {value:#010X} ({value})", reg.name());
    }
}

#[cfg(feature = "tui")]
fn debug_program(micro: &std::path::Path, program: &std::path::Path, config: &SimulatorConfig) {
    let sim = load(micro, program, config);
    if let Err(e) = mic1::run_debugger(sim) {
        eprintln!("❌ Debugger error: {e}");
        process::exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_micro: &std::path::Path, _program: &std::path::Path, _config: &SimulatorConfig) {
    eprintln!("❌ This build has no debugger; rebuild with the `tui` feature.");
    process::exit(1);
}

fn disassemble_micro(path: &std::path::Path) {
    let store = format::read_image(path).and_then(|bytes| mic1::cpu::ControlStore::from_bytes(&bytes));
    match store {
        Ok(store) => print!("{}", disassemble_store(&store)),
        Err(e) => {
            eprintln!("❌ Failed to load microcode: {e}");
            process::exit(1);
        }
    }
}

fn disassemble_macro(path: &std::path::Path, config: &SimulatorConfig) {
    let mem = format::read_image(path).and_then(|bytes| mic1::cpu::Memory::load(&bytes, config.memory_words));
    match mem {
        Ok(mem) => {
            for line in disassemble_memory(&mem) {
                println!("{line}");
            }
        }
        Err(e) => {
            eprintln!("❌ Failed to load program: {e}");
            process::exit(1);
        }
    }
}
