//! lapu-emu: emulator for the LAPU-128 complex vector processor
//!
//! Usage: lapu-emu <program.hex> [--max-cycles N] [--tile-factor N]
//!                 [--branch-on-imag] [--dump-state] [--dump-matrix [SIZE]]
//!        lapu-emu --sample-config

use std::env;

use anyhow::{bail, Context};
use lapu_emu::config::Config;
use lapu_emu::interpreter::{EngineStatus, LapuEngine};
use lapu_emu::program::ProgramMemory;

/// Default side of the matrix window printed by `--dump-matrix`.
const DEFAULT_WINDOW: usize = 4;

/// Command-line options.
#[derive(Debug, Default)]
struct Options {
    path: Option<String>,
    max_cycles: Option<u64>,
    tile_factor: Option<usize>,
    branch_on_imag: bool,
    dump_state: bool,
    dump_matrix: Option<usize>,
    sample_config: bool,
}

impl Options {
    fn parse(args: &[String]) -> anyhow::Result<Self> {
        let mut opts = Options::default();
        let mut iter = args.iter().skip(1).peekable();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--max-cycles" => {
                    let value = iter.next().context("--max-cycles needs a value")?;
                    opts.max_cycles = Some(value.parse().context("invalid --max-cycles")?);
                }
                "--tile-factor" => {
                    let value = iter.next().context("--tile-factor needs a value")?;
                    let n: usize = value.parse().context("invalid --tile-factor")?;
                    if n == 0 {
                        bail!("--tile-factor must be at least 1");
                    }
                    opts.tile_factor = Some(n);
                }
                "--branch-on-imag" => opts.branch_on_imag = true,
                "--dump-state" => opts.dump_state = true,
                "--dump-matrix" => {
                    // Optional window size
                    let size = match iter.peek().and_then(|v| v.parse::<usize>().ok()) {
                        Some(n) => {
                            iter.next();
                            n
                        }
                        None => DEFAULT_WINDOW,
                    };
                    opts.dump_matrix = Some(size);
                }
                "--sample-config" => opts.sample_config = true,
                "-h" | "--help" => {
                    print_usage();
                    std::process::exit(0);
                }
                other if other.starts_with('-') => bail!("unknown option {}", other),
                other => {
                    if opts.path.is_some() {
                        bail!("only one program file may be given");
                    }
                    opts.path = Some(other.to_string());
                }
            }
        }

        Ok(opts)
    }

    /// Layer command-line flags over the loaded configuration.
    fn apply(&self, config: &mut Config) {
        if let Some(n) = self.tile_factor {
            config.tile_factor = Some(n);
        }
        if let Some(n) = self.max_cycles {
            config.max_cycles = Some(n);
        }
        if self.branch_on_imag {
            config.branch_on_imag = Some(true);
        }
    }
}

fn print_usage() {
    eprintln!("Usage: lapu-emu <program.hex> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --max-cycles N       Tick budget (default from config, 10000)");
    eprintln!("  --tile-factor N      Tiles per matrix axis (matrix side = 8*N)");
    eprintln!("  --branch-on-imag     Jump on a non-zero imaginary part as well");
    eprintln!("  --dump-state         Print registers after the run");
    eprintln!("  --dump-matrix [N]    Print the top-left NxN window of each bank");
    eprintln!("  --sample-config      Print an example config file and exit");
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    let opts = Options::parse(&args)?;

    if opts.sample_config {
        print!("{}", Config::sample_config());
        return Ok(());
    }

    let path = match opts.path.as_deref() {
        Some(p) => p,
        None => {
            print_usage();
            std::process::exit(1);
        }
    };

    let mut config = Config::get().clone();
    opts.apply(&mut config);

    let program = ProgramMemory::from_file(path)?;
    println!("Loaded: {} ({} words)", path, program.len());

    let mut engine = LapuEngine::from_config(&config);
    engine.load_program(program);

    let (status, ticks) = engine.run(config.max_cycles());
    let ctx = engine.state();
    println!(
        "{:?} after {} ticks, {} instructions, PC {}",
        status,
        ticks,
        ctx.instructions,
        ctx.pc()
    );

    if opts.dump_state {
        println!();
        print!("{}", engine.summary());
    }
    if let Some(size) = opts.dump_matrix {
        println!();
        print!("{}", ctx.format_matrices(size));
    }

    match status {
        EngineStatus::Error => {
            let reason = engine
                .last_error()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string());
            bail!("processor stopped: {}", reason)
        }
        EngineStatus::Running | EngineStatus::Ready => {
            eprintln!("Warning: tick budget of {} exhausted", config.max_cycles());
            Ok(())
        }
        EngineStatus::Halted => Ok(()),
    }
}
