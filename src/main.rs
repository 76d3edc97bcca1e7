mod repl;

use clap::Parser;
use std::io;
use std::process;

use kyou::error::{format_error, KyouError};
use kyou::lexer::Lexer;
use kyou::log::{self, Level};
use kyou::vm::{Machine, MachineConfig};

#[derive(Parser)]
#[command(name = "kyou")]
#[command(about = "Interpreter for the Kyou ideogram instruction language", long_about = None)]
struct Cli {
    /// Program source. Starts an interactive prompt when omitted.
    file: Option<String>,

    /// Print the token stream and exit.
    #[arg(long)]
    tokens: bool,

    /// Print the parsed instruction list and exit.
    #[arg(long)]
    ast: bool,

    /// Log every executed instruction to stderr.
    #[arg(short, long)]
    trace: bool,

    /// Only report errors.
    #[arg(short, long, conflicts_with = "trace")]
    quiet: bool,

    /// Size of the virtual memory in bytes.
    #[arg(long, default_value_t = MachineConfig::default().memory_size)]
    memory_size: usize,

    /// Address both stack registers start at.
    #[arg(long, default_value_t = MachineConfig::default().stack_base)]
    stack_base: usize,

    /// Abort after this many executed instructions.
    #[arg(long)]
    max_steps: Option<u64>,
}

fn main() {
    let cli = Cli::parse();

    log::set_level(if cli.trace {
        Level::Trace
    } else if cli.quiet {
        Level::Error
    } else {
        Level::Warn
    });

    let config = MachineConfig {
        memory_size: cli.memory_size,
        stack_base: cli.stack_base,
        max_steps: cli.max_steps,
    };
    if config.stack_base >= config.memory_size {
        kyou::warn!(
            "stack base {} lies outside memory of {} bytes; every push will fail",
            config.stack_base,
            config.memory_size
        );
    }

    match cli.file {
        Some(ref path) => run_file(path, &cli, config),
        None => repl::start(&mut Machine::new(config, io::stdout())),
    }
}

fn run_file(path: &str, cli: &Cli, config: MachineConfig) {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            kyou::error!("failed to read '{}': {}", path, e);
            process::exit(1);
        }
    };

    if let Err(e) = run(&source, cli, config) {
        eprintln!("{}", format_error(&e, &source, path));
        process::exit(1);
    }
}

fn run(source: &str, cli: &Cli, config: MachineConfig) -> Result<(), KyouError> {
    if cli.tokens {
        for token in Lexer::new(source).tokenize()? {
            println!(
                "{:>4}:{:<4} {:?}",
                token.span.line, token.span.col, token.kind
            );
        }
        return Ok(());
    }

    let program = kyou::compile(source)?;

    if cli.ast {
        for (index, instruction) in program.instructions.iter().enumerate() {
            println!("{:>5}  {}", index, instruction);
        }
        return Ok(());
    }

    let mut machine = Machine::new(config, io::stdout().lock());
    machine.run(&program)?;
    kyou::info!("finished after {} step(s)", machine.steps());
    Ok(())
}
