use std::fs;
use std::path::Path;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use novac::backends::BackendType;
use novac::ir::outline;
use novac::parser::{self, Mode, lexer::Lexer};
use novac::Compiler;

#[derive(Parser)]
#[command(name = "novac")]
#[command(about = "Branchless expression compiler for batch scripts", version)]
struct Cli {
    /// Подробный лог в stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Компилирует код под выбранную цель
    Compile {
        /// Исходник
        input: String,

        /// Нужная цель
        #[arg(short, long, default_value = "batch")]
        target: String,

        /// Скомпилированный файл
        #[arg(short, long)]
        output: Option<String>,

        /// Не падать на ошибках синтаксиса
        #[arg(long)]
        lenient: bool,

        /// Показать ast
        #[arg(long)]
        show_ast: bool,
    },

    /// Распарсить и показать токены и ast без компиляции
    Parse {
        /// Исходник
        input: String,

        /// Не падать на ошибках синтаксиса
        #[arg(long)]
        lenient: bool,
    },

    /// Список поддерживаемых целей
    Targets,
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "novac=debug" } else { "novac=warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn mode(lenient: bool) -> Mode {
    if lenient { Mode::Lenient } else { Mode::Strict }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compile { input, target, output, lenient, show_ast } => {
            let Some(backend) = BackendType::from_name(&target) else {
                return Err(format!("Unknown target: {} (see `novac targets`)", target).into());
            };
            println!("Compiling {} for {}...", input, backend.name());

            let source = fs::read_to_string(&input)?;

            if show_ast {
                println!("=== AST ===");
                println!("{:#?}", parser::parse(&source, mode(lenient))?);
            }

            let mut compiler = Compiler::new(mode(lenient)).with_target(backend);
            let script = compiler.compile(&source)?;
            debug!(minted = compiler.session().len(), "compilation finished");

            // Автоматическое имя: input.bat
            let output_path = match output {
                Some(path) => path,
                None => Path::new(&input).with_extension(backend.extension()).display().to_string(),
            };

            // Сохраняем в файл
            fs::write(&output_path, &script)?;
            println!("Compiled to: {}", output_path);
            println!("Script size: {} lines", script.lines().count());
        }
        Commands::Parse { input, lenient } => {
            println!("Parsing {}...", input);

            let source = fs::read_to_string(&input)?;

            println!("=== SOURCE ===");
            println!("{}", source);
            println!("=== TOKENS ===");

            let tokens = Lexer::new(&source).with_mode(mode(lenient)).tokenize()?;
            for token in &tokens {
                println!("{:?}", token);
            }

            println!("=== AST ===");
            match parser::parse(&source, mode(lenient)) {
                Ok(program) => {
                    println!("{:#?}", program);
                    println!("=== OUTLINE ===");
                    print!("{}", outline(&program));
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                }
            }
        }
        Commands::Targets => {
            println!("Supported targets:");
            for backend in BackendType::all() {
                println!("  {:8} - {}", backend.name(), backend.description());
            }
        }
    }

    Ok(())
}
