use std::{process::ExitCode, time::Instant};

use clap::Parser;
use sylph::{
    compile,
    config::{CompileOptions, DEFAULT_MAX_DIAGNOSTICS, DEFAULT_POINTER_SIZE},
    format_error, get_line_at_location,
    lexer::source::FileLoader,
    CompiledModule,
};

/// Checks a source file and reports every diagnostic of the first failing phase.
#[derive(Parser, Debug)]
#[command(name = "sylphc", version, about)]
struct Args {
    /// Entry source file
    file: String,

    /// Stop a phase after this many diagnostics
    #[arg(long, default_value_t = DEFAULT_MAX_DIAGNOSTICS)]
    max_errors: usize,

    /// Pointer size in bytes used for type sizes
    #[arg(long, default_value_t = DEFAULT_POINTER_SIZE)]
    pointer_size: u32,

    /// Print the parsed body of every function
    #[arg(long)]
    dump_ast: bool,
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Only initialize if RUST_LOG is set
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let options = CompileOptions::default()
        .with_max_diagnostics(args.max_errors)
        .with_pointer_size(args.pointer_size);
    let loader = FileLoader;

    let start = Instant::now();
    match compile(&args.file, &loader, &options) {
        Ok(module) => {
            print_summary(&module, &options, args.dump_ast);
            println!("Checked {} in {:?}", args.file, start.elapsed());
            ExitCode::SUCCESS
        }
        Err(errors) => {
            for error in &errors {
                let line = get_line_at_location(&loader, error.get_location());
                println!("{}", format_error(error, line.as_deref()));
            }
            println!("{} error(s) found", errors.len());
            ExitCode::FAILURE
        }
    }
}

fn print_summary(module: &CompiledModule, options: &CompileOptions, dump_ast: bool) {
    let mut names: Vec<&String> = module.functions.keys().collect();
    names.sort();

    for name in names {
        for function in &module.functions[name] {
            println!("func {} {}", name, function.signature);
            if dump_ast {
                print!("{}", function.body);
            }
        }
    }

    // Built-in types print as their own name
    let mut aliases: Vec<_> = module
        .types
        .iter()
        .filter(|(name, ty)| **name != ty.to_string())
        .collect();
    aliases.sort_by(|a, b| a.0.cmp(b.0));
    for (name, ty) in aliases {
        match ty.size(options.pointer_size) {
            Some(size) => println!("type {} = {} ({} bytes)", name, ty, size),
            None => println!("type {} = {} (too large)", name, ty),
        }
    }

    for class in &module.classes {
        println!("class {}", class.name.value);
    }
}
