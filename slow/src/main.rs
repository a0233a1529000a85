use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use console::style;
use eyre::WrapErr;
use log::{debug, LevelFilter};
use slow::{analyze, render_diagnostic};

fn main() -> eyre::Result<ExitCode> {
    color_eyre::install()?;
    let app = App::parse();
    env_logger::Builder::new()
        .filter_level(app.log.unwrap_or(LevelFilter::Warn))
        .init();
    debug!("starting slow with args {app:?}");

    let content = fs::read_to_string(&app.file)
        .wrap_err_with(|| format!("could not read {}", app.file.display()))?;

    if app.tokens {
        let (tokens, _) = slow::tokenize(&content);
        for token in tokens {
            println!(
                "{:>5}..{:<5} {:<18} {:?}",
                token.span.start,
                token.span.end,
                format!("{:?}", token.kind),
                token.text
            );
        }
    }

    let analysis = analyze(&content, &app.builtins);

    if !app.no_ast {
        println!("{:#?}", analysis.program);
    }

    if app.symbols {
        let symbols = &analysis.symbols;
        for scope in symbols.scopes() {
            match symbols.parent(scope) {
                Some(parent) => println!("{:?} (parent {:?}):", scope, parent),
                None => println!("{:?} (global):", scope),
            }
            for symbol in symbols.symbols(scope) {
                match &symbol.value {
                    Some(value) => println!(
                        "    {:?} {}: {:?} = {:?}",
                        symbol.mutability, symbol.name, symbol.declared_type, value
                    ),
                    None => println!(
                        "    {:?} {}: {:?}",
                        symbol.mutability, symbol.name, symbol.declared_type
                    ),
                }
            }
        }
    }

    for diagnostic in &analysis.diagnostics {
        let rendered = render_diagnostic(&content, diagnostic);
        let (header, snippet) = rendered.split_once('\n').unwrap_or((rendered.as_str(), ""));
        eprintln!(
            "{}: {}",
            style(app.file.display()).bold(),
            style(header).red().bold()
        );
        eprint!("{}", style(snippet).blue());
    }

    if analysis.has_errors() {
        eprintln!(
            "{}",
            style(format!("{} error(s) found", analysis.diagnostics.len())).red()
        );
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Lex, parse and check a slow source file.
#[derive(Debug, Parser)]
#[clap(name = "slow", version)]
struct App {
    /// The source file to check.
    file: PathBuf,
    /// Print the token stream before parsing.
    #[clap(long)]
    tokens: bool,
    /// Print every scope and its symbols after parsing.
    #[clap(long)]
    symbols: bool,
    /// Do not print the AST.
    #[clap(long)]
    no_ast: bool,
    /// Predeclare a global constant, e.g. a host function. Can be repeated.
    #[clap(long = "builtin", value_name = "NAME")]
    builtins: Vec<String>,
    #[clap(long = "log-level", env = "RUST_LOG")]
    log: Option<LevelFilter>,
}
