use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};

use budlang::diagnostics;
use budlang::interp::{Interp, InterpConfig};
use budlang::parser;

struct Options {
    input: Option<PathBuf>,
    max_depth: Option<usize>,
    module_root: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options> {
    let mut options = Options {
        input: None,
        max_depth: None,
        module_root: None,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--max-depth" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("Missing value after {arg}"))?;
                options.max_depth = Some(
                    value
                        .parse()
                        .with_context(|| format!("Invalid depth '{value}'"))?,
                );
            }
            "--modules" | "-m" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("Missing directory after {arg}"))?;
                options.module_root = Some(PathBuf::from(value));
            }
            _ => {
                options.input = Some(PathBuf::from(arg));
                if args.next().is_some() {
                    bail!("Only one input file is supported");
                }
                break;
            }
        }
    }

    Ok(options)
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let options = parse_args(std::env::args().skip(1))?;

    let (source, source_name, script_dir) = match &options.input {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("Reading {}", path.display()))?;
            let dir = path
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .map(PathBuf::from);
            (source, path.display().to_string(), dir)
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Reading stdin")?;
            (buffer, "<stdin>".to_string(), None)
        }
    };

    let script = match parser::parse(&source) {
        Ok(script) => script,
        Err(error) => {
            eprintln!(
                "{}",
                diagnostics::render(&source_name, error.line(), error.token(), &error.to_string())
            );
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut config = InterpConfig {
        source_name: source_name.clone(),
        ..InterpConfig::default()
    };
    if let Some(depth) = options.max_depth {
        config.max_depth = depth;
    }
    // Imports resolve next to the script unless --modules says otherwise.
    config.module_root = options
        .module_root
        .or(script_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut interp = Interp::new(config);
    let result = interp.run(&script);
    for line in interp.output() {
        println!("{line}");
    }
    if let Err(error) = result {
        let line_text = source
            .lines()
            .nth(error.token.line.saturating_sub(1) as usize)
            .unwrap_or("");
        eprintln!(
            "{}",
            diagnostics::render(&source_name, line_text, &error.token, &error.to_string())
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
