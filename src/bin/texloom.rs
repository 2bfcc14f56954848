//! texloom CLI - inspect, search and verify LaTeX parse trees

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io::{self, Read};
#[cfg(feature = "cli")]
use texloom::{
    diagnostics::{check_latex_with_options, format_diagnostics},
    parse_with_options, NodeKind, ParseOptions, TexNode, TexTree, Tolerance,
};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "texloom")]
#[command(version)]
#[command(about = "texloom - lossless, editable LaTeX parse trees", long_about = None)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Keep a partial tree instead of failing on unclosed environments
    #[arg(long, global = true)]
    lenient: bool,

    /// Treat an extra environment as opaque text (repeatable)
    #[arg(long = "skip-env", value_name = "NAME", global = true)]
    skip_env: Vec<String>,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Report structural problems in a document
    Check {
        /// Input file (reads from stdin if not provided)
        input: Option<String>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Print every command or environment with the given name
    Find {
        /// Name to search for, with or without the leading backslash
        name: String,

        /// Input file (reads from stdin if not provided)
        input: Option<String>,
    },

    /// Count the commands or environments with the given name
    Count {
        /// Name to search for, with or without the leading backslash
        name: String,

        /// Input file (reads from stdin if not provided)
        input: Option<String>,
    },

    /// Verify that parsing and writing back reproduces the input exactly
    Roundtrip {
        /// Input file (reads from stdin if not provided)
        input: Option<String>,
    },

    /// Print an indented outline of the parse tree
    Tree {
        /// Input file (reads from stdin if not provided)
        input: Option<String>,
    },
}

#[cfg(feature = "cli")]
fn main() -> io::Result<()> {
    let cli = Cli::parse();

    let mut options = ParseOptions::new().with_tolerance(if cli.lenient {
        Tolerance::Lenient
    } else {
        Tolerance::Strict
    });
    for name in &cli.skip_env {
        options = options.with_skip_env(name);
    }

    match cli.command {
        Commands::Check { input, no_color } => {
            let content = read_input(input)?;
            let result = check_latex_with_options(&content, &options);
            println!("{}", format_diagnostics(&result, !no_color));

            if result.has_errors() {
                std::process::exit(1);
            }
        }

        Commands::Find { name, input } => {
            let tree = parse_or_exit(&read_input(input)?, &options);
            for node in tree.find_all(&name, &[]) {
                match node.line_col() {
                    Some((line, column)) => println!("{}:{}: {}", line + 1, column + 1, node),
                    None => println!("?: {}", node),
                }
            }
        }

        Commands::Count { name, input } => {
            let tree = parse_or_exit(&read_input(input)?, &options);
            println!("{}", tree.count(&name, &[]));
        }

        Commands::Roundtrip { input } => {
            let content = read_input(input)?;
            let tree = parse_or_exit(&content, &options);
            let output = tree.to_string();
            if output != content {
                let at = output
                    .char_indices()
                    .zip(content.chars())
                    .find(|((_, a), b)| a != b)
                    .map(|((i, _), _)| i)
                    .unwrap_or_else(|| output.len().min(content.len()));
                let (line, column) = tree.char_offset_to_line_col(at);
                eprintln!("✗ Output differs from input at {}:{}", line + 1, column + 1);
                std::process::exit(1);
            }
            eprintln!("✓ Round trip is exact ({} bytes)", content.len());
        }

        Commands::Tree { input } => {
            let tree = parse_or_exit(&read_input(input)?, &options);
            print_outline(tree.root(), 0);
            for warning in tree.warnings() {
                eprintln!("{}", warning);
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn read_input(input: Option<String>) -> io::Result<String> {
    match input {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

#[cfg(feature = "cli")]
fn parse_or_exit(content: &str, options: &ParseOptions) -> TexTree {
    match parse_with_options(content, options) {
        Ok(tree) => tree,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "cli")]
fn print_outline(node: TexNode<'_>, depth: usize) {
    let indent = "  ".repeat(depth);
    let location = node
        .line_col()
        .map(|(line, column)| format!("{}:{}", line + 1, column + 1))
        .unwrap_or_default();
    match node.kind() {
        NodeKind::Text => {
            let text: String = node.text().unwrap_or_default().chars().take(40).collect();
            println!("{}{:?} {}", indent, text, location);
        }
        NodeKind::Command => println!("{}\\{} {}", indent, node.name(), location),
        _ => println!("{}{} {}", indent, node.name(), location),
    }
    for arg in node.args() {
        print_outline(arg, depth + 2);
    }
    let body: Vec<TexNode<'_>> = match node.kind() {
        NodeKind::Command => node.extra().collect(),
        _ => node.contents().collect(),
    };
    for child in body {
        print_outline(child, depth + 1);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cargo install texloom --features cli");
    eprintln!("  texloom [--lenient] [--skip-env NAME] <COMMAND> [INPUT_FILE]");
}
