//! sqlport — the MySQL→PostgreSQL query translation CLI.
//!
//! # Usage
//!
//! ```bash
//! # Translate one query
//! sqlport "SELECT * FROM members WHERE firstname = ? LIMIT 10, 20"
//!
//! # With schema hints
//! sqlport "SELECT * FROM users WHERE is_active = 1" --context hints.toml
//!
//! # Preview a whole file, then write it (original saved to <file>.orig)
//! sqlport --file queries.sql --diff
//! sqlport --file queries.sql --write
//! ```

use anyhow::Context as _;
use clap::Parser;
use colored::Colorize;
use sqlport::prelude::*;

#[derive(Parser)]
#[command(name = "sqlport")]
#[command(version)]
#[command(about = "Translate MySQL query text into PostgreSQL query text", long_about = None)]
#[command(after_help = "EXAMPLES:
    sqlport 'SELECT IFNULL(email, \"none\") FROM members WHERE id = ?'
    sqlport 'SELECT * FROM users WHERE is_active = 1' --context hints.toml --diff
    sqlport --file queries.sql --write")]
struct Cli {
    /// The query to translate
    query: Option<String>,

    /// Translate every statement in a SQL file instead
    #[arg(short, long, conflicts_with = "query")]
    file: Option<std::path::PathBuf>,

    /// TOML file with boolean columns and conflict-key hints
    #[arg(short, long, env = "SQLPORT_CONTEXT")]
    context: Option<std::path::PathBuf>,

    /// Show the audit view (which rules fired, before/after)
    #[arg(short, long)]
    diff: bool,

    /// Emit JSON instead of plain text
    #[arg(short, long)]
    json: bool,

    /// With --file: save the original to <file>.orig and rewrite in place
    #[arg(short, long, requires = "file")]
    write: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("{} {e:#}", "Error:".red().bold());
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let context = match &cli.context {
        Some(path) => TranslationContext::from_toml_file(path)
            .with_context(|| format!("loading context from {}", path.display()))?,
        None => TranslationContext::default(),
    };
    let translator = Translator::new(context);

    if let Some(path) = &cli.file {
        return run_file(cli, &translator, path);
    }
    let Some(query) = &cli.query else {
        println!("Usage: sqlport <QUERY> [OPTIONS]");
        println!();
        println!("Try: sqlport --help");
        return Ok(());
    };

    let result = translator.translate(query)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result.audit(query))?);
    } else if cli.diff {
        print!("{}", result.audit(query).render());
    } else {
        println!("{}", result.rewritten_query);
    }
    Ok(())
}

fn run_file(cli: &Cli, translator: &Translator, path: &std::path::Path) -> anyhow::Result<()> {
    let report = if cli.write {
        translator.translate_file(path)?
    } else {
        let sql = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        translator.translate_sql(&sql)?
    };

    if cli.json {
        let audits: Vec<_> = report
            .statements
            .iter()
            .map(|s| match &s.result {
                Ok(r) => serde_json::json!(r.audit(&s.original)),
                Err(e) => serde_json::json!({ "original": s.original, "error": e.to_string() }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&audits)?);
        return Ok(());
    }

    if cli.diff {
        for s in &report.statements {
            match &s.result {
                Ok(r) => print!("{}", r.audit(&s.original).render()),
                Err(e) => println!("{} {} {}", "Skipped:".red().bold(), s.original.yellow(), e),
            }
            println!();
        }
    } else {
        print!("{}", report.rewritten);
    }

    let failed = report.failures().count();
    let total = report.statements.len();
    if cli.write {
        println!(
            "{} {} of {} statements translated, original saved to {}.orig",
            "✓".green(),
            total - failed,
            total,
            path.display()
        );
    }
    if failed > 0 {
        eprintln!(
            "{} {failed} statement(s) left untranslated",
            "⚠".yellow()
        );
    }
    Ok(())
}
