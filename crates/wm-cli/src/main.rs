//! WebMask CLI
//!
//! Developer tool for checking rule sets outside the browser: which rule a URL
//! selects, what mask a set of boxes produces, and what a substitution
//! expression does to a string.

use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use wm_compiler::{parse_rules_json, validate_rules, ParsedRules};
use wm_core::substitution::compile_expression;
use wm_core::types::{ScrollOffset, ViewportRect};
use wm_core::{build_mask, BackdropFilter, DocumentSize, Matcher, Rect, Rule};

#[derive(Parser)]
#[command(name = "wm-cli")]
#[command(about = "WebMask rule set tools")]
struct Cli {
    /// Debug logging (RUST_LOG overrides the level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank the rules that match a URL
    Match {
        /// Rules JSON: a `{"sites": [...]}` export or a bare list
        #[arg(short, long)]
        rules: String,

        /// Page URL
        #[arg(short, long)]
        url: String,
    },

    /// Build the clip mask for a set of revealed boxes
    Mask {
        /// Revealed box as `left,top,width,height` (repeatable)
        #[arg(short, long = "rect")]
        rects: Vec<String>,

        /// Document width
        #[arg(long, default_value_t = 1280.0)]
        width: f64,

        /// Document height
        #[arg(long, default_value_t = 720.0)]
        height: f64,

        /// Frosted level, 0-20
        #[arg(long, default_value_t = 10)]
        frosted: i32,

        /// Desaturate level, 0-20
        #[arg(long, default_value_t = 0)]
        desaturate: i32,
    },

    /// Apply a `/pattern/replacement/flags` expression
    Subst {
        /// Expression
        #[arg(short, long)]
        expr: String,

        /// Text to rewrite
        #[arg(short, long)]
        input: String,

        /// Flags used when the expression carries none
        #[arg(long, default_value = "")]
        default_flags: String,
    },

    /// Report malformed patterns, expressions and levels
    Validate {
        /// Rules JSON
        #[arg(short, long)]
        rules: String,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Match { rules, url } => cmd_match(&rules, &url),
        Commands::Mask {
            rects,
            width,
            height,
            frosted,
            desaturate,
        } => cmd_mask(&rects, width, height, frosted, desaturate),
        Commands::Subst {
            expr,
            input,
            default_flags,
        } => cmd_subst(&expr, &input, &default_flags),
        Commands::Validate { rules } => cmd_validate(&rules),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn load_rules(path: &str) -> Result<ParsedRules, String> {
    let content = fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    parse_rules_json(&content, now_ms()).map_err(|e| format!("Invalid rules '{}': {}", path, e))
}

fn cmd_match(path: &str, url: &str) -> Result<(), String> {
    let parsed = load_rules(path)?;
    let mut matcher = Matcher::new();
    let candidates = matcher.candidates(&parsed.rules, url);

    if candidates.is_empty() {
        println!("No rule matches {}", url);
        return Ok(());
    }

    println!("{} of {} rules match {}", candidates.len(), parsed.rules.len(), url);
    for (rank, candidate) in candidates.iter().enumerate() {
        let rule = &parsed.rules[candidate.index];
        let marker = if rank == 0 { "*" } else { " " };
        println!(
            "  {} {:>5}  {:<28} {}",
            marker, candidate.score, rule.id, rule.url_pattern
        );
    }

    Ok(())
}

fn parse_rect(raw: &str) -> Result<Rect, String> {
    let parts: Vec<f64> = raw
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("Invalid rect '{}': {}", raw, e))?;
    let [left, top, width, height] = parts[..] else {
        return Err(format!("Invalid rect '{}': expected left,top,width,height", raw));
    };
    Ok(Rect::from_viewport(
        ViewportRect {
            left,
            top,
            width,
            height,
        },
        ScrollOffset::default(),
    ))
}

fn cmd_mask(raw_rects: &[String], width: f64, height: f64, frosted: i32, desaturate: i32) -> Result<(), String> {
    let rects = raw_rects
        .iter()
        .map(|r| parse_rect(r))
        .collect::<Result<Vec<_>, _>>()?;

    let mut rule = Rule::new("cli", "*");
    rule.frosted_level = frosted;
    rule.desaturate_level = desaturate;

    let mask = build_mask(&rects, DocumentSize::new(width, height));
    println!("Holes:     {}", mask.holes.len());
    println!("Path:      {}", mask.path);
    println!("Clip path: {}", mask.css_clip_path());
    println!("Filter:    {}", BackdropFilter::for_rule(&rule));
    if mask.is_opaque() {
        println!("(no holes: the page would get the opaque fallback)");
    }

    Ok(())
}

fn cmd_subst(expr: &str, input: &str, default_flags: &str) -> Result<(), String> {
    let compiled = compile_expression(expr, default_flags)
        .ok_or_else(|| format!("Expression '{}' is malformed or does not compile", expr))?;
    println!("{}", compiled.apply(input));
    Ok(())
}

fn cmd_validate(path: &str) -> Result<(), String> {
    let parsed = load_rules(path)?;

    println!("Rules '{}'", path);
    println!("  Records:       {}", parsed.records);
    println!("  Rules:         {}", parsed.rules.len());
    println!("  Skipped:       {}", parsed.skipped);
    println!("  Upgraded:      {}", parsed.upgraded);
    println!("  Generated ids: {}", parsed.generated_ids);
    println!("  Duplicate ids: {}", parsed.duplicate_ids);

    let diagnostics = validate_rules(&parsed.rules);
    if diagnostics.is_empty() {
        println!("No problems found");
        return Ok(());
    }

    println!();
    for diagnostic in &diagnostics {
        println!("  {}", diagnostic);
    }
    Err(format!("{} problem(s) found", diagnostics.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rect_argument() {
        let rect = parse_rect("10, 20, 30, 40").unwrap();
        assert_eq!(rect, Rect::new(10.0, 20.0, 40.0, 60.0));
    }

    #[test]
    fn rejects_short_rect_argument() {
        assert!(parse_rect("10,20,30").is_err());
        assert!(parse_rect("a,b,c,d").is_err());
    }
}
