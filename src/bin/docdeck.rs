//! Command-line front end for the summarization pipeline.
//!
//! ```text
//! docdeck report.pdf --cards 6 --style plain
//! cat notes.txt | docdeck - --cards 4
//! ```

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use docdeck::{
    summarize, summarize_text, CardCount, DeckConfig, FileSummaryStore, Language, SummaryResult,
    SummaryStore, SummaryStyle, Tone,
};

#[derive(Parser, Debug)]
#[command(
    name = "docdeck",
    version,
    about = "Summarize documents into card decks via a completion endpoint",
    long_about = "Summarize PDF, DOCX, or text documents into a fixed-size deck of cards.\n\
                  Pass '-' as the input to read plain text from stdin."
)]
struct Cli {
    /// Document to summarize (pdf, docx, txt), or '-' for stdin text.
    input: String,

    /// Cards per deck.
    #[arg(long, default_value_t = 6, value_parser = parse_card_count)]
    cards: usize,

    /// Output style: plain, dialogue, or illustrated.
    #[arg(long, default_value = "plain", value_parser = parse_style)]
    style: SummaryStyle,

    /// Output language: english, spanish, french, german, or japanese.
    #[arg(long, default_value = "english", value_parser = parse_language)]
    language: Language,

    /// Tone: neutral, friendly, professional, or playful.
    #[arg(long, default_value = "neutral", value_parser = parse_tone)]
    tone: Tone,

    /// Model identifier.
    #[arg(long)]
    model: Option<String>,

    /// Endpoint base URL (for proxies and compatible servers).
    #[arg(long)]
    base_url: Option<String>,

    /// API key. Falls back to the ANTHROPIC_API_KEY environment variable.
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Maximum output tokens for the completion call.
    #[arg(long)]
    max_tokens: Option<usize>,

    /// Character budget for the document prefix sent to the model.
    #[arg(long)]
    char_budget: Option<usize>,

    /// Append the result to a JSON history file.
    #[arg(long)]
    history: Option<PathBuf>,

    /// Print the result as JSON instead of formatted cards.
    #[arg(long)]
    json: bool,

    /// Verbose logging (debug level).
    #[arg(short, long)]
    verbose: bool,

    /// Suppress everything except the result and errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn parse_card_count(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    match CardCount::from_usize(n) {
        Some(_) => Ok(n),
        None => Err("deck size must be 4, 6, or 8".to_string()),
    }
}

fn parse_style(s: &str) -> Result<SummaryStyle, String> {
    match s {
        "plain" => Ok(SummaryStyle::Plain),
        "dialogue" => Ok(SummaryStyle::Dialogue),
        "illustrated" => Ok(SummaryStyle::Illustrated),
        other => Err(format!("unknown style '{other}'")),
    }
}

fn parse_language(s: &str) -> Result<Language, String> {
    match s {
        "english" => Ok(Language::English),
        "spanish" => Ok(Language::Spanish),
        "french" => Ok(Language::French),
        "german" => Ok(Language::German),
        "japanese" => Ok(Language::Japanese),
        other => Err(format!("unknown language '{other}'")),
    }
}

fn parse_tone(s: &str) -> Result<Tone, String> {
    match s {
        "neutral" => Ok(Tone::Neutral),
        "friendly" => Ok(Tone::Friendly),
        "professional" => Ok(Tone::Professional),
        "playful" => Ok(Tone::Playful),
        other => Err(format!("unknown tone '{other}'")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let api_key = match &cli.api_key {
        Some(key) => key.clone(),
        None => bail!("no API key: pass --api-key or set ANTHROPIC_API_KEY"),
    };

    let mut builder = DeckConfig::builder()
        .api_key(api_key)
        .card_count(CardCount::from_usize(cli.cards).unwrap_or_default())
        .style(cli.style)
        .language(cli.language)
        .tone(cli.tone);
    if let Some(model) = &cli.model {
        builder = builder.model(model);
    }
    if let Some(base_url) = &cli.base_url {
        builder = builder.base_url(base_url);
    }
    if let Some(max_tokens) = cli.max_tokens {
        builder = builder.max_output_tokens(max_tokens);
    }
    if let Some(budget) = cli.char_budget {
        builder = builder.input_char_budget(budget);
    }
    let config = builder.build().context("invalid configuration")?;

    let result = if cli.input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading stdin")?;
        summarize_text(&text, &config).await
    } else {
        summarize(&cli.input, &config).await
    };

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            eprintln!("{} {}", red("error:"), e.user_message());
            eprintln!("{}", dim(&format!("  detail: {e}")));
            std::process::exit(1);
        }
    };

    if let Some(path) = &cli.history {
        FileSummaryStore::new(path)
            .save(&result)
            .with_context(|| format!("saving history to '{}'", path.display()))?;
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_deck(&result, cli.quiet);
    }
    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if verbose {
        "docdeck=debug"
    } else if quiet {
        "docdeck=error"
    } else {
        "docdeck=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_deck(result: &SummaryResult, quiet: bool) {
    if !quiet {
        println!(
            "{} {} ({} cards, {} tokens)\n",
            bold("Summary of"),
            cyan(&result.document.file_name),
            result.cards.len(),
            result.usage.total()
        );
    }
    for card in &result.cards {
        println!("{} {}", bold(&format!("{}.", card.number)), green(&card.title));
        println!("{}", card.body);
        if let Some(hint) = &card.illustration {
            println!("{}", dim(&format!("  illustration: {hint}")));
        }
        println!();
    }
}

fn color(code: &str, text: &str) -> String {
    format!("\x1b[{code}m{text}\x1b[0m")
}
fn bold(text: &str) -> String {
    color("1", text)
}
fn dim(text: &str) -> String {
    color("2", text)
}
fn red(text: &str) -> String {
    color("31", text)
}
fn green(text: &str) -> String {
    color("32", text)
}
fn cyan(text: &str) -> String {
    color("36", text)
}
