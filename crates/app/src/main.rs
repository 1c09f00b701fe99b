use std::fmt;

use engrave_core::model::{Card, DeckId, ProgressStats};
use gateway::HttpGatewayConfig;
use services::{AppServices, Clock, ReviewOptions, Swipe};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_NATIVE_LANGUAGE: &str = "English";
const DEFAULT_LOG_FILTER: &str = "app=info,services=info,gateway=warn";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidDeckId { raw: String },
    InvalidBackend { raw: String },
    UnknownDeck { id: DeckId },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDeckId { raw } => write!(f, "invalid --deck-id value: {raw:?}"),
            ArgsError::InvalidBackend { raw } => write!(f, "invalid --backend value: {raw:?}"),
            ArgsError::UnknownDeck { id } => write!(f, "no deck with id {id}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  engrave decks  [--backend <url>]");
    eprintln!("  engrave review --deck-id <id> [--backend <url>] [--shuffle] [--requeue]");
    eprintln!("  engrave add    --deck-id <id> --word <word> [--native <language>] [--backend <url>]");
    eprintln!();
    eprintln!("During review: l = knew it, r = did not, q = quit.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ENGRAVE_BACKEND_URL, ENGRAVE_AUTH_TOKEN");
    eprintln!("  ENGRAVE_AI_API_KEY, ENGRAVE_AI_BASE_URL, ENGRAVE_AI_MODEL");
    eprintln!("  RUST_LOG (default {DEFAULT_LOG_FILTER})");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Decks,
    Review,
    Add,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "decks" => Some(Self::Decks),
            "review" => Some(Self::Review),
            "add" => Some(Self::Add),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    backend: Option<String>,
    deck_id: Option<DeckId>,
    word: Option<String>,
    native_language: Option<String>,
    options: ReviewOptions,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--backend" => {
                    let value = require_value(args, "--backend")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidBackend { raw: value });
                    }
                    parsed.backend = Some(value);
                }
                "--deck-id" => {
                    let value = require_value(args, "--deck-id")?;
                    let deck_id = value
                        .parse::<DeckId>()
                        .map_err(|_| ArgsError::InvalidDeckId { raw: value.clone() })?;
                    parsed.deck_id = Some(deck_id);
                }
                "--word" => parsed.word = Some(require_value(args, "--word")?),
                "--native" => parsed.native_language = Some(require_value(args, "--native")?),
                "--shuffle" => parsed.options.shuffle = true,
                "--requeue" => parsed.options.requeue_incorrect = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn deck_id(&self) -> Result<&DeckId, ArgsError> {
        self.deck_id
            .as_ref()
            .ok_or(ArgsError::MissingFlag { flag: "--deck-id" })
    }

    fn services(&self) -> Result<AppServices, Box<dyn std::error::Error>> {
        let clock = Clock::default();
        let services = match &self.backend {
            Some(url) => {
                let mut config = HttpGatewayConfig::new(url.clone());
                if let Some(token) = std::env::var("ENGRAVE_AUTH_TOKEN")
                    .ok()
                    .filter(|token| !token.trim().is_empty())
                {
                    config = config.with_auth_token(token);
                }
                AppServices::http(config, clock, self.options)?
            }
            None => AppServices::from_env(clock, self.options)?,
        };
        Ok(services)
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn format_stats(stats: &ProgressStats) -> String {
    format!(
        "{}% known ({} correct, {} incorrect, {} remaining)",
        stats.percentage(),
        stats.correct(),
        stats.incorrect(),
        stats.remaining()
    )
}

fn format_card(card: &Card) -> String {
    match card.highlight() {
        Some(h) => format!("{}[{}]{}", h.before, h.word, h.after),
        None => format!("{} [{}]", card.sentence(), card.target_word()),
    }
}

async fn list_decks(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let decks = services.deck_service().list_decks().await?;
    if decks.is_empty() {
        println!("No decks yet.");
    }
    for deck in decks {
        println!("{}\t{}\t{}", deck.id(), deck.name(), deck.language());
    }
    Ok(())
}

async fn add_word(
    services: &AppServices,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let deck_id = args.deck_id()?;
    let word = args
        .word
        .as_deref()
        .ok_or(ArgsError::MissingFlag { flag: "--word" })?;
    let native = args
        .native_language
        .as_deref()
        .unwrap_or(DEFAULT_NATIVE_LANGUAGE);

    let deck_service = services.deck_service();
    let decks = deck_service.list_decks().await?;
    let deck = decks
        .iter()
        .find(|deck| deck.id() == deck_id)
        .ok_or_else(|| ArgsError::UnknownDeck {
            id: deck_id.clone(),
        })?;

    for card in deck_service.add_word(deck, word, native).await? {
        println!("{}\t{}", card.id(), format_card(&card));
        println!("\t{}", card.translated_sentence());
    }
    Ok(())
}

async fn review(services: &AppServices, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let deck_id = args.deck_id()?;
    let review = services.review_loop();
    let mut session = review.start_session(deck_id).await?;
    info!(deck_id = %deck_id, cards = session.total_cards(), "review started");
    println!("{}", format_stats(&session.stats()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(card) = session.current_card() {
        println!();
        println!("{}", format_card(card));
        let translation = card.translated_sentence().to_owned();

        let swipe = loop {
            let Some(line) = lines.next_line().await? else {
                session.dismiss();
                return Ok(());
            };
            match line.trim() {
                "l" | "left" => break Swipe::Left,
                "r" | "right" => break Swipe::Right,
                "q" | "quit" => {
                    let stats = session.finish().await;
                    println!("{}", format_stats(&stats));
                    return Ok(());
                }
                _ => eprintln!("l = knew it, r = did not, q = quit"),
            }
        };

        let result = review.swipe(&mut session, swipe)?;
        println!("  {translation}");
        if result.requeued {
            println!("  (will come back later)");
        }
        println!("{}", format_stats(&result.stats));
    }

    let stats = session.finish().await;
    println!();
    println!("Pass complete: {}", format_stats(&stats));
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            ArgsError::UnknownArg(first.to_owned())
        })?,
    };

    let mut iter = argv.into_iter().skip(1);
    let args = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let services = args.services()?;
    match cmd {
        Command::Decks => list_decks(&services).await,
        Command::Review => review(&services, &args).await,
        Command::Add => add_word(&services, &args).await,
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
