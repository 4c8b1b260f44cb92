// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use voter_lookup::{
    filter, gender_stats, plan_batch, suggest, to_international, ApiClient, BulkNotifier,
    ClientConfig, PageSizeChoice, Pager, RecordSource, VoterRecord, PAGE_SIZE_MENU,
};

#[derive(Parser)]
#[command(name = "voter-lookup", version, about = "Search, edit and notify voter records")]
struct Cli {
    #[command(flatten)]
    config: ClientConfig,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive terminal UI (default)
    Tui,

    /// Print one page of matches for a query
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        #[arg(long, default_value_t = 1)]
        page: usize,

        /// 50, 100, 200, 500 or "all"
        #[arg(long, default_value = "100", value_parser = parse_page_size)]
        page_size: PageSizeChoice,
    },

    /// Print autocomplete candidates for partial input
    Suggest {
        #[arg(required = true, num_args = 1..)]
        input: Vec<String>,
    },

    /// Send the detail message to every match with a valid mobile number
    Notify {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Only list who would be messaged
        #[arg(long)]
        dry_run: bool,
    },

    /// Gender counts over the full record set
    Stats,
}

fn parse_page_size(raw: &str) -> Result<PageSizeChoice, String> {
    let choice = if raw.eq_ignore_ascii_case("all") {
        PageSizeChoice::All
    } else {
        let size: usize = raw.parse().map_err(|_| format!("not a page size: {}", raw))?;
        PageSizeChoice::Fixed(size)
    };

    if PAGE_SIZE_MENU.contains(&choice) {
        Ok(choice)
    } else {
        Err("page size must be one of 50, 100, 200, 500, all".to_string())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => run_ui_mode(&cli.config, &runtime),
        command => {
            init_stderr_logging();
            runtime.block_on(run_command(command, &cli.config))
        }
    }
}

// ============================================================================
// LOGGING
// ============================================================================

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// The terminal belongs to the UI, so logs go to a file
#[cfg_attr(not(feature = "tui"), allow(dead_code))]
fn init_file_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

// ============================================================================
// CLI SUBCOMMANDS
// ============================================================================

async fn run_command(command: Command, config: &ClientConfig) -> Result<()> {
    let client = ApiClient::new(config)?;
    let records = client
        .fetch_records()
        .await
        .map_err(|e| anyhow::anyhow!("{} ({})", e.user_message(), e))?;

    match command {
        Command::Tui => bail!("the interactive UI is not a batch command"),
        Command::Search {
            query,
            page,
            page_size,
        } => print_search(&records, &query.join(" "), page, page_size),
        Command::Suggest { input } => {
            let suggestions = suggest(&records, &input.join(" "));
            if suggestions.is_empty() {
                println!("कोणत्याही सूचना नाहीत");
            }
            for s in suggestions {
                println!("💡 {}  {}  {}", s.search_text, s.voter_card_id, s.mobile_number);
            }
        }
        Command::Notify { query, dry_run } => {
            let query = query.join(" ");
            let matches = filter(&records, &query);
            let batch = plan_batch(matches.iter().copied());

            println!(
                "📣 {} जुळले, {} पाठवणार, {} वगळले",
                matches.len(),
                batch.jobs.len(),
                batch.skipped
            );

            if dry_run {
                for job in &batch.jobs {
                    let to = to_international(&job.mobile).unwrap_or_else(|_| job.mobile.clone());
                    println!("  → #{} {}", job.record_id, to);
                }
                return Ok(());
            }

            if batch.is_empty() {
                return Ok(());
            }
            if !client.has_credentials() {
                bail!("messaging credentials are not configured (WHATSAPP_PHONE_NUMBER_ID / WHATSAPP_API_KEY)");
            }

            let notifier = BulkNotifier::new(config.notify_pause());
            let progress = notifier
                .run(&client, batch, |p| {
                    println!("  {}/{} ✓{} ✗{}", p.attempted, p.total, p.succeeded, p.failed)
                })
                .await;

            println!(
                "✅ पूर्ण: {} यशस्वी, {} अयशस्वी, {} वगळले",
                progress.succeeded, progress.failed, progress.skipped
            );
        }
        Command::Stats => {
            let stats = gender_stats(&records);
            println!("🗳️  एकूण मतदार: {}", stats.total);
            println!("   पुरुष: {}", stats.males);
            println!("   स्त्री: {}", stats.females);
        }
    }

    Ok(())
}

fn print_search(records: &[VoterRecord], query: &str, page: usize, size: PageSizeChoice) {
    let matches = filter(records, query);

    let mut pager = Pager::new();
    pager.select_size(size, matches.len());
    if page != 1 && !pager.go_to(page, matches.len()) {
        warn!(page, total_pages = pager.total_pages(matches.len()), "page out of range, showing page 1");
    }

    for record in pager.slice(&matches) {
        println!(
            "{:>5}  {:<28} {:<28} {:<6} {:>3}  {:<12} {}",
            record.serial_number,
            record.name_latin,
            record.name_local,
            record.gender_label(),
            record.age,
            record.voter_card_id,
            record.mobile_number
        );
    }

    match pager.window(matches.len()) {
        Some((first, last)) => println!(
            "\n{}-{} / {} (पृष्ठ {}/{})",
            first,
            last,
            matches.len(),
            pager.page(),
            pager.total_pages(matches.len())
        ),
        None => println!("कोणतेही परिणाम आढळले नाहीत"),
    }
}

// ============================================================================
// INTERACTIVE MODE
// ============================================================================

#[cfg(feature = "tui")]
fn run_ui_mode(config: &ClientConfig, runtime: &tokio::runtime::Runtime) -> Result<()> {
    use std::sync::Arc;
    use voter_lookup::{Session, SessionOptions};

    init_file_logging(&config.log_file)?;

    let client = Arc::new(ApiClient::new(config)?);
    let options = SessionOptions {
        auto_notify: !config.no_auto_notify,
        debounce: config.notify_debounce(),
        can_notify: client.has_credentials(),
    };

    let mut app = ui::App::new(Session::new(options));
    ui::run_ui(
        &mut app,
        client,
        BulkNotifier::new(config.notify_pause()),
        runtime.handle().clone(),
    )
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &ClientConfig, _runtime: &tokio::runtime::Runtime) -> Result<()> {
    bail!("TUI mode not available; rebuild with `--features tui` or use a subcommand")
}
