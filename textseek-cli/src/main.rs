use anyhow::{Context, Result};
use clap::builder::TypedValueParser as _;
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use textseek::{
    paths, search, EventSink, MatchLine, SearchEvent, SearchRequest, SearchSession, SearchSummary,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const ALL_TEXT_TYPES: &[&str] = &["*.txt", "*.log", "*.csv", "*.xml", "*.json"];

const POLL_INTERVAL: Duration = Duration::from_millis(120);

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// String to search for
    #[arg(short = 's', long = "search", value_name = "TERM")]
    search: Option<String>,

    /// Search several terms in one run, one independent pass per term
    #[arg(short = 'b', long = "batch", value_name = "TERM", num_args = 1..)]
    batch: Vec<String>,

    /// Directory to search in (blank = current directory)
    #[arg(
        short = 'd',
        long = "dir",
        default_value = "",
        value_parser = clap::builder::OsStringValueParser::new().map(PathBuf::from)
    )]
    directory: PathBuf,

    /// File extension or glob pattern to include (e.g. txt or *.log)
    #[arg(short = 'e', long = "ext", value_name = "EXT")]
    extensions: Vec<String>,

    /// Search the common text types (*.txt, *.log, *.csv, *.xml, *.json)
    #[arg(long)]
    all_types: bool,

    /// Include subdirectories
    #[arg(short = 'R', long)]
    recursive: bool,

    /// Match case exactly
    #[arg(short = 'i', long)]
    case_sensitive: bool,

    /// Start the interactive menu
    #[arg(long)]
    interactive: bool,

    /// Write accumulated matches to a CSV file
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Emit events as JSON lines instead of console output
    #[arg(long)]
    json: bool,

    /// Configuration file to load
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cli_request = SearchRequest {
        term: cli.search.clone().unwrap_or_default(),
        patterns: gather_patterns(&cli.extensions, cli.all_types),
        directory: cli.directory.clone(),
        recursive: cli.recursive,
        case_sensitive: cli.case_sensitive,
        log_level: cli.log_level.clone(),
    };

    let request = SearchRequest::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?
        .merge_with_cli(cli_request);

    init_logging(&request.log_level);
    debug!("Merged request: {:?}", request);

    if cli.interactive || (cli.batch.is_empty() && request.term.is_empty()) {
        menu_loop(&request)
    } else if !cli.batch.is_empty() {
        run_batch(&cli.batch, &request, cli.json, cli.export.as_deref())
    } else {
        run_single(request, cli.json, cli.export.as_deref())
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Turns `-e`/`--all-types` values into glob patterns; bare extensions
/// become `*.<ext>`, anything with a wildcard passes through unchanged.
fn gather_patterns(extensions: &[String], all_types: bool) -> Vec<String> {
    let mut patterns = Vec::new();
    for ext in extensions {
        let ext = ext.trim();
        if ext.is_empty() {
            continue;
        }
        if ext.contains('*') || ext.contains('?') {
            patterns.push(ext.to_string());
        } else {
            patterns.push(format!("*.{}", ext.trim_start_matches('.')));
        }
    }
    if all_types {
        patterns.extend(ALL_TEXT_TYPES.iter().map(|p| p.to_string()));
    }
    if patterns.is_empty() {
        patterns.push("*".to_string());
    }
    patterns
}

fn run_single(request: SearchRequest, json: bool, export: Option<&Path>) -> Result<()> {
    request.validate()?;

    let mut sink = OutputSink::new(&request, json);
    let outcome = search::run(&request, &mut sink);
    let rows = sink.into_rows();

    if outcome.is_err() {
        // The sink already rendered the failure
        std::process::exit(1);
    }

    if let Some(path) = export {
        write_csv(path, &rows)
            .with_context(|| format!("Failed to export results to {}", path.display()))?;
        if !json {
            println!("Exported to: {}", path.display());
        }
    }
    Ok(())
}

fn run_batch(
    terms: &[String],
    base: &SearchRequest,
    json: bool,
    export: Option<&Path>,
) -> Result<()> {
    let mut combined = SearchSummary::new();
    let mut rows = Vec::new();

    for term in terms {
        let request = SearchRequest {
            term: term.clone(),
            ..base.clone()
        };
        request.validate()?;

        if !json {
            println!("\nSearching: '{}'", term);
        }
        let mut sink = OutputSink::new(&request, json);
        let outcome = search::run(&request, &mut sink);
        rows.extend(sink.into_rows());
        match outcome {
            Ok(summary) => combined.merge(summary),
            Err(_) => std::process::exit(1),
        }
    }

    if !json {
        println!(
            "\nBatch finished: found {} matches in {} files",
            combined.total_hits, combined.files_matched
        );
    }

    if let Some(path) = export {
        write_csv(path, &rows)
            .with_context(|| format!("Failed to export results to {}", path.display()))?;
        if !json {
            println!("Exported to: {}", path.display());
        }
    }
    Ok(())
}

/// Renders search events the way the console output has always looked:
/// a scan header, a block per matched file, and a completion line.
struct ConsoleSink {
    term: String,
    directory: PathBuf,
    patterns: Vec<String>,
    current_file: Option<PathBuf>,
    announced: bool,
    rows: Vec<MatchLine>,
}

impl ConsoleSink {
    fn new(request: &SearchRequest) -> Self {
        Self {
            term: request.term.clone(),
            directory: paths::resolve_directory(&request.directory),
            patterns: request.patterns.clone(),
            current_file: None,
            announced: false,
            rows: Vec::new(),
        }
    }

    fn close_block(&mut self) {
        if self.current_file.take().is_some() {
            println!("{}", "-".repeat(50));
        }
    }
}

impl EventSink for ConsoleSink {
    fn send(&mut self, event: SearchEvent) -> bool {
        match event {
            SearchEvent::Meta { candidates } => {
                if candidates == 0 {
                    println!(
                        "No files matching {:?} found in directory '{}'",
                        self.patterns,
                        self.directory.display()
                    );
                } else {
                    self.announced = true;
                    println!(
                        "Searching {} files in directory '{}', keyword: '{}'\n",
                        candidates,
                        self.directory.display(),
                        self.term
                    );
                }
            }
            SearchEvent::Match(m) => {
                if self.current_file.as_deref() != Some(m.file.as_path()) {
                    self.close_block();
                    println!(
                        "🔍 Match found: {}",
                        m.file.display().to_string().blue()
                    );
                    self.current_file = Some(m.file.clone());
                }
                println!(
                    "   Line {}: {}",
                    m.line_number.to_string().green(),
                    m.text.trim()
                );
                self.rows.push(m);
            }
            SearchEvent::FileError { file, message } => {
                self.close_block();
                println!(
                    "❌ Failed to process file '{}': {}",
                    file.display(),
                    message
                );
            }
            SearchEvent::Done(summary) => {
                self.close_block();
                if self.announced {
                    println!(
                        "\nSearch completed! Found '{}' in {} files",
                        self.term, summary.files_matched
                    );
                }
            }
            SearchEvent::Fatal { message } => {
                self.close_block();
                println!("❌ Search failed: {}", message);
            }
        }
        true
    }
}

/// One `serde_json` document per event per line, for machine consumers.
#[derive(Default)]
struct JsonLinesSink {
    rows: Vec<MatchLine>,
}

impl EventSink for JsonLinesSink {
    fn send(&mut self, event: SearchEvent) -> bool {
        match serde_json::to_string(&event) {
            Ok(line) => println!("{}", line),
            Err(e) => {
                eprintln!("Failed to encode event: {}", e);
                return false;
            }
        }
        if let SearchEvent::Match(m) = event {
            self.rows.push(m);
        }
        true
    }
}

enum OutputSink {
    Console(ConsoleSink),
    Json(JsonLinesSink),
}

impl OutputSink {
    fn new(request: &SearchRequest, json: bool) -> Self {
        if json {
            OutputSink::Json(JsonLinesSink::default())
        } else {
            OutputSink::Console(ConsoleSink::new(request))
        }
    }

    fn into_rows(self) -> Vec<MatchLine> {
        match self {
            OutputSink::Console(sink) => sink.rows,
            OutputSink::Json(sink) => sink.rows,
        }
    }
}

impl EventSink for OutputSink {
    fn send(&mut self, event: SearchEvent) -> bool {
        match self {
            OutputSink::Console(sink) => sink.send(event),
            OutputSink::Json(sink) => sink.send(event),
        }
    }
}

type MenuInput = io::Lines<io::StdinLock<'static>>;

fn prompt(input: &mut MenuInput, text: &str) -> Result<Option<String>> {
    print!("{}", text);
    io::stdout().flush()?;
    match input.next() {
        Some(line) => Ok(Some(line?.trim().to_string())),
        None => Ok(None),
    }
}

fn prompt_yes_no(input: &mut MenuInput, text: &str) -> Result<Option<bool>> {
    Ok(prompt(input, text)?.map(|answer| answer.eq_ignore_ascii_case("y")))
}

fn prompt_file_type(input: &mut MenuInput) -> Result<Option<Vec<String>>> {
    println!("\nPlease select file type:");
    println!("1. .txt files");
    println!("2. .log files");
    println!("3. .csv files");
    println!("4. .xml files");
    println!("5. .json files");
    println!("6. Common text types (*.txt, *.log, *.csv, *.xml, *.json)");
    println!("7. Custom wildcard (e.g. *.py, *.md)");

    let choice = match prompt(input, "Please choose (1-7): ")? {
        Some(choice) => choice,
        None => return Ok(None),
    };

    let patterns = match choice.as_str() {
        "1" => vec!["*.txt".to_string()],
        "2" => vec!["*.log".to_string()],
        "3" => vec!["*.csv".to_string()],
        "4" => vec!["*.xml".to_string()],
        "5" => vec!["*.json".to_string()],
        "6" => ALL_TEXT_TYPES.iter().map(|p| p.to_string()).collect(),
        "7" => {
            let custom = match prompt(input, "Enter file wildcard (e.g. *.py, *.md): ")? {
                Some(custom) => custom,
                None => return Ok(None),
            };
            if custom.is_empty() {
                vec!["*.txt".to_string()]
            } else {
                vec![custom]
            }
        }
        _ => {
            println!("Invalid input, using *.txt by default");
            vec!["*.txt".to_string()]
        }
    };
    Ok(Some(patterns))
}

fn menu_loop(defaults: &SearchRequest) -> Result<()> {
    let mut input = io::stdin().lines();
    loop {
        println!("\n{}", "=".repeat(50));
        println!("Text Search Tool");
        println!("{}", "=".repeat(50));
        println!("1. Single Search");
        println!("2. Batch Search Multiple Strings");
        println!("3. Exit");

        let choice = match prompt(&mut input, "Select mode (1-3): ")? {
            Some(choice) => choice,
            None => return Ok(()),
        };

        match choice.as_str() {
            "1" => single_search(&mut input, defaults)?,
            "2" => batch_search(&mut input, defaults)?,
            "3" => {
                println!("Goodbye!");
                return Ok(());
            }
            _ => println!("Invalid choice, please try again!"),
        }
    }
}

fn single_search(input: &mut MenuInput, defaults: &SearchRequest) -> Result<()> {
    println!("=== Text Search Tool (Single Search) ===");

    let term = match prompt(input, "Enter string to search: ")? {
        Some(term) => term,
        None => return Ok(()),
    };
    if term.is_empty() {
        println!("Search string cannot be empty!");
        return Ok(());
    }

    let directory = match prompt(input, "Enter directory to search (blank=current directory): ")? {
        Some(directory) => directory,
        None => return Ok(()),
    };
    let recursive = match prompt_yes_no(input, "Include subdirectories? (y/N): ")? {
        Some(recursive) => recursive,
        None => return Ok(()),
    };
    let patterns = match prompt_file_type(input)? {
        Some(patterns) => patterns,
        None => return Ok(()),
    };
    let case_sensitive = match prompt_yes_no(input, "Case sensitive? (y/N): ")? {
        Some(case_sensitive) => case_sensitive,
        None => return Ok(()),
    };

    println!("\nStarting search...");
    let request = SearchRequest {
        term,
        patterns,
        directory: PathBuf::from(directory),
        recursive,
        case_sensitive,
        log_level: defaults.log_level.clone(),
    };
    let rows = run_session(request)?;
    offer_export(input, &rows)
}

fn batch_search(input: &mut MenuInput, defaults: &SearchRequest) -> Result<()> {
    println!("=== Batch Search Mode ===");
    println!("Enter multiple search strings (separated by commas):");

    let raw = match prompt(input, "")? {
        Some(raw) => raw,
        None => return Ok(()),
    };
    let terms: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if terms.is_empty() {
        println!("Search strings cannot be empty!");
        return Ok(());
    }

    let directory = match prompt(input, "Enter directory to search (blank=current directory): ")? {
        Some(directory) => directory,
        None => return Ok(()),
    };
    let recursive = match prompt_yes_no(input, "Include subdirectories? (y/N): ")? {
        Some(recursive) => recursive,
        None => return Ok(()),
    };
    let wildcard = match prompt(input, "Enter file wildcard (default: *.txt): ")? {
        Some(wildcard) => wildcard,
        None => return Ok(()),
    };
    let pattern = if wildcard.is_empty() {
        "*.txt".to_string()
    } else {
        wildcard
    };
    let case_sensitive = match prompt_yes_no(input, "Case sensitive? (y/N): ")? {
        Some(case_sensitive) => case_sensitive,
        None => return Ok(()),
    };

    let mut rows = Vec::new();
    for term in terms {
        println!("\nSearching: '{}'", term);
        let request = SearchRequest {
            term,
            patterns: vec![pattern.clone()],
            directory: PathBuf::from(&directory),
            recursive,
            case_sensitive,
            log_level: defaults.log_level.clone(),
        };
        rows.extend(run_session(request)?);
    }
    offer_export(input, &rows)
}

/// Drives one search through the session, rendering events as they
/// arrive. Returns the accumulated match rows for a later export.
fn run_session(request: SearchRequest) -> Result<Vec<MatchLine>> {
    request.validate()?;

    let mut sink = ConsoleSink::new(&request);
    let mut session = SearchSession::new();
    if let Err(e) = session.start(request) {
        println!("{}", e);
        return Ok(Vec::new());
    }

    loop {
        let events = session.poll(256);
        if events.is_empty() {
            thread::sleep(POLL_INTERVAL);
            continue;
        }
        for event in events {
            let terminal = event.is_terminal();
            sink.send(event);
            if terminal {
                return Ok(sink.rows);
            }
        }
    }
}

fn offer_export(input: &mut MenuInput, rows: &[MatchLine]) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    let wanted = match prompt_yes_no(input, "Export results to CSV? (y/N): ")? {
        Some(wanted) => wanted,
        None => return Ok(()),
    };
    if !wanted {
        return Ok(());
    }
    let path = match prompt(input, "Enter CSV path: ")? {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => return Ok(()),
    };
    match write_csv(&path, rows) {
        Ok(()) => println!("Exported to: {}", path.display()),
        Err(e) => println!("Export failed: {}", e),
    }
    Ok(())
}

/// Writes rows as `file,line,text`; fields containing the delimiter, a
/// quote, or a newline are double-quoted with embedded quotes doubled.
fn write_csv(path: &Path, rows: &[MatchLine]) -> io::Result<()> {
    debug!("Writing {} rows to {}", rows.len(), path.display());
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(file, "file,line,text")?;
    for row in rows {
        writeln!(
            file,
            "{},{},{}",
            csv_field(&row.file.display().to_string()),
            row.line_number,
            csv_field(&row.text)
        )?;
    }
    file.flush()
}

fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
