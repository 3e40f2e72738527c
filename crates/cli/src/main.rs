// ABOUTME: lscraper command-line tool: extract records from HTML pages by XPath, named pattern or table.
// ABOUTME: Wires flags into a lazyscrape Job, installs tracing to stderr and writes CSV/JSON output.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use lazyscrape::{
    write_dataset, DirCache, FieldList, Job, Method, Mode, OutputFormat, PageRange, Pagination,
    Pattern, Scope, Scraper, StopReason, XPath,
};
use tracing::warn;

/// Exit status when pagination stopped at the safety page limit.
const EXIT_SAFETY_LIMIT: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "lscraper", version)]
#[command(about = "Extract structured records from HTML pages as CSV or JSON")]
struct Cli {
    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,

    /// User-Agent header (default: lscraper/<version>)
    #[arg(long, global = true)]
    user_agent: Option<String>,

    /// Extra request header, "Name: value" (repeatable)
    #[arg(short = 'H', long = "header", global = true)]
    headers: Vec<String>,

    /// Accept invalid TLS certificates
    #[arg(long, global = true)]
    insecure: bool,

    /// Cache fetched pages in this directory
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Cache entry lifetime in seconds (0 keeps entries forever)
    #[arg(long, global = true, default_value_t = 3600)]
    cache_ttl: u64,

    /// Hard cap on pages fetched by one paginated run
    #[arg(long, global = true, default_value_t = 1000)]
    max_pages: usize,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract elements matched by an XPath expression
    Extract(ExtractArgs),
    /// Extract with a named pattern
    Use(UseArgs),
    /// Extract the rows of an HTML table
    Gettable(TableArgs),
    /// List available patterns
    Patterns,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output format: text, csv or json
    #[arg(long, default_value = "text")]
    format: String,

    /// Output file path (default: stdout)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PageArgs {
    /// Request parameter carrying the page index
    #[arg(long, requires = "pagerange")]
    pagekey: Option<String>,

    /// Page range as start,end,step[,pagesize]; -1 means unbounded
    #[arg(long, requires = "pagekey", allow_hyphen_values = true)]
    pagerange: Option<String>,
}

#[derive(Args, Debug)]
struct ScopeArgs {
    /// Restrict to elements with this id
    #[arg(long)]
    nodeid: Option<String>,

    /// Restrict to elements with this class (wins over --nodeid)
    #[arg(long)]
    nodeclass: Option<String>,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// URL to fetch
    #[arg(long)]
    url: String,

    /// XPath selecting the elements to extract
    #[arg(long, default_value = "//a")]
    xpath: String,

    /// Comma-separated field names (default: _tag,class,id,_text)
    #[arg(long)]
    fieldnames: Option<String>,

    /// Resolve relative href/src/srcset values against the page URL
    #[arg(long)]
    absolutize: bool,

    /// Send requests as POST
    #[arg(long)]
    post: bool,

    #[command(flatten)]
    pages: PageArgs,

    #[command(flatten)]
    out: OutputArgs,
}

#[derive(Args, Debug)]
struct UseArgs {
    /// URL to fetch
    #[arg(long)]
    url: String,

    /// Pattern name (see `lscraper patterns`)
    #[arg(long, default_value = "simpleul")]
    pattern: String,

    #[command(flatten)]
    scope: ScopeArgs,

    /// Comma-separated field names (default: the pattern's own)
    #[arg(long)]
    fieldnames: Option<String>,

    /// Resolve relative href/src/srcset values against the page URL
    #[arg(long)]
    absolutize: bool,

    #[command(flatten)]
    pages: PageArgs,

    #[command(flatten)]
    out: OutputArgs,
}

#[derive(Args, Debug)]
struct TableArgs {
    /// URL to fetch
    #[arg(long)]
    url: String,

    #[command(flatten)]
    scope: ScopeArgs,

    /// Comma-separated column names written as a header row
    #[arg(long)]
    fieldnames: Option<String>,

    #[command(flatten)]
    pages: PageArgs,

    #[command(flatten)]
    out: OutputArgs,
}

fn init_tracing(quiet: bool) {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let fmt_layer = fmt::layer().with_target(false).with_writer(io::stderr);
    let builder = tracing_subscriber::registry().with(filter);

    match std::env::var("LSCRAPER_LOG_FORMAT").as_deref() {
        Ok("json") => {
            let _ = builder.with(fmt_layer.json().flatten_event(true)).try_init();
        }
        _ => {
            let _ = builder.with(fmt_layer.compact()).try_init();
        }
    }
}

fn parse_header(raw: &str) -> Result<(String, String)> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => bail!("invalid header {raw:?}, expected \"Name: value\""),
    }
}

fn build_scraper(cli: &Cli) -> Result<Scraper> {
    let mut builder = Scraper::builder()
        .timeout(Duration::from_secs(cli.timeout))
        .insecure(cli.insecure)
        .max_pages(cli.max_pages);
    if let Some(agent) = &cli.user_agent {
        builder = builder.user_agent(agent);
    }
    for raw in &cli.headers {
        let (name, value) = parse_header(raw)?;
        builder = builder.header(name, value);
    }
    if let Some(dir) = &cli.cache_dir {
        let ttl = (cli.cache_ttl > 0).then(|| Duration::from_secs(cli.cache_ttl));
        let cache = DirCache::open(dir, ttl)
            .with_context(|| format!("failed to open cache directory {}", dir.display()))?;
        builder = builder.cache(cache);
    }
    builder.build().context("failed to build HTTP client")
}

fn pagination(args: &PageArgs) -> Result<Option<Pagination>> {
    match (&args.pagekey, &args.pagerange) {
        (Some(key), Some(range)) => {
            let range = PageRange::parse(range)?;
            Ok(Some(Pagination::new(key.clone(), range)))
        }
        (None, None) => Ok(None),
        _ => bail!("--pagekey and --pagerange must be given together"),
    }
}

fn scope(args: &ScopeArgs) -> Scope {
    Scope::new(args.nodeclass.clone(), args.nodeid.clone())
}

fn apply_common(
    mut job: Job,
    fieldnames: Option<&str>,
    pages: Option<Pagination>,
) -> Job {
    if let Some(names) = fieldnames {
        job = job.fields(FieldList::parse(names));
    }
    if let Some(pages) = pages {
        job = job.paginate(pages);
    }
    job
}

fn run_job(scraper: &Scraper, job: &Job, out: &OutputArgs) -> Result<ExitCode> {
    let requested: OutputFormat = out.format.parse()?;
    let outcome = scraper
        .run(job)
        .with_context(|| format!("extraction from {} failed", job.url))?;
    let format = requested.resolve(outcome.json_only);

    match &out.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            write_dataset(&mut writer, &outcome.data, outcome.fields.as_ref(), format)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write_dataset(&mut lock, &outcome.data, outcome.fields.as_ref(), format)?;
            lock.flush()?;
        }
    }

    if outcome.stop == Some(StopReason::SafetyLimit) {
        warn!(
            pages = outcome.pages,
            "output is incomplete: pagination hit --max-pages"
        );
        return Ok(ExitCode::from(EXIT_SAFETY_LIMIT));
    }
    Ok(ExitCode::SUCCESS)
}

fn list_patterns() -> ExitCode {
    for pattern in Pattern::ALL {
        let fields = pattern
            .default_fields()
            .map(|f| f.to_string())
            .unwrap_or_else(|| "-".to_string());
        let shape = if pattern.json_only() { "json only" } else { "records" };
        println!(
            "{:<10} {:<15} {:<12} {:<10} {}",
            pattern.name(),
            pattern.alias(),
            fields,
            shape,
            pattern.description()
        );
    }
    ExitCode::SUCCESS
}

fn run(cli: Cli) -> Result<ExitCode> {
    match &cli.command {
        Command::Patterns => Ok(list_patterns()),
        Command::Extract(args) => {
            let xpath = XPath::parse(&args.xpath)
                .with_context(|| format!("invalid --xpath {:?}", args.xpath))?;
            let method = if args.post { Method::Post } else { Method::Get };
            let job = Job::new(&args.url, Mode::XPath(xpath))?
                .method(method)
                .absolutize(args.absolutize);
            let job = apply_common(job, args.fieldnames.as_deref(), pagination(&args.pages)?);
            run_job(&build_scraper(&cli)?, &job, &args.out)
        }
        Command::Use(args) => {
            let pattern = Pattern::lookup(&args.pattern)?;
            let job = Job::new(&args.url, Mode::Pattern(pattern))?
                .scope(scope(&args.scope))
                .absolutize(args.absolutize);
            let job = apply_common(job, args.fieldnames.as_deref(), pagination(&args.pages)?);
            run_job(&build_scraper(&cli)?, &job, &args.out)
        }
        Command::Gettable(args) => {
            let job = Job::new(&args.url, Mode::Table)?.scope(scope(&args.scope));
            let job = apply_common(job, args.fieldnames.as_deref(), pagination(&args.pages)?);
            run_job(&build_scraper(&cli)?, &job, &args.out)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(1)
        }
    }
}
