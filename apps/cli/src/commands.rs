//! CLI command definitions, routing, and tracing setup.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docsite_core::progress::{ProgressReporter, SilentProgress};
use docsite_core::site::RenderOptions;
use docsite_core::{concat, extract, index, site, toc};
use docsite_fragment::ExtractOptions;
use docsite_search::{HttpSearchClient, PollSchedule, SearchCheck, wait_until_ready};
use docsite_shared::{AppConfig, init_config, load_config};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docsite: publish Doxygen output as a navigable, searchable site.
#[derive(Parser)]
#[command(
    name = "docsite",
    version,
    about = "Convert, render, index and concatenate Doxygen documentation.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ./docsite.toml, then ~/.docsite/docsite.toml).
    #[arg(short, long, global = true, env = "DOCSITE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Convert a Doxygen TOC XML file to toc.json.
    Toc {
        /// TOC XML file.
        input: PathBuf,

        /// Output file (defaults to the input with a .json extension).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Apply the configured subtree relocation.
        #[arg(long)]
        relocate: bool,
    },

    /// Extract header and contents of every page into .part.html fragments.
    Extract {
        /// Directory with the Doxygen HTML pages.
        source: PathBuf,

        /// Directory receiving the fragments.
        dest: PathBuf,
    },

    /// Render the site from fragments, templates and toc.json.
    Render {
        /// Directory with fragments, other HTML, and toc.json.
        source: PathBuf,

        /// Output directory.
        #[arg(default_value = "out")]
        out: PathBuf,

        /// One context per top-level TOC entry.
        #[arg(long)]
        split_top_level: bool,

        /// Directory holding the resource sets.
        #[arg(long, default_value = "resources")]
        resources: PathBuf,

        /// Resource set overriding `default`.
        #[arg(long, default_value = site::DEFAULT_RESOURCE_DIR)]
        resource_dir: String,
    },

    /// Upload the rendered pages to a search domain.
    Upload {
        /// Search domain name, as configured under [[search.domains]].
        domain: String,

        /// Directory with the rendered HTML and toc.json.
        #[arg(short, long, default_value = "out")]
        source: PathBuf,

        /// Build the batch but do not upload it.
        #[arg(long)]
        dry: bool,

        /// Do not ask for confirmation.
        #[arg(short, long)]
        yes: bool,
    },

    /// Concatenate the fragments in TOC order to stdout, for PDF output.
    Concat {
        /// toc.json to follow.
        toc: PathBuf,

        /// Directory with the .part.html fragments.
        html_dir: PathBuf,

        /// Only these subtrees, e.g. "Build Apps > Concepts" (repeatable).
        #[arg(short, long = "path")]
        paths: Vec<String>,
    },

    /// Wait until a search domain answers, then check its responses.
    WaitEndpoint {
        /// Search domain name.
        domain: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docsite=info",
        1 => "docsite=debug",
        _ => "docsite=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    if let Command::Config { action } = &cli.command {
        return match action {
            ConfigAction::Init => cmd_config_init(config_path),
            ConfigAction::Show => cmd_config_show(config_path),
        };
    }

    let config = load_config(config_path)?;
    let verbose = cli.verbose > 0;

    match cli.command {
        Command::Toc {
            input,
            output,
            relocate,
        } => cmd_toc(&config, &input, output, relocate),
        Command::Extract { source, dest } => cmd_extract(&config, &source, &dest, verbose),
        Command::Render {
            source,
            out,
            split_top_level,
            resources,
            resource_dir,
        } => {
            let opts = RenderOptions {
                source_dir: source,
                out_dir: out,
                resources,
                resource_dir,
                split_top_level,
            };
            cmd_render(&config, &opts, verbose)
        }
        Command::Upload {
            domain,
            source,
            dry,
            yes,
        } => cmd_upload(&config, &domain, &source, dry, yes, verbose).await,
        Command::Concat {
            toc,
            html_dir,
            paths,
        } => cmd_concat(&toc, &html_dir, &paths),
        Command::WaitEndpoint { domain } => cmd_wait_endpoint(&config, &domain).await,
        Command::Config { .. } => Ok(()),
    }
}

/// Progress for a loop: a spinner normally, log lines only when verbose.
fn reporter(verbose: bool) -> Box<dyn ProgressReporter> {
    if verbose {
        Box::new(SilentProgress)
    } else {
        Box::new(CliProgress::new())
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_toc(config: &AppConfig, input: &Path, output: Option<PathBuf>, relocate: bool) -> Result<()> {
    let xml = std::fs::read_to_string(input)
        .map_err(|e| eyre!("cannot read '{}': {e}", input.display()))?;
    let doc = toc::convert(&xml, relocate.then_some(&config.toc.relocation))?;

    let output = output.unwrap_or_else(|| input.with_extension("json"));
    toc::write_toc(&output, &doc)?;

    info!(input = %input.display(), output = %output.display(), relocate, "toc converted");
    println!("Wrote {}", output.display());
    Ok(())
}

fn cmd_extract(config: &AppConfig, source: &Path, dest: &Path, verbose: bool) -> Result<()> {
    let opts = ExtractOptions::from_config(&config.extract, &config.site)?;
    let progress = reporter(verbose);
    let summary = extract::extract_dir(source, dest, &opts, progress.as_ref())?;

    println!();
    println!("  Fragments: {}", summary.written);
    println!("  Untitled:  {}", summary.untitled);
    println!("  Output:    {}", dest.display());
    println!();
    Ok(())
}

fn cmd_render(config: &AppConfig, opts: &RenderOptions, verbose: bool) -> Result<()> {
    let progress = reporter(verbose);
    let summary = site::render_site(opts, &config.site, progress.as_ref())?;

    println!();
    println!("  Pages:        {}", summary.pages);
    println!("  Templated:    {}", summary.templated);
    println!("  TOC files:    {}", summary.toc_files);
    println!("  Static files: {}", summary.static_files);
    println!("  Output:       {}", opts.out_dir.display());
    println!();
    Ok(())
}

async fn cmd_upload(
    config: &AppConfig,
    domain: &str,
    html_dir: &Path,
    dry: bool,
    yes: bool,
    verbose: bool,
) -> Result<()> {
    let domain_cfg = config.search.domain(domain)?;
    let client = HttpSearchClient::new(domain_cfg, config.search.timeout_secs)?;
    info!(domain, html_dir = %html_dir.display(), dry, "uploading search documents");

    let versions = index::check_versions(&client, html_dir, &config.search.version_page).await?;
    println!(
        "Domain '{domain}' currently holds version: {}",
        versions.existing.as_deref().unwrap_or("unknown")
    );
    println!(
        "About to upload version: {}",
        versions.local.as_deref().unwrap_or("unknown")
    );

    if !dry && !yes && !confirm("Proceed?")? {
        println!("Aborted.");
        std::process::exit(1);
    }

    let progress = reporter(verbose);
    let plan = index::plan_upload(&client, html_dir, config, progress.as_ref()).await?;

    println!();
    println!("  Documents: {}", plan.records.len());
    println!("  Deletes:   {}", plan.deletes());
    println!("  Duds:      {}", plan.duds.len());
    for dud in &plan.duds {
        println!("    - {dud}");
    }
    println!();

    if dry {
        println!("Dry run: nothing uploaded.");
        return Ok(());
    }

    let resp = index::submit(&client, &plan).await?;
    println!("Upload status: {} ({} adds, {} deletes)", resp.status, resp.adds, resp.deletes);

    let delay = config.search.self_test_delay_secs;
    info!(delay_secs = delay, "waiting for indexing before the self-test");
    tokio::time::sleep(Duration::from_secs(delay)).await;

    let results = index::self_test(
        &client,
        &plan.records,
        config.search.self_test_count,
        &mut rand::rng(),
    )
    .await;
    let passed = results.iter().filter(|r| r.found).count();
    println!("Search self-test: {passed}/{} found", results.len());
    for miss in results.iter().filter(|r| !r.found) {
        println!("    - \"{}\" did not return {}", miss.query, miss.expected);
    }
    Ok(())
}

fn cmd_concat(toc_path: &Path, html_dir: &Path, paths: &[String]) -> Result<()> {
    let doc = toc::load_toc(toc_path)?;
    let pages = if paths.is_empty() {
        concat::flatten(&doc.toc)
    } else {
        concat::flatten_paths(&doc.toc, paths)?
    };

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    let summary = concat::concatenate(&pages, html_dir, &mut out)?;
    if summary.dangling_links > 0 {
        warn!(count = summary.dangling_links, "links to pages outside the output");
    }
    Ok(())
}

async fn cmd_wait_endpoint(config: &AppConfig, domain: &str) -> Result<()> {
    let domain_cfg = config.search.domain(domain)?;
    let client = HttpSearchClient::new(domain_cfg, config.search.timeout_secs)?;

    let spinner = spinner();
    let client_ref = &client;
    let checks = wait_until_ready(
        &PollSchedule::default(),
        move || client_ref.is_reachable(),
        |remaining| spinner.set_message(format!("Endpoint not ready, next check in {remaining}s")),
    )
    .await;
    spinner.finish_and_clear();
    info!(domain, checks, "endpoint reachable");

    match client.check_search().await? {
        SearchCheck::Valid => println!("Endpoint for '{domain}' is up."),
        SearchCheck::UnexpectedShape(json) => {
            warn!(domain, "endpoint answered without status and hits");
            println!("Unexpected response:\n{}", serde_json::to_string_pretty(&json)?);
        }
        SearchCheck::InvalidJson(body) => {
            warn!(domain, "endpoint answered with something that isn't JSON");
            println!("Unexpected response:\n{body}");
        }
    }
    Ok(())
}

fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = init_config(path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

/// Ask a y/N question on stdin.
fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    spinner.set_style(style);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        Self { spinner: spinner() }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn item(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("[{current}/{total}] {name}"));
    }

    /// Ends a loop. The spinner stays live for the phases that follow.
    fn finish(&self) {
        self.spinner.set_message("");
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        self.spinner.finish_and_clear();
    }
}
