use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use wikitoc_core::config::{CONFIG_FILENAME, EnvLookup, load_config, process_env};
use wikitoc_core::home::{MissingMarkers, UpdateOptions};
use wikitoc_core::title::TitleSource;
use wikitoc_core::{HomeReport, TocOptions, TocReport, generate_toc, update_home};

#[derive(Debug, Parser)]
#[command(
    name = "wikitoc",
    version,
    about = "Generate a table of contents for a cloned Markdown wiki"
)]
struct Cli {
    #[arg(value_name = "WIKI_DIR", help = "Folder holding the cloned wiki pages")]
    wiki_dir: PathBuf,
    #[arg(long, help = "Splice the TOC into the Home page")]
    update_home: bool,
    #[arg(long, value_name = "NAME", help = "Home page file name [default: Home.md]")]
    home: Option<String>,
    #[arg(long, value_name = "SOURCE", help = "Derive titles from `filename` or `heading`")]
    title_source: Option<TitleSource>,
    #[arg(long, value_name = "PREFIX", help = "Prefix prepended to every link")]
    link_prefix: Option<String>,
    #[arg(long, help = "Link to pages without their file extension")]
    strip_extension: bool,
    #[arg(long, help = "Include pages in subfolders")]
    recursive: bool,
    #[arg(long, help = "Group pages under headings from their `Tags:` line")]
    group_by_tags: bool,
    #[arg(long, help = "Put the TOC at the top of the Home page when it has no markers")]
    prepend: bool,
    #[arg(long, help = "Keep the previous Home page as <NAME>.old")]
    backup: bool,
    #[arg(long, help = "Show the Home page diff without writing (implies --update-home)")]
    dry_run: bool,
    #[arg(
        long,
        help = "Fail if the Home page TOC is out of date (implies --dry-run)"
    )]
    check: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    #[arg(long, value_name = "PATH", help = "Config file [default: <WIKI_DIR>/.wikitoc.toml]")]
    config: Option<PathBuf>,
    #[arg(short, long, help = "Print debug logs to stderr")]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = resolve_options(&cli)?;
    if cli.update_home || cli.dry_run || cli.check {
        run_update(&cli, &options)
    } else {
        run_generate(&cli, &options)
    }
}

fn init_logging(verbose: bool) {
    env_logger::Builder::new()
        .filter_level(log_level(verbose))
        .parse_default_env()
        .init();
}

fn log_level(verbose: bool) -> log::LevelFilter {
    if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    }
}

/// CLI flag > wiki `.env` > process env > config file > default.
fn resolve_options(cli: &Cli) -> Result<TocOptions> {
    dotenvy::dotenv().ok();
    let wiki_env = load_wiki_env(&cli.wiki_dir)?;
    let lookup = |key: &str| wiki_env.get(key).cloned().or_else(|| process_env(key));
    resolve_options_with_env(cli, &lookup)
}

/// Variables from `<WIKI_DIR>/.env`, empty when the file is absent.
fn load_wiki_env(wiki_dir: &Path) -> Result<BTreeMap<String, String>> {
    let path = wiki_dir.join(".env");
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let context = || format!("failed to load {}", normalize_path(&path));
    let mut values = BTreeMap::new();
    for item in dotenvy::from_path_iter(&path).with_context(context)? {
        let (key, value) = item.with_context(context)?;
        values.insert(key, value);
    }
    log::debug!("loaded {} variables from {}", values.len(), normalize_path(&path));
    Ok(values)
}

fn resolve_options_with_env(cli: &Cli, env: EnvLookup<'_>) -> Result<TocOptions> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.wiki_dir.join(CONFIG_FILENAME));
    let config = load_config(&config_path)?;
    log::debug!("config: {}", normalize_path(&config_path));

    let mut options = config.to_options_with_env(env);
    if let Some(home) = &cli.home {
        if home.trim().is_empty() {
            bail!("--home requires a non-empty file name");
        }
        options.scan.home_page = home.trim().to_string();
    }
    if let Some(source) = cli.title_source {
        options.title_source = source;
    }
    if let Some(prefix) = &cli.link_prefix {
        options.link.prefix = prefix.clone();
    }
    if cli.strip_extension {
        options.link.strip_extension = true;
    }
    if cli.recursive {
        options.scan.recursive = true;
    }
    if cli.group_by_tags {
        options.render.group_by_tags = true;
    }
    if cli.prepend {
        options.missing_markers = MissingMarkers::Prepend;
    }
    Ok(options)
}

fn run_generate(cli: &Cli, options: &TocOptions) -> Result<()> {
    let report = generate_toc(&cli.wiki_dir, options)
        .with_context(|| format!("failed to generate TOC for {}", normalize_path(&cli.wiki_dir)))?;
    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", report.toc),
    }
    Ok(())
}

fn run_update(cli: &Cli, options: &TocOptions) -> Result<()> {
    let update = UpdateOptions {
        dry_run: cli.dry_run || cli.check,
        backup: cli.backup,
    };
    let report = update_home(&cli.wiki_dir, options, &update).with_context(|| {
        format!(
            "failed to update {} in {}",
            options.scan.home_page,
            normalize_path(&cli.wiki_dir)
        )
    })?;

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_home_report(&report, options, update.dry_run),
    }

    if cli.check {
        check_outcome(&report, &cli.wiki_dir)?;
    }
    Ok(())
}

/// `--check` fails when the Home page would change.
fn check_outcome(report: &HomeReport, wiki_dir: &Path) -> Result<()> {
    if report.home.changed {
        bail!(
            "{} is out of date; run `wikitoc --update-home {}`",
            normalize_path(&report.home.path),
            normalize_path(wiki_dir)
        );
    }
    Ok(())
}

fn print_home_report(report: &HomeReport, options: &TocOptions, dry_run: bool) {
    println!("home update");
    print_toc_summary(&report.toc, options);
    println!("home_page: {}", normalize_path(&report.home.path));
    println!("placement: {}", report.home.placement.as_str());
    println!("changed: {}", format_flag(report.home.changed));
    println!("written: {}", format_flag(report.home.written));
    println!(
        "backup: {}",
        report
            .home
            .backup_path
            .as_deref()
            .map(normalize_path)
            .unwrap_or_else(|| "<none>".to_string())
    );
    if dry_run && !report.home.diff.is_empty() {
        println!();
        print!("{}", report.home.diff);
    }
}

fn print_toc_summary(report: &TocReport, options: &TocOptions) {
    println!("wiki_dir: {}", report.wiki_dir);
    println!("title_source: {}", options.title_source);
    println!("pages: {}", report.page_count);
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn format_flag(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
