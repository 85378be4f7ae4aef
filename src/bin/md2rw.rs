//! CLI binary for markdown-to-rw.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig`, converts one file, and optionally publishes its images.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use markdown_to_rw::{
    convert_file, default_html_path, publish_images, ConversionConfig, ProgressCallback,
    PublishReport, UploadMode, UploadProgressCallback, WordPressConfig, WordPressMediaHost,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a bar over the files being uploaded plus one
/// log line per file and per rollback delete.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Scanning");
        bar.set_message("Looking for local images…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl UploadProgressCallback for CliProgressCallback {
    fn on_upload_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} images  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        self.bar.set_prefix("Uploading");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Uploading {total_files} images…"))
        ));
    }

    fn on_file_start(&self, _index: usize, _total: usize, path: &Path) {
        self.bar.set_message(file_label(path));
    }

    fn on_file_uploaded(&self, index: usize, total: usize, path: &Path, url: &str) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index,
            total,
            file_label(path),
            dim(url),
        ));
        self.bar.inc(1);
    }

    fn on_file_failed(&self, index: usize, total: usize, path: &Path, error: &str) {
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            file_label(path),
            red(&msg),
        ));
        self.bar.set_prefix("Rolling back");
    }

    fn on_rollback(&self, media_id: u64, deleted: bool) {
        let mark = if deleted { dim("deleted") } else { red("left on host") };
        self.bar.println(format!("    {} media {}  {}", dim("↺"), media_id, mark));
    }

    fn on_upload_complete(&self, uploaded: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} images uploaded",
            green("✔"),
            bold(&uploaded.to_string())
        );
    }
}

impl Drop for CliProgressCallback {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert post.md to post.html
  md2rw post.md

  # Convert to a specific file and print the HTML too
  md2rw post.md -o out/post.html --stdout

  # Upload local images and relink both the Markdown and the HTML
  md2rw post.md --upload all --site https://blog.example.org --user editor

  # Upload images but leave the Markdown source untouched
  md2rw post.md --upload html-only

  # Indented with tabs? Expand them to two spaces first
  md2rw post.md --expand-tabs 2

  # JSON output with stats and upload report
  md2rw --json post.md > result.json

ENVIRONMENT VARIABLES:
  MD2RW_SITE         WordPress site root, e.g. https://blog.example.org
  MD2RW_USER         WordPress user name
  MD2RW_PASSWORD     WordPress application password
  RUST_LOG           Override log filter (e.g. markdown_to_rw=debug)

NOTES:
  Image paths are resolved relative to the HTML output file. Web images
  (http…, www…) and files that do not exist are left alone. If any upload
  fails, every image uploaded during the run is deleted again and no file
  on disk is changed.
"#;

/// Convert Markdown posts to WordPress-ready HTML.
#[derive(Parser, Debug)]
#[command(
    name = "md2rw",
    version,
    about = "Convert Markdown posts to WordPress-ready HTML",
    long_about = "Convert a Markdown post to the HTML dialect a WordPress site expects \
(highlighter code blocks, image alignment classes, new-tab links, note and spoiler callouts) \
and optionally upload its local images to the site's media library.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown file to convert.
    input: String,

    /// HTML output path. Default: the input path with an .html extension.
    #[arg(short, long, env = "MD2RW_OUTPUT")]
    output: Option<String>,

    /// Image upload mode: skip, all, html-only.
    #[arg(long, env = "MD2RW_UPLOAD", value_enum, default_value = "skip")]
    upload: UploadArg,

    /// WordPress site root URL.
    #[arg(long, env = "MD2RW_SITE")]
    site: Option<String>,

    /// WordPress user name.
    #[arg(long, env = "MD2RW_USER")]
    user: Option<String>,

    /// WordPress application password.
    #[arg(long, env = "MD2RW_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Replace each tab with N spaces before parsing (1–8).
    #[arg(long, env = "MD2RW_EXPAND_TABS")]
    expand_tabs: Option<usize>,

    /// Per-request upload timeout in seconds.
    #[arg(long, env = "MD2RW_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Output structured JSON (conversion output and upload report).
    #[arg(long, env = "MD2RW_JSON")]
    json: bool,

    /// Also print the final HTML to stdout.
    #[arg(long)]
    stdout: bool,

    /// Disable progress bar.
    #[arg(long, env = "MD2RW_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MD2RW_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MD2RW_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum UploadArg {
    Skip,
    All,
    HtmlOnly,
}

impl From<UploadArg> for UploadMode {
    fn from(v: UploadArg) -> Self {
        match v {
            UploadArg::Skip => UploadMode::Skip,
            UploadArg::All => UploadMode::All,
            UploadArg::HtmlOnly => UploadMode::HtmlOnly,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mode = UploadMode::from(cli.upload);

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs while uploading.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && mode != UploadMode::Skip;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Resolve paths ────────────────────────────────────────────────────
    let markdown_path = PathBuf::from(strip_quotes(&cli.input));
    let html_path = match cli.output.as_deref() {
        Some(out) => PathBuf::from(strip_quotes(out)),
        None => default_html_path(&markdown_path),
    };

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn UploadProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, mode, progress_cb)?;

    // ── Convert ──────────────────────────────────────────────────────────
    let mut output = convert_file(&markdown_path, &html_path, &config)
        .await
        .context("Conversion failed")?;

    if !cli.quiet && !cli.json {
        eprintln!(
            "{}  {}  →  {}  {}",
            green("✔"),
            markdown_path.display(),
            bold(&html_path.display().to_string()),
            dim(&format!(
                "{} local images, {}ms",
                output.stats.local_images, output.stats.duration_ms
            )),
        );
    }

    // ── Publish ──────────────────────────────────────────────────────────
    let mut report = PublishReport::default();
    if mode != UploadMode::Skip {
        if output.images.is_empty() {
            if !cli.quiet && !cli.json {
                eprintln!("{} no local images to upload", dim("–"));
            }
        } else {
            let host = build_host(&cli)?;
            report = publish_images(&markdown_path, &html_path, &host, &config)
                .await
                .context("Publishing images failed")?;
            if report.html_rewritten {
                output.html = tokio::fs::read_to_string(&html_path)
                    .await
                    .with_context(|| format!("Failed to re-read {}", html_path.display()))?;
            }
            if !cli.quiet && !cli.json {
                print_report(&report, &markdown_path, &html_path);
            }
        }
    }

    // ── Emit ─────────────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::json!({
            "input": markdown_path,
            "output": html_path,
            "conversion": output,
            "publish": report,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).context("Failed to serialise output")?
        );
    } else if cli.stdout {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.html.as_bytes())
            .context("Failed to write to stdout")?;
        if !output.html.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(
    cli: &Cli,
    mode: UploadMode,
    progress: Option<ProgressCallback>,
) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder().upload_mode(mode);
    if let Some(width) = cli.expand_tabs {
        builder = builder.expand_tabs(width);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid configuration")
}

/// Build the WordPress host from `--site`/`--user`/`--password`.
fn build_host(cli: &Cli) -> Result<WordPressMediaHost> {
    let site = cli
        .site
        .as_deref()
        .context("--site (or MD2RW_SITE) is required when uploading")?;
    let user = cli
        .user
        .as_deref()
        .context("--user (or MD2RW_USER) is required when uploading")?;
    let password = cli
        .password
        .as_deref()
        .context("--password (or MD2RW_PASSWORD) is required when uploading")?;

    let config = WordPressConfig::new(site, user, password).timeout_secs(cli.timeout);
    WordPressMediaHost::new(config).context("Invalid WordPress settings")
}

fn print_report(report: &PublishReport, markdown_path: &Path, html_path: &Path) {
    eprintln!(
        "{}  {} images published",
        green("✔"),
        bold(&report.uploaded.len().to_string())
    );
    if report.html_rewritten {
        eprintln!("   {} {}", dim("rewrote"), html_path.display());
    }
    if report.markdown_rewritten {
        eprintln!("   {} {}", dim("rewrote"), markdown_path.display());
    }
}

/// Strip one pair of surrounding quotes, as left by drag-and-drop or copy-paste.
fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    for q in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(q).and_then(|r| r.strip_suffix(q)) {
            return inner;
        }
    }
    s
}
