//! fwembed - Embed certificates, web pages and audio into firmware
//!
//! This tool converts binary payloads into C `uint8_t` array declarations
//! ready to be compiled into embedded Wi-Fi/audio firmware.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use fwembed_core::{
    sanitize_identifier, ArrayBundle, EnvelopeTable, Error, FormatterConfig, HeaderTemplate,
    HexArrayFormatter, LineEnding, RsaComponents, WavFile, DEFAULT_WRAP_WIDTH, VERSION,
};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Embed certificates, web pages and audio into firmware as C byte arrays
#[derive(Parser, Debug)]
#[command(name = "fwembed")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output file for the generated declarations ("-" for stdout)
    #[arg(short, long, env = "FWEMBED_OUTPUT", default_value = "-", global = true)]
    output: PathBuf,

    /// Number of array elements per line
    #[arg(
        short,
        long,
        env = "FWEMBED_WRAP_WIDTH",
        default_value_t = DEFAULT_WRAP_WIDTH,
        global = true
    )]
    wrap_width: usize,

    /// Line terminator of the generated source
    #[arg(long, value_enum, default_value = "crlf", global = true)]
    line_ending: LineEndingArg,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Dry run - render everything but don't write the output
    #[arg(long, global = true)]
    dry_run: bool,

    /// Refuse to replace an existing output file whose content differs
    #[arg(long, global = true)]
    no_clobber: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a certificate (and its RSA key) into modulus, exponent and certificate arrays
    Cert(CertArgs),
    /// Convert web assets into complete HTTP response arrays
    Http(HttpArgs),
    /// Convert a PCM WAV file into a PROGMEM sample array
    Wav(WavArgs),
}

#[derive(Args, Debug)]
struct CertArgs {
    /// Certificate file (PEM, CRLF-framed X.509, or raw DER)
    #[arg(short, long)]
    cert: PathBuf,

    /// RSA key belonging to the certificate (PEM, PKCS#1 or PKCS#8)
    #[arg(short, long)]
    key: Option<PathBuf>,

    /// Prefix of the generated array names
    #[arg(long, default_value = "server")]
    prefix: String,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct HttpInput {
    /// Asset files to convert
    files: Vec<PathBuf>,

    /// Directory of assets to convert recursively
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct HttpArgs {
    #[command(flatten)]
    input: HttpInput,

    /// Content type for every asset instead of guessing from the extension
    #[arg(long)]
    content_type: Option<String>,

    /// Extra static header field, e.g. "Cache-Control: max-age=3600"
    #[arg(long = "header", value_parser = parse_header_field)]
    headers: Vec<(String, String)>,

    /// Prefix of the generated array names
    #[arg(long)]
    prefix: Option<String>,
}

#[derive(Args, Debug)]
struct WavArgs {
    /// WAV file with mono 8- or 16-bit PCM samples
    #[arg(short, long)]
    input: PathBuf,

    /// Name of the generated array
    #[arg(short, long, default_value = "sound_data")]
    name: String,

    /// Storage qualifier placed on the array
    #[arg(long, default_value = "PROGMEM")]
    qualifier: String,
}

/// Line terminator choice on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum LineEndingArg {
    /// Carriage return + line feed
    Crlf,
    /// Line feed only
    Lf,
}

impl From<LineEndingArg> for LineEnding {
    fn from(arg: LineEndingArg) -> Self {
        match arg {
            LineEndingArg::Crlf => LineEnding::Crlf,
            LineEndingArg::Lf => LineEnding::Lf,
        }
    }
}

/// What happened to the output file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteOutcome {
    Written,
    Unchanged,
    Stdout,
    DryRun,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    run(&cli).map(|_| ())
}

/// Builds the requested bundle and writes it out
fn run(cli: &Cli) -> Result<WriteOutcome> {
    let line_ending = LineEnding::from(cli.line_ending);
    let config = FormatterConfig::new()
        .wrap_width(cli.wrap_width)
        .line_ending(line_ending);
    let formatter = HexArrayFormatter::with_config(config)?;

    let mut bundle = ArrayBundle::new(line_ending);
    bundle.comment(format!("Generated by fwembed {VERSION}. Do not edit."));

    match &cli.command {
        Command::Cert(args) => build_cert(args, &formatter, &mut bundle)?,
        Command::Http(args) => build_http(args, &formatter, &mut bundle)?,
        Command::Wav(args) => build_wav(args, &formatter, &mut bundle)?,
    }

    info!(
        "Rendered {} array(s), {} bytes total",
        bundle.declarations().len(),
        bundle.total_bytes()
    );

    let outcome = write_output(&cli.output, &bundle.render(), cli.no_clobber, cli.dry_run)?;
    match outcome {
        WriteOutcome::Written => info!("Wrote {}", cli.output.display()),
        WriteOutcome::Unchanged => info!("{} is up to date", cli.output.display()),
        WriteOutcome::DryRun => info!("Would write {}", cli.output.display()),
        WriteOutcome::Stdout => {}
    }
    Ok(outcome)
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    trace!("Reading {}", path.display());
    let data = fs::read(path).map_err(|e| Error::file_read(path, e))?;
    debug!("Read {} bytes from {}", data.len(), path.display());
    Ok(data)
}

/// Certificate driver: modulus and exponent from the key, then the DER certificate
fn build_cert(
    args: &CertArgs,
    formatter: &HexArrayFormatter,
    bundle: &mut ArrayBundle,
) -> Result<()> {
    let raw_cert = read_input(&args.cert)?;
    let der = EnvelopeTable::certificates()
        .strip(&raw_cert)
        .with_context(|| format!("Failed to decode certificate: {}", args.cert.display()))?;

    bundle.comment(format!("Certificate: {}", file_label(&args.cert)));

    if let Some(key_path) = &args.key {
        let key_text = String::from_utf8(read_input(key_path)?)
            .with_context(|| format!("Key file is not text: {}", key_path.display()))?;
        let components = RsaComponents::from_pem(&key_text)
            .with_context(|| format!("Failed to parse key: {}", key_path.display()))?;

        bundle.comment(format!(
            "Key: {} ({}-bit)",
            file_label(key_path),
            components.key_size() * 8
        ));
        let modulus_name = format!("{}_modulus", args.prefix);
        let exponent_name = format!("{}_exponent", args.prefix);
        bundle.push(formatter.declare(&modulus_name, &components.modulus)?);
        bundle.push(formatter.declare(&exponent_name, &components.exponent)?);
    }

    bundle.push(formatter.declare(&format!("{}_certificate", args.prefix), &der)?);
    Ok(())
}

/// HTTP driver: one framed response per asset
fn build_http(
    args: &HttpArgs,
    formatter: &HexArrayFormatter,
    bundle: &mut ArrayBundle,
) -> Result<()> {
    let assets = match &args.input.directory {
        Some(directory) => collect_assets(directory)?,
        None => args
            .input
            .files
            .iter()
            .map(|f| {
                let label = f
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| f.display().to_string());
                (f.clone(), label)
            })
            .collect(),
    };

    if assets.is_empty() {
        bail!("No assets to convert");
    }

    let mut names = HashSet::new();
    for (path, label) in assets {
        let body = read_input(&path)?;

        let mut template = match &args.content_type {
            Some(ty) => HeaderTemplate::new().content_type(ty.clone()),
            None => HeaderTemplate::for_path(&path),
        };
        for (name, value) in &args.headers {
            template = template.field(name.clone(), value.clone());
        }

        let ident = match &args.prefix {
            Some(prefix) => sanitize_identifier(&format!("{prefix}_{label}")),
            None => sanitize_identifier(&label),
        };
        if !names.insert(ident.clone()) {
            bail!("Two assets map to the same array name '{}' ({})", ident, path.display());
        }

        let framed = template.frame(&body);
        debug!(
            "{} -> {} ({} byte body, {} type)",
            label,
            ident,
            body.len(),
            template.content_type
        );
        bundle.comment(format!("{label}: {}", template.content_type));
        bundle.push(formatter.declare(&ident, &framed)?);
    }

    Ok(())
}

/// Walks an asset directory in a stable order, returning paths and their
/// directory-relative labels
fn collect_assets(directory: &Path) -> Result<Vec<(PathBuf, String)>> {
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());

    let mut assets = Vec::new();
    for entry in WalkDir::new(directory)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
    {
        let entry = entry.with_context(|| format!("Failed to walk {}", directory.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let label = path
            .strip_prefix(directory)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        trace!("Found asset {}", label);
        assets.push((path.to_path_buf(), label));
    }

    Ok(assets)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

/// WAV driver: the PCM data chunk as a qualified array
fn build_wav(
    args: &WavArgs,
    formatter: &HexArrayFormatter,
    bundle: &mut ArrayBundle,
) -> Result<()> {
    let data = read_input(&args.input)?;
    let wav = WavFile::parse(&data)
        .with_context(|| format!("Failed to parse WAV file: {}", args.input.display()))?;
    wav.header
        .ensure_embeddable()
        .with_context(|| format!("Cannot embed {}", args.input.display()))?;

    info!(
        "{}: {}, {} frames, {} ms",
        args.input.display(),
        wav.header.describe(),
        wav.header.frames(),
        wav.header.duration_ms()
    );

    bundle.comment(format!(
        "{}: {}, {} ms",
        file_label(&args.input),
        wav.header.describe(),
        wav.header.duration_ms()
    ));
    bundle.push(formatter.declare_with_qualifier(&args.name, &args.qualifier, wav.samples)?);
    Ok(())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Parses `Name: value` into a header field pair
fn parse_header_field(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("expected 'Name: value', got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(format!("invalid header name '{name}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Writes the rendered output, replacing stale files and leaving
/// byte-identical ones untouched
fn write_output(
    output_path: &Path,
    content: &str,
    no_clobber: bool,
    dry_run: bool,
) -> Result<WriteOutcome> {
    if dry_run {
        debug!("Dry run, {} bytes not written", content.len());
        return Ok(WriteOutcome::DryRun);
    }

    if output_path == Path::new("-") {
        std::io::stdout()
            .write_all(content.as_bytes())
            .context("Failed to write to stdout")?;
        return Ok(WriteOutcome::Stdout);
    }

    if output_path.exists() {
        let existing = fs::read(output_path).map_err(|e| Error::file_read(output_path, e))?;
        if blake3::hash(&existing) == blake3::hash(content.as_bytes()) {
            debug!("Content hash unchanged for {}", output_path.display());
            return Ok(WriteOutcome::Unchanged);
        }
        if no_clobber {
            bail!(
                "File already exists with different content: {} (--no-clobber given)",
                output_path.display()
            );
        }
        debug!("Replacing stale {}", output_path.display());
    }

    // Create parent directories
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::directory_create(parent, e))?;
    }

    fs::write(output_path, content).map_err(|e| Error::file_write(output_path, e))?;
    Ok(WriteOutcome::Written)
}
