use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use color_extractor::output::COLOR_RESET;
use color_extractor::{
    ColorFormat, ExtractError, FormatOptions, KmeansSettings, Modification, SAMPLE_SIZE,
    Severity, SortKey, Step, apply_steps, confirm_destination, format_color, load_samples,
    plan_clusters, quantize, render_palette, write_palette,
};
use log::{Level, LevelFilter, info, warn};

const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";

const DEFAULT_COLORS: usize = 5;

/// Held while the output file is being written; the interrupt handler takes
/// it before exiting so a rename in flight completes and the temporary file
/// is cleaned up.
static WRITE_LOCK: Mutex<()> = Mutex::new(());

/// Extract dominant colors from an image.
///
/// The order of --number, --sort and --mod matters and each of them may be
/// given several times.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the image file
    #[arg(value_name = "FILE")]
    image: PathBuf,

    /// Number of color clusters to pick colors from
    #[arg(short, long, default_value_t = 20)]
    clusters: usize,

    /// Number of colors to output [default: 5]
    #[arg(short, long)]
    number: Vec<usize>,

    /// Sort criteria: frequency, saturation, value, brightness or chroma
    #[arg(short, long, value_name = "KEY")]
    sort: Vec<SortKey>,

    /// Reverse the sort order
    #[arg(short, long)]
    reverse: bool,

    /// Modify the colors: max-sat or max-val
    #[arg(short = 'm', long = "mod", value_name = "MOD")]
    modification: Vec<Modification>,

    /// Output color format: hex, rgb or hsv
    #[arg(long, default_value_t = ColorFormat::Hex)]
    format: ColorFormat,

    /// Include '#' before hex colors
    #[arg(long)]
    include_hashtag: bool,

    /// Save the result to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite the output file if it already exists
    #[arg(short, long)]
    force: bool,

    /// Seed for k-means initialisation
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Number of k-means restarts
    #[arg(long, default_value_t = 3)]
    runs: usize,

    /// Side length of the thumbnail the image is sampled from
    #[arg(long, default_value_t = SAMPLE_SIZE)]
    resize: u32,

    /// Increase output verbosity
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn requested_counts(&self) -> Vec<usize> {
        if self.number.is_empty() {
            vec![DEFAULT_COLORS]
        } else {
            self.number.clone()
        }
    }
}

/// Interleave the repeatable options back into the order they were typed.
fn ordered_steps(matches: &ArgMatches, args: &Args) -> Vec<Step> {
    let mut indexed: Vec<(usize, Step)> = Vec::new();

    if let Some(idx) = matches.indices_of("sort") {
        indexed.extend(idx.zip(&args.sort).map(|(i, k)| (i, Step::Sort(*k))));
    }
    if let Some(idx) = matches.indices_of("number") {
        indexed.extend(idx.zip(&args.number).map(|(i, n)| (i, Step::Limit(*n))));
    }
    if let Some(idx) = matches.indices_of("modification") {
        indexed.extend(idx.zip(&args.modification).map(|(i, m)| (i, Step::Modify(*m))));
    }

    indexed.sort_by_key(|(i, _)| *i);
    indexed.into_iter().map(|(_, step)| step).collect()
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            let marker = match record.level() {
                Level::Error => "[-]",
                Level::Warn => "[!]",
                _ => "[+]",
            };
            writeln!(buf, "{marker} {}", record.args())
        })
        .init();
}

fn log_settings(args: &Args, clusters: usize, requested: &[usize]) {
    let banner = format!("------ {} ------>", env!("CARGO_BIN_NAME"));
    info!("{BLUE}{banner}{COLOR_RESET}");
    info!("{:<10}: {}", "Img path", args.image.display());
    if let Some(out) = &args.output {
        info!("{:<10}: {}", "Output", out.display());
    }
    info!("{:<10}: {}", "Format", args.format);
    if args.format == ColorFormat::Hex {
        info!("{:<10}: {}", "Include #", args.include_hashtag);
    }
    info!("{:<10}: {}", "Clusters", clusters);
    info!("{:<10}: {:?}", "Colors", requested);

    let keys: Vec<String> = args.sort.iter().map(ToString::to_string).collect();
    let sort = if keys.is_empty() {
        SortKey::Frequency.to_string()
    } else {
        keys.join(", ")
    };
    let reversed = if args.reverse { " [reversed]" } else { "" };
    info!("{:<10}: {sort}{reversed}", "Sort by");

    if !args.modification.is_empty() {
        let mods: Vec<String> = args.modification.iter().map(ToString::to_string).collect();
        info!("{:<10}: {}", "Mods", mods.join(", "));
    }
    info!("{BLUE}{}>{COLOR_RESET}", "-".repeat(banner.len()));
}

fn write_guarded(path: &Path, colors: &[String]) -> color_extractor::Result<()> {
    let _guard = WRITE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    write_palette(path, colors)
}

fn run(args: &Args, matches: &ArgMatches) -> Result<()> {
    let start = Instant::now();

    // The image path is checked before any numeric option.
    let samples = load_samples(&args.image, args.resize)?;

    let requested = args.requested_counts();
    let plan = plan_clusters(args.clusters, &requested)?;
    log_settings(args, plan.clusters, &requested);

    let settings = KmeansSettings {
        clusters: plan.clusters,
        runs: args.runs,
        seed: args.seed,
        ..Default::default()
    };
    let entries = quantize(&samples, &settings)?;

    let steps = ordered_steps(matches, args);
    let palette = apply_steps(entries, &steps, args.reverse, requested[0])?;

    let fmt = FormatOptions {
        format: args.format,
        hash_prefix: args.include_hashtag,
    };
    {
        let mut stdout = io::stdout().lock();
        for line in render_palette(&palette, &fmt) {
            writeln!(stdout, "{line}").context("failed to write to stdout")?;
        }
    }

    if let Some(path) = &args.output {
        let colors: Vec<String> = palette.iter().map(|e| format_color(&e.color, &fmt)).collect();
        let confirmed =
            confirm_destination(path, args.force, &mut io::stdin().lock(), &mut io::stdout())?;
        if !confirmed {
            println!("[+] Exiting without overwriting {}", path.display());
            return Ok(());
        }
        write_guarded(path, &colors)?;
    }

    info!("Elapsed time: {:.4} seconds", start.elapsed().as_secs_f64());

    for notice in &plan.notices {
        let color = match notice.severity {
            Severity::Adjusted => YELLOW,
            Severity::Warning => RED,
        };
        println!("{color}[!] {}{COLOR_RESET}", notice.message);
    }

    Ok(())
}

fn main() -> ExitCode {
    let matches = Args::command().get_matches();
    let args = match Args::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(e) => e.exit(),
    };

    init_logging(args.verbose);

    if let Err(e) = ctrlc::set_handler(|| {
        let _guard = WRITE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        println!("\nInterrupted, exiting gracefully.");
        std::process::exit(0);
    }) {
        warn!("Could not install the Ctrl-C handler: {e}");
    }

    match run(&args, &matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err
                .downcast_ref::<ExtractError>()
                .map_or(1, ExtractError::exit_code);
            eprintln!("{RED}[-] {err}{COLOR_RESET}");
            ExitCode::from(code)
        }
    }
}
