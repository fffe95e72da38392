use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use atlas_packer_core::prelude::*;
use atlas_packer_core::{to_json_array, to_json_hash};
use clap::{ArgAction, Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "atlas-packer",
    about = "Lay out rects on texture atlas pages with a uniform grid",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --no-progress or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack a manifest of rects and export the layout as JSON
    Layout(LayoutArgs),
    /// Print the smallest single page that holds every rect of a manifest
    Size(LayoutArgs),
    /// Simple timing bench on random rects (packs once, prints time + occupancy)
    Bench(BenchArgs),
}

#[derive(Parser, Debug, Clone)]
struct LayoutArgs {
    // Input/Output
    /// Manifest file: YAML or JSON list of {name, w, h} entries
    #[arg(help_heading = "Input/Output")]
    manifest: PathBuf,
    /// Output file (stdout when omitted)
    #[arg(short, long, help_heading = "Input/Output")]
    out: Option<PathBuf>,
    /// YAML config file path (overrides layout options)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,

    #[command(flatten)]
    layout: LayoutOpts,

    // Export
    /// Metadata format: json-array | json (alias) | json-hash
    #[arg(long, default_value = "json-array", value_parser = ["json-array", "json", "json-hash"], help_heading = "Export")]
    metadata: String,
    /// Export packing stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: compute layout and stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Args, Debug, Clone)]
struct LayoutOpts {
    /// Max width
    #[arg(long, default_value_t = 1024, help_heading = "Layout")]
    max_width: u32,
    /// Max height
    #[arg(long, default_value_t = 1024, help_heading = "Layout")]
    max_height: u32,
    /// Smallest width the size search proposes
    #[arg(long, default_value_t = 16, help_heading = "Layout")]
    min_width: u32,
    /// Smallest height the size search proposes
    #[arg(long, default_value_t = 16, help_heading = "Layout")]
    min_height: u32,
    /// Padding on both axes (overridden by --padding-x/--padding-y)
    #[arg(long, default_value_t = 2, help_heading = "Layout")]
    padding: u32,
    /// Horizontal padding
    #[arg(long, help_heading = "Layout")]
    padding_x: Option<u32>,
    /// Vertical padding
    #[arg(long, help_heading = "Layout")]
    padding_y: Option<u32>,
    /// Reserve padding along the page edges
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    edge_padding: bool,
    /// Neighbours share padding (edge reserves one unit instead of two)
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    duplicate_padding: bool,
    /// Search power-of-two page sizes
    #[arg(long, default_value_t = false, help_heading = "Size search")]
    pow2: bool,
    /// Search page sizes that are multiples of 4
    #[arg(long, default_value_t = false, help_heading = "Size search")]
    mod4: bool,
    /// Early-stop tolerance of the size search (pixels)
    #[arg(long, default_value_t = 0, help_heading = "Size search")]
    fuzziness: u32,
    /// Shrink the page to the smallest size holding everything before packing
    #[arg(long, default_value_t = false, help_heading = "Size search")]
    shrink_to_fit: bool,
}

impl LayoutOpts {
    fn to_config(&self) -> PackerConfig {
        PackerConfig::builder()
            .with_max_dimensions(self.max_width, self.max_height)
            .with_min_dimensions(self.min_width, self.min_height)
            .padding_x(self.padding_x.unwrap_or(self.padding))
            .padding_y(self.padding_y.unwrap_or(self.padding))
            .edge_padding(self.edge_padding)
            .duplicate_padding(self.duplicate_padding)
            .pow2(self.pow2)
            .mod4(self.mod4)
            .fuzziness(self.fuzziness)
            .shrink_to_fit(self.shrink_to_fit)
            .build()
    }
}

#[derive(Parser, Debug, Clone)]
struct BenchArgs {
    /// Number of random rects
    #[arg(long, default_value_t = 1000)]
    count: usize,
    /// Smallest random side
    #[arg(long, default_value_t = 8)]
    min_side: u32,
    /// Largest random side
    #[arg(long, default_value_t = 64)]
    max_side: u32,
    /// RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[command(flatten)]
    layout: LayoutOpts,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    let show_progress = cli.progress && !cli.quiet;
    match &cli.command {
        Commands::Layout(args) => run_layout(args, show_progress),
        Commands::Size(args) => run_size(args, show_progress),
        Commands::Bench(b) => run_bench(b),
    }
}

fn run_layout(args: &LayoutArgs, show_progress: bool) -> anyhow::Result<()> {
    let cfg = load_config(args)?;
    if args.print_config {
        return print_config(&cfg, &args.print_config_format);
    }

    let items = read_manifest(&args.manifest)?;
    info!(count = items.len(), "loaded manifest");

    let bar = progress_bar(show_progress, "packing")?;
    let atlas = match &bar {
        Some(b) => {
            let mut progress = ProgressListener::with_sink(BarSink(b.clone()));
            let atlas = pack_layout_items(items, cfg, Some(&mut progress))?;
            b.finish_and_clear();
            atlas
        }
        None => pack_layout_items(items, cfg, None)?,
    };

    let stats = atlas.stats();
    info!(
        pages = stats.num_pages,
        used_area = stats.used_area,
        total_area = stats.total_page_area,
        occupancy = format!("{:.2}%", stats.occupancy * 100.0),
        "stats"
    );

    let value = match args.metadata.as_str() {
        "json-hash" => to_json_hash(&atlas),
        // "json" is an alias of "json-array"
        _ => to_json_array(&atlas),
    };
    let json = serde_json::to_string_pretty(&value)?;
    match &args.out {
        Some(path) if !args.dry_run => {
            fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
            info!(?path, pages = atlas.pages.len(), "layout written");
        }
        Some(_) => {}
        None => println!("{json}"),
    }

    if let Some(stats_path) = &args.export_stats {
        if args.dry_run {
            println!("{}", stats.summary());
        } else {
            fs::write(stats_path, serde_json::to_string_pretty(&stats)?)
                .with_context(|| format!("write {}", stats_path.display()))?;
            info!(?stats_path, "stats exported");
        }
    }
    Ok(())
}

fn run_size(args: &LayoutArgs, show_progress: bool) -> anyhow::Result<()> {
    let cfg = load_config(args)?;
    if args.print_config {
        return print_config(&cfg, &args.print_config_format);
    }
    cfg.validate()?;

    let rects: Vec<InputRect> = read_manifest(&args.manifest)?
        .into_iter()
        .map(|it| InputRect::new(it.key, it.w, it.h))
        .collect();
    let packer = GridPacker::new(cfg);

    let bar = progress_bar(show_progress, "searching")?;
    let size = match &bar {
        Some(b) => {
            let mut progress = ProgressListener::with_sink(BarSink(b.clone()));
            let size = packer.smallest_page_size(&rects, Some(&mut progress));
            b.finish_and_clear();
            size
        }
        None => packer.smallest_page_size(&rects, None),
    };

    match size {
        Some(size) => {
            info!(width = size.width, height = size.height, "smallest page");
            println!("{}x{}", size.width, size.height);
            Ok(())
        }
        None => anyhow::bail!(
            "{} rects do not fit on a single {}x{} page",
            rects.len(),
            packer.config().max_width,
            packer.config().max_height
        ),
    }
}

fn run_bench(b: &BenchArgs) -> anyhow::Result<()> {
    anyhow::ensure!(b.min_side <= b.max_side, "--min-side exceeds --max-side");
    let mut rng = StdRng::seed_from_u64(b.seed);
    let items: Vec<LayoutItem<String>> = (0..b.count)
        .map(|i| {
            let w = rng.gen_range(b.min_side..=b.max_side);
            let h = rng.gen_range(b.min_side..=b.max_side);
            LayoutItem::new(format!("r{i}"), w, h)
        })
        .collect();

    let start = Instant::now();
    let atlas = pack_layout_items(items, b.layout.to_config(), None)?;
    let dur = start.elapsed();
    let stats = atlas.stats();
    println!(
        "pages={} occupancy={:.2}% area={} time={}",
        stats.num_pages,
        stats.occupancy * 100.0,
        atlas_packer_core::total_page_area(&atlas.pages),
        bench_fmt_dur(dur)
    );
    Ok(())
}

fn bench_fmt_dur(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms >= 1.0 {
        format!("{:.1}ms", ms)
    } else {
        format!("{}us", d.as_micros())
    }
}

fn load_config(args: &LayoutArgs) -> anyhow::Result<PackerConfig> {
    let cfg = args.layout.to_config();
    // A config file overrides individual options on top of the CLI flags
    let Some(path) = &args.config else {
        return Ok(cfg);
    };
    let file = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let y: YamlConfig =
        serde_yaml::from_str(&file).with_context(|| format!("parse {}", path.display()))?;
    Ok(y.into_packer_config(cfg))
}

fn print_config(cfg: &PackerConfig, format: &str) -> anyhow::Result<()> {
    match format {
        "yaml" => println!("{}", serde_yaml::to_string(cfg)?),
        _ => println!("{}", serde_json::to_string_pretty(cfg)?),
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    name: String,
    w: u32,
    h: u32,
    /// Original size, when `w`/`h` were trimmed upstream
    #[serde(default)]
    source_size: Option<(u32, u32)>,
}

fn read_manifest(path: &Path) -> anyhow::Result<Vec<LayoutItem<String>>> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let entries: Vec<ManifestEntry> = if is_json {
        serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))?
    } else {
        serde_yaml::from_str(&text).with_context(|| format!("parse {}", path.display()))?
    };
    if entries.is_empty() {
        warn!(?path, "manifest has no entries");
    }
    Ok(entries
        .into_iter()
        .map(|e| LayoutItem {
            source_size: e.source_size,
            ..LayoutItem::new(e.name, e.w, e.h)
        })
        .collect())
}

/// Forwards absolute progress (scaled to 0..=1000) and status text to an indicatif bar.
struct BarSink(ProgressBar);

impl ProgressSink for BarSink {
    fn progress(&mut self, value: f32) {
        self.0.set_position((value.clamp(0.0, 1.0) * 1000.0) as u64);
    }

    fn message(&mut self, message: &str) {
        self.0.set_message(message.to_string());
    }
}

fn progress_bar(show: bool, label: &str) -> anyhow::Result<Option<ProgressBar>> {
    if !show {
        return Ok(None);
    }
    let b = ProgressBar::new(1000);
    b.set_style(ProgressStyle::with_template(
        "{spinner:.green} {msg} [{elapsed_precise}] {wide_bar} {percent}%",
    )?);
    b.set_message(label.to_string());
    Ok(Some(b))
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    max_width: Option<u32>,
    max_height: Option<u32>,
    min_width: Option<u32>,
    min_height: Option<u32>,
    padding: Option<u32>,
    padding_x: Option<u32>,
    padding_y: Option<u32>,
    edge_padding: Option<bool>,
    duplicate_padding: Option<bool>,
    power_of_two: Option<bool>,
    multiple_of_four: Option<bool>,
    fuzziness: Option<u32>,
    shrink_to_fit: Option<bool>,
}

impl YamlConfig {
    fn into_packer_config(self, mut cfg: PackerConfig) -> PackerConfig {
        if let Some(v) = self.max_width {
            cfg.max_width = v;
        }
        if let Some(v) = self.max_height {
            cfg.max_height = v;
        }
        if let Some(v) = self.min_width {
            cfg.min_width = v;
        }
        if let Some(v) = self.min_height {
            cfg.min_height = v;
        }
        if let Some(v) = self.padding {
            cfg.padding_x = v;
            cfg.padding_y = v;
        }
        if let Some(v) = self.padding_x {
            cfg.padding_x = v;
        }
        if let Some(v) = self.padding_y {
            cfg.padding_y = v;
        }
        if let Some(v) = self.edge_padding {
            cfg.edge_padding = v;
        }
        if let Some(v) = self.duplicate_padding {
            cfg.duplicate_padding = v;
        }
        if let Some(v) = self.power_of_two {
            cfg.power_of_two = v;
        }
        if let Some(v) = self.multiple_of_four {
            cfg.multiple_of_four = v;
        }
        if let Some(v) = self.fuzziness {
            cfg.fuzziness = v;
        }
        if let Some(v) = self.shrink_to_fit {
            cfg.shrink_to_fit = v;
        }
        cfg
    }
}
