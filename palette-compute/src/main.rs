use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use color_lib::{color, Context};
use indicatif::{ProgressBar, ProgressStyle};
use palette_compute::corpus::{read_json, write_json, BaselineLookup, PaletteInput, PaletteRecord};
use palette_compute::{train, Baseline, Pipeline, PipelineConfig, RayonExecutor};
use palette_sort::select::{select, select_multi};
use palette_sort::{StandardMetrics, TrainedEntry, STANDARD};
use palette_visualizer::{save_svg, Strip};
use regex::Regex;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Orders palettes with every registered method, scores the results and
/// picks methods for new palettes.
#[derive(Parser)]
#[command(name = "palette-compute", version, about)]
struct Cli {
    /// Repeat for more log output.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the selected methods over a palette corpus and score the results
    Compute(ComputeArgs),
    /// Build a trained corpus from computed results
    Train {
        /// Computed results JSON
        input: PathBuf,
        /// Trained corpus JSON to write
        output: PathBuf,
    },
    /// Choose a method for a palette from a trained corpus
    Pick(PickArgs),
    /// List registered method ids
    Methods {
        /// Only ids matching this regular expression
        #[arg(long)]
        filter: Option<String>,
    },
}

#[derive(Args)]
struct ComputeArgs {
    /// Palette corpus JSON: [{key, colors}]
    input: PathBuf,
    /// Computed results JSON to write
    output: PathBuf,
    /// Pipeline settings JSON; flags below take precedence
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    threads: Option<usize>,
    #[arg(long)]
    filter: Option<String>,
    /// Curated orders by palette key
    #[arg(long, conflicts_with = "original_best")]
    baseline: Option<PathBuf>,
    /// Treat each palette's given order as the curated best
    #[arg(long)]
    original_best: bool,
    /// Write one SVG per palette into this directory
    #[arg(long)]
    svg: Option<PathBuf>,
}

#[derive(Args)]
struct PickArgs {
    /// Trained corpus JSON
    #[arg(long)]
    trained: PathBuf,
    /// Run the N most similar methods and keep the smoothest result;
    /// without N, uses `top_n` from the settings
    #[arg(long, num_args = 0..=1)]
    multi: Option<Option<usize>>,
    /// Pipeline settings JSON
    #[arg(long)]
    config: Option<PathBuf>,
    /// Also print the palette in the chosen order
    #[arg(long)]
    sort: bool,
    /// Hex colors
    #[arg(required = true)]
    colors: Vec<String>,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn compute(args: ComputeArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if args.filter.is_some() {
        config.filter = args.filter.clone();
    }
    config.original_best |= args.original_best;

    let palettes: Vec<PaletteInput> = read_json(&args.input)?;
    let baseline = match &args.baseline {
        Some(path) => Baseline::Lookup(read_json::<BaselineLookup>(path)?),
        None if config.original_best => Baseline::Original,
        None => Baseline::None,
    };

    let mut pipeline = Pipeline::new(&STANDARD, &StandardMetrics);
    if let Some(pattern) = config.method_filter()? {
        pipeline = pipeline.with_filter(&pattern);
    }
    if pipeline.methods().is_empty() {
        bail!("no method matches the filter");
    }
    let executor = RayonExecutor::new(config.threads)?;
    info!(threads = executor.threads(), methods = pipeline.methods().len(), "computing");

    let pb = ProgressBar::new(pipeline.row_count(palettes.len()) as u64).with_style(ProgressStyle::with_template(
        "{elapsed_precise}/{duration_precise} {wide_bar} {percent:>02}% {pos}/{len} {per_sec}",
    )?);
    let states = pipeline.compute(palettes, &baseline, &executor, &pb);
    pb.finish_and_clear();

    let records: Vec<PaletteRecord> = states.iter().map(|s| s.to_record(&STANDARD)).collect();
    write_json(&args.output, &records)?;
    info!(palettes = records.len(), output = %args.output.display(), "written");

    if let Some(dir) = &args.svg {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        for record in &records {
            write_palette_svg(dir, record)?;
        }
    }
    Ok(())
}

fn write_palette_svg(dir: &Path, record: &PaletteRecord) -> Result<()> {
    let mut strips = Vec::with_capacity(record.groups.len());
    for group in &record.groups {
        let colors = group
            .record
            .colors
            .iter()
            .map(|c| color::parse(c))
            .collect::<Result<Vec<_>, _>>()?;
        strips.push(Strip {
            label: group.methods.iter().map(|m| m.method.mid.as_str()).collect::<Vec<_>>().join(" "),
            colors,
            highlight: group.methods.iter().any(|m| m.best),
        });
    }
    let name: String = record
        .key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let path = dir.join(format!("{name}.svg"));
    save_svg(&path, &strips).with_context(|| format!("writing {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    Ok(match path {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    })
}

fn multi_top_n(multi: Option<Option<usize>>, config: &PipelineConfig) -> Option<usize> {
    multi.map(|n| n.unwrap_or(config.top_n))
}

fn pick(args: PickArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let trained: Vec<TrainedEntry> = read_json(&args.trained)?;
    let mut ctx = Context::new();
    let selection = match multi_top_n(args.multi, &config) {
        Some(top_n) => select_multi(&trained, &STANDARD, &args.colors, &mut ctx, top_n)?,
        None => select(&trained, &args.colors, &mut ctx)?,
    };
    println!("{}\t{:.4}", selection.id, selection.similarity);
    if args.sort {
        let method = STANDARD
            .get(&selection.id)
            .with_context(|| format!("{} is not registered", selection.id))?;
        println!("{}", method.sort(&args.colors, &mut ctx)?.join(" "));
    }
    Ok(())
}

fn methods(filter: Option<String>) -> Result<()> {
    let pattern = filter.as_deref().map(Regex::new).transpose()?;
    for method in STANDARD.methods() {
        if pattern.as_ref().map_or(true, |p| p.is_match(&method.id)) {
            println!("{}\t{:?}", method.id, method.speed);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Compute(args) => compute(args),
        Command::Train { input, output } => {
            let results: Vec<PaletteRecord> = read_json(&input)?;
            let trained = train(&results);
            write_json(&output, &trained)?;
            info!(entries = trained.len(), output = %output.display(), "written");
            Ok(())
        }
        Command::Pick(args) => pick(args),
        Command::Methods { filter } => methods(filter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette_sort::select::DEFAULT_TOP_N;

    fn pick_args(args: &[&str]) -> PickArgs {
        // Colors first so a bare `--multi` cannot swallow one.
        let argv = ["palette-compute", "pick", "--trained", "t.json", "#000000"]
            .into_iter()
            .chain(args.iter().copied());
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Pick(args) => args,
            _ => panic!("not a pick"),
        }
    }

    #[test]
    fn test_multi_defaults_to_configured_top_n() {
        let default = PipelineConfig::default();
        assert_eq!(multi_top_n(pick_args(&[]).multi, &default), None);
        assert_eq!(multi_top_n(pick_args(&["--multi"]).multi, &default), Some(DEFAULT_TOP_N));
        assert_eq!(multi_top_n(pick_args(&["--multi", "3"]).multi, &default), Some(3));

        let config = PipelineConfig {
            top_n: 4,
            ..PipelineConfig::default()
        };
        assert_eq!(multi_top_n(pick_args(&["--multi"]).multi, &config), Some(4));
        assert_eq!(multi_top_n(pick_args(&["--multi", "3"]).multi, &config), Some(3));
    }

    #[test]
    fn test_pick_reads_top_n_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"topN": 2}"#).unwrap();
        let args = pick_args(&["--multi", "--config", path.to_str().unwrap()]);
        let config = load_config(args.config.as_deref()).unwrap();
        assert_eq!(multi_top_n(args.multi, &config), Some(2));
    }
}
