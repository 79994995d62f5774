use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use elasticnn_distance::{
    ChannelMode, DistanceKernel, Dtw, EditStep, Erp, KernelSpec, Sequence, Wdtw, Window,
};
use elasticnn_io::{ClassLabels, ExperimentName, LabelledCsvReader, PredictionWriter, RunInfo};
use elasticnn_search::KnnConfig;

#[derive(Parser)]
#[command(name = "elasticnn")]
#[command(about = "Elastic-distance nearest-neighbour time series classification")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Kernel selection shared by every subcommand.
#[derive(Args, Debug, Clone)]
struct KernelArgs {
    /// Distance kernel: "dtw", "wdtw" or "erp"
    #[arg(long, default_value = "dtw")]
    kernel: String,

    /// Sakoe-Chiba warping window radius (-1 = unconstrained)
    #[arg(
        long,
        default_value_t = -1,
        allow_negative_numbers = true,
        conflicts_with = "window_fraction"
    )]
    window: i64,

    /// Warping window as a fraction of the longer sequence, in [0, 1]
    #[arg(long)]
    window_fraction: Option<f64>,

    /// WDTW steepness or ERP gap value (kernel default if not set)
    #[arg(long)]
    g: Option<f64>,

    /// Multichannel handling: "dependent" or "independent"
    #[arg(long, default_value = "dependent")]
    channel_mode: String,

    /// Number of equal-length channels each row is split into
    #[arg(long, default_value_t = 1)]
    channels: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Classify a labelled test set against a labelled training set
    Classify {
        /// Path to the training CSV file (id,label,v0,...)
        #[arg(long)]
        train: PathBuf,

        /// Path to the test CSV file (id,label,v0,...)
        #[arg(long)]
        test: PathBuf,

        /// Number of nearest neighbours
        #[arg(long, default_value_t = 1)]
        k: usize,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// RNG seed for the trim of tied neighbours
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Z-normalize every channel before classification
        #[arg(long, default_value_t = false)]
        normalize: bool,

        /// Classify on the Keogh-Pazzani first derivative
        #[arg(long, default_value_t = false)]
        derivative: bool,

        /// Compare every training sequence in full instead of abandoning
        #[arg(long, default_value_t = false)]
        no_early_abandon: bool,

        #[command(flatten)]
        kernel: KernelArgs,
    },

    /// Compute the distance between two inline sequences
    Distance {
        /// First sequence, comma-separated
        #[arg(long, allow_hyphen_values = true)]
        a: String,

        /// Second sequence, comma-separated
        #[arg(long, allow_hyphen_values = true)]
        b: String,

        /// Abandon once the distance exceeds this bound
        #[arg(long)]
        cutoff: Option<f64>,

        /// Also print the alignment path (dtw and erp only)
        #[arg(long, default_value_t = false)]
        path: bool,

        #[command(flatten)]
        kernel: KernelArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct ClassifyOutput {
    experiment: String,
    kernel: String,
    k: usize,
    n_train: usize,
    n_test: usize,
    n_classes: usize,
    accuracy: f64,
    n_compared: usize,
    n_abandoned: usize,
    artifact: PathBuf,
}

#[derive(Serialize)]
struct DistanceOutput {
    kernel: String,
    distance: Option<f64>,
    exceeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<Vec<PathStep>>,
}

/// One aligned pair; a `None` side is a gap.
#[derive(Serialize)]
struct PathStep {
    a: Option<usize>,
    b: Option<usize>,
}

fn build_window(args: &KernelArgs) -> Result<Window> {
    let window = match args.window_fraction {
        Some(fraction) => Window::fraction(fraction)?,
        None => Window::from_radius(args.window)?,
    };
    Ok(window)
}

fn build_spec(args: &KernelArgs) -> Result<KernelSpec> {
    let window = build_window(args)?;
    match args.kernel.as_str() {
        "dtw" => {
            if args.g.is_some() {
                warn!("--g has no effect on dtw");
            }
            Ok(KernelSpec::Dtw { window })
        }
        "wdtw" => Ok(KernelSpec::Wdtw {
            window,
            g: args.g.unwrap_or(Wdtw::DEFAULT_G),
        }),
        "erp" => Ok(KernelSpec::Erp {
            window,
            g: args.g.unwrap_or(Erp::DEFAULT_G),
        }),
        other => anyhow::bail!("unknown kernel: {other} (expected dtw, wdtw, or erp)"),
    }
}

fn parse_channel_mode(s: &str) -> Result<ChannelMode> {
    match s {
        "dependent" => Ok(ChannelMode::Dependent),
        "independent" => Ok(ChannelMode::Independent),
        other => anyhow::bail!("unknown channel mode: {other} (expected dependent or independent)"),
    }
}

fn parse_sequence(raw: &str, n_channels: usize) -> Result<Sequence> {
    let values = raw
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .with_context(|| format!("invalid value \"{}\"", v.trim()))
        })
        .collect::<Result<Vec<_>>>()?;
    Sequence::from_flat(values, n_channels).context("invalid sequence")
}

fn preprocess_sequences(
    sequences: Vec<Sequence>,
    normalize: bool,
    use_derivative: bool,
) -> Result<Vec<Sequence>> {
    let mut result = sequences;
    if normalize {
        result = elasticnn_distance::z_normalize_batch(&result)
            .context("z-normalization failed")?;
        info!(n = result.len(), "z-normalized sequences");
    }
    if use_derivative {
        result = result
            .iter()
            .map(|s| elasticnn_distance::derivative(s).context("derivative computation failed"))
            .collect::<Result<Vec<_>>>()?;
        info!(n = result.len(), "computed derivative sequences");
    }
    Ok(result)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Classify {
            train,
            test,
            k,
            experiment,
            output_dir,
            seed,
            normalize,
            derivative,
            no_early_abandon,
            kernel,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;
            let spec = build_spec(&kernel)?;
            let channel_mode = parse_channel_mode(&kernel.channel_mode)?;

            let mut train = LabelledCsvReader::new(&train)
                .with_channels(kernel.channels)
                .read()
                .context("failed to read training CSV")?;
            let mut test = LabelledCsvReader::new(&test)
                .with_channels(kernel.channels)
                .read()
                .context("failed to read test CSV")?;

            train.sequences =
                preprocess_sequences(std::mem::take(&mut train.sequences), normalize, derivative)?;
            test.sequences =
                preprocess_sequences(std::mem::take(&mut test.sequences), normalize, derivative)?;

            let classes = ClassLabels::from_labels(&train.labels);
            let train_labels = train.encode_labels(&classes)?;
            test.encode_labels(&classes)
                .context("test set holds a label absent from the training set")?;
            info!(n_classes = classes.len(), "class labels encoded");

            let config = KnnConfig::new(k, spec)?
                .with_channel_mode(channel_mode)
                .with_seed(seed)
                .with_early_abandon(!no_early_abandon);
            let n_train = train.n_samples();
            let model = config
                .fit(std::mem::take(&mut train.sequences), train_labels, classes.len())
                .context("failed to fit classifier")?;

            let predictions = model
                .predict_batch(&test.sequences)
                .context("classification failed")?;

            let run = RunInfo {
                kernel: model.kernel().name(),
                k,
                seed,
            };
            let writer = PredictionWriter::new(&output_dir, experiment_name)?;
            let summary =
                writer.write_predictions(&run, &train.ids, &test, &predictions, &classes)?;

            let output = ClassifyOutput {
                experiment,
                kernel: run.kernel,
                k,
                n_train,
                n_test: test.n_samples(),
                n_classes: classes.len(),
                accuracy: summary.accuracy,
                n_compared: predictions.iter().map(|p| p.n_compared()).sum(),
                n_abandoned: predictions.iter().map(|p| p.n_abandoned()).sum(),
                artifact: summary.path,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Distance {
            a,
            b,
            cutoff,
            path,
            kernel,
        } => {
            let spec = build_spec(&kernel)?;
            let channel_mode = parse_channel_mode(&kernel.channel_mode)?;
            let a = parse_sequence(&a, kernel.channels).context("failed to parse --a")?;
            let b = parse_sequence(&b, kernel.channels).context("failed to parse --b")?;
            let cutoff = cutoff.unwrap_or(f64::INFINITY);

            let kernel_impl = spec.build(channel_mode)?;
            let distance = kernel_impl.distance(a.as_view(), b.as_view(), cutoff)?;

            let steps = if path {
                if channel_mode == ChannelMode::Independent {
                    anyhow::bail!("--path is not available with independent channel mode");
                }
                Some(alignment_steps(spec, &a, &b)?)
            } else {
                None
            };

            let output = DistanceOutput {
                kernel: kernel_impl.name(),
                distance: (!distance.is_exceeded()).then(|| distance.value()),
                exceeded: distance.is_exceeded(),
                path: steps,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn alignment_steps(spec: KernelSpec, a: &Sequence, b: &Sequence) -> Result<Vec<PathStep>> {
    match spec {
        KernelSpec::Dtw { window } => {
            let (_, path) = Dtw::new(window)?.alignment(a.as_view(), b.as_view())?;
            Ok(path
                .steps()
                .iter()
                .map(|s| PathStep {
                    a: Some(s.a),
                    b: Some(s.b),
                })
                .collect())
        }
        KernelSpec::Erp { window, g } => {
            let (_, path) = Erp::new(window, g)?.alignment(a.as_view(), b.as_view())?;
            Ok(path
                .steps()
                .iter()
                .map(|step| match *step {
                    EditStep::Match { a, b } => PathStep {
                        a: Some(a),
                        b: Some(b),
                    },
                    EditStep::GapInA { b } => PathStep { a: None, b: Some(b) },
                    EditStep::GapInB { a } => PathStep { a: Some(a), b: None },
                })
                .collect())
        }
        KernelSpec::Wdtw { .. } => anyhow::bail!("--path is only available for dtw and erp"),
    }
}
