use clap::{Parser, Subcommand};
use colored::*;
use graphrt::core::config::RuntimeConfig;
use graphrt::core::config::ConfigError;
use graphrt::{GraphModule, ModuleError, NodeId, RuntimeModule, Shape, Tensor};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(name = "graphrt")]
#[command(version = "0.1")]
#[command(about = "Interpreter for line-oriented elementwise computation graphs", long_about = None)]
struct Cli {
    /// Config file (defaults to $GRAPHRT_CONFIG or ./graphrt.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the subgraphs and nodes of a graph file
    Inspect {
        /// Path to the graph text file
        file: PathBuf,
    },
    /// Run one subgraph with constant-filled inputs
    Run {
        /// Path to the graph text file
        file: PathBuf,
        /// Subgraph to execute
        #[arg(long)]
        subgraph: String,
        /// Fill value per input, in input order; a single value fills every input
        #[arg(long = "fill", num_args = 1.., default_value = "1.0")]
        fill: Vec<f32>,
        /// Output format: 'display' (default, human-readable) or 'json'
        #[arg(long, default_value = "display")]
        format: String,
    },
    /// Save a graph file as a length-prefixed module binary
    Pack {
        file: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Restore the graph text from a module binary
    Unpack {
        file: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RuntimeConfig::from_file(path)?,
        None => RuntimeConfig::load()?,
    };
    init_logging(cli.verbose, &config)?;

    match cli.command {
        Commands::Inspect { file } => {
            let module = load_module(&file, &config)?;
            print_inspect(&module);
        }
        Commands::Run {
            file,
            subgraph,
            fill,
            format,
        } => {
            let mut module = load_module(&file, &config)?;
            match run_filled(&mut module, &subgraph, &fill) {
                Ok(output) => {
                    if format == "json" {
                        println!("{}", serde_json::to_string_pretty(&output)?);
                    } else {
                        println!("{} {}", "Output".bold().green(), output.shape);
                        println!("{:?}", output.data);
                    }
                }
                Err(e) => {
                    eprintln!("{}: {}", "Error".red(), e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Pack { file, output } => {
            let module = load_module(&file, &config)?;
            let mut writer = std::io::BufWriter::new(fs::File::create(&output)?);
            module.save_to_binary(&mut writer)?;
            writer.flush()?;
            println!("Packed {} into {}", file.display(), output.display().to_string().green());
        }
        Commands::Unpack { file, output } => {
            let bytes = fs::read(&file)?;
            let module = GraphModule::load_from_binary(bytes.as_slice())?;
            fs::write(&output, module.serialize())?;
            println!("Unpacked {} into {}", file.display(), output.display().to_string().green());
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, config: &RuntimeConfig) -> Result<(), ConfigError> {
    let level = match verbose {
        0 => config.logging.max_level()?,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_module(path: &Path, config: &RuntimeConfig) -> Result<GraphModule, ModuleError> {
    GraphModule::create_from_path_with(path, &config.parser)
}

fn print_inspect(module: &GraphModule) {
    let graph = module.graph();
    println!(
        "{} ({} subgraphs, {} slots)",
        module.type_key().bold().blue(),
        graph.subgraphs.len(),
        graph.pool.len()
    );
    for sg in &graph.subgraphs {
        println!("{}", sg.name.bold());
        for id in &sg.inputs {
            let shape = graph
                .pool
                .get(*id)
                .map(|t| t.shape.to_string())
                .unwrap_or_default();
            println!("  {} {} {}", "input".yellow(), id, shape);
        }
        for node in &sg.nodes {
            let inputs: Vec<String> = node.inputs.iter().map(|i| i.to_string()).collect();
            let shape = graph
                .pool
                .get(node.output)
                .map(|t| t.shape.to_string())
                .unwrap_or_default();
            println!("  {} {} <- ({}) {}", node.op.cyan(), node.output, inputs.join(", "), shape);
        }
    }
}

/// Builds inputs for slots `0..n` (the positional convention `run` uses) and
/// executes the subgraph.
fn run_filled(module: &mut GraphModule, subgraph: &str, fill: &[f32]) -> Result<Tensor, Box<dyn std::error::Error>> {
    let (input_shapes, output_shape) = {
        let executor = module.executor();
        let sg = executor.subgraph(subgraph)?;
        let n = sg.inputs.len();
        if fill.len() != 1 && fill.len() != n {
            return Err(format!("expected 1 or {} fill values, got {}", n, fill.len()).into());
        }
        let input_shapes = (0..n)
            .map(|i| executor.pool().get(NodeId(i)).map(|t| t.shape.clone()))
            .collect::<Result<Vec<Shape>, _>>()?;
        let out_id = sg.output().ok_or("subgraph has no nodes")?;
        (input_shapes, executor.pool().get(out_id)?.shape.clone())
    };

    let inputs: Vec<Tensor> = input_shapes
        .into_iter()
        .enumerate()
        .map(|(i, shape)| Tensor::filled(shape, fill[if fill.len() == 1 { 0 } else { i }]))
        .collect();
    let input_refs: Vec<&Tensor> = inputs.iter().collect();

    let mut output = Tensor::zeros(output_shape);
    module.get_callable(subgraph)?.call(&input_refs, &mut output)?;
    Ok(output)
}
