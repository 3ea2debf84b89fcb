// jsonlayout command line tool
//
// Packs value documents into fixed-layout buffers, unpacks buffers back to
// JSON, and lists the leaf layout of a description.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use jsonlayout::{ExceptionSet, FloatByteOrder, JsonModel, ModelConfig};
use serde_json::{Map, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "jsonlayout", version, about = "JSON documents to fixed-layout binary buffers")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// JSON model configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Leave out keys containing this substring (repeatable)
    #[arg(long = "exception", global = true)]
    exceptions: Vec<String>,

    /// Byte order of FLOAT and DOUBLE fields
    #[arg(long, global = true, value_enum)]
    float_order: Option<FloatOrderArg>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FloatOrderArg {
    Native,
    Big,
    Little,
}

impl From<FloatOrderArg> for FloatByteOrder {
    fn from(arg: FloatOrderArg) -> Self {
        match arg {
            FloatOrderArg::Native => FloatByteOrder::Native,
            FloatOrderArg::Big => FloatByteOrder::Big,
            FloatOrderArg::Little => FloatByteOrder::Little,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serialize a value document using its description
    Pack {
        values: PathBuf,
        description: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Serialize the defaults of a description
    Defaults {
        description: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Read a buffer against a description and print it as JSON
    Unpack {
        description: PathBuf,
        buffer: PathBuf,
        /// Compact single-line output
        #[arg(long)]
        compact: bool,
    },
    /// List every leaf with its address, size, type and mode
    Inspect {
        description: PathBuf,
        /// Values to show instead of the description defaults
        #[arg(long)]
        values: Option<PathBuf>,
        /// Print the leaf attributes as a JSON array
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Write the buffer to this file instead of a hex dump on stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Leave read-only fields out of the buffer
    #[arg(long)]
    rw_only: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let mut model = JsonModel::with_config(load_config(&cli.global)?);

    match cli.command {
        Command::Pack {
            values,
            description,
            output,
        } => {
            model.load_files(&values, &description)?;
            write_buffer(&model, &output)?;
        }
        Command::Defaults { description, output } => {
            model.load_description_file(&description)?;
            write_buffer(&model, &output)?;
        }
        Command::Unpack {
            description,
            buffer,
            compact,
        } => {
            model.load_description_file(&description)?;
            model.deserialize(&fs::read(&buffer)?)?;
            println!("{}", model.json_text(!compact)?);
        }
        Command::Inspect {
            description,
            values,
            json,
        } => {
            match values {
                Some(values) => model.load_files(&values, &description)?,
                None => model.load_description_file(&description)?,
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&leaf_attributes(&model))?);
            } else {
                print_layout(&model);
            }
        }
    }
    Ok(())
}

fn load_config(global: &GlobalArgs) -> Result<ModelConfig, Box<dyn std::error::Error>> {
    let mut config = match &global.config {
        Some(path) => ModelConfig::from_json_str(&fs::read_to_string(path)?)?,
        None => ModelConfig::default(),
    };
    if !global.exceptions.is_empty() {
        let mut patterns = config.exceptions.patterns().to_vec();
        patterns.extend(global.exceptions.iter().cloned());
        config = config.with_exceptions(ExceptionSet::new(patterns));
    }
    if let Some(order) = global.float_order {
        config = config.with_float_byte_order(order.into());
    }
    Ok(config)
}

fn write_buffer(model: &JsonModel, output: &OutputArgs) -> Result<(), Box<dyn std::error::Error>> {
    let buffer = model.serialize_with(output.rw_only)?;
    match &output.output {
        Some(path) => {
            fs::write(path, &buffer)?;
            info!(bytes = buffer.len(), path = %path.display(), "wrote buffer");
        }
        None => print!("{}", hex_dump(&buffer)),
    }
    Ok(())
}

fn print_layout(model: &JsonModel) {
    let tree = model.tree();
    for id in tree.leaves() {
        let Some(node) = tree.node(id) else { continue };
        let value = node.value().map(|v| v.to_text()).unwrap_or_default();
        match node.layout() {
            Some(layout) => println!(
                "{:#06x} {:>4} {:<6} {:<2} {} = {:?}",
                layout.address,
                layout.byte_size,
                layout.field_type,
                layout.edit_mode,
                tree.path_of(id),
                value.trim_end_matches('\0'),
            ),
            None => println!("{:>20} {} = {:?}", "-", tree.path_of(id), value),
        }
    }
}

/// One object per addressed leaf: its path, layout attributes, mode and value.
fn leaf_attributes(model: &JsonModel) -> Value {
    let tree = model.tree();
    let leaves = tree
        .leaves()
        .into_iter()
        .filter_map(|id| {
            let node = tree.node(id)?;
            let layout = node.layout()?;
            let mut entry = Map::new();
            entry.insert("path".to_string(), Value::from(tree.path_of(id)));
            entry.extend(layout.attributes());
            entry.insert("mode2".to_string(), Value::from(layout.edit_mode.to_string()));
            let value = node.value().map(|v| v.to_text()).unwrap_or_default();
            entry.insert("value".to_string(), Value::from(value.trim_end_matches('\0')));
            Some(Value::Object(entry))
        })
        .collect();
    Value::Array(leaves)
}

/// Sixteen bytes per line, prefixed with the offset.
fn hex_dump(buffer: &[u8]) -> String {
    let mut out = String::new();
    for (line, chunk) in buffer.chunks(16).enumerate() {
        let bytes: Vec<String> = chunk.iter().map(|b| hex::encode([*b])).collect();
        out.push_str(&format!("{:08x}  {}\n", line * 16, bytes.join(" ")));
    }
    out
}
