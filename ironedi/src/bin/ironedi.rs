//! IronEDI command line (ironedi)
//!
//! # Usage
//!
//! ```bash
//! # Compile a model set into artifacts
//! ironedi compile schemas/d03b.toml --namespace com.acme.d03b --out target/edi
//!
//! # Compile every mapping listed in ironedi.toml, clearing the output first
//! ironedi compile --config ironedi.toml --clean
//!
//! # Encode a JSON instance with a schema document
//! ironedi encode orders.xml order.json --delimiter field=|
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use ironedi::config::CONFIG_FILE;
use ironedi::compiler::{ClassModelCompiler, ClassRegistry, CompileOptions};
use ironedi::schema::load_model_set;
use ironedi::{Bean, Config, DelimiterType, EdiEncoder, Executor};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ironedi")]
#[command(version)]
#[command(about = "IronEDI - EDI schema compiler and flat-file encoder")]
struct Cli {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a schema model set into artifacts
    Compile {
        /// Root schema reference (edimap document or .toml manifest)
        schema: Option<String>,

        /// Base namespace
        #[arg(short, long)]
        namespace: Option<String>,

        /// Output root
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Comma-separated message allow-list
        #[arg(short, long)]
        messages: Option<String>,

        /// Config file listing mappings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Remove the output root before compiling
        #[arg(long)]
        clean: bool,
    },

    /// Encode a JSON instance as EDI text
    Encode {
        /// Schema document or .toml manifest
        schema: PathBuf,

        /// JSON instance file
        instance: PathBuf,

        /// Message to encode when the schema holds several
        #[arg(short, long)]
        message: Option<String>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Delimiter override, e.g. `field=|` or `escape=\`
        #[arg(short, long = "delimiter", value_name = "KIND=TEXT")]
        delimiters: Vec<String>,

        /// Flush after every segment
        #[arg(long)]
        flush_segments: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.command {
        Commands::Compile {
            config: Some(path), ..
        } => Some(Config::load(path)?),
        Commands::Compile { config: None, .. } if Path::new(CONFIG_FILE).is_file() => {
            Some(Config::load(Path::new(CONFIG_FILE))?)
        }
        _ => None,
    };

    let level = cli
        .log_level
        .clone()
        .or_else(|| config.as_ref().map(|c| c.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Compile {
            schema,
            namespace,
            out,
            messages,
            config: config_path,
            clean,
        } => {
            let executors = match (schema, config) {
                (Some(schema), _) => {
                    let namespace = namespace.context("--namespace is required with a schema")?;
                    let mut builder = Executor::builder()
                        .schema(schema)
                        .destination(out.unwrap_or_else(|| PathBuf::from("target/ironedi")))
                        .namespace(namespace);
                    if let Some(messages) = messages {
                        builder = builder.messages(messages);
                    }
                    vec![builder.build()?]
                }
                (None, Some(mut config)) => {
                    if let Some(out) = out {
                        config.destination = out;
                    }
                    if messages.is_some() {
                        config.messages = messages;
                    }
                    let base = config_path
                        .as_deref()
                        .and_then(Path::parent)
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| PathBuf::from("."));
                    config.executors(&base)?
                }
                (None, None) => bail!("nothing to compile: pass a schema or a config file"),
            };
            cmd_compile(&executors, clean)
        }
        Commands::Encode {
            schema,
            message,
            instance,
            out,
            delimiters,
            flush_segments,
        } => cmd_encode(
            &schema,
            message.as_deref(),
            &instance,
            out.as_deref(),
            &delimiters,
            flush_segments,
        ),
    }
}

fn cmd_compile(executors: &[Executor], clean: bool) -> Result<()> {
    for executor in executors {
        let destination = executor.destination();
        if clean && destination.is_dir() {
            fs::remove_dir_all(destination)
                .with_context(|| format!("cannot clean {}", destination.display()))?;
            tracing::info!("Removed {}", destination.display());
        }

        let report = executor.execute()?;
        for artifact in &report.artifacts {
            println!("{}", artifact.display());
        }
        if let Some(factory) = &report.interchange {
            tracing::info!(
                "{} {} messages: {}",
                factory.name(),
                factory.flavour(),
                factory.message_names().collect::<Vec<_>>().join(", ")
            );
        }
    }
    Ok(())
}

fn cmd_encode(
    schema: &Path,
    message: Option<&str>,
    instance: &Path,
    out: Option<&Path>,
    overrides: &[String],
    flush_segments: bool,
) -> Result<()> {
    let reference = schema.to_string_lossy();
    let model_set = load_model_set(&reference, Path::new("."))?;
    let mut registry = ClassRegistry::new();
    if let Some(definitions) = model_set.definitions() {
        ClassModelCompiler::new("ironedi.encode.common")
            .options(CompileOptions::DEFINITIONS.with_flush_segments(flush_segments))
            .compile(definitions, &mut registry)?;
    }
    let mut messages = model_set
        .messages()
        .filter(|m| message.is_none_or(|name| m.description.name == name));
    let Some(schema_model) = messages.next() else {
        bail!("no matching message in {}", schema.display());
    };
    let model = ClassModelCompiler::new("ironedi.encode")
        .options(CompileOptions::STANDALONE.with_flush_segments(flush_segments))
        .compile(schema_model, &mut registry)
        .with_context(|| format!("cannot compile {}", schema_model.description))?;

    let mut delimiters = model.delimiters.clone();
    for entry in overrides {
        let (kind, text) = entry
            .split_once('=')
            .with_context(|| format!("delimiter override '{entry}' is not KIND=TEXT"))?;
        if kind == "escape" {
            delimiters = delimiters.with_escape(Some(text.to_string()));
        } else {
            let level: DelimiterType = kind.parse()?;
            delimiters.set(level, text);
        }
    }

    let text = fs::read_to_string(instance)
        .with_context(|| format!("cannot read {}", instance.display()))?;
    let json: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("invalid JSON in {}", instance.display()))?;
    let Some(object) = json.as_object() else {
        bail!("instance {} must be a JSON object", instance.display());
    };
    let bean = Bean::from_json(object);

    match out {
        Some(path) => {
            let mut writer = BufWriter::new(fs::File::create(path)?);
            model.root.encode(&bean, &mut writer, &delimiters)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            model.root.encode(&bean, &mut writer, &delimiters)?;
            writeln!(writer)?;
        }
    }
    tracing::debug!("Encoded {} with {}", instance.display(), schema.display());
    Ok(())
}
