use std::io;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use fits_schema_core::{FitsFile, SchemaDocument};
use fits_schema_render::{
    RenderConfig, plantuml, template_lines, write_diagram, write_fits_template, write_to,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fits-schema")]
#[command(version, about = "Render FITS schema documents as templates and diagrams")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a FITS header template (.tpl) from a schema document.
    Template(TemplateArgs),
    /// Render a PlantUML class diagram from a schema document.
    Diagram(DiagramArgs),
    /// Load and validate a schema document without rendering it.
    Validate(ValidateArgs),
    /// Write the default render configuration as YAML.
    InitConfig(InitConfigArgs),
}

#[derive(Debug, Args)]
struct SchemaArgs {
    /// Schema document (.yaml, .yml or .json).
    #[arg(long)]
    schema: PathBuf,
    /// Render configuration YAML file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Datamodel identifier for extensions that do not set one.
    #[arg(long)]
    datamodel: Option<String>,
}

#[derive(Debug, Args)]
struct TemplateArgs {
    #[command(flatten)]
    input: SchemaArgs,
    /// Output file (default: stdout).
    #[arg(long)]
    output: Option<PathBuf>,
    /// Replace `TTYPE#`-style placeholders with column numbers.
    #[arg(long)]
    number_columns: bool,
}

#[derive(Debug, Args)]
struct DiagramArgs {
    #[command(flatten)]
    input: SchemaArgs,
    /// Output file (default: stdout).
    #[arg(long)]
    output: Option<PathBuf>,
    /// List every attribute of each class.
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    #[command(flatten)]
    input: SchemaArgs,
}

#[derive(Debug, Args)]
struct InitConfigArgs {
    /// Destination YAML file.
    #[arg(long)]
    output: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Template(args) => run_template(args),
        Command::Diagram(args) => run_diagram(args),
        Command::Validate(args) => run_validate(args),
        Command::InitConfig(args) => run_init_config(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn load_schema(input: &SchemaArgs) -> Result<(FitsFile, RenderConfig), String> {
    let mut config = RenderConfig::load_or_default(input.config.as_deref())
        .map_err(|err| format!("Failed to load render configuration: {err}"))?;
    if let Some(datamodel) = &input.datamodel {
        config.datamodel = datamodel.clone();
    }
    debug!(datamodel = %config.datamodel, "Using render configuration");

    let document = SchemaDocument::load(&input.schema)
        .map_err(|err| format!("Failed to read '{}': {err}", input.schema.display()))?;
    let file = document
        .build(&config.datamodel)
        .map_err(|err| format!("Invalid schema '{}': {err}", input.schema.display()))?;
    Ok((file, config))
}

fn run_template(args: TemplateArgs) -> Result<(), String> {
    let (file, mut config) = load_schema(&args.input)?;
    if args.number_columns {
        config.number_columns = true;
    }

    match &args.output {
        Some(path) => {
            let count = write_fits_template(&file, path, &config).map_err(|e| e.to_string())?;
            println!("Wrote {count} line(s) to '{}'.", path.display());
        }
        None => {
            let lines = template_lines(&file, &config).map_err(|e| e.to_string())?;
            write_to(lines, io::stdout().lock()).map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}

fn run_diagram(args: DiagramArgs) -> Result<(), String> {
    let (file, mut config) = load_schema(&args.input)?;
    if args.verbose {
        config.diagram.verbose = true;
    }

    match &args.output {
        Some(path) => {
            let count = write_diagram(&file, path, &config).map_err(|e| e.to_string())?;
            println!("Wrote {count} line(s) to '{}'.", path.display());
        }
        None => {
            let lines = plantuml(&file, &config.diagram).map_err(|e| e.to_string())?;
            write_to(lines, io::stdout().lock()).map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let (file, _) = load_schema(&args.input)?;
    println!(
        "Schema '{}' is valid: {} extension(s), {} header(s), {} column(s).",
        args.input.schema.display(),
        file.extensions().len(),
        file.header_count(),
        file.column_count()
    );
    Ok(())
}

fn run_init_config(args: InitConfigArgs) -> Result<(), String> {
    RenderConfig::default()
        .save(&args.output)
        .map_err(|err| format!("Failed to write '{}': {err}", args.output.display()))?;
    println!("Wrote default configuration to '{}'.", args.output.display());
    Ok(())
}
