use amdjs_core::{DirectorySource, LoaderConfig, ModuleContainer, Renderer, ScriptValue};
use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_FILE: &str = "amdjs.yaml";

/// amdjs - Load AMD-style script modules and render their components
#[derive(Parser, Debug)]
#[command(name = "amdjs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Module to require (prefix with `jsx!` to transform it first)
    #[arg(value_name = "MODULE")]
    module: Option<String>,

    /// Path to an amdjs.yaml (or JSON) configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory that module resources are resolved against
    #[arg(long, value_name = "DIR", default_value = ".")]
    resources: PathBuf,

    /// Logical root under which module resources live
    #[arg(long, value_name = "NAME")]
    root: Option<String>,

    /// Treat the module as a component and print its static markup
    #[arg(short, long)]
    render: bool,

    /// Component props as JSON (with --render)
    #[arg(long, value_name = "JSON", requires = "render")]
    props: Option<String>,

    /// Print the loaded modules after the require
    #[arg(long)]
    list: bool,

    /// Write a default amdjs.yaml to the current directory
    #[arg(long)]
    init: bool,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so module output stays clean on stdout.
    // Set RUST_LOG=debug for detailed logs
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(tracing::Level::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.init {
        return init_config(Path::new(DEFAULT_CONFIG_FILE));
    }

    let Some(module) = cli.module.as_deref() else {
        bail!("No module specified. Use --help for usage information.");
    };

    let config = load_config(&cli)?;
    let mut container = ModuleContainer::new(config, DirectorySource::new(&cli.resources))
        .context("Failed to start script engine")?;
    info!(
        root = %container.config().root,
        resources = %cli.resources.display(),
        "amdjs starting"
    );
    let value = container
        .require(module)
        .with_context(|| format!("Failed to load module '{module}'"))?;

    if cli.render {
        println!("{}", render(&mut container, &value, cli.props.as_deref())?);
    } else {
        println!("{}", format_value(&value)?);
    }

    if cli.list {
        println!();
        println!("Loaded modules:");
        for name in container.loaded_modules() {
            println!("  {name}");
        }
    }

    Ok(())
}

fn init_config(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    LoaderConfig::init_file(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Created {}", path.display());
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<LoaderConfig> {
    let mut config = match &cli.config {
        Some(path) => LoaderConfig::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                LoaderConfig::from_file(default_path)
                    .with_context(|| format!("Failed to load {DEFAULT_CONFIG_FILE}"))?
            } else {
                LoaderConfig::default()
            }
        }
    };

    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    debug!(?config, "configuration resolved");
    Ok(config)
}

fn render(
    container: &mut ModuleContainer,
    component: &ScriptValue,
    props: Option<&str>,
) -> anyhow::Result<String> {
    let props = props
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .context("--props is not valid JSON")?;

    let react = container.require_as::<Renderer>("react")?;
    let element = react
        .create_element(component, props, vec![])
        .context("Failed to create element")?;
    react
        .render_to_static_markup(&element)
        .context("Failed to render component")
}

/// Strings verbatim, everything JSON can express as JSON
fn format_value(value: &ScriptValue) -> anyhow::Result<String> {
    if let Some(text) = value.as_string() {
        return Ok(text);
    }
    match value.to_json()? {
        Some(json) => Ok(serde_json::to_string_pretty(&json)?),
        None => Ok(value.to_display_string()?),
    }
}
