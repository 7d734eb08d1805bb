//! Renders a themed template to stdout.
//!
//! ```text
//! themeview-demo --base themes --theme example --layout main \
//!     --set title=Hello --set 'items=[1,2,3]' index
//! ```

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::debug;
use serde_json::Value;
use themeview::{IoSink, OutputSink, RegistryBuilder, RegistryConfig, ThemeRegistry, ViewOptions};

#[derive(Parser, Debug)]
#[command(name = "themeview-demo")]
#[command(version, about = "Render a themed template to stdout", long_about = None)]
struct Cli {
    /// YAML registry config; flags below override its settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the theme directories
    #[arg(short, long, default_value = "themes")]
    base: PathBuf,

    /// Active theme
    #[arg(short, long)]
    theme: Option<String>,

    /// Active layout
    #[arg(short, long)]
    layout: Option<String>,

    /// Shared data entry; VALUE is parsed as JSON, falling back to a string
    #[arg(short, long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    set: Vec<(String, Value)>,

    /// Allow shared templates to stand in for a missing view
    #[arg(long)]
    fallback: bool,

    /// Print the view without wrapping it in a layout
    #[arg(long)]
    view_only: bool,

    /// View to render, e.g. `index` or `partials/nav`
    template: String,
}

fn parse_assignment(raw: &str) -> Result<(String, Value)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("expected KEY=VALUE, got \"{}\"", raw);
    };
    if key.is_empty() {
        bail!("empty key in \"{}\"", raw);
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::from(value));
    Ok((key.to_string(), value))
}

fn registry(cli: &Cli) -> Result<ThemeRegistry> {
    let mut builder = match &cli.config {
        Some(path) => RegistryConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?
            .builder(),
        None => RegistryBuilder::new(&cli.base),
    };

    if let Some(theme) = &cli.theme {
        builder = builder.theme(theme);
    }
    if let Some(layout) = &cli.layout {
        builder = builder.layout(layout);
    }
    for (key, value) in &cli.set {
        builder = builder.data(key, value.clone());
    }

    builder.build().context("failed to set up themes")
}

fn run(cli: Cli) -> Result<()> {
    let themes = registry(&cli)?;
    debug!(
        "rendering {} with theme {} and layout {}",
        cli.template,
        themes.theme(),
        themes.layout()
    );

    let options = ViewOptions::strict().fallback(cli.fallback);
    let stdout = IoSink::new(io::stdout().lock());

    let sink = if cli.view_only {
        let view = themes.render_view(&cli.template, &(), options)?;
        let mut sink = stdout;
        sink.write_body(&view)?;
        sink
    } else {
        themes.render_with_options(stdout, &cli.template, &(), options)?
    };
    sink.into_inner()?;

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
