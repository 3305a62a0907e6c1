use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use seeclaw_parser::config::{self, ParserConfig};
use seeclaw_parser::{
    action_parser_with, Dialect, FactorInput, ModelVersion, ParseRequest, ParserError,
    ParserResult, ScreenContext,
};

#[derive(Parser, Debug)]
#[command(
    name = "seeclaw-parse",
    version,
    about = "Parse VLM action text into structured GUI actions (JSON on stdout)"
)]
struct Cli {
    /// Input file; reads stdin when omitted
    input: Option<PathBuf>,
    /// Treat the input as a JSON request instead of raw prediction text
    #[arg(long)]
    json: bool,
    /// Config file (defaults to $SEECLAW_PARSER_CONFIG or ./parser.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Coordinate factor; one value for both axes or WIDTH,HEIGHT
    #[arg(long, value_delimiter = ',', num_args = 1..=2)]
    factor: Option<Vec<f64>>,
    /// Screen width in pixels
    #[arg(long, requires = "height")]
    width: Option<f64>,
    /// Screen height in pixels
    #[arg(long, requires = "width")]
    height: Option<f64>,
    /// Scale applied to absolute coordinates
    #[arg(long)]
    scale: Option<f64>,
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    #[arg(long = "model-ver", value_enum)]
    model_ver: Option<ModelArg>,
    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Bc,
    O1,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModelArg {
    #[value(name = "V1_0")]
    V10,
    #[value(name = "V1_5")]
    V15,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();

    if let Err(e) = run(Cli::parse()) {
        tracing::error!(error = %e, "parse failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> ParserResult<()> {
    let config = base_config(&cli)?;
    let input = read_input(cli.input.as_ref())?;
    let request = build_request(&cli, &config, input)?;

    let output = action_parser_with(&request, &config.smart_resize)?;
    tracing::info!(actions = output.parsed.len(), "prediction parsed");

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{rendered}");
    Ok(())
}

/// An explicit `--config` must load; otherwise a missing file means defaults.
fn base_config(cli: &Cli) -> ParserResult<ParserConfig> {
    match &cli.config {
        Some(path) => config::load_config_from(path),
        None => Ok(config::load_config().unwrap_or_else(|e| {
            tracing::debug!(error = %e, "no config file, using built-in defaults");
            ParserConfig::default()
        })),
    }
}

fn build_request(cli: &Cli, config: &ParserConfig, input: String) -> ParserResult<ParseRequest> {
    let mut request = if cli.json {
        serde_json::from_str::<ParseRequest>(&input)?
    } else {
        config.request(input)
    };
    apply_overrides(&mut request, cli)?;
    Ok(request)
}

fn read_input(path: Option<&PathBuf>) -> ParserResult<String> {
    match path {
        Some(p) => Ok(std::fs::read_to_string(p)?),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn apply_overrides(request: &mut ParseRequest, cli: &Cli) -> ParserResult<()> {
    if let Some(values) = &cli.factor {
        request.factor = match values.as_slice() {
            [f] => FactorInput::Scalar(*f),
            [w, h] => FactorInput::Pair([*w, *h]),
            _ => return Err(ParserError::InvalidConfig("--factor takes one or two values".into())),
        };
    }
    if let (Some(width), Some(height)) = (cli.width, cli.height) {
        request.screen_context = Some(ScreenContext::new(width, height));
    }
    if let Some(scale) = cli.scale {
        request.scale_factor = Some(scale);
    }
    if let Some(mode) = cli.mode {
        request.mode = match mode {
            ModeArg::Bc => Dialect::Bc,
            ModeArg::O1 => Dialect::O1,
        };
    }
    if let Some(ver) = cli.model_ver {
        request.model_ver = match ver {
            ModelArg::V10 => ModelVersion::V1_0,
            ModelArg::V15 => ModelVersion::V1_5,
        };
    }
    Ok(())
}
