use clap::{Parser, ValueEnum};
use log::{error, info};
use recipe_duck::{ProviderKind, RecipeDuckError, RecipeImporter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "recipe-duck", version)]
#[command(about = "Extract a recipe from a photo, web page or YouTube video into markdown", long_about = None)]
struct Args {
    /// Recipe image path, or an http(s) URL of a recipe page or video
    input: String,

    /// Output file; `-` writes to stdout. Defaults to the image path with
    /// `.md`, or `<page slug>.md` for URLs
    #[arg(short, long)]
    output: Option<String>,

    /// Keep the model's markdown as is
    #[arg(long)]
    no_format: bool,

    /// Fetch the page as given instead of looking for a print version
    #[arg(long)]
    no_print_url: bool,

    /// AI provider, disabling the fallback chain
    #[arg(long, value_enum)]
    provider: Option<ProviderArg>,

    /// Model name for the provider
    #[arg(long)]
    model: Option<String>,

    /// API key for the provider
    #[arg(long)]
    api_key: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ProviderArg {
    Anthropic,
    #[value(name = "openai")]
    OpenAI,
}

impl From<ProviderArg> for ProviderKind {
    fn from(provider: ProviderArg) -> Self {
        match provider {
            ProviderArg::Anthropic => ProviderKind::Anthropic,
            ProviderArg::OpenAI => ProviderKind::OpenAI,
        }
    }
}

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// File name stem for a recipe page: its last path segment, snake_cased
fn filename_from_url(url: &str) -> String {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .splitn(4, '/')
        .nth(3)
        .unwrap_or_default();

    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .map(|segment| segment.replace('-', "_"))
        .unwrap_or_else(|| "recipe".to_string())
}

fn output_path(args: &Args) -> Option<PathBuf> {
    match args.output.as_deref() {
        Some("-") => None,
        Some(path) => Some(PathBuf::from(path)),
        None if is_url(&args.input) => {
            Some(PathBuf::from(format!("{}.md", filename_from_url(&args.input))))
        }
        None => Some(Path::new(&args.input).with_extension("md")),
    }
}

async fn run(args: Args) -> Result<(), RecipeDuckError> {
    let mut builder = RecipeImporter::builder();
    builder = if is_url(&args.input) {
        builder.url(&args.input)
    } else {
        builder.image(&args.input)
    };

    if args.no_format {
        builder = builder.no_format();
    }
    if args.no_print_url {
        builder = builder.no_print_url();
    }
    if let Some(provider) = args.provider {
        builder = builder.provider(provider.into());
    }
    if let Some(model) = &args.model {
        builder = builder.model(model);
    }
    if let Some(key) = &args.api_key {
        builder = builder.api_key(key);
    }

    let recipe = builder.build().await?;
    if let Some(resolved) = &recipe.resolved_url {
        info!("Recipe read from {} ({})", resolved.url, resolved.method);
    }

    match output_path(&args) {
        Some(path) => {
            tokio::fs::write(&path, &recipe.markdown).await?;
            println!("Recipe saved to: {}", path.display());
        }
        None => println!("{}", recipe.markdown),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
