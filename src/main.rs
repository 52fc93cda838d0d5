use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use log::error;

use recipe_harvest::{build_extractor, storage, AppConfig, ExtractError, OutputFormat};

fn print_usage() {
    eprintln!("Usage: recipe-harvest [--format chat|markdown|cooklang] [--save] <url | media file>");
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let mut format = OutputFormat::Chat;
    let mut save = false;
    let mut input: Option<String> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--format" => {
                let Some(value) = args.next() else {
                    eprintln!("--format needs a value");
                    return ExitCode::FAILURE;
                };
                match value.parse() {
                    Ok(parsed) => format = parsed,
                    Err(e) => {
                        eprintln!("{e}");
                        return ExitCode::FAILURE;
                    }
                }
            }
            "--save" => save = true,
            "--help" | "-h" => {
                print_usage();
                return ExitCode::SUCCESS;
            }
            other if input.is_none() => input = Some(other.to_string()),
            other => {
                eprintln!("Unexpected argument: {other}");
                return ExitCode::FAILURE;
            }
        }
    }

    let Some(input) = input else {
        print_usage();
        return ExitCode::FAILURE;
    };

    match run(&input, format, save).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(input: &str, format: OutputFormat, save: bool) -> Result<String, ExtractError> {
    let config = AppConfig::load()?;
    let extractor = build_extractor(&config)?;

    let recipe = if input.starts_with("http://") || input.starts_with("https://") {
        extractor.extract_from_url(input).await?
    } else {
        extractor.extract_from_media(Path::new(input), None).await?
    };

    if save || config.storage.enabled {
        let dir = config
            .storage
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("recipes"));
        let path = storage::save_recipe(&recipe, &dir).await?;
        eprintln!("Saved to {}", path.display());
    }

    Ok(format.render(&recipe))
}
