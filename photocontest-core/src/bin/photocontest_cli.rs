//! Photography Contest CLI - registration front end
//!
//! Commands: submit, validate, ping
//! Outputs JSON to stdout, logs to stderr
//! Exit 2 on validation failure, 1 on upload/forward/config failure

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

use photocontest_core::{
    config::check_preset, CloudinaryUploader, ContestConfig, Field, FormController, ImageFile,
    SheetsForwarder, SubmitError, SubmitOutcome, Validator,
};

#[derive(Parser)]
#[command(name = "photocontest-cli")]
#[command(about = "Photography Contest Registration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON config file; environment variables are used when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload images and forward a registration
    Submit(SubmitArgs),

    /// Check images against the selection rules without uploading
    Validate {
        /// Image files, in slot order
        #[arg(short, long = "image", required = true)]
        images: Vec<PathBuf>,
    },

    /// Check that the spreadsheet endpoint is alive
    Ping,
}

#[derive(Args)]
struct SubmitArgs {
    #[arg(long)]
    name_bengali: String,

    #[arg(long)]
    name_english: String,

    /// Category code
    #[arg(long, value_parser = ["mobile", "dslr"])]
    category: String,

    #[arg(long)]
    email: String,

    #[arg(long)]
    phone_number: String,

    #[arg(long)]
    whatsapp_number: String,

    #[arg(long)]
    institution: String,

    #[arg(long)]
    class: String,

    /// Image file (repeat up to 3 times), in slot order
    #[arg(short, long = "image")]
    images: Vec<PathBuf>,
}

impl SubmitArgs {
    fn field_values(&self) -> [(Field, &str); 8] {
        [
            (Field::NameBengali, self.name_bengali.as_str()),
            (Field::NameEnglish, self.name_english.as_str()),
            (Field::Category, self.category.as_str()),
            (Field::Email, self.email.as_str()),
            (Field::PhoneNumber, self.phone_number.as_str()),
            (Field::WhatsappNumber, self.whatsapp_number.as_str()),
            (Field::Institution, self.institution.as_str()),
            (Field::Class, self.class.as_str()),
        ]
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Failed to render output: {}", e),
    }
}

fn load_config(path: Option<&Path>) -> Result<ContestConfig, photocontest_core::ConfigError> {
    let config = match path {
        Some(p) => ContestConfig::load_from_file(p)?,
        None => ContestConfig::from_env()?,
    };
    check_preset(&config);
    Ok(config)
}

fn load_images(paths: &[PathBuf]) -> Result<Vec<ImageFile>, String> {
    paths
        .iter()
        .map(|p| ImageFile::from_path(p).map_err(|e| format!("{}: {}", p.display(), e)))
        .collect()
}

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { images } => validate(&images),
        Commands::Ping => {
            let config = match load_config(cli.config.as_deref()) {
                Ok(c) => c,
                Err(e) => return config_failure(e),
            };
            ping(&config).await
        }
        Commands::Submit(args) => {
            let config = match load_config(cli.config.as_deref()) {
                Ok(c) => c,
                Err(e) => return config_failure(e),
            };
            submit(&config, args).await
        }
    }
}

fn config_failure(e: photocontest_core::ConfigError) -> ExitCode {
    print_json(&serde_json::json!({
        "success": false,
        "error": format!("Failed to load config: {}", e),
    }));
    ExitCode::FAILURE
}

fn validate(paths: &[PathBuf]) -> ExitCode {
    let files = match load_images(paths) {
        Ok(f) => f,
        Err(e) => {
            print_json(&serde_json::json!({ "valid": false, "error": e }));
            return ExitCode::FAILURE;
        }
    };

    let outcome = Validator::new().check_batch(0, files);
    let accepted: Vec<_> = outcome.accepted.iter().map(|f| f.name.clone()).collect();

    print_json(&serde_json::json!({
        "valid": outcome.is_clean(),
        "accepted": accepted,
        "violations": outcome.violations,
    }));

    if outcome.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}

async fn ping(config: &ContestConfig) -> ExitCode {
    let forwarder = SheetsForwarder::from_config(reqwest::Client::new(), config);

    match forwarder.ping().await {
        Ok(message) => {
            print_json(&serde_json::json!({ "alive": true, "message": message }));
            ExitCode::SUCCESS
        }
        Err(e) => {
            print_json(&serde_json::json!({ "alive": false, "error": e.to_string() }));
            ExitCode::FAILURE
        }
    }
}

async fn submit(config: &ContestConfig, args: SubmitArgs) -> ExitCode {
    let files = match load_images(&args.images) {
        Ok(f) => f,
        Err(e) => {
            print_json(&serde_json::json!({ "success": false, "error": e }));
            return ExitCode::FAILURE;
        }
    };

    let client = reqwest::Client::new();
    let form = FormController::new(
        CloudinaryUploader::from_config(client.clone(), config),
        SheetsForwarder::from_config(client, config),
    );

    for (field, value) in args.field_values() {
        form.set_field(field, value);
    }

    let outcome = form.add_images(files);
    if !outcome.is_clean() {
        print_json(&serde_json::json!({
            "success": false,
            "errors": outcome.messages(),
        }));
        return ExitCode::from(2);
    }

    match form.submit().await {
        Ok(SubmitOutcome::Submitted(receipt)) => {
            print_json(&serde_json::json!({ "success": true, "receipt": receipt }));
            ExitCode::SUCCESS
        }
        Ok(SubmitOutcome::Suppressed) => {
            print_json(&serde_json::json!({
                "success": false,
                "error": "A submission is already in progress",
            }));
            ExitCode::FAILURE
        }
        Err(e) => {
            let code = match &e {
                SubmitError::Incomplete(_) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            };
            print_json(&serde_json::json!({
                "success": false,
                "error": e.to_string(),
                "notices": form.notices(),
            }));
            code
        }
    }
}
