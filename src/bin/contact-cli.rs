use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use portfolio_contact::client::{ApiReply, BannerKind, ContactClient, FormController, SubmitOutcome};

#[derive(Parser)]
#[command(name = "contact-cli")]
#[command(about = "Command-line client for the portfolio contact API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Request timeout in seconds
    #[arg(short, long, default_value_t = 60)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the API is up
    Health,
    /// Ask the API to verify its mail configuration
    CheckMail,
    /// Submit the contact form
    Send {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = ContactClient::new(cli.url, Duration::from_secs(cli.timeout))?;

    match cli.command {
        Commands::Health => print_reply(client.health().await?),
        Commands::CheckMail => print_reply(client.check_mail().await?),
        Commands::Send { name, email, message } => {
            let mut form = FormController::new();
            form.name = name;
            form.email = email;
            form.message = message;
            let outcome = form.submit(&client).await;

            if let Some(banner) = form.banner() {
                match banner.kind {
                    BannerKind::Success => println!("{}", banner.text),
                    BannerKind::Error | BannerKind::Offline => eprintln!("Error: {}", banner.text),
                }
            }
            if let Some(SubmitOutcome::Sent { message_id }) = outcome {
                println!("Message ID: {message_id}");
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn print_reply(reply: ApiReply) -> Result<ExitCode, Box<dyn std::error::Error>> {
    if reply.is_success() {
        println!("{}", serde_json::to_string_pretty(&reply.body)?);
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("Error: API returned status {}", reply.status);
        eprintln!("{}", serde_json::to_string_pretty(&reply.body)?);
        Ok(ExitCode::FAILURE)
    }
}
