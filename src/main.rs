use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notes_client::app::{AppError, NotesApp, Route};
use notes_client::config::{ClientConfig, API_URL_ENV, SESSION_FILE_ENV};
use notes_client::models::{Note, Registration};
use notes_client::session::SessionStore;

#[derive(Parser)]
#[command(name = "notes")]
#[command(about = "Manage your notes on a remote notes service")]
struct Cli {
    /// Base URL of the notes API
    #[arg(long, global = true, env = API_URL_ENV)]
    api_url: Option<String>,

    /// File the session token is kept in
    #[arg(long, global = true, env = SESSION_FILE_ENV)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Create an account and remember the session
    Register {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        /// Extra registration field, as key=value (repeatable)
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Forget the stored session
    Logout,
    /// Show whether a session token is held
    Status,
    /// List your notes
    List,
    /// Add a note
    Add {
        #[arg(short, long, default_value = "")]
        title: String,
        #[arg(short, long, default_value = "")]
        content: String,
    },
    /// Delete a note by id
    Delete { id: String },
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

/// Initialize tracing. Logs go to stderr so stdout only carries notes.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "notes_client=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_notes(notes: &[Note]) {
    if notes.is_empty() {
        println!("No notes available. Add a new note!");
        return;
    }
    for note in notes {
        println!("[{}] {}", note.id, note.title);
        if !note.content.is_empty() {
            println!("    {}", note.content);
        }
    }
}

async fn run(cli: Cli, app: &mut NotesApp) -> Result<(), AppError> {
    match cli.command {
        Commands::Login { email, password } => {
            app.login(&email, &password).await?;
            println!("Login successful!");
        }
        Commands::Register {
            email,
            password,
            fields,
        } => {
            let registration = fields
                .into_iter()
                .fold(Registration::new(email, password), |reg, (k, v)| {
                    reg.with_field(k, v)
                });
            app.register(&registration).await?;
            println!("Registration successful!");
        }
        Commands::Logout => {
            app.logout()?;
            println!("Logged out.");
        }
        Commands::Status => {
            println!("{}", app.state().as_str());
        }
        Commands::List => {
            // Sent even when anonymous; the server is the authority.
            if app.route(Route::Notes) == Route::Login {
                tracing::debug!("No session token held, trying anyway");
            }
            print_notes(app.refresh().await?);
        }
        Commands::Add { title, content } => {
            print_notes(app.add_note(&title, &content).await?);
        }
        Commands::Delete { id } => {
            print_notes(app.delete_note(&id).await?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let config = ClientConfig::load().with_overrides(cli.api_url.clone(), cli.session_file.clone());
    tracing::debug!("Using API at {}", config.api_url);

    let session = match &config.session_file {
        Some(path) => SessionStore::open(path),
        None => SessionStore::open_default(),
    }
    .context("Failed to open session store")?;

    let mut app = NotesApp::new(&config, session).context("Failed to build HTTP client")?;

    match run(cli, &mut app).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            if e.requires_login() {
                eprintln!("Run `notes login` to sign in again.");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
