//! QuizDeck command line tool.
//!
//! Owns the single `SessionManager` instance and maps each subcommand onto
//! one session operation, standing in for the web UI as composition root.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quizdeck_client::{
    profile::initials, ClientConfig, Credentials, ImageUpload, ProfileUpdate, Registration,
    SessionManager, UserRole,
};

#[derive(Parser)]
#[command(name = "quizdeck")]
#[command(version, about = "QuizDeck Command Line Tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// QuizDeck API base URL (overrides host-based selection)
    #[arg(long)]
    server_url: Option<String>,

    /// Session directory (default: ~/.quizdeck)
    #[arg(long)]
    session_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and cache the session
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,

        /// Emit the signed-in user as JSON
        #[arg(short, long)]
        json: bool,
    },
    /// Create an account (registration never signs you in)
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,

        /// Account role: student or teacher
        #[arg(short, long, default_value = "student")]
        role: String,
    },
    /// Drop the cached session
    Logout,
    /// Show the signed-in user
    Whoami {
        /// Emit the user record as JSON
        #[arg(short, long)]
        json: bool,
    },
    /// Check the cached token against the backend
    Validate,
    /// Update the signed-in user's profile
    Profile {
        /// New display name
        #[arg(short, long)]
        name: Option<String>,

        /// New email
        #[arg(short, long)]
        email: Option<String>,

        /// New password
        #[arg(long)]
        password: Option<String>,

        /// Profile image file to upload
        #[arg(short, long)]
        image: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,quizdeck_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = ClientConfig::load()?;
    if let Some(url) = cli.server_url {
        config.api_url = Some(url);
    }
    if let Some(dir) = cli.session_dir {
        config.session_dir = dir;
    }

    tracing::debug!(
        api_url = %config.base_url(),
        session_dir = %config.session_dir.display(),
        "Configuration resolved"
    );
    let session = SessionManager::new(&config);

    match cli.command {
        Commands::Login {
            email,
            password,
            json,
        } => {
            let user = session
                .login(&Credentials { email, password })
                .await
                .context("Login failed")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&user)?);
            } else {
                println!("Signed in as {} ({})", user.user_name, user.role);
            }
        }
        Commands::Register {
            name,
            email,
            password,
            role,
        } => {
            let registration = Registration {
                user_name: name,
                email,
                password,
                role: parse_role(&role)?,
            };
            let response = session
                .register(&registration)
                .await
                .context("Registration failed")?;
            if response.is_null() {
                println!("Registered");
            } else {
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
        }
        Commands::Logout => {
            session.logout();
            println!("Signed out");
        }
        Commands::Whoami { json } => match session.current_user() {
            Some(user) if json => println!("{}", serde_json::to_string_pretty(&user)?),
            Some(user) => {
                println!(
                    "[{}] {} <{}>",
                    initials(&user.user_name),
                    user.user_name,
                    user.email
                );
                println!("Role: {}", user.role);
                if let Some(image) = &user.image {
                    println!("Image: {}", image);
                }
            }
            None => {
                println!("Not signed in");
                std::process::exit(1);
            }
        },
        Commands::Validate => {
            if session.validate_token().await {
                println!("Session valid");
            } else if session.is_authenticated() {
                // Probe never completed; validity is unknown, session kept
                println!("Could not reach the backend, session kept");
                std::process::exit(1);
            } else {
                println!("Session invalid");
                std::process::exit(1);
            }
        }
        Commands::Profile {
            name,
            email,
            password,
            image,
        } => {
            let current = session
                .current_user()
                .ok_or_else(|| anyhow::anyhow!("Not signed in"))?;

            let image = match image {
                Some(path) => Some(read_image(&path)?),
                None => None,
            };
            let update = ProfileUpdate {
                user_name: name.unwrap_or(current.user_name),
                email: email.unwrap_or(current.email),
                password,
                image,
            };

            let user = session
                .update_profile(update)
                .await
                .context("Profile update failed")?;
            println!("Profile saved for {} <{}>", user.user_name, user.email);
        }
    }

    Ok(())
}

fn parse_role(value: &str) -> Result<UserRole> {
    match value.to_ascii_lowercase().as_str() {
        "student" => Ok(UserRole::Student),
        "teacher" => Ok(UserRole::Teacher),
        other => anyhow::bail!("Unknown role '{}', expected student or teacher", other),
    }
}

fn read_image(path: &PathBuf) -> Result<ImageUpload> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image: {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "profile".to_string());
    Ok(ImageUpload { file_name, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("student").unwrap(), UserRole::Student);
        assert_eq!(parse_role("TEACHER").unwrap(), UserRole::Teacher);
        assert!(parse_role("admin").is_err());
    }
}
