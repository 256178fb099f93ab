//! Chatbot webhook commands.

use clap::{Args, Subcommand};

use gch_chatbot::{Attachment, ChatRequest, ChatbotClient, ProjectContext};
use gch_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for chat commands
#[derive(Debug, Args)]
pub struct ChatArgs {
    /// Chat subcommand
    #[command(subcommand)]
    pub command: ChatCommand,
}

/// Chat subcommands
#[derive(Debug, Subcommand)]
pub enum ChatCommand {
    /// Send one message and print the reply
    Send {
        /// Message text
        message: String,
        /// Public URL of an attached file (repeatable)
        #[arg(short, long = "attach")]
        attachments: Vec<String>,
        /// Project title the bot may reference (repeatable)
        #[arg(short, long = "project")]
        projects: Vec<String>,
    },
}

/// Execute chat commands
pub async fn execute(
    args: &ChatArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let client = ChatbotClient::new(config.chatbot)?;

    match &args.command {
        ChatCommand::Send {
            message,
            attachments,
            projects,
        } => {
            if !client.is_configured() {
                output::print_warning("No chatbot webhook configured; the reply will be the fallback");
            }

            let request = ChatRequest::new(message.clone())
                .with_attachments(attachments.iter().map(|url| attachment(url)).collect())
                .with_projects(
                    projects
                        .iter()
                        .map(|title| ProjectContext {
                            title: title.clone(),
                            category: None,
                            location: None,
                            description: None,
                        })
                        .collect(),
                )
                .with_client(concat!("gch-cli/", env!("CARGO_PKG_VERSION")), "127.0.0.1");

            let reply = client.send(request).await;
            match format {
                OutputFormat::Table => {
                    if reply.is_fallback {
                        output::print_warning("Webhook unavailable, showing fallback reply");
                    }
                    println!("{}", reply.text);
                }
                OutputFormat::Json => output::print_json(&reply),
            }
        }
    }

    Ok(())
}

/// An attachment named after the last path segment of its URL.
fn attachment(url: &str) -> Attachment {
    let name = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(url);
    Attachment {
        name: name.to_string(),
        mime_type: None,
        size: None,
        url: Some(url.to_string()),
    }
}
