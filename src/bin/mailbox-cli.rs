#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI for driving a mailbox over IMAP

use clap::{Parser, Subcommand};
use mailbox_client::{DecodedMessage, Folder, MailboxClient, MessageSummary};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mailbox-cli")]
#[command(about = "Search, read, and manage a mailbox over IMAP")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List available folders
    Folders,

    /// Search messages with an IMAP query (free text searches all)
    Search {
        /// IMAP search query (e.g. "FROM foo@bar.com")
        #[arg(default_value = "")]
        query: String,

        /// Folder to search in
        #[arg(long, default_value = "INBOX")]
        folder: String,

        /// Maximum number of results
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Show a single message by UID
    Read {
        /// Message UID
        uid: u32,

        /// Folder containing the message
        #[arg(long, default_value = "INBOX")]
        folder: String,
    },

    /// Mark a message as read
    MarkRead {
        uid: u32,

        #[arg(long, default_value = "INBOX")]
        folder: String,
    },

    /// Mark a message as unread
    MarkUnread {
        uid: u32,

        #[arg(long, default_value = "INBOX")]
        folder: String,
    },

    /// Move a message to another folder
    Move {
        uid: u32,

        /// Destination folder
        destination: String,

        #[arg(long, default_value = "INBOX")]
        folder: String,
    },

    /// Delete a message permanently
    Delete {
        uid: u32,

        #[arg(long, default_value = "INBOX")]
        folder: String,
    },

    /// Count unread messages in a folder
    UnreadCount {
        #[arg(long, default_value = "INBOX")]
        folder: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut client = MailboxClient::from_env()?;

    let outcome = run(&mut client, &args).await;
    client.logout().await;
    outcome
}

async fn run(client: &mut MailboxClient, args: &Args) -> anyhow::Result<()> {
    match &args.command {
        Command::Folders => {
            let folders = client.list_folders().await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&folders)?);
            } else {
                for folder in &folders {
                    println!("{folder}");
                }
            }
        }
        Command::Search {
            query,
            folder,
            limit,
        } => {
            let summaries = client
                .search(&Folder::from(folder.as_str()), query, *limit)
                .await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                print_summary_table(&summaries);
            }
        }
        Command::Read { uid, folder } => {
            let message = client.read(&Folder::from(folder.as_str()), *uid).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&message)?);
            } else {
                print_message(&message);
            }
        }
        Command::MarkRead { uid, folder } => {
            client.mark_read(&Folder::from(folder.as_str()), *uid).await?;
            println!("Marked UID {uid} as read");
        }
        Command::MarkUnread { uid, folder } => {
            client
                .mark_unread(&Folder::from(folder.as_str()), *uid)
                .await?;
            println!("Marked UID {uid} as unread");
        }
        Command::Move {
            uid,
            destination,
            folder,
        } => {
            client
                .move_message(
                    &Folder::from(folder.as_str()),
                    *uid,
                    &Folder::from(destination.as_str()),
                )
                .await?;
            println!("Moved UID {uid} to {destination}");
        }
        Command::Delete { uid, folder } => {
            client
                .delete_message(&Folder::from(folder.as_str()), *uid)
                .await?;
            println!("Deleted UID {uid}");
        }
        Command::UnreadCount { folder } => {
            let count = client.unread_count(&Folder::from(folder.as_str())).await?;
            if args.json {
                println!("{}", serde_json::json!({ "unread": count }));
            } else {
                println!("{count}");
            }
        }
    }

    Ok(())
}

fn print_summary_table(summaries: &[MessageSummary]) {
    if summaries.is_empty() {
        println!("No messages found.");
        return;
    }

    println!("{:<8} {:<32} {:<30} {}", "UID", "Date", "From", "Subject");
    println!("{}", "-".repeat(100));

    for summary in summaries {
        println!(
            "{:<8} {:<32} {:<30} {}",
            summary.id,
            truncate(&summary.date, 30),
            truncate(&summary.from, 28),
            truncate(&summary.subject, 40),
        );
    }

    println!("\n{} message(s)", summaries.len());
}

fn print_message(message: &DecodedMessage) {
    println!("UID:     {}", message.id);
    println!("Date:    {}", message.date);
    println!("From:    {}", message.from);
    println!("To:      {}", message.to);
    println!("Subject: {}", message.subject);
    println!("\n--- Body ---\n");
    println!("{}", message.body);
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
