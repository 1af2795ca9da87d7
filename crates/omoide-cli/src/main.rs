//! Omoide CLI - Chat with personas and inspect what they remember
//!
//! Thin client over the Omoide HTTP API.

mod api;
mod config;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::{Input, Password};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use uuid::Uuid;

use api::{MessageResponse, OmoideClient, RelationView};
use config::Config;

/// How often to poll for reply chunks
const POLL_INTERVAL: Duration = Duration::from_millis(400);
/// Give up waiting for a reply after this long
const REPLY_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Parser)]
#[command(name = "omoide")]
#[command(about = "Omoide CLI - Chat with personas that remember", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Login and store API key and user id
    Login {
        /// API key (will prompt if not provided)
        #[arg(short, long)]
        key: Option<String>,
        /// User id conversations are stored under (will prompt if not provided)
        #[arg(short, long)]
        user: Option<String>,
        /// API base URL
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Manage profiles (Persona shortcuts)
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Persona operations
    Persona {
        #[command(subcommand)]
        action: PersonaAction,
    },

    /// Interactive chat with a persona
    Chat {
        /// Profile to use
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Send one message and print the reply
    Send {
        /// Message text
        text: String,
        /// Profile to use
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Show conversation history
    History {
        /// Messages per page
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Cursor printed at the end of a previous page
        #[arg(short, long)]
        before: Option<String>,
        /// Profile to use
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Show what the persona remembers about this conversation
    Knowledge {
        /// Profile to use
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Show local configuration, or manage server settings
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Add a new profile
    Add {
        /// Profile name (e.g., "hana")
        name: String,
        /// Persona ID
        #[arg(long)]
        persona_id: String,
        /// Display name (optional)
        #[arg(long)]
        display_name: Option<String>,
    },
    /// List all profiles
    List,
    /// Set default profile
    Set {
        /// Profile name to set as default
        name: String,
    },
    /// Remove a profile
    Remove {
        /// Profile name to remove
        name: String,
    },
}

#[derive(Subcommand)]
enum PersonaAction {
    /// List your personas
    List,
    /// Create a persona
    Create {
        /// Persona name
        name: String,
        /// Response length dial, 0-100
        #[arg(short, long)]
        verbosity: Option<u8>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the server's cached global settings
    Show,
    /// Make the server refetch global settings
    Invalidate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Login {
            key,
            user,
            base_url,
        } => cmd_login(key, user, base_url).await,
        Commands::Profile { action } => cmd_profile(action).await,
        Commands::Persona { action } => cmd_persona(action).await,
        Commands::Chat { profile } => cmd_chat(profile).await,
        Commands::Send { text, profile } => cmd_send(text, profile).await,
        Commands::History {
            limit,
            before,
            profile,
        } => cmd_history(limit, before, profile).await,
        Commands::Knowledge { profile } => cmd_knowledge(profile).await,
        Commands::Config { action } => match action {
            None => cmd_config(),
            Some(action) => cmd_server_config(action).await,
        },
    }
}

// ============================================
// Command Implementations
// ============================================

fn client(config: &Config) -> Result<OmoideClient> {
    let api_key = config
        .api_key
        .as_ref()
        .context("Not logged in. Run 'omoide login' first.")?;
    let user_id = config
        .user_id
        .as_ref()
        .context("No user id set. Run 'omoide login' first.")?;
    Ok(OmoideClient::new(&config.base_url, api_key, user_id))
}

fn persona_id(config: &Config, profile: Option<&str>) -> Result<String> {
    config.get_persona_id(profile).context(
        "No profile specified and no default profile set. Use -p <profile> or set a default.",
    )
}

async fn cmd_login(key: Option<String>, user: Option<String>, base_url: Option<String>) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(base_url) = base_url {
        config.base_url = base_url;
    }

    let api_key = match key {
        Some(k) => k,
        None => Password::new()
            .with_prompt("API Key")
            .interact()
            .context("Failed to read API key")?,
    };

    let user_id = match user {
        Some(u) => u,
        None => Input::new()
            .with_prompt("User id")
            .interact_text()
            .context("Failed to read user id")?,
    };

    // Test connection
    let client = OmoideClient::new(&config.base_url, &api_key, &user_id);
    print!("Testing connection... ");

    match client.health().await {
        Ok(true) => println!("{}", "OK".green()),
        _ => {
            println!("{}", "Failed".red());
            bail!("Could not reach Omoide API at {}", config.base_url);
        }
    }

    config.api_key = Some(api_key);
    config.user_id = Some(user_id);
    config.save()?;

    println!("{} Credentials saved to {:?}", "✓".green(), Config::config_path()?);

    if config.profiles.is_empty() {
        println!("\n{}", "Tip: Set up a profile to avoid typing Persona IDs:".yellow());
        println!("  omoide persona list");
        println!("  omoide profile add hana --persona-id <PERSONA_ID>");
        println!("  omoide profile set hana");
    }

    Ok(())
}

async fn cmd_profile(action: ProfileAction) -> Result<()> {
    let mut config = Config::load()?;

    match action {
        ProfileAction::Add {
            name,
            persona_id,
            display_name,
        } => {
            // Verify Persona exists if we are logged in
            if let Ok(client) = client(&config) {
                let persona = client
                    .get_persona(&persona_id)
                    .await
                    .context("Could not verify Persona")?;
                let display = display_name.unwrap_or(persona.name);
                config.add_profile(name.clone(), persona_id, Some(display.clone()));
                config.save()?;
                println!("{} Profile '{}' added ({})", "✓".green(), name, display);
            } else {
                config.add_profile(name.clone(), persona_id, display_name);
                config.save()?;
                println!(
                    "{} Profile '{}' added (unverified - not logged in)",
                    "✓".yellow(),
                    name
                );
            }
        }

        ProfileAction::List => {
            if config.profiles.is_empty() {
                println!("No profiles configured.");
                println!("\n{}", "Add one with:".dimmed());
                println!("  omoide profile add <name> --persona-id <PERSONA_ID>");
                return Ok(());
            }

            println!("{}", "Profiles:".bold());
            let mut names: Vec<_> = config.profiles.keys().collect();
            names.sort();
            for name in names {
                let profile = &config.profiles[name];
                let is_default = config.default_profile.as_ref() == Some(name);
                let default_marker = if is_default {
                    " (default)".green().to_string()
                } else {
                    String::new()
                };
                let display_name = profile.name.as_deref().unwrap_or("-");

                println!(
                    "  {} {} ({}){}",
                    name.cyan(),
                    display_name.dimmed(),
                    short_id(&profile.persona_id),
                    default_marker
                );
            }
        }

        ProfileAction::Set { name } => {
            if config.set_default_profile(name.clone()) {
                config.save()?;
                println!("{} Default profile set to '{}'", "✓".green(), name);
            } else {
                bail!("Profile '{}' not found", name);
            }
        }

        ProfileAction::Remove { name } => {
            if config.remove_profile(&name) {
                config.save()?;
                println!("{} Profile '{}' removed", "✓".green(), name);
            } else {
                bail!("Profile '{}' not found", name);
            }
        }
    }

    Ok(())
}

async fn cmd_persona(action: PersonaAction) -> Result<()> {
    let config = Config::load()?;
    let client = client(&config)?;

    match action {
        PersonaAction::List => {
            let personas = client.list_personas().await?;

            if personas.is_empty() {
                println!("No personas found.");
                println!("\n{}", "Create one with:".dimmed());
                println!("  omoide persona create <NAME>");
                return Ok(());
            }

            println!("{}", "Personas:".bold());
            for persona in personas {
                println!(
                    "  {} {} [verbosity {}] {}",
                    persona.id.to_string().dimmed(),
                    persona.name.cyan().bold(),
                    persona.traits.verbosity_ratio,
                    persona.traits.tags.join(", ").dimmed()
                );
            }

            println!("\n{}", "Add a profile shortcut:".dimmed());
            println!("  omoide profile add <name> --persona-id <ID>");
        }

        PersonaAction::Create { name, verbosity } => {
            if verbosity.is_some_and(|v| v > 100) {
                bail!("Verbosity must be within 0-100");
            }
            let persona = client.create_persona(&name, verbosity).await?;
            println!(
                "{} Persona {} created ({})",
                "✓".green(),
                persona.name.cyan(),
                persona.id
            );
        }
    }

    Ok(())
}

async fn cmd_chat(profile: Option<String>) -> Result<()> {
    let config = Config::load()?;
    let client = client(&config)?;
    let persona_id = persona_id(&config, profile.as_deref())?;

    let session = client.open_session(&persona_id).await?;
    let name = session.persona_name;

    // Show where the conversation left off
    let page = client.history(&persona_id, 10, None).await?;
    let mut seen: HashSet<Uuid> = HashSet::new();
    for message in &page.messages {
        print_message(message, &name);
        seen.insert(message.id);
    }

    println!("{}", format!("Chatting with {} (empty line or /quit to exit)", name).dimmed());

    loop {
        let text: String = Input::new()
            .with_prompt("you".green().to_string())
            .allow_empty(true)
            .interact_text()
            .context("Failed to read input")?;

        let text = text.trim();
        if text.is_empty() || text == "/quit" {
            break;
        }

        let sent = client.send_message(&persona_id, text).await?;
        seen.insert(sent.id);
        wait_for_reply(&client, &persona_id, &name, &mut seen).await?;
    }

    Ok(())
}

async fn cmd_send(text: String, profile: Option<String>) -> Result<()> {
    let config = Config::load()?;
    let client = client(&config)?;
    let persona_id = persona_id(&config, profile.as_deref())?;

    let session = client.open_session(&persona_id).await?;

    let mut seen: HashSet<Uuid> = client
        .history(&persona_id, 100, None)
        .await?
        .messages
        .into_iter()
        .map(|m| m.id)
        .collect();

    let sent = client.send_message(&persona_id, &text).await?;
    seen.insert(sent.id);
    wait_for_reply(&client, &persona_id, &session.persona_name, &mut seen).await
}

/// Print reply chunks as they land until the persona stops typing
async fn wait_for_reply(
    client: &OmoideClient,
    persona_id: &str,
    name: &str,
    seen: &mut HashSet<Uuid>,
) -> Result<()> {
    let started = Instant::now();
    let mut replied = false;

    loop {
        tokio::time::sleep(POLL_INTERVAL).await;

        let page = client.history(persona_id, 50, None).await?;
        for message in page.messages.iter() {
            if seen.contains(&message.id) {
                continue;
            }
            print_message(message, name);
            seen.insert(message.id);
            replied |= message.is_ai();
        }

        if replied && !client.typing(persona_id).await?.typing {
            return Ok(());
        }
        if started.elapsed() > REPLY_TIMEOUT {
            bail!("No reply from {} after {}s", name, REPLY_TIMEOUT.as_secs());
        }
    }
}

async fn cmd_history(limit: usize, before: Option<String>, profile: Option<String>) -> Result<()> {
    let config = Config::load()?;
    let client = client(&config)?;
    let persona_id = persona_id(&config, profile.as_deref())?;
    let name = config
        .get_profile(profile.as_deref())
        .and_then(|p| p.name.clone())
        .unwrap_or_else(|| "persona".to_string());

    let page = client.history(&persona_id, limit, before.as_deref()).await?;

    if page.messages.is_empty() {
        println!("No messages.");
        return Ok(());
    }

    for message in &page.messages {
        print_message(message, &name);
    }

    if let Some(cursor) = page.cursor {
        println!("\n{}", "Older messages:".dimmed());
        println!("  omoide history --before {}", cursor);
    }

    Ok(())
}

async fn cmd_knowledge(profile: Option<String>) -> Result<()> {
    let config = Config::load()?;
    let client = client(&config)?;
    let persona_id = persona_id(&config, profile.as_deref())?;

    let knowledge = client.knowledge(&persona_id).await?.knowledge;

    println!("{}", "About you:".bold());
    print_relations(&knowledge.user_relations);

    println!("{}", "About the persona's world:".bold());
    print_relations(&knowledge.persona_relations);

    println!("{}", "Things the persona said about itself:".bold());
    if knowledge.self_narrative.is_empty() {
        println!("  {}", "(nothing yet)".dimmed());
    }
    for fact in &knowledge.self_narrative {
        println!("  - {}", fact);
    }

    if let Some(identity) = knowledge.identity {
        println!("{}", "Identity:".bold());
        println!("  {}", identity);
    }

    Ok(())
}

fn print_relations(relations: &[RelationView]) {
    if relations.is_empty() {
        println!("  {}", "(nothing yet)".dimmed());
        return;
    }
    for relation in relations {
        let desc = relation
            .desc
            .as_deref()
            .map(|d| format!(" - {}", d))
            .unwrap_or_default();
        println!("  {} ({}){}", relation.name.cyan(), relation.kind, desc);
        if !relation.episodes.is_empty() {
            println!("    {}", relation.episodes.join("; ").dimmed());
        }
    }
}

async fn cmd_server_config(action: ConfigAction) -> Result<()> {
    let config = Config::load()?;
    let client = client(&config)?;

    match action {
        ConfigAction::Show => {
            let remote = client.config().await?;
            println!("{}", "Server settings:".bold());
            println!("{}", serde_json::to_string_pretty(&remote.settings)?);
            println!(
                "{}",
                format!(
                    "cached for {}s, last fetched {}",
                    remote.ttl_secs,
                    remote.last_fetched_at.as_deref().unwrap_or("never")
                )
                .dimmed()
            );
        }
        ConfigAction::Invalidate => {
            client.invalidate_config().await?;
            println!("{} Server settings cache invalidated", "✓".green());
        }
    }

    Ok(())
}

fn cmd_config() -> Result<()> {
    let config = Config::load()?;

    println!("{}", "Configuration:".bold());
    println!("  Path: {:?}", Config::config_path()?);
    println!("  Base URL: {}", config.base_url);
    println!(
        "  API Key: {}",
        if config.api_key.is_some() {
            "Set".green()
        } else {
            "Not set".red()
        }
    );
    println!(
        "  User: {}",
        config.user_id.as_deref().unwrap_or("Not set").cyan()
    );
    println!(
        "  Default Profile: {}",
        config.default_profile.as_deref().unwrap_or("None").cyan()
    );
    println!("  Profiles: {}", config.profiles.len());

    Ok(())
}

fn print_message(message: &MessageResponse, persona_name: &str) {
    if message.is_ai() {
        println!("{} {}", format!("{}:", persona_name).magenta().bold(), message.text);
    } else {
        println!("{} {}", "you:".green().bold(), message.text);
    }
}

/// First 8 chars of an id, or the whole thing if shorter
fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_handles_short_input() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_cli_parses_history_paging() {
        let cli = Cli::try_parse_from([
            "omoide",
            "history",
            "--limit",
            "5",
            "--before",
            "2024-05-04T12:00:00Z",
        ])
        .unwrap();

        match cli.command {
            Commands::History { limit, before, .. } => {
                assert_eq!(limit, 5);
                assert_eq!(before.as_deref(), Some("2024-05-04T12:00:00Z"));
            }
            _ => panic!("expected history command"),
        }
    }
}
