//! A limbo server: players log in, land in `Play`, and nothing else
//! happens. Useful as a proxy fallback and for testing forwarding setups.
//!
//! Configuration comes from an optional JSON file named by
//! `LODESTONE_CONFIG`, then these environment overrides:
//!
//! | Variable               | Meaning                                   |
//! |------------------------|-------------------------------------------|
//! | `LODESTONE_BIND`       | listen address                            |
//! | `LODESTONE_FORWARDING` | `none`, `bungeecord`, `bungeeguard`, `velocity` |
//! | `LODESTONE_SECRETS`    | comma-separated Velocity secrets          |
//! | `LODESTONE_TOKENS`     | comma-separated BungeeGuard tokens        |
//! | `LODESTONE_MOTD`       | server-list description                   |

use lodestone::prelude::*;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Game events
// ---------------------------------------------------------------------------

struct Limbo;

impl GameEvents for Limbo {
    fn on_login_success(&self, player: &PlayerIdentity) -> Vec<ClientboundPlay> {
        tracing::info!(
            uuid = %player.uuid(),
            name = player.username(),
            address = player.remote_address(),
            forwarded = player.is_forwarded(),
            "player entered limbo"
        );
        vec![ClientboundPlay::KeepAlive { id: 1 }]
    }

    fn on_play_packet(&self, player: &PlayerIdentity, packet: PlayPacket) -> Vec<ClientboundPlay> {
        match packet {
            // The client answers each keep-alive with its id; sending it
            // straight back starts the next round.
            PlayPacket::KeepAlive { id } => vec![ClientboundPlay::KeepAlive { id }],
            PlayPacket::PluginMessage { channel, data } => {
                tracing::debug!(name = player.username(), %channel, len = data.len(), "plugin message");
                Vec::new()
            }
            PlayPacket::Opaque { .. } => Vec::new(),
        }
    }

    fn on_disconnect(&self, player: Option<&PlayerIdentity>, reason: &str) {
        if let Some(player) = player {
            tracing::info!(name = player.username(), reason, "player left limbo");
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Applies environment overrides on top of `config`.
///
/// `var` looks a variable up; tests pass a map instead of the process
/// environment.
fn apply_env(
    mut config: ServerConfig,
    var: impl Fn(&str) -> Option<String>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    if let Some(bind) = var("LODESTONE_BIND") {
        config.bind_address = bind;
    }
    if let Some(mode) = var("LODESTONE_FORWARDING") {
        config.forwarding.mode = mode.parse()?;
    }
    if let Some(secrets) = var("LODESTONE_SECRETS") {
        config.forwarding.secrets = split_list(&secrets);
    }
    if let Some(tokens) = var("LODESTONE_TOKENS") {
        config.forwarding.bungee_guard_tokens = split_list(&tokens);
    }
    if let Some(motd) = var("LODESTONE_MOTD") {
        config.motd = motd;
    }
    Ok(config)
}

fn load_config() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let base = match std::env::var("LODESTONE_CONFIG") {
        Ok(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        Err(_) => ServerConfig::default(),
    };
    apply_env(base, |name| std::env::var(name).ok())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config()?;
    let server = LodestoneServer::<OfflineAuthenticator, Limbo>::builder()
        .config(config)
        .build(OfflineAuthenticator, Limbo)
        .await?;

    tracing::info!(addr = %server.local_addr()?, "limbo server listening");
    server.run().await?;
    Ok(())
}
