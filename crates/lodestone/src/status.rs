//! Server-list status response.

use crate::ServerConfig;

/// The JSON body of a status response.
///
/// ```json
/// {"version":{"name":"1.19.4","protocol":762},
///  "players":{"max":20,"online":3},
///  "description":{"text":"A Lodestone server"}}
/// ```
pub fn status_json(config: &ServerConfig, online: usize) -> String {
    serde_json::json!({
        "version": {
            "name": config.version_name,
            "protocol": config.protocol_version,
        },
        "players": {
            "max": config.max_players,
            "online": online,
        },
        "description": { "text": config.motd },
    })
    .to_string()
}
