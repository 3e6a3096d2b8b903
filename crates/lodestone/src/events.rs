//! The hook game logic implements to hear about connections.

use lodestone_protocol::{ClientboundPlay, Handshake, PlayPacket};
use lodestone_session::PlayerIdentity;

/// Callbacks from connection tasks into game logic.
///
/// Every method has a no-op default, so an implementation only overrides
/// what it cares about. Methods are synchronous and run on the connection's
/// own task: keep them short, and hand long work to a channel.
///
/// Packets returned from the `on_*` methods are sent to the player in order.
pub trait GameEvents: Send + Sync + 'static {
    /// A handshake was accepted. For forwarded connections
    /// `server_address` holds only the hostname.
    fn on_handshake(&self, _handshake: &Handshake) {}

    /// The player is in `Play` and registered.
    fn on_login_success(&self, _player: &PlayerIdentity) -> Vec<ClientboundPlay> {
        Vec::new()
    }

    /// A play packet arrived, in network order.
    fn on_play_packet(&self, _player: &PlayerIdentity, _packet: PlayPacket) -> Vec<ClientboundPlay> {
        Vec::new()
    }

    /// The connection ended. `player` is `None` if it never logged in.
    fn on_disconnect(&self, _player: Option<&PlayerIdentity>, _reason: &str) {}
}

/// Ignores everything.
impl GameEvents for () {}
