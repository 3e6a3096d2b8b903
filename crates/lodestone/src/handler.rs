//! Per-connection handler: the read/decode/dispatch loop.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! Frames are read and dispatched strictly one after another, because
//! whether a packet id is legal depends on the phase the previous packet
//! left us in. The flow is:
//!   1. Handshake → Status or Login (forwarded address checked here)
//!   2. Status: answer the request and the ping, then close
//!   3. Login: resolve an identity (proxy forwarding or local login),
//!      register the player, send LoginSuccess → Play
//!   4. Play: hand packets to game logic, send back what it returns
//!
//! Any error ends the connection. It is logged once, a disconnect is sent
//! if the phase has a disconnect packet, and the socket is closed.

use std::sync::Arc;

use lodestone_protocol::packets::ids::serverbound as sb;
use lodestone_protocol::{
    ClientboundPacket, ClientboundPlay, ConnectionState, Handshake, LoginClientbound,
    LoginPluginResponse, LoginRequest, LoginStage, LoginStart, NextState, Phase, PlayPacket,
    ProtocolError, ServerboundPacket, StatusRequest, StatusResponse,
};
use lodestone_session::forwarding::velocity;
use lodestone_session::{
    AuthError, BungeeForwarding, ForwardingMode, LoginAttempt, LoginAuthenticator,
    PlayerIdentity, SharedRegistry,
};
use lodestone_transport::{Connection, ConnectionId};
use uuid::Uuid;

use crate::disconnect::{disconnect_packet, reason_for};
use crate::server::ServerState;
use crate::status::status_json;
use crate::{GameEvents, ServerError};

/// Drop guard that releases a player's registry slot when the handler
/// exits, however it exits.
///
/// `Drop` is synchronous, so if the lock is busy we spawn a
/// fire-and-forget task to take it.
struct Registration {
    uuid: Uuid,
    registry: SharedRegistry,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let uuid = self.uuid;
        if let Ok(mut registry) = self.registry.try_lock() {
            registry.release(uuid);
            return;
        }
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            registry.lock().await.release(uuid);
        });
    }
}

/// Whether the loop keeps reading after a packet.
enum Flow {
    Continue,
    Close,
}

/// Handles a single connection from accept to close.
///
/// [`LodestoneServer::run`](crate::LodestoneServer::run) spawns this for
/// every accepted socket. Tests and embedders can call it directly with
/// any [`Connection`], for example a `FramedConnection` over
/// `tokio::io::duplex`.
///
/// Never returns an error: failures are logged with their kind and end
/// this connection only. Before the socket closes the player gets a
/// disconnect reason where the phase allows one, game logic sees
/// [`GameEvents::on_disconnect`], and any registry slot is released.
pub async fn handle_connection<C, A, E>(conn: C, state: Arc<ServerState<A, E>>)
where
    C: Connection,
    A: LoginAuthenticator,
    E: GameEvents,
{
    let conn_id = conn.id();
    let peer = conn.peer_addr();
    tracing::debug!(%conn_id, %peer, "handling new connection");

    let mut session = Session::new(conn, state);
    let result = session.run().await;
    let phase = session.protocol.phase();

    let reason = match result {
        Ok(()) => "connection closed".to_string(),
        Err(e) => {
            match &e {
                ServerError::Transport(_) => {
                    tracing::debug!(%conn_id, %peer, %phase, kind = e.kind(), error = %e, "connection dropped");
                }
                _ => {
                    tracing::warn!(%conn_id, %peer, %phase, kind = e.kind(), error = %e, "closing connection");
                }
            }
            if let Some(reason) = reason_for(&e, &session.state.config) {
                session.send_disconnect(&reason).await;
            }
            e.to_string()
        }
    };

    session.state.events.on_disconnect(session.player.as_ref(), &reason);
    if let Err(e) = session.conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close failed");
    }
    tracing::debug!(%conn_id, %phase, "connection closed");
    // `session` drops here → registry slot released.
}

/// Everything one connection owns.
struct Session<C, A: LoginAuthenticator, E: GameEvents> {
    conn: C,
    state: Arc<ServerState<A, E>>,
    protocol: ConnectionState,
    /// Protocol version from the handshake.
    client_version: i32,
    /// BungeeCord forwarding from the handshake, consumed at LoginStart.
    bungee: Option<BungeeForwarding>,
    player: Option<PlayerIdentity>,
    registration: Option<Registration>,
}

impl<C, A, E> Session<C, A, E>
where
    C: Connection,
    A: LoginAuthenticator,
    E: GameEvents,
{
    fn new(conn: C, state: Arc<ServerState<A, E>>) -> Self {
        Self {
            conn,
            state,
            protocol: ConnectionState::new(),
            client_version: 0,
            bungee: None,
            player: None,
            registration: None,
        }
    }

    fn id(&self) -> ConnectionId {
        self.conn.id()
    }

    async fn run(&mut self) -> Result<(), ServerError> {
        loop {
            let Some(frame) = self.conn.recv_frame().await? else {
                tracing::debug!(conn_id = %self.id(), "peer closed connection");
                return Ok(());
            };

            let packet = self.state.table.decode(self.protocol.phase(), &frame)?;
            if let Flow::Close = self.dispatch(packet).await? {
                return Ok(());
            }
        }
    }

    async fn dispatch(&mut self, packet: ServerboundPacket) -> Result<Flow, ServerError> {
        match packet {
            ServerboundPacket::Handshake(handshake) => self.on_handshake(handshake),
            ServerboundPacket::Status(request) => self.on_status(request).await,
            ServerboundPacket::Login(LoginRequest::Start(start)) => self.on_login_start(start).await,
            ServerboundPacket::Login(LoginRequest::PluginResponse(response)) => {
                self.on_plugin_response(response).await
            }
            ServerboundPacket::Play(packet) => self.on_play(packet).await,
        }
    }

    // -- Handshake ---------------------------------------------------------

    fn on_handshake(&mut self, mut handshake: Handshake) -> Result<Flow, ServerError> {
        self.protocol.on_handshake(handshake.next_state)?;
        self.client_version = handshake.protocol_version;

        if handshake.next_state == NextState::Login {
            self.bungee = self
                .state
                .forwarding
                .authenticate_handshake(&handshake.server_address)?;
        }

        // Game logic only ever sees the hostname, never forwarding segments.
        let hostname = match &self.bungee {
            Some(forwarding) => forwarding.hostname().to_string(),
            None => handshake
                .server_address
                .split('\0')
                .next()
                .unwrap_or_default()
                .to_string(),
        };
        handshake.server_address = hostname;

        tracing::debug!(
            conn_id = %self.id(),
            protocol_version = handshake.protocol_version,
            hostname = %handshake.server_address,
            next = %handshake.next_state.phase(),
            "handshake"
        );
        self.state.events.on_handshake(&handshake);
        Ok(Flow::Continue)
    }

    // -- Status ------------------------------------------------------------

    async fn on_status(&mut self, request: StatusRequest) -> Result<Flow, ServerError> {
        match request {
            StatusRequest::Request => {
                let online = self.state.registry.lock().await.online_count();
                let json = status_json(&self.state.config, online);
                self.send(ClientboundPacket::Status(StatusResponse::Response { json }))
                    .await?;
                Ok(Flow::Continue)
            }
            StatusRequest::Ping { payload } => {
                self.send(ClientboundPacket::Status(StatusResponse::Pong { payload }))
                    .await?;
                Ok(Flow::Close)
            }
        }
    }

    // -- Login -------------------------------------------------------------

    async fn on_login_start(&mut self, start: LoginStart) -> Result<Flow, ServerError> {
        if self.protocol.login_stage() != Some(LoginStage::AwaitingStart) {
            return Err(ProtocolError::UnexpectedPacket {
                phase: Phase::Login,
                id: sb::LOGIN_START,
            }
            .into());
        }

        let server = self.state.config.protocol_version;
        if self.client_version != server {
            return Err(ProtocolError::UnsupportedProtocolVersion {
                client: self.client_version,
                server,
            }
            .into());
        }

        tracing::debug!(conn_id = %self.id(), username = %start.username, "login start");

        let mode = self.state.forwarding.mode();
        match mode {
            ForwardingMode::VelocityModern => {
                let message_id = velocity::new_message_id();
                self.protocol.await_forwarding(message_id)?;
                self.send(ClientboundPacket::Login(velocity::player_info_request(message_id)))
                    .await?;
                Ok(Flow::Continue)
            }
            ForwardingMode::BungeeCordLegacy | ForwardingMode::BungeeGuard => {
                let forwarding = self
                    .bungee
                    .take()
                    .ok_or(AuthError::ForwardingRequired(mode))?;
                let identity = forwarding.into_identity(start.username);
                self.complete_login(identity.into()).await
            }
            ForwardingMode::None => {
                let attempt = LoginAttempt {
                    username: start.username,
                    uuid: start.uuid,
                    remote_address: self.conn.peer_addr().ip().to_string(),
                };
                let identity = self.state.authenticator.authenticate(&attempt).await?;
                self.complete_login(identity.into()).await
            }
        }
    }

    async fn on_plugin_response(
        &mut self,
        response: LoginPluginResponse,
    ) -> Result<Flow, ServerError> {
        let Some(LoginStage::AwaitingForwardingPayload { message_id }) =
            self.protocol.login_stage()
        else {
            return Err(ProtocolError::UnexpectedPacket {
                phase: Phase::Login,
                id: sb::LOGIN_PLUGIN_RESPONSE,
            }
            .into());
        };

        let identity = self
            .state
            .forwarding
            .authenticate_plugin_response(message_id, &response)?;
        self.complete_login(identity.into()).await
    }

    /// Registers the player, sends LoginSuccess and enters Play.
    async fn complete_login(&mut self, identity: PlayerIdentity) -> Result<Flow, ServerError> {
        self.protocol.authenticate()?;

        self.state.registry.lock().await.register(&identity)?;
        self.registration = Some(Registration {
            uuid: identity.uuid(),
            registry: Arc::clone(&self.state.registry),
        });

        self.send(ClientboundPacket::Login(LoginClientbound::Success {
            uuid: identity.uuid(),
            username: identity.username().to_string(),
            properties: identity.properties(),
        }))
        .await?;
        self.protocol.enter_play()?;

        tracing::info!(
            conn_id = %self.id(),
            uuid = %identity.uuid(),
            username = identity.username(),
            forwarded = identity.is_forwarded(),
            "player logged in"
        );

        let replies = self.state.events.on_login_success(&identity);
        self.player = Some(identity);
        self.send_play(replies).await
    }

    // -- Play --------------------------------------------------------------

    async fn on_play(&mut self, packet: PlayPacket) -> Result<Flow, ServerError> {
        let Some(player) = &self.player else {
            let id = ServerboundPacket::Play(packet).id();
            return Err(ProtocolError::UnexpectedPacket {
                phase: Phase::Play,
                id,
            }
            .into());
        };
        let replies = self.state.events.on_play_packet(player, packet);
        self.send_play(replies).await
    }

    // -- Output ------------------------------------------------------------

    async fn send(&mut self, packet: ClientboundPacket) -> Result<(), ServerError> {
        self.conn.send_frame(&packet.to_payload()).await?;
        Ok(())
    }

    /// Sends game-logic replies. A `Disconnect` among them ends the
    /// connection after it is sent.
    async fn send_play(&mut self, replies: Vec<ClientboundPlay>) -> Result<Flow, ServerError> {
        for reply in replies {
            let kick = matches!(reply, ClientboundPlay::Disconnect { .. });
            self.send(ClientboundPacket::Play(reply)).await?;
            if kick {
                return Ok(Flow::Close);
            }
        }
        Ok(Flow::Continue)
    }

    /// Best effort: errors are logged and otherwise ignored.
    async fn send_disconnect(&mut self, reason: &str) {
        let Some(packet) = disconnect_packet(self.protocol.phase(), reason) else {
            return;
        };
        if let Err(e) = self.send(packet).await {
            tracing::debug!(conn_id = %self.id(), error = %e, "failed to send disconnect");
        }
    }
}
