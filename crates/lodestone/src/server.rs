//! Binding a listener and spawning one handler task per connection.

use std::net::SocketAddr;
use std::sync::Arc;

use lodestone_protocol::PacketTable;
use lodestone_session::{
    ForwardingAuthenticator, LoginAuthenticator, PlayerRegistry, SharedRegistry,
};
use lodestone_transport::{TcpTransport, Transport};

use crate::handler::handle_connection;
use crate::{ConfigError, GameEvents, ServerConfig, ServerError};

/// What every connection task reads: config, packet table, forwarding
/// verifier, login hook, game hooks and the player registry.
///
/// Everything here except the registry is read-only after construction.
pub struct ServerState<A: LoginAuthenticator, E: GameEvents> {
    pub(crate) config: Arc<ServerConfig>,
    pub(crate) table: PacketTable,
    pub(crate) forwarding: ForwardingAuthenticator,
    pub(crate) authenticator: A,
    pub(crate) events: E,
    pub(crate) registry: SharedRegistry,
}

impl<A: LoginAuthenticator, E: GameEvents> ServerState<A, E> {
    /// Validates `config` and builds the state connections share.
    pub fn new(config: ServerConfig, authenticator: A, events: E) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            table: PacketTable::new(config.decode_limits()),
            forwarding: ForwardingAuthenticator::new(config.forwarding.clone()),
            registry: PlayerRegistry::shared(config.max_players),
            config: Arc::new(config),
            authenticator,
            events,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn authenticator(&self) -> &A {
        &self.authenticator
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn events(&self) -> &E {
        &self.events
    }
}

/// Collects settings, then validates them and binds in [`build`](Self::build).
///
/// ```rust,no_run
/// use lodestone::prelude::*;
///
/// # async fn start() -> Result<(), ServerError> {
/// let server = LodestoneServer::<OfflineAuthenticator, ()>::builder()
///     .bind("0.0.0.0:25565")
///     .build(OfflineAuthenticator, ())
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct LodestoneServerBuilder {
    config: ServerConfig,
}

impl LodestoneServerBuilder {
    /// Starts from [`ServerConfig::default`].
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides only `bind_address`.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_address = addr.to_string();
        self
    }

    /// Validates the configuration and binds the listener.
    pub async fn build<A: LoginAuthenticator, E: GameEvents>(
        self,
        authenticator: A,
        events: E,
    ) -> Result<LodestoneServer<A, E>, ServerError> {
        let state = ServerState::new(self.config, authenticator, events)?;
        let transport =
            TcpTransport::bind(&state.config.bind_address, state.config.connection_config())
                .await?;

        tracing::info!(
            addr = %state.config.bind_address,
            forwarding = %state.forwarding.mode(),
            protocol = state.config.protocol_version,
            "server configured"
        );

        Ok(LodestoneServer {
            transport,
            state: Arc::new(state),
        })
    }
}

impl Default for LodestoneServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Listener is bound and config validated; nothing is accepted until
/// [`run`](Self::run).
pub struct LodestoneServer<A: LoginAuthenticator, E: GameEvents> {
    transport: TcpTransport,
    state: Arc<ServerState<A, E>>,
}

impl<A: LoginAuthenticator, E: GameEvents> LodestoneServer<A, E> {
    /// Shorthand for [`LodestoneServerBuilder::new`].
    pub fn builder() -> LodestoneServerBuilder {
        LodestoneServerBuilder::new()
    }

    /// Useful when binding to port 0.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.transport.local_addr()?)
    }

    /// The state shared with connection tasks.
    pub fn state(&self) -> &Arc<ServerState<A, E>> {
        &self.state
    }

    /// Accepts forever. Each connection runs in its own task, so a failure
    /// there stays there; a failed accept is logged and the loop goes on.
    pub async fn run(mut self) -> Result<(), ServerError> {
        tracing::info!("accepting connections");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    tokio::spawn(handle_connection(conn, Arc::clone(&self.state)));
                }
                Err(e) => tracing::error!(error = %e, "could not accept connection"),
            }
        }
    }
}
