use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::*;
use consult::client::{
    CallController, CallEvent, CallPhase, ClientConfig, FixedToken, MediaConstraints, NoToken,
    SampleTrackDevices, SessionHandle, SessionState, TokenProvider, WebRtcBackendFactory,
    WsTransport,
};
use consult::model::IceServerConfig;
use consult::server::{AllowAnyToken, AppState, ServerConfig, StaticToken, TokenVerifier, serve};
use consult::{RoomId, UserId};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "consult", version, about = "Two-party video consultation signaling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling server.
    Serve {
        #[arg(long, env = "CONSULT_ADDR", default_value = "0.0.0.0:3000")]
        addr: SocketAddr,

        #[arg(long, default_value_t = consult::utils::DEFAULT_ROOM_CAPACITY)]
        capacity: usize,

        #[arg(long, default_value = consult::utils::DEFAULT_STUN_ADDR)]
        stun: String,

        #[arg(long, env = "TURN_URL")]
        turn_url: Option<String>,

        #[arg(long, env = "TURN_USERNAME")]
        turn_username: Option<String>,

        #[arg(long, env = "TURN_CREDENTIAL")]
        turn_credential: Option<String>,

        /// Require this token from every client.
        #[arg(long, env = "CONSULT_TOKEN")]
        token: Option<String>,
    },

    /// Join a room as a headless participant.
    Join {
        #[arg(long, default_value = "ws://127.0.0.1:3000")]
        server: String,

        #[arg(long)]
        room: String,

        #[arg(long)]
        user: String,

        /// Call this user once they are in the room.
        #[arg(long)]
        call: Option<String>,

        #[arg(long, env = "CONSULT_TOKEN")]
        token: Option<String>,

        #[arg(long)]
        audio_only: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    match Cli::parse().command {
        Commands::Serve {
            addr,
            capacity,
            stun,
            turn_url,
            turn_username,
            turn_credential,
            token,
        } => {
            if capacity < 2 {
                bail!("room capacity must be at least 2");
            }
            let mut ice_servers = vec![IceServerConfig::stun(stun)];
            if let Some(url) = turn_url {
                ice_servers.push(IceServerConfig {
                    urls: vec![url],
                    username: turn_username,
                    credential: turn_credential,
                });
            }
            let verifier: Arc<dyn TokenVerifier> = match token {
                Some(token) => Arc::new(StaticToken(token)),
                None => Arc::new(AllowAnyToken),
            };
            let state = Arc::new(AppState::new(
                ServerConfig {
                    room_capacity: capacity,
                    ice_servers,
                },
                verifier,
            ));

            println!("{}", format!("Consult signaling on {addr}").green().bold());
            tokio::select! {
                result = serve(addr, state) => result?,
                _ = tokio::signal::ctrl_c() => info!("Shutting down"),
            }
        }

        Commands::Join {
            server,
            room,
            user,
            call,
            token,
            audio_only,
        } => run_participant(server, room, user, call, token, audio_only).await?,
    }

    Ok(())
}

async fn run_participant(
    server: String,
    room: String,
    user: String,
    call: Option<String>,
    token: Option<String>,
    audio_only: bool,
) -> Result<()> {
    let tokens: Arc<dyn TokenProvider> = match token {
        Some(token) => Arc::new(FixedToken(token)),
        None => Arc::new(NoToken),
    };
    let config = ClientConfig::new(server.clone());
    let controller = CallController::new(
        config,
        Arc::new(WsTransport::with_tokens(server, tokens)),
        Arc::new(SampleTrackDevices::new(user.clone())),
        Arc::new(WebRtcBackendFactory),
    );

    let session = controller
        .join(RoomId::from(room.clone()), UserId::from(user.clone()))
        .await
        .context("could not join the room")?;
    println!("{}", format!("Joined {room} as {user}").green().bold());

    let constraints = if audio_only {
        MediaConstraints::audio_only()
    } else {
        MediaConstraints::default()
    };
    session
        .start_local_media(constraints)
        .await
        .context("could not start local media")?;

    let mut events = session.subscribe();
    let target = call.map(UserId::from);
    try_call(&session, target.as_ref()).await;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(CallEvent::RosterChanged(users)) => {
                    let names: Vec<_> = users.iter().map(|u| u.to_string()).collect();
                    println!("{} {}", "roster:".cyan(), names.join(", "));
                    try_call(&session, target.as_ref()).await;
                }
                Ok(CallEvent::IncomingCall { from }) => {
                    println!("{} {}", "incoming call from".cyan(), from);
                }
                Ok(CallEvent::Connected { peer }) => {
                    println!("{} {}", "in call with".green().bold(), peer);
                }
                Ok(CallEvent::RemoteTrack { peer, track }) => {
                    println!("{} {} track from {}", "receiving".cyan(), track.kind, peer);
                }
                Ok(CallEvent::CallEnded { peer, reason }) => {
                    println!("{} {} ({:?})", "call ended with".yellow(), peer, reason);
                }
                Ok(CallEvent::Failed { message }) => {
                    println!("{} {}", "error:".red().bold(), message);
                }
                Err(RecvError::Lagged(n)) => warn!("Missed {} session events", n),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
        if session.is_left() {
            break;
        }
    }

    session.leave().await?;
    println!("{}", "Left the room".yellow());
    Ok(())
}

/// Starts the requested call if the target is present and we are idle.
async fn try_call(session: &SessionHandle, target: Option<&UserId>) {
    let Some(target) = target else { return };
    let idle = session.state() == SessionState::Joined(CallPhase::Idle);
    if !idle || !session.roster().contains(target) {
        return;
    }
    if let Err(e) = session.call(target.clone()).await {
        warn!("Could not call {}: {}", target, e);
    }
}
