//! Headless snapsync client
//!
//! Replays a short scripted session (joins, batch updates, a malformed
//! frame, a departure) through a `SyncClient` and logs every visual call.
//!
//! Usage: `headless_client [config.ron]`
//!
//! Set `RUST_LOG` to adjust verbosity and `LOG_FORMAT=json` for JSON output.

use snapsync_core::{Message, ObjectId, ObjectKind, ObjectRecord, Position};
use snapsync_netcode::{
    wire, Inbound, PresentationEvent, QueuedConnection, RecordingPresentation, SyncClient,
    SyncConfig,
};
use std::process::ExitCode;

/// Render frames to run after each burst of server traffic
const FRAMES_PER_BURST: usize = 8;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

fn load_config() -> Result<SyncConfig, snapsync_netcode::Error> {
    match std::env::args().nth(1) {
        Some(path) => SyncConfig::load(path),
        None => Ok(SyncConfig::default()),
    }
}

/// Server traffic, one burst per inner vec
fn script() -> Vec<Vec<Inbound>> {
    let mut truncated = wire::encode(&Message::position_update([ObjectRecord::new(
        1,
        ObjectKind::Character,
        (0.0, 0.0),
    )]));
    truncated.truncate(truncated.len() - 2);

    vec![
        vec![
            Inbound::Binary(wire::encode(&Message::player_joined(
                2,
                ObjectKind::Enemy,
                Position::new(40.0, 40.0),
            ))),
            Inbound::from(
                r#"{"type":"player_joined","data":{"id":3,"type":"item","Data":{"Position":{"X":-10,"Y":5}}}}"#,
            ),
        ],
        vec![Inbound::Binary(wire::encode(&Message::position_update([
            ObjectRecord::new(1, ObjectKind::Character, (12.0, 0.0)),
            ObjectRecord::new(2, ObjectKind::Enemy, (30.0, 45.0)),
        ])))],
        vec![
            Inbound::Binary(truncated),
            Inbound::Binary(wire::encode(&Message::position_update([
                ObjectRecord::new(2, ObjectKind::Enemy, (0.0, 0.0)),
                ObjectRecord::new(4, ObjectKind::from_code(9), (1.0, 1.0)),
            ]))),
        ],
        vec![
            Inbound::Binary(wire::encode(&Message::player_left(3))),
            Inbound::from(r#"{"type":"chat","data":{"text":"gg"}}"#),
        ],
    ]
}

fn log_events(events: Vec<PresentationEvent>) {
    for event in events {
        match event {
            PresentationEvent::Created { id, kind } => tracing::info!(%id, %kind, "create visual"),
            PresentationEvent::Moved { id, position } => {
                tracing::debug!(%id, %position, "move visual")
            }
            PresentationEvent::Destroyed { id } => tracing::info!(%id, "destroy visual"),
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load config");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        alpha = config.interpolation.alpha,
        epsilon = config.interpolation.epsilon,
        "starting headless client"
    );

    let mut client = match SyncClient::new(RecordingPresentation::new(), &config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "invalid config");
            return ExitCode::FAILURE;
        }
    };
    client.attach_local_player(ObjectId::new(1), Position::ORIGIN);

    let conn = QueuedConnection::new();
    for burst in script() {
        for inbound in burst {
            conn.push(inbound);
        }
        let received = match client.pump(&conn) {
            Ok(n) => n,
            Err(never) => match never {},
        };
        let mut ticks = 0;
        for _ in 0..FRAMES_PER_BURST {
            ticks += client.run_frame();
        }
        log_events(client.presentation_mut().drain());
        tracing::info!(
            received,
            ticks,
            entities = client.table().len(),
            converging = client.table().active_count(),
            "burst done"
        );
    }

    while client.run_frame() > 0 {}
    log_events(client.presentation_mut().drain());

    for state in client.table().states() {
        tracing::info!(
            id = %state.id,
            kind = %state.kind,
            position = %state.current,
            local = state.is_local,
            "final entity"
        );
    }
    let stats = client.stats();
    tracing::info!(
        applied = stats.messages_applied,
        rejected = stats.messages_rejected,
        dropped = stats.messages_dropped,
        ticks = stats.ticks_run,
        "session summary"
    );

    ExitCode::SUCCESS
}
