mod broadcast;
mod commands;
mod config;
mod entity;
mod error;
mod server;
mod session;
#[cfg(test)]
mod testing;

use std::time::Duration;

use config::ServerConfig;
use mcc_rs_world::storage::FileLevelStorage;
use server::Server;
use tokio::io::AsyncBufReadExt;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() {
    let config = match ServerConfig::load("server.toml") {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load server.toml: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        "MCC-RS Server v{} starting on {}:{}",
        env!("CARGO_PKG_VERSION"),
        config.server.address,
        config.server.port
    );
    info!("Name: {}", config.server.name);
    info!("MOTD: {}", config.server.motd);
    info!("Max players: {}", config.server.max_players);
    info!(
        "Levels: {} (main: {}, generator: {})",
        config.world.directory, config.world.main_level, config.world.generator
    );

    let addr = format!("{}:{}", config.server.address, config.server.port);
    let tick_ms = config.network.tick_interval_ms.max(1);
    let auto_save_ticks = config.world.auto_save_interval * 1000 / tick_ms;

    let storage = FileLevelStorage::new(&config.world.directory);
    let server = match Server::new(config, Box::new(storage)) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to prepare the main level: {e}");
            std::process::exit(1);
        }
    };

    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    info!("Listening on {addr}");

    // Handle Ctrl+C
    let server_ctrlc = server.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        server_ctrlc.request_shutdown();
    });

    // Console REPL: read lines from stdin
    let (console_tx, mut console_rx) = tokio::sync::mpsc::channel::<String>(32);
    tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    let console_server = server.clone();
    tokio::spawn(async move {
        while let Some(line) = console_rx.recv().await {
            console_server.run_console_line(line).await;
        }
    });

    let acceptor = server.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    debug!("Connection from {peer}");
                    tokio::spawn(session::handle_connection(acceptor.clone(), stream, peer));
                }
                Err(e) => warn!("Accept failed: {e}"),
            }
        }
    });

    let mut shutdown_rx = server.subscribe_shutdown();
    let mut tick_interval = tokio::time::interval(Duration::from_millis(tick_ms));
    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                let ticker = server.clone();
                if let Err(e) = tokio::task::spawn_blocking(move || ticker.tick()).await {
                    error!("Tick failed: {e}");
                }
                if auto_save_ticks > 0 && server.current_tick() % auto_save_ticks == 0 {
                    let saver = server.clone();
                    tokio::task::spawn_blocking(move || saver.save_all());
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    for player in server.players() {
        player.kick("Server is shutting down");
    }
    info!("Saving levels before shutdown...");
    server.save_all();
    info!("Server shut down.");
}
