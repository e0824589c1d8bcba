mod config;
mod console;
mod permissions;
mod plugin_manager;
mod server;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use config::HostConfig;
use mcu_plugin::UtilityPlugin;
use permissions::PermissionManager;
use server::{ConsoleOutcome, Server};
use tokio::io::AsyncBufReadExt;
use tracing::info;

#[tokio::main]
async fn main() {
    let config = match HostConfig::load("host.toml") {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load host.toml: {e}");
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
        "{} v{} starting (type 'help' for console commands)",
        config.server.name,
        env!("CARGO_PKG_VERSION")
    );

    let permissions = PermissionManager::load(
        &config.permissions.ops_file,
        config.permissions.default.iter().cloned(),
    );
    let mut server = Server::new(permissions);
    server.register_plugin(Box::new(UtilityPlugin::new()));
    server.start(Path::new(&config.plugins.directory));

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    // Handle Ctrl+C
    let shutdown_tx_ctrlc = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        let _ = shutdown_tx_ctrlc.send(true);
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

    let mut tick_interval = tokio::time::interval(Duration::from_millis(50));
    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                server.game_tick();
                print_delivered(&mut server);
            }
            Some(line) = console_rx.recv() => {
                let (output, outcome) = server.handle_console_line(&line);
                for line in output {
                    info!("{}", console::strip_colors(&line));
                }
                print_delivered(&mut server);
                if outcome == ConsoleOutcome::Stop {
                    break;
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    server.shutdown();
    print_delivered(&mut server);
    info!("Server shut down at tick {}.", server.current_tick());
}

fn print_delivered(server: &mut Server) {
    for (player, message) in server.take_delivered() {
        info!("[{player}] {}", console::strip_colors(&message));
    }
}
