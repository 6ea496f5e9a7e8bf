//! Actor Coordinator - wires up and runs watch mode.
//!
//! 1. Start the watcher (events buffer from here on)
//! 2. Run the full graph once; fatal failures abort
//! 3. Start the live reload servers
//! 4. Run FsActor, BuilderActor and WsActor until Ctrl+C

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::builder::BuilderActor;
use super::fs::FsActor;
use super::messages::{BuildMsg, FsMsg, WsMsg};
use super::ws::WsActor;
use crate::asset::PipelineRunner;
use crate::config::PipelineConfig;
use crate::core::{Phase, set_phase};
use crate::reload::proxy::ProxyServer;
use crate::task::{TaskGraph, execute};
use crate::{debug, log};

const CHANNEL_BUFFER: usize = 32;

const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

pub struct Coordinator {
    config: Arc<PipelineConfig>,
    shutdown_rx: Receiver<()>,
}

impl Coordinator {
    pub fn new(config: Arc<PipelineConfig>, shutdown_rx: Receiver<()>) -> Self {
        Self {
            config,
            shutdown_rx,
        }
    }

    /// Run watch mode until shutdown.
    pub async fn run(self) -> Result<()> {
        let config = self.config;
        let (build_tx, build_rx) = mpsc::channel::<BuildMsg>(CHANNEL_BUFFER);
        let (fs_tx, fs_rx) = mpsc::channel::<FsMsg>(CHANNEL_BUFFER);
        let (ws_tx, ws_rx) = mpsc::channel::<WsMsg>(CHANNEL_BUFFER);

        let fs_actor =
            FsActor::new(&config, fs_rx, build_tx.clone()).context("failed to start watcher")?;

        set_phase(Phase::Building);
        let graph = TaskGraph::pipeline()?;
        let runner = Arc::new(PipelineRunner::new(Arc::clone(&config)));
        let report = execute(&graph, Arc::clone(&runner)).await;
        crate::cli::build::log_report(&report, &config);
        if let Some((task, err)) = report.fatal() {
            bail!("{task} failed, not starting the watcher: {err}");
        }
        let written = report.written().map(Path::to_path_buf).collect();
        let _ = fs_tx.send(FsMsg::Suppress(written)).await;

        let ws_tx = if config.serve.enable {
            start_servers(&config, ws_tx.clone());
            Some(ws_tx)
        } else {
            None
        };

        set_phase(Phase::Watching);
        log!("watch"; "watching for changes, press Ctrl+C to stop");

        let builder = BuilderActor::new(build_rx, fs_tx.clone(), ws_tx.clone(), graph, runner);
        let fs_handle = tokio::spawn(fs_actor.run());
        let builder_handle = tokio::spawn(builder.run());
        let ws_handle = ws_tx.as_ref().map(|_| tokio::spawn(WsActor::new(ws_rx).run()));

        while self.shutdown_rx.try_recv().is_err() {
            tokio::time::sleep(SHUTDOWN_POLL).await;
        }

        debug!("actor"; "shutdown signal received");
        let _ = fs_tx.send(FsMsg::Shutdown).await;
        let _ = build_tx.send(BuildMsg::Shutdown).await;
        if let Some(ws_tx) = &ws_tx {
            let _ = ws_tx.send(WsMsg::Shutdown).await;
        }

        let _ = tokio::time::timeout(SHUTDOWN_GRACE, async {
            let _ = fs_handle.await;
            let _ = builder_handle.await;
            if let Some(handle) = ws_handle {
                let _ = handle.await;
            }
        })
        .await;

        set_phase(Phase::Idle);
        debug!("actor"; "stopped");
        Ok(())
    }
}

/// Start the WebSocket listener and, if configured, the proxy.
///
/// Failures are logged; watching goes on without live reload.
fn start_servers(config: &PipelineConfig, ws_tx: mpsc::Sender<WsMsg>) {
    let serve = &config.serve;
    let ws_port = match crate::reload::server::start_ws_server(serve.interface, serve.ws_port, ws_tx)
    {
        Ok(port) => {
            debug!("reload"; "ws://{}:{}", serve.interface, port);
            port
        }
        Err(e) => {
            log!("reload"; "websocket server failed: {}", e);
            return;
        }
    };

    let Some(upstream) = &serve.proxy else {
        log!("reload"; "live reload on port {}", ws_port);
        return;
    };

    match ProxyServer::bind(serve.interface, serve.port, upstream, ws_port) {
        Ok(proxy) => {
            log!("proxy"; "http://{} -> {}", proxy.addr(), upstream);
            crate::core::register_server(proxy.handle());
            std::thread::spawn(move || {
                if let Err(e) = proxy.run() {
                    log!("proxy"; "{e:#}");
                }
            });
        }
        Err(e) => log!("proxy"; "failed to start: {e:#}"),
    }
}
