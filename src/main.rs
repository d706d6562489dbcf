// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Folio CLI entrypoint.
//!
//! By default this serves MCP over streamable HTTP at `http://127.0.0.1:<port>/mcp` until
//! interrupted. Use `--mcp` to serve over stdio instead (intended for tool integrations).

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use folio::config::RuntimeConfig;
use folio::mcp::FolioMcp;
use folio::store::WriteDurability;
use rmcp::transport::{
    streamable_http_server::session::local::LocalSessionManager, StreamableHttpServerConfig,
    StreamableHttpService,
};
use tracing::{error, info, Level};

const DEFAULT_MCP_HTTP_PORT: u16 = 27436;
const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--mcp-http-port <port>] [options]\n  {program} --mcp [options]\n\nOptions:\n  --durable-writes              fsync files and directories after each write\n  --lock-timeout-ms <ms>        wait at most <ms> for a busy session (0 = wait indefinitely; default 30000)\n  --session-idle-ttl-secs <s>   evict clean sessions idle for longer than <s> seconds\n  --log-level <level>           error, warn, info, debug or trace (default info)\n\nWithout --mcp, MCP is served over streamable HTTP at `http://127.0.0.1:<port>/mcp`.\n--mcp-http-port selects the port (0 = ephemeral; default {DEFAULT_MCP_HTTP_PORT}).\nLogs are written to stderr."
    );
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    mcp: bool,
    mcp_http_port: Option<u16>,
    durable_writes: bool,
    /// `Some(0)` waits indefinitely.
    lock_timeout_ms: Option<u64>,
    session_idle_ttl_secs: Option<u64>,
    log_level: Level,
    log_level_set: bool,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            mcp: false,
            mcp_http_port: None,
            durable_writes: false,
            lock_timeout_ms: None,
            session_idle_ttl_secs: None,
            log_level: Level::INFO,
            log_level_set: false,
        }
    }
}

impl CliOptions {
    fn runtime_config(&self) -> RuntimeConfig {
        let mut config = RuntimeConfig::default();
        if let Some(ms) = self.lock_timeout_ms {
            config = config.with_lock_timeout((ms > 0).then(|| Duration::from_millis(ms)));
        }
        if self.durable_writes {
            config = config.with_durability(WriteDurability::Durable);
        }
        config.with_idle_ttl(self.session_idle_ttl_secs.map(Duration::from_secs))
    }
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--mcp" => {
                if options.mcp {
                    return Err(());
                }
                options.mcp = true;
            }
            "--mcp-http-port" => {
                if options.mcp_http_port.is_some() {
                    return Err(());
                }
                options.mcp_http_port = Some(parse_value(&mut args)?);
            }
            "--durable-writes" => {
                if options.durable_writes {
                    return Err(());
                }
                options.durable_writes = true;
            }
            "--lock-timeout-ms" => {
                if options.lock_timeout_ms.is_some() {
                    return Err(());
                }
                options.lock_timeout_ms = Some(parse_value(&mut args)?);
            }
            "--session-idle-ttl-secs" => {
                if options.session_idle_ttl_secs.is_some() {
                    return Err(());
                }
                let secs: u64 = parse_value(&mut args)?;
                if secs == 0 {
                    return Err(());
                }
                options.session_idle_ttl_secs = Some(secs);
            }
            "--log-level" => {
                if options.log_level_set {
                    return Err(());
                }
                options.log_level = parse_value(&mut args)?;
                options.log_level_set = true;
            }
            _ => return Err(()),
        }
    }

    if options.mcp && options.mcp_http_port.is_some() {
        return Err(());
    }

    Ok(options)
}

fn parse_value<T: std::str::FromStr>(args: &mut impl Iterator<Item = String>) -> Result<T, ()> {
    args.next().ok_or(())?.trim().parse().map_err(|_| ())
}

/// Periodically drops clean sessions that outlived `ttl`.
fn spawn_idle_sweeper(mcp: FolioMcp, ttl: Duration) -> tokio::task::JoinHandle<()> {
    let period = (ttl / 4).max(MIN_SWEEP_INTERVAL);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let evicted = mcp.evict_idle(ttl);
            if !evicted.is_empty() {
                info!(count = evicted.len(), "evicted idle sessions");
            }
        }
    })
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "folio".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        // stdout carries MCP traffic in stdio mode.
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_max_level(options.log_level)
            .with_target(false)
            .init();

        let config = options.runtime_config();
        let mcp = FolioMcp::new(config)?;
        let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

        runtime.block_on(async move {
            let sweeper = config.idle_ttl.map(|ttl| spawn_idle_sweeper(mcp.clone(), ttl));

            if options.mcp {
                info!("serving MCP over stdio");
                let served = mcp.serve_stdio().await;
                if let Some(sweeper) = sweeper {
                    sweeper.abort();
                }
                served?;
                return Ok::<(), Box<dyn Error>>(());
            }

            let port = options.mcp_http_port.unwrap_or(DEFAULT_MCP_HTTP_PORT);
            let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
            info!(addr = %listener.local_addr()?, "serving MCP over streamable HTTP at /mcp");

            let http_config = StreamableHttpServerConfig {
                stateful_mode: true,
                ..StreamableHttpServerConfig::default()
            };
            let shutdown_token = http_config.cancellation_token.clone();
            let server_shutdown = shutdown_token.clone();

            let session_manager = Arc::new(LocalSessionManager::default());
            let mcp_service = {
                let mcp = mcp.clone();
                StreamableHttpService::new(move || Ok(mcp.clone()), session_manager, http_config)
            };

            let router = Router::new().nest_service("/mcp", mcp_service);
            let server_handle = tokio::spawn(async move {
                let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
                    server_shutdown.cancelled().await;
                });
                if let Err(err) = serve.await {
                    error!(%err, "MCP HTTP server error");
                }
            });

            tokio::signal::ctrl_c().await?;
            info!("shutting down");
            shutdown_token.cancel();
            if let Some(sweeper) = sweeper {
                sweeper.abort();
            }
            let _ = server_handle.await;
            Ok(())
        })?;

        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("folio: {err}");
        std::process::exit(1);
    }
}
