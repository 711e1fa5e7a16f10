// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! envault secret vault server binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use envault_server::{create_app_state, create_router};
use envault_server_config::{LogFormat, LoggingConfig, ServerConfig};
use envault_server_secrets::{MasterKey, VaultContext};
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod version;

/// envault server - issues and rotates per-application secrets.
#[derive(Parser, Debug)]
#[command(name = "envault-server", about = "Per-application secret vault", version)]
struct Args {
	/// Config file path. Defaults to `ENVAULT_SERVER_CONFIG` or
	/// `/etc/envault/server.toml`.
	#[arg(long, global = true)]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Run the HTTP server (default)
	Serve,
	/// Show version and build information
	Version,
	/// Delete secret envelopes older than the configured TTL
	PurgeExpired,
	/// Write a new random master key. Never overwrites an existing file.
	GenerateMasterKey {
		/// Destination file
		path: PathBuf,
	},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	match &args.command {
		Some(Command::Version) => {
			println!("{}", version::format_version_info());
			return Ok(());
		}
		Some(Command::GenerateMasterKey { path }) => {
			MasterKey::write_new(path)?;
			println!("wrote master key to {}", path.display());
			return Ok(());
		}
		_ => {}
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => envault_server_config::load_config_with_file(path)?,
		None => envault_server_config::load_config()?,
	};

	init_tracing(&config.logging);

	match args.command {
		Some(Command::PurgeExpired) => {
			let removed = envault_server_secrets::purge_expired(&config).await?;
			println!("purged {removed} expired secret envelope(s)");
			Ok(())
		}
		_ => serve(config).await,
	}
}

fn init_tracing(logging: &LoggingConfig) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
	let registry = tracing_subscriber::registry().with(filter);

	match logging.format {
		LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
		LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
	}
}

async fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		"starting envault-server"
	);

	let ctx = VaultContext::initialize(&config).await?;

	let state = create_app_state(&ctx, &config.admin);
	let app = create_router(state)
		.layer(TraceLayer::new_for_http())
		.layer(
			CorsLayer::new()
				.allow_origin(Any)
				.allow_methods(Any)
				.allow_headers(Any),
		);

	let addr = config.socket_addr();
	let listener = match tokio::net::TcpListener::bind(&addr).await {
		Ok(listener) => listener,
		Err(e) => {
			ctx.shutdown().await;
			return Err(e.into());
		}
	};
	tracing::info!("listening on {}", addr);

	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "Server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	ctx.shutdown().await;
	tracing::info!("Server shutdown complete");
	Ok(())
}
