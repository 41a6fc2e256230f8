//! HTTP listener

use axum::Router;
use tokio::net::TcpListener;

use crate::prelude::*;

pub async fn serve(listen: &str, router: Router) -> ClResult<()> {
	let listener = TcpListener::bind(listen).await.inspect_err(|err| {
		error!("FATAL: Cannot listen on {}: {}", listen, err);
	})?;
	info!("Listening on HTTP {}", listen);

	axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;
	info!("Server stopped");
	Ok(())
}

async fn shutdown_signal() {
	if let Err(err) = tokio::signal::ctrl_c().await {
		warn!("Cannot listen for shutdown signal: {}", err);
		std::future::pending::<()>().await;
	}
	info!("Shutdown signal received");
}

// vim: ts=4
