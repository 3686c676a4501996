use std::{convert::Infallible, net::SocketAddr};

use anyhow::{Context, Result};
use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use async_graphql_warp::GraphQLResponse;
use tracing::{info, warn};
use warp::{http::Response as HttpResponse, Filter};

use crate::api::Schema;

/// Serves the GraphQL API at `/graphql` until Ctrl-C is received.
///
/// # Errors
///
/// Returns an error if `addr` cannot be bound.
pub(crate) async fn serve(schema: Schema, addr: SocketAddr) -> Result<()> {
    let graphql_post = warp::path("graphql")
        .and(warp::path::end())
        .and(async_graphql_warp::graphql(schema))
        .and_then(
            |(schema, request): (Schema, async_graphql::Request)| async move {
                Ok::<_, Infallible>(GraphQLResponse::from(schema.execute(request).await))
            },
        );

    let graphql_playground = warp::path!("graphql" / "playground").and(warp::get()).map(|| {
        HttpResponse::builder()
            .header("content-type", "text/html")
            .body(playground_source(GraphQLPlaygroundConfig::new("/graphql")))
    });

    let routes = graphql_playground.or(graphql_post);

    let (addr, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(addr, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Cannot listen for the shutdown signal: {}", e);
            }
        })
        .with_context(|| format!("cannot bind {addr}"))?;
    info!("Listening on http://{}/graphql", addr);
    server.await;
    info!("Server stopped");
    Ok(())
}
