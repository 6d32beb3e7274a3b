//! HLS relay.
//!
//! Fetches playlists and media segments from an upstream origin on behalf of
//! a player. Playlists are rewritten so every child reference points back at
//! the relay; everything else is streamed through unchanged.
//!
//! # Routes
//!
//! - `GET /api/stream?url={encodedURL}` - Relay an explicit upstream URL
//! - `GET /api/stream/{channelId}` - Resolve a channel through the catalog, then relay it

pub mod catalog;
mod relay;
pub mod upstream;

pub use catalog::{create_catalog, ChannelCatalog};
pub use relay::{relay_by_channel, relay_by_url};
pub use upstream::UpstreamClient;

use axum::{routing::get, Router};

use crate::playlist::RELAY_ROUTE;
use crate::server::AppContext;

/// Create the relay router.
pub fn relay_router() -> Router<AppContext> {
    Router::new()
        .route(RELAY_ROUTE, get(relay_by_url))
        .route(&format!("{}/:channel_id", RELAY_ROUTE), get(relay_by_channel))
}
