//! # Hermes Gateway
//!
//! Derives the front-door gateway's routing table from call descriptions,
//! so the reverse proxy never needs a hand-maintained route list.
//!
//! ```text
//!   Registry ─► descriptions ─► GatewayTableBuilder ─► GatewayRouteTable ─► JSON
//!                                                        │
//!                                               resolve(path) (longest prefix)
//! ```
//!
//! The builder runs once at boot over the same registry the server uses.

#![doc(html_root_url = "https://docs.rs/hermes-gateway/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod table;

pub use error::{GatewayError, GatewayResult};
pub use table::{GatewayRoute, GatewayRouteTable, GatewayTableBuilder, PrefixConflict};
