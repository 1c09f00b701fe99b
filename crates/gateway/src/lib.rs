#![forbid(unsafe_code)]

pub mod http;
pub mod remote;

pub use http::{HttpGateway, HttpGatewayConfig};
pub use remote::{GatewayError, InMemoryGateway, NewCardRequest, RemoteDeckGateway};
