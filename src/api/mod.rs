mod client;
mod transport;

pub use client::{ApiClient, ApiClientBuilder};
pub use transport::{ChatTransport, TokenStream};
