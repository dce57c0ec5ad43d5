pub mod client;
pub mod request;
pub mod scanner;

pub use client::SocketHttpClient;
