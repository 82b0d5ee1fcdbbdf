mod client;
mod message;

pub use client::MessageClientImplSqs;
