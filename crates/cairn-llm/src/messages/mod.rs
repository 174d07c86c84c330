mod client;

pub use client::MessagesClient;
