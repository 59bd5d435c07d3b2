mod client;

pub use client::{Client, ClientPatch, NewClient};
