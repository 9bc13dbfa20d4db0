pub mod format;
pub mod gateway;
pub mod rest;
pub mod types;

pub use gateway::DiscordGateway;
pub use rest::DiscordRestClient;
pub use types::IncomingMessage;
