pub mod broadcast;
pub mod connection;
pub mod dispatch;
pub mod handlers;
pub mod handshake;
pub mod message;
