pub mod auth;
pub mod error;
pub mod middleware;
pub mod pairing;
pub mod projection;
pub mod rooms;
