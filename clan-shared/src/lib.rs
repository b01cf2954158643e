//! Types and rules shared by the Clan Companion server and clients.

pub mod api;
pub mod auth;
pub mod domain;
pub mod guard;
pub mod jwt;
pub mod path;
