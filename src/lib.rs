pub mod auth;
pub mod collab;
pub mod events;
pub mod hub;
pub mod objects;
pub mod storage;
pub mod views;
