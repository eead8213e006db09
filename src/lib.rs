pub mod app;
pub mod booking;
pub mod credential;
pub mod filter;
pub mod recommend;
pub mod store;
pub mod tmdb;
