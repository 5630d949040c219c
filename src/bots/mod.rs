pub mod client_bot;
