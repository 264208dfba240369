pub mod error;
pub mod http;
pub mod sentiment;
pub mod webdriver;
