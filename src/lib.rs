// genmedia-clients - shared Google generative AI client handles
// Author: kelexine (https://github.com/kelexine)

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod genai;
pub mod metrics;
pub mod oauth;
pub mod utils;
