// Reward engine: scoring and reward-qualification pipeline for a social
// platform. Each module corresponds to one component of the interaction
// pipeline and daily cohort engine.

pub mod cohort;
pub mod config;
pub mod content_index;
pub mod db;
pub mod gibberish;
pub mod output;
pub mod quality;
pub mod queue;
pub mod router;
pub mod scoring;
pub mod status;
pub mod validator;
pub mod webhook;

#[cfg(feature = "web")]
pub mod web;
