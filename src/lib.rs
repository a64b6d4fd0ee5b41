pub mod agent;
pub mod app;
pub mod cloud;
pub mod commands;
pub mod config;
pub mod git;
pub mod llm;
pub mod shared;
pub mod workflow;
