//! Attack-to-enforcement pipeline: configuration, plug-in registry,
//! ingestion adapters, recipe selection, MSPL projection and dashboard
//! publication, wired around the `shield-policy` data model and
//! set-algebra optimizer.

pub mod actions;
pub mod config;
pub mod error;
pub mod filters;
pub mod ingest;
pub mod library;
pub mod parsers;
pub mod project;
pub mod registry;
pub mod resolver;
pub mod select;
pub mod sink;

pub use config::{Config, DashboardContent as ConfigDashboardContent, GlobalConfig, InputMethod, LimitConfig, VnsfoConfig};
pub use error::{Result, ShieldError};
pub use library::{load_landscape, load_recipe_directory};
pub use project::project;
pub use registry::{ActionPlugin, FilterPlugin, ParserPlugin, Registry};
pub use resolver::{HttpNodeResolver, NodeResolver};
pub use select::select_recipe;
pub use sink::{DashboardContent, DashboardSink, FanOutSink, FileSink, HttpSink};
