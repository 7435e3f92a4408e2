pub mod cli;
pub mod config;
pub mod detect;
pub mod diff;
pub mod error;
pub mod gate;
pub mod ingest;
pub mod model;
pub mod parsers;
pub mod report;
pub mod template;
pub mod threshold;
pub mod util;
pub mod xml;
