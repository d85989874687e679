pub mod changes;
pub mod cli;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod filter;
pub mod github;
pub mod ingest;
pub mod model;
pub mod parsers;
pub mod report;
pub mod review;
