#![recursion_limit = "256"]

//! Builds neural networks from `{kind, args}` layer descriptors,
//! trains them on tabular datasets or text corpora with burn, and
//! samples text from trained decoder-only models.

pub mod cli;
pub mod application;
pub mod domain;
pub mod data;
pub mod ml;
pub mod infra;
