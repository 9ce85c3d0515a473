//! notedeck - a browser for markdown study notes
//!
//! Renders a fixed catalog of markdown files into a navigation panel and a
//! content panel, with an in-page outline, syntax-highlighted code and PDF
//! export of the displayed page.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::pedantic))]
// Allow some pedantic lints that are too strict for this project
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::enum_variant_names)]

pub mod browser;
pub mod catalog;
pub mod check;
pub mod cli;
pub mod config;
pub mod emoji;
pub mod export;
pub mod loader;
pub mod navigation;
pub mod outline;
pub mod render;
pub mod session;
pub mod site;
pub mod title;
