//! The library code for the `quire` static site generator. It turns a
//! directory of Pelican- or Jekyll-style markdown files into a static blog.
//! The architecture breaks down into two steps:
//!
//! 1. Loading the site: every source file is parsed into a
//!    [`document::Document`] ([`crate::parser`]) and registered with a
//!    [`index::SiteIndex`], which checks that slugs are unique and collects
//!    tags and categories. Finalizing the index sorts the articles and yields
//!    a read-only [`index::Site`].
//! 2. Building the output: [`build::Coordinator`] schedules one task per
//!    artifact (index pages, articles, pages, tags, categories, the archive,
//!    the feed), renders each with a [`render::Renderer`] on a thread pool,
//!    and writes the results ([`crate::write`]).
//!
//! Loading errors stop the build before anything is written. Rendering errors
//! are collected, and the first one is reported once every task is done.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod context;
pub mod document;
pub mod feed;
pub mod index;
pub mod markdown;
pub mod pagination;
pub mod parser;
pub mod render;
pub mod slug;
pub mod write;
