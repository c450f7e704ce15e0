//! Terminal grid browser for dataset samples.
//!
//! Items are fetched page by page from a dataset server and shown as a grid
//! of cards. A single click on a card toggles its selection; a double click
//! opens it. The two are told apart by [`gesture::GestureDisambiguator`].

pub mod app;
pub mod config;
pub mod feed;
pub mod gesture;
pub mod overlay;
pub mod theme;
pub mod ui;
pub mod util;
