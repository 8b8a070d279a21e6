//! Microfiche: an archive.org frontend for small and vintage browsers.
//!
//! Classifies each request into a markup mode (plain HTML 2.0 for text
//! browsers, WML decks for WAP phones, XHTML MP for WAP2, and so on),
//! renders every page through mode-specific templates, and transcodes
//! item thumbnails into formats old clients can decode.

pub mod archive;
pub mod cli;
pub mod config;
pub mod imaging;
pub mod logging;
pub mod metrics;
pub mod mode;
pub mod render;
pub mod server;
pub mod util;
