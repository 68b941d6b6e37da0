//! Embedded static assets for the admin UI.

use rust_embed::RustEmbed;

/// `static/` bundled into the binary: `index.html`, `js/` and `css/`
#[derive(RustEmbed)]
#[folder = "static/"]
pub struct Assets;
