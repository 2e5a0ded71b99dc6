//! Storefront content for TurboCommerce, loaded through the `turbo-content`
//! cache.
//!
//! This crate provides:
//!
//! - **Navigation**: header and footer menus (`content/navigation.json`)
//! - **Validation messages**: user-facing form error templates
//! - **Policy pages**: privacy, returns, terms and other static pages
//! - **SiteContent**: one cache-backed facade over all of the above
//! - **ContentView**: degrade-gracefully helpers for request handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use std::path::Path;
//! use turbo_site_content::prelude::*;
//!
//! let config = ContentConfig::load("content.toml")?;
//! let site = SiteContent::from_config(&config, Path::new("."))?;
//! site.preload().await;
//!
//! match site.navigation().await {
//!     Outcome::Valid(nav) => render_header(&nav.header),
//!     Outcome::Invalid(err) => tracing::warn!(%err, "navigation unavailable"),
//! }
//! ```

mod config;
mod messages;
mod navigation;
mod policy;
mod site;
mod view;

pub use config::*;
pub use messages::*;
pub use navigation::*;
pub use policy::*;
pub use site::*;
pub use view::*;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{ContentConfig, PolicyConfig};
    pub use crate::messages::ValidationMessages;
    pub use crate::navigation::{Navigation, NavLink};
    pub use crate::policy::PolicyPage;
    pub use crate::site::{SiteContent, WarmReport};
    pub use crate::view::{status_code, ContentView};
    pub use turbo_content::prelude::*;
}
