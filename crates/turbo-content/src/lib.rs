//! Validated content configuration cache for TurboCommerce storefronts.
//!
//! This crate provides:
//! - `ContentSource` - Fetches raw documents by logical path
//! - `SchemaValidator` - Turns a raw document into typed content or field errors
//! - `CacheStore` - Per-path outcome storage with single-flight coordination
//! - `ContentLoader` - Source -> validator -> store, exposed as one `load` call
//!
//! # Example
//!
//! ```rust,ignore
//! use turbo_content::{ContentLoader, FsSource, JsonSchemaValidator, LogicalPath};
//!
//! let loader = ContentLoader::new(FsSource::new("./site"));
//! let validator = JsonSchemaValidator::<Navigation>::new("navigation", &schema)?;
//! let path = LogicalPath::new("content/navigation.json")?;
//!
//! match loader.load(&path, &validator).await {
//!     Outcome::Valid(nav) => render(&nav),
//!     Outcome::Invalid(err) => render_error(&err),
//! }
//! ```

mod error;
mod loader;
mod outcome;
mod path;
mod schema;
mod source;
mod store;

pub use error::*;
pub use loader::*;
pub use outcome::*;
pub use path::*;
pub use schema::*;
pub use source::*;
pub use store::*;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        ContentLoader, ContentSource, FieldError, FieldPath, LoadError, LogicalPath, Outcome,
        SchemaValidator,
    };
}
