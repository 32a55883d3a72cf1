//! Font registry: logical font names resolved to loaded faces
//!
//! Card sections refer to fonts by logical identifiers ("title", "mono",
//! a family name). The registry owns the fontdb database, maps identifiers
//! to loaded faces, and applies a configured fallback family when a lookup
//! misses. The measurement oracles borrow face data through it; everything
//! else treats font identifiers as opaque strings.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use fontdb::{Database, Family, Query, Source};

use crate::{LayoutError, Result};

/// Registry mapping logical font identifiers to loaded face data.
pub struct FontRegistry {
    db: Database,
    names: HashMap<String, fontdb::ID>,
    fallback: Option<String>,
}

impl FontRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            db: Database::new(),
            names: HashMap::new(),
            fallback: None,
        }
    }

    /// Register in-memory font data under a logical identifier.
    ///
    /// The first face in the data backs the identifier (collections register
    /// their remaining faces in the database under their family names).
    pub fn register_data(&mut self, name: &str, data: Vec<u8>) -> Result<()> {
        let ids = self.db.load_font_source(Source::Binary(Arc::new(data)));
        let id = ids
            .into_iter()
            .next()
            .ok_or_else(|| LayoutError::FontParsing(format!("no faces in data for '{name}'")))?;
        self.names.insert(name.to_string(), id);
        Ok(())
    }

    /// Register a font file under a logical identifier.
    pub fn register_file(&mut self, name: &str, path: &Path) -> Result<()> {
        let ids = self.db.load_font_source(Source::File(path.to_path_buf()));
        let id = ids.into_iter().next().ok_or_else(|| {
            LayoutError::FontParsing(format!("no faces in {} for '{name}'", path.display()))
        })?;
        self.names.insert(name.to_string(), id);
        Ok(())
    }

    /// Set the fallback identifier used when a lookup misses.
    pub fn set_fallback(&mut self, name: &str) {
        self.fallback = Some(name.to_string());
    }

    /// Resolve a logical identifier to a face ID.
    ///
    /// Tries the registered identifiers first, then a family-name query
    /// against the database, then the configured fallback.
    pub fn resolve(&self, name: &str) -> Option<fontdb::ID> {
        if let Some(id) = self.names.get(name) {
            return Some(*id);
        }
        let query = Query {
            families: &[Family::Name(name)],
            ..Query::default()
        };
        if let Some(id) = self.db.query(&query) {
            return Some(id);
        }
        match &self.fallback {
            Some(fb) if fb != name => {
                tracing::debug!(font = name, fallback = fb.as_str(), "font not found, using fallback");
                self.names.get(fb.as_str()).copied().or_else(|| {
                    self.db.query(&Query {
                        families: &[Family::Name(fb)],
                        ..Query::default()
                    })
                })
            }
            _ => None,
        }
    }

    /// Run a closure over the raw data and face index behind an identifier.
    pub fn with_face_data<T>(&self, name: &str, f: impl FnOnce(&[u8], u32) -> T) -> Option<T> {
        let id = self.resolve(name)?;
        self.db.with_face_data(id, f)
    }

    /// Number of registered identifiers.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if no identifiers are registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}
