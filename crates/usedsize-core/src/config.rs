//! Resolver configuration.
//!
//! Defaults suit a healthy process. Environment variables adjust them without
//! recompiling, and the CLI flags override both.
//!
//! - `USEDSIZE_TRAVERSAL_LIMIT`: maximum number of nodes/elements one walk may
//!   visit before the container is declared corrupt
//! - `USEDSIZE_RECORD_TYPES`: comma-separated record type names sized by
//!   reflecting over their fields, in addition to the built-in set

use std::env;

use tracing::warn;

/// Default bound on the nodes visited by a single container walk.
pub const DEFAULT_TRAVERSAL_LIMIT: u64 = 1 << 24;

/// Tunables for a [`crate::SizeResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig
{
    /// Upper bound on nodes visited by one list walk, tree walk or
    /// special-element array iteration.
    pub traversal_limit: u64,
    /// Extra record types to size by field reflection.
    pub record_types: Vec<String>,
}

impl Default for ResolverConfig
{
    fn default() -> Self
    {
        Self {
            traversal_limit: DEFAULT_TRAVERSAL_LIMIT,
            record_types: Vec::new(),
        }
    }
}

impl ResolverConfig
{
    /// Defaults adjusted by `USEDSIZE_TRAVERSAL_LIMIT` and `USEDSIZE_RECORD_TYPES`.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self
    {
        let mut config = Self::default();

        if let Ok(raw) = env::var("USEDSIZE_TRAVERSAL_LIMIT") {
            match raw.trim().parse::<u64>() {
                Ok(limit) if limit > 0 => config.traversal_limit = limit,
                _ => warn!("Ignoring USEDSIZE_TRAVERSAL_LIMIT={raw}: expected a positive integer"),
            }
        }

        if let Ok(raw) = env::var("USEDSIZE_RECORD_TYPES") {
            config.record_types.extend(parse_type_list(&raw));
        }

        config
    }

    /// Builder: override the traversal limit.
    #[must_use]
    pub fn with_traversal_limit(mut self, limit: u64) -> Self
    {
        self.traversal_limit = limit;
        self
    }

    /// Builder: add a reflectively sized record type.
    #[must_use]
    pub fn with_record_type(mut self, name: impl Into<String>) -> Self
    {
        self.record_types.push(name.into());
        self
    }
}

/// Split a comma-separated list of type names, dropping empty entries.
fn parse_type_list(raw: &str) -> impl Iterator<Item = String> + '_
{
    raw.split(',').map(str::trim).filter(|name| !name.is_empty()).map(str::to_string)
}
