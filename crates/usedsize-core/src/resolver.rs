//! # Size Resolver
//!
//! Entry point of a size query and the single place every handler recurses
//! through.
//!
//! `instance_size(object)` classifies the object's static type. An opaque type
//! is answered with its byte size; a special shape is handed to a freshly
//! built handler bound to the object. Memory is re-read on every call: the
//! process may have changed since the previous query.

use tracing::{debug, instrument};

use crate::config::ResolverConfig;
use crate::error::{SizeError, SizeResult};
use crate::inspector::Inspector;
use crate::shapes::{
    ArrayHandler, Classifier, ListHandler, MapHandler, PairHandler, RecipeHandler, RecordHandler, Shape, StdLayout,
};
use crate::types::{ObjectRef, TypeId};

/// Something that knows the used size of one object.
///
/// Implementations are bound to a single object at construction and are not
/// reused across objects.
pub trait ShapeHandler
{
    /// Bytes reachable from the object: its own storage plus every payload it
    /// owns.
    fn used_size(&self) -> SizeResult<u64>;
}

/// Computes used sizes against one inspector.
pub struct SizeResolver<'i>
{
    inspector: &'i dyn Inspector,
    classifier: Classifier,
    layout: StdLayout,
    config: ResolverConfig,
}

impl<'i> SizeResolver<'i>
{
    /// Resolver over `inspector`; container node layouts are discovered once
    /// here.
    pub fn new(inspector: &'i dyn Inspector, config: ResolverConfig) -> Self
    {
        Self {
            inspector,
            classifier: Classifier::new(&config),
            layout: StdLayout::discover(inspector),
            config,
        }
    }

    /// The inspector queries run against.
    pub fn inspector(&self) -> &'i dyn Inspector
    {
        self.inspector
    }

    /// Node layouts used by the list and tree walks.
    pub fn layout(&self) -> &StdLayout
    {
        &self.layout
    }

    /// Active configuration.
    pub fn config(&self) -> &ResolverConfig
    {
        &self.config
    }

    /// Shape of a type.
    pub fn classify(&self, ty: TypeId) -> SizeResult<Shape>
    {
        self.classifier.classify(self.inspector, ty)
    }

    /// Whether a type needs more than its static size.
    pub fn is_special(&self, ty: TypeId) -> SizeResult<bool>
    {
        Ok(self.classify(ty)?.is_special())
    }

    /// Used size of the object an expression denotes.
    ///
    /// ## Errors
    ///
    /// - `UnresolvedSymbol` / `InvalidExpression`: the expression does not
    ///   denote an object
    /// - anything [`SizeResolver::instance_size`] returns
    pub fn size_of(&self, expression: &str) -> SizeResult<u64>
    {
        let object = self.inspector.resolve(expression)?;
        self.instance_size(&object)
    }

    /// Used size of an object: static size for opaque types, the shape
    /// handler's answer otherwise.
    #[instrument(level = "trace", skip_all, fields(object = %object.name))]
    pub fn instance_size(&self, object: &ObjectRef) -> SizeResult<u64>
    {
        let shape = self.classify(object.ty)?;
        let size = match shape {
            Shape::Opaque => return self.inspector.byte_size(object.ty),
            Shape::Array => ArrayHandler::new(self, object.clone()).used_size()?,
            Shape::List => ListHandler::new(self, object.clone()).used_size()?,
            Shape::Pair => PairHandler::new(self, object.clone()).used_size()?,
            Shape::OrderedMap => MapHandler::new(self, object.clone()).used_size()?,
            Shape::Recipe(recipe) => RecipeHandler::new(self, object.clone(), recipe).used_size()?,
            Shape::Record => RecordHandler::new(self, object.clone()).used_size()?,
        };
        debug!(object = %object.name, ?shape, size, "computed used size");
        Ok(size)
    }

    /// Used size of a member that may or may not be special: recursion when it
    /// is, static size of its type when it is not.
    pub(crate) fn member_size(&self, object: &ObjectRef, special: bool) -> SizeResult<u64>
    {
        if special {
            self.instance_size(object)
        } else {
            self.inspector.byte_size(object.ty)
        }
    }

    /// `total + part`, or `CorruptStructure` when the sum leaves `u64`.
    pub(crate) fn add_part(&self, container: &ObjectRef, total: u64, part: u64) -> SizeResult<u64>
    {
        total.checked_add(part).ok_or_else(|| {
            SizeError::corrupt(
                &container.name,
                format!("used size overflows: {total} + {part} bytes"),
            )
        })
    }

    /// Fail with `CorruptStructure` when a walk would exceed the traversal limit.
    pub(crate) fn ensure_within_limit(&self, container: &ObjectRef, count: u64) -> SizeResult<()>
    {
        if count > self.config.traversal_limit {
            return Err(SizeError::corrupt(
                &container.name,
                format!(
                    "{count} elements exceed the traversal limit of {}",
                    self.config.traversal_limit
                ),
            ));
        }
        Ok(())
    }
}
