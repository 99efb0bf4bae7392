//! Circular doubly-linked lists with a sentinel node (`std::list`).
//!
//! The control block embeds the sentinel (`_M_node`). Live nodes are reached
//! by following `_M_next` from the sentinel until it comes back around; an
//! empty list's sentinel points to itself.

use tracing::{debug, trace};

use crate::error::{SizeError, SizeResult};
use crate::resolver::{ShapeHandler, SizeResolver};
use crate::types::ObjectRef;

/// Sizes one list-like object.
pub struct ListHandler<'r, 'i>
{
    resolver: &'r SizeResolver<'i>,
    object: ObjectRef,
}

impl<'r, 'i> ListHandler<'r, 'i>
{
    /// Bind a handler to `object`.
    pub fn new(resolver: &'r SizeResolver<'i>, object: ObjectRef) -> Self
    {
        Self { resolver, object }
    }
}

impl ShapeHandler for ListHandler<'_, '_>
{
    fn used_size(&self) -> SizeResult<u64>
    {
        let inspector = self.resolver.inspector();
        let layout = self.resolver.layout();
        let limit = self.resolver.config().traversal_limit;

        let element = inspector.template_argument(self.object.ty, 0)?;
        let element_size = inspector.byte_size(element)?;
        let special = self.resolver.is_special(element)?;

        let sentinel = inspector.member(&self.object, "_M_node")?.address;
        let mut total = inspector.byte_size(self.object.ty)?;
        let mut visited = 0u64;
        let mut current = inspector.read_pointer(sentinel + layout.list_next)?;

        while current != sentinel {
            if current.is_null() {
                return Err(SizeError::corrupt(
                    &self.object.name,
                    format!("null link after {visited} nodes"),
                ));
            }
            if visited == limit {
                return Err(SizeError::corrupt(
                    &self.object.name,
                    format!("no return to the sentinel within {limit} nodes"),
                ));
            }
            trace!(object = %self.object.name, node = %current, index = visited, "list node");

            let node_size = if special {
                let payload = ObjectRef::new(
                    format!("{}.<node {visited}>", self.object.name),
                    current + layout.list_payload,
                    element,
                );
                self.resolver.instance_size(&payload)?
            } else {
                element_size
            };
            total = self.resolver.add_part(&self.object, total, node_size)?;
            visited += 1;
            current = inspector.read_pointer(current + layout.list_next)?;
        }

        debug!(object = %self.object.name, nodes = visited, "walked list-like container");
        Ok(total)
    }
}
