//! Red-black tree keyed maps (`std::map`).
//!
//! The control block holds the tree header node (`_M_header`, whose parent
//! link is the root) and the number of live entries (`_M_node_count`). Each
//! node stores a `pair<const K, V>` after its base links. Entries are visited
//! with an in-order successor walk starting at the leftmost node, for exactly
//! `_M_node_count` steps.

use tracing::{debug, trace};

use super::pair::PairLayout;
use crate::error::{SizeError, SizeResult};
use crate::resolver::{ShapeHandler, SizeResolver};
use crate::types::{Address, ObjectRef};

/// Sizes one ordered-map-like object.
pub struct MapHandler<'r, 'i>
{
    resolver: &'r SizeResolver<'i>,
    object: ObjectRef,
}

impl<'r, 'i> MapHandler<'r, 'i>
{
    /// Bind a handler to `object`.
    pub fn new(resolver: &'r SizeResolver<'i>, object: ObjectRef) -> Self
    {
        Self { resolver, object }
    }

    /// Number of live entries, read from the control block.
    pub fn count(&self) -> SizeResult<u64>
    {
        let inspector = self.resolver.inspector();
        let field = inspector.member(&self.object, "_M_node_count")?;
        inspector.read_unsigned(field.address, inspector.byte_size(field.ty)?)
    }

    /// Layout of the pair stored in each node.
    ///
    /// The pair type is the allocator's value type when the allocator
    /// argument is known; otherwise the layout is derived from the key and
    /// value sizes.
    fn entry_layout(&self) -> SizeResult<PairLayout>
    {
        let inspector = self.resolver.inspector();
        let key = inspector.template_argument(self.object.ty, 0)?;
        let value = inspector.template_argument(self.object.ty, 1)?;
        let pair_type = inspector
            .template_argument(self.object.ty, 3)
            .and_then(|allocator| inspector.template_argument(allocator, 0))
            .ok();
        PairLayout::new(inspector, key, value, pair_type)
    }

    fn corrupt(&self, reason: impl Into<String>) -> SizeError
    {
        SizeError::corrupt(&self.object.name, reason)
    }

    fn link(&self, node: Address, offset: u64) -> SizeResult<Address>
    {
        self.resolver.inspector().read_pointer(node + offset)
    }

    /// Leftmost descendant of `node`, taking at most `bound` steps.
    fn leftmost(&self, mut node: Address, bound: u64) -> SizeResult<Address>
    {
        let left_offset = self.resolver.layout().tree_left;
        let mut steps = 0u64;
        loop {
            let left = self.link(node, left_offset)?;
            if left.is_null() {
                return Ok(node);
            }
            steps += 1;
            if steps > bound {
                return Err(self.corrupt(format!("left spine longer than {bound} nodes")));
            }
            node = left;
        }
    }

    /// In-order successor of `node`, which must not be the last entry.
    fn successor(&self, mut node: Address, header: Address, bound: u64) -> SizeResult<Address>
    {
        let layout = self.resolver.layout();
        let right = self.link(node, layout.tree_right)?;
        if !right.is_null() {
            return self.leftmost(right, bound);
        }

        for _ in 0..bound {
            let parent = self.link(node, layout.tree_parent)?;
            if parent.is_null() {
                return Err(self.corrupt(format!("node {node} has no parent")));
            }
            if parent == header {
                return Err(self.corrupt("successor walk climbed past the root before visiting every entry"));
            }
            if self.link(parent, layout.tree_right)? != node {
                return Ok(parent);
            }
            node = parent;
        }
        Err(self.corrupt(format!("parent chain longer than {bound} nodes")))
    }
}

impl ShapeHandler for MapHandler<'_, '_>
{
    fn used_size(&self) -> SizeResult<u64>
    {
        let inspector = self.resolver.inspector();
        let control = inspector.byte_size(self.object.ty)?;
        let count = self.count()?;
        let entry = self.entry_layout()?;
        let key_size = inspector.byte_size(entry.first)?;
        let value_size = inspector.byte_size(entry.second)?;
        let key_special = self.resolver.is_special(entry.first)?;
        let value_special = self.resolver.is_special(entry.second)?;
        debug!(object = %self.object.name, count, key_special, value_special, "sizing ordered-map-like container");

        if count == 0 {
            return Ok(control);
        }
        if !key_special && !value_special {
            return key_size
                .checked_add(value_size)
                .and_then(|entry_size| count.checked_mul(entry_size))
                .and_then(|entries| entries.checked_add(control))
                .ok_or_else(|| self.corrupt(format!("{count} entries overflow the address space")));
        }

        self.resolver.ensure_within_limit(&self.object, count)?;
        let layout = self.resolver.layout();
        let header = inspector.member(&self.object, "_M_header")?.address;
        let root = self.link(header, layout.tree_parent)?;
        if root.is_null() {
            return Err(self.corrupt(format!("{count} entries recorded but the tree has no root")));
        }

        let mut total = control;
        let mut node = self.leftmost(root, count)?;
        for index in 0..count {
            if node.is_null() || node == header {
                return Err(self.corrupt(format!("walk ended after {index} of {count} entries")));
            }
            trace!(object = %self.object.name, node = %node, index, "tree node");

            let payload = node + layout.tree_payload;
            let key = ObjectRef::new(
                format!("{}.<entry {index}>.first", self.object.name),
                payload + entry.first_offset,
                entry.first,
            );
            let value = ObjectRef::new(
                format!("{}.<entry {index}>.second", self.object.name),
                payload + entry.second_offset,
                entry.second,
            );
            total = self.resolver.add_part(&self.object, total, self.resolver.member_size(&key, key_special)?)?;
            total = self.resolver.add_part(&self.object, total, self.resolver.member_size(&value, value_special)?)?;

            if index + 1 < count {
                node = self.successor(node, header, count)?;
            }
        }
        Ok(total)
    }
}
