//! Node layouts of the node-based standard containers.
//!
//! List and tree nodes are not reachable through the container's own type:
//! the container only stores base-node pointers. Their link offsets are taken
//! from the library's node base types when the debug information has them,
//! and otherwise derived from the pointer width following the libstdc++
//! layout.

use tracing::debug;

use crate::inspector::Inspector;

/// libstdc++ base type of `std::list` nodes.
pub const LIST_NODE_BASE: &str = "std::__detail::_List_node_base";

/// libstdc++ base type of `std::map` / `std::set` tree nodes.
pub const TREE_NODE_BASE: &str = "std::_Rb_tree_node_base";

/// Byte offsets inside list and tree nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdLayout
{
    /// `_M_next` inside a list node.
    pub list_next: u64,
    /// Start of the element stored in a list node.
    pub list_payload: u64,
    /// `_M_parent` inside a tree node.
    pub tree_parent: u64,
    /// `_M_left` inside a tree node.
    pub tree_left: u64,
    /// `_M_right` inside a tree node.
    pub tree_right: u64,
    /// Start of the key/value pair stored in a tree node.
    pub tree_payload: u64,
}

impl StdLayout
{
    /// libstdc++ layout for `width`-byte pointers.
    ///
    /// A list node base is `{ next, prev }`; a tree node base is
    /// `{ color, parent, left, right }` with the color enum padded to a
    /// pointer.
    pub const fn for_pointer_width(width: u64) -> Self
    {
        Self {
            list_next: 0,
            list_payload: 2 * width,
            tree_parent: width,
            tree_left: 2 * width,
            tree_right: 3 * width,
            tree_payload: 4 * width,
        }
    }

    /// Layout read from the node base types the inspector knows about,
    /// falling back to [`StdLayout::for_pointer_width`] piece by piece.
    pub fn discover<I>(inspector: &I) -> Self
    where
        I: Inspector + ?Sized,
    {
        let mut layout = Self::for_pointer_width(inspector.pointer_width());

        if let Some(([next], payload)) = node_base(inspector, LIST_NODE_BASE, ["_M_next"]) {
            layout.list_next = next;
            layout.list_payload = payload;
        }
        if let Some(([parent, left, right], payload)) =
            node_base(inspector, TREE_NODE_BASE, ["_M_parent", "_M_left", "_M_right"])
        {
            layout.tree_parent = parent;
            layout.tree_left = left;
            layout.tree_right = right;
            layout.tree_payload = payload;
        }

        debug!(?layout, "container node layout");
        layout
    }
}

/// Offsets of `members` in the node base type `name`, plus the base's size
/// (where the payload starts). `None` unless every piece is known.
fn node_base<I, const N: usize>(inspector: &I, name: &str, members: [&str; N]) -> Option<([u64; N], u64)>
where
    I: Inspector + ?Sized,
{
    let ty = inspector.lookup_type(name).ok()?;
    let size = inspector.byte_size(ty).ok().filter(|size| *size > 0)?;
    let mut offsets = [0u64; N];
    for (slot, member) in offsets.iter_mut().zip(members) {
        let (offset, _) = inspector.find_member(ty, member).ok()??;
        *slot = offset;
    }
    Some((offsets, size))
}
