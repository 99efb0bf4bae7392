//! Builders for synthetic process images with libstdc++ container layouts.
//!
//! Every container is laid out the way a 64-bit libstdc++ build lays it out,
//! including the nesting of the control-block members (`_M_impl`, `_M_t`) so
//! that member lookup has to search through bases and nested members.

#![allow(dead_code)]

use usedsize_core::snapshot::Snapshot;
use usedsize_core::types::{Address, Field, ObjectRef, TypeId, TypeInfo};
use usedsize_core::Inspector;

pub const WORD: u64 = 8;

/// Size of a vector, list or map control block.
pub const VECTOR_CONTROL: u64 = 24;
pub const LIST_CONTROL: u64 = 24;
pub const MAP_CONTROL: u64 = 48;

/// Offset of the element inside a list node (`_M_next`, `_M_prev`).
pub const LIST_PAYLOAD: u64 = 2 * WORD;

/// Offset of `_M_node_count` inside a map control block.
pub const MAP_COUNT: u64 = 5 * WORD;

/// Shape of a red-black tree built by [`Image::place_map`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeShape
{
    /// Root in the middle of the key range.
    Balanced,
    /// Every node is the right child of its predecessor.
    RightChain,
    /// Every node is the left child of its successor.
    LeftChain,
}

/// A snapshot plus the scalar types most tests need.
pub struct Image
{
    pub snapshot: Snapshot,
    pub int: TypeId,
    pub long: TypeId,
    pub uchar: TypeId,
    pub boolean: TypeId,
    pub size_t: TypeId,
    pub word: TypeId,
}

impl Image
{
    pub fn new() -> Self
    {
        let mut snapshot = Snapshot::new(WORD);
        let int = snapshot.define_type(TypeInfo::new("int", 4));
        let long = snapshot.define_type(TypeInfo::new("long", 8));
        let uchar = snapshot.define_type(TypeInfo::new("unsigned char", 1));
        let boolean = snapshot.define_type(TypeInfo::new("bool", 1));
        let size_t = snapshot.define_type(TypeInfo::new("unsigned long", 8));
        let void = snapshot.define_type(TypeInfo::new("void", 0));
        let word = snapshot.define_type(TypeInfo::pointer("void*", WORD, void));
        Self {
            snapshot,
            int,
            long,
            uchar,
            boolean,
            size_t,
            word,
        }
    }

    pub fn name(&self, ty: TypeId) -> String
    {
        self.snapshot.type_name(ty).unwrap().to_string()
    }

    pub fn size(&self, ty: TypeId) -> u64
    {
        self.snapshot.byte_size(ty).unwrap()
    }

    pub fn pointer_to(&mut self, ty: TypeId) -> TypeId
    {
        let name = format!("{}*", self.name(ty));
        self.snapshot.define_type(TypeInfo::pointer(name, WORD, ty))
    }

    /// A plain record with the given members; `size` is its `sizeof`.
    pub fn record(&mut self, name: &str, size: u64, members: &[(&str, TypeId, u64)]) -> TypeId
    {
        let mut info = TypeInfo::new(name, size);
        for (member, ty, offset) in members {
            info = info.with_field(Field::member(*member, *ty, *offset));
        }
        self.snapshot.define_type(info)
    }

    /// `std::vector<T>`: `_Vector_base { _Vector_impl _M_impl { _M_start,
    /// _M_finish, _M_end_of_storage } }` reached through a base class.
    pub fn vector_type(&mut self, element: TypeId) -> TypeId
    {
        let element_name = self.name(element);
        let args = format!("{element_name}, std::allocator<{element_name}> ");
        let pointer = self.pointer_to(element);
        let implementation = self.snapshot.define_type(
            TypeInfo::new(format!("std::_Vector_base<{args}>::_Vector_impl"), VECTOR_CONTROL)
                .with_field(Field::member("_M_start", pointer, 0))
                .with_field(Field::member("_M_finish", pointer, WORD))
                .with_field(Field::member("_M_end_of_storage", pointer, 2 * WORD)),
        );
        let base = self.snapshot.define_type(
            TypeInfo::new(format!("std::_Vector_base<{args}>"), VECTOR_CONTROL)
                .with_field(Field::member("_M_impl", implementation, 0)),
        );
        self.snapshot.define_type(
            TypeInfo::new(format!("std::vector<{args}>"), VECTOR_CONTROL)
                .with_template_args([element])
                .with_field(Field::base(base, 0)),
        )
    }

    /// Point the vector control block at `control` to a fresh buffer of
    /// `count` elements; returns the buffer.
    pub fn place_vector(&mut self, control: Address, element_size: u64, count: u64) -> Address
    {
        let buffer = self.snapshot.allocate(element_size * count);
        let finish = buffer + element_size * count;
        self.snapshot.write_pointer(control, buffer).unwrap();
        self.snapshot.write_pointer(control + WORD, finish).unwrap();
        self.snapshot.write_pointer(control + 2 * WORD, finish).unwrap();
        buffer
    }

    /// `std::__cxx11::list<T>`: `_List_base { _List_impl _M_impl {
    /// _List_node_header _M_node } }`.
    pub fn list_type(&mut self, element: TypeId) -> TypeId
    {
        let element_name = self.name(element);
        let args = format!("{element_name}, std::allocator<{element_name}> ");
        let header = self.snapshot.define_type(
            TypeInfo::new("std::__detail::_List_node_header", LIST_CONTROL)
                .with_field(Field::member("_M_next", self.word, 0))
                .with_field(Field::member("_M_prev", self.word, WORD))
                .with_field(Field::member("_M_size", self.size_t, 2 * WORD)),
        );
        let implementation = self.snapshot.define_type(
            TypeInfo::new(format!("std::__cxx11::_List_base<{args}>::_List_impl"), LIST_CONTROL)
                .with_field(Field::member("_M_node", header, 0)),
        );
        let base = self.snapshot.define_type(
            TypeInfo::new(format!("std::__cxx11::_List_base<{args}>"), LIST_CONTROL)
                .with_field(Field::member("_M_impl", implementation, 0)),
        );
        self.snapshot.define_type(
            TypeInfo::new(format!("std::__cxx11::list<{args}>"), LIST_CONTROL)
                .with_template_args([element])
                .with_field(Field::base(base, 0)),
        )
    }

    /// Link `count` fresh nodes into the list whose control block is at
    /// `control`; returns each node's address in list order. Payloads start
    /// [`LIST_PAYLOAD`] bytes into a node.
    pub fn place_list(&mut self, control: Address, payload_size: u64, count: u64) -> Vec<Address>
    {
        let nodes: Vec<Address> = (0..count)
            .map(|_| self.snapshot.allocate(2 * WORD + payload_size))
            .collect();
        let mut ring = vec![control];
        ring.extend(nodes.iter().copied());
        for (index, node) in ring.iter().enumerate() {
            let next = ring[(index + 1) % ring.len()];
            let prev = ring[(index + ring.len() - 1) % ring.len()];
            self.snapshot.write_pointer(*node, next).unwrap();
            self.snapshot.write_pointer(*node + WORD, prev).unwrap();
        }
        self.snapshot
            .write_unsigned(control + 2 * WORD, WORD, count)
            .unwrap();
        nodes
    }

    /// `std::pair<first, second>` with members at their natural offsets.
    pub fn pair_type(&mut self, first: TypeId, second: TypeId) -> TypeId
    {
        let (first_name, second_name) = (self.name(first), self.name(second));
        let second_offset = self.pair_second_offset(first, second);
        let size = (second_offset + self.size(second)).div_ceil(WORD) * WORD;
        self.snapshot.define_type(
            TypeInfo::new(format!("std::pair<{first_name}, {second_name}>"), size)
                .with_template_args([first, second])
                .with_field(Field::member("first", first, 0))
                .with_field(Field::member("second", second, second_offset)),
        )
    }

    pub fn pair_second_offset(&self, first: TypeId, second: TypeId) -> u64
    {
        let align = self.size(second).max(1).next_power_of_two().min(WORD);
        self.size(first).div_ceil(align) * align
    }

    /// `std::map<K, V>`: `_Rb_tree _M_t { _Rb_tree_impl _M_impl { compare,
    /// _Rb_tree_node_base _M_header, size_t _M_node_count } }`.
    pub fn map_type(&mut self, key: TypeId, value: TypeId) -> TypeId
    {
        let (key_name, value_name) = (self.name(key), self.name(value));
        let pair = self.pair_type(key, value);
        let pair_name = self.name(pair);

        let less = self.snapshot.define_type(TypeInfo::new(format!("std::less<{key_name}>"), 1));
        let allocator = self.snapshot.define_type(
            TypeInfo::new(format!("std::allocator<{pair_name} >"), 1).with_template_args([pair]),
        );
        let node_base = self.snapshot.define_type(
            TypeInfo::new("std::_Rb_tree_node_base", 4 * WORD)
                .with_field(Field::member("_M_color", self.int, 0))
                .with_field(Field::member("_M_parent", self.word, WORD))
                .with_field(Field::member("_M_left", self.word, 2 * WORD))
                .with_field(Field::member("_M_right", self.word, 3 * WORD)),
        );
        let args = format!("{key_name}, {value_name}, std::less<{key_name}>, std::allocator<{pair_name} > ");
        let implementation = self.snapshot.define_type(
            TypeInfo::new(format!("std::_Rb_tree<{args}>::_Rb_tree_impl"), MAP_CONTROL)
                .with_field(Field::member("_M_header", node_base, WORD))
                .with_field(Field::member("_M_node_count", self.size_t, 5 * WORD)),
        );
        let tree = self.snapshot.define_type(
            TypeInfo::new(format!("std::_Rb_tree<{args}>"), MAP_CONTROL)
                .with_field(Field::member("_M_impl", implementation, 0)),
        );
        self.snapshot.define_type(
            TypeInfo::new(format!("std::map<{args}>"), MAP_CONTROL)
                .with_template_args([key, value, less, allocator])
                .with_field(Field::member("_M_t", tree, 0)),
        )
    }

    /// Build a tree of `count` nodes with `pair_size`-byte payloads into the
    /// map whose control block is at `control`. Returns the payload address
    /// of each node in key order.
    pub fn place_map(&mut self, control: Address, pair_size: u64, count: usize, shape: TreeShape) -> Vec<Address>
    {
        let header = control + WORD;
        let nodes: Vec<Address> = (0..count)
            .map(|_| self.snapshot.allocate(4 * WORD + pair_size))
            .collect();

        let root = self.link_subtree(&nodes, 0, count, header, shape);
        self.snapshot.write_pointer(header + WORD, root).unwrap();
        let (leftmost, rightmost) = match (nodes.first(), nodes.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => (header, header),
        };
        self.snapshot.write_pointer(header + 2 * WORD, leftmost).unwrap();
        self.snapshot.write_pointer(header + 3 * WORD, rightmost).unwrap();
        self.snapshot
            .write_unsigned(control + MAP_COUNT, WORD, count as u64)
            .unwrap();
        nodes.iter().map(|node| *node + 4 * WORD).collect()
    }

    fn link_subtree(&mut self, nodes: &[Address], low: usize, high: usize, parent: Address, shape: TreeShape) -> Address
    {
        if low >= high {
            return Address::NULL;
        }
        let root = match shape {
            TreeShape::Balanced => low + (high - low) / 2,
            TreeShape::RightChain => low,
            TreeShape::LeftChain => high - 1,
        };
        let node = nodes[root];
        let left = self.link_subtree(nodes, low, root, node, shape);
        let right = self.link_subtree(nodes, root + 1, high, node, shape);
        self.snapshot.write_pointer(node + WORD, parent).unwrap();
        self.snapshot.write_pointer(node + 2 * WORD, left).unwrap();
        self.snapshot.write_pointer(node + 3 * WORD, right).unwrap();
        node
    }

    /// `std::pair` stored in the nodes of `map`.
    pub fn map_entry_type(&self, map: TypeId) -> TypeId
    {
        let allocator = self.snapshot.template_argument(map, 3).unwrap();
        self.snapshot.template_argument(allocator, 0).unwrap()
    }

    pub fn resolve(&self, expression: &str) -> ObjectRef
    {
        self.snapshot.resolve(expression).unwrap()
    }

    pub fn write_word(&mut self, address: Address, value: u64)
    {
        self.snapshot.write_unsigned(address, WORD, value).unwrap();
    }

    /// Allocate storage for a global of type `ty` named `name`.
    pub fn global(&mut self, name: &str, ty: TypeId) -> Address
    {
        let size = self.size(ty);
        let at = self.snapshot.allocate(size);
        self.snapshot.define_symbol(name, at, ty);
        at
    }
}
