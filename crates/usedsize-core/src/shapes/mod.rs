//! # Shapes
//!
//! A shape is a structural category of type whose real footprint differs from
//! its `sizeof`: contiguous arrays, circular lists, pairs, ordered trees and a
//! fixed catalog of domain records. Anything else is opaque and is sized by
//! its static byte size.
//!
//! Classification is by canonical type name. It is decided once per type
//! handle and cached by the [`Classifier`]; the memory behind an object is
//! never cached.
//!
//! Each shape has a handler bound to one object. Handlers are created fresh
//! for every object they size and recurse through
//! [`crate::SizeResolver::instance_size`] for element and field types.

pub mod array;
pub mod layout;
pub mod list;
pub mod map;
pub mod pair;
pub mod record;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

pub use array::ArrayHandler;
pub use layout::StdLayout;
pub use list::ListHandler;
pub use map::MapHandler;
pub use pair::PairHandler;
pub use record::{RecipeHandler, RecipePart, RecordHandler, RecordRecipe};

use crate::config::ResolverConfig;
use crate::error::SizeResult;
use crate::inspector::Inspector;
use crate::types::TypeId;

/// Structural category of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape
{
    /// Contiguous dynamic buffer (`std::vector`).
    Array,
    /// Circular doubly-linked list with a sentinel node (`std::list`).
    List,
    /// Two-member compound (`std::pair`).
    Pair,
    /// Red-black tree keyed map (`std::map`).
    OrderedMap,
    /// Domain record with a hand-written size recipe.
    Recipe(&'static RecordRecipe),
    /// Domain record sized by reflecting over its fields.
    Record,
    /// Everything else: static byte size.
    Opaque,
}

impl Shape
{
    /// Whether the shape needs more than `sizeof` to be sized.
    pub fn is_special(self) -> bool
    {
        !matches!(self, Shape::Opaque)
    }
}

/// Namespaces the standard containers are found under. `__cxx11` is the
/// libstdc++ dual-ABI inline namespace.
const STD_NAMESPACES: &[&str] = &["std::", "std::__cxx11::"];

/// Container templates, checked in order; first match wins.
const CONTAINER_TEMPLATES: &[(&str, Shape)] = &[
    ("vector<", Shape::Array),
    ("list<", Shape::List),
    ("pair<", Shape::Pair),
    ("map<", Shape::OrderedMap),
];

/// Decides which shape applies to a type.
#[derive(Debug, Default)]
pub struct Classifier
{
    record_types: HashSet<String>,
    cache: RefCell<HashMap<TypeId, Shape>>,
}

impl Classifier
{
    /// Classifier recognizing the built-in records plus `config.record_types`.
    pub fn new(config: &ResolverConfig) -> Self
    {
        let record_types = record::REFLECTED_RECORDS
            .iter()
            .map(|name| (*name).to_string())
            .chain(config.record_types.iter().cloned())
            .collect();
        Self {
            record_types,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Shape of the type behind `ty`.
    pub fn classify<I>(&self, inspector: &I, ty: TypeId) -> SizeResult<Shape>
    where
        I: Inspector + ?Sized,
    {
        if let Some(shape) = self.cache.borrow().get(&ty) {
            return Ok(*shape);
        }
        let shape = self.classify_name(inspector.type_name(ty)?);
        self.cache.borrow_mut().insert(ty, shape);
        Ok(shape)
    }

    /// Shape for a type name.
    pub fn classify_name(&self, name: &str) -> Shape
    {
        let name = canonical_name(name);

        for namespace in STD_NAMESPACES {
            let Some(rest) = name.strip_prefix(namespace) else {
                continue;
            };
            if let Some((_, shape)) = CONTAINER_TEMPLATES.iter().find(|(template, _)| rest.starts_with(template)) {
                return *shape;
            }
        }

        if let Some(recipe) = record::recipe_for(name) {
            return Shape::Recipe(recipe);
        }
        if self.record_types.contains(name) {
            return Shape::Record;
        }
        Shape::Opaque
    }
}

/// Strip qualifiers and elaborated-type keywords that do not change the shape.
///
/// ```rust
/// use usedsize_core::shapes::canonical_name;
///
/// assert_eq!(canonical_name("const std::vector<int>"), "std::vector<int>");
/// assert_eq!(canonical_name("class CMasternode const"), "CMasternode");
/// ```
pub fn canonical_name(name: &str) -> &str
{
    let mut name = name.trim();
    loop {
        let stripped = ["const ", "volatile ", "struct ", "class "]
            .iter()
            .find_map(|keyword| name.strip_prefix(keyword));
        match stripped {
            Some(rest) => name = rest.trim_start(),
            None => break,
        }
    }
    while let Some(rest) = name.strip_suffix(" const").or_else(|| name.strip_suffix(" volatile")) {
        name = rest.trim_end();
    }
    name
}
