//! Two-member compounds (`std::pair`).

use crate::error::SizeResult;
use crate::inspector::Inspector;
use crate::resolver::{ShapeHandler, SizeResolver};
use crate::types::{ObjectRef, TypeId};

/// Member types and offsets of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairLayout
{
    /// Type of `first`.
    pub first: TypeId,
    /// Type of `second`.
    pub second: TypeId,
    /// Offset of `first` from the start of the pair.
    pub first_offset: u64,
    /// Offset of `second` from the start of the pair.
    pub second_offset: u64,
}

impl PairLayout
{
    /// Layout of a pair with the given member types.
    ///
    /// Offsets come from `pair_type`'s `first`/`second` members when that type
    /// is known; otherwise `first` sits at 0 and `second` at the end of
    /// `first` rounded up to the natural alignment of `second`.
    pub fn new<I>(inspector: &I, first: TypeId, second: TypeId, pair_type: Option<TypeId>) -> SizeResult<Self>
    where
        I: Inspector + ?Sized,
    {
        if let Some(pair_type) = pair_type {
            if let (Some((first_offset, _)), Some((second_offset, _))) = (
                inspector.find_member(pair_type, "first")?,
                inspector.find_member(pair_type, "second")?,
            ) {
                return Ok(Self {
                    first,
                    second,
                    first_offset,
                    second_offset,
                });
            }
        }

        let first_size = inspector.byte_size(first)?;
        let second_size = inspector.byte_size(second)?;
        let align = second_size.max(1).next_power_of_two().min(inspector.pointer_width().max(1));
        Ok(Self {
            first,
            second,
            first_offset: 0,
            second_offset: first_size.div_ceil(align) * align,
        })
    }

    /// Layout of the pair type itself: member types from its template
    /// arguments.
    pub fn of_pair<I>(inspector: &I, pair_type: TypeId) -> SizeResult<Self>
    where
        I: Inspector + ?Sized,
    {
        let first = inspector.template_argument(pair_type, 0)?;
        let second = inspector.template_argument(pair_type, 1)?;
        Self::new(inspector, first, second, Some(pair_type))
    }
}

/// Sizes one pair-like object.
pub struct PairHandler<'r, 'i>
{
    resolver: &'r SizeResolver<'i>,
    object: ObjectRef,
}

impl<'r, 'i> PairHandler<'r, 'i>
{
    /// Bind a handler to `object`.
    pub fn new(resolver: &'r SizeResolver<'i>, object: ObjectRef) -> Self
    {
        Self { resolver, object }
    }
}

impl ShapeHandler for PairHandler<'_, '_>
{
    fn used_size(&self) -> SizeResult<u64>
    {
        let inspector = self.resolver.inspector();
        let layout = PairLayout::of_pair(inspector, self.object.ty)?;
        let first_special = self.resolver.is_special(layout.first)?;
        let second_special = self.resolver.is_special(layout.second)?;

        if !first_special && !second_special {
            let first_size = inspector.byte_size(layout.first)?;
            return self
                .resolver
                .add_part(&self.object, first_size, inspector.byte_size(layout.second)?);
        }

        let first = self.object.child(".first", layout.first_offset, layout.first);
        let second = self.object.child(".second", layout.second_offset, layout.second);
        let first_size = self.resolver.member_size(&first, first_special)?;
        self.resolver
            .add_part(&self.object, first_size, self.resolver.member_size(&second, second_special)?)
    }
}
