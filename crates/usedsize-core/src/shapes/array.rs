//! Contiguous dynamic buffers (`std::vector`).
//!
//! The control block holds `_M_start` and `_M_finish`, pointers to the first
//! element and one past the last live element. The element count is their
//! distance divided by the element size.

use tracing::debug;

use crate::error::{SizeError, SizeResult};
use crate::resolver::{ShapeHandler, SizeResolver};
use crate::types::{Address, ObjectRef, TypeId};

/// Live elements of one array-like object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayView
{
    /// First element.
    pub start: Address,
    /// Number of live elements.
    pub count: u64,
    /// Element type (template argument 0).
    pub element: TypeId,
    /// Static size of one element.
    pub element_size: u64,
}

/// Sizes one array-like object.
pub struct ArrayHandler<'r, 'i>
{
    resolver: &'r SizeResolver<'i>,
    object: ObjectRef,
}

impl<'r, 'i> ArrayHandler<'r, 'i>
{
    /// Bind a handler to `object`.
    pub fn new(resolver: &'r SizeResolver<'i>, object: ObjectRef) -> Self
    {
        Self { resolver, object }
    }

    /// Read the buffer bounds from the control block.
    ///
    /// ## Errors
    ///
    /// - `CorruptStructure`: the end lies before the start, or the span is not
    ///   a whole number of elements
    pub fn view(&self) -> SizeResult<ArrayView>
    {
        let inspector = self.resolver.inspector();
        let element = inspector.template_argument(self.object.ty, 0)?;
        let element_size = inspector.byte_size(element)?;

        let start = inspector.read_pointer(inspector.member(&self.object, "_M_start")?.address)?;
        let finish = inspector.read_pointer(inspector.member(&self.object, "_M_finish")?.address)?;
        let span = finish
            .distance_from(start)
            .ok_or_else(|| SizeError::corrupt(&self.object.name, format!("end {finish} lies before start {start}")))?;

        let count = match element_size {
            0 => 0,
            size if span % size == 0 => span / size,
            size => {
                return Err(SizeError::corrupt(
                    &self.object.name,
                    format!("buffer span of {span} bytes is not a multiple of the {size}-byte element"),
                ))
            }
        };

        Ok(ArrayView {
            start,
            count,
            element,
            element_size,
        })
    }

    /// Number of live elements.
    pub fn count(&self) -> SizeResult<u64>
    {
        Ok(self.view()?.count)
    }
}

impl ShapeHandler for ArrayHandler<'_, '_>
{
    fn used_size(&self) -> SizeResult<u64>
    {
        let control = self.resolver.inspector().byte_size(self.object.ty)?;
        let view = self.view()?;
        debug!(object = %self.object.name, count = view.count, "sizing array-like container");

        if !self.resolver.is_special(view.element)? {
            return control
                .checked_add(view.count * view.element_size)
                .ok_or_else(|| SizeError::corrupt(&self.object.name, "buffer span overflows the address space"));
        }

        self.resolver.ensure_within_limit(&self.object, view.count)?;
        let mut total = control;
        for index in 0..view.count {
            let element = ObjectRef::new(
                format!("{}[{index}]", self.object.name),
                view.start + index * view.element_size,
                view.element,
            );
            total = self.resolver.add_part(&self.object, total, self.resolver.instance_size(&element)?)?;
        }
        Ok(total)
    }
}
