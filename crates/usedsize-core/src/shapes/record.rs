//! Domain records.
//!
//! Most records are sized by reflection: every instance field (base-class
//! slots included) is sized through the resolver and summed. A few records
//! carry state the debug information does not describe as fields, so they are
//! sized from a fixed recipe instead.

use tracing::debug;

use crate::error::SizeResult;
use crate::resolver::{ShapeHandler, SizeResolver};
use crate::types::ObjectRef;

/// Bytes charged for a counter (`int` in the recorded layouts).
pub const COUNTER_SIZE: u64 = 8;
/// Bytes charged for a 64-bit timestamp or amount.
pub const INT64_SIZE: u64 = 8;
/// Bytes charged for a flag.
pub const FLAG_SIZE: u64 = 1;

/// One term of a record recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipePart
{
    /// The whole object, viewed as another type (usually a base).
    Whole
    {
        /// Type the object is viewed as.
        as_type: &'static str,
    },
    /// A data member, optionally viewed as another type.
    Member
    {
        /// Member name, found with [`crate::Inspector::find_member`].
        name: &'static str,
        /// Type to view the member as; its declared type when `None`.
        as_type: Option<&'static str>,
    },
    /// Fixed byte count.
    Literal(u64),
}

/// Hand-written size recipe for one record type.
#[derive(Debug, PartialEq, Eq)]
pub struct RecordRecipe
{
    /// Exact canonical name the recipe applies to.
    pub type_name: &'static str,
    /// Terms summed to produce the size.
    pub parts: &'static [RecipePart],
}

const fn member(name: &'static str) -> RecipePart
{
    RecipePart::Member { name, as_type: None }
}

const fn member_as(name: &'static str, as_type: &'static str) -> RecipePart
{
    RecipePart::Member {
        name,
        as_type: Some(as_type),
    }
}

/// Records with recipes.
pub static RECORD_RECIPES: &[RecordRecipe] = &[
    RecordRecipe {
        type_name: "CMasternode",
        parts: &[
            RecipePart::Whole {
                as_type: "masternode_info_t",
            },
            member_as("lastPing", "CMasternodePing"),
            member("vchSig"),
            RecipePart::Literal(4 * COUNTER_SIZE + 2 * FLAG_SIZE),
            member("mapGovernanceObjectsVotedOn"),
        ],
    },
    RecordRecipe {
        type_name: "CMasternodeVerification",
        parts: &[
            member_as("vin1", "CTxIn"),
            member_as("vin2", "CTxIn"),
            member_as("addr", "CService"),
            RecipePart::Literal(2 * COUNTER_SIZE),
            member("vchSig1"),
            member("vchSig2"),
        ],
    },
    RecordRecipe {
        type_name: "CMasternodeBroadcast",
        parts: &[RecipePart::Whole { as_type: "CMasternode" }, RecipePart::Literal(FLAG_SIZE)],
    },
    RecordRecipe {
        type_name: "CDarksendQueue",
        parts: &[
            RecipePart::Literal(COUNTER_SIZE),
            member_as("vin", "CTxIn"),
            RecipePart::Literal(INT64_SIZE + FLAG_SIZE),
            member("vchSig"),
            RecipePart::Literal(FLAG_SIZE),
        ],
    },
    RecordRecipe {
        type_name: "CDarkSendEntry",
        parts: &[
            member("vecTxDSIn"),
            member("vecTxDSOut"),
            member_as("txCollateral", "CTransaction"),
            member_as("addr", "CService"),
        ],
    },
];

/// Records sized by reflection out of the box.
pub const REFLECTED_RECORDS: &[&str] = &["CMasternodeIndex", "CMasternodePing", "CMasternodeMan"];

/// Recipe for a canonical type name, if there is one.
pub fn recipe_for(name: &str) -> Option<&'static RecordRecipe>
{
    RECORD_RECIPES.iter().find(|recipe| recipe.type_name == name)
}

/// Sizes a record by summing its instance fields.
pub struct RecordHandler<'r, 'i>
{
    resolver: &'r SizeResolver<'i>,
    object: ObjectRef,
}

impl<'r, 'i> RecordHandler<'r, 'i>
{
    /// Bind a handler to `object`.
    pub fn new(resolver: &'r SizeResolver<'i>, object: ObjectRef) -> Self
    {
        Self { resolver, object }
    }
}

impl ShapeHandler for RecordHandler<'_, '_>
{
    fn used_size(&self) -> SizeResult<u64>
    {
        let inspector = self.resolver.inspector();
        let mut total = 0;

        for field in inspector.fields(self.object.ty)? {
            // Static members and fields without a location take no room in
            // the instance.
            let Some(offset) = field.offset else {
                continue;
            };
            let part = if field.is_base_class {
                self.object.child("", offset, field.ty)
            } else {
                self.object.child(&format!(".{}", field.name), offset, field.ty)
            };
            total = self.resolver.add_part(&self.object, total, self.resolver.instance_size(&part)?)?;
        }

        debug!(object = %self.object.name, size = total, "sized record by reflection");
        Ok(total)
    }
}

/// Sizes a record from its [`RecordRecipe`].
pub struct RecipeHandler<'r, 'i>
{
    resolver: &'r SizeResolver<'i>,
    object: ObjectRef,
    recipe: &'static RecordRecipe,
}

impl<'r, 'i> RecipeHandler<'r, 'i>
{
    /// Bind a handler to `object`.
    pub fn new(resolver: &'r SizeResolver<'i>, object: ObjectRef, recipe: &'static RecordRecipe) -> Self
    {
        Self {
            resolver,
            object,
            recipe,
        }
    }

    fn part_size(&self, part: RecipePart) -> SizeResult<u64>
    {
        let inspector = self.resolver.inspector();
        match part {
            RecipePart::Literal(bytes) => Ok(bytes),
            RecipePart::Whole { as_type } => {
                let view = self.object.viewed_as(inspector.lookup_type(as_type)?);
                self.resolver.instance_size(&view)
            }
            RecipePart::Member { name, as_type } => {
                let mut member = inspector.member(&self.object, name)?;
                if let Some(as_type) = as_type {
                    member = member.viewed_as(inspector.lookup_type(as_type)?);
                }
                self.resolver.instance_size(&member)
            }
        }
    }
}

impl ShapeHandler for RecipeHandler<'_, '_>
{
    fn used_size(&self) -> SizeResult<u64>
    {
        let mut total = 0;
        for part in self.recipe.parts {
            total = self.resolver.add_part(&self.object, total, self.part_size(*part)?)?;
        }
        debug!(object = %self.object.name, recipe = self.recipe.type_name, size = total, "sized record from recipe");
        Ok(total)
    }
}
