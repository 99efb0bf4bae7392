//! # Session
//!
//! The command surface: what a user runs against an inspector.
//!
//! - [`Session::used_size`]: compute and return the used size of an object
//! - [`Session::log_size`]: compute and append a timestamped line to a file
//! - [`Session::store_size`]: compute and store into a variable or into the
//!   inspected process's memory
//! - [`Session::describe_fields`]: list the fields of an object's type
//!
//! Every command builds a fresh [`SizeResolver`], so nothing read from the
//! process outlives the command that read it.

use std::collections::HashMap;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::Local;
use tracing::{error, info};

use crate::config::ResolverConfig;
use crate::error::{SizeError, SizeResult};
use crate::inspector::Inspector;
use crate::resolver::SizeResolver;

/// Timestamp format of log lines, e.g. `2016-11-03 14:07:12.418862`.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// One field of a type, as reported by [`Session::describe_fields`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReport
{
    /// Field name; empty for base-class slots.
    pub name: String,
    /// Declared type of the field.
    pub type_name: String,
    /// Byte offset; `None` for static members.
    pub offset: Option<u64>,
    /// Static size of the field's type.
    pub byte_size: u64,
    /// Whether the field is a base-class slot.
    pub is_base_class: bool,
}

impl FieldReport
{
    /// Whether the field is a static member (no storage in the instance).
    pub fn is_static(&self) -> bool
    {
        self.offset.is_none()
    }
}

impl fmt::Display for FieldReport
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self.offset {
            Some(offset) => write!(f, "+{offset:<6}")?,
            None => write!(f, "static ")?,
        }
        if self.is_base_class {
            write!(f, "<base> {} ({} bytes)", self.type_name, self.byte_size)
        } else {
            write!(f, "{}: {} ({} bytes)", self.name, self.type_name, self.byte_size)
        }
    }
}

/// Commands against one inspector.
pub struct Session<I>
{
    inspector: I,
    config: ResolverConfig,
    variables: HashMap<String, u64>,
}

impl<I: Inspector> Session<I>
{
    /// Start a session with no convenience variables.
    pub fn new(inspector: I, config: ResolverConfig) -> Self
    {
        Self {
            inspector,
            config,
            variables: HashMap::new(),
        }
    }

    /// The inspector commands run against.
    pub fn inspector(&self) -> &I
    {
        &self.inspector
    }

    pub fn inspector_mut(&mut self) -> &mut I
    {
        &mut self.inspector
    }

    /// Configuration of every resolver this session creates.
    pub fn config(&self) -> &ResolverConfig
    {
        &self.config
    }

    /// Give the inspector back, dropping the session variables.
    pub fn into_inspector(self) -> I
    {
        self.inspector
    }

    fn resolver(&self) -> SizeResolver<'_>
    {
        SizeResolver::new(&self.inspector, self.config.clone())
    }

    /// Used size of the object `expression` denotes.
    ///
    /// ## Errors
    ///
    /// Anything [`SizeResolver::size_of`] returns.
    pub fn used_size(&self, expression: &str) -> SizeResult<u64>
    {
        self.resolver().size_of(expression)
    }

    /// Compute the used size of `expression` and append
    /// `"<timestamp> <expression>: <size>"` to the file at `path`.
    ///
    /// The size is computed before the file is touched, so a failed query
    /// leaves the file as it was.
    ///
    /// ## Errors
    ///
    /// - anything [`Session::used_size`] returns
    /// - `Io`: the file cannot be opened or written
    pub fn log_size(&self, expression: &str, path: impl AsRef<Path>) -> SizeResult<u64>
    {
        let path = path.as_ref();
        let result = self
            .used_size(expression)
            .and_then(|size| append_log_line(path, expression.trim(), size).map(|()| size));
        match &result {
            Ok(size) => info!(expression, size, path = %path.display(), "logged used size"),
            Err(err) => error!(expression, path = %path.display(), error = %err, "log command failed"),
        }
        result
    }

    /// Compute the used size of `expression` and store it into
    /// `destination`.
    ///
    /// A destination spelled `$name` is a session variable. Anything else is
    /// resolved as an object in the inspected process, and the size is
    /// written into it using the object's own width.
    ///
    /// ## Errors
    ///
    /// - anything [`Session::used_size`] returns
    /// - `InvalidExpression`: the destination is not a valid variable name,
    ///   or its type is not 1 to 8 bytes wide
    /// - `Unsupported`: the inspector cannot write memory
    pub fn store_size(&mut self, destination: &str, expression: &str) -> SizeResult<u64>
    {
        let result = self.compute_and_store(destination.trim(), expression);
        if let Err(err) = &result {
            error!(destination, expression, error = %err, "store command failed");
        }
        result
    }

    fn compute_and_store(&mut self, destination: &str, expression: &str) -> SizeResult<u64>
    {
        let object = self.inspector.resolve(expression)?;
        let size = self.resolver().instance_size(&object)?;
        let type_name = self.inspector.type_name(object.ty)?;
        info!(object = %object, type_name, size, "computed used size");

        if let Some(name) = destination.strip_prefix('$') {
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(SizeError::invalid_expression(destination, 1, "expected a variable name after '$'"));
            }
            self.variables.insert(name.to_string(), size);
            return Ok(size);
        }

        let target = self.inspector.resolve(destination)?;
        let width = self.inspector.byte_size(target.ty)?;
        if !(1..=8).contains(&width) {
            return Err(SizeError::invalid_expression(
                destination,
                0,
                format!("a {width}-byte object cannot hold an integer"),
            ));
        }
        self.inspector.write_unsigned(target.address, width, size)?;
        info!(destination = %target, width, size, "stored used size");
        Ok(size)
    }

    /// Value of a session variable, with or without its leading `$`.
    pub fn variable(&self, name: &str) -> Option<u64>
    {
        let name = name.strip_prefix('$').unwrap_or(name);
        self.variables.get(name).copied()
    }

    /// Every session variable.
    pub fn variables(&self) -> impl Iterator<Item = (&str, u64)>
    {
        self.variables.iter().map(|(name, value)| (name.as_str(), *value))
    }

    /// Fields of the type of the object `expression` denotes, in declaration
    /// order.
    pub fn describe_fields(&self, expression: &str) -> SizeResult<Vec<FieldReport>>
    {
        let object = self.inspector.resolve(expression)?;
        self.inspector
            .fields(object.ty)?
            .iter()
            .map(|field| {
                Ok(FieldReport {
                    name: field.name.clone(),
                    type_name: self.inspector.type_name(field.ty)?.to_string(),
                    offset: field.offset,
                    byte_size: self.inspector.byte_size(field.ty)?,
                    is_base_class: field.is_base_class,
                })
            })
            .collect()
    }
}

fn append_log_line(path: &Path, expression: &str, size: u64) -> SizeResult<()>
{
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let timestamp = Local::now().format(LOG_TIMESTAMP_FORMAT);
    writeln!(file, "{timestamp} {expression}: {size}")?;
    file.flush()?;
    Ok(())
}
