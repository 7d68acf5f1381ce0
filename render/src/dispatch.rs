//! Exact-type dispatch.
//!
//! A [`Dispatcher`] maps a concrete node type to the function that renders
//! it. Lookup uses the node's exact type only: registering a handler for
//! [`Extension`](fits_schema_core::Extension) does nothing for
//! [`TableExtension`](fits_schema_core::TableExtension). A handler that wants
//! another type's output calls [`Dispatcher::render`] on the relevant part of
//! its node and splices the result where it needs it.
//!
//! Handlers receive the dispatcher itself so they can recurse into children.
//! Children are dispatched when the parent handler runs, which means a missing
//! registration anywhere in the tree is reported before a single line is
//! produced. Text generation itself stays lazy.
//!
//! # Examples
//!
//! ```
//! use fits_schema_core::{DataType, Column};
//! use fits_schema_render::{Dispatcher, Lines, RenderError};
//!
//! fn column_name<'a>(
//!     _: &Dispatcher<()>,
//!     col: &'a Column,
//!     _: &'a (),
//! ) -> Result<Lines<'a>, RenderError> {
//!     use fits_schema_core::SchemaNode;
//!     Ok(Box::new(std::iter::once(col.name().to_string())))
//! }
//!
//! let mut names = Dispatcher::new("names");
//! names.register::<Column>(column_name);
//!
//! let col = Column::new("energy", "energy", DataType::Float32).unwrap();
//! let lines: Vec<String> = names.render(&col, &()).unwrap().collect();
//! assert_eq!(lines, vec!["energy"]);
//!
//! assert!(matches!(
//!     names.render(&42_u8, &()),
//!     Err(RenderError::NoRenderer { .. })
//! ));
//! ```

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::error::{RenderError, Result};

/// Lazily produced, ordered output lines.
pub type Lines<'a> = Box<dyn Iterator<Item = String> + 'a>;

/// Signature of a handler for nodes of type `T` with options `O`.
pub type RenderFn<T, O> = for<'a> fn(&Dispatcher<O>, &'a T, &'a O) -> Result<Lines<'a>>;

struct Registration {
    type_name: &'static str,
    handler: Box<dyn Any + Send + Sync>,
}

/// Registry of render functions keyed by exact node type.
pub struct Dispatcher<O> {
    name: &'static str,
    handlers: HashMap<TypeId, Registration>,
    _options: std::marker::PhantomData<fn(&O)>,
}

impl<O: 'static> Dispatcher<O> {
    /// Creates an empty dispatcher. `name` identifies the output format in
    /// errors and logs.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            handlers: HashMap::new(),
            _options: std::marker::PhantomData,
        }
    }

    /// Output format name given to [`Dispatcher::new`].
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Associates `handler` with nodes of exactly type `T`, replacing any
    /// previous registration for `T`.
    pub fn register<T: Any>(&mut self, handler: RenderFn<T, O>) -> &mut Self {
        self.handlers.insert(
            TypeId::of::<T>(),
            Registration {
                type_name: type_name::<T>(),
                handler: Box::new(handler),
            },
        );
        self
    }

    /// Builder form of [`Dispatcher::register`].
    pub fn with<T: Any>(mut self, handler: RenderFn<T, O>) -> Self {
        self.register(handler);
        self
    }

    /// Returns the handler registered for exactly `T`.
    pub fn handler<T: Any>(&self) -> Option<RenderFn<T, O>> {
        self.handlers
            .get(&TypeId::of::<T>())
            .and_then(|reg| reg.handler.downcast_ref::<RenderFn<T, O>>())
            .copied()
    }

    /// Returns `true` if a handler is registered for exactly `T`.
    pub fn is_registered<T: Any>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<T>())
    }

    /// Names of all registered types, sorted.
    pub fn registered_types(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.values().map(|r| r.type_name).collect();
        names.sort_unstable();
        names
    }

    /// Renders `node` with the handler registered for its exact type.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NoRenderer`] if no handler is registered for
    /// `T`, or whatever error the handler (or a child dispatch) raises.
    pub fn render<'a, T: Any>(&self, node: &'a T, options: &'a O) -> Result<Lines<'a>> {
        let Some(handler) = self.handler::<T>() else {
            return Err(RenderError::NoRenderer {
                renderer: self.name,
                type_name: type_name::<T>(),
            });
        };
        debug!(renderer = self.name, node_type = type_name::<T>(), "Dispatching node");
        handler(self, node, options)
    }
}

impl<O> fmt::Debug for Dispatcher<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.handlers.values().map(|r| r.type_name).collect();
        types.sort_unstable();
        f.debug_struct("Dispatcher")
            .field("name", &self.name)
            .field("types", &types)
            .finish()
    }
}

/// Wraps eagerly built lines so they are only materialized when consumed.
pub(crate) fn deferred<'a, F>(build: F) -> Lines<'a>
where
    F: FnOnce() -> Vec<String> + 'a,
{
    Box::new(std::iter::once_with(build).flatten())
}

/// Chains rendered parts in order.
pub(crate) fn concat(parts: Vec<Lines<'_>>) -> Lines<'_> {
    Box::new(parts.into_iter().flatten())
}
