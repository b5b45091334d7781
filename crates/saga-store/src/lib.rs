//! # saga-store
//!
//! The data access gateway: every tool operation reaches the remote store
//! through the [`StoreGateway`] trait.
//!
//! The store offers two kinds of access:
//!
//! - **Statement execution**: arbitrary statement text submitted to an RPC
//!   endpoint. Used only for statements that passed the `saga-sql` guard or
//!   that are composed internally with escaped literals.
//! - **Row verbs**: structured insert, partial update and select, with values
//!   carried as JSON and filters as URL parameters. Used wherever an
//!   operation's shape is fixed.
//!
//! Two implementations exist: [`RestStore`] talks to a Supabase/PostgREST
//! deployment over HTTP, [`MemoryStore`] keeps tables in process for local
//! runs and tests.

pub mod error;
pub mod gateway;
pub mod memory;
pub mod rest;
pub mod rowset;

pub use error::StoreError;
pub use gateway::{Filter, StoreGateway};
pub use memory::{MemoryStore, Mutation, Verb};
pub use rest::RestStore;
pub use rowset::{Row, RowSet};
