//! Core types, the delegation workflow engine, and collaborator traits for
//! Delegasi.
//!
//! No HTTP or database code lives here. Storage backends implement
//! [`store::DelegationStore`] and [`directory::Directory`]; file storage
//! implements [`attachment::AttachmentStore`]. The pure state machine is in
//! [`machine`], and [`Workflow`] drives it against those collaborators.

// Collaborator traits spell out `impl Future + Send`; implementations use
// plain `async fn`.
#![allow(async_fn_in_trait)]

pub mod attachment;
pub mod directory;
pub mod error;
pub mod history;
pub mod machine;
pub mod policy;
pub mod reassignment;
pub mod request;
pub mod response;
pub mod revision;
pub mod status;
pub mod store;
pub mod workflow;

pub use error::{Error, ErrorKind, Result, TransitionError};
pub use machine::Actor;
pub use status::{Action, Role, Status};
pub use workflow::{ActionInput, Workflow, WorkflowConfig};
