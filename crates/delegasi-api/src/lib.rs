//! JSON REST API for the delegation workflow.
//!
//! Exposes an axum [`Router`] backed by a [`Workflow`]. The acting person is
//! named by the `x-actor-id` header and looked up in the directory; transport
//! authentication and TLS are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", delegasi_api::api_router(workflow.clone()))
//! ```

pub mod actor;
pub mod attachments;
pub mod delegations;
pub mod directory;
pub mod error;
pub mod responses;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use delegasi_core::{
  Workflow, attachment::AttachmentStore, directory::DirectoryAdmin,
  store::DelegationStore,
};

pub use actor::{ACTOR_HEADER, CurrentActor};
pub use error::ApiError;

/// Shared handler state.
pub type Engine<S, A> = Arc<Workflow<S, A>>;

/// Build a fully-materialised API router for `workflow`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, A>(workflow: Engine<S, A>) -> Router<()>
where
  S: DelegationStore + DirectoryAdmin + 'static,
  A: AttachmentStore + 'static,
{
  Router::new()
    // Delegations
    .route(
      "/delegations",
      get(delegations::list::<S, A>).post(delegations::create::<S, A>),
    )
    .route("/delegations/{id}", get(delegations::get_one::<S, A>))
    .route("/delegations/{id}/content", put(delegations::edit_content::<S, A>))
    .route(
      "/delegations/{id}/actions",
      get(delegations::available::<S, A>).post(delegations::apply::<S, A>),
    )
    .route("/delegations/{id}/history", get(delegations::history::<S, A>))
    // Responses
    .route(
      "/delegations/{id}/responses",
      get(responses::list::<S, A>).post(responses::create::<S, A>),
    )
    // Directory
    .route(
      "/divisions",
      get(directory::list_divisions::<S, A>).post(directory::create_division::<S, A>),
    )
    .route(
      "/divisions/{id}",
      put(directory::rename_division::<S, A>).delete(directory::delete_division::<S, A>),
    )
    .route("/divisions/{id}/people", get(directory::division_people::<S, A>))
    .route(
      "/people",
      get(directory::list_people::<S, A>).post(directory::register_person::<S, A>),
    )
    .route("/people/{id}", put(directory::update_person::<S, A>))
    // Attachments
    .route("/attachments", post(attachments::upload::<S, A>))
    .with_state(workflow)
}
