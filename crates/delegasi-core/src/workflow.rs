//! The workflow service: the per-delegation operations callers use.
//!
//! [`Workflow`] loads a delegation, runs the pure checks in
//! [`machine`], consults the directory and attachment store where a
//! payload needs it, and persists the result with a version-conditional
//! write. Nothing is written unless every check passed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  attachment::{AttachmentStore, Upload},
  directory::{Directory, DirectoryAdmin, Division, NewPerson, Person, PersonUpdate},
  error::{Error, Result, TransitionError},
  history::StatusChange,
  machine::{self, Actor, Command, Transition},
  policy::{self, Operation},
  reassignment,
  request::{Attachment, DelegationRequest, NewDelegation, Target},
  response::{NewResponse, Response},
  revision::{self, ContentEdit, RevisionPolicy},
  status::{Action, Role, Status},
  store::{DelegationQuery, DelegationStore, Write},
};

/// Engine settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowConfig {
  pub revision: RevisionPolicy,
}

/// An action as submitted by a client, before directory lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionInput {
  Accept,
  Reject {
    #[serde(default)]
    reason: String,
  },
  Fix,
  Confirm,
  Decline,
  Reassign {
    division_id: Uuid,
    person_id:   Uuid,
  },
  FinalApprove {
    #[serde(default)]
    note: Option<String>,
  },
  FinalReject {
    #[serde(default)]
    note: Option<String>,
  },
}

impl ActionInput {
  pub fn action(&self) -> Action {
    match self {
      ActionInput::Accept => Action::Accept,
      ActionInput::Reject { .. } => Action::Reject,
      ActionInput::Fix => Action::Fix,
      ActionInput::Confirm => Action::Confirm,
      ActionInput::Decline => Action::Decline,
      ActionInput::Reassign { .. } => Action::Reassign,
      ActionInput::FinalApprove { .. } => Action::FinalApprove,
      ActionInput::FinalReject { .. } => Action::FinalReject,
    }
  }
}

pub struct Workflow<S, A> {
  store:       S,
  attachments: A,
  config:      WorkflowConfig,
}

impl<S, A> Workflow<S, A>
where
  S: DelegationStore + Directory,
  A: AttachmentStore,
{
  pub fn new(store: S, attachments: A, config: WorkflowConfig) -> Self {
    Self {
      store,
      attachments,
      config,
    }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn config(&self) -> WorkflowConfig { self.config }

  /// Look up the acting person; the role comes from the directory record.
  pub async fn resolve_actor(&self, person_id: Uuid) -> Result<Actor> {
    let person = self
      .store
      .get_person(person_id)
      .await
      .map_err(Error::upstream)?
      .ok_or(Error::PersonNotFound(person_id))?;
    Ok(Actor {
      id:   person.id,
      role: person.role,
    })
  }

  // ── Delegations ────────────────────────────────────────────────────────

  /// File a new delegation in `PendingVerification`.
  pub async fn create(
    &self,
    actor: &Actor,
    input: NewDelegation,
  ) -> Result<DelegationRequest> {
    policy::authorize(actor.role, Operation::Create)?;
    if input.content.title.trim().is_empty() {
      return Err(TransitionError::validation("title must not be empty").into());
    }

    let target = reassignment::resolve_target(&self.store, input.target).await?;
    let urls = owned_urls(input.content.urls());
    self.ensure_stored(&urls).await?;

    let request = DelegationRequest::new(actor.id, NewDelegation {
      target: target.target(),
      ..input
    });
    self
      .store
      .insert_delegation(&request)
      .await
      .map_err(Error::store)?;

    tracing::info!(delegation = %request.id, creator = %actor.id, "delegation created");
    Ok(request)
  }

  pub async fn get_state(&self, id: Uuid) -> Result<DelegationRequest> {
    self
      .store
      .get_delegation(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::DelegationNotFound(id))
  }

  pub async fn list(&self, query: &DelegationQuery) -> Result<Vec<DelegationRequest>> {
    self.store.list_delegations(query).await.map_err(Error::store)
  }

  pub async fn history(&self, id: Uuid) -> Result<Vec<StatusChange>> {
    self.get_state(id).await?;
    self.store.history(id).await.map_err(Error::store)
  }

  /// The actions `actor` may currently take on delegation `id`.
  pub async fn available_actions(&self, id: Uuid, actor: &Actor) -> Result<Vec<Action>> {
    Ok(self.status_and_actions(id, actor).await?.1)
  }

  /// Current status of delegation `id` together with the actions `actor` may
  /// take in it, both taken from the same read.
  pub async fn status_and_actions(
    &self,
    id: Uuid,
    actor: &Actor,
  ) -> Result<(Status, Vec<Action>)> {
    let request = self.get_state(id).await?;
    let actions = machine::available_actions(&request, actor);
    Ok((request.status, actions))
  }

  /// Apply one workflow action to delegation `id`.
  pub async fn apply(
    &self,
    id: Uuid,
    actor: &Actor,
    input: ActionInput,
  ) -> Result<DelegationRequest> {
    let current = self.get_state(id).await?;
    // Role and status first, so a reassignment by the wrong role or in the
    // wrong state never reaches the directory.
    machine::check(&current, input.action(), actor)?;

    let command = match input {
      ActionInput::Accept => Command::Accept,
      ActionInput::Reject { reason } => Command::Reject { reason },
      ActionInput::Fix => Command::Fix,
      ActionInput::Confirm => Command::Confirm,
      ActionInput::Decline => Command::Decline,
      ActionInput::Reassign {
        division_id,
        person_id,
      } => {
        let target = reassignment::resolve_target(&self.store, Target {
          division_id,
          person_id,
        })
        .await?;
        Command::Reassign { target }
      }
      ActionInput::FinalApprove { note } => Command::FinalApprove { note },
      ActionInput::FinalReject { note } => Command::FinalReject { note },
    };

    let transition = machine::apply(&current, command, actor, self.config.revision)?;
    let change = StatusChange::record(&transition, actor);
    let Transition {
      request: mut next,
      from,
      to,
      effects,
      ..
    } = transition;
    next.version = current.version + 1;

    self.commit(&next, current.version, Some(&change)).await?;

    tracing::info!(
      delegation = %id,
      actor = %actor.id,
      %from,
      %to,
      "transition applied"
    );
    for effect in &effects {
      tracing::info!(delegation = %id, ?effect, "workflow effect requested");
    }
    Ok(next)
  }

  /// Edit the content of a delegation that is pending or rejected.
  pub async fn edit_content(
    &self,
    id: Uuid,
    actor: &Actor,
    edit: ContentEdit,
  ) -> Result<DelegationRequest> {
    let current = self.get_state(id).await?;
    let urls = owned_urls(edit.urls());

    let mut next = revision::edit_content(&current, actor, edit)?;
    self.ensure_stored(&urls).await?;
    next.version = current.version + 1;

    self.commit(&next, current.version, None).await?;
    tracing::info!(
      delegation = %id,
      revision = next.content_revision,
      "content edited"
    );
    Ok(next)
  }

  // ── Responses ──────────────────────────────────────────────────────────

  pub async fn list_responses(&self, id: Uuid) -> Result<Vec<Response>> {
    self.get_state(id).await?;
    self.store.list_responses(id).await.map_err(Error::store)
  }

  pub async fn add_response(
    &self,
    id: Uuid,
    actor: &Actor,
    input: NewResponse,
  ) -> Result<Response> {
    let current = self.get_state(id).await?;
    let urls = owned_urls(input.urls());

    let response = Response::compose(&current, actor, input)?;
    self.ensure_stored(&urls).await?;

    match self
      .store
      .insert_response(&response, current.version)
      .await
      .map_err(Error::store)?
    {
      Write::Applied => {}
      Write::Stale => return Err(Error::Conflict(id)),
    }

    tracing::info!(delegation = %id, response = %response.id, "response added");
    Ok(response)
  }

  // ── Attachments ────────────────────────────────────────────────────────

  /// First phase of a write that references a file: store the bytes and
  /// hand back the attachment to put in the payload.
  pub async fn upload(&self, upload: Upload) -> Result<Attachment> {
    if upload.original_name.trim().is_empty() {
      return Err(TransitionError::validation("file name must not be empty").into());
    }
    if upload.bytes.is_empty() {
      return Err(TransitionError::validation("file is empty").into());
    }
    let attachment = self
      .attachments
      .store(upload)
      .await
      .map_err(Error::upstream)?;
    tracing::debug!(url = %attachment.url, "attachment stored");
    Ok(attachment)
  }

  // ── Directory reads ────────────────────────────────────────────────────

  pub async fn list_divisions(&self) -> Result<Vec<Division>> {
    self.store.list_divisions().await.map_err(Error::upstream)
  }

  pub async fn list_people(&self, division_id: Uuid) -> Result<Vec<Person>> {
    let divisions = self.list_divisions().await?;
    if !divisions.iter().any(|d| d.id == division_id) {
      return Err(Error::DivisionNotFound(division_id));
    }
    self
      .store
      .list_people(division_id)
      .await
      .map_err(Error::upstream)
  }

  // ── Helpers ────────────────────────────────────────────────────────────

  async fn ensure_stored(&self, urls: &[String]) -> Result<()> {
    for url in urls {
      let exists = self
        .attachments
        .exists(url)
        .await
        .map_err(Error::upstream)?;
      if !exists {
        return Err(
          TransitionError::validation(format!(
            "attachment {url} has not been uploaded"
          ))
          .into(),
        );
      }
    }
    Ok(())
  }

  async fn commit(
    &self,
    request: &DelegationRequest,
    expected_version: u64,
    change: Option<&StatusChange>,
  ) -> Result<()> {
    match self
      .store
      .update_delegation(request, expected_version, change)
      .await
      .map_err(Error::store)?
    {
      Write::Applied => Ok(()),
      Write::Stale => {
        tracing::warn!(delegation = %request.id, expected_version, "stale write rejected");
        Err(Error::Conflict(request.id))
      }
    }
  }
}

impl<S, A> Workflow<S, A>
where
  S: DelegationStore + DirectoryAdmin,
  A: AttachmentStore,
{
  pub async fn list_all_people(&self) -> Result<Vec<Person>> {
    self.store.list_all_people().await.map_err(Error::upstream)
  }

  pub async fn add_division(&self, actor: &Actor, name: String) -> Result<Division> {
    policy::authorize(actor.role, Operation::ManageDirectory)?;
    let name = self.unique_division_name(&name, None).await?;
    let division = self.store.add_division(name).await.map_err(Error::upstream)?;
    tracing::info!(division = %division.id, name = %division.name, "division added");
    Ok(division)
  }

  pub async fn rename_division(
    &self,
    actor: &Actor,
    id: Uuid,
    name: String,
  ) -> Result<Division> {
    policy::authorize(actor.role, Operation::ManageDirectory)?;
    let name = self.unique_division_name(&name, Some(id)).await?;
    self
      .store
      .rename_division(id, name)
      .await
      .map_err(Error::upstream)?
      .ok_or(Error::DivisionNotFound(id))
  }

  pub async fn remove_division(&self, actor: &Actor, id: Uuid) -> Result<()> {
    policy::authorize(actor.role, Operation::ManageDirectory)?;
    if self.store.remove_division(id).await.map_err(Error::upstream)? {
      tracing::info!(division = %id, "division removed");
      Ok(())
    } else {
      Err(Error::DivisionNotFound(id))
    }
  }

  pub async fn register_person(&self, actor: &Actor, input: NewPerson) -> Result<Person> {
    policy::authorize(actor.role, Operation::ManageDirectory)?;
    self.add_person_unchecked(input).await
  }

  pub async fn update_person(
    &self,
    actor: &Actor,
    id: Uuid,
    update: PersonUpdate,
  ) -> Result<Person> {
    policy::authorize(actor.role, Operation::ManageDirectory)?;
    if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
      return Err(TransitionError::validation("name must not be empty").into());
    }
    if let Some(Some(division_id)) = update.division_id {
      self.ensure_division(division_id).await?;
    }
    self
      .store
      .update_person(id, update)
      .await
      .map_err(Error::upstream)?
      .ok_or(Error::PersonNotFound(id))
  }

  /// Register the first administrator. Only for operator tooling; there is
  /// no actor to authorize.
  pub async fn bootstrap_admin(&self, name: String, email: String) -> Result<Person> {
    self
      .add_person_unchecked(NewPerson {
        name,
        email,
        role: Role::Admin,
        division_id: None,
      })
      .await
  }

  async fn add_person_unchecked(&self, input: NewPerson) -> Result<Person> {
    if input.name.trim().is_empty() {
      return Err(TransitionError::validation("name must not be empty").into());
    }
    if !input.email.contains('@') {
      return Err(
        TransitionError::validation(format!("{:?} is not an email address", input.email))
          .into(),
      );
    }
    if let Some(division_id) = input.division_id {
      self.ensure_division(division_id).await?;
    }
    let taken = self
      .list_all_people()
      .await?
      .iter()
      .any(|p| p.email.eq_ignore_ascii_case(&input.email));
    if taken {
      return Err(
        TransitionError::validation(format!("{} is already registered", input.email))
          .into(),
      );
    }

    let person = self.store.add_person(input).await.map_err(Error::upstream)?;
    tracing::info!(person = %person.id, role = %person.role, "person registered");
    Ok(person)
  }

  async fn ensure_division(&self, id: Uuid) -> Result<()> {
    if self.list_divisions().await?.iter().any(|d| d.id == id) {
      Ok(())
    } else {
      Err(Error::DivisionNotFound(id))
    }
  }

  /// Trimmed `name`, provided no other division already uses it.
  async fn unique_division_name(&self, name: &str, except: Option<Uuid>) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
      return Err(TransitionError::validation("division name must not be empty").into());
    }
    let clash = self
      .list_divisions()
      .await?
      .iter()
      .any(|d| Some(d.id) != except && d.name.eq_ignore_ascii_case(name));
    if clash {
      return Err(
        TransitionError::validation(format!("division {name:?} already exists")).into(),
      );
    }
    Ok(name.to_owned())
  }
}

fn owned_urls<'a>(urls: impl Iterator<Item = &'a str>) -> Vec<String> {
  urls.map(str::to_owned).collect()
}
