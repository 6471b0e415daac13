//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::Utc;
use delegasi_core::{
  ActionInput, ErrorKind, Workflow, WorkflowConfig,
  attachment::{AttachmentStore, Upload},
  directory::{Directory, DirectoryAdmin, NewPerson, PersonUpdate},
  history::StatusChange,
  machine::{self, Actor, Command},
  request::{Attachment, Content, DelegationRequest, NewDelegation, Target},
  response::{NewResponse, Response},
  revision::RevisionPolicy,
  status::{Role, Status},
  store::{DelegationQuery, DelegationStore, Write},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

struct Seeded {
  division: Uuid,
  handler:  Uuid,
  other:    Uuid,
}

async fn seed(s: &SqliteStore) -> Seeded {
  let division = s.add_division("Humas".into()).await.unwrap();
  let handler = s
    .add_person(NewPerson {
      name:        "Sari".into(),
      email:       "sari@example.org".into(),
      role:        Role::Handler,
      division_id: Some(division.id),
    })
    .await
    .unwrap();
  let other = s
    .add_person(NewPerson {
      name:        "Budi".into(),
      email:       "budi@example.org".into(),
      role:        Role::Handler,
      division_id: Some(division.id),
    })
    .await
    .unwrap();
  Seeded {
    division: division.id,
    handler:  handler.id,
    other:    other.id,
  }
}

fn request_for(target: Target) -> DelegationRequest {
  DelegationRequest::new(Uuid::new_v4(), NewDelegation {
    target,
    content: Content {
      title:                 "Liputan seminar".into(),
      description:           "Dokumentasi".into(),
      description_image_url: Some("/files/poster.png".into()),
      files:                 vec![Attachment {
        original_name: "rundown.pdf".into(),
        url:           "/files/rundown.pdf".into(),
        mime_type:     "application/pdf".into(),
      }],
    },
    date: Utc::now(),
  })
}

fn verificator() -> Actor {
  Actor {
    id:   Uuid::new_v4(),
    role: Role::Verificator,
  }
}

// ─── Delegations ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_round_trips_every_field() {
  let s = store().await;
  let seeded = seed(&s).await;
  let req = request_for(Target {
    division_id: seeded.division,
    person_id:   seeded.handler,
  });
  s.insert_delegation(&req).await.unwrap();

  let fetched = s.get_delegation(req.id).await.unwrap().unwrap();
  assert_eq!(fetched, req);
}

#[tokio::test]
async fn get_delegation_missing_returns_none() {
  let s = store().await;
  assert!(s.get_delegation(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn update_applies_once_per_version_and_records_history() {
  let s = store().await;
  let seeded = seed(&s).await;
  let req = request_for(Target {
    division_id: seeded.division,
    person_id:   seeded.handler,
  });
  s.insert_delegation(&req).await.unwrap();

  let actor = verificator();
  let transition = machine::apply(
    &req,
    Command::Reject {
      reason: "Tanggal salah".into(),
    },
    &actor,
    RevisionPolicy::default(),
  )
  .unwrap();
  let change = StatusChange::record(&transition, &actor);
  let mut next = transition.request;
  next.version = 1;

  let first = s.update_delegation(&next, 0, Some(&change)).await.unwrap();
  assert_eq!(first, Write::Applied);
  let again = s.update_delegation(&next, 0, Some(&change)).await.unwrap();
  assert_eq!(again, Write::Stale);

  let stored = s.get_delegation(req.id).await.unwrap().unwrap();
  assert_eq!(stored.status, Status::VerificationRejected);
  assert_eq!(stored.rejection_reason(), Some("Tanggal salah"));
  assert_eq!(stored.version, 1);
  assert_eq!(s.history(req.id).await.unwrap(), vec![change]);
}

#[tokio::test]
async fn schema_rejects_reason_outside_rejected_status() {
  let s = store().await;
  let mut req = request_for(Target {
    division_id: Uuid::new_v4(),
    person_id:   Uuid::new_v4(),
  });
  req.rejection = Some(delegasi_core::request::Rejection {
    reason:           "stale".into(),
    content_revision: 0,
  });
  assert!(s.insert_delegation(&req).await.is_err());
}

#[tokio::test]
async fn response_insert_bumps_version() {
  let s = store().await;
  let seeded = seed(&s).await;
  let mut req = request_for(Target {
    division_id: seeded.division,
    person_id:   seeded.handler,
  });
  req.status = Status::HandlerAccepted;
  s.insert_delegation(&req).await.unwrap();

  let response = Response {
    id:            Uuid::new_v4(),
    delegation_id: req.id,
    author_id:     seeded.handler,
    text:          "Sudah".into(),
    image_url:     None,
    files:         vec![],
    created_at:    Utc::now(),
  };
  assert_eq!(s.insert_response(&response, 0).await.unwrap(), Write::Applied);
  assert_eq!(s.insert_response(&response, 0).await.unwrap(), Write::Stale);

  assert_eq!(s.get_delegation(req.id).await.unwrap().unwrap().version, 1);
  assert_eq!(s.list_responses(req.id).await.unwrap(), vec![response]);
}

#[tokio::test]
async fn list_filters_and_paginates() {
  let s = store().await;
  let seeded = seed(&s).await;
  for person_id in [seeded.handler, seeded.handler, seeded.other] {
    s.insert_delegation(&request_for(Target {
      division_id: seeded.division,
      person_id,
    }))
    .await
    .unwrap();
  }

  let mine = s
    .list_delegations(&DelegationQuery {
      person_id: Some(seeded.handler),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(mine.len(), 2);

  let page = s
    .list_delegations(&DelegationQuery {
      limit: Some(2),
      offset: Some(2),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(page.len(), 1);

  let approved = s
    .list_delegations(&DelegationQuery {
      status: Some(Status::Approved),
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(approved.is_empty());
}

#[tokio::test]
async fn legacy_pending_handler_rows_match_status_filter() {
  let s = store().await;
  let seeded = seed(&s).await;
  let req = request_for(Target {
    division_id: seeded.division,
    person_id:   seeded.handler,
  });
  s.insert_delegation(&req).await.unwrap();

  let actor = verificator();
  let transition =
    machine::apply(&req, Command::Accept, &actor, RevisionPolicy::default()).unwrap();
  let change = StatusChange::record(&transition, &actor);
  let mut next = transition.request;
  next.version = 1;
  s.update_delegation(&next, 0, Some(&change)).await.unwrap();

  // Rows as an older build wrote them.
  s.connection()
    .call(|conn| {
      conn.execute_batch(
        "UPDATE delegations SET status = 'Butuh Verifikasi Penerima';
         UPDATE status_changes SET to_status = 'Butuh Verifikasi Penerima';",
      )?;
      Ok(())
    })
    .await
    .unwrap();
  s.init_schema().await.unwrap();

  let pending = s
    .list_delegations(&DelegationQuery {
      status: Some(Status::PendingHandlerConfirmation),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(pending.len(), 1);
  assert_eq!(pending[0].id, req.id);
  assert_eq!(s.history(req.id).await.unwrap(), vec![change]);

  let legacy: i64 = s
    .connection()
    .call(|conn| {
      Ok(conn.query_row(
        "SELECT (SELECT COUNT(*) FROM delegations
                  WHERE status = 'Butuh Verifikasi Penerima')
              + (SELECT COUNT(*) FROM status_changes
                  WHERE to_status = 'Butuh Verifikasi Penerima')",
        [],
        |row| row.get(0),
      )?)
    })
    .await
    .unwrap();
  assert_eq!(legacy, 0);
}

// ─── Directory ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn people_follow_their_division() {
  let s = store().await;
  let seeded = seed(&s).await;
  let people = s.list_people(seeded.division).await.unwrap();
  assert_eq!(people.len(), 2);
  // Ordered by name.
  assert_eq!(people[0].name, "Budi");

  assert!(s.remove_division(seeded.division).await.unwrap());
  assert!(!s.remove_division(seeded.division).await.unwrap());
  let orphan = s.get_person(seeded.handler).await.unwrap().unwrap();
  assert_eq!(orphan.division_id, None);
}

#[tokio::test]
async fn update_person_changes_only_given_fields() {
  let s = store().await;
  let seeded = seed(&s).await;
  let updated = s
    .update_person(seeded.handler, PersonUpdate {
      role: Some(Role::Verificator),
      ..Default::default()
    })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.role, Role::Verificator);
  assert_eq!(updated.name, "Sari");
  assert_eq!(updated.division_id, Some(seeded.division));

  assert!(
    s.update_person(Uuid::new_v4(), PersonUpdate::default())
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn update_person_clears_division_only_when_asked() {
  let s = store().await;
  let seeded = seed(&s).await;
  let moved = s.add_division("Logistik".into()).await.unwrap();

  let updated = s
    .update_person(seeded.handler, PersonUpdate {
      division_id: Some(Some(moved.id)),
      ..Default::default()
    })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.division_id, Some(moved.id));

  let cleared = s
    .update_person(seeded.handler, PersonUpdate {
      division_id: Some(None),
      ..Default::default()
    })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(cleared.division_id, None);
  assert_eq!(cleared.role, Role::Handler);
  assert!(s.list_people(moved.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn rename_missing_division_returns_none() {
  let s = store().await;
  assert!(
    s.rename_division(Uuid::new_v4(), "Baru".into())
      .await
      .unwrap()
      .is_none()
  );
}

// ─── Through the workflow ────────────────────────────────────────────────────

#[derive(Default)]
struct AcceptAll;

impl AttachmentStore for AcceptAll {
  type Error = std::io::Error;

  async fn store(&self, upload: Upload) -> Result<Attachment, std::io::Error> {
    Ok(Attachment {
      url:           format!("/files/{}", upload.original_name),
      original_name: upload.original_name,
      mime_type:     upload.mime_type,
    })
  }

  async fn exists(&self, _url: &str) -> Result<bool, std::io::Error> { Ok(true) }
}

#[tokio::test]
async fn workflow_runs_on_sqlite() {
  let s = store().await;
  let seeded = seed(&s).await;
  let workflow = Workflow::new(s, AcceptAll, WorkflowConfig::default());
  let admin = workflow
    .bootstrap_admin("Admin".into(), "admin@example.org".into())
    .await
    .unwrap();
  let admin = Actor {
    id:   admin.id,
    role: admin.role,
  };
  let handler = workflow.resolve_actor(seeded.handler).await.unwrap();

  let req = workflow
    .create(&admin, NewDelegation {
      target:  Target {
        division_id: seeded.division,
        person_id:   seeded.handler,
      },
      content: Content {
        title:                 "Rapat".into(),
        description:           String::new(),
        description_image_url: None,
        files:                 vec![],
      },
      date:    Utc::now(),
    })
    .await
    .unwrap();
  let verificator = verificator();
  workflow
    .apply(req.id, &verificator, ActionInput::Accept)
    .await
    .unwrap();
  workflow
    .apply(req.id, &handler, ActionInput::Decline)
    .await
    .unwrap();
  let reassigned = workflow
    .apply(req.id, &admin, ActionInput::Reassign {
      division_id: seeded.division,
      person_id:   seeded.other,
    })
    .await
    .unwrap();
  assert_eq!(reassigned.target.person_id, seeded.other);
  assert_eq!(workflow.get_state(req.id).await.unwrap(), reassigned);

  let err = workflow
    .add_response(req.id, &handler, NewResponse {
      text: "masih saya".into(),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvalidTransition);

  assert_eq!(workflow.history(req.id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn duplicate_division_names_are_rejected() {
  let s = store().await;
  let workflow = Workflow::new(s, AcceptAll, WorkflowConfig::default());
  let admin = Actor {
    id:   Uuid::new_v4(),
    role: Role::Admin,
  };
  workflow.add_division(&admin, "Humas".into()).await.unwrap();
  let err = workflow
    .add_division(&admin, " humas ".into())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  let err = workflow
    .add_division(&verificator(), "Keuangan".into())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Unauthorized);
}
