//! Divisions and the people who belong to them.
//!
//! The workflow only reads the directory ([`Directory`]); administrative
//! writes live behind [`DirectoryAdmin`] so a read-only directory (an LDAP
//! mirror, say) can still back the engine.

use std::future::Future;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::status::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Division {
  pub id:   Uuid,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub id:          Uuid,
  pub name:        String,
  pub email:       String,
  pub role:        Role,
  #[serde(default)]
  pub division_id: Option<Uuid>,
}

/// Input for registering a person.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPerson {
  pub name:        String,
  pub email:       String,
  #[serde(default)]
  pub role:        Role,
  #[serde(default)]
  pub division_id: Option<Uuid>,
}

/// Partial update of a person; `None` fields are left as they are.
///
/// `division_id` distinguishes an absent field (`None`, keep) from an
/// explicit `null` (`Some(None)`, remove from any division).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonUpdate {
  #[serde(default)]
  pub name:        Option<String>,
  #[serde(default)]
  pub role:        Option<Role>,
  #[serde(
    default,
    deserialize_with = "present",
    skip_serializing_if = "Option::is_none"
  )]
  pub division_id: Option<Option<Uuid>>,
}

/// Wrap whatever is present, `null` included, so only a missing field stays
/// `None`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}

/// Read access to the organization directory.
pub trait Directory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All divisions, ordered by name.
  fn list_divisions(
    &self,
  ) -> impl Future<Output = Result<Vec<Division>, Self::Error>> + Send + '_;

  /// The people belonging to `division_id`. Empty if the division does not
  /// exist.
  fn list_people(
    &self,
    division_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  fn get_person(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;
}

/// Administrative writes to the directory.
pub trait DirectoryAdmin: Directory {
  fn add_division(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Division, Self::Error>> + Send + '_;

  /// Returns `None` if the division does not exist.
  fn rename_division(
    &self,
    id: Uuid,
    name: String,
  ) -> impl Future<Output = Result<Option<Division>, Self::Error>> + Send + '_;

  /// Members of a removed division are left without one. Returns `false` if
  /// the division did not exist.
  fn remove_division(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn add_person(
    &self,
    input: NewPerson,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Returns `None` if the person does not exist.
  fn update_person(
    &self,
    id: Uuid,
    update: PersonUpdate,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  fn list_all_people(
    &self,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn person_update_tells_missing_division_from_null() {
    let keep: PersonUpdate = serde_json::from_str(r#"{"name":"Sari"}"#).unwrap();
    assert_eq!(keep.division_id, None);

    let clear: PersonUpdate = serde_json::from_str(r#"{"division_id":null}"#).unwrap();
    assert_eq!(clear.division_id, Some(None));

    let id = Uuid::new_v4();
    let set: PersonUpdate =
      serde_json::from_value(serde_json::json!({ "division_id": id })).unwrap();
    assert_eq!(set.division_id, Some(Some(id)));

    assert_eq!(serde_json::to_value(&keep).unwrap().get("division_id"), None);
    assert!(serde_json::to_value(&clear).unwrap()["division_id"].is_null());
  }
}
