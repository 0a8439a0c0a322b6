//! Flattening of directory user objects into [`User`].
//!
//! Property documents reach us in two encodings: a plain JSON object
//! (`{"email": "a@b.com"}`) or a protobuf `Struct` rendering, either wrapped
//! (`{"fields": {"email": {"stringValue": "a@b.com"}}}`) or per-value
//! (`{"email": {"kind": {"stringValue": "a@b.com"}}}`).

use roster_core::{directory::DirectoryObject, user::User};
use serde_json::{Map, Value};

/// Build a [`User`] from a directory `user` object.
///
/// Unknown fields are ignored; a missing `email` or `picture` becomes `""`.
pub fn user_from_object(object: &DirectoryObject) -> User {
  let props = &object.properties;
  let name = if object.display_name.is_empty() {
    string_property(props, "name")
  } else {
    object.display_name.clone()
  };

  User {
    id: object.id.clone(),
    name,
    email: string_property(props, "email"),
    picture: string_property(props, "picture"),
  }
}

fn string_property(props: &Map<String, Value>, key: &str) -> String {
  let fields = match props.get("fields").and_then(Value::as_object) {
    Some(fields) if !props.contains_key(key) => fields,
    _ => props,
  };
  fields.get(key).and_then(decode_string).unwrap_or_default()
}

fn decode_string(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Object(o) => o
      .get("stringValue")
      .or_else(|| o.get("kind").and_then(|k| k.get("stringValue")))
      .and_then(Value::as_str)
      .map(str::to_owned),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use roster_core::directory::USER_TYPE;
  use serde_json::json;

  use super::*;

  fn object(props: Value) -> DirectoryObject {
    let Value::Object(properties) = props else {
      panic!("properties must be an object")
    };
    DirectoryObject {
      object_type: USER_TYPE.into(),
      id: "u1".into(),
      display_name: "Alice".into(),
      properties,
    }
  }

  #[test]
  fn plain_properties() {
    let user = user_from_object(&object(json!({
      "email": "a@b.com", "picture": "p.png", "roles": ["admin"]
    })));
    assert_eq!(
      user,
      User {
        id:      "u1".into(),
        name:    "Alice".into(),
        email:   "a@b.com".into(),
        picture: "p.png".into(),
      }
    );
  }

  #[test]
  fn missing_fields_default_to_empty() {
    let user = user_from_object(&object(json!({})));
    assert_eq!(user.email, "");
    assert_eq!(user.picture, "");
  }

  #[test]
  fn non_string_values_are_ignored() {
    let user = user_from_object(&object(json!({ "email": 42, "picture": null })));
    assert_eq!(user.email, "");
    assert_eq!(user.picture, "");
  }

  #[test]
  fn struct_encoded_fields() {
    let user = user_from_object(&object(json!({
      "fields": {
        "email":   { "stringValue": "a@b.com" },
        "picture": { "kind": { "stringValue": "p.png" } }
      }
    })));
    assert_eq!(user.email, "a@b.com");
    assert_eq!(user.picture, "p.png");
  }

  #[test]
  fn per_value_struct_encoding() {
    let user = user_from_object(&object(json!({
      "email": { "kind": { "stringValue": "a@b.com" } }
    })));
    assert_eq!(user.email, "a@b.com");
  }

  #[test]
  fn display_name_falls_back_to_name_property() {
    let mut obj = object(json!({ "name": "Alice A." }));
    obj.display_name.clear();
    assert_eq!(user_from_object(&obj).name, "Alice A.");
  }
}
