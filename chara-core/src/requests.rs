//! Typed inbound requests.
//!
//! Transports hand over whatever loosely-typed fields they received; the
//! `decode` constructors turn them into a fully valid request or a
//! `BadRequest` before the lifecycle runs.

use chara_blob::ImagePut;
use serde_json::json;

use crate::entity::CharacterId;
use crate::errors::{CharaError, CharaResult};

#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub name: String,
    pub age: i32,
    pub image: Option<ImagePut>,
}

impl CreateRequest {
    pub fn new<S: Into<String>>(name: S, age: i32) -> Self {
        Self {
            name: name.into(),
            age,
            image: None,
        }
    }

    pub fn with_image(mut self, image: ImagePut) -> Self {
        self.image = Some(image);
        self
    }

    /// Both `name` and `age` are required; an empty image counts as none.
    pub fn decode(
        name: Option<&str>,
        age: Option<&str>,
        image: Option<ImagePut>,
    ) -> CharaResult<Self> {
        let name = present(name);
        let age = present(age);

        let (name, age) = match (name, age) {
            (Some(name), Some(age)) => (name, age),
            (name, age) => {
                let mut missing = serde_json::Map::new();
                if name.is_none() {
                    missing.insert("name".into(), json!(["required"]));
                }
                if age.is_none() {
                    missing.insert("age".into(), json!(["required"]));
                }
                return Err(CharaError::bad_request("Missing data")
                    .with_errors(serde_json::Value::Object(missing)));
            }
        };

        Ok(Self {
            name: name.to_string(),
            age: parse_age(age)?,
            image: image.filter(|i| !i.is_empty()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub id: CharacterId,
    pub name: Option<String>,
    pub age: Option<i32>,
    pub image: Option<ImagePut>,
}

impl UpdateRequest {
    pub fn new(id: CharacterId) -> Self {
        Self {
            id,
            name: None,
            age: None,
            image: None,
        }
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_age(mut self, age: i32) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_image(mut self, image: ImagePut) -> Self {
        self.image = Some(image);
        self
    }

    /// `id` is required; blank `name`/`age` and empty images mean "keep".
    pub fn decode(
        id: Option<&str>,
        name: Option<&str>,
        age: Option<&str>,
        image: Option<ImagePut>,
    ) -> CharaResult<Self> {
        let id = present(id).ok_or_else(|| {
            CharaError::bad_request("Missing id").with_errors(json!({"id": ["required"]}))
        })?;

        Ok(Self {
            id: parse_id(id)?,
            name: present(name).map(str::to_string),
            age: present(age).map(parse_age).transpose()?,
            image: image.filter(|i| !i.is_empty()),
        })
    }
}

pub fn parse_id(raw: &str) -> CharaResult<CharacterId> {
    raw.trim().parse::<CharacterId>().map_err(|_| {
        CharaError::bad_request(format!("Invalid id: {raw}"))
            .with_errors(json!({"id": ["must be an integer"]}))
    })
}

pub fn parse_age(raw: &str) -> CharaResult<i32> {
    raw.trim().parse::<i32>().map_err(|_| {
        CharaError::bad_request(format!("Invalid age: {raw}"))
            .with_errors(json!({"age": ["must be an integer"]}))
    })
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn create_requires_name_and_age() {
        let err = CreateRequest::decode(Some("  "), None, None).unwrap_err();
        assert!(err.is(ErrorKind::BadRequest));
        assert_eq!(
            err.errors.unwrap(),
            json!({"name": ["required"], "age": ["required"]})
        );
    }

    #[test]
    fn create_rejects_non_numeric_age() {
        let err = CreateRequest::decode(Some("Haru"), Some("old"), None).unwrap_err();
        assert!(err.is(ErrorKind::BadRequest));
    }

    #[test]
    fn create_drops_empty_image() {
        let req =
            CreateRequest::decode(Some(" Haru "), Some("55"), Some(ImagePut::new(Vec::new())))
                .unwrap();
        assert_eq!(req.name, "Haru");
        assert_eq!(req.age, 55);
        assert!(req.image.is_none());
    }

    #[test]
    fn update_blank_fields_mean_keep() {
        let req = UpdateRequest::decode(Some("1"), Some(""), Some("30"), None).unwrap();
        assert_eq!(req.id, 1);
        assert_eq!(req.name, None);
        assert_eq!(req.age, Some(30));
    }

    #[test]
    fn update_requires_integer_id() {
        assert!(UpdateRequest::decode(None, None, None, None)
            .unwrap_err()
            .is(ErrorKind::BadRequest));
        assert!(UpdateRequest::decode(Some("abc"), None, None, None)
            .unwrap_err()
            .is(ErrorKind::BadRequest));
    }
}
