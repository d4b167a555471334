use serde::{Deserialize, Serialize};

/// Record-store assigned id. Never reused after deletion.
pub type CharacterId = i64;

/// A character record.
///
/// `image_ref` is the public URL of the character's image, or empty when
/// there is none. It only ever holds a locator the blob store actually
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub age: i32,
    #[serde(default)]
    pub image_ref: String,
}

impl Character {
    pub fn has_image(&self) -> bool {
        !self.image_ref.is_empty()
    }
}

/// Attributes for an insert; the record store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCharacter {
    pub name: String,
    pub age: i32,
    pub image_ref: String,
}

/// Partial update. `None` leaves the stored column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterPatch {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub image_ref: Option<String>,
}

impl CharacterPatch {
    /// Apply onto an existing record, keeping its id.
    pub fn apply_to(&self, existing: &Character) -> Character {
        Character {
            id: existing.id,
            name: self.name.clone().unwrap_or_else(|| existing.name.clone()),
            age: self.age.unwrap_or(existing.age),
            image_ref: self
                .image_ref
                .clone()
                .unwrap_or_else(|| existing.image_ref.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_camel_case_image_ref() {
        let c = Character {
            id: 1,
            name: "Haru".into(),
            age: 55,
            image_ref: "https://cdn/upload/character/abc123.png".into(),
        };
        assert_eq!(
            serde_json::to_value(&c).unwrap(),
            json!({
                "id": 1,
                "name": "Haru",
                "age": 55,
                "imageRef": "https://cdn/upload/character/abc123.png"
            })
        );
    }

    #[test]
    fn patch_keeps_unset_fields() {
        let existing = Character {
            id: 3,
            name: "Haru".into(),
            age: 55,
            image_ref: "https://cdn/upload/character/a.png".into(),
        };
        let patched = CharacterPatch {
            age: Some(30),
            ..Default::default()
        }
        .apply_to(&existing);

        assert_eq!(patched.id, 3);
        assert_eq!(patched.name, "Haru");
        assert_eq!(patched.age, 30);
        assert_eq!(patched.image_ref, existing.image_ref);
    }
}
