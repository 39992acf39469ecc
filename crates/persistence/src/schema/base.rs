//! Fields shared by every entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Entity, FieldKind, FieldType, SchemaBuilder};
use crate::types::FromValue;

/// Identity, ownership and audit fields carried by every entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BaseFields {
    /// Identifier; nil until the entity is first inserted.
    pub id: Uuid,
    /// Soft-delete marker.
    pub is_deleted: bool,
    /// The user that created the entity.
    pub creator_id: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub modified_at: DateTime<Utc>,
}

impl BaseFields {
    /// Creates base fields for a new entity owned by `creator_id`.
    pub fn new(creator_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::nil(),
            is_deleted: false,
            creator_id,
            created_at: now,
            modified_at: now,
        }
    }

    /// Sets the identifier.
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Sets the modification timestamp.
    pub fn with_modified_at(mut self, modified_at: DateTime<Utc>) -> Self {
        self.modified_at = modified_at;
        self
    }
}

impl Default for BaseFields {
    fn default() -> Self {
        Self::new(Uuid::nil())
    }
}

impl<E: Entity> SchemaBuilder<E> {
    /// Registers `Id`, `IsDeleted`, `CreatorId`, `CreatedAt` and `ModifiedAt`.
    ///
    /// `Id` and `CreatorId` are read-only; `ModifiedAt` becomes the default
    /// ordering key.
    pub fn base_fields(self) -> Self {
        self.read_only("Id", FieldType::required(FieldKind::Uuid), |e| {
            e.base().id.into()
        })
        .field(
            "IsDeleted",
            FieldType::required(FieldKind::Bool),
            |e| e.base().is_deleted.into(),
            |e, v| {
                e.base_mut().is_deleted = bool::from_value(v)?;
                Ok(())
            },
        )
        .read_only("CreatorId", FieldType::required(FieldKind::Uuid), |e| {
            e.base().creator_id.into()
        })
        .field(
            "CreatedAt",
            FieldType::required(FieldKind::DateTime),
            |e| e.base().created_at.into(),
            |e, v| {
                e.base_mut().created_at = FromValue::from_value(v)?;
                Ok(())
            },
        )
        .field(
            "ModifiedAt",
            FieldType::required(FieldKind::DateTime),
            |e| e.base().modified_at.into(),
            |e, v| {
                e.base_mut().modified_at = FromValue::from_value(v)?;
                Ok(())
            },
        )
        .modified_at("ModifiedAt")
    }
}
