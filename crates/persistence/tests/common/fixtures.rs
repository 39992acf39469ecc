//! Test fixtures for repository and compiler tests.
//!
//! [`Person`] exercises every field kind the compiler handles: text, integer,
//! nullable text, enumerations, binary payloads and a JSON settings document,
//! plus one navigation and one unique constraint.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use sieve_persistence::schema::{
    BaseFields, EnumDescriptor, Entity, EntitySchema, FieldKind, FieldType,
};
use sieve_persistence::types::{EnumValue, FromValue, Value, ValueTypeError};

/// Name of the unique constraint on `Email`.
pub const EMAIL_CONSTRAINT: &str = "ux_person_email";

/// Members of [`PersonStatus`].
pub static PERSON_STATUS: EnumDescriptor = EnumDescriptor {
    name: "PersonStatus",
    variants: &[("Active", 0), ("Suspended", 1), ("Archived", 2)],
};

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersonStatus {
    /// Active account.
    #[default]
    Active,
    /// Temporarily disabled.
    Suspended,
    /// Closed account.
    Archived,
}

impl PersonStatus {
    fn to_value(self) -> Value {
        PERSON_STATUS
            .by_ordinal(self as i64)
            .map(Value::Enum)
            .unwrap_or(Value::Null)
    }

    fn from_value(value: Value) -> Result<Self, ValueTypeError> {
        match EnumValue::from_value(value)?.ordinal {
            0 => Ok(PersonStatus::Active),
            1 => Ok(PersonStatus::Suspended),
            2 => Ok(PersonStatus::Archived),
            _ => Err(ValueTypeError {
                expected: "PersonStatus",
                found: "Enum",
            }),
        }
    }
}

/// A postal address, loaded only when requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// City name.
    pub city: String,
}

/// The entity used throughout the integration tests.
#[derive(Debug, Clone, Default)]
pub struct Person {
    pub base: BaseFields,
    pub name: String,
    pub age: i64,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub settings: Option<String>,
    pub status: PersonStatus,
    pub avatar: Option<Vec<u8>>,
    pub addresses: Vec<Address>,
}

impl Entity for Person {
    fn schema() -> &'static EntitySchema<Self> {
        static SCHEMA: OnceLock<EntitySchema<Person>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            EntitySchema::<Self>::builder("Person")
                .base_fields()
                .field(
                    "Name",
                    FieldType::text(),
                    |p| p.name.clone().into(),
                    |p, v| {
                        p.name = String::from_value(v)?;
                        Ok(())
                    },
                )
                .field(
                    "Age",
                    FieldType::int(),
                    |p| p.age.into(),
                    |p, v| {
                        p.age = i64::from_value(v)?;
                        Ok(())
                    },
                )
                .field(
                    "Email",
                    FieldType::text().nullable(),
                    |p| p.email.clone().into(),
                    |p, v| {
                        p.email = FromValue::from_value(v)?;
                        Ok(())
                    },
                )
                .field(
                    "Nickname",
                    FieldType::text().nullable(),
                    |p| p.nickname.clone().into(),
                    |p, v| {
                        p.nickname = FromValue::from_value(v)?;
                        Ok(())
                    },
                )
                .field(
                    "Settings",
                    FieldType::text().nullable(),
                    |p| p.settings.clone().into(),
                    |p, v| {
                        p.settings = FromValue::from_value(v)?;
                        Ok(())
                    },
                )
                .field(
                    "Status",
                    FieldType::enumeration(&PERSON_STATUS),
                    |p| p.status.to_value(),
                    |p, v| {
                        p.status = PersonStatus::from_value(v)?;
                        Ok(())
                    },
                )
                .field(
                    "Avatar",
                    FieldType::optional(FieldKind::Binary),
                    |p| p.avatar.clone().into(),
                    |p, v| {
                        p.avatar = FromValue::from_value(v)?;
                        Ok(())
                    },
                )
                .navigation("Addresses", |p| p.addresses.clear())
                .unique(EMAIL_CONSTRAINT, &["Email"])
                .build()
        })
    }

    fn base(&self) -> &BaseFields {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseFields {
        &mut self.base
    }
}

/// The instant fixture timestamps are offset from.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

impl Person {
    /// Creates a person with a fresh id.
    pub fn new(name: &str, age: i64) -> Self {
        Self {
            base: BaseFields::default()
                .with_id(Uuid::new_v4())
                .with_modified_at(epoch()),
            name: name.to_string(),
            age,
            ..Default::default()
        }
    }

    /// Sets the email.
    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    /// Sets the nickname.
    pub fn with_nickname(mut self, nickname: &str) -> Self {
        self.nickname = Some(nickname.to_string());
        self
    }

    /// Sets the raw settings document.
    pub fn with_settings(mut self, settings: &str) -> Self {
        self.settings = Some(settings.to_string());
        self
    }

    /// Sets the status.
    pub fn with_status(mut self, status: PersonStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the avatar bytes.
    pub fn with_avatar(mut self, avatar: &[u8]) -> Self {
        self.avatar = Some(avatar.to_vec());
        self
    }

    /// Adds an address.
    pub fn with_address(mut self, city: &str) -> Self {
        self.addresses.push(Address {
            city: city.to_string(),
        });
        self
    }

    /// Marks the person as modified `minutes` after [`epoch`].
    pub fn modified(mut self, minutes: i64) -> Self {
        self.base.modified_at = epoch() + Duration::minutes(minutes);
        self
    }
}

/// Five people, stored in this order, modified one minute apart.
///
/// | Name  | Age | Email           | Status    | Extra                      |
/// |-------|-----|-----------------|-----------|----------------------------|
/// | Alice | 30  | alice@mail.test | Active    | address in Oslo            |
/// | Bob   | 25  | bob@mail.test   | Active    |                            |
/// | Bob   | 35  | bob2@mail.test  | Suspended |                            |
/// | Carol | 40  |                 | Archived  | nickname, settings, avatar |
/// | Dave  | 35  | dave@mail.test  | Active    |                            |
pub fn people() -> Vec<Person> {
    vec![
        Person::new("Alice", 30)
            .with_email("alice@mail.test")
            .with_address("Oslo")
            .modified(1),
        Person::new("Bob", 25).with_email("bob@mail.test").modified(2),
        Person::new("Bob", 35)
            .with_email("bob2@mail.test")
            .with_status(PersonStatus::Suspended)
            .modified(3),
        Person::new("Carol", 40)
            .with_nickname("Caz")
            .with_settings(r#"{"theme":"dark","size":3}"#)
            .with_status(PersonStatus::Archived)
            .with_avatar(b"png")
            .modified(4),
        Person::new("Dave", 35).with_email("dave@mail.test").modified(5),
    ]
}

/// People with only a name and an age, modified in order.
pub fn name_age(rows: &[(&str, i64)]) -> Vec<Person> {
    rows.iter()
        .enumerate()
        .map(|(i, (name, age))| Person::new(name, *age).modified(i as i64))
        .collect()
}
