//! PASS domain model
//!
//! Every repository record implements [`Entity`]: an opaque string id, serde
//! attributes, and a static table of [`Relationship`] descriptors that the
//! codec and the reconciler use to read and wire relationship targets without
//! any runtime reflection.
//!
//! The set of record types is closed. [`EntityType`] is the explicit table
//! between Rust types and JSON:API `type` strings, and [`PassEntity`] carries a
//! record of any registered type across the type-erased parts of the client.
//!
//! ```
//! use pass_client::model::{Entity, EntityType, Grant};
//!
//! assert_eq!(Grant::TYPE.json_type(), "grant");
//! assert_eq!(EntityType::from_json_type("repositoryCopy"), Some(EntityType::RepositoryCopy));
//!
//! let pi = Grant::relationship("pi").unwrap();
//! assert_eq!(pi.target, EntityType::User);
//! ```

mod grant;
mod publication;
mod status;
mod submission;

pub use grant::{Funder, Grant, Policy, User};
pub use publication::{Journal, Publication, Repository, RepositoryCopy};
pub use status::*;
pub use submission::{Deposit, File, Submission, SubmissionEvent};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A PASS repository record
pub trait Entity:
    Serialize + DeserializeOwned + Default + Clone + fmt::Debug + Send + Sync + 'static
{
    /// Registered type of this record
    const TYPE: EntityType;

    /// Server-assigned id; `None` until the record has been created
    fn id(&self) -> Option<&str>;

    fn set_id(&mut self, id: Option<String>);

    /// Relationship descriptors, in declaration order
    fn relationships() -> &'static [Relationship<Self>];

    /// Look up a relationship descriptor by its JSON:API name
    fn relationship(name: &str) -> Option<&'static Relationship<Self>> {
        Self::relationships().iter().find(|rel| rel.name == name)
    }

    /// A relationship stub: a record carrying nothing but `id`
    ///
    /// Stubs stand in for relationship targets the server did not include.
    /// Fetch the target again (or request it via `include`) before reading
    /// anything other than its id.
    fn stub(id: impl Into<String>) -> Self {
        let mut stub = Self::default();
        stub.set_id(Some(id.into()));
        stub
    }
}

/// Registered record types and their JSON:API type strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityType {
    Deposit,
    File,
    Funder,
    Grant,
    Journal,
    Policy,
    Publication,
    Repository,
    RepositoryCopy,
    Submission,
    SubmissionEvent,
    User,
}

impl EntityType {
    /// Every registered type
    pub const ALL: [EntityType; 12] = [
        EntityType::Deposit,
        EntityType::File,
        EntityType::Funder,
        EntityType::Grant,
        EntityType::Journal,
        EntityType::Policy,
        EntityType::Publication,
        EntityType::Repository,
        EntityType::RepositoryCopy,
        EntityType::Submission,
        EntityType::SubmissionEvent,
        EntityType::User,
    ];

    /// JSON:API `type` string, also the last path segment of the collection URL
    pub const fn json_type(self) -> &'static str {
        match self {
            EntityType::Deposit => "deposit",
            EntityType::File => "file",
            EntityType::Funder => "funder",
            EntityType::Grant => "grant",
            EntityType::Journal => "journal",
            EntityType::Policy => "policy",
            EntityType::Publication => "publication",
            EntityType::Repository => "repository",
            EntityType::RepositoryCopy => "repositoryCopy",
            EntityType::Submission => "submission",
            EntityType::SubmissionEvent => "submissionEvent",
            EntityType::User => "user",
        }
    }

    /// Reverse of [`EntityType::json_type`]
    pub fn from_json_type(json_type: &str) -> Option<EntityType> {
        match json_type {
            "deposit" => Some(EntityType::Deposit),
            "file" => Some(EntityType::File),
            "funder" => Some(EntityType::Funder),
            "grant" => Some(EntityType::Grant),
            "journal" => Some(EntityType::Journal),
            "policy" => Some(EntityType::Policy),
            "publication" => Some(EntityType::Publication),
            "repository" => Some(EntityType::Repository),
            "repositoryCopy" => Some(EntityType::RepositoryCopy),
            "submission" => Some(EntityType::Submission),
            "submissionEvent" => Some(EntityType::SubmissionEvent),
            "user" => Some(EntityType::User),
            _ => None,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.json_type())
    }
}

impl std::str::FromStr for EntityType {
    type Err = UnknownEntityType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::from_json_type(s).ok_or_else(|| UnknownEntityType(s.to_string()))
    }
}

/// A JSON:API type string with no registered record type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown PASS type '{0}'")]
pub struct UnknownEntityType(pub String);

/// Run `$body` with `$T` bound to the record type registered for `$ty`
///
/// ```
/// use pass_client::model::{Entity, EntityType};
/// use pass_client::with_entity_type;
///
/// let ty = EntityType::Journal;
/// let name = with_entity_type!(ty, T => T::TYPE.json_type());
/// assert_eq!(name, "journal");
/// ```
#[macro_export]
macro_rules! with_entity_type {
    ($ty:expr, $T:ident => $body:expr) => {
        match $ty {
            $crate::model::EntityType::Deposit => {
                type $T = $crate::model::Deposit;
                $body
            }
            $crate::model::EntityType::File => {
                type $T = $crate::model::File;
                $body
            }
            $crate::model::EntityType::Funder => {
                type $T = $crate::model::Funder;
                $body
            }
            $crate::model::EntityType::Grant => {
                type $T = $crate::model::Grant;
                $body
            }
            $crate::model::EntityType::Journal => {
                type $T = $crate::model::Journal;
                $body
            }
            $crate::model::EntityType::Policy => {
                type $T = $crate::model::Policy;
                $body
            }
            $crate::model::EntityType::Publication => {
                type $T = $crate::model::Publication;
                $body
            }
            $crate::model::EntityType::Repository => {
                type $T = $crate::model::Repository;
                $body
            }
            $crate::model::EntityType::RepositoryCopy => {
                type $T = $crate::model::RepositoryCopy;
                $body
            }
            $crate::model::EntityType::Submission => {
                type $T = $crate::model::Submission;
                $body
            }
            $crate::model::EntityType::SubmissionEvent => {
                type $T = $crate::model::SubmissionEvent;
                $body
            }
            $crate::model::EntityType::User => {
                type $T = $crate::model::User;
                $body
            }
        }
    };
}

/// A record of any registered type
#[derive(Debug, Clone, PartialEq)]
pub enum PassEntity {
    Deposit(Deposit),
    File(File),
    Funder(Funder),
    Grant(Grant),
    Journal(Journal),
    Policy(Policy),
    Publication(Publication),
    Repository(Repository),
    RepositoryCopy(RepositoryCopy),
    Submission(Submission),
    SubmissionEvent(SubmissionEvent),
    User(User),
}

/// A [`PassEntity`] was offered where a different record type was required
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMismatch {
    pub expected: EntityType,
    pub found: EntityType,
}

macro_rules! pass_entity_conversions {
    ($($variant:ident),+ $(,)?) => {
        impl PassEntity {
            pub fn entity_type(&self) -> EntityType {
                match self {
                    $(PassEntity::$variant(_) => EntityType::$variant,)+
                }
            }

            pub fn id(&self) -> Option<&str> {
                match self {
                    $(PassEntity::$variant(entity) => entity.id(),)+
                }
            }
        }

        $(
            impl From<$variant> for PassEntity {
                fn from(entity: $variant) -> Self {
                    PassEntity::$variant(entity)
                }
            }

            impl TryFrom<PassEntity> for $variant {
                type Error = TypeMismatch;

                fn try_from(entity: PassEntity) -> Result<Self, Self::Error> {
                    match entity {
                        PassEntity::$variant(entity) => Ok(entity),
                        other => Err(TypeMismatch {
                            expected: EntityType::$variant,
                            found: other.entity_type(),
                        }),
                    }
                }
            }
        )+
    };
}

pass_entity_conversions!(
    Deposit,
    File,
    Funder,
    Grant,
    Journal,
    Policy,
    Publication,
    Repository,
    RepositoryCopy,
    Submission,
    SubmissionEvent,
    User,
);

impl PassEntity {
    /// A stub of type `ty` carrying only `id`
    pub fn stub(ty: EntityType, id: impl Into<String>) -> PassEntity {
        let id = id.into();
        with_entity_type!(ty, T => PassEntity::from(T::stub(id)))
    }
}

/// Whether a relationship points at one target or an ordered list of targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    ToOne,
    ToMany,
}

/// Compile-time descriptor of one relationship field of `E`
pub struct Relationship<E: 'static> {
    /// JSON:API relationship name
    pub name: &'static str,
    /// Type of the target record(s)
    pub target: EntityType,
    pub cardinality: Cardinality,
    pub(crate) targets: fn(&E) -> Vec<Option<String>>,
    pub(crate) link: fn(&mut E, Vec<PassEntity>) -> Result<(), TypeMismatch>,
}

impl<E: Entity> Relationship<E> {
    /// Ids of the current targets; a target that was never persisted yields `None`
    pub fn target_ids(&self, entity: &E) -> Vec<Option<String>> {
        (self.targets)(entity)
    }

    /// True when a to-one relationship is null or a to-many relationship is empty
    pub fn is_unset(&self, entity: &E) -> bool {
        (self.targets)(entity).is_empty()
    }

    /// Attach `targets`: replaces a to-one value, appends to a to-many list
    pub fn link(&self, entity: &mut E, targets: Vec<PassEntity>) -> Result<(), TypeMismatch> {
        (self.link)(entity, targets)
    }
}

impl<E: 'static> fmt::Debug for Relationship<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relationship")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("cardinality", &self.cardinality)
            .finish()
    }
}

/// Implement [`Entity`] for a record with an `id: Option<String>` field
///
/// `one` fields are `Option<Box<Target>>`, `many` fields are `Vec<Target>`.
macro_rules! impl_entity {
    (
        $ty:ident {
            $(one $one_field:ident: $one_name:literal => $one_target:ident,)*
            $(many $many_field:ident: $many_name:literal => $many_target:ident,)*
        }
    ) => {
        impl $crate::model::Entity for $ty {
            const TYPE: $crate::model::EntityType = $crate::model::EntityType::$ty;

            fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }

            fn set_id(&mut self, id: Option<String>) {
                self.id = id;
            }

            fn relationships() -> &'static [$crate::model::Relationship<Self>] {
                const RELATIONSHIPS: &[$crate::model::Relationship<$ty>] = &[
                    $(
                        $crate::model::Relationship {
                            name: $one_name,
                            target: $crate::model::EntityType::$one_target,
                            cardinality: $crate::model::Cardinality::ToOne,
                            targets: |entity: &$ty| {
                                entity.$one_field.iter().map(|target| target.id.clone()).collect()
                            },
                            link: |entity: &mut $ty, targets: Vec<$crate::model::PassEntity>| {
                                if let Some(target) = targets.into_iter().next() {
                                    entity.$one_field = Some(Box::new($one_target::try_from(target)?));
                                }
                                Ok(())
                            },
                        },
                    )*
                    $(
                        $crate::model::Relationship {
                            name: $many_name,
                            target: $crate::model::EntityType::$many_target,
                            cardinality: $crate::model::Cardinality::ToMany,
                            targets: |entity: &$ty| {
                                entity.$many_field.iter().map(|target| target.id.clone()).collect()
                            },
                            link: |entity: &mut $ty, targets: Vec<$crate::model::PassEntity>| {
                                for target in targets {
                                    entity.$many_field.push($many_target::try_from(target)?);
                                }
                                Ok(())
                            },
                        },
                    )*
                ];
                RELATIONSHIPS
            }
        }
    };
}

pub(crate) use impl_entity;

/// Treat an explicit JSON `null` like a missing attribute
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
