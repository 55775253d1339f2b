//! Relationship reconciliation
//!
//! [`JsonApiCodec`](crate::codec::JsonApiCodec) hydrates relationship targets
//! that the server embedded in `included`. Everything else a resource links to
//! is found here: one forward streaming pass over the raw body collects, per
//! primary resource id, each relationship's linkage together with the set of
//! included `(type, id)` pairs. Targets that were included are pruned, and
//! [`merge`] turns what is left into id-only stubs.
//!
//! Attributes and any other members are skipped with [`IgnoredAny`] without
//! being materialized. `data` and `included` may come in either order.

use crate::error::{PassClientError, Result};
use crate::model::{Cardinality, Entity, PassEntity};
use serde::de::value::{MapAccessDeserializer, SeqAccessDeserializer};
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use tracing::debug;

/// Non-included targets of one relationship of one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipTargets {
    /// JSON:API relationship name
    pub name: String,
    /// JSON:API type of the targets
    pub target_type: String,
    /// Target ids, in document order
    pub target_ids: Vec<String>,
    /// Whether the linkage was an array
    pub to_many: bool,
}

/// Primary resource id to its relationships with non-included targets
pub type ReconciledRelationships = HashMap<String, Vec<RelationshipTargets>>;

/// Scan a JSON:API body for relationship targets missing from `included`
///
/// Relationships whose targets were all included, or that had no linkage at
/// all, do not appear in the output. Identifiers missing `type` or `id` are
/// skipped. A body without `data` yields an empty map.
pub fn reconcile(body: &[u8]) -> Result<ReconciledRelationships> {
    let mut deserializer = serde_json::Deserializer::from_slice(body);
    let scan = DocumentScan::deserialize(&mut deserializer)?;
    deserializer.end()?;

    let included: HashSet<(String, String)> = scan
        .included
        .into_iter()
        .filter_map(|identifier| Some((identifier.resource_type?, identifier.id?)))
        .collect();

    let mut reconciled = ReconciledRelationships::new();
    for resource in scan.data.map(|primary| primary.0).unwrap_or_default() {
        let Some(id) = resource.id else {
            continue;
        };

        let mut relationships = Vec::new();
        for (name, relationship) in resource.relationships {
            let (to_many, identifiers) = match relationship.data {
                Linkage::Absent => continue,
                Linkage::One(identifier) => (false, vec![identifier]),
                Linkage::Many(identifiers) => (true, identifiers),
            };

            if let Some(targets) = prune(&name, to_many, identifiers, &included)? {
                relationships.push(targets);
            }
        }

        if !relationships.is_empty() {
            reconciled.entry(id).or_default().extend(relationships);
        }
    }

    Ok(reconciled)
}

fn prune(
    name: &str,
    to_many: bool,
    identifiers: Vec<IdentifierScan>,
    included: &HashSet<(String, String)>,
) -> Result<Option<RelationshipTargets>> {
    let mut target_type: Option<String> = None;
    let mut target_ids = Vec::new();

    for identifier in identifiers {
        let (Some(resource_type), Some(id)) = (identifier.resource_type, identifier.id) else {
            debug!(relationship = name, "Skipping linkage without type or id");
            continue;
        };

        let key = (resource_type, id);
        if included.contains(&key) {
            continue;
        }
        let (resource_type, id) = key;

        match &target_type {
            None => target_type = Some(resource_type),
            Some(existing) if *existing != resource_type => {
                return Err(PassClientError::malformed(format!(
                    "relationship '{}' mixes target types '{}' and '{}'",
                    name, existing, resource_type
                )));
            }
            Some(_) => {}
        }
        target_ids.push(id);
    }

    Ok(target_type.map(|target_type| RelationshipTargets {
        name: name.to_string(),
        target_type,
        target_ids,
        to_many,
    }))
}

/// Fill in stubs for reconciled targets the codec left unset
///
/// A to-one relationship that is already hydrated is left alone. For a to-many
/// relationship, stubs for ids not already present are appended after the
/// hydrated targets. Relationships `E` does not declare are ignored.
pub fn merge<E: Entity>(entity: &mut E, targets: &[RelationshipTargets]) -> Result<()> {
    for reconciled in targets {
        let Some(rel) = E::relationship(&reconciled.name) else {
            debug!(
                entity_type = %E::TYPE,
                relationship = %reconciled.name,
                "Ignoring relationship not declared by the model"
            );
            continue;
        };

        if reconciled.target_type != rel.target.json_type() {
            return Err(PassClientError::wire_type_mismatch(
                rel.name,
                rel.target,
                &reconciled.target_type,
            ));
        }

        let stubs: Vec<PassEntity> = match rel.cardinality {
            Cardinality::ToOne => {
                if !rel.is_unset(entity) {
                    continue;
                }
                reconciled
                    .target_ids
                    .first()
                    .map(|id| PassEntity::stub(rel.target, id.as_str()))
                    .into_iter()
                    .collect()
            }
            Cardinality::ToMany => {
                let present: HashSet<String> =
                    rel.target_ids(entity).into_iter().flatten().collect();
                reconciled
                    .target_ids
                    .iter()
                    .filter(|id| !present.contains(*id))
                    .map(|id| PassEntity::stub(rel.target, id.as_str()))
                    .collect()
            }
        };

        if !stubs.is_empty() {
            rel.link(entity, stubs)
                .map_err(|mismatch| PassClientError::type_mismatch(rel.name, mismatch))?;
        }
    }

    Ok(())
}

/// [`merge`] every entity that has reconciled relationships, matched by id
pub fn merge_all<E: Entity>(entities: &mut [E], reconciled: &ReconciledRelationships) -> Result<()> {
    for entity in entities.iter_mut() {
        let Some(targets) = entity.id().and_then(|id| reconciled.get(id)) else {
            continue;
        };
        merge(entity, targets)?;
    }
    Ok(())
}

// ============================================================================
// Streaming Scan Types
// ============================================================================

#[derive(Deserialize)]
struct DocumentScan {
    #[serde(default)]
    data: Option<PrimaryScan>,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    included: Vec<IdentifierScan>,
}

/// `data` as either one resource object or an array of them
struct PrimaryScan(Vec<ResourceScan>);

impl<'de> Deserialize<'de> for PrimaryScan {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PrimaryVisitor;

        impl<'de> Visitor<'de> for PrimaryVisitor {
            type Value = PrimaryScan;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a resource object, an array of resource objects, or null")
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> std::result::Result<Self::Value, A::Error> {
                let resource = ResourceScan::deserialize(MapAccessDeserializer::new(map))?;
                Ok(PrimaryScan(vec![resource]))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> std::result::Result<Self::Value, A::Error> {
                Vec::<ResourceScan>::deserialize(SeqAccessDeserializer::new(seq)).map(PrimaryScan)
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
                Ok(PrimaryScan(Vec::new()))
            }
        }

        deserializer.deserialize_any(PrimaryVisitor)
    }
}

#[derive(Deserialize)]
struct ResourceScan {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    relationships: BTreeMap<String, RelationshipScan>,
}

#[derive(Deserialize)]
struct RelationshipScan {
    #[serde(default)]
    data: Linkage,
}

/// Relationship `data`; anything that is not linkage reads as `Absent`
#[derive(Debug, Default)]
pub(crate) enum Linkage {
    #[default]
    Absent,
    One(IdentifierScan),
    Many(Vec<IdentifierScan>),
}

impl<'de> Deserialize<'de> for Linkage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct LinkageVisitor;

        impl<'de> Visitor<'de> for LinkageVisitor {
            type Value = Linkage;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("resource linkage")
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> std::result::Result<Self::Value, A::Error> {
                IdentifierScan::deserialize(MapAccessDeserializer::new(map)).map(Linkage::One)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
                let mut identifiers = Vec::new();
                while let Some(identifier) = seq.next_element::<MaybeIdentifier>()? {
                    if let MaybeIdentifier::Object(identifier) = identifier {
                        identifiers.push(identifier);
                    }
                }
                Ok(Linkage::Many(identifiers))
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
                Ok(Linkage::Absent)
            }

            // Anything else is not linkage at all
            fn visit_bool<E: de::Error>(self, _: bool) -> std::result::Result<Self::Value, E> {
                Ok(Linkage::Absent)
            }

            fn visit_i64<E: de::Error>(self, _: i64) -> std::result::Result<Self::Value, E> {
                Ok(Linkage::Absent)
            }

            fn visit_u64<E: de::Error>(self, _: u64) -> std::result::Result<Self::Value, E> {
                Ok(Linkage::Absent)
            }

            fn visit_f64<E: de::Error>(self, _: f64) -> std::result::Result<Self::Value, E> {
                Ok(Linkage::Absent)
            }

            fn visit_str<E: de::Error>(self, _: &str) -> std::result::Result<Self::Value, E> {
                Ok(Linkage::Absent)
            }
        }

        deserializer.deserialize_any(LinkageVisitor)
    }
}

/// An array element of to-many linkage; non-objects are dropped
enum MaybeIdentifier {
    Object(IdentifierScan),
    Other,
}

impl<'de> Deserialize<'de> for MaybeIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ElementVisitor;

        impl<'de> Visitor<'de> for ElementVisitor {
            type Value = MaybeIdentifier;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a resource identifier object")
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> std::result::Result<Self::Value, A::Error> {
                IdentifierScan::deserialize(MapAccessDeserializer::new(map)).map(MaybeIdentifier::Object)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(MaybeIdentifier::Other)
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
                Ok(MaybeIdentifier::Other)
            }

            fn visit_bool<E: de::Error>(self, _: bool) -> std::result::Result<Self::Value, E> {
                Ok(MaybeIdentifier::Other)
            }

            fn visit_i64<E: de::Error>(self, _: i64) -> std::result::Result<Self::Value, E> {
                Ok(MaybeIdentifier::Other)
            }

            fn visit_u64<E: de::Error>(self, _: u64) -> std::result::Result<Self::Value, E> {
                Ok(MaybeIdentifier::Other)
            }

            fn visit_f64<E: de::Error>(self, _: f64) -> std::result::Result<Self::Value, E> {
                Ok(MaybeIdentifier::Other)
            }

            fn visit_str<E: de::Error>(self, _: &str) -> std::result::Result<Self::Value, E> {
                Ok(MaybeIdentifier::Other)
            }
        }

        deserializer.deserialize_any(ElementVisitor)
    }
}

/// `{type, id}`; both optional so malformed linkage can be skipped
#[derive(Debug, Deserialize)]
pub(crate) struct IdentifierScan {
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub(crate) resource_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub(crate) id: Option<String>,
}

/// A string, or `None` for any other JSON value
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaybeString {
        Str(String),
        Other(IgnoredAny),
    }

    Ok(match MaybeString::deserialize(deserializer)? {
        MaybeString::Str(s) if !s.is_empty() => Some(s),
        _ => None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::{Grant, Submission, User};
    use proptest::prelude::*;
    use serde_json::json;

    fn reconcile_value(body: serde_json::Value) -> ReconciledRelationships {
        reconcile(&serde_json::to_vec(&body).unwrap()).unwrap()
    }

    #[test]
    fn test_included_targets_are_pruned() {
        let reconciled = reconcile_value(json!({
            "data": [{"id": "1", "type": "grant", "relationships": {
                "pi": {"data": {"type": "user", "id": "7"}}
            }}],
            "included": [{"id": "7", "type": "user", "attributes": {"username": "x"}}]
        }));
        assert!(reconciled.get("1").is_none());
    }

    #[test]
    fn test_non_included_targets_are_kept() {
        let reconciled = reconcile_value(json!({
            "data": [{"id": "1", "type": "grant", "relationships": {
                "pi": {"data": {"type": "user", "id": "7"}}
            }}],
            "included": []
        }));
        assert_eq!(
            reconciled["1"],
            vec![RelationshipTargets {
                name: "pi".to_string(),
                target_type: "user".to_string(),
                target_ids: vec!["7".to_string()],
                to_many: false,
            }]
        );
    }

    #[test]
    fn test_included_may_precede_data() {
        let body = br#"{
            "included": [{"type": "user", "id": "a"}],
            "meta": {"page": {"totalRecords": 1}},
            "data": {"type": "grant", "id": "g", "attributes": {"nested": {"deep": [1, {"x": null}]}},
                "relationships": {"coPis": {"data": [
                    {"type": "user", "id": "a"}, {"type": "user", "id": "b"}, {"type": "user", "id": "c"}
                ]}}}
        }"#;
        let reconciled = reconcile(body).unwrap();
        let co_pis = &reconciled["g"][0];
        assert!(co_pis.to_many);
        assert_eq!(co_pis.target_ids, vec!["b", "c"]);
    }

    #[test]
    fn test_malformed_linkage_is_skipped() {
        let reconciled = reconcile_value(json!({
            "data": {"type": "grant", "id": "g", "relationships": {
                "pi": {"data": {"type": "user"}},
                "directFunder": {"data": {"id": "f1"}},
                "primaryFunder": {"data": null},
                "coPis": {"data": [{"id": "u1"}, "junk", {"type": "user", "id": "u2"}]},
                "links": {"links": {"self": "http://x"}}
            }}
        }));
        let relationships = &reconciled["g"];
        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships[0].name, "coPis");
        assert_eq!(relationships[0].target_ids, vec!["u2"]);
    }

    #[test]
    fn test_missing_members_are_tolerated() {
        assert!(reconcile(br#"{}"#).unwrap().is_empty());
        assert!(reconcile(br#"{"data": null}"#).unwrap().is_empty());
        assert!(reconcile(br#"{"data": [{"type": "user", "id": "1"}]}"#).unwrap().is_empty());
    }

    #[test]
    fn test_not_json_is_malformed() {
        assert!(matches!(
            reconcile(b"{\"data\": [").unwrap_err(),
            PassClientError::MalformedResponse(_)
        ));
        assert!(matches!(
            reconcile(b"{} trailing").unwrap_err(),
            PassClientError::MalformedResponse(_)
        ));
    }

    #[test]
    fn test_merge_sets_stub_only_when_unset() {
        let targets = vec![RelationshipTargets {
            name: "pi".to_string(),
            target_type: "user".to_string(),
            target_ids: vec!["7".to_string()],
            to_many: false,
        }];

        let mut grant = Grant::stub("1");
        merge(&mut grant, &targets).unwrap();
        assert_eq!(grant.pi.as_deref(), Some(&User::stub("7")));

        let hydrated = User { username: Some("jdoe".to_string()), ..User::stub("9") };
        let mut grant = Grant { pi: Some(Box::new(hydrated.clone())), ..Grant::stub("1") };
        merge(&mut grant, &targets).unwrap();
        assert_eq!(grant.pi.as_deref(), Some(&hydrated));
    }

    #[test]
    fn test_merge_appends_missing_to_many_stubs() {
        let hydrated = User { username: Some("a".to_string()), ..User::stub("a") };
        let mut submission = Submission { preparers: vec![hydrated.clone()], ..Submission::stub("s") };
        let targets = vec![RelationshipTargets {
            name: "preparers".to_string(),
            target_type: "user".to_string(),
            target_ids: vec!["a".to_string(), "b".to_string()],
            to_many: true,
        }];

        merge(&mut submission, &targets).unwrap();
        assert_eq!(submission.preparers, vec![hydrated, User::stub("b")]);
    }

    #[test]
    fn test_merge_rejects_wrong_target_type() {
        let mut grant = Grant::stub("1");
        let targets = vec![RelationshipTargets {
            name: "pi".to_string(),
            target_type: "funder".to_string(),
            target_ids: vec!["f".to_string()],
            to_many: false,
        }];
        let err = merge(&mut grant, &targets).unwrap_err();
        assert!(matches!(err, PassClientError::RelationshipTypeMismatch { .. }));
    }

    #[test]
    fn test_merge_all_matches_by_id() {
        let reconciled = reconcile_value(json!({
            "data": [
                {"type": "grant", "id": "1", "relationships": {"pi": {"data": {"type": "user", "id": "u1"}}}},
                {"type": "grant", "id": "2", "relationships": {"pi": {"data": {"type": "user", "id": "u2"}}}}
            ]
        }));
        let mut grants = vec![Grant::stub("2"), Grant::stub("1"), Grant::stub("3")];
        merge_all(&mut grants, &reconciled).unwrap();

        assert_eq!(grants[0].pi.as_deref().and_then(|u| u.id.as_deref()), Some("u2"));
        assert_eq!(grants[1].pi.as_deref().and_then(|u| u.id.as_deref()), Some("u1"));
        assert!(grants[2].pi.is_none());
    }

    proptest! {
        #[test]
        fn prop_pruning_keeps_non_included_in_order(
            targets in proptest::collection::vec((0u8..20, any::<bool>()), 0..12)
        ) {
            let linkage: Vec<_> = targets
                .iter()
                .map(|(id, _)| json!({"type": "user", "id": id.to_string()}))
                .collect();
            let included: Vec<_> = targets
                .iter()
                .filter(|(_, included)| *included)
                .map(|(id, _)| json!({"type": "user", "id": id.to_string()}))
                .collect();
            let included_ids: HashSet<String> =
                included.iter().map(|v| v["id"].as_str().unwrap().to_string()).collect();

            let reconciled = reconcile_value(json!({
                "data": [{"type": "submission", "id": "s", "relationships": {
                    "preparers": {"data": linkage}
                }}],
                "included": included
            }));

            let expected: Vec<String> = targets
                .iter()
                .map(|(id, _)| id.to_string())
                .filter(|id| !included_ids.contains(id))
                .collect();

            match reconciled.get("s") {
                None => prop_assert!(expected.is_empty()),
                Some(relationships) => {
                    prop_assert_eq!(relationships.len(), 1);
                    prop_assert_eq!(&relationships[0].target_ids, &expected);
                    prop_assert!(relationships[0].to_many);
                }
            }
        }
    }
}
