//! Funding records: grants, funders, their policies, and people

use super::{impl_entity, AwardStatus, Repository, UserRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An award from a funder to a principal investigator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Grant {
    #[serde(skip)]
    pub id: Option<String>,
    pub award_number: Option<String>,
    pub award_status: Option<AwardStatus>,
    /// Institution-local identifier, unique per grant
    pub local_key: Option<String>,
    pub project_name: Option<String>,
    pub award_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,

    #[serde(skip)]
    pub primary_funder: Option<Box<Funder>>,
    #[serde(skip)]
    pub direct_funder: Option<Box<Funder>>,
    #[serde(skip)]
    pub pi: Option<Box<User>>,
    #[serde(skip)]
    pub co_pis: Vec<User>,
}

impl_entity!(Grant {
    one primary_funder: "primaryFunder" => Funder,
    one direct_funder: "directFunder" => Funder,
    one pi: "pi" => User,
    many co_pis: "coPis" => User,
});

/// An organisation that funds research
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Funder {
    #[serde(skip)]
    pub id: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
    pub local_key: Option<String>,

    #[serde(skip)]
    pub policy: Option<Box<Policy>>,
}

impl_entity!(Funder {
    one policy: "policy" => Policy,
});

/// A public-access policy and the repositories that satisfy it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Policy {
    #[serde(skip)]
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub policy_url: Option<String>,
    /// Set for institutional policies, absent for funder policies
    pub institution: Option<String>,

    #[serde(skip)]
    pub repositories: Vec<Repository>,
}

impl_entity!(Policy {
    many repositories: "repositories" => Repository,
});

/// A PASS user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    #[serde(skip)]
    pub id: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    #[serde(deserialize_with = "super::null_as_default")]
    pub affiliation: Vec<String>,
    /// Institutional identifiers, e.g. `johnshopkins.edu:hopkinsid:ABC123`
    #[serde(deserialize_with = "super::null_as_default")]
    pub locator_ids: Vec<String>,
    pub orcid_id: Option<String>,
    #[serde(deserialize_with = "super::null_as_default")]
    pub roles: Vec<UserRole>,
}

impl_entity!(User {});
