//! Publications, the journals they appear in, and the repositories that hold copies

use super::{impl_entity, CopyStatus, IntegrationType, PmcParticipation};
use serde::{Deserialize, Serialize};

/// A published article
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Publication {
    #[serde(skip)]
    pub id: Option<String>,
    pub title: Option<String>,
    pub publication_abstract: Option<String>,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,

    #[serde(skip)]
    pub journal: Option<Box<Journal>>,
}

impl_entity!(Publication {
    one journal: "journal" => Journal,
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Journal {
    #[serde(skip)]
    pub id: Option<String>,
    pub journal_name: Option<String>,
    /// ISSNs prefixed with their medium, e.g. `Print:0000-0001`
    #[serde(deserialize_with = "super::null_as_default")]
    pub issns: Vec<String>,
    pub nlmta: Option<String>,
    pub pmc_participation: Option<PmcParticipation>,
}

impl_entity!(Journal {});

/// A deposit target such as PubMed Central or an institutional repository
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Repository {
    #[serde(skip)]
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub agreement_text: Option<String>,
    pub form_schema: Option<String>,
    pub integration_type: Option<IntegrationType>,
    /// Stable key used by deposit services to select a transport
    pub repository_key: Option<String>,
    #[serde(deserialize_with = "super::null_as_default")]
    pub schemas: Vec<String>,
}

impl_entity!(Repository {});

/// A copy of a publication held by a repository
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepositoryCopy {
    #[serde(skip)]
    pub id: Option<String>,
    #[serde(deserialize_with = "super::null_as_default")]
    pub external_ids: Vec<String>,
    pub copy_status: Option<CopyStatus>,
    pub access_url: Option<String>,

    #[serde(skip)]
    pub publication: Option<Box<Publication>>,
    #[serde(skip)]
    pub repository: Option<Box<Repository>>,
}

impl_entity!(RepositoryCopy {
    one publication: "publication" => Publication,
    one repository: "repository" => Repository,
});

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::Entity;
    use serde_json::json;

    #[test]
    fn test_journal_issns_and_participation() {
        let journal: Journal = serde_json::from_value(json!({
            "journalName": "The Analyst",
            "issns": ["Print:0003-2654", "Online:1364-5528"],
            "pmcParticipation": "B"
        }))
        .unwrap();

        assert_eq!(journal.issns.len(), 2);
        assert_eq!(journal.pmc_participation, Some(PmcParticipation::B));
    }

    #[test]
    fn test_repository_copy_links_publication() {
        let rel = RepositoryCopy::relationship("publication").unwrap();
        let copy = RepositoryCopy {
            publication: Some(Box::new(Publication::stub("p1"))),
            ..RepositoryCopy::default()
        };
        assert_eq!(rel.target_ids(&copy), vec![Some("p1".to_string())]);
        assert!(RepositoryCopy::relationship("repository").unwrap().is_unset(&copy));
    }
}
