//! Submissions and the records that track their progress

use super::{
    impl_entity, AggregatedDepositStatus, DepositStatus, EventType, FileRole, Grant,
    PerformerRole, Policy, Publication, Repository, RepositoryCopy, Source, SubmissionStatus,
    User,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A request to deposit one publication into a set of repositories
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Submission {
    #[serde(skip)]
    pub id: Option<String>,
    /// Form data collected by the UI, as a JSON string
    pub metadata: Option<String>,
    pub source: Option<Source>,
    pub submitted: Option<bool>,
    pub submitted_date: Option<DateTime<Utc>>,
    pub submission_status: Option<SubmissionStatus>,
    pub aggregated_deposit_status: Option<AggregatedDepositStatus>,
    /// Used while the submitter has no PASS account yet
    pub submitter_name: Option<String>,
    pub submitter_email: Option<String>,

    #[serde(skip)]
    pub publication: Option<Box<Publication>>,
    #[serde(skip)]
    pub submitter: Option<Box<User>>,
    #[serde(skip)]
    pub repositories: Vec<Repository>,
    #[serde(skip)]
    pub preparers: Vec<User>,
    #[serde(skip)]
    pub grants: Vec<Grant>,
    #[serde(skip)]
    pub effective_policies: Vec<Policy>,
}

impl_entity!(Submission {
    one publication: "publication" => Publication,
    one submitter: "submitter" => User,
    many repositories: "repositories" => Repository,
    many preparers: "preparers" => User,
    many grants: "grants" => Grant,
    many effective_policies: "effectivePolicies" => Policy,
});

/// Transfer of a submission to one repository
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Deposit {
    #[serde(skip)]
    pub id: Option<String>,
    /// Repository-side reference used to poll the deposit's status
    pub deposit_status_ref: Option<String>,
    pub deposit_status: Option<DepositStatus>,

    #[serde(skip)]
    pub submission: Option<Box<Submission>>,
    #[serde(skip)]
    pub repository: Option<Box<Repository>>,
    #[serde(skip)]
    pub repository_copy: Option<Box<RepositoryCopy>>,
}

impl_entity!(Deposit {
    one submission: "submission" => Submission,
    one repository: "repository" => Repository,
    one repository_copy: "repositoryCopy" => RepositoryCopy,
});

/// A file attached to a submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct File {
    #[serde(skip)]
    pub id: Option<String>,
    pub name: Option<String>,
    pub uri: Option<String>,
    pub description: Option<String>,
    pub file_role: Option<FileRole>,
    pub mime_type: Option<String>,

    #[serde(skip)]
    pub submission: Option<Box<Submission>>,
}

impl_entity!(File {
    one submission: "submission" => Submission,
});

/// An action taken on a submission during review
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmissionEvent {
    #[serde(skip)]
    pub id: Option<String>,
    pub event_type: Option<EventType>,
    pub performed_date: Option<DateTime<Utc>>,
    pub performer_role: Option<PerformerRole>,
    pub comment: Option<String>,
    pub link: Option<String>,

    #[serde(skip)]
    pub performed_by: Option<Box<User>>,
    #[serde(skip)]
    pub submission: Option<Box<Submission>>,
}

impl_entity!(SubmissionEvent {
    one performed_by: "performedBy" => User,
    one submission: "submission" => Submission,
});
