//! Enumerated attribute values and their wire spellings

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$variant_meta:meta])* $variant:ident => $wire:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Value as sent on the wire
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum! {
    /// Funding status of a grant
    AwardStatus {
        Active => "active",
        PreAward => "pre_award",
        Terminated => "terminated",
    }
}

wire_enum! {
    /// Outcome of transferring a submission to one repository
    DepositStatus {
        Submitted => "submitted",
        Rejected => "rejected",
        Failed => "failed",
        Accepted => "accepted",
    }
}

wire_enum! {
    /// Status of a publication's copy in a repository
    CopyStatus {
        Complete => "complete",
        InProgress => "in-progress",
        Stalled => "stalled",
        Accepted => "accepted",
        Rejected => "rejected",
    }
}

wire_enum! {
    /// How PASS hands submissions to a repository
    IntegrationType {
        /// Deposited and tracked by PASS
        Full => "full",
        /// Deposited by PASS, not tracked afterwards
        OneWay => "one-way",
        /// The submitter deposits through the repository's own site
        WebLink => "web-link",
    }
}

wire_enum! {
    FileRole {
        Supplemental => "supplemental",
        Manuscript => "manuscript",
        Figure => "figure",
        Table => "table",
    }
}

wire_enum! {
    /// Submitter-facing status of a submission
    SubmissionStatus {
        Draft => "draft",
        ManuscriptRequired => "manuscript-required",
        ApprovalRequested => "approval-requested",
        ChangesRequested => "changes-requested",
        Cancelled => "cancelled",
        Submitted => "submitted",
        NeedsAttention => "needs-attention",
        Complete => "complete",
    }
}

wire_enum! {
    /// Roll-up of the deposit statuses of a submission
    AggregatedDepositStatus {
        NotStarted => "not-started",
        InProgress => "in-progress",
        Failed => "failed",
        Accepted => "accepted",
        Rejected => "rejected",
    }
}

wire_enum! {
    /// Where a submission was started
    Source {
        Pass => "pass",
        Other => "other",
    }
}

wire_enum! {
    EventType {
        ApprovalRequestedNewuser => "approval-requested-newuser",
        ApprovalRequested => "approval-requested",
        ChangesRequested => "changes-requested",
        Cancelled => "cancelled",
        Submitted => "submitted",
    }
}

wire_enum! {
    PerformerRole {
        Preparer => "preparer",
        Submitter => "submitter",
    }
}

wire_enum! {
    /// PubMed Central participation method of a journal
    PmcParticipation {
        A => "A",
        B => "B",
    }
}

wire_enum! {
    UserRole {
        Admin => "admin",
        Submitter => "submitter",
    }
}
