//! Per-token details and the aggregated pool report

use std::collections::{BTreeMap, BTreeSet};

use graphql_probe::GraphQlError;
use serde::Serialize;

/// Health of one token for one check. Derived on every check, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStatus {
    Valid,
    Exhausted,
    Expired,
    Suspended,
    Error,
}

impl TokenStatus {
    pub const ALL: [TokenStatus; 5] = [
        TokenStatus::Valid,
        TokenStatus::Expired,
        TokenStatus::Exhausted,
        TokenStatus::Suspended,
        TokenStatus::Error,
    ];

    /// Status label for the report and for logging.
    pub fn label(&self) -> &'static str {
        match self {
            TokenStatus::Valid => "valid",
            TokenStatus::Exhausted => "exhausted",
            TokenStatus::Expired => "expired",
            TokenStatus::Suspended => "suspended",
            TokenStatus::Error => "error",
        }
    }
}

/// Detail record for one token. The shape depends on the status; the JSON
/// form always carries a `"status"` tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TokenDetail {
    Valid {
        remaining: u64,
    },
    /// `reset_in` is signed: negative when the reset time already passed by
    /// our clock. Absent when the upstream gave no usable reset time.
    Exhausted {
        remaining: u64,
        #[serde(rename = "resetIn", skip_serializing_if = "Option::is_none")]
        reset_in: Option<i64>,
    },
    Expired,
    Suspended,
    Error {
        error: GraphQlError,
    },
}

impl TokenDetail {
    pub fn status(&self) -> TokenStatus {
        match self {
            TokenDetail::Valid { .. } => TokenStatus::Valid,
            TokenDetail::Exhausted { .. } => TokenStatus::Exhausted,
            TokenDetail::Expired => TokenStatus::Expired,
            TokenDetail::Suspended => TokenStatus::Suspended,
            TokenDetail::Error { .. } => TokenStatus::Error,
        }
    }
}

/// Outcome of a complete pool check.
///
/// The five buckets partition the pool: every key in `details` appears in
/// exactly one bucket. Buckets and `details` are ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PoolReport {
    #[serde(rename = "validPATs")]
    pub valid: BTreeSet<String>,
    #[serde(rename = "expiredPATs")]
    pub expired: BTreeSet<String>,
    #[serde(rename = "exhaustedPATs")]
    pub exhausted: BTreeSet<String>,
    #[serde(rename = "suspendedPATs")]
    pub suspended: BTreeSet<String>,
    #[serde(rename = "errorPATs")]
    pub error: BTreeSet<String>,
    pub details: BTreeMap<String, TokenDetail>,
}

impl PoolReport {
    /// Bucket every detail by its status.
    pub fn from_details(details: BTreeMap<String, TokenDetail>) -> Self {
        let mut report = PoolReport::default();
        for (pat, detail) in &details {
            report.bucket_mut(detail.status()).insert(pat.clone());
        }
        report.details = details;
        report
    }

    pub fn bucket(&self, status: TokenStatus) -> &BTreeSet<String> {
        match status {
            TokenStatus::Valid => &self.valid,
            TokenStatus::Exhausted => &self.exhausted,
            TokenStatus::Expired => &self.expired,
            TokenStatus::Suspended => &self.suspended,
            TokenStatus::Error => &self.error,
        }
    }

    fn bucket_mut(&mut self, status: TokenStatus) -> &mut BTreeSet<String> {
        match status {
            TokenStatus::Valid => &mut self.valid,
            TokenStatus::Exhausted => &mut self.exhausted,
            TokenStatus::Expired => &mut self.expired,
            TokenStatus::Suspended => &mut self.suspended,
            TokenStatus::Error => &mut self.error,
        }
    }

    /// Number of tokens checked.
    pub fn len(&self) -> usize {
        self.details.len()
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    /// Bucket sizes, in report order.
    pub fn counts(&self) -> [(TokenStatus, usize); 5] {
        TokenStatus::ALL.map(|status| (status, self.bucket(status).len()))
    }
}
