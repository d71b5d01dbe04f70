//! Member profile capability and its mock.

use std::cell::Cell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::config::PortalConfig;
use crate::latency::latency;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemberError {
    #[error("no member with id `{member_id}`")]
    NotFound { member_id: String },
    #[error("network error")]
    Network,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoverageType {
    Medical,
    Dental,
    Vision,
    Pharmacy,
}

impl fmt::Display for CoverageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CoverageType::Medical => "Medical",
            CoverageType::Dental => "Dental",
            CoverageType::Vision => "Vision",
            CoverageType::Pharmacy => "Pharmacy",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub street1: String,
    pub street2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub member_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    /// ISO 8601 date.
    pub date_of_birth: String,
    pub address: Address,
    pub group_number: String,
    pub subscriber_id: String,
    pub active_coverages: Vec<CoverageType>,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberCard {
    pub member_id: String,
    pub member_name: String,
    pub member_number: String,
    pub group_number: String,
    pub plan_name: String,
    pub coverage_type: CoverageType,
    pub copay_primary: Option<String>,
    pub copay_specialist: Option<String>,
    pub copay_er: Option<String>,
    pub deductible: Option<String>,
    pub out_of_pocket_max: Option<String>,
}

pub type FetchFuture<T> = Pin<Box<dyn Future<Output = Result<T, MemberError>>>>;

pub trait MemberService {
    fn member(&self, member_id: &str) -> FetchFuture<Member>;
    fn member_card(&self, member_id: &str, coverage: CoverageType) -> FetchFuture<MemberCard>;
}

/// Serves the same demo profile for every non-empty member id.
pub struct MockMemberService {
    member_name: String,
    latency: u32,
    fetches: Cell<u32>,
}

impl MockMemberService {
    pub fn new(config: &PortalConfig) -> Self {
        Self {
            member_name: config.demo_member_name.clone(),
            latency: config.fetch_latency,
            fetches: Cell::new(0),
        }
    }

    /// Number of fetches started so far.
    pub fn fetches(&self) -> u32 {
        self.fetches.get()
    }

    fn respond<T: 'static>(&self, result: Result<T, MemberError>) -> FetchFuture<T> {
        self.fetches.set(self.fetches.get() + 1);
        let delay = latency(self.latency);
        Box::pin(async move {
            delay.await;
            result
        })
    }
}

fn split_name(name: &str) -> (String, String) {
    match name.split_once(' ') {
        Some((first, last)) => (first.to_string(), last.to_string()),
        None => (name.to_string(), String::new()),
    }
}

fn not_found<T>(member_id: &str) -> Result<T, MemberError> {
    Err(MemberError::NotFound {
        member_id: member_id.to_string(),
    })
}

impl MemberService for MockMemberService {
    fn member(&self, member_id: &str) -> FetchFuture<Member> {
        if member_id.is_empty() {
            return self.respond(not_found(member_id));
        }
        let (first_name, last_name) = split_name(&self.member_name);
        self.respond(Ok(Member {
            member_id: member_id.to_string(),
            email: format!("{}.{}@email.com", first_name, last_name).to_lowercase(),
            first_name,
            last_name,
            phone: "+1-555-123-4567".into(),
            date_of_birth: "1985-06-15".into(),
            address: Address {
                street1: "123 Main Street".into(),
                street2: Some("Apt 4B".into()),
                city: "San Francisco".into(),
                state: "CA".into(),
                zip_code: "94105".into(),
            },
            group_number: "GRP001234".into(),
            subscriber_id: "SUB123456".into(),
            active_coverages: vec![
                CoverageType::Medical,
                CoverageType::Dental,
                CoverageType::Vision,
                CoverageType::Pharmacy,
            ],
        }))
    }

    fn member_card(&self, member_id: &str, coverage: CoverageType) -> FetchFuture<MemberCard> {
        if member_id.is_empty() {
            return self.respond(not_found(member_id));
        }
        self.respond(Ok(MemberCard {
            member_id: member_id.to_string(),
            member_name: self.member_name.clone(),
            member_number: "SUB123456".into(),
            group_number: "GRP001234".into(),
            plan_name: "Premium Health Plan".into(),
            coverage_type: coverage,
            copay_primary: Some("$20".into()),
            copay_specialist: Some("$40".into()),
            copay_er: Some("$150".into()),
            deductible: Some("$1,500".into()),
            out_of_pocket_max: Some("$6,000".into()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_profile_uses_configured_name() {
        assert_eq!(
            split_name("John Doe"),
            ("John".to_string(), "Doe".to_string())
        );
        assert_eq!(split_name("Cher"), ("Cher".to_string(), String::new()));
    }

    #[test]
    fn fetches_are_counted_even_when_they_fail() {
        let service = MockMemberService::new(&PortalConfig::default());
        drop(service.member(""));
        drop(service.member_card("M123456", CoverageType::Dental));
        assert_eq!(service.fetches(), 2);
    }
}
