//! Gmail search-query construction and job validation
//!
//! A selection (operation × category × age bucket × count) is validated
//! into an immutable [`JobRequest`]. Recover operations always target
//! the trash scope and never carry an age clause; the backend does not
//! combine `in:trash` with age filters reliably.

use crate::error::ValidationErrors;
use std::fmt;
use std::str::FromStr;

/// Inclusive bounds on the number of emails a single job may touch
pub const MIN_EMAILS: u32 = 1;
pub const MAX_EMAILS: u32 = 10_000;

/// Mailbox category a delete job targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Promotions,
    Social,
    Updates,
    Forums,
    Spam,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Promotions,
        Category::Social,
        Category::Updates,
        Category::Forums,
        Category::Spam,
    ];

    /// The Gmail search token for this category
    pub fn token(self) -> &'static str {
        match self {
            Category::Promotions => "category:promotions",
            Category::Social => "category:social",
            Category::Updates => "category:updates",
            Category::Forums => "category:forums",
            // Spam is a scope, not a category, in Gmail's query syntax
            Category::Spam => "in:spam",
        }
    }

    /// Short name used on the command line
    pub fn name(self) -> &'static str {
        match self {
            Category::Promotions => "promotions",
            Category::Social => "social",
            Category::Updates => "updates",
            Category::Forums => "forums",
            Category::Spam => "spam",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| format!("unknown category '{}' (expected one of: promotions, social, updates, forums, spam)", s))
    }
}

/// Age lower bound for delete jobs, as a Gmail `older_than:` bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBucket {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 5] = [
        AgeBucket::OneMonth,
        AgeBucket::ThreeMonths,
        AgeBucket::SixMonths,
        AgeBucket::OneYear,
        AgeBucket::TwoYears,
    ];

    /// The Gmail `older_than:` suffix for this bucket
    pub fn token(self) -> &'static str {
        match self {
            AgeBucket::OneMonth => "30d",
            AgeBucket::ThreeMonths => "90d",
            AgeBucket::SixMonths => "6m",
            AgeBucket::OneYear => "1y",
            AgeBucket::TwoYears => "2y",
        }
    }
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for AgeBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgeBucket::ALL
            .into_iter()
            .find(|b| b.token() == s)
            .ok_or_else(|| format!("unknown age bucket '{}' (expected one of: 30d, 90d, 6m, 1y, 2y)", s))
    }
}

/// Direction of a bulk job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Move matching mail to trash
    Delete,
    /// Move mail out of trash
    Recover,
}

/// Build the Gmail search query for a selection.
///
/// Recover always yields exactly `in:trash`; any selected age bucket is
/// ignored. Delete yields the category token plus an optional
/// ` older_than:` clause, or an empty string when no category is
/// selected (which blocks submission downstream).
pub fn build_query(
    kind: OperationKind,
    category: Option<Category>,
    age: Option<AgeBucket>,
) -> String {
    match kind {
        OperationKind::Recover => "in:trash".to_string(),
        OperationKind::Delete => {
            let Some(category) = category else {
                return String::new();
            };
            match age {
                Some(age) => format!("{} older_than:{}", category.token(), age.token()),
                None => category.token().to_string(),
            }
        }
    }
}

/// What the user picked, before validation
#[derive(Debug, Clone, Copy)]
pub struct JobSelection {
    pub kind: OperationKind,
    pub category: Option<Category>,
    pub age: Option<AgeBucket>,
    pub max_emails: u32,
}

impl JobSelection {
    /// Validate the selection into an immutable request.
    ///
    /// Errors are field-keyed and block submission while any exist.
    pub fn validate(&self) -> Result<JobRequest, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.kind == OperationKind::Delete {
            if self.category.is_none() {
                errors.add("category", "Select a category to delete from");
            }
            if self.age.is_none() {
                errors.add("older_than", "Select an age bucket for deletion");
            }
        }

        if self.max_emails < MIN_EMAILS || self.max_emails > MAX_EMAILS {
            errors.add(
                "max_emails",
                format!(
                    "Email count must be between {} and {}",
                    MIN_EMAILS, MAX_EMAILS
                ),
            );
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let query = build_query(self.kind, self.category, self.age);
        if query.is_empty() {
            // Unreachable given the checks above, but an empty filter
            // must never be submitted
            errors.add("category", "The derived filter is empty");
            return Err(errors);
        }

        Ok(JobRequest {
            kind: self.kind,
            query,
            max_emails: self.max_emails,
        })
    }
}

/// A validated, immutable bulk-job request
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    kind: OperationKind,
    query: String,
    max_emails: u32,
}

impl JobRequest {
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// The derived Gmail search query
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn max_emails(&self) -> u32 {
        self.max_emails
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection(kind: OperationKind) -> JobSelection {
        JobSelection {
            kind,
            category: Some(Category::Promotions),
            age: Some(AgeBucket::OneMonth),
            max_emails: 500,
        }
    }

    #[test]
    fn test_delete_query_combines_category_and_age() {
        let query = build_query(
            OperationKind::Delete,
            Some(Category::Spam),
            Some(AgeBucket::OneMonth),
        );
        assert_eq!(query, "in:spam older_than:30d");
    }

    #[test]
    fn test_delete_query_without_age() {
        let query = build_query(OperationKind::Delete, Some(Category::Social), None);
        assert_eq!(query, "category:social");
    }

    #[test]
    fn test_delete_query_without_category_is_empty() {
        let query = build_query(OperationKind::Delete, None, Some(AgeBucket::OneYear));
        assert_eq!(query, "");
    }

    #[test]
    fn test_recover_query_is_always_trash_scope() {
        // The age bucket is ignored for recover, whatever was selected
        for age in [None, Some(AgeBucket::OneMonth), Some(AgeBucket::TwoYears)] {
            let query = build_query(OperationKind::Recover, Some(Category::Promotions), age);
            assert_eq!(query, "in:trash");
        }
        let query = build_query(OperationKind::Recover, None, None);
        assert_eq!(query, "in:trash");
    }

    #[test]
    fn test_query_is_deterministic() {
        let a = build_query(
            OperationKind::Delete,
            Some(Category::Updates),
            Some(AgeBucket::SixMonths),
        );
        let b = build_query(
            OperationKind::Delete,
            Some(Category::Updates),
            Some(AgeBucket::SixMonths),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_validate_requires_category_for_delete() {
        let mut sel = selection(OperationKind::Delete);
        sel.category = None;
        let errors = sel.validate().unwrap_err();
        assert!(errors.field("category").is_some());
    }

    #[test]
    fn test_validate_requires_age_for_delete_only() {
        let mut sel = selection(OperationKind::Delete);
        sel.age = None;
        assert!(sel.validate().unwrap_err().field("older_than").is_some());

        let mut sel = selection(OperationKind::Recover);
        sel.age = None;
        sel.category = None;
        assert!(sel.validate().is_ok());
    }

    #[test]
    fn test_validate_email_count_bounds_inclusive() {
        let mut sel = selection(OperationKind::Delete);

        sel.max_emails = 0;
        assert!(sel.validate().unwrap_err().field("max_emails").is_some());

        sel.max_emails = 10_001;
        assert!(sel.validate().unwrap_err().field("max_emails").is_some());

        sel.max_emails = 1;
        assert!(sel.validate().is_ok());

        sel.max_emails = 10_000;
        assert!(sel.validate().is_ok());
    }

    #[test]
    fn test_validated_request_carries_derived_query() {
        let request = selection(OperationKind::Delete).validate().unwrap();
        assert_eq!(request.query(), "category:promotions older_than:30d");
        assert_eq!(request.max_emails(), 500);
        assert_eq!(request.kind(), OperationKind::Delete);
    }

    #[test]
    fn test_category_and_age_parse_from_cli_names() {
        assert_eq!("spam".parse::<Category>().unwrap(), Category::Spam);
        assert_eq!("30d".parse::<AgeBucket>().unwrap(), AgeBucket::OneMonth);
        assert!("junk".parse::<Category>().is_err());
        assert!("45d".parse::<AgeBucket>().is_err());
    }
}
