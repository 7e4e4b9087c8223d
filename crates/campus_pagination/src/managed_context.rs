use serde::{Deserialize, Serialize};

pub const MANAGED_SCHOOL_HEADER: &str = "X-Managed-School-Id";
pub const MANAGED_BRANCH_HEADER: &str = "X-Managed-Branch-Id";
pub const MANAGED_COURSE_HEADER: &str = "X-Managed-Course-Id";

/// The school/branch/course an administrator is currently scoped to.
///
/// Sent with every request as `X-Managed-*` headers. Blank values are treated
/// as unset so a cleared form field never scopes a request to `""`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ManagedContext {
    school_id: Option<String>,
    branch_id: Option<String>,
    course_id: Option<String>,
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ManagedContext {
    pub fn new(
        school_id: Option<String>,
        branch_id: Option<String>,
        course_id: Option<String>,
    ) -> Self {
        ManagedContext {
            school_id: normalize(school_id),
            branch_id: normalize(branch_id),
            course_id: normalize(course_id),
        }
    }

    pub fn school_id(&self) -> Option<&str> {
        self.school_id.as_deref()
    }

    pub fn branch_id(&self) -> Option<&str> {
        self.branch_id.as_deref()
    }

    pub fn course_id(&self) -> Option<&str> {
        self.course_id.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.school_id.is_none() && self.branch_id.is_none() && self.course_id.is_none()
    }

    pub fn headers(&self) -> Vec<(&'static str, &str)> {
        [
            (MANAGED_SCHOOL_HEADER, self.school_id()),
            (MANAGED_BRANCH_HEADER, self.branch_id()),
            (MANAGED_COURSE_HEADER, self.course_id()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|value| (name, value)))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values_are_unset() {
        let context = ManagedContext::new(Some(" 12 ".into()), Some("  ".into()), None);

        assert_eq!(context.school_id(), Some("12"));
        assert_eq!(context.branch_id(), None);
        assert_eq!(context.headers(), vec![(MANAGED_SCHOOL_HEADER, "12")]);
    }

    #[test]
    fn test_empty_context() {
        let context = ManagedContext::new(Some(String::new()), None, None);
        assert!(context.is_empty());
        assert_eq!(context, ManagedContext::default());
    }
}
