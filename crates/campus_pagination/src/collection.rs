use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// REST collections served by the school-management backend.
#[derive(Deserialize, Serialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Classes,
    Owners,
    Customers,
}

impl Collection {
    /// Path segment of the collection, relative to the API base URL.
    pub fn segment(&self) -> &'static str {
        match self {
            Collection::Classes => "classes",
            Collection::Owners => "owners",
            Collection::Customers => "customers",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segment())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "classes" => Ok(Collection::Classes),
            "owners" => Ok(Collection::Owners),
            "customers" => Ok(Collection::Customers),
            other => Err(format!("Unknown collection: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collection() {
        assert_eq!("Owners".parse::<Collection>(), Ok(Collection::Owners));
        assert!("teachers".parse::<Collection>().is_err());
        assert_eq!(Collection::Customers.segment(), "customers");
    }
}
