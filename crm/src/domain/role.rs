//! Staff roles and the departments that carry them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::DepartmentId;

/// The three staff roles. A user's role is the name of their department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Sales staff owning clients and contracts.
    Commercial,
    /// Staff running events on site.
    Support,
    /// Management with administrative rights.
    Gestion,
}

impl Role {
    /// Every role, in seeding order.
    pub const ALL: [Self; 3] = [Self::Commercial, Self::Support, Self::Gestion];

    /// Department name backing this role.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Commercial => "commercial",
            Self::Support => "support",
            Self::Gestion => "gestion",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Department name that matches no role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown department '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| UnknownRole(raw.trim().to_owned()))
    }
}

/// Department record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub description: Option<String>,
}

impl Department {
    /// Role carried by this department, if its name is a known role.
    pub fn role(&self) -> Option<Role> {
        self.name.parse().ok()
    }
}

/// Department to insert during initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDepartment {
    pub name: String,
    pub description: Option<String>,
}

impl NewDepartment {
    /// Seed row for a role.
    pub fn for_role(role: Role) -> Self {
        Self {
            name: role.as_str().to_owned(),
            description: Some(format!("Department {}", role.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("commercial", Role::Commercial)]
    #[case("Support", Role::Support)]
    #[case(" GESTION ", Role::Gestion)]
    fn parses_department_names(#[case] raw: &str, #[case] expected: Role) {
        assert_eq!(raw.parse::<Role>(), Ok(expected));
    }

    #[rstest]
    #[case("marketing")]
    #[case("")]
    fn rejects_unknown_departments(#[case] raw: &str) {
        assert!(raw.parse::<Role>().is_err());
    }

    #[rstest]
    fn department_role_follows_name() {
        let department = Department {
            id: DepartmentId::new(1),
            name: "support".to_owned(),
            description: None,
        };
        assert_eq!(department.role(), Some(Role::Support));
    }

    #[rstest]
    fn seed_rows_describe_the_role() {
        let seed = NewDepartment::for_role(Role::Gestion);
        assert_eq!(seed.name, "gestion");
        assert_eq!(seed.description.as_deref(), Some("Department gestion"));
    }
}
