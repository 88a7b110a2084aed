//! Users, read-only levels and grants.

use std::collections::BTreeMap;
use std::fmt;

use parking_lot::RwLock;
use tracing::debug;

use super::error::CatalogError;
use crate::datum::Value;
use crate::sql::Privilege;

/// Read-only restriction of a user or session.
///
/// Levels are ordered: a stricter level never allows more than a looser one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ReadOnlyLevel {
    /// No restriction.
    #[default]
    ReadWrite,
    /// Reads only; settings may not be changed.
    ReadOnly,
    /// Reads only; settings other than `readonly` may be changed.
    ReadOnlyKeepSettings,
}

impl ReadOnlyLevel {
    /// Converts the numeric level (0, 1 or 2).
    pub fn from_u64(level: u64) -> Option<ReadOnlyLevel> {
        match level {
            0 => Some(ReadOnlyLevel::ReadWrite),
            1 => Some(ReadOnlyLevel::ReadOnly),
            2 => Some(ReadOnlyLevel::ReadOnlyKeepSettings),
            _ => None,
        }
    }

    /// Converts a setting value. Accepts integers, numeric strings and booleans.
    pub fn from_value(value: &Value) -> Option<ReadOnlyLevel> {
        match value {
            Value::Bool(b) => Some(if *b {
                ReadOnlyLevel::ReadOnly
            } else {
                ReadOnlyLevel::ReadWrite
            }),
            Value::String(s) => s.trim().parse().ok().and_then(Self::from_u64),
            other => other.to_u64().and_then(Self::from_u64),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            ReadOnlyLevel::ReadWrite => 0,
            ReadOnlyLevel::ReadOnly => 1,
            ReadOnlyLevel::ReadOnlyKeepSettings => 2,
        }
    }

    pub fn is_read_only(self) -> bool {
        self != ReadOnlyLevel::ReadWrite
    }
}

impl fmt::Display for ReadOnlyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Resolved ON clause of a grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantScope {
    /// `*.*`
    Global,
    /// `db.*`
    Database(String),
    /// `db.table`
    Table { database: String, name: String },
}

impl GrantScope {
    fn contains(&self, database: &str, table: &str) -> bool {
        match self {
            GrantScope::Global => true,
            GrantScope::Database(db) => db == database,
            GrantScope::Table { database: db, name } => db == database && name == table,
        }
    }
}

/// A privilege on a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub privilege: Privilege,
    pub scope: GrantScope,
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: String,
    /// `None` accepts any password.
    pub password: Option<String>,
    pub readonly: ReadOnlyLevel,
    /// Users defined in the server config may do anything.
    pub full_access: bool,
    pub grants: Vec<Grant>,
}

impl User {
    /// Creates a config-defined user with full access.
    pub fn new(name: impl Into<String>, password: Option<String>, readonly: ReadOnlyLevel) -> Self {
        Self {
            name: name.into(),
            password,
            readonly,
            full_access: true,
            grants: vec![],
        }
    }

    /// Returns true if the user may exercise `privilege` on `database.table`.
    pub fn has_privilege(&self, privilege: Privilege, database: &str, table: &str) -> bool {
        self.full_access
            || self
                .grants
                .iter()
                .any(|g| g.privilege.covers(privilege) && g.scope.contains(database, table))
    }
}

/// Thread-safe user registry.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: RwLock<BTreeMap<String, User>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user.
    pub fn add(&self, user: User) {
        self.users.write().insert(user.name.clone(), user);
    }

    /// Checks credentials and returns the user.
    pub fn authenticate(&self, name: &str, password: &str) -> Result<User, CatalogError> {
        let users = self.users.read();
        match users.get(name) {
            Some(user) if user.password.as_deref().is_none_or(|p| p == password) => {
                Ok(user.clone())
            }
            _ => Err(CatalogError::AuthenticationFailed {
                name: name.to_string(),
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<User> {
        self.users.read().get(name).cloned()
    }

    /// Creates a user with no grants.
    pub fn create(
        &self,
        name: &str,
        password: Option<String>,
        readonly: ReadOnlyLevel,
        if_not_exists: bool,
    ) -> Result<bool, CatalogError> {
        let mut users = self.users.write();
        if users.contains_key(name) {
            if if_not_exists {
                return Ok(false);
            }
            return Err(CatalogError::UserAlreadyExists {
                name: name.to_string(),
            });
        }
        users.insert(
            name.to_string(),
            User {
                name: name.to_string(),
                password,
                readonly,
                full_access: false,
                grants: vec![],
            },
        );
        debug!(user = name, %readonly, "user created");
        Ok(true)
    }

    /// Drops users. Without `if_exists` nothing is dropped unless every user
    /// exists.
    pub fn drop_users(&self, names: &[String], if_exists: bool) -> Result<usize, CatalogError> {
        let mut users = self.users.write();
        if !if_exists
            && let Some(missing) = names.iter().find(|n| !users.contains_key(n.as_str()))
        {
            return Err(CatalogError::UnknownUser {
                name: missing.clone(),
            });
        }
        let dropped = names
            .iter()
            .filter(|n| users.remove(n.as_str()).is_some())
            .count();
        debug!(dropped, "users dropped");
        Ok(dropped)
    }

    /// Grants `privileges` on `scope` to every grantee.
    pub fn grant(
        &self,
        grantees: &[String],
        privileges: &[Privilege],
        scope: GrantScope,
    ) -> Result<(), CatalogError> {
        let mut users = self.users.write();
        if let Some(missing) = grantees.iter().find(|n| !users.contains_key(n.as_str())) {
            return Err(CatalogError::UnknownUser {
                name: missing.clone(),
            });
        }
        for name in grantees {
            if let Some(user) = users.get_mut(name) {
                for &privilege in privileges {
                    let grant = Grant {
                        privilege,
                        scope: scope.clone(),
                    };
                    if !user.grants.contains(&grant) {
                        user.grants.push(grant);
                    }
                }
            }
        }
        Ok(())
    }

    /// Looks up the user and checks a privilege. Unknown users have none.
    pub fn check_privilege(
        &self,
        name: &str,
        privilege: Privilege,
        database: &str,
        table: &str,
    ) -> bool {
        self.users
            .read()
            .get(name)
            .is_some_and(|u| u.has_privilege(privilege, database, table))
    }

    /// All users ordered by name.
    pub fn list(&self) -> Vec<User> {
        self.users.read().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> UserDirectory {
        let users = UserDirectory::new();
        users.add(User::new("default", None, ReadOnlyLevel::ReadWrite));
        users.add(User::new(
            "ro",
            Some("secret".to_string()),
            ReadOnlyLevel::ReadOnlyKeepSettings,
        ));
        users
    }

    #[test]
    fn test_read_only_level_conversions() {
        assert_eq!(ReadOnlyLevel::from_u64(2), Some(ReadOnlyLevel::ReadOnlyKeepSettings));
        assert_eq!(ReadOnlyLevel::from_u64(3), None);
        assert_eq!(
            ReadOnlyLevel::from_value(&Value::String("1".to_string())),
            Some(ReadOnlyLevel::ReadOnly)
        );
        assert_eq!(
            ReadOnlyLevel::from_value(&Value::Bool(false)),
            Some(ReadOnlyLevel::ReadWrite)
        );
        assert!(ReadOnlyLevel::ReadOnly < ReadOnlyLevel::ReadOnlyKeepSettings);
        assert_eq!(ReadOnlyLevel::ReadOnlyKeepSettings.to_string(), "2");
    }

    #[test]
    fn test_authenticate() {
        let users = directory();
        assert_eq!(users.authenticate("default", "anything").unwrap().name, "default");
        assert_eq!(
            users.authenticate("ro", "secret").unwrap().readonly,
            ReadOnlyLevel::ReadOnlyKeepSettings
        );
        assert!(matches!(
            users.authenticate("ro", "wrong"),
            Err(CatalogError::AuthenticationFailed { .. })
        ));
        assert!(users.authenticate("nobody", "").is_err());
    }

    #[test]
    fn test_create_and_drop_users() {
        let users = directory();
        assert_eq!(users.create("u1", None, ReadOnlyLevel::ReadOnly, false), Ok(true));
        assert_eq!(users.create("u1", None, ReadOnlyLevel::ReadOnly, true), Ok(false));
        assert!(matches!(
            users.create("u1", None, ReadOnlyLevel::ReadOnly, false),
            Err(CatalogError::UserAlreadyExists { .. })
        ));

        let names = vec!["u1".to_string(), "u2".to_string()];
        assert!(matches!(
            users.drop_users(&names, false),
            Err(CatalogError::UnknownUser { .. })
        ));
        assert!(users.get("u1").is_some());
        assert_eq!(users.drop_users(&names, true), Ok(1));
        assert!(users.get("u1").is_none());
    }

    #[test]
    fn test_grants() {
        let users = directory();
        users.create("writer", None, ReadOnlyLevel::ReadWrite, false).unwrap();
        assert!(!users.check_privilege("writer", Privilege::Insert, "db", "t"));

        users
            .grant(
                &["writer".to_string()],
                &[Privilege::Insert],
                GrantScope::Table {
                    database: "db".to_string(),
                    name: "t".to_string(),
                },
            )
            .unwrap();
        assert!(users.check_privilege("writer", Privilege::Insert, "db", "t"));
        assert!(!users.check_privilege("writer", Privilege::Insert, "db", "other"));
        assert!(!users.check_privilege("writer", Privilege::Delete, "db", "t"));

        users
            .grant(
                &["writer".to_string()],
                &[Privilege::All],
                GrantScope::Database("db".to_string()),
            )
            .unwrap();
        assert!(users.check_privilege("writer", Privilege::Delete, "db", "other"));
        assert!(!users.check_privilege("writer", Privilege::Delete, "elsewhere", "t"));

        // Config users have full access.
        assert!(users.check_privilege("default", Privilege::Delete, "any", "table"));
        assert!(
            users
                .grant(&["ghost".to_string()], &[Privilege::Select], GrantScope::Global)
                .is_err()
        );
    }
}
