//! Identity tokens and authenticated identities

use std::fmt;

/// Principal name of the unauthenticated user
pub const ANONYMOUS_USERNAME: &str = "anonymous";

/// Principal name reported for the internal system identity
pub const SYSTEM_USERNAME: &str = "SYSTEM";

/// Matrix string form of [`Sid::Everyone`]
pub const EVERYONE_SID: &str = "role_everyone";

/// Key of an ACL entry: a principal, a group, or everyone
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sid {
    Principal(String),
    Group(String),
    /// Matches any identity, consulted last
    Everyone,
}

impl Sid {
    pub fn principal(name: impl Into<String>) -> Self {
        Sid::Principal(name.into())
    }

    pub fn group(name: impl Into<String>) -> Self {
        Sid::Group(name.into())
    }

    /// The unauthenticated principal
    pub fn anonymous() -> Self {
        Sid::Principal(ANONYMOUS_USERNAME.to_string())
    }

    /// String used for this sid in persisted matrices.
    ///
    /// Principals and groups share one namespace there.
    pub fn as_matrix_str(&self) -> &str {
        match self {
            Sid::Principal(name) | Sid::Group(name) => name,
            Sid::Everyone => EVERYONE_SID,
        }
    }
}

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sid::Principal(name) => write!(f, "principal:{}", name),
            Sid::Group(name) => write!(f, "group:{}", name),
            Sid::Everyone => f.write_str("everyone"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthKind {
    User,
    Anonymous,
    System,
}

/// An identity already verified by the authentication layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authentication {
    principal: String,
    groups: Vec<String>,
    kind: AuthKind,
}

impl Authentication {
    /// An authenticated user with no groups
    pub fn user(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            groups: Vec::new(),
            kind: AuthKind::User,
        }
    }

    /// Replace the group memberships, keeping their order
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn anonymous() -> Self {
        Self {
            principal: ANONYMOUS_USERNAME.to_string(),
            groups: Vec::new(),
            kind: AuthKind::Anonymous,
        }
    }

    /// The internal identity that is always allowed.
    ///
    /// This constructor is the only way to obtain it; a realm user named
    /// `SYSTEM` is an ordinary user.
    pub fn system() -> Self {
        Self {
            principal: SYSTEM_USERNAME.to_string(),
            groups: Vec::new(),
            kind: AuthKind::System,
        }
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn is_system(&self) -> bool {
        self.kind == AuthKind::System
    }

    pub fn is_anonymous(&self) -> bool {
        self.kind == AuthKind::Anonymous
    }

    /// Candidate tokens in resolution order: principal, each group, everyone
    pub fn sids(&self) -> impl Iterator<Item = Sid> + '_ {
        std::iter::once(Sid::principal(self.principal.as_str()))
            .chain(self.groups.iter().map(|g| Sid::group(g.as_str())))
            .chain(std::iter::once(Sid::Everyone))
    }
}
