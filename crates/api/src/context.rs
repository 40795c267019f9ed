use warehouse_auth::Role;

/// Authorized role for a request.
///
/// Inserted by the auth middleware once the token has been verified and the
/// role allowed for the request's verb.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RoleContext {
    role: Role,
}

impl RoleContext {
    pub fn new(role: Role) -> Self {
        Self { role }
    }

    pub fn role(&self) -> Role {
        self.role
    }
}
