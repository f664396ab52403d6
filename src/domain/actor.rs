use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Artisan,
    Buyer,
    Admin,
}

impl Role {
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "artisan" => Some(Role::Artisan),
            "buyer" => Some(Role::Buyer),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Artisan => "artisan",
            Role::Buyer => "buyer",
            Role::Admin => "admin",
        }
    }
}

/// Authorization facts resolved once per request and handed to the core
/// operations, instead of each operation re-querying who the caller is.
#[derive(Debug, Clone)]
pub struct ActorContext {
    pub user_id: Uuid,
    pub role: Role,
    /// The store this actor owns, when the actor is an artisan with one.
    pub store_id: Option<Uuid>,
}

impl ActorContext {
    pub fn owns_store(&self, store_id: Uuid) -> bool {
        self.store_id == Some(store_id)
    }

    pub fn is_artisan(&self) -> bool {
        self.role == Role::Artisan
    }
}
