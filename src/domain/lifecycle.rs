/// Soft-delete state for stores, products and reviews. A `Hidden` entity
/// stays in storage so order history keeps resolving, but it is excluded
/// from public listings and accepts no new orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Active,
    Hidden,
}

impl Lifecycle {
    pub fn parse(value: &str) -> Option<Lifecycle> {
        match value {
            "active" => Some(Lifecycle::Active),
            "hidden" => Some(Lifecycle::Hidden),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Active => "active",
            Lifecycle::Hidden => "hidden",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Lifecycle::Active)
    }
}
