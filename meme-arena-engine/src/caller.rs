use meme_arena_shared::types::UserId;

/// An identified caller, as vouched for by the upstream auth gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub display_name: String,
}

impl Caller {
    /// Builds a caller from raw identity values. A blank user id is no identity.
    ///
    /// The display name falls back to the user id.
    pub fn from_parts(user_id: &str, display_name: Option<&str>) -> Option<Self> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return None;
        }
        let display_name = display_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(user_id);
        Some(Self {
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
        })
    }
}
