use serde::{Deserialize, Serialize};

/// Authenticated user as supplied by the auth collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable id; scopes thread ownership
    pub id: String,
    pub display_name: Option<String>,
}

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
        }
    }
    
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
    
    /// First character of the display name, for avatars
    pub fn initial(&self) -> Option<char> {
        self.display_name.as_deref()?.chars().next()
    }
}
