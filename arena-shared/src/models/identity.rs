use serde::{Deserialize, Serialize};

use crate::pii::Masked;
use crate::ClubId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Guest,
    Player,
    ClubAdmin,
    SuperAdmin,
}

/// The acting user, handed to the flow explicitly instead of being read from
/// ambient auth storage at call time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
    #[serde(default)]
    pub phone_number: Option<Masked<String>>,
    #[serde(default)]
    pub managed_club_ids: Vec<ClubId>,
    #[serde(default)]
    pub token: Option<Masked<String>>,
}

/// Whose active intents to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveScope {
    /// The player's own intents.
    Player,
    /// All pending intents of a club the admin manages.
    Club(ClubId),
}

impl Identity {
    pub fn player(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Player,
            phone_number: None,
            managed_club_ids: Vec::new(),
            token: None,
        }
    }

    pub fn club_admin(user_id: impl Into<String>, club_ids: Vec<ClubId>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::ClubAdmin,
            phone_number: None,
            managed_club_ids: club_ids,
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(Masked(token.into()));
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.role != Role::Guest
    }

    /// Admins book on behalf of a player and must name the player's phone.
    pub fn is_proxy_booker(&self) -> bool {
        matches!(self.role, Role::ClubAdmin | Role::SuperAdmin)
    }

    pub fn manages(&self, club_id: ClubId) -> bool {
        match self.role {
            Role::SuperAdmin => true,
            Role::ClubAdmin => self.managed_club_ids.contains(&club_id),
            _ => false,
        }
    }

    /// Admins see the club's pending intents, everyone else sees their own.
    pub fn active_scope(&self, club_id: Option<ClubId>) -> ActiveScope {
        match club_id {
            Some(club_id) if self.manages(club_id) => ActiveScope::Club(club_id),
            _ => ActiveScope::Player,
        }
    }
}
