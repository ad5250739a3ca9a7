//! Room-level domain types shared by the statistics engine and the services.

use serde::Serialize;

use crate::dao::models::ParticipantEntity;

/// Closed set of roles a participant can hold, computed once per snapshot
/// instead of re-deriving flag combinations at every use site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Room creator who also casts votes.
    HostParticipant,
    /// Regular voting participant.
    Participant,
    /// Observer who never votes; may or may not be the host.
    Facilitator,
}

impl Role {
    /// Derive the role from the stored flag pair.
    pub fn from_flags(is_host: bool, is_participant: bool) -> Self {
        match (is_host, is_participant) {
            (true, true) => Role::HostParticipant,
            (_, false) => Role::Facilitator,
            (false, true) => Role::Participant,
        }
    }

    /// Role of a stored participant record.
    pub fn of(participant: &ParticipantEntity) -> Self {
        Self::from_flags(participant.is_host, participant.is_participant)
    }

    /// Whether this role takes part in voting at all.
    pub fn votes(self) -> bool {
        !matches!(self, Role::Facilitator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_matrix_is_closed() {
        assert_eq!(Role::from_flags(true, true), Role::HostParticipant);
        assert_eq!(Role::from_flags(true, false), Role::Facilitator);
        assert_eq!(Role::from_flags(false, false), Role::Facilitator);
        assert_eq!(Role::from_flags(false, true), Role::Participant);
    }

    #[test]
    fn only_facilitators_sit_out() {
        assert!(Role::HostParticipant.votes());
        assert!(Role::Participant.votes());
        assert!(!Role::Facilitator.votes());
    }
}
