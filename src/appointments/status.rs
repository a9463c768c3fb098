use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Appointment lifecycle
///
/// ```text
/// PENDING --approve--> APPROVE --start--> RUNNING --complete--> COMPLETED
///    |                    |
///    +--cancel--> CANCELLED
///    +--sweep---> EXPIRED <--sweep--+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppointmentStatus {
    Pending,
    Approve,
    Cancelled,
    Running,
    Completed,
    Expired,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 6] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Approve,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Running,
        AppointmentStatus::Completed,
        AppointmentStatus::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Approve => "APPROVE",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::Running => "RUNNING",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Expired => "EXPIRED",
        }
    }

    /// Case-insensitive
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Still occupies the vehicle
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Pending | AppointmentStatus::Approve | AppointmentStatus::Running
        )
    }

    pub fn is_final(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Cancelled | AppointmentStatus::Completed | AppointmentStatus::Expired
        )
    }

    /// Transitions an actor may request; EXPIRED is only set by the sweep
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        matches!(
            (self, next),
            (AppointmentStatus::Pending, AppointmentStatus::Approve)
                | (AppointmentStatus::Pending, AppointmentStatus::Cancelled)
                | (AppointmentStatus::Approve, AppointmentStatus::Running)
                | (AppointmentStatus::Running, AppointmentStatus::Completed)
        )
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for AppointmentStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("Unknown appointment status: {}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(AppointmentStatus::parse("approve"), Some(AppointmentStatus::Approve));
        assert_eq!(AppointmentStatus::parse(" Running "), Some(AppointmentStatus::Running));
        assert_eq!(AppointmentStatus::parse("approved"), None);
    }

    #[test]
    fn test_serde_uses_uppercase() {
        let json = serde_json::to_string(&AppointmentStatus::Cancelled).unwrap();
        assert_eq!(json, "\"CANCELLED\"");
    }

    #[test]
    fn test_lifecycle_path() {
        assert!(AppointmentStatus::Pending.can_transition_to(AppointmentStatus::Approve));
        assert!(AppointmentStatus::Approve.can_transition_to(AppointmentStatus::Running));
        assert!(AppointmentStatus::Running.can_transition_to(AppointmentStatus::Completed));
    }

    #[test]
    fn test_only_pending_can_be_cancelled() {
        assert!(AppointmentStatus::Pending.can_transition_to(AppointmentStatus::Cancelled));
        assert!(!AppointmentStatus::Approve.can_transition_to(AppointmentStatus::Cancelled));
        assert!(!AppointmentStatus::Running.can_transition_to(AppointmentStatus::Cancelled));
    }

    #[test]
    fn test_no_skipping_steps() {
        assert!(!AppointmentStatus::Pending.can_transition_to(AppointmentStatus::Running));
        assert!(!AppointmentStatus::Approve.can_transition_to(AppointmentStatus::Completed));
    }

    #[test]
    fn test_expired_not_requestable() {
        for status in AppointmentStatus::ALL {
            assert!(!status.can_transition_to(AppointmentStatus::Expired));
        }
    }

    fn status_strategy() -> impl Strategy<Value = AppointmentStatus> {
        prop::sample::select(AppointmentStatus::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_final_states_have_no_exits(from in status_strategy(), to in status_strategy()) {
            if from.is_final() {
                prop_assert!(!from.can_transition_to(to));
            }
        }

        #[test]
        fn prop_round_trips_through_string(status in status_strategy()) {
            prop_assert_eq!(AppointmentStatus::try_from(status.to_string()), Ok(status));
        }

        #[test]
        fn prop_transitions_never_self_loop(status in status_strategy()) {
            prop_assert!(!status.can_transition_to(status));
        }
    }
}
