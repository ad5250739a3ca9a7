//! Per-viewer room session state machine.
//!
//! Reconciles the stream of room snapshots into the phases a connected client
//! moves through, and detects the asynchronous hazards that a naive
//! snapshot-to-screen mapping misses: the room vanishing, the two-phase
//! `deleting` marker, the viewer being kicked, and stale reset notices.
//!
//! The machine is a plain reducer: feed it observations, get effects back. It
//! owns no I/O and no timers, so every transition is unit-testable; the watch
//! service interprets the effects.

use std::time::Duration;

use crate::dao::models::{RoomEntity, RoomStatus};

/// Phase a viewer's session is in, derived from snapshot history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No snapshot observed yet.
    Loading,
    /// Room absent (or `deleting`) on first contact; terminal for this viewer.
    RoomMissing,
    /// Room exists but the viewer holds no identity for it yet.
    AwaitingName,
    /// Normal operation.
    Active,
    /// Room deleted or viewer removed while active; stream must end.
    TornDown,
}

/// Redirect delays handed to clients alongside teardown notices.
#[derive(Debug, Clone, Copy)]
pub struct SessionDelays {
    /// After an externally-initiated deletion notice.
    pub deleted_redirect: Duration,
    /// When the viewer deleted the room themselves (no notice shown).
    pub self_deleted_redirect: Duration,
    /// After a kick notice; longer so the message can be read.
    pub kicked_redirect: Duration,
}

/// User-facing notices produced by hazard detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionNotice {
    /// The room was never there (bad code or already cleaned up).
    RoomMissing,
    /// The room node disappeared while the viewer was active.
    RoomDeleted,
    /// The room is flagged `deleting`; removal is imminent.
    RoomDeleting,
    /// The host removed the viewer from the room.
    Kicked,
    /// The host cleared every vote.
    VotesReset,
}

/// Instructions for the layer driving this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    /// Deliver the current room snapshot to the viewer.
    EmitSnapshot,
    /// Ask the viewer for a display name before joining.
    PromptForName,
    /// Surface a notice to the viewer.
    Notice(SessionNotice),
    /// Tell the viewer to navigate away after the given delay.
    Redirect {
        /// How long the client should keep the notice on screen first.
        after: Duration,
    },
    /// Forget the viewer's identity for this room.
    ClearIdentity,
    /// Stop consuming snapshots; the stream is over.
    Unsubscribe,
}

/// One observed update from the room subscription.
#[derive(Debug, Clone, Copy)]
pub enum Observation<'a> {
    /// The room node does not exist.
    Missing,
    /// The full current subtree.
    Snapshot(&'a RoomEntity),
}

/// Reducer tracking one viewer's relationship with one room.
#[derive(Debug)]
pub struct SessionMachine {
    phase: SessionPhase,
    session_id: Option<String>,
    is_host: bool,
    delays: SessionDelays,
    /// Viewer was present in the previous snapshot.
    was_present: bool,
    /// Previous snapshot had at least one participant; guards the kick check
    /// against firing on the initial load.
    prev_nonempty: bool,
    /// Last reset timestamp already surfaced, so each reset notifies once.
    last_reset_seen: Option<i64>,
}

impl SessionMachine {
    /// Build a machine for a viewer; `session_id` is `None` for clients that
    /// have not joined the room yet.
    pub fn new(session_id: Option<String>, is_host: bool, delays: SessionDelays) -> Self {
        Self {
            phase: SessionPhase::Loading,
            session_id,
            is_host,
            delays,
            was_present: false,
            prev_nonempty: false,
            last_reset_seen: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Attach an identity after the viewer joined mid-stream.
    pub fn attach_identity(&mut self, session_id: String, is_host: bool) {
        self.session_id = Some(session_id);
        self.is_host = is_host;
        if self.phase == SessionPhase::AwaitingName {
            self.phase = SessionPhase::Active;
        }
    }

    /// Feed one subscription update; `self_deleting` is true when this viewer
    /// initiated the room's deletion.
    pub fn observe(&mut self, obs: Observation<'_>, self_deleting: bool) -> Vec<SessionEffect> {
        match self.phase {
            SessionPhase::RoomMissing | SessionPhase::TornDown => Vec::new(),
            SessionPhase::Loading => self.observe_initial(obs, self_deleting),
            SessionPhase::AwaitingName => self.observe_awaiting(obs, self_deleting),
            SessionPhase::Active => self.observe_active(obs, self_deleting),
        }
    }

    fn observe_initial(&mut self, obs: Observation<'_>, self_deleting: bool) -> Vec<SessionEffect> {
        match obs {
            Observation::Missing => self.fail_missing(),
            Observation::Snapshot(room) if room.status == RoomStatus::Deleting => {
                if self_deleting {
                    // Our own delete is still in flight; wait for the node to go.
                    Vec::new()
                } else {
                    self.fail_missing()
                }
            }
            Observation::Snapshot(room) => {
                if self.session_id.is_none() {
                    self.phase = SessionPhase::AwaitingName;
                    vec![SessionEffect::PromptForName, SessionEffect::EmitSnapshot]
                } else {
                    self.phase = SessionPhase::Active;
                    self.track(room);
                    let mut effects = vec![SessionEffect::EmitSnapshot];
                    self.check_reset_notice(room, &mut effects);
                    effects
                }
            }
        }
    }

    fn observe_awaiting(
        &mut self,
        obs: Observation<'_>,
        self_deleting: bool,
    ) -> Vec<SessionEffect> {
        match obs {
            Observation::Missing => self.fail_missing(),
            Observation::Snapshot(room) if room.status == RoomStatus::Deleting => {
                if self_deleting {
                    Vec::new()
                } else {
                    self.fail_missing()
                }
            }
            Observation::Snapshot(_) => vec![SessionEffect::EmitSnapshot],
        }
    }

    fn observe_active(&mut self, obs: Observation<'_>, self_deleting: bool) -> Vec<SessionEffect> {
        match obs {
            Observation::Missing => self.tear_down_deleted(SessionNotice::RoomDeleted, self_deleting),
            Observation::Snapshot(room) if room.status == RoomStatus::Deleting => {
                if self_deleting {
                    // We flagged it ourselves; the removal that follows handles teardown.
                    Vec::new()
                } else {
                    self.tear_down_deleted(SessionNotice::RoomDeleting, false)
                }
            }
            Observation::Snapshot(room) => {
                if let Some(effects) = self.detect_kick(room) {
                    return effects;
                }

                let mut effects = vec![SessionEffect::EmitSnapshot];
                self.check_reset_notice(room, &mut effects);
                self.track(room);
                effects
            }
        }
    }

    /// Initial contact found no usable room.
    fn fail_missing(&mut self) -> Vec<SessionEffect> {
        self.phase = SessionPhase::RoomMissing;
        vec![
            SessionEffect::Notice(SessionNotice::RoomMissing),
            SessionEffect::Redirect {
                after: self.delays.deleted_redirect,
            },
            SessionEffect::Unsubscribe,
        ]
    }

    /// Room disappeared (or was flagged `deleting`) while the viewer was active.
    fn tear_down_deleted(
        &mut self,
        notice: SessionNotice,
        self_deleting: bool,
    ) -> Vec<SessionEffect> {
        self.phase = SessionPhase::TornDown;

        if self_deleting {
            return vec![
                SessionEffect::Redirect {
                    after: self.delays.self_deleted_redirect,
                },
                SessionEffect::Unsubscribe,
            ];
        }

        let mut effects = vec![SessionEffect::ClearIdentity];
        // The host already knows: they initiated the deletion from another tab
        // or lost the room to the sweep they were told about.
        if !self.is_host {
            effects.push(SessionEffect::Notice(notice));
        }
        effects.push(SessionEffect::Redirect {
            after: if self.is_host {
                self.delays.self_deleted_redirect
            } else {
                self.delays.deleted_redirect
            },
        });
        effects.push(SessionEffect::Unsubscribe);
        effects
    }

    /// A non-host viewer present in the previous non-empty snapshot but absent
    /// from this one was removed by the host.
    fn detect_kick(&mut self, room: &RoomEntity) -> Option<Vec<SessionEffect>> {
        if self.is_host {
            return None;
        }
        let session_id = self.session_id.as_deref()?;
        let still_present = room.participants.contains_key(session_id);
        if self.prev_nonempty && self.was_present && !still_present {
            self.phase = SessionPhase::TornDown;
            return Some(vec![
                SessionEffect::Notice(SessionNotice::Kicked),
                SessionEffect::ClearIdentity,
                SessionEffect::Redirect {
                    after: self.delays.kicked_redirect,
                },
                SessionEffect::Unsubscribe,
            ]);
        }
        None
    }

    /// Surface a reset notice at most once per reset, and only to participants
    /// who were in the room before it happened.
    fn check_reset_notice(&mut self, room: &RoomEntity, effects: &mut Vec<SessionEffect>) {
        if self.is_host {
            return;
        }
        let Some(notification) = room.reset_notification else {
            return;
        };
        if notification.notified || self.last_reset_seen == Some(notification.timestamp) {
            return;
        }
        let joined_at = self
            .session_id
            .as_deref()
            .and_then(|id| room.participants.get(id))
            .map(|p| p.joined_at);
        // Joiners arriving after the reset never see the stale notice.
        if joined_at.is_some_and(|joined| joined < notification.timestamp) {
            self.last_reset_seen = Some(notification.timestamp);
            effects.push(SessionEffect::Notice(SessionNotice::VotesReset));
        }
    }

    fn track(&mut self, room: &RoomEntity) {
        self.prev_nonempty = !room.participants.is_empty();
        self.was_present = self
            .session_id
            .as_deref()
            .is_some_and(|id| room.participants.contains_key(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::{ParticipantEntity, ResetNotificationEntity};

    fn delays() -> SessionDelays {
        SessionDelays {
            deleted_redirect: Duration::from_millis(500),
            self_deleted_redirect: Duration::from_millis(100),
            kicked_redirect: Duration::from_millis(2000),
        }
    }

    fn viewer(session: &str) -> SessionMachine {
        SessionMachine::new(Some(session.into()), false, delays())
    }

    fn host_viewer(session: &str) -> SessionMachine {
        SessionMachine::new(Some(session.into()), true, delays())
    }

    fn room_with(participants: Vec<(&str, i64)>) -> RoomEntity {
        let (first_id, first_joined) = participants[0];
        let mut room = RoomEntity::new(
            "ABC123".into(),
            first_id.into(),
            ParticipantEntity::new("Host", true, true, first_joined),
            1,
        );
        for (id, joined) in participants.into_iter().skip(1) {
            room.participants.insert(
                id.into(),
                ParticipantEntity::new(id, false, true, joined),
            );
        }
        room
    }

    fn notices(effects: &[SessionEffect]) -> Vec<SessionNotice> {
        effects
            .iter()
            .filter_map(|e| match e {
                SessionEffect::Notice(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn first_snapshot_activates_identified_viewer() {
        let mut machine = viewer("p1");
        let room = room_with(vec![("h", 1), ("p1", 2)]);
        let effects = machine.observe(Observation::Snapshot(&room), false);
        assert_eq!(machine.phase(), SessionPhase::Active);
        assert_eq!(effects, vec![SessionEffect::EmitSnapshot]);
    }

    #[test]
    fn unknown_viewer_is_prompted_for_a_name() {
        let mut machine = SessionMachine::new(None, false, delays());
        let room = room_with(vec![("h", 1)]);
        let effects = machine.observe(Observation::Snapshot(&room), false);
        assert_eq!(machine.phase(), SessionPhase::AwaitingName);
        assert!(effects.contains(&SessionEffect::PromptForName));

        machine.attach_identity("p9".into(), false);
        assert_eq!(machine.phase(), SessionPhase::Active);
    }

    #[test]
    fn missing_room_on_first_contact_is_terminal() {
        let mut machine = viewer("p1");
        let effects = machine.observe(Observation::Missing, false);
        assert_eq!(machine.phase(), SessionPhase::RoomMissing);
        assert_eq!(notices(&effects), vec![SessionNotice::RoomMissing]);
        assert!(effects.contains(&SessionEffect::Unsubscribe));

        // Terminal: further updates produce nothing.
        let room = room_with(vec![("h", 1)]);
        assert!(machine.observe(Observation::Snapshot(&room), false).is_empty());
    }

    #[test]
    fn external_deletion_notifies_and_tears_down() {
        let mut machine = viewer("p1");
        let room = room_with(vec![("h", 1), ("p1", 2)]);
        machine.observe(Observation::Snapshot(&room), false);

        let effects = machine.observe(Observation::Missing, false);
        assert_eq!(machine.phase(), SessionPhase::TornDown);
        assert_eq!(notices(&effects), vec![SessionNotice::RoomDeleted]);
        assert!(effects.contains(&SessionEffect::ClearIdentity));
        assert!(effects.contains(&SessionEffect::Redirect {
            after: Duration::from_millis(500)
        }));
    }

    #[test]
    fn host_gets_no_deletion_notice_and_a_short_redirect() {
        let mut machine = host_viewer("h");
        let room = room_with(vec![("h", 1)]);
        machine.observe(Observation::Snapshot(&room), false);

        let effects = machine.observe(Observation::Missing, false);
        assert!(notices(&effects).is_empty());
        assert!(effects.contains(&SessionEffect::Redirect {
            after: Duration::from_millis(100)
        }));
    }

    #[test]
    fn self_initiated_deletion_redirects_silently() {
        let mut machine = host_viewer("h");
        let room = room_with(vec![("h", 1)]);
        machine.observe(Observation::Snapshot(&room), false);

        let effects = machine.observe(Observation::Missing, true);
        assert_eq!(machine.phase(), SessionPhase::TornDown);
        assert_eq!(
            effects,
            vec![
                SessionEffect::Redirect {
                    after: Duration::from_millis(100)
                },
                SessionEffect::Unsubscribe,
            ]
        );
    }

    #[test]
    fn deleting_flag_tears_down_before_removal() {
        let mut machine = viewer("p1");
        let room = room_with(vec![("h", 1), ("p1", 2)]);
        machine.observe(Observation::Snapshot(&room), false);

        let mut deleting = room.clone();
        deleting.status = RoomStatus::Deleting;
        let effects = machine.observe(Observation::Snapshot(&deleting), false);
        assert_eq!(machine.phase(), SessionPhase::TornDown);
        assert_eq!(notices(&effects), vec![SessionNotice::RoomDeleting]);
    }

    #[test]
    fn deleting_flag_is_ignored_by_the_deleting_viewer() {
        let mut machine = host_viewer("h");
        let room = room_with(vec![("h", 1)]);
        machine.observe(Observation::Snapshot(&room), false);

        let mut deleting = room.clone();
        deleting.status = RoomStatus::Deleting;
        let effects = machine.observe(Observation::Snapshot(&deleting), true);
        assert!(effects.is_empty());
        assert_eq!(machine.phase(), SessionPhase::Active);
    }

    #[test]
    fn vanishing_from_the_roster_means_kicked() {
        let mut machine = viewer("p1");
        let before = room_with(vec![("h", 1), ("p1", 2)]);
        machine.observe(Observation::Snapshot(&before), false);

        let after = room_with(vec![("h", 1)]);
        let effects = machine.observe(Observation::Snapshot(&after), false);
        assert_eq!(machine.phase(), SessionPhase::TornDown);
        assert_eq!(notices(&effects), vec![SessionNotice::Kicked]);
        assert!(effects.contains(&SessionEffect::Redirect {
            after: Duration::from_millis(2000)
        }));
        assert!(effects.contains(&SessionEffect::ClearIdentity));
    }

    #[test]
    fn absence_on_first_snapshot_is_not_a_kick() {
        let mut machine = viewer("p1");
        let room = room_with(vec![("h", 1)]);
        let effects = machine.observe(Observation::Snapshot(&room), false);
        assert_eq!(machine.phase(), SessionPhase::Active);
        assert_eq!(notices(&effects), Vec::<SessionNotice>::new());
    }

    #[test]
    fn reset_notice_reaches_pre_reset_participants_once() {
        let mut machine = viewer("p1");
        let mut room = room_with(vec![("h", 1), ("p1", 100)]);
        room.reset_notification = Some(ResetNotificationEntity {
            timestamp: 500,
            notified: false,
        });

        let effects = machine.observe(Observation::Snapshot(&room), false);
        assert_eq!(notices(&effects), vec![SessionNotice::VotesReset]);

        // Same timestamp again: already surfaced.
        let effects = machine.observe(Observation::Snapshot(&room), false);
        assert_eq!(notices(&effects), Vec::<SessionNotice>::new());

        // A later reset fires again.
        room.reset_notification = Some(ResetNotificationEntity {
            timestamp: 900,
            notified: false,
        });
        let effects = machine.observe(Observation::Snapshot(&room), false);
        assert_eq!(notices(&effects), vec![SessionNotice::VotesReset]);
    }

    #[test]
    fn late_joiners_never_see_an_old_reset_notice() {
        let mut machine = viewer("p1");
        let mut room = room_with(vec![("h", 1), ("p1", 800)]);
        room.reset_notification = Some(ResetNotificationEntity {
            timestamp: 500,
            notified: false,
        });

        let effects = machine.observe(Observation::Snapshot(&room), false);
        assert_eq!(notices(&effects), Vec::<SessionNotice>::new());
    }

    #[test]
    fn hosts_never_see_reset_notices() {
        let mut machine = host_viewer("h");
        let mut room = room_with(vec![("h", 1)]);
        room.reset_notification = Some(ResetNotificationEntity {
            timestamp: 500,
            notified: false,
        });

        let effects = machine.observe(Observation::Snapshot(&room), false);
        assert_eq!(notices(&effects), Vec::<SessionNotice>::new());
    }
}
