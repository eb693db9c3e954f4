//! Unit tests for crv-router.

#[cfg(test)]
mod helpers {
    use crv_agent::{AgentStore, AgentStoreBuilder};
    use crv_core::{AgentId, GroupId, RoomId, TokenId};

    use crate::Payload;

    /// Six agents: 0–2 in g1, 3–4 in g2, 5 ungrouped.  Agents 0 and 3 share
    /// room 7.  Group 9 is declared but empty.
    pub fn world() -> AgentStore {
        let (store, _) = AgentStoreBuilder::new(6, 0)
            .group(AgentId(0), GroupId(1))
            .group(AgentId(1), GroupId(1))
            .group(AgentId(2), GroupId(1))
            .group(AgentId(3), GroupId(2))
            .group(AgentId(4), GroupId(2))
            .room(AgentId(0), RoomId(7))
            .room(AgentId(3), RoomId(7))
            .declare_group(GroupId(9))
            .build()
            .unwrap();
        store
    }

    pub fn acquire(t: u32) -> Payload {
        Payload::AcquireToken { token: TokenId(t) }
    }
}

// ── Scope resolution ──────────────────────────────────────────────────────────

#[cfg(test)]
mod scopes {
    use crv_core::{AgentId, ChannelKind, GroupId, RoomId};

    use super::helpers::*;
    use crate::{EventRouter, RouteError, Scope};

    #[test]
    fn public_reaches_everyone_including_actor() {
        let w = world();
        let r = EventRouter::recipients(ChannelKind::Public, &Scope::Public, &w).unwrap();
        assert_eq!(r.len(), 6);
    }

    #[test]
    fn group_and_room_membership() {
        let w = world();
        let g = EventRouter::recipients(ChannelKind::Group, &Scope::Group(GroupId(2)), &w).unwrap();
        assert_eq!(g, vec![AgentId(3), AgentId(4)]);
        let r = EventRouter::recipients(ChannelKind::Room, &Scope::Room(RoomId(7)), &w).unwrap();
        assert_eq!(r, vec![AgentId(0), AgentId(3)]);
    }

    #[test]
    fn direct_dedups_sorts_and_drops_unknown() {
        let w = world();
        let scope = Scope::Direct(vec![AgentId(4), AgentId(1), AgentId(4), AgentId(99)]);
        let r = EventRouter::recipients(ChannelKind::Dm, &scope, &w).unwrap();
        assert_eq!(r, vec![AgentId(1), AgentId(4)]);
    }

    #[test]
    fn malformed_scopes() {
        let w = world();
        assert!(matches!(
            EventRouter::recipients(ChannelKind::Group, &Scope::Direct(vec![AgentId(1)]), &w),
            Err(RouteError::ChannelScopeMismatch { channel: ChannelKind::Group, scope: "direct" })
        ));
        assert_eq!(
            EventRouter::recipients(ChannelKind::Dm, &Scope::Direct(vec![]), &w),
            Err(RouteError::EmptyDirect)
        );
        assert_eq!(
            EventRouter::recipients(ChannelKind::Group, &Scope::Group(GroupId(5)), &w),
            Err(RouteError::UnknownGroup(GroupId(5)))
        );
        assert_eq!(
            EventRouter::recipients(ChannelKind::Room, &Scope::Room(RoomId(1)), &w),
            Err(RouteError::UnknownRoom(RoomId(1)))
        );
    }

    #[test]
    fn empty_recipient_sets_rejected() {
        let w = world();
        assert_eq!(
            EventRouter::recipients(ChannelKind::Group, &Scope::Group(GroupId(9)), &w),
            Err(RouteError::NoRecipients)
        );
        assert_eq!(
            EventRouter::recipients(ChannelKind::Dm, &Scope::Direct(vec![AgentId(40)]), &w),
            Err(RouteError::NoRecipients)
        );
    }
}

// ── Planning and delivery ─────────────────────────────────────────────────────

#[cfg(test)]
mod delivery {
    use crv_core::{AgentId, ChannelKind, GroupId, Tick};

    use super::helpers::*;
    use crate::{ActionIntent, EnvelopeKind, EnvelopeStatus, EventRouter, RouteError, Scope, delivery_tick};

    #[test]
    fn delivery_tick_is_at_least_next() {
        assert_eq!(delivery_tick(Tick(4), 0), Ok(Tick(5)));
        assert_eq!(delivery_tick(Tick(4), 1), Ok(Tick(5)));
        assert_eq!(delivery_tick(Tick(10), 3), Ok(Tick(13)));
    }

    #[test]
    fn overflowing_delay_is_rejected_not_wrapped() {
        assert_eq!(
            delivery_tick(Tick(10), u64::MAX),
            Err(RouteError::DelayOverflow { now: Tick(10), delay: u64::MAX })
        );

        let w = world();
        let mut router = EventRouter::new();
        let intents = [
            ActionIntent::new(AgentId(0), Scope::Public, acquire(0)).with_delay(u64::MAX),
            ActionIntent::new(AgentId(1), Scope::Public, acquire(0)).with_delay(u64::MAX - 10),
        ];
        let batch = router.plan(&intents, Tick(10), &w);
        assert_eq!(batch.actions[0].status(), EnvelopeStatus::Rejected);
        assert_eq!(batch.actions[0].rejection().map(RouteError::reason), Some("delay_overflow"));
        // 10 + (MAX - 10) is exactly MAX and still fits.
        assert_eq!(batch.actions[1].status(), EnvelopeStatus::Executed);
        assert!(batch.observations.iter().all(|o| o.origin().actor == AgentId(1)));
        assert!(batch.observations.iter().all(|o| o.deliver_at() == Some(Tick(u64::MAX))));
        router.commit(Tick(10), batch);
        assert!(router.due(Tick(11)).is_empty());
    }

    #[test]
    fn delivering_previews_without_draining() {
        let w = world();
        let mut router = EventRouter::new();
        let batch = router.plan(
            &[ActionIntent::new(AgentId(0), Scope::Group(GroupId(1)), acquire(0))],
            Tick(0),
            &w,
        );
        router.commit(Tick(0), batch);
        let pending = router.pending_len();

        let preview = router.delivering(Tick(1));
        assert_eq!(preview.len(), 3);
        assert!(preview.iter().all(|e| e.status() == EnvelopeStatus::Executed));
        assert_eq!(router.pending_len(), pending);
        assert!(router.due(Tick(1)).iter().all(|e| e.status() == EnvelopeStatus::Pending));

        let drained = router.commit(Tick(1), Default::default());
        assert_eq!(drained, preview);
    }

    #[test]
    fn group_action_at_five_reaches_only_members_at_six() {
        let w = world();
        let mut router = EventRouter::new();
        let intent = ActionIntent::new(AgentId(0), Scope::Group(GroupId(1)), acquire(0));
        let batch = router.plan(&[intent], Tick(5), &w);
        assert_eq!(batch.actions[0].status(), EnvelopeStatus::Executed);
        router.commit(Tick(5), batch);

        assert!(router.due(Tick(5)).is_empty());
        let due: Vec<AgentId> = router.due(Tick(6)).iter().filter_map(|e| e.recipient()).collect();
        assert_eq!(due, vec![AgentId(0), AgentId(1), AgentId(2)]);
        assert!(router.due_for(Tick(6), AgentId(3)).next().is_none());
    }

    #[test]
    fn direct_delay_three_first_visible_at_thirteen() {
        let w = world();
        let mut router = EventRouter::new();
        let intent = ActionIntent::new(AgentId(2), Scope::Direct(vec![AgentId(5)]), acquire(1))
            .with_delay(3);
        let batch = router.plan(&[intent], Tick(10), &w);
        router.commit(Tick(10), batch);

        for t in 11..13 {
            assert!(router.due(Tick(t)).is_empty(), "visible early at {t}");
        }
        let due = router.due(Tick(13));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].recipient(), Some(AgentId(5)));
        assert_eq!(due[0].deliver_at(), Some(Tick(13)));
        assert_eq!(router.next_delivery_tick(), Some(Tick(13)));
    }

    #[test]
    fn observations_carry_origin_and_execute_when_drained() {
        let w = world();
        let mut router = EventRouter::new();
        let batch = router.plan(
            &[ActionIntent::new(AgentId(3), Scope::Group(GroupId(2)), acquire(0))],
            Tick(0),
            &w,
        );
        let action_id = batch.actions[0].id();
        assert_eq!(batch.observations.len(), 2);
        assert!(batch.observations.iter().all(|o| o.status() == EnvelopeStatus::Pending));
        router.commit(Tick(0), batch);
        assert_eq!(router.pending_len(), 2);

        let delivered = router.commit(Tick(1), Default::default());
        assert_eq!(delivered.len(), 2);
        assert_eq!(router.pending_len(), 0);
        for obs in &delivered {
            assert_eq!(obs.kind(), EnvelopeKind::Observation);
            assert_eq!(obs.status(), EnvelopeStatus::Executed);
            assert_eq!(obs.origin().parent, Some(action_id));
            assert_eq!(obs.origin().actor, AgentId(3));
            assert_eq!(obs.origin().created, Tick(0));
            assert_eq!(obs.channel(), ChannelKind::Group);
        }
    }

    #[test]
    fn rejected_actions_are_recorded_not_delivered() {
        let w = world();
        let router = EventRouter::new();
        let intents = [
            ActionIntent::new(AgentId(0), Scope::Direct(vec![AgentId(1)]), acquire(0))
                .on_channel(ChannelKind::Group),
            ActionIntent::new(AgentId(0), Scope::Group(GroupId(42)), acquire(0)),
            ActionIntent::new(AgentId(77), Scope::Public, acquire(0)),
        ];
        let batch = router.plan(&intents, Tick(2), &w);
        assert_eq!(batch.actions.len(), 3);
        assert_eq!(batch.rejected().count(), 3);
        assert!(batch.observations.is_empty());
        assert!(matches!(
            batch.actions[1].rejection(),
            Some(RouteError::UnknownGroup(GroupId(42)))
        ));
        assert_eq!(batch.actions[2].rejection(), Some(&RouteError::UnknownActor(AgentId(77))));
    }

    #[test]
    fn plan_does_not_mutate() {
        let w = world();
        let router = EventRouter::new();
        let intents = [ActionIntent::new(AgentId(1), Scope::Public, acquire(0))];
        let a = router.plan(&intents, Tick(3), &w);
        let b = router.plan(&intents, Tick(3), &w);
        assert_eq!(a.actions, b.actions);
        assert_eq!(a.observations, b.observations);
        assert_eq!(router.pending_len(), 0);
    }

    #[test]
    fn ids_continue_across_commits() {
        let w = world();
        let mut router = EventRouter::new();
        let intents = [ActionIntent::new(AgentId(1), Scope::Direct(vec![AgentId(2)]), acquire(0))];
        let first = router.plan(&intents, Tick(0), &w);
        let last_first = first.observations[0].id();
        router.commit(Tick(0), first);
        let second = router.plan(&intents, Tick(1), &w);
        assert!(second.actions[0].id() > last_first);
    }
}

// ── Envelope status ───────────────────────────────────────────────────────────

#[cfg(test)]
mod status {
    use crv_core::{AgentId, GroupId, Tick};

    use super::helpers::*;
    use crate::{ActionIntent, EnvelopeStatus, EventRouter, RouteError, Scope};

    #[test]
    fn terminal_states_are_final() {
        let w = world();
        let batch = EventRouter::new().plan(
            &[ActionIntent::new(AgentId(0), Scope::Group(GroupId(1)), acquire(0))],
            Tick(0),
            &w,
        );
        let mut env = batch.actions[0].clone();
        assert_eq!(env.status(), EnvelopeStatus::Executed);
        assert!(matches!(
            env.transition(EnvelopeStatus::Rejected),
            Err(RouteError::IllegalTransition { from: EnvelopeStatus::Executed, .. })
        ));
        assert!(env.reject(RouteError::NoRecipients).is_err());
        assert_eq!(env.status(), EnvelopeStatus::Executed);
        assert!(env.rejection().is_none());
    }

    #[test]
    fn pending_is_never_a_target() {
        let w = world();
        let batch = EventRouter::new().plan(
            &[ActionIntent::new(AgentId(0), Scope::Public, acquire(0))],
            Tick(0),
            &w,
        );
        let mut obs = batch.observations[0].clone();
        assert!(obs.transition(EnvelopeStatus::Pending).is_err());
        assert!(obs.transition(EnvelopeStatus::Executed).is_ok());
    }
}

// ── Payload grammar ───────────────────────────────────────────────────────────

#[cfg(test)]
mod payload {
    use crv_core::{ActionKind, AgentId, TokenId, Valence};

    use crate::Payload;

    #[test]
    fn canonical_keys() {
        assert_eq!(Payload::AcquireToken { token: TokenId(3) }.canonical_key(), "acquire_token:token_id=3");
        assert_eq!(
            Payload::RelateAgent { agent: AgentId(2), valence: Valence::Negative }.canonical_key(),
            "relate_agent:agent_id=2|valence=negative"
        );
        assert_eq!(
            Payload::DeclareCooccurrence { a: TokenId(1), b: TokenId(4) }.canonical_key(),
            "declare_cooccurrence_between_tokens:token_a=1|token_b=4"
        );
        assert_eq!(
            Payload::SendChatMessage { text: "hi".into() }.canonical_key(),
            "send_chat_message"
        );
    }

    #[test]
    fn kinds_and_tokens() {
        let p = Payload::EndorseToken { token: TokenId(5), valence: Valence::Positive };
        assert_eq!(p.kind(), ActionKind::EndorseToken);
        assert_eq!(p.token(), Some(TokenId(5)));
        assert_eq!(Payload::PublishAnnouncement { text: String::new() }.token(), None);
    }

    #[test]
    fn json_tag_matches_action_kind() {
        let p = Payload::DeclareCooccurrence { a: TokenId(0), b: TokenId(1) };
        let v: serde_json::Value = serde_json::to_value(&p).unwrap();
        assert_eq!(v["action"], "declare_cooccurrence_between_tokens");
        assert_eq!(v["action"], p.kind().as_str());
    }
}
