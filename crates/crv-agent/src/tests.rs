//! Unit tests for crv-agent.

#[cfg(test)]
mod builder {
    use crate::AgentStoreBuilder;
    use crv_core::{Affect, AgentId, CrvError, GroupId, Persona, RoomId, TokenId};

    #[test]
    fn correct_count() {
        let (store, rngs) = AgentStoreBuilder::new(500, 1).build().unwrap();
        assert_eq!(store.count, 500);
        assert_eq!(rngs.len(), 500);
        assert_eq!(store.persona.len(), 500);
        assert_eq!(store.holdings.len(), 500);
    }

    #[test]
    fn zero_agents() {
        let (store, rngs) = AgentStoreBuilder::new(0, 0).build().unwrap();
        assert!(store.is_empty());
        assert!(rngs.is_empty());
    }

    #[test]
    fn defaults() {
        let (store, _) = AgentStoreBuilder::new(2, 0).build().unwrap();
        assert_eq!(store.affect[0], Affect::default());
        assert_eq!(store.persona[1], Persona::default());
        assert_eq!(store.group[0], None);
        assert!(store.declared_groups.is_empty());
    }

    #[test]
    fn per_agent_persona_overrides_all() {
        let (store, _) = AgentStoreBuilder::new(3, 0)
            .persona_all(Persona::new("base", "Base"))
            .persona(AgentId(1), Persona::new("odd", "Odd"))
            .build()
            .unwrap();
        assert_eq!(store.persona[0].persona_id, "base");
        assert_eq!(store.persona[1].persona_id, "odd");
        assert_eq!(store.persona[2].persona_id, "base");
    }

    #[test]
    fn out_of_range_assignment_rejected() {
        let res = AgentStoreBuilder::new(2, 0).group(AgentId(5), GroupId(0)).build();
        assert!(matches!(res, Err(CrvError::AgentNotFound(AgentId(5)))));
    }

    #[test]
    fn membership_declares_implicitly() {
        let (store, _) = AgentStoreBuilder::new(3, 0)
            .group(AgentId(0), GroupId(7))
            .room(AgentId(2), RoomId(1))
            .declare_group(GroupId(9))
            .hold(AgentId(1), TokenId(4))
            .build()
            .unwrap();
        assert!(store.is_known_group(GroupId(7)));
        assert!(store.is_known_group(GroupId(9)));
        assert!(!store.is_known_group(GroupId(8)));
        assert!(store.is_known_room(RoomId(1)));
        assert!(store.holds(AgentId(1), TokenId(4)));
        assert!(!store.holds(AgentId(0), TokenId(4)));
    }
}

#[cfg(test)]
mod store {
    use crate::AgentStoreBuilder;
    use crv_core::{AgentId, GroupId, TokenId};

    #[test]
    fn agent_ids_iterator() {
        let (store, _) = AgentStoreBuilder::new(5, 0).build().unwrap();
        let ids: Vec<AgentId> = store.agent_ids().collect();
        assert_eq!(ids, vec![AgentId(0), AgentId(1), AgentId(2), AgentId(3), AgentId(4)]);
        assert!(store.contains(AgentId(4)));
        assert!(!store.contains(AgentId(5)));
    }

    #[test]
    fn group_members_ascending() {
        let (store, _) = AgentStoreBuilder::new(5, 0)
            .group(AgentId(3), GroupId(1))
            .group(AgentId(0), GroupId(1))
            .group(AgentId(2), GroupId(2))
            .build()
            .unwrap();
        let g1: Vec<AgentId> = store.group_members(GroupId(1)).collect();
        assert_eq!(g1, vec![AgentId(0), AgentId(3)]);
        assert!(store.same_group(AgentId(0), AgentId(3)));
        assert!(!store.same_group(AgentId(0), AgentId(2)));
        assert!(!store.same_group(AgentId(1), AgentId(4)));
    }

    #[test]
    fn holders() {
        let (store, _) = AgentStoreBuilder::new(4, 0)
            .hold(AgentId(2), TokenId(0))
            .hold(AgentId(1), TokenId(0))
            .build()
            .unwrap();
        let h: Vec<AgentId> = store.holders_of(TokenId(0)).collect();
        assert_eq!(h, vec![AgentId(1), AgentId(2)]);
    }
}

#[cfg(test)]
mod rngs {
    use crate::AgentStoreBuilder;
    use crv_core::AgentId;

    #[test]
    fn per_agent_determinism() {
        let (_, mut rngs1) = AgentStoreBuilder::new(10, 999).build().unwrap();
        let (_, mut rngs2) = AgentStoreBuilder::new(10, 999).build().unwrap();
        for i in 0..10u32 {
            let a: f64 = rngs1.get_mut(AgentId(i)).random();
            let b: f64 = rngs2.get_mut(AgentId(i)).random();
            assert_eq!(a, b, "agent {i} RNG should be deterministic");
        }
    }

    #[test]
    fn different_seeds_differ() {
        let (_, mut rngs_a) = AgentStoreBuilder::new(1, 1).build().unwrap();
        let (_, mut rngs_b) = AgentStoreBuilder::new(1, 2).build().unwrap();
        let a: u64 = rngs_a.get_mut(AgentId(0)).random();
        let b: u64 = rngs_b.get_mut(AgentId(0)).random();
        assert_ne!(a, b);
    }
}

#[cfg(test)]
mod tokens {
    use crate::TokenCatalog;
    use crv_core::TokenId;

    #[test]
    fn ids_are_sequential() {
        let cat = TokenCatalog::new().with("badge", "red").with("badge", "blue");
        assert_eq!(cat.len(), 2);
        assert_eq!(cat.ids().collect::<Vec<_>>(), vec![TokenId(0), TokenId(1)]);
        assert_eq!(cat.get(TokenId(1)).unwrap().label, "blue");
        assert!(cat.get(TokenId(2)).is_none());
        assert!(!cat.contains(TokenId(2)));
    }
}
