//! Initial identity graphs for a two-group world.

use crv_agent::AgentStore;
use crv_core::{AgentId, GroupId, TokenId};
use crv_graph::{EdgeKey, GraphEdit, RepresentationGraph};

use crate::{SimError, SimResult};

/// Edge weights written by [`seed_two_group_identity`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TwoGroupSeed {
    /// `self_to_agent` toward every in-group peer.
    pub ingroup:       f64,
    /// `self_to_agent` toward every out-group agent.
    pub outgroup:      f64,
    /// `agent_to_object` from every grouped agent to its group's emblem.
    pub member_token:  f64,
    /// `self_to_object` toward the observer's own emblem.
    pub self_token:    f64,
    pub self_positive: f64,
    pub self_negative: f64,
}

impl Default for TwoGroupSeed {
    fn default() -> Self {
        Self {
            ingroup:       0.5,
            outgroup:      -0.3,
            member_token:  0.6,
            self_token:    0.4,
            self_positive: 0.6,
            self_negative: 0.2,
        }
    }
}

/// Write in-group/out-group structure into every agent's graph.
///
/// `emblems` pairs each group with the token that stands for it.  Agents
/// without a group get only their self-valence edges.
pub fn seed_two_group_identity(
    graphs: &mut [RepresentationGraph],
    agents: &AgentStore,
    emblems: &[(GroupId, TokenId)],
    seed: &TwoGroupSeed,
) -> SimResult<()> {
    if graphs.len() != agents.count {
        return Err(SimError::AgentCountMismatch {
            expected: agents.count,
            got:      graphs.len(),
            what:     "graphs",
        });
    }
    let emblem_of = |g: Option<GroupId>| {
        g.and_then(|g| emblems.iter().find(|(eg, _)| *eg == g).map(|&(_, t)| t))
    };

    for (i, graph) in graphs.iter_mut().enumerate() {
        let me = AgentId(i as u32);
        let mine = agents.group[i];
        let mut edits = vec![
            GraphEdit::Set { key: EdgeKey::self_positive(), weight: seed.self_positive },
            GraphEdit::Set { key: EdgeKey::self_negative(), weight: seed.self_negative },
        ];
        if let Some(t) = emblem_of(mine) {
            edits.push(GraphEdit::Set { key: EdgeKey::self_to_object(me, t), weight: seed.self_token });
        }
        for other in agents.agent_ids().filter(|&a| a != me) {
            let theirs = agents.group[other.index()];
            if mine.is_some() && theirs.is_some() {
                let w = if mine == theirs { seed.ingroup } else { seed.outgroup };
                edits.push(GraphEdit::Set { key: EdgeKey::self_to_agent(me, other), weight: w });
            }
            if let Some(t) = emblem_of(theirs) {
                edits.push(GraphEdit::Set {
                    key:    EdgeKey::agent_to_object(other, t),
                    weight: seed.member_token,
                });
            }
        }
        for edit in &edits {
            graph
                .apply(edit)
                .map_err(|e| SimError::Config(format!("two-group seed for {me}: {e}")))?;
        }
    }
    Ok(())
}
