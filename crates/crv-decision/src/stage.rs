//! Scoring, abstention and choice.

use serde::{Deserialize, Serialize};

use crv_core::{AgentId, AgentRng, DecisionParams, Tick};

use crate::{Candidate, DecisionError, DecisionResult, TokenEstimate};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score:     f64,
}

/// The outcome of one agent's decision at one tick.
///
/// Every candidate is kept, chosen or not.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub agent:       AgentId,
    pub tick:        Tick,
    /// Index into `candidates`; `None` means abstain.
    pub chosen:      Option<usize>,
    pub candidates:  Vec<ScoredCandidate>,
    pub temperature: f64,
    pub stochastic:  bool,
    pub estimates:   Vec<TokenEstimate>,
}

impl Decision {
    pub fn abstained(&self) -> bool {
        self.chosen.is_none()
    }

    pub fn chosen_candidate(&self) -> Option<&Candidate> {
        self.chosen.map(|i| &self.candidates[i].candidate)
    }
}

/// Softmax of `scores / temperature`, shifted by the max for stability.
pub fn softmax(scores: &[f64], temperature: f64) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| ((s - max) / temperature).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Score `candidates` and pick one, or abstain.
///
/// The RNG is drawn from only in stochastic mode and only when not
/// abstaining, so deterministic runs never consume randomness here.
pub fn decide(
    agent: AgentId,
    tick: Tick,
    candidates: Vec<Candidate>,
    estimates: Vec<TokenEstimate>,
    params: &DecisionParams,
    rng: &mut AgentRng,
) -> DecisionResult<Decision> {
    if params.stochastic && !(params.temperature > 0.0 && params.temperature.is_finite()) {
        return Err(DecisionError::InvalidTemperature(params.temperature));
    }

    let scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|c| ScoredCandidate { score: c.score(), candidate: c })
        .collect();
    if let Some((index, s)) = scored.iter().enumerate().find(|(_, s)| !s.score.is_finite()) {
        return Err(DecisionError::NonFiniteScore { index, score: s.score });
    }

    // First index wins ties.
    let best = scored
        .iter()
        .enumerate()
        .fold(None::<(usize, f64)>, |acc, (i, s)| match acc {
            Some((_, m)) if s.score <= m => acc,
            _ => Some((i, s.score)),
        });

    let chosen = match best {
        None => None,
        Some((_, max)) if max < params.abstain_threshold => None,
        Some((i, _)) if !params.stochastic => Some(i),
        Some((i, _)) => {
            let scores: Vec<f64> = scored.iter().map(|s| s.score).collect();
            let probs = softmax(&scores, params.temperature);
            let u: f64 = rng.random();
            let mut acc = 0.0;
            let mut pick = i;
            for (j, p) in probs.iter().enumerate() {
                acc += p;
                if u < acc {
                    pick = j;
                    break;
                }
            }
            Some(pick)
        }
    };

    Ok(Decision {
        agent,
        tick,
        chosen,
        candidates: scored,
        temperature: params.temperature,
        stochastic: params.stochastic,
        estimates,
    })
}
