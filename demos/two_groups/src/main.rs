//! two_groups — two rival groups, each with an emblem token.
//!
//! Ten agents split 5/5 into groups `g1` and `g2`.  Group `g1` rallies
//! around `Alpha`, `g2` around `Beta`.  Identity graphs are seeded with
//! in-group warmth and out-group coolness; agents then acquire, endorse and
//! observe each other's actions for a few dozen ticks.
//!
//! ```text
//! two_groups [mock|policy] [OUTPUT_DIR]
//! ```
//!
//! `mock` (default) evaluates with the rule-based provider behind a cache;
//! `policy` uses the embedded offline policy table.  Rows are written as CSV
//! to `OUTPUT_DIR` (default `output/two_groups`).  Set `RUST_LOG=crv_sim=debug`
//! for per-phase logs.

use std::io::Cursor;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Result, bail};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crv_agent::{AgentStoreBuilder, TokenCatalog};
use crv_cognition::{PolicyLookup, PolicyTable, Provider};
use crv_core::{ActionKind, AgentId, GroupId, Persona, RunConfig, TokenId};
use crv_graph::RepresentationGraph;
use crv_output::{CsvSink, SinkObserver};
use crv_sim::{SimBuilder, TwoGroupSeed, seed_two_group_identity};
use crv_valuation::readout_all;

// ── Constants ─────────────────────────────────────────────────────────────────

const AGENT_COUNT: usize = 10;
const SEED:        u64   = 42;
const TOTAL_TICKS: u64   = 30;
const BUCKET_SIZE: u64   = 10;

const G1:    GroupId = GroupId(1);
const G2:    GroupId = GroupId(2);
const ALPHA: TokenId = TokenId(0);
const BETA:  TokenId = TokenId(1);

// ── Policy table ──────────────────────────────────────────────────────────────

// Likert means (1..7) for persona "partisan" under the mock model label.
const POLICY_CSV: &str = "\
schema_version,token_kind,owner_status,peer_alignment,persona,model,value_mean,value_sd,sample_count\n\
0.1,emblem,owned,aligned,partisan,mock,6.5,0.5,40\n\
0.1,emblem,owned,neutral,partisan,mock,5.5,0.9,40\n\
0.1,emblem,owned,misaligned,partisan,mock,3.5,1.2,40\n\
0.1,emblem,not_owned,aligned,partisan,mock,5.75,0.8,40\n\
0.1,emblem,not_owned,neutral,partisan,mock,4.0,1.0,40\n\
0.1,emblem,not_owned,misaligned,partisan,mock,2.0,0.9,40\n\
";

fn provider(kind: &str, config: &RunConfig) -> Result<Provider> {
    match kind {
        "mock" => Ok(Provider::mock().cached()),
        "policy" => {
            let table = PolicyTable::load_reader(Cursor::new(POLICY_CSV))?;
            info!(entries = table.len(), "policy table loaded");
            Ok(Provider::PolicyLookup(PolicyLookup::new(table, &config.valuation)).cached())
        }
        other => bail!("unknown provider {other:?}: expected mock or policy"),
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let provider_kind = args.next().unwrap_or_else(|| "mock".to_owned());
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| "output/two_groups".to_owned()));

    println!("=== two_groups — crv step engine ===");
    println!("Agents: {AGENT_COUNT}  |  Ticks: {TOTAL_TICKS}  |  Seed: {SEED}  |  Provider: {provider_kind}");
    println!();

    // 1. Population: agents 0–4 in g1, 5–9 in g2.
    let mut builder = AgentStoreBuilder::new(AGENT_COUNT, SEED)
        .persona_all(Persona::new("partisan", "strong group identity").with_trait("loyalty", 0.8));
    for i in 0..AGENT_COUNT as u32 {
        builder = builder.group(AgentId(i), if i < 5 { G1 } else { G2 });
    }
    let (store, rngs) = builder.build()?;

    let tokens = TokenCatalog::new().with("emblem", "Alpha").with("emblem", "Beta");

    // 2. Config: endorsement priced so it competes with acquisition.
    let mut config = RunConfig::new(SEED, TOTAL_TICKS);
    config.tick_bucket_size = BUCKET_SIZE;
    config.decision.costs.insert(ActionKind::EndorseToken, 0.3);

    // 3. Identity graphs.
    let mut graphs: Vec<RepresentationGraph> =
        (0..AGENT_COUNT as u32).map(|i| RepresentationGraph::new(AgentId(i))).collect();
    seed_two_group_identity(&mut graphs, &store, &[(G1, ALPHA), (G2, BETA)], &TwoGroupSeed::default())?;

    // 4. Sim.
    let provider = provider(&provider_kind, &config)?;
    let mut sim = SimBuilder::new(config, store, rngs, tokens, provider).graphs(graphs).build()?;

    // 5. Output.
    std::fs::create_dir_all(&out_dir)?;
    let mut obs = SinkObserver::new(CsvSink::new(&out_dir)?);

    // 6. Run.
    let t0 = Instant::now();
    let summary = sim.run(&mut obs)?;
    let elapsed = t0.elapsed();

    println!("Simulation complete in {:.3} s", elapsed.as_secs_f64());
    println!("  ticks committed : {}", summary.ticks_committed);
    println!("  batches written : {}", obs.batches());
    println!("  rows written    : {}", obs.rows());
    println!("  output          : {}", out_dir.display());
    if let Provider::CachedOracle(cache) = sim.provider() {
        let s = cache.stats();
        println!("  cache           : {} hits, {} misses, {} fallbacks", s.hits, s.misses, s.fallbacks);
    }
    println!();

    // 7. Final valuations and holdings.
    println!("{:<7} {:<6} {:>8} {:>8}  {}", "Agent", "Group", "V(Alpha)", "V(Beta)", "Holds");
    println!("{}", "-".repeat(44));
    for agent in sim.agents().agent_ids() {
        let r = readout_all(sim.graph(agent), [ALPHA, BETA], &sim.config().valuation);
        let held: Vec<&str> = sim.agents().holdings[agent.index()]
            .iter()
            .filter_map(|t| sim.tokens().get(*t).map(|s| s.label.as_str()))
            .collect();
        let group = sim.agents().group[agent.index()].map_or(0, |g| g.0);
        println!(
            "{:<7} g{:<5} {:>8.3} {:>8.3}  {}",
            agent.0,
            group,
            r[0].value,
            r[1].value,
            held.join(",")
        );
    }

    Ok(())
}
