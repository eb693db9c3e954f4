//! Column names of the persisted tables, in row-struct field order.
//!
//! Every backend writes the same columns so files from different backends
//! can be compared directly.

pub const EVENTS: [&str; 16] = [
    "bucket",
    "tick",
    "envelope_id",
    "kind",
    "status",
    "channel",
    "scope",
    "actor_id",
    "recipient_id",
    "created_tick",
    "parent_id",
    "deliver_at",
    "action",
    "payload_key",
    "payload_json",
    "reason",
];

pub const IDENTITY_EDGES: [&str; 10] = [
    "bucket",
    "tick",
    "observer_id",
    "edge_kind",
    "subject_id",
    "object_id",
    "related_agent_id",
    "token_id",
    "weight",
    "edge_sign",
];

pub const DECISIONS: [&str; 12] = [
    "bucket",
    "tick",
    "agent_id",
    "abstained",
    "chosen_index",
    "chosen_action",
    "chosen_token",
    "chosen_score",
    "temperature",
    "stochastic",
    "candidates_json",
    "estimates_json",
];

pub const SCENARIOS: [&str; 15] = [
    "bucket",
    "tick",
    "agent_id",
    "token_id",
    "token_kind",
    "owner_status",
    "peer_alignment",
    "group_id",
    "last_scope",
    "affect_index",
    "salient_other",
    "readout",
    "context_hash",
    "estimate",
    "source",
];

pub const PROVIDER_CALLS: [&str; 10] = [
    "bucket",
    "tick",
    "agent_id",
    "provider",
    "phase",
    "persona_hash",
    "context_hash",
    "envelope_id",
    "source",
    "error",
];

pub const EDIT_REJECTIONS: [&str; 8] = [
    "bucket",
    "tick",
    "agent_id",
    "patch_index",
    "edit_index",
    "operation",
    "reason",
    "detail",
];

/// `(table, columns)` for every table, in write order.
pub const TABLES: [(&str, &[&str]); 6] = [
    ("events", &EVENTS),
    ("identity_edges", &IDENTITY_EDGES),
    ("decisions", &DECISIONS),
    ("scenarios", &SCENARIOS),
    ("provider_calls", &PROVIDER_CALLS),
    ("edit_rejections", &EDIT_REJECTIONS),
];
