//! Node type catalog
//!
//! A static, read-only registry describing every [`NodeKind`]: display
//! metadata, the default configuration payload and the fixed handle topology
//! the renderer uses to place ports.
//!
//! Typed lookups go through [`entry`]. The string-keyed helpers
//! ([`get_entry`], [`get_default_data`], [`get_category_style`]) accept kind
//! names coming from untyped sources and degrade gracefully instead of
//! failing on names they do not recognize.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;

use crate::types::{NodeData, NodeKind};

/// Category of a node, used for palette grouping and styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    Trigger,
    Action,
    Control,
    Io,
    Special,
    Code,
}

impl NodeCategory {
    pub const ALL: [NodeCategory; 6] = [
        NodeCategory::Trigger,
        NodeCategory::Action,
        NodeCategory::Control,
        NodeCategory::Io,
        NodeCategory::Special,
        NodeCategory::Code,
    ];
}

/// Direction of a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleDirection {
    /// Accepts incoming edges
    Inbound,
    /// Originates outgoing edges
    Outbound,
}

/// Where the renderer draws a handle on the node's border
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleSlot {
    Top,
    Bottom,
    BottomLeft,
    BottomRight,
}

/// A connection port on a node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleDef {
    pub id: &'static str,
    pub direction: HandleDirection,
    pub visual_slot: HandleSlot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'static str>,
}

impl HandleDef {
    const fn inbound(id: &'static str) -> Self {
        Self {
            id,
            direction: HandleDirection::Inbound,
            visual_slot: HandleSlot::Top,
            label: None,
        }
    }

    const fn outbound(id: &'static str) -> Self {
        Self {
            id,
            direction: HandleDirection::Outbound,
            visual_slot: HandleSlot::Bottom,
            label: None,
        }
    }

    const fn branch(id: &'static str, label: &'static str, visual_slot: HandleSlot) -> Self {
        Self {
            id,
            direction: HandleDirection::Outbound,
            visual_slot,
            label: Some(label),
        }
    }
}

const IN: HandleDef = HandleDef::inbound("in");
const OUT: HandleDef = HandleDef::outbound("out");

const PASS_THROUGH: &[HandleDef] = &[IN, OUT];
const SOURCE_ONLY: &[HandleDef] = &[OUT];
const SINK_ONLY: &[HandleDef] = &[IN];

/// Catalog entry for one node kind
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub kind: NodeKind,
    pub label: &'static str,
    pub description: &'static str,
    pub category: NodeCategory,
    pub handles: &'static [HandleDef],
}

impl RegistryEntry {
    /// A fresh copy of this kind's default configuration payload
    pub fn default_data(&self) -> NodeData {
        let value = match self.kind {
            NodeKind::Trigger => json!({
                "label": self.label,
                "triggerType": "manual",
                "schedule": "",
            }),
            NodeKind::AgentAction => json!({
                "label": self.label,
                "agentId": "",
                "prompt": "",
                "timeoutSeconds": 300,
            }),
            NodeKind::Condition => json!({
                "label": self.label,
                "field": "",
                "operator": "equals",
                "value": "",
            }),
            NodeKind::Delay => json!({
                "label": self.label,
                "duration": 5,
                "unit": "seconds",
            }),
            NodeKind::Transform => json!({
                "label": self.label,
                "expression": "",
                "outputKey": "result",
            }),
            NodeKind::Output => json!({
                "label": self.label,
                "outputType": "log",
                "destination": "",
            }),
            NodeKind::Loop => json!({
                "label": self.label,
                "collection": "",
                "maxIterations": 10,
            }),
            NodeKind::Parallel => json!({
                "label": self.label,
                "waitForAll": true,
            }),
            NodeKind::HttpRequest => json!({
                "label": self.label,
                "method": "GET",
                "url": "",
                "headers": {},
                "body": "",
            }),
            NodeKind::Code => json!({
                "label": self.label,
                "language": "javascript",
                "source": "",
            }),
            NodeKind::ApprovalGate => json!({
                "label": self.label,
                "approvers": [],
                "timeoutHours": 24,
            }),
            NodeKind::SubWorkflow => json!({
                "label": self.label,
                "workflowId": "",
                "waitForCompletion": true,
            }),
        };

        match value {
            serde_json::Value::Object(map) => map,
            _ => label_only(self.label),
        }
    }

    /// Handles with the given direction, in declaration order
    pub fn handles_in(&self, direction: HandleDirection) -> impl Iterator<Item = &'static HandleDef> {
        let handles: &'static [HandleDef] = self.handles;
        handles.iter().filter(move |h| h.direction == direction)
    }

    /// Look up a handle by id
    pub fn handle(&self, id: &str) -> Option<&'static HandleDef> {
        let handles: &'static [HandleDef] = self.handles;
        handles.iter().find(|h| h.id == id)
    }

    /// Whether the kind has more than one outbound handle
    pub fn is_branching(&self) -> bool {
        self.handles_in(HandleDirection::Outbound).count() > 1
    }
}

static ENTRIES: [RegistryEntry; 12] = [
    RegistryEntry {
        kind: NodeKind::Trigger,
        label: "Trigger",
        description: "Starts the workflow manually, on a schedule or from an event",
        category: NodeCategory::Trigger,
        handles: SOURCE_ONLY,
    },
    RegistryEntry {
        kind: NodeKind::AgentAction,
        label: "Agent Action",
        description: "Asks an agent to perform a task",
        category: NodeCategory::Action,
        handles: PASS_THROUGH,
    },
    RegistryEntry {
        kind: NodeKind::Condition,
        label: "Condition",
        description: "Routes execution down the true or false branch",
        category: NodeCategory::Control,
        handles: &[
            IN,
            HandleDef::branch("true", "True", HandleSlot::BottomLeft),
            HandleDef::branch("false", "False", HandleSlot::BottomRight),
        ],
    },
    RegistryEntry {
        kind: NodeKind::Delay,
        label: "Delay",
        description: "Waits for a fixed duration before continuing",
        category: NodeCategory::Control,
        handles: PASS_THROUGH,
    },
    RegistryEntry {
        kind: NodeKind::Transform,
        label: "Transform",
        description: "Reshapes data passed between steps",
        category: NodeCategory::Action,
        handles: PASS_THROUGH,
    },
    RegistryEntry {
        kind: NodeKind::Output,
        label: "Output",
        description: "Emits the final result of the workflow",
        category: NodeCategory::Io,
        handles: SINK_ONLY,
    },
    RegistryEntry {
        kind: NodeKind::Loop,
        label: "Loop",
        description: "Repeats the body branch for each item",
        category: NodeCategory::Control,
        handles: &[
            IN,
            HandleDef::branch("body", "Loop Body", HandleSlot::BottomLeft),
            HandleDef::branch("done", "Done", HandleSlot::BottomRight),
        ],
    },
    RegistryEntry {
        kind: NodeKind::Parallel,
        label: "Parallel",
        description: "Fans execution out into two branches",
        category: NodeCategory::Control,
        handles: &[
            IN,
            HandleDef::branch("branchA", "Branch A", HandleSlot::BottomLeft),
            HandleDef::branch("branchB", "Branch B", HandleSlot::BottomRight),
        ],
    },
    RegistryEntry {
        kind: NodeKind::HttpRequest,
        label: "HTTP Request",
        description: "Calls an external HTTP endpoint",
        category: NodeCategory::Io,
        handles: PASS_THROUGH,
    },
    RegistryEntry {
        kind: NodeKind::Code,
        label: "Code",
        description: "Runs a user-supplied script",
        category: NodeCategory::Code,
        handles: PASS_THROUGH,
    },
    RegistryEntry {
        kind: NodeKind::ApprovalGate,
        label: "Approval Gate",
        description: "Pauses until a human approves or rejects",
        category: NodeCategory::Special,
        handles: &[
            IN,
            HandleDef::branch("approved", "Approved", HandleSlot::BottomLeft),
            HandleDef::branch("rejected", "Rejected", HandleSlot::BottomRight),
        ],
    },
    RegistryEntry {
        kind: NodeKind::SubWorkflow,
        label: "Sub-Workflow",
        description: "Runs another saved workflow as a single step",
        category: NodeCategory::Special,
        handles: PASS_THROUGH,
    },
];

/// Visual metadata shared by every kind in a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStyle {
    pub label: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
}

/// Style returned for kinds the catalog does not know
pub const FALLBACK_STYLE: CategoryStyle = CategoryStyle {
    label: "Other",
    color: "#6b7280",
    icon: "circle",
};

impl NodeCategory {
    /// Visual style for this category
    pub fn style(&self) -> CategoryStyle {
        match self {
            NodeCategory::Trigger => CategoryStyle {
                label: "Triggers",
                color: "#22c55e",
                icon: "zap",
            },
            NodeCategory::Action => CategoryStyle {
                label: "Actions",
                color: "#3b82f6",
                icon: "bot",
            },
            NodeCategory::Control => CategoryStyle {
                label: "Control Flow",
                color: "#f59e0b",
                icon: "git-branch",
            },
            NodeCategory::Io => CategoryStyle {
                label: "Input / Output",
                color: "#06b6d4",
                icon: "arrow-right-left",
            },
            NodeCategory::Special => CategoryStyle {
                label: "Special",
                color: "#a855f7",
                icon: "sparkles",
            },
            NodeCategory::Code => CategoryStyle {
                label: "Code",
                color: "#ef4444",
                icon: "code",
            },
        }
    }
}

/// Catalog entry for a typed kind
pub fn entry(kind: NodeKind) -> &'static RegistryEntry {
    // ENTRIES is declared in NodeKind::ALL order
    &ENTRIES[kind as usize]
}

/// All catalog entries in palette order
pub fn entries() -> &'static [RegistryEntry] {
    &ENTRIES
}

/// Entries grouped by category for the palette
pub fn entries_by_category() -> BTreeMap<NodeCategory, Vec<&'static RegistryEntry>> {
    let mut grouped: BTreeMap<NodeCategory, Vec<&'static RegistryEntry>> = BTreeMap::new();
    for entry in ENTRIES.iter() {
        grouped.entry(entry.category).or_default().push(entry);
    }
    grouped
}

/// Look up an entry by kind name; `None` for names not in the catalog
pub fn get_entry(kind: &str) -> Option<&'static RegistryEntry> {
    kind.parse::<NodeKind>().ok().map(entry)
}

/// Default data for a kind name, or `{label: kind}` for unknown names
pub fn get_default_data(kind: &str) -> NodeData {
    match get_entry(kind) {
        Some(entry) => entry.default_data(),
        None => {
            log::debug!("No catalog entry for kind '{}', using label-only data", kind);
            label_only(kind)
        }
    }
}

/// Category style for a kind name, or [`FALLBACK_STYLE`] for unknown names
pub fn get_category_style(kind: &str) -> CategoryStyle {
    get_entry(kind)
        .map(|e| e.category.style())
        .unwrap_or(FALLBACK_STYLE)
}

fn label_only(label: &str) -> NodeData {
    let mut data = NodeData::new();
    data.insert("label".to_string(), label.into());
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_follow_kind_order() {
        for kind in NodeKind::ALL {
            assert_eq!(entry(kind).kind, kind);
        }
        assert_eq!(entries().len(), NodeKind::ALL.len());
    }

    #[test]
    fn test_default_data_always_has_label() {
        for kind in NodeKind::ALL {
            let data = entry(kind).default_data();
            assert_eq!(data["label"], entry(kind).label, "kind {}", kind);
        }
    }

    #[test]
    fn test_default_data_is_a_fresh_copy() {
        let mut first = get_default_data("httpRequest");
        first.insert("url".into(), "https://example.com".into());
        let second = get_default_data("httpRequest");
        assert_eq!(second["url"], "");
    }

    #[test]
    fn test_unknown_kind_fallbacks() {
        let data = get_default_data("madeUpKind");
        assert_eq!(data.len(), 1);
        assert_eq!(data["label"], "madeUpKind");

        assert_eq!(get_category_style("madeUpKind"), FALLBACK_STYLE);
        assert!(get_entry("madeUpKind").is_none());
    }

    #[test]
    fn test_known_kind_style() {
        assert_eq!(get_category_style("condition"), NodeCategory::Control.style());
        assert_eq!(get_category_style("trigger").label, "Triggers");
    }

    #[test]
    fn test_handle_topology() {
        let trigger = entry(NodeKind::Trigger);
        assert_eq!(trigger.handles_in(HandleDirection::Inbound).count(), 0);
        assert_eq!(trigger.handles_in(HandleDirection::Outbound).count(), 1);

        let output = entry(NodeKind::Output);
        assert_eq!(output.handles_in(HandleDirection::Inbound).count(), 1);
        assert_eq!(output.handles_in(HandleDirection::Outbound).count(), 0);

        let condition = entry(NodeKind::Condition);
        let outs: Vec<_> = condition
            .handles_in(HandleDirection::Outbound)
            .map(|h| h.id)
            .collect();
        assert_eq!(outs, vec!["true", "false"]);
    }

    #[test]
    fn test_branching_kinds_have_two_labelled_outputs() {
        for kind in NodeKind::ALL {
            let e = entry(kind);
            let branching = matches!(
                kind,
                NodeKind::Condition | NodeKind::ApprovalGate | NodeKind::Loop | NodeKind::Parallel
            );
            assert_eq!(e.is_branching(), branching, "kind {}", kind);
            if branching {
                let outs: Vec<_> = e.handles_in(HandleDirection::Outbound).collect();
                assert_eq!(outs.len(), 2);
                assert!(outs.iter().all(|h| h.label.is_some()));
            }
        }
    }

    #[test]
    fn test_entries_by_category() {
        let grouped = entries_by_category();
        let control: Vec<_> = grouped[&NodeCategory::Control].iter().map(|e| e.kind).collect();
        assert_eq!(
            control,
            vec![NodeKind::Condition, NodeKind::Delay, NodeKind::Loop, NodeKind::Parallel]
        );
        assert_eq!(grouped.values().map(Vec::len).sum::<usize>(), 12);
    }
}
