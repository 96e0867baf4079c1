//! The node catalog: every node type the editor can place, by category.
//!
//! The catalog is loaded once when the editor starts, either from the
//! backend's node-types endpoint or, when that fails, from the built-in
//! [`NodeCatalog::fallback`] set so the canvas is always usable.

use crate::config::{NodeConfig, ParamKind, ParamSpec, ParamValue};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// The fixed set of node categories, in palette order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    /// Entry points that start a workflow.
    Triggers,
    /// Prices and account information.
    MarketData,
    /// Technical indicators.
    Indicators,
    /// Branching and comparisons.
    Conditions,
    /// Position sizing and loss limits.
    RiskManagement,
    /// Order placement and position management.
    Orders,
    /// Alerts.
    Notifications,
    /// Headlines and sentiment.
    News,
    /// State kept across runs.
    Memory,
    /// LLM-backed decision nodes.
    AiAgents,
}

impl NodeCategory {
    /// All categories in palette order.
    pub const ALL: [Self; 10] = [
        Self::Triggers,
        Self::MarketData,
        Self::Indicators,
        Self::Conditions,
        Self::RiskManagement,
        Self::Orders,
        Self::Notifications,
        Self::News,
        Self::Memory,
        Self::AiAgents,
    ];

    /// The key the backend uses for this category.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Triggers => "triggers",
            Self::MarketData => "market_data",
            Self::Indicators => "indicators",
            Self::Conditions => "conditions",
            Self::RiskManagement => "risk_management",
            Self::Orders => "orders",
            Self::Notifications => "notifications",
            Self::News => "news",
            Self::Memory => "memory",
            Self::AiAgents => "ai_agents",
        }
    }

    /// Looks up a category by its backend key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    /// Heading used when the backend supplies none.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Triggers => "Triggers",
            Self::MarketData => "Market Data",
            Self::Indicators => "Technical Indicators",
            Self::Conditions => "Conditions & Logic",
            Self::RiskManagement => "Risk Management",
            Self::Orders => "Order Execution",
            Self::Notifications => "Notifications",
            Self::News => "News & Sentiment",
            Self::Memory => "Persistence & Memory",
            Self::AiAgents => "AI Agents",
        }
    }
}

/// A node type that can be placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeType {
    /// Unique type identifier, e.g. `"RSI"`.
    pub type_id: String,
    /// Name shown in the palette and as the default node label.
    pub display_name: String,
    /// One-line description.
    pub description: String,
    /// Palette category.
    pub category: NodeCategory,
    /// Parameter schema, in display order.
    pub params: Vec<ParamSpec>,
}

impl NodeType {
    /// Creates a node type with no parameters.
    #[must_use]
    pub fn new(
        type_id: impl Into<String>,
        display_name: impl Into<String>,
        category: NodeCategory,
    ) -> Self {
        Self {
            type_id: type_id.into(),
            display_name: display_name.into(),
            description: String::new(),
            category,
            params: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Returns the schema of a parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// The configuration seeded into newly placed nodes of this type.
    #[must_use]
    pub fn default_config(&self) -> NodeConfig {
        NodeConfig::from_defaults(&self.params)
    }
}

/// One palette section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroup {
    /// The category.
    pub category: NodeCategory,
    /// Heading text.
    pub display_name: String,
    /// Node types in this category.
    pub nodes: Vec<NodeType>,
}

/// The registry of placeable node types.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeCatalog {
    groups: Vec<CategoryGroup>,
    index: HashMap<String, (usize, usize)>,
}

impl NodeCatalog {
    /// Builds a catalog from node types, grouped in palette order.
    ///
    /// When two types share a `type_id`, the first one wins.
    #[must_use]
    pub fn from_types(types: impl IntoIterator<Item = NodeType>) -> Self {
        Self::from_groups(
            types
                .into_iter()
                .map(|t| (t.category, t.category.display_name().to_string(), t)),
        )
    }

    fn from_groups(entries: impl IntoIterator<Item = (NodeCategory, String, NodeType)>) -> Self {
        let mut by_category: HashMap<NodeCategory, CategoryGroup> = HashMap::new();
        let mut seen = std::collections::HashSet::new();

        for (category, heading, node_type) in entries {
            if !seen.insert(node_type.type_id.clone()) {
                tracing::warn!(type_id = %node_type.type_id, "duplicate node type ignored");
                continue;
            }
            by_category
                .entry(category)
                .or_insert_with(|| CategoryGroup {
                    category,
                    display_name: heading,
                    nodes: Vec::new(),
                })
                .nodes
                .push(node_type);
        }

        let groups: Vec<CategoryGroup> = NodeCategory::ALL
            .into_iter()
            .filter_map(|c| by_category.remove(&c))
            .collect();

        let index = groups
            .iter()
            .enumerate()
            .flat_map(|(g, group)| {
                group
                    .nodes
                    .iter()
                    .enumerate()
                    .map(move |(n, t)| (t.type_id.clone(), (g, n)))
            })
            .collect();

        Self { groups, index }
    }

    /// Builds a catalog from the node-types endpoint response.
    ///
    /// Unknown category keys are skipped.
    #[must_use]
    pub fn from_response(response: NodeTypesResponse) -> Self {
        let mut entries = Vec::new();
        for (key, section) in response.categories {
            let Some(category) = NodeCategory::from_key(&key) else {
                tracing::warn!(category = %key, "skipping unknown node category");
                continue;
            };
            for node in section.nodes {
                let node_type = node.into_node_type(category);
                entries.push((category, section.name.clone(), node_type));
            }
        }
        // Map iteration order is unspecified; sort for a stable palette.
        entries.sort_by(|a, b| (a.0, &a.2.type_id).cmp(&(b.0, &b.2.type_id)));
        Self::from_groups(entries)
    }

    /// The minimal built-in catalog used when the backend is unreachable.
    #[must_use]
    pub fn fallback() -> Self {
        Self::from_types([
            NodeType::new("ManualTrigger", "Manual Trigger", NodeCategory::Triggers)
                .with_description("Manually trigger workflow execution"),
            NodeType::new("MarketOrder", "Market Order", NodeCategory::Orders)
                .with_description("Place a market order")
                .with_param(ParamSpec::text("symbol").with_default("EURUSD").required())
                .with_param(
                    ParamSpec::select("order_type", ["BUY", "SELL"])
                        .with_default("BUY")
                        .required(),
                )
                .with_param(ParamSpec::number("volume").with_default(0.01).required())
                .with_param(ParamSpec::number("stop_loss"))
                .with_param(ParamSpec::number("take_profit")),
            NodeType::new(
                "DashboardNotification",
                "Dashboard Notification",
                NodeCategory::Notifications,
            )
            .with_description("Send notification to dashboard")
            .with_param(ParamSpec::text("title").with_default("Workflow alert").required())
            .with_param(ParamSpec::text("message").with_default("").required())
            .with_param(
                ParamSpec::select("type", ["info", "success", "warning", "error"])
                    .with_default("info"),
            ),
        ])
    }

    /// Palette sections in category order. Empty categories are omitted.
    #[must_use]
    pub fn categories(&self) -> &[CategoryGroup] {
        &self.groups
    }

    /// Looks up a node type.
    #[must_use]
    pub fn node_type(&self, type_id: &str) -> Option<&NodeType> {
        let &(g, n) = self.index.get(type_id)?;
        self.groups.get(g)?.nodes.get(n)
    }

    /// Default configuration of a type; empty for unknown types.
    #[must_use]
    pub fn default_config(&self, type_id: &str) -> NodeConfig {
        self.node_type(type_id)
            .map(NodeType::default_config)
            .unwrap_or_default()
    }

    /// Total number of node types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the catalog has no node types.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Response body of `GET /agentic/nodes/types`.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeTypesResponse {
    /// Sections keyed by category key.
    pub categories: HashMap<String, CategorySection>,
}

/// One category section of the node-types response.
#[derive(Debug, Clone, Deserialize)]
pub struct CategorySection {
    /// Heading text.
    pub name: String,
    /// Section description.
    #[serde(default)]
    pub description: Option<String>,
    /// Node types in this section.
    #[serde(default)]
    pub nodes: Vec<NodeTypeEntry>,
}

/// One node type in the node-types response.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeTypeEntry {
    /// Type identifier.
    #[serde(rename = "type")]
    pub type_id: String,
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Parameter schema keyed by parameter name.
    #[serde(default)]
    pub config: serde_json::Map<String, JsonValue>,
}

#[derive(Debug, Default, Deserialize)]
struct ParamEntry {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    default: Option<JsonValue>,
    #[serde(default)]
    options: Option<Vec<JsonValue>>,
    #[serde(default)]
    required: Option<bool>,
}

impl NodeTypeEntry {
    fn into_node_type(self, category: NodeCategory) -> NodeType {
        let params = self
            .config
            .iter()
            .map(|(name, raw)| {
                let entry: ParamEntry = serde_json::from_value(raw.clone()).unwrap_or_else(|e| {
                    tracing::debug!(
                        type_id = %self.type_id,
                        param = %name,
                        error = %e,
                        "unreadable parameter schema, treating as text"
                    );
                    ParamEntry::default()
                });
                entry.into_spec(name)
            })
            .collect();

        NodeType {
            type_id: self.type_id,
            display_name: self.name,
            description: self.description,
            category,
            params,
        }
    }
}

impl ParamEntry {
    fn into_spec(self, name: &str) -> ParamSpec {
        let kind = match self.kind.as_deref() {
            Some("number") => ParamKind::Number,
            Some("select") => ParamKind::Select {
                options: self
                    .options
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|o| ParamValue::from_json(o).map(|v| v.to_string()))
                    .collect(),
            },
            _ => ParamKind::Text,
        };

        ParamSpec {
            name: name.to_string(),
            kind,
            default: self.default.as_ref().and_then(ParamValue::from_json),
            required: self.required.unwrap_or(false),
        }
    }
}
