//! Graph export for visualizing an assembled service graph.
//!
//! DOT and Mermaid are always available; JSON and YAML need the
//! `graph-export` feature.

use std::collections::HashSet;

#[cfg(feature = "graph-export")]
use serde::{Deserialize, Serialize};

use crate::plan::ConstructionGraph;

/// A service in the exported graph.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct GraphNode {
    /// Service name
    pub id: String,
    pub type_name: String,
    pub lazy: bool,
    pub imported: bool,
    pub tags: Vec<String>,
}

/// Where in a plan a dependency is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub enum EdgeKind {
    /// Needed to construct the service
    Factory,
    /// Needed only by setup calls
    Setup,
}

/// `from` depends on `to`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct GraphMetadata {
    pub service_count: usize,
    pub lazy_count: usize,
    pub imported_count: usize,
    pub exported_at: String,
    pub version: String,
}

/// Nodes and edges of a [`ConstructionGraph`], ready for export.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::*;
///
/// let mut store = DefinitionStore::new();
/// store.add("clock", ServiceDefinition::of_type("Clock")).unwrap();
/// store
///     .add("app", ServiceDefinition::of_type("App").with_factory(Statement::new("App").arg(Reference::name("clock"))))
///     .unwrap();
/// let graph = PlanAssembler::new(&TypeRegistry::new()).assemble(&mut store).unwrap();
///
/// let exported = DependencyGraph::from_graph(&graph);
/// let dot = exported.export(ExportFormat::Dot, &ExportOptions::default()).unwrap();
/// assert!(dot.contains("\"app\" -> \"clock\""));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct DependencyGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub metadata: GraphMetadata,
}

/// Export configuration.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Emit setup-only edges
    pub include_setup: bool,
    /// Only export services of these types (empty = all)
    pub type_filter: HashSet<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_setup: true,
            type_filter: HashSet::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Yaml,
    /// Graphviz
    Dot,
    Mermaid,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("{0} export requires the `graph-export` feature")]
    Unsupported(&'static str),

    #[error("serialization failed: {0}")]
    Serialize(String),
}

impl DependencyGraph {
    /// Builds nodes and edges from assembled plans, in plan order.
    pub fn from_graph(graph: &ConstructionGraph) -> Self {
        let mut nodes = Vec::with_capacity(graph.len());
        let mut edges = Vec::new();
        for (name, plan) in graph.iter() {
            nodes.push(GraphNode {
                id: name.to_string(),
                type_name: plan.ty.to_string(),
                lazy: plan.lazy,
                imported: plan.imported,
                tags: plan.tags.keys().cloned().collect(),
            });
            let factory = plan.factory_dependencies();
            for to in &factory {
                edges.push(GraphEdge { from: name.to_string(), to: to.clone(), kind: EdgeKind::Factory });
            }
            for to in plan.setup_dependencies() {
                if !factory.contains(&to) {
                    edges.push(GraphEdge { from: name.to_string(), to, kind: EdgeKind::Setup });
                }
            }
        }

        let metadata = GraphMetadata {
            service_count: nodes.len(),
            lazy_count: nodes.iter().filter(|n| n.lazy).count(),
            imported_count: nodes.iter().filter(|n| n.imported).count(),
            exported_at: timestamp(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        Self { nodes, edges, metadata }
    }

    pub fn export(&self, format: ExportFormat, options: &ExportOptions) -> Result<String, ExportError> {
        match format {
            ExportFormat::Json => self.export_json(),
            ExportFormat::Yaml => self.export_yaml(),
            ExportFormat::Dot => Ok(self.export_dot(options)),
            ExportFormat::Mermaid => Ok(self.export_mermaid(options)),
        }
    }

    fn export_json(&self) -> Result<String, ExportError> {
        #[cfg(feature = "graph-export")]
        {
            serde_json::to_string_pretty(self).map_err(|e| ExportError::Serialize(e.to_string()))
        }
        #[cfg(not(feature = "graph-export"))]
        {
            Err(ExportError::Unsupported("JSON"))
        }
    }

    fn export_yaml(&self) -> Result<String, ExportError> {
        #[cfg(feature = "graph-export")]
        {
            serde_yaml::to_string(self).map_err(|e| ExportError::Serialize(e.to_string()))
        }
        #[cfg(not(feature = "graph-export"))]
        {
            Err(ExportError::Unsupported("YAML"))
        }
    }

    fn visible(&self, options: &ExportOptions) -> HashSet<&str> {
        self.nodes
            .iter()
            .filter(|n| options.type_filter.is_empty() || options.type_filter.contains(&n.type_name))
            .map(|n| n.id.as_str())
            .collect()
    }

    fn edges_for<'g>(
        &'g self,
        options: &ExportOptions,
        visible: &'g HashSet<&'g str>,
    ) -> impl Iterator<Item = &'g GraphEdge> + 'g {
        let include_setup = options.include_setup;
        self.edges.iter().filter(move |e| {
            (include_setup || e.kind == EdgeKind::Factory)
                && visible.contains(e.from.as_str())
                && visible.contains(e.to.as_str())
        })
    }

    fn export_dot(&self, options: &ExportOptions) -> String {
        let visible = self.visible(options);
        let mut output = String::new();
        output.push_str("digraph ServiceGraph {\n");
        output.push_str("  rankdir=TB;\n");
        output.push_str("  node [shape=box];\n\n");

        for node in self.nodes.iter().filter(|n| visible.contains(n.id.as_str())) {
            let color = if node.imported {
                "lightgrey"
            } else if node.lazy {
                "lightyellow"
            } else {
                "lightblue"
            };
            output.push_str(&format!(
                "  \"{}\" [label=\"{}\\n({})\", fillcolor={}, style=filled];\n",
                node.id, node.id, node.type_name, color
            ));
        }
        output.push('\n');

        for edge in self.edges_for(options, &visible) {
            let style = match edge.kind {
                EdgeKind::Factory => "solid",
                EdgeKind::Setup => "dashed",
            };
            output.push_str(&format!("  \"{}\" -> \"{}\" [style={}];\n", edge.from, edge.to, style));
        }

        output.push_str("}\n");
        output
    }

    fn export_mermaid(&self, options: &ExportOptions) -> String {
        let visible = self.visible(options);
        let mut output = String::new();
        output.push_str("graph TD\n");

        for node in self.nodes.iter().filter(|n| visible.contains(n.id.as_str())) {
            output.push_str(&format!("  {}[\"{}: {}\"]\n", mermaid_id(&node.id), node.id, node.type_name));
        }

        for edge in self.edges_for(options, &visible) {
            let arrow = match edge.kind {
                EdgeKind::Factory => "-->",
                EdgeKind::Setup => "-.->",
            };
            output.push_str(&format!("  {} {} {}\n", mermaid_id(&edge.from), arrow, mermaid_id(&edge.to)));
        }

        output.push_str("\n  classDef lazy fill:#fff3e0\n");
        output.push_str("  classDef imported fill:#eeeeee\n");
        for node in self.nodes.iter().filter(|n| visible.contains(n.id.as_str())) {
            let class = if node.imported {
                "imported"
            } else if node.lazy {
                "lazy"
            } else {
                continue;
            };
            output.push_str(&format!("  class {} {}\n", mermaid_id(&node.id), class));
        }
        output
    }
}

/// Mermaid ids must be plain identifiers.
fn mermaid_id(name: &str) -> String {
    let body: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("s_{}", body)
}

fn timestamp() -> String {
    #[cfg(feature = "graph-export")]
    {
        chrono::Utc::now().to_rfc3339()
    }
    #[cfg(not(feature = "graph-export"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DependencyGraph {
        DependencyGraph {
            nodes: vec![
                GraphNode { id: "app".into(), type_name: "App".into(), lazy: false, imported: false, tags: vec![] },
                GraphNode { id: "db.main".into(), type_name: "PDO".into(), lazy: true, imported: false, tags: vec![] },
                GraphNode { id: "log".into(), type_name: "Logger".into(), lazy: false, imported: true, tags: vec![] },
            ],
            edges: vec![
                GraphEdge { from: "app".into(), to: "db.main".into(), kind: EdgeKind::Factory },
                GraphEdge { from: "app".into(), to: "log".into(), kind: EdgeKind::Setup },
            ],
            metadata: GraphMetadata {
                service_count: 3,
                lazy_count: 1,
                imported_count: 1,
                exported_at: "2024-01-01T00:00:00Z".into(),
                version: "0.1.0".into(),
            },
        }
    }

    #[test]
    fn mermaid_sanitizes_ids() {
        let out = sample().export(ExportFormat::Mermaid, &ExportOptions::default()).unwrap();
        assert!(out.contains("s_app --> s_db_main"));
        assert!(out.contains("s_app -.-> s_log"));
        assert!(out.contains("class s_db_main lazy"));
    }

    #[test]
    fn setup_edges_can_be_hidden() {
        let options = ExportOptions { include_setup: false, ..ExportOptions::default() };
        let out = sample().export(ExportFormat::Dot, &options).unwrap();
        assert!(out.contains("\"app\" -> \"db.main\" [style=solid]"));
        assert!(!out.contains("-> \"log\""));
    }

    #[test]
    fn type_filter_drops_nodes_and_their_edges() {
        let mut options = ExportOptions::default();
        options.type_filter.insert("App".into());
        options.type_filter.insert("Logger".into());
        let out = sample().export(ExportFormat::Dot, &options).unwrap();
        assert!(!out.contains("db.main"));
        assert!(out.contains("\"app\" -> \"log\""));
    }

    #[test]
    fn structured_formats() {
        let graph = sample();
        #[cfg(feature = "graph-export")]
        {
            let json = graph.export(ExportFormat::Json, &ExportOptions::default()).unwrap();
            assert!(json.contains("\"service_count\": 3"));
            let yaml = graph.export(ExportFormat::Yaml, &ExportOptions::default()).unwrap();
            assert!(yaml.contains("lazy_count: 1"));
        }
        #[cfg(not(feature = "graph-export"))]
        {
            assert!(matches!(
                graph.export(ExportFormat::Json, &ExportOptions::default()),
                Err(ExportError::Unsupported("JSON"))
            ));
        }
    }
}
