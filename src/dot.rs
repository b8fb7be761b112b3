//! ADD to DOT (Graphviz) conversion.
//!
//! - **Terminal nodes** are boxes at the bottom (sink rank), labelled with their value
//! - **Decision nodes** are circles, one rank per level
//! - **Edges**: solid for then-branches, dashed for else-branches
//! - **Root nodes** are rectangles at the top (source rank)
//!
//! ```
//! use add_rs::manager::AddManager;
//! use add_rs::types::Var;
//!
//! let mgr = AddManager::default();
//! let f = mgr.tabulate(&[Var::new(1), Var::new(2)], |a| a[0] as u8 as f64 + 0.5).unwrap();
//! let dot = mgr.to_dot(&[&f]).unwrap();
//! assert!(dot.contains("0.5"));
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::diagram::Diagram;
use crate::manager::AddManager;
use crate::node::Node;

/// Configuration options for DOT output generation.
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for decision nodes (default: "circle")
    pub node_shape: &'static str,
    /// Shape for terminal nodes (default: "box")
    pub terminal_shape: &'static str,
    /// Shape for root nodes (default: "rect")
    pub root_shape: &'static str,
    /// Style for high (then) edges (default: "solid")
    pub high_edge_style: &'static str,
    /// Style for low (else) edges (default: "dashed")
    pub low_edge_style: &'static str,
    /// Whether to use HTML labels for subscripts (default: true)
    pub use_html_labels: bool,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            node_shape: "circle",
            terminal_shape: "box",
            root_shape: "rect",
            high_edge_style: "solid",
            low_edge_style: "dashed",
            use_html_labels: true,
        }
    }
}

impl AddManager {
    pub fn to_dot(&self, roots: &[&Diagram<'_>]) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(roots, &DotConfig::default())
    }

    pub fn to_dot_with_config(&self, roots: &[&Diagram<'_>], config: &DotConfig) -> Result<String, std::fmt::Error> {
        let mut dot = String::new();
        writeln!(dot, "digraph {{")?;
        writeln!(dot, "node [shape={}];", config.node_shape)?;

        let all_nodes = self.descendants(roots.iter().map(|d| d.node()));

        let mut terminals = Vec::new();
        let mut levels = BTreeMap::<usize, Vec<_>>::new();
        for &r in &all_nodes {
            match self.node(r) {
                Node::Terminal(value) => terminals.push((r, value)),
                Node::Decision { variable, .. } => {
                    levels.entry(self.level_of(variable).index()).or_default().push((r, variable));
                }
            }
        }

        writeln!(dot, "{{ rank=sink")?;
        for (r, value) in terminals {
            writeln!(dot, "{} [shape={}, label=\"{}\"];", r.get(), config.terminal_shape, value)?;
        }
        writeln!(dot, "}}")?;

        for nodes in levels.values() {
            writeln!(dot, "{{ rank=same")?;
            for &(r, variable) in nodes {
                let label = if config.use_html_labels {
                    format!("<x<SUB>{}</SUB>>", variable.id())
                } else {
                    format!("\"{}\"", variable)
                };
                writeln!(dot, "{} [label={}];", r.get(), label)?;
            }
            writeln!(dot, "}}")?;
        }

        for &r in &all_nodes {
            if let Some((high, low)) = self.node(r).children() {
                writeln!(dot, "{} -> {} [style={}];", r.get(), high.get(), config.high_edge_style)?;
                writeln!(dot, "{} -> {} [style={}];", r.get(), low.get(), config.low_edge_style)?;
            }
        }

        writeln!(dot, "{{ rank=source")?;
        for (i, root) in roots.iter().enumerate() {
            writeln!(dot, "r{} [shape={}, label=\"{}\"];", i, config.root_shape, root)?;
        }
        writeln!(dot, "}}")?;
        for (i, root) in roots.iter().enumerate() {
            writeln!(dot, "r{} -> {};", i, root.node().get())?;
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}
