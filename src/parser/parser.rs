use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::error::{serialize_message, ParseError};
use crate::grammar::grammar::EPSILON;
use crate::lexer::lexer::Token;

/// Describes a parse tree node.
///
/// Terminals are labelled with the matched token text, non-terminals with
/// their head, and empty derivations with `ε`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub id: usize,
    pub label: String,
    pub is_terminal: bool,
    // Empty for terminals.
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(id: usize, label: impl Into<String>, is_terminal: bool) -> Self {
        Self {
            id,
            label: label.into(),
            is_terminal,
            children: Vec::new(),
        }
    }

    /// Walks the tree in pre-order, which is also node creation order.
    pub fn walk(&self) -> Vec<&TreeNode> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }

    /// Concatenates the labels of the leaves, skipping `ε`.
    pub fn leaves(&self) -> Vec<&str> {
        self.walk()
            .into_iter()
            .filter(|n| n.is_terminal && n.label != EPSILON)
            .map(|n| n.label.as_str())
            .collect()
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        if self.is_terminal {
            writeln!(f, "{}'{}'", indent, self.label)?;
        } else {
            writeln!(f, "{}<{}>", indent, self.label)?;
        }
        for child in &self.children {
            child.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

/// Renders `<E>` for non-terminals and `'3'` for terminals, one per line.
impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepAction {
    Add,
}

const EXPAND_PREFIX: &str = "Expand non-terminal <";
const MATCH_PREFIX: &str = "Match terminal '";
const EPSILON_DESCRIPTION: &str = "Match epsilon (empty string)";

/// One node-creation event. `parent_id` is `None` for the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub action: StepAction,
    pub description: String,
    pub node_id: usize,
    pub parent_id: Option<usize>,
}

impl Step {
    pub fn add(node: &TreeNode, parent_id: Option<usize>) -> Self {
        let description = if !node.is_terminal {
            format!("{}{}>", EXPAND_PREFIX, node.label)
        } else if node.label == EPSILON {
            EPSILON_DESCRIPTION.to_string()
        } else {
            format!("{}{}'", MATCH_PREFIX, node.label)
        };
        Self {
            action: StepAction::Add,
            description,
            node_id: node.id,
            parent_id,
        }
    }

    /// Recovers the node a step created from its description.
    pub fn node(&self) -> Option<TreeNode> {
        let d = self.description.as_str();
        let (label, is_terminal) = if d == EPSILON_DESCRIPTION {
            (EPSILON, true)
        } else if let Some(rest) = d.strip_prefix(EXPAND_PREFIX) {
            (rest.strip_suffix('>')?, false)
        } else {
            (d.strip_prefix(MATCH_PREFIX)?.strip_suffix('\'')?, true)
        };
        Some(TreeNode::new(self.node_id, label, is_terminal))
    }
}

/// Rebuilds the tree described by a prefix of a step log.
///
/// Returns `None` for an empty log or if a step is malformed, refers to a
/// parent that was not created by an earlier step, or a second root appears.
pub fn replay(steps: &[Step]) -> Option<TreeNode> {
    let mut nodes: HashMap<usize, TreeNode> = HashMap::new();
    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut root = None;

    for step in steps {
        let node = step.node()?;
        match step.parent_id {
            Some(parent) if nodes.contains_key(&parent) => {
                children.entry(parent).or_default().push(node.id)
            }
            None if root.is_none() => root = Some(node.id),
            _ => return None,
        }
        nodes.insert(node.id, node);
    }

    fn assemble(
        id: usize,
        nodes: &mut HashMap<usize, TreeNode>,
        children: &HashMap<usize, Vec<usize>>,
    ) -> Option<TreeNode> {
        let mut node = nodes.remove(&id)?;
        for &child in children.get(&id).into_iter().flatten() {
            node.children.push(assemble(child, nodes, children)?);
        }
        Some(node)
    }

    assemble(root?, &mut nodes, &children)
}

/// Describes a parser for grammars compiled from text.
pub trait Parser {
    /// Tokenizes and parses `input`. Steps are recorded only when asked for.
    fn parse(&self, input: &str, record_steps: bool) -> ParseResult;
}

/// Everything a renderer needs from one parse invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    pub success: bool,
    pub tree: Option<TreeNode>,
    pub steps: Vec<Step>,
    #[serde(serialize_with = "serialize_message")]
    pub error: Option<ParseError>,
    pub tokens: Vec<Token>,
}

impl ParseResult {
    pub fn failure(error: ParseError, tokens: Vec<Token>) -> Self {
        Self {
            success: false,
            tree: None,
            steps: Vec::new(),
            error: Some(error),
            tokens,
        }
    }

    /// The error message, as a renderer would display it.
    pub fn message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}
