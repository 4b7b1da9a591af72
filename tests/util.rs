#![allow(dead_code)]

use parsetree::parser::parser::TreeNode;

/// A parse tree without node ids, so expected trees stay readable.
#[derive(Debug, PartialEq, Eq)]
pub struct Shape {
    pub label: String,
    pub terminal: bool,
    pub children: Vec<Shape>,
}

pub fn shape(node: &TreeNode) -> Shape {
    Shape {
        label: node.label.clone(),
        terminal: node.is_terminal,
        children: node.children.iter().map(shape).collect(),
    }
}

// Sugar to produce trees in tests.
#[macro_export]
macro_rules! make_node {
    ($label: expr, $children: expr) => {
        $crate::util::Shape {
            label: $label.to_string(),
            terminal: false,
            children: $children,
        }
    };
}

#[macro_export]
macro_rules! leaf {
    ($label: expr) => {
        $crate::util::Shape {
            label: $label.to_string(),
            terminal: true,
            children: vec![],
        }
    };
}

#[macro_export]
macro_rules! eps_node {
    () => {
        $crate::leaf!("ε")
    };
}
