use std::{collections::HashMap, fmt::Display};

use bitflags::bitflags;
use lazy_static::lazy_static;

use crate::{
    lexer::tokens::Token, parser::structure::FunctionId, type_checker::frames::FrameId,
    SourceLocation,
};

use super::types::Type;

bitflags! {
    /// Properties of a node kind that decide what may be done with it.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct NodeTraits: u8 {
        /// Names a storage location: can be assigned to and referenced.
        const LVALUE = 1 << 0;
        /// Known at compile time.
        const CONSTANT = 1 << 1;
    }
}

lazy_static! {
    pub static ref NODE_TRAITS: HashMap<NodeTag, NodeTraits> = {
        let mut map = HashMap::new();
        map.insert(NodeTag::Literal, NodeTraits::CONSTANT);
        map.insert(NodeTag::Identifier, NodeTraits::LVALUE);
        map.insert(NodeTag::Index, NodeTraits::LVALUE);
        map.insert(NodeTag::Dereference, NodeTraits::LVALUE);
        map
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeTag {
    Empty,
    Literal,
    Identifier,
    Block,
    If,
    While,
    For,
    FunctionCall,
    Index,
    Is,
    As,
    Reference,
    Dereference,
    Return,
    BinaryOp,
    Assign,
    Declaration,
    Break,
    Continue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    /// A resolved overload of a module level function.
    Function { name: String, id: FunctionId },
    /// An expression of function pointer type.
    Pointer(Box<Node>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Placeholder left behind by a statement that failed to parse.
    Empty,
    Literal(Token),
    Identifier(Token),
    Block(Vec<Node>),
    If {
        condition: Box<Node>,
        body: Box<Node>,
        else_body: Option<Box<Node>>,
    },
    While {
        condition: Box<Node>,
        body: Box<Node>,
        else_body: Option<Box<Node>>,
    },
    For {
        setup: Option<Box<Node>>,
        condition: Option<Box<Node>>,
        increment: Option<Box<Node>>,
        body: Box<Node>,
    },
    FunctionCall {
        callee: Callee,
        arguments: Vec<Node>,
    },
    Index {
        of: Box<Node>,
        by: Box<Node>,
    },
    Is {
        expr: Box<Node>,
        ty: Type,
    },
    As {
        expr: Box<Node>,
        ty: Type,
    },
    Reference(Box<Node>),
    Dereference(Box<Node>),
    Return(Box<Node>),
    /// `function` is set when an `@infix` overload implements the operator.
    BinaryOp {
        left: Box<Node>,
        operator: Token,
        function: Option<FunctionId>,
        right: Box<Node>,
    },
    Assign {
        target: Box<Node>,
        value: Box<Node>,
    },
    Declaration {
        name: Token,
        ty: Type,
        value: Option<Box<Node>>,
    },
    Break,
    Continue,
}

/// An AST node, tagged with the frame it was parsed in.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub frame: FrameId,
    pub location: SourceLocation,
}

impl Node {
    pub fn new(kind: NodeKind, frame: FrameId, location: SourceLocation) -> Self {
        Node {
            kind,
            frame,
            location,
        }
    }

    pub fn empty(frame: FrameId, location: SourceLocation) -> Self {
        Node::new(NodeKind::Empty, frame, location)
    }

    pub fn tag(&self) -> NodeTag {
        match &self.kind {
            NodeKind::Empty => NodeTag::Empty,
            NodeKind::Literal(_) => NodeTag::Literal,
            NodeKind::Identifier(_) => NodeTag::Identifier,
            NodeKind::Block(_) => NodeTag::Block,
            NodeKind::If { .. } => NodeTag::If,
            NodeKind::While { .. } => NodeTag::While,
            NodeKind::For { .. } => NodeTag::For,
            NodeKind::FunctionCall { .. } => NodeTag::FunctionCall,
            NodeKind::Index { .. } => NodeTag::Index,
            NodeKind::Is { .. } => NodeTag::Is,
            NodeKind::As { .. } => NodeTag::As,
            NodeKind::Reference(_) => NodeTag::Reference,
            NodeKind::Dereference(_) => NodeTag::Dereference,
            NodeKind::Return(_) => NodeTag::Return,
            NodeKind::BinaryOp { .. } => NodeTag::BinaryOp,
            NodeKind::Assign { .. } => NodeTag::Assign,
            NodeKind::Declaration { .. } => NodeTag::Declaration,
            NodeKind::Break => NodeTag::Break,
            NodeKind::Continue => NodeTag::Continue,
        }
    }

    pub fn traits(&self) -> NodeTraits {
        NODE_TRAITS
            .get(&self.tag())
            .copied()
            .unwrap_or(NodeTraits::empty())
    }

    pub fn is_lvalue(&self) -> bool {
        self.traits().contains(NodeTraits::LVALUE)
    }

    pub fn is_constant(&self) -> bool {
        self.traits().contains(NodeTraits::CONSTANT)
    }

    fn children(&self) -> Vec<&Node> {
        match &self.kind {
            NodeKind::Empty
            | NodeKind::Literal(_)
            | NodeKind::Identifier(_)
            | NodeKind::Break
            | NodeKind::Continue => vec![],
            NodeKind::Block(statements) => statements.iter().collect(),
            NodeKind::If {
                condition,
                body,
                else_body,
            }
            | NodeKind::While {
                condition,
                body,
                else_body,
            } => {
                let mut children = vec![condition.as_ref(), body.as_ref()];
                children.extend(else_body.as_deref());
                children
            }
            NodeKind::For {
                setup,
                condition,
                increment,
                body,
            } => {
                let mut children: Vec<&Node> = vec![];
                children.extend(setup.as_deref());
                children.extend(condition.as_deref());
                children.extend(increment.as_deref());
                children.push(body);
                children
            }
            NodeKind::FunctionCall { callee, arguments } => {
                let mut children: Vec<&Node> = vec![];
                if let Callee::Pointer(pointer) = callee {
                    children.push(pointer);
                }
                children.extend(arguments.iter());
                children
            }
            NodeKind::Index { of, by } => vec![of.as_ref(), by.as_ref()],
            NodeKind::Is { expr, .. } | NodeKind::As { expr, .. } => vec![expr.as_ref()],
            NodeKind::Reference(of) | NodeKind::Dereference(of) | NodeKind::Return(of) => {
                vec![of.as_ref()]
            }
            NodeKind::BinaryOp { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            NodeKind::Assign { target, value } => vec![target.as_ref(), value.as_ref()],
            NodeKind::Declaration { value, .. } => value.as_deref().into_iter().collect(),
        }
    }

    fn label(&self) -> String {
        match &self.kind {
            NodeKind::Literal(token) | NodeKind::Identifier(token) => {
                format!("{:?} {}", self.tag(), token)
            }
            NodeKind::FunctionCall {
                callee: Callee::Function { name, .. },
                ..
            } => format!("FunctionCall {}", name),
            NodeKind::Is { ty, .. } | NodeKind::As { ty, .. } => {
                format!("{:?} {}", self.tag(), ty)
            }
            NodeKind::BinaryOp { operator, .. } => format!("BinaryOp {}", operator.value),
            NodeKind::Declaration { name, ty, .. } => format!("Declaration {}: {}", name.value, ty),
            _ => format!("{:?}", self.tag()),
        }
    }

    fn write_tree(&self, f: &mut std::fmt::Formatter<'_>, depth: usize) -> std::fmt::Result {
        writeln!(f, "{:indent$}{}", "", self.label(), indent = depth * 2)?;
        for child in self.children() {
            child.write_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.write_tree(f, 0)
    }
}
