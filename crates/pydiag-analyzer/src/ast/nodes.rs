use std::fmt;

use pydiag_common::Span;

// ============================================================================
// Arena
// ============================================================================

/// Index of a node inside an [`Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One node of the syntax tree.
///
/// `children` are listed in source order and are owned by this node alone;
/// nodes never point back at their parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub children: Vec<NodeId>,
}

/// A parsed module stored as a flat arena of nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Ast {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Append-only arena used while parsing.
#[derive(Debug, Default)]
pub struct AstBuilder {
    nodes: Vec<Node>,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: NodeKind, span: Span, children: Vec<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            span,
            children,
        });
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Span of a node, or an empty span for an unknown id.
    pub fn span(&self, id: NodeId) -> Span {
        self.get(id).map(|n| n.span).unwrap_or_default()
    }

    /// Discard every node allocated after `len` (used when backtracking).
    pub fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn finish(self, root: NodeId) -> Ast {
        Ast {
            nodes: self.nodes,
            root,
        }
    }
}

// ============================================================================
// Node kinds
// ============================================================================

/// Whether a name-like expression is read, bound or deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprContext {
    Load,
    Store,
    Del,
}

/// How a parameter may be passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    PositionalOnly,
    Regular,
    /// `*args`
    VarPositional,
    KeywordOnly,
    /// `**kwargs`
    VarKeyword,
}

/// One `name [as asname]` entry of an import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    /// Possibly dotted (`os.path`) for `import`; `*` for star imports.
    pub name: String,
    pub asname: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mult,
    MatMult,
    Div,
    FloorDiv,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Invert,
    Not,
    UAdd,
    USub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

/// Literal values. Numbers and strings keep their source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    None,
    True,
    False,
    Ellipsis,
    Number(String),
    /// One or more adjacent string literals, concatenated as written.
    Str(String),
}

/// All node kinds. Operands and sub-statements live in `Node::children`.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // === Structure ===
    Module,
    /// An indented suite or a simple-statement list after `:`.
    Block,

    // === Definitions ===
    FunctionDef { name: String, is_async: bool },
    ClassDef { name: String },
    Decorator,
    Parameter { name: String, kind: ParamKind },
    TypeParam { name: String },
    Lambda,

    // === Statements ===
    Return,
    Delete,
    Assign,
    AugAssign { op: Operator },
    AnnAssign,
    For { is_async: bool },
    While,
    If,
    With { is_async: bool },
    WithItem,
    Match,
    MatchCase,
    /// `pattern as name`.
    MatchAs { name: String },
    Raise,
    Try { is_star: bool },
    ExceptHandler { name: Option<String> },
    Assert,
    Import { names: Vec<Alias> },
    ImportFrom { module: Option<String>, level: u32, names: Vec<Alias> },
    Global { names: Vec<String> },
    Nonlocal { names: Vec<String> },
    ExprStmt,
    Pass,
    Break,
    Continue,

    // === Expressions ===
    BoolOp { op: BoolOp },
    NamedExpr,
    BinOp { op: Operator },
    UnaryOp { op: UnaryOp },
    IfExp,
    Dict,
    /// `**mapping` inside a dict display or a mapping pattern.
    DictUnpack,
    Set,
    ListComp,
    SetComp,
    DictComp,
    GeneratorExp,
    Comprehension { is_async: bool },
    Await,
    Yield,
    YieldFrom,
    Compare { ops: Vec<CmpOp> },
    Call,
    /// `name=value` call argument, or `**mapping` when `arg` is `None`.
    Keyword { arg: Option<String> },
    Constant { value: Constant },
    Attribute { attr: String, ctx: ExprContext },
    Subscript { ctx: ExprContext },
    Starred { ctx: ExprContext },
    Name { id: String, ctx: ExprContext },
    List { ctx: ExprContext },
    Tuple { ctx: ExprContext },
    Slice,
}

impl NodeKind {
    /// Short description used in target-validation errors.
    pub fn describe(&self) -> &'static str {
        match self {
            NodeKind::Call => "function call",
            NodeKind::Constant { value } => match value {
                Constant::None => "None",
                Constant::True => "True",
                Constant::False => "False",
                Constant::Ellipsis => "ellipsis",
                Constant::Number(_) | Constant::Str(_) => "literal",
            },
            NodeKind::BinOp { .. } | NodeKind::UnaryOp { .. } => "expression",
            NodeKind::BoolOp { .. } => "expression",
            NodeKind::Compare { .. } => "comparison",
            NodeKind::IfExp => "conditional expression",
            NodeKind::Lambda => "lambda",
            NodeKind::NamedExpr => "named expression",
            NodeKind::Await => "await expression",
            NodeKind::Yield | NodeKind::YieldFrom => "yield expression",
            NodeKind::Dict => "dict literal",
            NodeKind::Set => "set display",
            NodeKind::ListComp => "list comprehension",
            NodeKind::SetComp => "set comprehension",
            NodeKind::DictComp => "dict comprehension",
            NodeKind::GeneratorExp => "generator expression",
            _ => "expression",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_allocates_in_order() {
        let mut builder = AstBuilder::new();
        let name = builder.push(
            NodeKind::Name {
                id: "x".into(),
                ctx: ExprContext::Load,
            },
            Span::default(),
            vec![],
        );
        let stmt = builder.push(NodeKind::ExprStmt, Span::default(), vec![name]);
        let module = builder.push(NodeKind::Module, Span::default(), vec![stmt]);
        let ast = builder.finish(module);

        assert_eq!(ast.len(), 3);
        assert_eq!(ast.root(), module);
        assert_eq!(ast.get(stmt).unwrap().children, vec![name]);
        assert!(ast.get(NodeId(9)).is_none());
    }

    #[test]
    fn truncate_discards_speculative_nodes() {
        let mut builder = AstBuilder::new();
        builder.push(NodeKind::Pass, Span::default(), vec![]);
        let mark = builder.len();
        builder.push(NodeKind::Break, Span::default(), vec![]);
        builder.truncate(mark);
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn describe_targets() {
        assert_eq!(NodeKind::Call.describe(), "function call");
        assert_eq!(
            NodeKind::Constant {
                value: Constant::Number("1".into())
            }
            .describe(),
            "literal"
        );
    }
}
