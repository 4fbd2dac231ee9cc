use serde::Serialize;

/// Registered elementwise operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OpKind {
    /// a + b (element-wise)
    Add,
    /// a - b (element-wise)
    Subtract,
    /// a * b (element-wise)
    Multiply,
}

/// Name table consulted by the parser and the dispatcher. Adding an operator
/// means adding a variant above plus its rows here.
const OP_TABLE: &[(&str, OpKind)] = &[
    ("add", OpKind::Add),
    ("sub", OpKind::Subtract),
    ("subtract", OpKind::Subtract),
    ("mul", OpKind::Multiply),
    ("multiply", OpKind::Multiply),
];

impl OpKind {
    pub fn from_name(name: &str) -> Option<Self> {
        OP_TABLE
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, op)| *op)
    }

    /// Canonical (short) spelling.
    pub fn name(self) -> &'static str {
        match self {
            OpKind::Add => "add",
            OpKind::Subtract => "sub",
            OpKind::Multiply => "mul",
        }
    }

    /// Number of operands the operator consumes.
    pub fn arity(self) -> usize {
        match self {
            OpKind::Add | OpKind::Subtract | OpKind::Multiply => 2,
        }
    }

    #[inline(always)]
    pub fn apply(self, a: f32, b: f32) -> f32 {
        match self {
            OpKind::Add => a + b,
            OpKind::Subtract => a - b,
            OpKind::Multiply => a * b,
        }
    }
}

/// All accepted operator spellings, in table order.
pub fn registered_names() -> impl Iterator<Item = &'static str> {
    OP_TABLE.iter().map(|(n, _)| *n)
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
