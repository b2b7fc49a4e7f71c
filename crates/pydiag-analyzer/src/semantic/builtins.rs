//! The fixed set of names every snippet may use without defining them.

use std::collections::HashSet;

use pydiag_common::AnalyzerConfig;

/// Baseline names. The keywords here lex as keywords and never reach the name check.
const BASE_NAMES: &[&str] = &[
    "print", "def", "class", "import", "from", "return", "if", "else", "elif", "while", "for",
    "in", "True", "False", "None",
];

/// Soft keywords lex as plain names.
const SOFT_KEYWORDS: &[&str] = &["match", "case", "type", "_"];

const BUILTIN_FUNCTIONS: &[&str] = &[
    "abs", "aiter", "all", "anext", "any", "ascii", "bin", "bool", "breakpoint", "bytearray",
    "bytes", "callable", "chr", "classmethod", "compile", "complex", "copyright", "credits",
    "delattr", "dict", "dir", "divmod", "enumerate", "eval", "exec", "exit", "filter", "float",
    "format", "frozenset", "getattr", "globals", "hasattr", "hash", "help", "hex", "id", "input",
    "int", "isinstance", "issubclass", "iter", "len", "license", "list", "locals", "map", "max",
    "memoryview", "min", "next", "object", "oct", "open", "ord", "pow", "property", "quit",
    "range", "repr", "reversed", "round", "set", "setattr", "slice", "sorted", "staticmethod",
    "str", "sum", "super", "tuple", "vars", "zip", "__import__", "Ellipsis", "NotImplemented",
];

const BUILTIN_EXCEPTIONS: &[&str] = &[
    "ArithmeticError", "AssertionError", "AttributeError", "BaseException",
    "BaseExceptionGroup", "BlockingIOError", "BrokenPipeError", "BufferError", "BytesWarning",
    "ChildProcessError", "ConnectionAbortedError", "ConnectionError", "ConnectionRefusedError",
    "ConnectionResetError", "DeprecationWarning", "EOFError", "EncodingWarning",
    "EnvironmentError", "Exception", "ExceptionGroup", "FileExistsError", "FileNotFoundError",
    "FloatingPointError", "FutureWarning", "GeneratorExit", "IOError", "ImportError",
    "ImportWarning", "IndentationError", "IndexError", "InterruptedError", "IsADirectoryError",
    "KeyError", "KeyboardInterrupt", "LookupError", "MemoryError", "ModuleNotFoundError",
    "NameError", "NotADirectoryError", "NotImplementedError", "OSError", "OverflowError",
    "PendingDeprecationWarning", "PermissionError", "ProcessLookupError", "RecursionError",
    "ReferenceError", "ResourceWarning", "RuntimeError", "RuntimeWarning",
    "StopAsyncIteration", "StopIteration", "SyntaxError", "SyntaxWarning", "SystemError",
    "SystemExit", "TabError", "TimeoutError", "TypeError", "UnboundLocalError",
    "UnicodeDecodeError", "UnicodeEncodeError", "UnicodeError", "UnicodeTranslateError",
    "UnicodeWarning", "UserWarning", "ValueError", "Warning", "ZeroDivisionError",
];

const MODULE_ATTRIBUTES: &[&str] = &[
    "__name__", "__file__", "__doc__", "__builtins__", "__spec__", "__loader__", "__package__",
    "__debug__", "__annotations__", "__dict__", "__path__",
];

/// Immutable seed for every [`DefinedNames`](super::names::DefinedNames)
/// set, built once per analyzer from its configuration.
#[derive(Debug, Clone)]
pub struct SeedNames {
    names: HashSet<String>,
}

impl SeedNames {
    pub fn new(config: &AnalyzerConfig) -> Self {
        let names = [
            BASE_NAMES,
            SOFT_KEYWORDS,
            BUILTIN_FUNCTIONS,
            BUILTIN_EXCEPTIONS,
            MODULE_ATTRIBUTES,
        ]
        .into_iter()
        .flatten()
        .map(|name| name.to_string())
        .chain(config.extra_builtins.iter().cloned())
        .collect();
        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for SeedNames {
    fn default() -> Self {
        Self::new(&AnalyzerConfig::default())
    }
}
