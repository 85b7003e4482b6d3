//! Highlighting vocabularies.
//!
//! A [`Language`] is immutable data handed to a tokenizer; adding a language
//! means adding another constant and a name in [`Language::lookup`].

/// Keyword and builtin vocabulary for one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    /// Builtin functions plus conventional import aliases.
    pub builtins: &'static [&'static str],
}

impl Language {
    /// Find a shipped language by (lowercase) name or common alias.
    pub fn lookup(name: &str) -> Option<&'static Language> {
        match name.trim().to_lowercase().as_str() {
            "python" | "python3" | "py" | "ipython" => Some(&PYTHON),
            _ => None,
        }
    }

    pub fn is_keyword(&self, ident: &str) -> bool {
        self.keywords.contains(&ident)
    }

    pub fn is_builtin(&self, ident: &str) -> bool {
        self.builtins.contains(&ident)
    }
}

pub const PYTHON: Language = Language {
    name: "python",
    keywords: &[
        "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
        "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
        "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise",
        "return", "try", "while", "with", "yield",
    ],
    builtins: &[
        "print", "len", "range", "enumerate", "zip", "map", "filter", "sum", "min", "max",
        "abs", "round", "int", "float", "str", "list", "dict", "set", "tuple", "bool", "type",
        "isinstance", "open", "sorted", "reversed", "any", "all", "super", "self", "np", "pd",
        "plt", "sns", "sp", "stats", "math", "random",
    ],
};
