//! Single-pass, single-line lexer.
//!
//! Strings and comments never span lines: an unterminated construct runs to
//! the end of the line it started on.

use crate::language::Language;

/// Lexical class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    Comment,
    TripleString,
    String,
    Number,
    Keyword,
    Builtin,
    CapitalizedIdentifier,
    PlainText,
}

/// A classified slice of one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub class: TokenClass,
    pub text: String,
}

/// Splits lines into tokens using an injected vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer<'a> {
    language: &'a Language,
}

impl<'a> Tokenizer<'a> {
    pub fn new(language: &'a Language) -> Self {
        Self { language }
    }

    /// Tokenize one line. Concatenating the token texts yields `line` exactly.
    pub fn tokenize(&self, line: &str) -> Vec<Token> {
        let chars: Vec<char> = line.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            let (class, end) = if c == '#' {
                (TokenClass::Comment, chars.len())
            } else if let Some(quote) = triple_quote_at(&chars, i) {
                (TokenClass::TripleString, triple_close(&chars, i + 3, quote))
            } else if c == '\'' || c == '"' {
                (TokenClass::String, string_end(&chars, i))
            } else if c.is_ascii_digit() && (i == 0 || !is_word(chars[i - 1])) {
                (TokenClass::Number, scan_while(&chars, i, is_number_char))
            } else if c.is_alphabetic() || c == '_' {
                let end = scan_while(&chars, i, is_word);
                let ident: String = chars[i..end].iter().collect();
                (self.classify(&ident), end)
            } else {
                (TokenClass::PlainText, i + 1)
            };

            tokens.push(Token {
                class,
                text: chars[i..end].iter().collect(),
            });
            i = end;
        }

        tokens
    }

    fn classify(&self, ident: &str) -> TokenClass {
        if self.language.is_keyword(ident) {
            TokenClass::Keyword
        } else if self.language.is_builtin(ident) {
            TokenClass::Builtin
        } else if ident.chars().next().is_some_and(char::is_uppercase) && ident.chars().count() > 1
        {
            TokenClass::CapitalizedIdentifier
        } else {
            TokenClass::PlainText
        }
    }
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '_' | 'e' | 'E' | 'j' | 'J')
}

/// End index (exclusive) of the run starting at `start` whose chars satisfy `pred`.
fn scan_while(chars: &[char], start: usize, pred: fn(char) -> bool) -> usize {
    chars[start..]
        .iter()
        .position(|&c| !pred(c))
        .map_or(chars.len(), |offset| start + offset)
}

fn triple_quote_at(chars: &[char], i: usize) -> Option<char> {
    let quote = chars[i];
    let is_quote = quote == '\'' || quote == '"';
    if is_quote && chars.len() >= i + 3 && chars[i + 1] == quote && chars[i + 2] == quote {
        Some(quote)
    } else {
        None
    }
}

fn triple_close(chars: &[char], from: usize, quote: char) -> usize {
    (from..chars.len().saturating_sub(2))
        .find(|&k| chars[k] == quote && chars[k + 1] == quote && chars[k + 2] == quote)
        .map_or(chars.len(), |k| k + 3)
}

/// End of a single-quoted string starting at `start`; a backslash skips the
/// next character.
fn string_end(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut j = start + 1;
    while j < chars.len() {
        if chars[j] == '\\' {
            j += 2;
            continue;
        }
        if chars[j] == quote {
            return j + 1;
        }
        j += 1;
    }
    chars.len()
}
