//! RFC 5322 single-address grammar.
//!
//! Accepts a bare `addr-spec` (`local@domain`) or a `name-addr`
//! (`[display-name] <local@domain>`), with optional whitespace and comments between
//! tokens. Encoded words and group syntax are not supported.

use std::net::IpAddr;

const ATEXT_SPECIALS: &str = "!#$%&'*+-/=?^_`{|}~";

/// Returns `true` when `input` is exactly one well-formed mailbox address.
#[must_use]
pub fn is_valid_address(input: &str) -> bool {
    let mut cursor = Cursor::new(input);
    cursor.skip_space();
    if cursor.is_empty() {
        return false;
    }

    let parsed = {
        let mut attempt = cursor.clone();
        if attempt.addr_spec() {
            cursor = attempt;
            true
        } else {
            cursor.name_addr()
        }
    };

    parsed && cursor.skip_cfws() && cursor.is_empty()
}

#[derive(Debug, Clone)]
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let next = self.peek()?;
        self.rest = &self.rest[next.len_utf8()..];
        Some(next)
    }

    fn consume(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.rest = &self.rest[expected.len_utf8()..];
            true
        } else {
            false
        }
    }

    fn skip_space(&mut self) {
        self.rest = self.rest.trim_start_matches([' ', '\t']);
    }

    /// Skips folding whitespace and comments. Returns `false` on an unterminated comment.
    fn skip_cfws(&mut self) -> bool {
        loop {
            self.skip_space();
            if !self.consume('(') {
                return true;
            }
            if !self.comment_body() {
                return false;
            }
        }
    }

    fn comment_body(&mut self) -> bool {
        let mut depth = 1usize;
        while depth > 0 {
            match self.bump() {
                None => return false,
                Some('\\') => {
                    if self.bump().is_none() {
                        return false;
                    }
                }
                Some('(') => depth += 1,
                Some(')') => depth -= 1,
                Some(_) => {}
            }
        }
        true
    }

    /// `[display-name] "<" addr-spec ">"`
    fn name_addr(&mut self) -> bool {
        if self.peek() != Some('<') && !self.phrase() {
            return false;
        }
        if !self.skip_cfws() || !self.consume('<') {
            return false;
        }
        self.addr_spec() && self.consume('>')
    }

    /// One or more words, where a word is a quoted string or a (dot-tolerant) atom.
    fn phrase(&mut self) -> bool {
        let mut words = 0usize;
        loop {
            if !self.skip_cfws() {
                return false;
            }
            let matched = match self.peek() {
                Some('"') => self.quoted_string(Quoted::MayBeEmpty),
                Some(next) if is_atext(next) || next == '.' => self.atom(AtomKind::Phrase),
                _ => break,
            };
            if !matched {
                return false;
            }
            words += 1;
        }
        words > 0
    }

    /// `local-part "@" domain`
    fn addr_spec(&mut self) -> bool {
        self.skip_space();
        let local_ok = match self.peek() {
            Some('"') => self.quoted_string(Quoted::NonEmpty),
            Some(_) => self.atom(AtomKind::Dotted),
            None => false,
        };
        if !local_ok || !self.consume('@') {
            return false;
        }

        self.skip_space();
        match self.peek() {
            Some('[') => self.domain_literal(),
            Some(_) => self.atom(AtomKind::Dotted),
            None => false,
        }
    }

    /// Consumes an atom. Phrase atoms tolerate stray dots; dotted atoms must not start
    /// or end with a dot, nor contain two consecutive dots. Returns `false` when
    /// nothing was consumed or the dot placement is invalid.
    fn atom(&mut self, kind: AtomKind) -> bool {
        let end = self
            .rest
            .char_indices()
            .find(|&(_, c)| !(is_atext(c) || c == '.'))
            .map_or(self.rest.len(), |(index, _)| index);
        let atom = &self.rest[..end];
        if atom.is_empty() {
            return false;
        }
        if kind == AtomKind::Dotted
            && (atom.starts_with('.') || atom.ends_with('.') || atom.contains(".."))
        {
            return false;
        }
        self.rest = &self.rest[end..];
        true
    }

    /// `DQUOTE *(qtext / quoted-pair) DQUOTE`. Only a local part must have content.
    fn quoted_string(&mut self, quoted: Quoted) -> bool {
        if !self.consume('"') {
            return false;
        }
        let mut content = 0usize;
        loop {
            match self.bump() {
                None => return false,
                Some('"') => return content > 0 || quoted == Quoted::MayBeEmpty,
                Some('\\') => match self.bump() {
                    Some(escaped) if is_vchar(escaped) || is_wsp(escaped) => content += 1,
                    _ => return false,
                },
                Some(next) if is_qtext(next) || is_wsp(next) => content += 1,
                Some(_) => return false,
            }
        }
    }

    /// `"[" *dtext "]"`; the bracketed text must be an IP address.
    fn domain_literal(&mut self) -> bool {
        if !self.consume('[') {
            return false;
        }
        let Some(end) = self.rest.find(']') else {
            return false;
        };
        let literal = &self.rest[..end];
        if !literal.chars().all(is_dtext) || literal.parse::<IpAddr>().is_err() {
            return false;
        }
        self.rest = &self.rest[end + 1..];
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AtomKind {
    Dotted,
    Phrase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quoted {
    NonEmpty,
    MayBeEmpty,
}

fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric() || ATEXT_SPECIALS.contains(c) || !c.is_ascii()
}

fn is_vchar(c: char) -> bool {
    ('!'..='~').contains(&c) || !c.is_ascii()
}

fn is_wsp(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_qtext(c: char) -> bool {
    is_vchar(c) && c != '"' && c != '\\'
}

fn is_dtext(c: char) -> bool {
    ('!'..='Z').contains(&c) || ('^'..='~').contains(&c)
}
