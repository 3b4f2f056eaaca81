//! Escaping for SQL string literals and identifiers.

/// Turns arbitrary strings into SQL literals and identifiers.
///
/// Both methods are total: there is no input they reject, and the server
/// reads the result back as exactly the input string.
pub trait QueryQuoter {
    /// Single-quoted string literal.
    fn quote_value(&self, value: &str) -> String;

    /// Back-tick-delimited identifier.
    fn quote_identifier(&self, identifier: &str) -> String;
}

/// Quoter for MySQL with the default `sql_mode` (backslash escapes on).
#[derive(Debug, Clone, Copy, Default)]
pub struct StringQueryQuoter;

impl StringQueryQuoter {
    pub fn new() -> Self {
        Self
    }
}

impl QueryQuoter for StringQueryQuoter {
    fn quote_value(&self, value: &str) -> String {
        let mut quoted = String::with_capacity(value.len() + 2);
        quoted.push('\'');
        for ch in value.chars() {
            match ch {
                '\\' => quoted.push_str("\\\\"),
                '\'' => quoted.push_str("\\'"),
                '`' => quoted.push_str("\\`"),
                '\0' => quoted.push_str("\\0"),
                '\n' => quoted.push_str("\\n"),
                '\r' => quoted.push_str("\\r"),
                '\x1a' => quoted.push_str("\\Z"),
                _ => quoted.push(ch),
            }
        }
        quoted.push('\'');
        quoted
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        format!("`{}`", identifier.replace('`', "``"))
    }
}

/// `'name'@'host'` account reference.
pub fn account<Q: QueryQuoter + ?Sized>(quoter: &Q, name: &str, host: &str) -> String {
    format!("{}@{}", quoter.quote_value(name), quoter.quote_value(host))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Read a literal back the way the server does.
    fn unquote_value(literal: &str) -> String {
        let inner = &literal[1..literal.len() - 1];
        let mut out = String::new();
        let mut chars = inner.chars();
        while let Some(ch) = chars.next() {
            if ch != '\\' {
                out.push(ch);
                continue;
            }
            match chars.next() {
                Some('0') => out.push('\0'),
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('Z') => out.push('\x1a'),
                Some(other) => out.push(other),
                None => panic!("dangling escape in {literal}"),
            }
        }
        out
    }

    fn unquote_identifier(quoted: &str) -> String {
        quoted[1..quoted.len() - 1].replace("``", "`")
    }

    #[test]
    fn test_quote_value() {
        let quoter = StringQueryQuoter::new();
        assert_eq!(quoter.quote_value("test"), "'test'");
        assert_eq!(
            quoter.quote_value("'; injected code ;'"),
            "'\\'; injected code ;\\''"
        );
        assert_eq!(
            quoter.quote_value("`; injected code ;`"),
            "'\\`; injected code ;\\`'"
        );
    }

    #[test]
    fn test_quote_identifier() {
        let quoter = StringQueryQuoter::new();
        assert_eq!(quoter.quote_identifier("test"), "`test`");
        assert_eq!(quoter.quote_identifier("a`b"), "`a``b`");
    }

    #[test]
    fn test_literal_never_terminates_early() {
        let quoter = StringQueryQuoter::new();
        for input in ["\\", "\\'", "'\\", "x\\", "''", "\\\\'"] {
            let quoted = quoter.quote_value(input);
            // Every quote inside the delimiters is preceded by an odd run of
            // backslashes.
            let inner = &quoted[1..quoted.len() - 1];
            let bytes = inner.as_bytes();
            for (i, b) in bytes.iter().enumerate() {
                if *b == b'\'' {
                    let run = bytes[..i].iter().rev().take_while(|c| **c == b'\\').count();
                    assert_eq!(run % 2, 1, "unescaped quote in {quoted}");
                }
            }
            assert!(!inner.ends_with('\\') || inner.ends_with("\\\\"));
        }
    }

    #[test]
    fn test_round_trip() {
        let quoter = StringQueryQuoter::new();
        let inputs = [
            "",
            "plain",
            "O'Brien",
            "back\\slash",
            "trailing\\",
            "line\nbreak\r\n",
            "nul\0byte",
            "ctrl\x1az",
            "`tick`",
            "'); DROP TABLE mysql.user; --",
            "ünïcødé ✓",
        ];
        for input in inputs {
            assert_eq!(unquote_value(&quoter.quote_value(input)), input);
            assert_eq!(unquote_identifier(&quoter.quote_identifier(input)), input);
        }
    }

    #[test]
    fn test_account() {
        let quoter = StringQueryQuoter::new();
        assert_eq!(account(&quoter, "app", "%"), "'app'@'%'");
    }
}
