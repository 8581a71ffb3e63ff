use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    multi::many0,
    sequence::{preceded, terminated},
};

/// Comment marker: everything from here to the end of the line is ignored
const COMMENT_CHAR: char = ';';

/// Control tokenizer behavior
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenizerConfig {
    /// Drop `;` comments before splitting each line
    pub strip_comments: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        TokenizerConfig {
            strip_comments: true,
        }
    }
}

fn is_atom_char(c: char) -> bool {
    !c.is_whitespace() && c != '(' && c != ')'
}

fn whitespace(input: &str) -> IResult<&str, &str> {
    take_while(char::is_whitespace).parse(input)
}

/// Parse a single `(` or `)` token
fn parse_paren(input: &str) -> IResult<&str, &str> {
    alt((tag("("), tag(")"))).parse(input)
}

/// Parse a maximal run of non-whitespace, non-paren characters
fn parse_atom(input: &str) -> IResult<&str, &str> {
    take_while1(is_atom_char).parse(input)
}

/// Parse every token on one line
fn parse_line(input: &str) -> IResult<&str, Vec<&str>> {
    terminated(
        many0(preceded(whitespace, alt((parse_paren, parse_atom)))),
        whitespace,
    )
    .parse(input)
}

/// Split Snek source text into tokens, removing comments and whitespace.
///
/// Tokenizing never fails; malformed programs are reported by the parser.
pub fn tokenize(source: &str) -> Vec<String> {
    tokenize_with_config(source, TokenizerConfig::default())
}

/// Tokenize with explicit configuration
pub fn tokenize_with_config(source: &str, config: TokenizerConfig) -> Vec<String> {
    let mut tokens = Vec::new();

    for line in source.lines() {
        let code = if config.strip_comments {
            line.split(COMMENT_CHAR).next().unwrap_or_default()
        } else {
            line
        };

        // Every character is either whitespace, a paren or part of an atom, so a
        // line always parses completely.
        if let Ok((_, line_tokens)) = parse_line(code) {
            tokens.extend(line_tokens.into_iter().map(str::to_owned));
        }
    }

    log::trace!("tokenized {} tokens", tokens.len());
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_tokenize_tests(test_cases: Vec<(&str, Vec<&str>)>) {
        for (i, (input, expected)) in test_cases.iter().enumerate() {
            let actual = tokenize(input);
            assert_eq!(
                actual, *expected,
                "Tokenize test #{}: mismatch for {input:?}",
                i + 1
            );
        }
    }

    #[test]
    fn test_tokenizer_comprehensive() {
        let test_cases = vec![
            // ===== BASIC SPLITTING =====
            (
                "(foo (bar 3.14))",
                vec!["(", "foo", "(", "bar", "3.14", ")", ")"],
            ),
            (
                "(cat (dog (tomato)))",
                vec!["(", "cat", "(", "dog", "(", "tomato", ")", ")", ")"],
            ),
            ("x", vec!["x"]),
            ("42", vec!["42"]),
            ("", vec![]),
            ("   ", vec![]),
            // ===== PARENS WITHOUT WHITESPACE =====
            ("(+(* 2 3)4)", vec!["(", "+", "(", "*", "2", "3", ")", "4", ")"]),
            ("())(", vec!["(", ")", ")", "("]),
            // ===== ATOMS WITH PUNCTUATION =====
            (
                "(:= (elt-at-index x) set!)",
                vec!["(", ":=", "(", "elt-at-index", "x", ")", "set!", ")"],
            ),
            ("(=? #t #f)", vec!["(", "=?", "#t", "#f", ")"]),
            ("-5.5e3", vec!["-5.5e3"]),
            // ===== WHITESPACE VARIANTS =====
            ("(a\tb)", vec!["(", "a", "b", ")"]),
            ("  (a   b)  ", vec!["(", "a", "b", ")"]),
            ("(a\r\nb)", vec!["(", "a", "b", ")"]),
            // ===== COMMENTS =====
            ("; only a comment", vec![]),
            ("(+ 1 2) ; add them", vec!["(", "+", "1", "2", ")"]),
            ("(+ 1;2\n 3)", vec!["(", "+", "1", "3", ")"]),
            (
                "(:= x ; the name\n  5) ; the value\n",
                vec!["(", ":=", "x", "5", ")"],
            ),
            ("abc;def", vec!["abc"]),
            // ===== MULTIPLE LINES =====
            (
                "(begin\n  (:= x 1)\n  x)",
                vec!["(", "begin", "(", ":=", "x", "1", ")", "x", ")"],
            ),
        ];

        run_tokenize_tests(test_cases);
    }

    #[test]
    fn test_tokenizer_keeps_comments_when_configured() {
        let config = TokenizerConfig {
            strip_comments: false,
        };
        assert_eq!(
            tokenize_with_config("(a ;b)", config),
            vec!["(", "a", ";b", ")"]
        );
        assert_eq!(
            tokenize_with_config("(a ;b)", TokenizerConfig::default()),
            vec!["(", "a"]
        );
    }
}
