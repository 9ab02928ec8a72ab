//! Content stream tokenizer and parser.

use folio_core::model::Operand;
use folio_core::parser::{ContentLexer, Token, parse_content};

fn collect_tokens(data: &[u8]) -> Vec<Token> {
    let mut lexer = ContentLexer::new(data);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next_token() {
        let (_, token) = result.expect("tokenize");
        tokens.push(token);
    }
    tokens
}

#[test]
fn test_basic_tokens() {
    let tokens = collect_tokens(b"BT /F1 12 Tf (Hello) Tj ET");
    assert_eq!(
        tokens,
        vec![
            Token::Keyword("BT".into()),
            Token::Name("F1".into()),
            Token::Integer(12),
            Token::Keyword("Tf".into()),
            Token::Str(b"Hello".to_vec()),
            Token::Keyword("Tj".into()),
            Token::Keyword("ET".into()),
        ]
    );
}

#[test]
fn test_hex_string_whitespace() {
    let tokens = collect_tokens(b"<48 65 6C 6C 6F> Tj");
    assert_eq!(tokens[0], Token::Str(b"Hello".to_vec()));
}

#[test]
fn test_comments_skipped() {
    let tokens = collect_tokens(b"% comment\n1 0 0 1 5 5 cm % trailing\n");
    assert_eq!(tokens.len(), 7);
    assert_eq!(tokens[6], Token::Keyword("cm".into()));
}

#[test]
fn test_name_hex_escape() {
    let tokens = collect_tokens(b"/A#20B");
    assert_eq!(tokens, vec![Token::Name("A B".into())]);
}

#[test]
fn test_stream_with_nested_structures() {
    let ops = parse_content(
        b"q\n/P <</MCID 0>> BDC\n[(T) 120 (ext)] TJ\nEMC\n[3 1] 0 d\nQ",
    );
    let names: Vec<&str> = ops.iter().map(|o| o.operator.as_str()).collect();
    assert_eq!(names, vec!["q", "BDC", "TJ", "EMC", "d", "Q"]);
    assert_eq!(
        ops[4].operands,
        vec![
            Operand::Array(vec![Operand::Integer(3), Operand::Integer(1)]),
            Operand::Integer(0),
        ]
    );
}

#[test]
fn test_reals_and_signs() {
    let ops = parse_content(b"-.5 +3 4. 0.25 re");
    assert_eq!(
        ops[0].operands,
        vec![
            Operand::Real(-0.5),
            Operand::Integer(3),
            Operand::Real(4.0),
            Operand::Real(0.25),
        ]
    );
}
