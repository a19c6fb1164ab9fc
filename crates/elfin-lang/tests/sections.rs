//! Section parsing: surface variants, comments, and error recovery.

use elfin_lang::ast::Declaration;
use elfin_lang::error::ErrorKind;
use elfin_lang::lexer::tokenize;
use elfin_lang::parser::{parse_unit, ParseError};

fn parse(source: &str) -> (Vec<Declaration>, Vec<ParseError>) {
    let lexed = tokenize(source, 0);
    assert!(lexed.diagnostics.is_empty(), "lex errors: {:?}", lexed.diagnostics);
    let (unit, errors) = parse_unit(&lexed.tokens, &lexed.spans, 0);
    (unit.decls, errors)
}

fn parse_clean(source: &str) -> Vec<Declaration> {
    let (decls, errors) = parse(source);
    assert!(errors.is_empty(), "parse errors: {:?}", errors);
    decls
}

fn system(decls: &[Declaration]) -> &elfin_lang::ast::SystemDecl {
    decls
        .iter()
        .find_map(|d| match d {
            Declaration::System(s) => Some(s),
            _ => None,
        })
        .expect("no system parsed")
}

#[test]
fn input_keyword_variants_are_equivalent() {
    for source in [
        "system S { input: [tau]; }",
        "system S { inputs: [tau]; }",
        "system S { input [tau]; }",
        "system S { inputs [tau] }",
    ] {
        let decls = parse_clean(source);
        assert_eq!(system(&decls).inputs, vec!["tau"], "variant {:?}", source);
    }
}

#[test]
fn continuous_state_bracket_and_brace_forms() {
    let bracket = parse_clean("system S { continuous_state: [a, b]; }");
    let brace = parse_clean("system S { continuous_state { a; b; } }");
    assert_eq!(system(&bracket).continuous_state, system(&brace).continuous_state);
}

#[test]
fn semicolons_are_optional() {
    let decls = parse_clean(
        "system S {\n\
         continuous_state: [x]\n\
         params { k = 2 }\n\
         flow_dynamics { x = k * x }\n\
         }",
    );
    let sys = system(&decls);
    assert_eq!(sys.params.len(), 1);
    assert_eq!(sys.flow_dynamics.len(), 1);
}

#[test]
fn both_line_comment_forms_are_stripped() {
    let decls = parse_clean(
        "// slash comment\n\
         # hash comment\n\
         system S { # trailing\n\
         params { k = 1; // also trailing\n\
         } }",
    );
    assert_eq!(system(&decls).params.len(), 1);
}

#[test]
fn block_comments_are_not_supported() {
    let lexed = tokenize("system S { /* comment */ }", 0);
    assert!(lexed.diagnostics.is_empty(), "'/' and '*' are valid tokens");
    let (_, errors) = parse_unit(&lexed.tokens, &lexed.spans, 0);
    assert!(!errors.is_empty(), "block comment must surface as a parse error");
}

#[test]
fn strings_carry_no_escapes() {
    let decls = parse_clean("import Lib from \"dir\\name.elfin\";");
    let Declaration::Import(import) = &decls[0] else {
        panic!("expected import");
    };
    // the backslash is an ordinary character
    assert_eq!(import.path, "dir\\name.elfin");
}

#[test]
fn invalid_characters_do_not_stop_the_pipeline() {
    let lexed = tokenize("system S @ { params { k = 1; } }", 0);
    assert_eq!(lexed.diagnostics.len(), 1);
    assert_eq!(lexed.diagnostics[0].kind, ErrorKind::InvalidChar);
    // the '@' is skipped; the rest parses
    let (unit, errors) = parse_unit(&lexed.tokens, &lexed.spans, 0);
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(unit.decls.len(), 1);
}

#[test]
fn multiple_errors_reported_in_one_run() {
    let (decls, errors) = parse(
        "system A { params { x = ; } }\n\
         mode M { }\n\
         system B { params { y = 1; } }",
    );
    // bad param in A, missing system ref in M; B is untouched
    assert!(errors.len() >= 2, "{:?}", errors);
    assert_eq!(decls.len(), 3);
    let b = decls
        .iter()
        .find(|d| d.name() == Some("B"))
        .expect("B survives earlier errors");
    let Declaration::System(b) = b else { panic!() };
    assert_eq!(b.params.len(), 1);
}

#[test]
fn unterminated_block_at_eof_yields_partial_ir() {
    let (decls, errors) = parse("system S { params { k = 1; }");
    assert!(errors.iter().any(|e| e.message.contains("end of input")));
    let Declaration::System(sys) = &decls[0] else {
        panic!("expected partial system");
    };
    assert_eq!(sys.params.len(), 1);
}

#[test]
fn top_level_garbage_synchronizes_to_next_section() {
    let (decls, errors) = parse("42 + 7\nsystem S { }");
    assert_eq!(errors.len(), 1);
    assert_eq!(decls.len(), 1);
    assert_eq!(decls[0].name(), Some("S"));
}

#[test]
fn barrier_accepts_alpha_fun_alias() {
    let decls = parse_clean(
        "barrier Safe { system S; B = 1 - x; alpha_fun = 1; }\n\
         system S { continuous_state: [x]; }",
    );
    let Declaration::Barrier(barrier) = &decls[0] else {
        panic!("expected barrier");
    };
    assert!(barrier.alpha_fun.is_some());
}

#[test]
fn sections_parse_in_any_order() {
    let decls = parse_clean(
        "mode M { system S; controller { u = 0; } }\n\
         system S { continuous_state: [x]; }",
    );
    assert!(matches!(decls[0], Declaration::Mode(_)));
    assert!(matches!(decls[1], Declaration::System(_)));
}
