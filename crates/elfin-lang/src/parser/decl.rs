//! Section parsers: one function per top-level declaration kind.
//!
//! Every parser is permissive about optional punctuation (`;` after block
//! items, `:` before name lists) and strict about structure. Errors inside
//! a block are recorded and recovery resumes at the next statement, so a
//! broken field never discards the rest of the declaration.

use super::error::ParseError;
use super::expr;
use super::stream::{is_section_keyword, TokenStream};
use super::units;
use crate::ast::{
    BarrierDecl, Declaration, Equation, Expr, HelperFunction, HelpersBlock, ImportDecl,
    IntegrationDecl, LyapunovDecl, ModeDecl, ParamDef, PlannerDecl, SystemDecl,
};
use crate::lexer::Token;

/// Parse all declarations until the end of the stream.
pub(super) fn parse_declarations(stream: &mut TokenStream) -> (Vec<Declaration>, Vec<ParseError>) {
    let mut decls = Vec::new();
    let mut errors = Vec::new();

    while !stream.at_end() {
        if stream.eat(&Token::Semicolon) {
            continue;
        }
        match parse_declaration(stream, &mut errors) {
            Ok(decl) => decls.push(decl),
            Err(err) => {
                errors.push(err);
                let before = stream.current_pos();
                stream.synchronize();
                if stream.current_pos() == before {
                    stream.advance();
                }
            }
        }
    }

    (decls, errors)
}

fn parse_declaration(
    stream: &mut TokenStream,
    errors: &mut Vec<ParseError>,
) -> Result<Declaration, ParseError> {
    match stream.peek() {
        Some(Token::Import) => parse_import(stream).map(Declaration::Import),
        Some(Token::Helpers) => parse_helpers(stream, errors).map(Declaration::Helpers),
        Some(Token::System) => parse_system(stream, errors).map(Declaration::System),
        Some(Token::Lyapunov) => parse_lyapunov(stream, errors).map(Declaration::Lyapunov),
        Some(Token::Barrier) => parse_barrier(stream, errors).map(Declaration::Barrier),
        Some(Token::Mode) => parse_mode(stream, errors).map(Declaration::Mode),
        Some(Token::Planner) => parse_planner(stream, errors).map(Declaration::Planner),
        Some(Token::Integration) => parse_integration(stream, errors).map(Declaration::Integration),
        other => Err(ParseError::unexpected_token(
            other,
            "at top level (expected a section keyword)",
            stream.current_span(),
        )),
    }
}

/// `import Alias from "path";`
fn parse_import(stream: &mut TokenStream) -> Result<ImportDecl, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Import)?;
    let alias = expect_name(stream, "after 'import' (expected alias)")?;
    stream.expect(Token::From)?;
    let path = match stream.peek() {
        Some(Token::Str(path)) => {
            let path = path.clone();
            stream.advance();
            path
        }
        other => {
            return Err(ParseError::unexpected_token(
                other,
                "after 'from' (expected a path string)",
                stream.current_span(),
            ));
        }
    };
    stream.eat(&Token::Semicolon);
    Ok(ImportDecl {
        alias,
        path,
        span: stream.span_from(start),
    })
}

/// `helpers Name? { fn(a, b) = expr; ... }`
fn parse_helpers(
    stream: &mut TokenStream,
    errors: &mut Vec<ParseError>,
) -> Result<HelpersBlock, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Helpers)?;
    let name = match stream.peek() {
        Some(Token::Name(n)) => {
            let n = n.clone();
            stream.advance();
            Some(n)
        }
        _ => None,
    };
    stream.expect(Token::LBrace)?;

    let mut functions = Vec::new();
    loop {
        match stream.peek() {
            None | Some(Token::RBrace) => break,
            Some(Token::Semicolon) => {
                stream.advance();
            }
            Some(Token::Name(_)) => match parse_helper_function(stream) {
                Ok(function) => functions.push(function),
                Err(err) => recover_item(stream, errors, err),
            },
            Some(t) if is_section_keyword(t) => {
                errors.push(missing_close(stream, t, "helpers"));
                break;
            }
            other => recover_item(
                stream,
                errors,
                ParseError::unexpected_token(other, "in helpers block", stream.current_span()),
            ),
        }
    }
    finish_block(stream, errors, "helpers");

    Ok(HelpersBlock {
        name,
        functions,
        span: stream.span_from(start),
    })
}

/// `name(a, b) = expr;`
fn parse_helper_function(stream: &mut TokenStream) -> Result<HelperFunction, ParseError> {
    let start = stream.current_pos();
    let name = expect_name(stream, "in helpers block (expected function name)")?;
    stream.expect(Token::LParen)?;
    let mut parameters = Vec::new();
    if !stream.check(&Token::RParen) {
        loop {
            parameters.push(expect_name(stream, "in parameter list")?);
            if !stream.eat(&Token::Comma) {
                break;
            }
            if stream.check(&Token::RParen) {
                break;
            }
        }
    }
    stream.expect(Token::RParen)?;
    stream.expect(Token::Eq)?;
    let body = expr::parse_expr(stream)?;
    stream.eat(&Token::Semicolon);
    Ok(HelperFunction {
        name,
        parameters,
        body,
        span: stream.span_from(start),
    })
}

/// `system Name { continuous_state ...; input ...; params {...} flow_dynamics {...} }`
fn parse_system(
    stream: &mut TokenStream,
    errors: &mut Vec<ParseError>,
) -> Result<SystemDecl, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::System)?;
    let name = expect_name(stream, "after 'system' (expected name)")?;
    stream.expect(Token::LBrace)?;

    let mut continuous_state = Vec::new();
    let mut inputs = Vec::new();
    let mut params = Vec::new();
    let mut flow_dynamics = Vec::new();

    loop {
        match stream.peek() {
            None | Some(Token::RBrace) => break,
            Some(Token::Semicolon) => {
                stream.advance();
            }
            Some(Token::ContinuousState) => {
                stream.advance();
                match parse_name_list(stream) {
                    Ok(names) => continuous_state.extend(names),
                    Err(err) => recover_item(stream, errors, err),
                }
            }
            Some(Token::Input) | Some(Token::Inputs) => {
                stream.advance();
                match parse_name_list(stream) {
                    Ok(names) => inputs.extend(names),
                    Err(err) => recover_item(stream, errors, err),
                }
            }
            Some(Token::Params) => {
                stream.advance();
                match parse_params_block(stream, errors) {
                    Ok(defs) => params.extend(defs),
                    Err(err) => recover_item(stream, errors, err),
                }
            }
            Some(Token::FlowDynamics) => {
                stream.advance();
                match parse_equation_block(stream, errors, "flow_dynamics") {
                    Ok(eqs) => flow_dynamics.extend(eqs),
                    Err(err) => recover_item(stream, errors, err),
                }
            }
            Some(t) if is_section_keyword(t) => {
                errors.push(missing_close(stream, t, "system"));
                break;
            }
            other => recover_item(
                stream,
                errors,
                ParseError::unexpected_token(other, "in system body", stream.current_span()),
            ),
        }
    }
    finish_block(stream, errors, "system");

    Ok(SystemDecl {
        name,
        continuous_state,
        inputs,
        params,
        flow_dynamics,
        span: stream.span_from(start),
    })
}

/// `lyapunov Name { system Sys; V = expr; params {...} }`
fn parse_lyapunov(
    stream: &mut TokenStream,
    errors: &mut Vec<ParseError>,
) -> Result<LyapunovDecl, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Lyapunov)?;
    let name = expect_name(stream, "after 'lyapunov' (expected name)")?;
    stream.expect(Token::LBrace)?;

    let mut system_ref = None;
    let mut v = None;
    let mut params = Vec::new();

    loop {
        match stream.peek() {
            None | Some(Token::RBrace) => break,
            Some(Token::Semicolon) => {
                stream.advance();
            }
            Some(Token::System) => {
                stream.advance();
                match parse_reference(stream, "after 'system'") {
                    Ok(name) => system_ref = Some(name),
                    Err(err) => recover_item(stream, errors, err),
                }
            }
            Some(Token::Params) => {
                stream.advance();
                match parse_params_block(stream, errors) {
                    Ok(defs) => params.extend(defs),
                    Err(err) => recover_item(stream, errors, err),
                }
            }
            Some(Token::Name(field)) if field == "V" => {
                stream.advance();
                match parse_field_expr(stream) {
                    Ok(value) => v = Some(value),
                    Err(err) => recover_item(stream, errors, err),
                }
            }
            Some(t) if is_section_keyword(t) => {
                errors.push(missing_close(stream, t, "lyapunov"));
                break;
            }
            other => recover_item(
                stream,
                errors,
                ParseError::unexpected_token(other, "in lyapunov body", stream.current_span()),
            ),
        }
    }
    finish_block(stream, errors, "lyapunov");

    let span = stream.span_from(start);
    if system_ref.is_none() {
        errors.push(ParseError::invalid_syntax(
            format!("lyapunov '{}' is missing a 'system' reference", name),
            span,
        ));
    }
    if v.is_none() {
        errors.push(ParseError::invalid_syntax(
            format!("lyapunov '{}' is missing its 'V =' function", name),
            span,
        ));
    }

    Ok(LyapunovDecl {
        name,
        system_ref,
        v,
        params,
        span,
    })
}

/// `barrier Name { system Sys; B = expr; alphafun = expr; params {...} }`
fn parse_barrier(
    stream: &mut TokenStream,
    errors: &mut Vec<ParseError>,
) -> Result<BarrierDecl, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Barrier)?;
    let name = expect_name(stream, "after 'barrier' (expected name)")?;
    stream.expect(Token::LBrace)?;

    let mut system_ref = None;
    let mut b = None;
    let mut alpha_fun = None;
    let mut params = Vec::new();

    loop {
        match stream.peek() {
            None | Some(Token::RBrace) => break,
            Some(Token::Semicolon) => {
                stream.advance();
            }
            Some(Token::System) => {
                stream.advance();
                match parse_reference(stream, "after 'system'") {
                    Ok(name) => system_ref = Some(name),
                    Err(err) => recover_item(stream, errors, err),
                }
            }
            Some(Token::Params) => {
                stream.advance();
                match parse_params_block(stream, errors) {
                    Ok(defs) => params.extend(defs),
                    Err(err) => recover_item(stream, errors, err),
                }
            }
            Some(Token::Name(field)) if field == "B" => {
                stream.advance();
                match parse_field_expr(stream) {
                    Ok(value) => b = Some(value),
                    Err(err) => recover_item(stream, errors, err),
                }
            }
            Some(Token::Name(field)) if field == "alphafun" || field == "alpha_fun" => {
                stream.advance();
                match parse_field_expr(stream) {
                    Ok(value) => alpha_fun = Some(value),
                    Err(err) => recover_item(stream, errors, err),
                }
            }
            Some(t) if is_section_keyword(t) => {
                errors.push(missing_close(stream, t, "barrier"));
                break;
            }
            other => recover_item(
                stream,
                errors,
                ParseError::unexpected_token(other, "in barrier body", stream.current_span()),
            ),
        }
    }
    finish_block(stream, errors, "barrier");

    let span = stream.span_from(start);
    if system_ref.is_none() {
        errors.push(ParseError::invalid_syntax(
            format!("barrier '{}' is missing a 'system' reference", name),
            span,
        ));
    }
    if b.is_none() {
        errors.push(ParseError::invalid_syntax(
            format!("barrier '{}' is missing its 'B =' function", name),
            span,
        ));
    }

    Ok(BarrierDecl {
        name,
        system_ref,
        b,
        alpha_fun,
        params,
        span,
    })
}

/// `mode Name { system ...; lyapunov ...; barrier a, b; controller {...} params {...} }`
fn parse_mode(
    stream: &mut TokenStream,
    errors: &mut Vec<ParseError>,
) -> Result<ModeDecl, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Mode)?;
    let name = expect_name(stream, "after 'mode' (expected name)")?;
    stream.expect(Token::LBrace)?;

    let mut system_ref = None;
    let mut lyapunov_ref = None;
    let mut barrier_refs = Vec::new();
    let mut controller = Vec::new();
    let mut params = Vec::new();

    loop {
        match stream.peek() {
            None | Some(Token::RBrace) => break,
            Some(Token::Semicolon) => {
                stream.advance();
            }
            Some(Token::System) => {
                stream.advance();
                match parse_reference(stream, "after 'system'") {
                    Ok(name) => system_ref = Some(name),
                    Err(err) => recover_item(stream, errors, err),
                }
            }
            Some(Token::Lyapunov) => {
                stream.advance();
                match parse_reference(stream, "after 'lyapunov'") {
                    Ok(name) => lyapunov_ref = Some(name),
                    Err(err) => recover_item(stream, errors, err),
                }
            }
            Some(Token::Barrier) => {
                stream.advance();
                match parse_reference_list(stream, "after 'barrier'") {
                    Ok(names) => barrier_refs.extend(names),
                    Err(err) => recover_item(stream, errors, err),
                }
            }
            Some(Token::Controller) => {
                stream.advance();
                match parse_equation_block(stream, errors, "controller") {
                    Ok(eqs) => controller.extend(eqs),
                    Err(err) => recover_item(stream, errors, err),
                }
            }
            Some(Token::Params) => {
                stream.advance();
                match parse_params_block(stream, errors) {
                    Ok(defs) => params.extend(defs),
                    Err(err) => recover_item(stream, errors, err),
                }
            }
            Some(t) if is_section_keyword(t) => {
                errors.push(missing_close(stream, t, "mode"));
                break;
            }
            other => recover_item(
                stream,
                errors,
                ParseError::unexpected_token(other, "in mode body", stream.current_span()),
            ),
        }
    }
    finish_block(stream, errors, "mode");

    let span = stream.span_from(start);
    if system_ref.is_none() {
        errors.push(ParseError::invalid_syntax(
            format!("mode '{}' is missing a 'system' reference", name),
            span,
        ));
    }

    Ok(ModeDecl {
        name,
        system_ref,
        lyapunov_ref,
        barrier_refs,
        controller,
        params,
        span,
    })
}

/// `planner Name { system ...; config {...} obstacles [...]; params {...} }`
fn parse_planner(
    stream: &mut TokenStream,
    errors: &mut Vec<ParseError>,
) -> Result<PlannerDecl, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Planner)?;
    let name = expect_name(stream, "after 'planner' (expected name)")?;
    stream.expect(Token::LBrace)?;

    let mut system_ref = None;
    let mut config = Vec::new();
    let mut obstacles = Vec::new();
    let mut params = Vec::new();

    loop {
        match stream.peek() {
            None | Some(Token::RBrace) => break,
            Some(Token::Semicolon) => {
                stream.advance();
            }
            Some(Token::System) => {
                stream.advance();
                match parse_reference(stream, "after 'system'") {
                    Ok(name) => system_ref = Some(name),
                    Err(err) => recover_item(stream, errors, err),
                }
            }
            Some(Token::Config) => {
                stream.advance();
                match parse_config_block(stream, errors) {
                    Ok(entries) => config.extend(entries),
                    Err(err) => recover_item(stream, errors, err),
                }
            }
            Some(Token::Obstacles) => {
                stream.advance();
                match parse_obstacles(stream) {
                    Ok(exprs) => obstacles.extend(exprs),
                    Err(err) => recover_item(stream, errors, err),
                }
            }
            Some(Token::Params) => {
                stream.advance();
                match parse_params_block(stream, errors) {
                    Ok(defs) => params.extend(defs),
                    Err(err) => recover_item(stream, errors, err),
                }
            }
            Some(t) if is_section_keyword(t) => {
                errors.push(missing_close(stream, t, "planner"));
                break;
            }
            other => recover_item(
                stream,
                errors,
                ParseError::unexpected_token(other, "in planner body", stream.current_span()),
            ),
        }
    }
    finish_block(stream, errors, "planner");

    let span = stream.span_from(start);
    if system_ref.is_none() {
        errors.push(ParseError::invalid_syntax(
            format!("planner '{}' is missing a 'system' reference", name),
            span,
        ));
    }

    Ok(PlannerDecl {
        name,
        system_ref,
        config,
        obstacles,
        params,
        span,
    })
}

/// `integration Name { planner P; controller M; config {...} }`
fn parse_integration(
    stream: &mut TokenStream,
    errors: &mut Vec<ParseError>,
) -> Result<IntegrationDecl, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Integration)?;
    let name = expect_name(stream, "after 'integration' (expected name)")?;
    stream.expect(Token::LBrace)?;

    let mut planner_ref = None;
    let mut controller_ref = None;
    let mut config = Vec::new();

    loop {
        match stream.peek() {
            None | Some(Token::RBrace) => break,
            Some(Token::Semicolon) => {
                stream.advance();
            }
            Some(Token::Planner) => {
                stream.advance();
                match parse_reference(stream, "after 'planner'") {
                    Ok(name) => planner_ref = Some(name),
                    Err(err) => recover_item(stream, errors, err),
                }
            }
            Some(Token::Controller) => {
                stream.advance();
                match parse_reference(stream, "after 'controller'") {
                    Ok(name) => controller_ref = Some(name),
                    Err(err) => recover_item(stream, errors, err),
                }
            }
            Some(Token::Config) => {
                stream.advance();
                match parse_config_block(stream, errors) {
                    Ok(entries) => config.extend(entries),
                    Err(err) => recover_item(stream, errors, err),
                }
            }
            Some(t) if is_section_keyword(t) => {
                errors.push(missing_close(stream, t, "integration"));
                break;
            }
            other => recover_item(
                stream,
                errors,
                ParseError::unexpected_token(other, "in integration body", stream.current_span()),
            ),
        }
    }
    finish_block(stream, errors, "integration");

    let span = stream.span_from(start);
    if planner_ref.is_none() {
        errors.push(ParseError::invalid_syntax(
            format!("integration '{}' is missing a 'planner' reference", name),
            span,
        ));
    }
    if controller_ref.is_none() {
        errors.push(ParseError::invalid_syntax(
            format!("integration '{}' is missing a 'controller' reference", name),
            span,
        ));
    }

    Ok(IntegrationDecl {
        name,
        planner_ref,
        controller_ref,
        config,
        span,
    })
}

// ---------------------------------------------------------------------------
// shared pieces

/// Consume a NAME token or fail with context.
fn expect_name(stream: &mut TokenStream, context: &str) -> Result<String, ParseError> {
    match stream.peek() {
        Some(Token::Name(name)) => {
            let name = name.clone();
            stream.advance();
            Ok(name)
        }
        other => Err(ParseError::unexpected_token(
            other,
            context,
            stream.current_span(),
        )),
    }
}

/// `Name ;?` after a reference keyword.
fn parse_reference(stream: &mut TokenStream, context: &str) -> Result<String, ParseError> {
    let name = expect_name(stream, context)?;
    stream.eat(&Token::Semicolon);
    Ok(name)
}

/// `Name (, Name)* ;?` after a repeatable reference keyword.
fn parse_reference_list(stream: &mut TokenStream, context: &str) -> Result<Vec<String>, ParseError> {
    let mut names = vec![expect_name(stream, context)?];
    while stream.eat(&Token::Comma) {
        names.push(expect_name(stream, context)?);
    }
    stream.eat(&Token::Semicolon);
    Ok(names)
}

/// `= expr ;?` after a named field like `V` or `alphafun`.
fn parse_field_expr(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    stream.expect(Token::Eq)?;
    let value = expr::parse_expr(stream)?;
    stream.eat(&Token::Semicolon);
    Ok(value)
}

/// Name list field: `: [a, b]`, `[a, b]`, or `{ a; b; }` (colon optional
/// before either form), with an optional trailing `;`.
fn parse_name_list(stream: &mut TokenStream) -> Result<Vec<String>, ParseError> {
    stream.eat(&Token::Colon);
    let names = match stream.peek() {
        Some(Token::LBracket) => {
            stream.advance();
            let mut names = Vec::new();
            if !stream.check(&Token::RBracket) {
                loop {
                    names.push(expect_name(stream, "in name list")?);
                    if !stream.eat(&Token::Comma) {
                        break;
                    }
                    if stream.check(&Token::RBracket) {
                        break;
                    }
                }
            }
            stream.expect(Token::RBracket)?;
            names
        }
        Some(Token::LBrace) => {
            stream.advance();
            let mut names = Vec::new();
            while !stream.check(&Token::RBrace) {
                names.push(expect_name(stream, "in name list")?);
                while stream.eat(&Token::Semicolon) || stream.eat(&Token::Comma) {}
            }
            stream.expect(Token::RBrace)?;
            names
        }
        other => {
            return Err(ParseError::unexpected_token(
                other,
                "in name list (expected '[' or '{')",
                stream.current_span(),
            ));
        }
    };
    stream.eat(&Token::Semicolon);
    Ok(names)
}

/// `{ name (":" dim)? ("[" unit "]")? "=" expr ";"? ... }`
fn parse_params_block(
    stream: &mut TokenStream,
    errors: &mut Vec<ParseError>,
) -> Result<Vec<ParamDef>, ParseError> {
    stream.expect(Token::LBrace)?;
    let mut params = Vec::new();
    loop {
        match stream.peek() {
            None | Some(Token::RBrace) => break,
            Some(Token::Semicolon) => {
                stream.advance();
            }
            Some(Token::Name(_)) => match parse_param_def(stream) {
                Ok(def) => params.push(def),
                Err(err) => recover_item(stream, errors, err),
            },
            Some(t) if is_section_keyword(t) => {
                errors.push(missing_close(stream, t, "params"));
                break;
            }
            other => recover_item(
                stream,
                errors,
                ParseError::unexpected_token(other, "in params block", stream.current_span()),
            ),
        }
    }
    finish_block(stream, errors, "params");
    Ok(params)
}

fn parse_param_def(stream: &mut TokenStream) -> Result<ParamDef, ParseError> {
    let start = stream.current_pos();
    let name = expect_name(stream, "in params block (expected parameter name)")?;
    let dimension = if stream.eat(&Token::Colon) {
        Some(expect_name(stream, "after ':' (expected dimension label)")?)
    } else {
        None
    };
    let unit = if stream.eat(&Token::LBracket) {
        let unit = units::parse_unit_expr(stream)?;
        stream.expect(Token::RBracket)?;
        Some(unit)
    } else {
        None
    };
    stream.expect(Token::Eq)?;
    let value = expr::parse_expr(stream)?;
    stream.eat(&Token::Semicolon);
    Ok(ParamDef {
        name,
        dimension,
        unit,
        value,
        folded: None,
        span: stream.span_from(start),
    })
}

/// `{ lhs = expr ";"? ... }`
fn parse_equation_block(
    stream: &mut TokenStream,
    errors: &mut Vec<ParseError>,
    what: &str,
) -> Result<Vec<Equation>, ParseError> {
    stream.expect(Token::LBrace)?;
    let mut equations = Vec::new();
    loop {
        match stream.peek() {
            None | Some(Token::RBrace) => break,
            Some(Token::Semicolon) => {
                stream.advance();
            }
            Some(Token::Name(_)) => match parse_equation(stream) {
                Ok(eq) => equations.push(eq),
                Err(err) => recover_item(stream, errors, err),
            },
            Some(t) if is_section_keyword(t) => {
                errors.push(missing_close(stream, t, what));
                break;
            }
            other => recover_item(
                stream,
                errors,
                ParseError::unexpected_token(
                    other,
                    &format!("in {} block (expected 'name = expr')", what),
                    stream.current_span(),
                ),
            ),
        }
    }
    finish_block(stream, errors, what);
    Ok(equations)
}

fn parse_equation(stream: &mut TokenStream) -> Result<Equation, ParseError> {
    let start = stream.current_pos();
    let lhs = expect_name(stream, "at equation start (expected name)")?;
    stream.expect(Token::Eq)?;
    let rhs = expr::parse_expr(stream)?;
    stream.eat(&Token::Semicolon);
    Ok(Equation {
        lhs,
        rhs,
        span: stream.span_from(start),
    })
}

/// `{ key (":" | "=") expr (";" | ",")? ... }`
fn parse_config_block(
    stream: &mut TokenStream,
    errors: &mut Vec<ParseError>,
) -> Result<Vec<(String, Expr)>, ParseError> {
    stream.expect(Token::LBrace)?;
    let mut entries = Vec::new();
    loop {
        match stream.peek() {
            None | Some(Token::RBrace) => break,
            Some(Token::Semicolon) | Some(Token::Comma) => {
                stream.advance();
            }
            Some(Token::Name(_)) => match parse_config_entry(stream) {
                Ok(entry) => entries.push(entry),
                Err(err) => recover_item(stream, errors, err),
            },
            Some(t) if is_section_keyword(t) => {
                errors.push(missing_close(stream, t, "config"));
                break;
            }
            other => recover_item(
                stream,
                errors,
                ParseError::unexpected_token(other, "in config block", stream.current_span()),
            ),
        }
    }
    finish_block(stream, errors, "config");
    Ok(entries)
}

fn parse_config_entry(stream: &mut TokenStream) -> Result<(String, Expr), ParseError> {
    let key = expect_name(stream, "in config block (expected key)")?;
    if !stream.eat(&Token::Colon) {
        stream.expect(Token::Eq)?;
    }
    let value = expr::parse_expr(stream)?;
    Ok((key, value))
}

/// Obstacle list: `obstacles [e, e]` or `obstacles { e; e }`, colon
/// optional before either form.
fn parse_obstacles(stream: &mut TokenStream) -> Result<Vec<Expr>, ParseError> {
    stream.eat(&Token::Colon);
    let exprs = match stream.peek() {
        Some(Token::LBracket) => {
            stream.advance();
            let mut exprs = Vec::new();
            if !stream.check(&Token::RBracket) {
                loop {
                    exprs.push(expr::parse_expr(stream)?);
                    if !stream.eat(&Token::Comma) {
                        break;
                    }
                    if stream.check(&Token::RBracket) {
                        break;
                    }
                }
            }
            stream.expect(Token::RBracket)?;
            exprs
        }
        Some(Token::LBrace) => {
            stream.advance();
            let mut exprs = Vec::new();
            while !stream.check(&Token::RBrace) && !stream.at_end() {
                exprs.push(expr::parse_expr(stream)?);
                while stream.eat(&Token::Semicolon) || stream.eat(&Token::Comma) {}
            }
            stream.expect(Token::RBrace)?;
            exprs
        }
        other => {
            return Err(ParseError::unexpected_token(
                other,
                "after 'obstacles' (expected '[' or '{')",
                stream.current_span(),
            ));
        }
    };
    stream.eat(&Token::Semicolon);
    Ok(exprs)
}

/// Record an in-block error and skip to the next statement boundary,
/// always making progress.
fn recover_item(stream: &mut TokenStream, errors: &mut Vec<ParseError>, err: ParseError) {
    errors.push(err);
    let before = stream.current_pos();
    stream.synchronize_statement();
    if stream.current_pos() == before && !stream.at_end() && !stream.check(&Token::RBrace) {
        stream.advance();
    }
}

/// Error for a section keyword encountered inside an unclosed block.
fn missing_close(stream: &TokenStream, keyword: &Token, what: &str) -> ParseError {
    ParseError::invalid_syntax(
        format!("missing '}}' in {} block before '{}'", what, keyword),
        stream.current_span(),
    )
}

/// Consume the closing brace if present; report EOF-in-block otherwise.
/// A stray section keyword has already been reported by the body loop.
fn finish_block(stream: &mut TokenStream, errors: &mut Vec<ParseError>, what: &str) {
    if !stream.eat(&Token::RBrace) && stream.at_end() {
        errors.push(ParseError::unexpected_eof(
            &format!("in {} block", what),
            stream.current_span(),
        ));
    }
}
