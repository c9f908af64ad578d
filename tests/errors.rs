use am8_compiler::ir::ast::{Expr, Function, Stmt};
use am8_compiler::ir::BinOp;
use am8_compiler::{compile_function, compile_program, CompileError};

// ── AST builders ─────────────────────────────────────────────────────────

fn lit(n: i64) -> Expr {
    Expr::Literal(n)
}

fn ident(name: &str) -> Expr {
    Expr::Ident(name.into())
}

fn bin(op: BinOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn assign(name: &str, value: Expr) -> Stmt {
    Stmt::Assign {
        name: name.into(),
        value,
    }
}

fn func(name: &str, params: &[&str], body: Vec<Stmt>) -> Function {
    Function {
        name: name.into(),
        params: params.iter().map(|p| p.to_string()).collect(),
        body,
    }
}

// ── Name resolution ──────────────────────────────────────────────────────

#[test]
fn undefined_name_is_reported() {
    let f = func("f", &[], vec![assign("x", bin(BinOp::Add, ident("y"), lit(1)))]);
    match compile_function(&f) {
        Err(CompileError::UndefinedName { function, name }) => {
            assert_eq!(function, "f");
            assert_eq!(name, "y");
        }
        other => panic!("expected UndefinedName, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn use_before_first_assignment_is_undefined() {
    let f = func("f", &[], vec![assign("x", bin(BinOp::Add, ident("x"), lit(1)))]);
    assert!(matches!(
        compile_function(&f),
        Err(CompileError::UndefinedName { .. })
    ));
}

#[test]
fn parameters_are_bound_names() {
    let f = func(
        "f",
        &["x"],
        vec![
            assign("x", bin(BinOp::Add, ident("x"), lit(1))),
            Stmt::Return(Some(ident("x"))),
        ],
    );
    assert!(compile_function(&f).is_ok());
}

// ── Unsupported constructs ───────────────────────────────────────────────

#[test]
fn for_loops_are_rejected() {
    let f = func(
        "f",
        &[],
        vec![Stmt::For {
            var: "i".into(),
            from: lit(0),
            to: lit(10),
            body: vec![],
        }],
    );
    match compile_function(&f) {
        Err(CompileError::UnsupportedConstruct {
            function,
            construct,
        }) => {
            assert_eq!(function, "f");
            assert_eq!(construct, "for");
        }
        other => panic!("expected UnsupportedConstruct, got {:?}", other.map(|_| ())),
    }
}

// ── Per-function isolation ───────────────────────────────────────────────

#[test]
fn one_bad_function_does_not_poison_the_rest() {
    let good = func("good", &[], vec![Stmt::Return(Some(lit(1)))]);
    let bad = func("bad", &[], vec![Stmt::Return(Some(ident("nope")))]);

    let errors = compile_program(&[bad, good.clone()]).expect_err("bad function must fail");
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        CompileError::UndefinedName { function, .. } if function == "bad"
    ));

    // The good function still compiles on its own.
    assert!(compile_function(&good).is_ok());
}

#[test]
fn all_good_functions_compile_together() {
    let fs = vec![
        func("a", &[], vec![Stmt::Return(Some(lit(1)))]),
        func("b", &["n"], vec![Stmt::Return(Some(ident("n")))]),
    ];
    let program = compile_program(&fs).expect("should compile");
    assert!(program.instructions().count() > 0);
}

#[test]
fn diagnostics_render_with_context() {
    let f = func("f", &[], vec![Stmt::Return(Some(ident("ghost")))]);
    let err = compile_function(&f).expect_err("must fail");
    let msg = err.to_string();
    assert!(msg.contains("ghost"));
    assert!(msg.contains("`f`"));
}
