//! End-to-end pipeline tests: source text in, verified IR out.

use vync_drv::compile_to_ir;

#[test]
fn test_full_program_compiles() {
    let source = r#"
struct Point { x: Float, y: Float }

fn dot(a: Point, b: Point) -> Float {
  return a.x * b.x + a.y * b.y
}

fn main() -> Int {
  return 0
}
"#;
    let ir = compile_to_ir(source, "program.vyn").unwrap();
    assert!(ir.contains("define double @dot"));
    assert!(ir.contains("define i64 @main"));
    assert!(ir.contains("%Point = type { double, double }"));
}

#[test]
fn test_indentation_styles_mix() {
    let source = "fn braced() -> Int {\n  return 1\n}\n\nfn indented() -> Int\n  return 2\n";
    let ir = compile_to_ir(source, "mix.vyn").unwrap();
    assert!(ir.contains("@braced"));
    assert!(ir.contains("@indented"));
}

#[test]
fn test_control_flow_program() {
    let source = r#"
fn sum_to(n: Int) -> Int {
  var total = 0
  for (var i = 1; i < n + 1; i = i + 1) {
    total = total + i
  }
  return total
}
"#;
    let ir = compile_to_ir(source, "loops.vyn").unwrap();
    assert!(ir.contains("forcond:"));
    assert!(ir.contains("forend:"));
}

#[test]
fn test_declaration_order_does_not_matter() {
    // `make` uses `Point` and `origin` before their declarations.
    let source = r#"
fn make() -> Float {
  let p = origin()
  return p.x
}

fn origin() -> Point {
  var p: Point
  return p
}

struct Point { x: Float, y: Float }
"#;
    let ir = compile_to_ir(source, "order.vyn").unwrap();
    assert!(ir.contains("@make"));
    assert!(ir.contains("@origin"));
}

#[test]
fn test_lex_error_is_fatal() {
    let err = compile_to_ir("\nfn main()\n\tconst x = 1\n", "tabs.vyn").unwrap_err();
    assert_eq!(err.to_string(), "Tabs not allowed at line 3, column 1");
}

#[test]
fn test_parse_error_is_fatal_and_positioned() {
    let err = compile_to_ir("fn main() {\n  const x = 1\n", "brace.vyn").unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Error at brace.vyn:"), "{}", message);
    assert!(message.contains("'}'"), "{}", message);
}

#[test]
fn test_semantic_errors_accumulate() {
    let source = "fn f() -> Int {\n  let a = u1\n  let b = u2\n  return 0\n}\n";
    let err = compile_to_ir(source, "sem.vyn").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("u1"), "{}", message);
    assert!(message.contains("u2"), "{}", message);
}

#[test]
fn test_diagnostic_format() {
    let err = compile_to_ir("fn f() -> Int { return missing }\n", "diag.vyn").unwrap_err();
    let message = err.to_string();
    assert!(
        message.contains("Error at diag.vyn:1:24: undeclared identifier 'missing'"),
        "{}",
        message
    );
}
