//! End-to-end accept/reject scenarios for the semantic analyzer.

use joosc::{AnalyzeError, Analyzer};
use std::path::{Path, PathBuf};

fn analyze(sources: &[(&str, &str)]) -> Result<(), AnalyzeError> {
    let stdlib = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/stdlib"));
    let mut analyzer = Analyzer::with_stdlib(stdlib).expect("stdlib must load");
    for (name, source) in sources {
        analyzer.add_source(PathBuf::from(name), source)?;
    }
    analyzer.check()
}

fn assert_accepts(sources: &[(&str, &str)]) {
    if let Err(err) = analyze(sources) {
        panic!("expected acceptance, got: {err}");
    }
}

fn assert_rejects(sources: &[(&str, &str)]) -> String {
    match analyze(sources) {
        Ok(()) => panic!("expected rejection"),
        Err(err) => err.to_string(),
    }
}

#[test]
fn public_type_name_mismatch() {
    let err = assert_rejects(&[("Foo.java", "public class Bar { public Bar() {} }")]);
    assert!(err.contains("Bar is public, should be declared in a file named Bar.java"));
}

#[test]
fn replacement_with_different_return_type() {
    let err = assert_rejects(&[
        (
            "A.java",
            "public class A { public A() {} public int m() { return 1; } }",
        ),
        (
            "B.java",
            "public class B extends A { public B() {} public boolean m() { return true; } }",
        ),
    ]);
    assert!(err.contains("differing return types"));
}

#[test]
fn cyclic_extends() {
    let err = assert_rejects(&[
        ("A.java", "public class A extends B { public A() {} }"),
        ("B.java", "public class B extends A { public B() {} }"),
    ]);
    assert!(err.contains("Cyclic dependency"));
}

#[test]
fn widening_accepts_narrowing_needs_cast() {
    assert_accepts(&[(
        "A.java",
        "public class A { public A() { int i = (byte)5; } }",
    )]);
    let err = assert_rejects(&[("A.java", "public class A { public A() { byte b = 300; } }")]);
    assert!(err.contains("Cannot assign"));
    assert_accepts(&[(
        "A.java",
        "public class A { public A() { byte b = (byte) 300; } }",
    )]);
}

#[test]
fn forward_reference_in_field_initializer() {
    let err = assert_rejects(&[(
        "T.java",
        "public class T { public T() {} public int a = b; public int b = 1; }",
    )]);
    assert!(err.contains("declared later"));

    assert_accepts(&[(
        "T.java",
        "public class T { public T() {} public int a = this.b; public int b = 1; }",
    )]);

    // Backward references are fine unqualified.
    assert_accepts(&[(
        "T.java",
        "public class T { public T() {} public int b = 1; public int a = b; }",
    )]);
}

#[test]
fn abstract_method_obligation() {
    let err = assert_rejects(&[
        ("I.java", "public interface I { public void f(); }"),
        ("C.java", "public class C implements I { public C() {} }"),
    ]);
    assert!(err.contains("abstract method"));

    assert_accepts(&[
        ("I.java", "public interface I { public void f(); }"),
        (
            "C.java",
            "public abstract class C implements I { public C() {} }",
        ),
    ]);

    assert_accepts(&[
        ("I.java", "public interface I { public void f(); }"),
        (
            "C.java",
            "public class C implements I { public C() {} public void f() {} }",
        ),
    ]);
}

#[test]
fn extending_a_final_class() {
    let err = assert_rejects(&[
        ("A.java", "public final class A { public A() {} }"),
        ("B.java", "public class B extends A { public B() {} }"),
    ]);
    assert!(err.contains("final class"));
}

#[test]
fn class_extending_interface_and_vice_versa() {
    let err = assert_rejects(&[
        ("I.java", "public interface I {}"),
        ("B.java", "public class B extends I { public B() {} }"),
    ]);
    assert!(err.contains("cannot extend an interface"));

    let err = assert_rejects(&[
        ("A.java", "public class A { public A() {} }"),
        ("J.java", "public interface J extends A {}"),
    ]);
    assert!(err.contains("cannot extend a class"));

    let err = assert_rejects(&[
        ("A.java", "public class A { public A() {} }"),
        ("B.java", "public class B implements A { public B() {} }"),
    ]);
    assert!(err.contains("cannot implement a class"));
}

#[test]
fn repeated_parent_interfaces() {
    let err = assert_rejects(&[
        ("I.java", "public interface I {}"),
        (
            "C.java",
            "public class C implements I, I { public C() {} }",
        ),
    ]);
    assert!(err.contains("more than once"));
}

#[test]
fn replacement_rules() {
    // static-ness must agree
    let err = assert_rejects(&[
        (
            "A.java",
            "public class A { public A() {} public int m() { return 1; } }",
        ),
        (
            "B.java",
            "public class B extends A { public B() {} public static int m() { return 1; } }",
        ),
    ]);
    assert!(err.contains("static-ness"));

    // a protected method may not replace a public one
    let err = assert_rejects(&[
        (
            "A.java",
            "public class A { public A() {} public int m() { return 1; } }",
        ),
        (
            "B.java",
            "public class B extends A { public B() {} protected int m() { return 2; } }",
        ),
    ]);
    assert!(err.contains("protected"));

    // final methods may not be replaced
    let err = assert_rejects(&[
        (
            "A.java",
            "public class A { public A() {} public final int m() { return 1; } }",
        ),
        (
            "B.java",
            "public class B extends A { public B() {} public int m() { return 2; } }",
        ),
    ]);
    assert!(err.contains("final method"));

    // a matching replacement is fine
    assert_accepts(&[
        (
            "A.java",
            "public class A { public A() {} public int m() { return 1; } }",
        ),
        (
            "B.java",
            "public class B extends A { public B() {} public int m() { return 2; } }",
        ),
    ]);
}

#[test]
fn condition_must_be_boolean() {
    let err = assert_rejects(&[(
        "A.java",
        "public class A { public A() { if (1) { int x = 2; } } }",
    )]);
    assert!(err.contains("must have type boolean"));

    assert_accepts(&[(
        "A.java",
        "public class A { public A() { if (1 < 2) { int x = 2; } } }",
    )]);
}

#[test]
fn single_statement_bodies_are_checked() {
    // The branch is not a block; the bad assignment must still be caught.
    let err = assert_rejects(&[(
        "A.java",
        "public class A { public A() { boolean b = true; if (b) b = 1; } }",
    )]);
    assert!(err.contains("Cannot assign"));
}

#[test]
fn return_type_must_be_assignable() {
    let err = assert_rejects(&[(
        "A.java",
        "public class A { public A() {} public int m() { return true; } }",
    )]);
    assert!(err.contains("Cannot return"));

    // byte widens into an int return.
    assert_accepts(&[(
        "A.java",
        "public class A { public A() {} public int m() { return (byte)1; } }",
    )]);
}

#[test]
fn this_in_static_context() {
    let err = assert_rejects(&[(
        "A.java",
        "public class A { public A() {} public int f; public static int m() { return this.f; } }",
    )]);
    assert!(err.contains("static context"));
}

#[test]
fn string_concatenation() {
    assert_accepts(&[(
        "A.java",
        "public class A { public A() { String s = \"n = \" + 5; String t = s + 'c'; } }",
    )]);

    // Concatenation with void is rejected.
    let err = assert_rejects(&[(
        "A.java",
        "public class A { public A() { String s = \"x\" + m(); } public void m() {} }",
    )]);
    assert!(err.contains("void"));
}

#[test]
fn equality_requires_related_types() {
    let err = assert_rejects(&[
        ("A.java", "public final class A { public A() {} }"),
        ("B.java", "public final class B { public B() {} }"),
        (
            "C.java",
            "public class C { public C(A a, B b) { boolean e = a == b; } }",
        ),
    ]);
    assert!(err.contains("=="));

    assert_accepts(&[(
        "A.java",
        "public class A { public A() { boolean e = \"x\" == null; boolean f = 1 == 'c'; } }",
    )]);
}

#[test]
fn instanceof_rules() {
    assert_accepts(&[(
        "A.java",
        "public class A { public A(Object o) { boolean b = o instanceof String; } }",
    )]);

    let err = assert_rejects(&[(
        "A.java",
        "public class A { public A() { boolean b = 5 instanceof String; } }",
    )]);
    assert!(err.contains("instanceof"));
}

#[test]
fn array_rules() {
    assert_accepts(&[(
        "A.java",
        "public class A { public A() { int[] xs = new int[3]; xs[0] = 5; int n = xs.length; } }",
    )]);

    let err = assert_rejects(&[(
        "A.java",
        "public class A { public A() { int[] xs = new int[true]; } }",
    )]);
    assert!(err.contains("numeric"));

    let err = assert_rejects(&[(
        "A.java",
        "public class A { public A() { int x = 1; int y = x[0]; } }",
    )]);
    assert!(err.contains("non-array"));

    // Arrays convert to Object, Cloneable and java.io.Serializable.
    assert_accepts(&[(
        "A.java",
        "public class A { public A() { Object o = new int[2]; Cloneable c = new A[1]; java.io.Serializable s = new int[1]; } }",
    )]);
}

#[test]
fn cast_rules() {
    // Downcast through a non-final class is permitted.
    assert_accepts(&[(
        "A.java",
        "public class A { public A(Object o) { A a = (A) o; } }",
    )]);

    // Casts between unrelated final classes are not.
    let err = assert_rejects(&[
        ("A.java", "public final class A { public A() {} }"),
        ("B.java", "public final class B { public B() {} }"),
        ("C.java", "public class C { public C(A a) { B b = (B) a; } }"),
    ]);
    assert!(err.contains("Cannot cast"));
}

#[test]
fn constructor_resolution() {
    assert_accepts(&[
        (
            "A.java",
            "public class A { public A(int x) {} }",
        ),
        (
            "B.java",
            "public class B { public B() { A a = new A(5); } }",
        ),
    ]);

    let err = assert_rejects(&[
        ("A.java", "public class A { public A(int x) {} }"),
        ("B.java", "public class B { public B() { A a = new A(); } }"),
    ]);
    assert!(err.contains("constructor"));
}

#[test]
fn unresolved_name_in_expression() {
    let err = assert_rejects(&[(
        "A.java",
        "public class A { public A() { int x = missing; } }",
    )]);
    assert!(err.contains("could not be resolved"));
}

#[test]
fn division_by_zero_is_not_a_static_error() {
    assert_accepts(&[(
        "A.java",
        "public class A { public A() { int x = 1 / 0; int y = 1 % 0; } }",
    )]);
}
