//! Analyzer pipeline tests: cross-file resolution, access control, and the
//! environment invariants that must hold for accepted programs.

use joosc::hierarchy::{hierarchy_check, is_checked};
use joosc::{AnalyzeError, Analyzer};
use std::path::{Path, PathBuf};

fn stdlib_analyzer() -> Analyzer {
    let stdlib = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/stdlib"));
    Analyzer::with_stdlib(stdlib).expect("stdlib must load")
}

fn build(sources: &[(&str, &str)]) -> Result<Analyzer, AnalyzeError> {
    let mut analyzer = stdlib_analyzer();
    for (name, source) in sources {
        analyzer.add_source(PathBuf::from(name), source)?;
    }
    analyzer.check()?;
    Ok(analyzer)
}

fn assert_accepts(sources: &[(&str, &str)]) -> Analyzer {
    match build(sources) {
        Ok(analyzer) => analyzer,
        Err(err) => panic!("expected acceptance, got: {err}"),
    }
}

fn assert_rejects(sources: &[(&str, &str)]) -> String {
    match build(sources) {
        Ok(_) => panic!("expected rejection"),
        Err(err) => err.to_string(),
    }
}

#[test]
fn stdlib_alone_is_well_formed() {
    let mut analyzer = stdlib_analyzer();
    analyzer.check().expect("the shipped stdlib must check");
}

#[test]
fn cross_file_references_resolve() {
    assert_accepts(&[
        (
            "Point.java",
            "package geom; public class Point {
                public int x;
                public int y;
                public Point(int x, int y) { this.x = x; this.y = y; }
                public int getX() { return this.x; }
            }",
        ),
        (
            "Main.java",
            "import geom.Point;
             public class Main {
                public Main() {
                    Point p = new Point(1, 2);
                    int x = p.getX() + p.y;
                }
             }",
        ),
    ]);
}

#[test]
fn on_demand_import_resolves() {
    assert_accepts(&[
        (
            "Helper.java",
            "package util; public class Helper { public Helper() {} public static int id(int x) { return x; } }",
        ),
        (
            "Main.java",
            "import util.*;
             public class Main { public Main() { int x = Helper.id(4); } }",
        ),
    ]);
}

#[test]
fn stdlib_types_are_usable() {
    assert_accepts(&[(
        "Main.java",
        "public class Main {
            public Main() {
                String s = \"hello\";
                int n = s.length();
                Integer boxed = new Integer(n);
                int m = boxed.intValue();
                int max = Integer.MAX_VALUE;
                System.out.println(s);
                System.out.println(max);
            }
         }",
    )]);
}

#[test]
fn static_member_through_instance_is_rejected() {
    let err = assert_rejects(&[(
        "A.java",
        "public class A {
            public static int f;
            public A() { A a = new A(); int x = a.f; }
         }",
    )]);
    assert!(err.contains("static"));
}

#[test]
fn instance_member_through_type_is_rejected() {
    let err = assert_rejects(&[(
        "A.java",
        "public class A {
            public int f;
            public A() { int x = A.f; }
         }",
    )]);
    assert!(err.contains("non-static"));
}

#[test]
fn implicit_this_in_static_method_is_rejected() {
    let err = assert_rejects(&[(
        "A.java",
        "public class A {
            public A() {}
            public int g() { return 1; }
            public static int m() { return g(); }
         }",
    )]);
    assert!(err.contains("static context"));
}

#[test]
fn protected_access_from_subclass() {
    assert_accepts(&[
        (
            "A.java",
            "package p; public class A { protected int f; public A() {} }",
        ),
        (
            "B.java",
            "package q; public class B extends p.A { public B() {} public int m() { return this.f; } }",
        ),
    ]);
}

#[test]
fn protected_access_from_unrelated_package_is_rejected() {
    let err = assert_rejects(&[
        (
            "A.java",
            "package p; public class A { protected int f; public A() {} }",
        ),
        (
            "C.java",
            "package q; public class C { public C(p.A a) { int x = a.f; } }",
        ),
    ]);
    assert!(err.contains("protected"));
}

#[test]
fn protected_access_within_package() {
    assert_accepts(&[
        (
            "A.java",
            "package p; public class A { protected int f; public A() {} }",
        ),
        (
            "C.java",
            "package p; public class C { public C(A a) { int x = a.f; } }",
        ),
    ]);
}

#[test]
fn overload_resolution_is_exact() {
    assert_accepts(&[(
        "A.java",
        "public class A {
            public A() { this.m(1); this.m(true); }
            public void m(int x) {}
            public void m(boolean b) {}
         }",
    )]);

    // No implicit widening at call sites: an exact match is required.
    let err = assert_rejects(&[(
        "A.java",
        "public class A {
            public A() { this.m((byte)1); }
            public void m(int x) {}
         }",
    )]);
    assert!(err.contains("could not be resolved"));
}

#[test]
fn inherited_method_is_callable() {
    assert_accepts(&[
        (
            "A.java",
            "public class A { public A() {} public int m() { return 1; } }",
        ),
        (
            "B.java",
            "public class B extends A { public B() {} }",
        ),
        (
            "C.java",
            "public class C { public C(B b) { int x = b.m(); } }",
        ),
    ]);
}

#[test]
fn interface_hierarchy_resolves_methods() {
    assert_accepts(&[
        ("I.java", "public interface I { public int f(); }"),
        ("J.java", "public interface J extends I { public int g(); }"),
        (
            "C.java",
            "public class C { public C(J j) { int x = j.f() + j.g(); } }",
        ),
    ]);
}

#[test]
fn field_shadowing_across_types() {
    assert_accepts(&[
        (
            "A.java",
            "public class A { public int f; public A() {} }",
        ),
        (
            "B.java",
            "public class B extends A { public boolean f; public B() { boolean b = this.f; } }",
        ),
    ]);
}

#[test]
fn assignability_into_supertypes() {
    assert_accepts(&[
        ("I.java", "public interface I {}"),
        (
            "A.java",
            "public class A implements I { public A() {} }",
        ),
        (
            "B.java",
            "public class B extends A { public B() {} }",
        ),
        (
            "Main.java",
            "public class Main {
                public Main() {
                    A a = new B();
                    I i = new B();
                    Object o = new B();
                    Object s = \"str\";
                }
             }",
        ),
    ]);
}

#[test]
fn qualified_static_chain() {
    assert_accepts(&[(
        "Main.java",
        "public class Main { public Main() { int x = java.lang.Integer.MAX_VALUE; } }",
    )]);
}

// ----------------------------------------------------------------------
// Environment invariants on accepted programs
// ----------------------------------------------------------------------

#[test]
fn every_type_name_entry_resolves() {
    let analyzer = assert_accepts(&[
        (
            "A.java",
            "package p; public class A { public A() {} public B f; }",
        ),
        ("B.java", "package p; public class B { public B() {} }"),
    ]);
    for decl in &analyzer.env().types {
        for (name, resolution) in &decl.type_names {
            assert!(
                resolution.is_some(),
                "type name '{name}' in {} left unresolved",
                decl.name
            );
        }
    }
}

#[test]
fn hierarchy_check_is_idempotent() {
    let analyzer = assert_accepts(&[
        (
            "A.java",
            "public class A { public A() {} public int m() { return 1; } }",
        ),
        ("B.java", "public class B extends A { public B() {} }"),
    ]);
    assert!(is_checked(analyzer.env()));

    let mut env = analyzer.env().clone();
    let methods_before: Vec<usize> = env.types.iter().map(|t| t.methods.len()).collect();
    hierarchy_check(&mut env).expect("re-running the phase must not error");
    let methods_after: Vec<usize> = env.types.iter().map(|t| t.methods.len()).collect();
    assert_eq!(methods_before, methods_after);
}

#[test]
fn inherited_members_are_appended() {
    let analyzer = assert_accepts(&[
        (
            "A.java",
            "public class A { public A() {} public int m() { return 1; } public int f; }",
        ),
        ("B.java", "public class B extends A { public B() {} }"),
    ]);
    let env = analyzer.env();
    let b = env.lookup("B").unwrap();
    let decl = env.type_decl(b);
    assert!(decl.fields.iter().any(|f| f.name == "f"));
    // Inherited members keep their declaring type.
    let a = env.lookup("A").unwrap();
    let m = decl.methods.iter().find(|m| m.name == "m").unwrap();
    assert_eq!(m.owner, a);
}

#[test]
fn fork_isolates_compilations() {
    let base = stdlib_analyzer();

    let mut first = base.fork().unwrap();
    first
        .add_source(
            PathBuf::from("A.java"),
            "public class A { public A() {} }",
        )
        .unwrap();
    first.check().unwrap();

    // The second fork must not see the first compilation's types.
    let mut second = base.fork().unwrap();
    second
        .add_source(
            PathBuf::from("B.java"),
            "public class B extends A { public B() {} }",
        )
        .unwrap();
    assert!(second.check().is_err());
}
