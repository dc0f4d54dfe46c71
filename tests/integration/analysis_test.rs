//! Integration tests for the deadsharp analysis pipeline
//!
//! These tests verify the complete pipeline — discovery, parsing, graph
//! building, candidate extraction, escape scanning, resolution — over
//! small in-memory C# projects.

use deadsharp::analysis::Finding;
use deadsharp::{analyze, Config};
use std::path::Path;

fn write_sources(dir: &Path, sources: &[(&str, &str)]) {
    for (name, contents) in sources {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("mkdir");
        }
        std::fs::write(&path, contents).expect("write source");
    }
}

fn run(sources: &[(&str, &str)]) -> Vec<Finding> {
    run_with(sources, Config::default())
}

fn run_with(sources: &[(&str, &str)], config: Config) -> Vec<Finding> {
    let dir = tempfile::tempdir().expect("tempdir");
    write_sources(dir.path(), sources);
    analyze(dir.path(), &config, false).expect("analysis").findings
}

fn has(findings: &[Finding], code: &str, symbol: &str) -> bool {
    findings.iter().any(|f| {
        f.rule.code() == code
            && f.declaration
                .as_ref()
                .map(|d| d.name == symbol)
                .unwrap_or(false)
    })
}

fn count_for(findings: &[Finding], symbol: &str) -> usize {
    findings
        .iter()
        .filter(|f| {
            f.declaration
                .as_ref()
                .map(|d| d.name == symbol)
                .unwrap_or(false)
        })
        .count()
}

#[test]
fn unreferenced_internal_class_is_reported_once() {
    let findings = run(&[(
        "Library.cs",
        "internal class C { public string V { get; set; } }\n",
    )]);

    // The type diagnostic subsumes its members: exactly one finding
    assert!(has(&findings, "DS001", "C"), "findings: {findings:?}");
    assert_eq!(findings.len(), 1, "findings: {findings:?}");
}

#[test]
fn constructed_but_unread_class_reports_members_not_type() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class C { public string V { get; set; } }
public class Api { public object Run() { return new C(); } }
"#,
    )]);

    assert!(!has(&findings, "DS001", "C"));
    assert!(!has(&findings, "DS002", "C"));
    // The untouched property fires independently
    assert!(has(&findings, "DS003", "V"), "findings: {findings:?}");
}

#[test]
fn referenced_symbols_are_never_reported() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class OrderValidator
{
    public bool Validate(int amount) { return amount > 0; }
}
public class Api
{
    public bool Check(int amount) { return new OrderValidator().Validate(amount); }
}
"#,
    )]);

    assert!(findings.is_empty(), "findings: {findings:?}");
}

#[test]
fn usage_across_files_counts() {
    let findings = run(&[
        ("Widget.cs", "namespace Acme { internal class Widget { public void Spin() { } } }\n"),
        (
            "Api.cs",
            "namespace Acme { public class Api { public void Run() { new Widget().Spin(); } } }\n",
        ),
    ]);

    assert!(findings.is_empty(), "findings: {findings:?}");
}

#[test]
fn self_recursive_method_is_reported() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class C
{
    public void Start() { }
    private int Fib(int n) { return n < 2 ? n : Fib(n - 1) + Fib(n - 2); }
}
public class Api { public void Run() { new C().Start(); } }
"#,
    )]);

    assert!(has(&findings, "DS003", "Fib"), "findings: {findings:?}");
}

#[test]
fn mutually_recursive_cycle_is_reported_whole() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class C
{
    public void Start() { }
    private void Ping(int n) { if (n > 0) Pong(n - 1); }
    private void Pong(int n) { if (n > 0) Ping(n - 1); }
}
public class Api { public void Run() { new C().Start(); } }
"#,
    )]);

    assert!(has(&findings, "DS003", "Ping"), "findings: {findings:?}");
    assert!(has(&findings, "DS003", "Pong"), "findings: {findings:?}");
}

#[test]
fn cycle_with_external_entry_is_not_reported() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class C
{
    public void Start() { Ping(5); }
    private void Ping(int n) { if (n > 0) Pong(n - 1); }
    private void Pong(int n) { if (n > 0) Ping(n - 1); }
}
public class Api { public void Run() { new C().Start(); } }
"#,
    )]);

    assert!(!has(&findings, "DS003", "Ping"), "findings: {findings:?}");
    assert!(!has(&findings, "DS003", "Pong"), "findings: {findings:?}");
}

#[test]
fn internal_interface_without_callsite_reports_contract_and_impl() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal interface IService { void DoWork(); }
internal class Impl : IService { public void DoWork() { } }
public class Holder { public object Keep() { return new Impl(); } }
"#,
    )]);

    // Self-contained internal interface hierarchy: reported as a set
    assert_eq!(count_for(&findings, "DoWork"), 2, "findings: {findings:?}");
}

#[test]
fn interface_callsite_keeps_hierarchy_alive() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal interface IService { void DoWork(); }
internal class Impl : IService { public void DoWork() { } }
public class Consumer
{
    public void Run()
    {
        IService svc = new Impl();
        svc.DoWork();
    }
}
"#,
    )]);

    assert_eq!(count_for(&findings, "DoWork"), 0, "findings: {findings:?}");
}

#[test]
fn top_level_statements_are_entry_points() {
    let findings = run(&[(
        "Program.cs",
        r#"
var g = new Greeter();
g.Greet();

internal class Greeter { public void Greet() { } }
"#,
    )]);

    assert!(findings.is_empty(), "findings: {findings:?}");
}

#[test]
fn partial_type_reported_as_one_symbol() {
    let findings = run(&[
        ("SplitA.cs", "namespace Acme { internal partial class Split { public void Alpha() { } } }\n"),
        ("SplitB.cs", "namespace Acme { internal partial class Split { public void Beta() { Alpha(); } } }\n"),
    ]);

    assert_eq!(count_for(&findings, "Split"), 1, "findings: {findings:?}");
    // Members of the dead partial are subsumed
    assert_eq!(count_for(&findings, "Alpha"), 0);
    assert_eq!(count_for(&findings, "Beta"), 0);
}

#[test]
fn partial_type_used_via_either_span_is_alive() {
    let findings = run(&[
        ("SplitA.cs", "namespace Acme { internal partial class Split { public void Alpha() { } } }\n"),
        ("SplitB.cs", "namespace Acme { internal partial class Split { public void Beta() { } } }\n"),
        (
            "Api.cs",
            "namespace Acme { public class Api { public void Run() { var s = new Split(); s.Alpha(); s.Beta(); } } }\n",
        ),
    ]);

    assert!(findings.is_empty(), "findings: {findings:?}");
}

#[test]
fn generated_files_are_not_reported_but_their_references_count() {
    let findings = run(&[
        ("Widget.cs", "internal class Widget { public void Spin() { } }\n"),
        (
            "Wireup.g.cs",
            "internal static class Wireup { public static void Init() { new Widget().Spin(); } }\n",
        ),
    ]);

    // Widget is kept alive by the generated file; the generated class
    // itself is never reported
    assert!(!has(&findings, "DS001", "Widget"), "findings: {findings:?}");
    assert!(!has(&findings, "DS001", "Wireup"), "findings: {findings:?}");
}

#[test]
fn retain_pattern_suppresses_reporting() {
    let mut config = Config::default();
    config.retain_patterns.push("*Handler".to_string());

    let findings = run_with(
        &[(
            "Library.cs",
            "internal class ClickHandler { }\ninternal class Orphan { }\n",
        )],
        config,
    );

    assert!(!has(&findings, "DS001", "ClickHandler"));
    assert!(has(&findings, "DS001", "Orphan"));
}

#[test]
fn configured_entry_point_is_exempt() {
    let mut config = Config::default();
    config.entry_points.push("Acme.Bootstrapper".to_string());

    let findings = run_with(
        &[(
            "Library.cs",
            "namespace Acme { internal class Bootstrapper { } }\n",
        )],
        config,
    );

    assert!(findings.is_empty(), "findings: {findings:?}");
}

#[test]
fn parallel_and_sequential_agree() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_sources(
        dir.path(),
        &[
            ("A.cs", "internal class Orphan { }\ninternal class Widget { }\n"),
            ("B.cs", "public class Api { public object K() { return new Widget(); } }\n"),
        ],
    );

    let config = Config::default();
    let sequential = analyze(dir.path(), &config, false).expect("sequential").findings;
    let parallel = analyze(dir.path(), &config, true).expect("parallel").findings;

    let codes = |findings: &[Finding]| {
        let mut v: Vec<String> = findings
            .iter()
            .map(|f| {
                format!(
                    "{}:{}",
                    f.rule.code(),
                    f.declaration.as_ref().map(|d| d.name.as_str()).unwrap_or("")
                )
            })
            .collect();
        v.sort();
        v
    };

    assert_eq!(codes(&sequential), codes(&parallel));
    assert!(has(&sequential, "DS001", "Orphan"));
}
