//! Per-rule detector tests
//!
//! Each rule is exercised positively and negatively: DS001 over every
//! type kind, DS002 instantiation evidence, DS003 member kinds and the
//! accessor matrix.

use deadsharp::analysis::Finding;
use deadsharp::{analyze, Config};

fn run(sources: &[(&str, &str)]) -> Vec<Finding> {
    let dir = tempfile::tempdir().expect("tempdir");
    for (name, contents) in sources {
        std::fs::write(dir.path().join(name), contents).expect("write source");
    }
    analyze(dir.path(), &Config::default(), false)
        .expect("analysis")
        .findings
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

fn message_of(findings: &[Finding], code: &str, symbol: &str) -> Option<String> {
    findings
        .iter()
        .find(|f| {
            f.rule.code() == code
                && f.declaration
                    .as_ref()
                    .map(|d| d.name == symbol)
                    .unwrap_or(false)
        })
        .map(|f| f.message.clone())
}

// ---- DS001: unused internal types ----

#[test]
fn ds001_reports_every_unused_type_kind() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class DeadClass { }
internal struct DeadStruct { }
internal interface IDead { }
internal enum DeadEnum { One, Two }
internal delegate void DeadCallback(int value);
"#,
    )]);

    for symbol in ["DeadClass", "DeadStruct", "IDead", "DeadEnum", "DeadCallback"] {
        assert!(has(&findings, "DS001", symbol), "missing {symbol}: {findings:?}");
    }
}

#[test]
fn ds001_spares_used_types() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal enum Level { Low, High }
internal delegate void Callback(int value);
public class Api
{
    public object Pick(Level level, Callback cb) { return null; }
}
"#,
    )]);

    assert!(!has(&findings, "DS001", "Level"), "findings: {findings:?}");
    assert!(!has(&findings, "DS001", "Callback"), "findings: {findings:?}");
}

#[test]
fn ds001_nested_type_subsumed_by_dead_parent() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Outer
{
    internal class Inner { }
}
"#,
    )]);

    assert!(has(&findings, "DS001", "Outer"));
    assert!(!has(&findings, "DS001", "Inner"), "findings: {findings:?}");
}

#[test]
fn ds001_nested_type_reported_when_parent_is_alive() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Outer
{
    public void Touch() { }
    private class Inner { }
}
public class Api { public void Run() { new Outer().Touch(); } }
"#,
    )]);

    assert!(!has(&findings, "DS001", "Outer"));
    assert!(has(&findings, "DS001", "Inner"), "findings: {findings:?}");
}

// ---- DS002: uninstantiated internal classes ----

#[test]
fn ds002_reports_referenced_but_never_constructed_class() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Job
{
    public void Tick() { }
}
public class Api
{
    public void Run(Job job) { job.Tick(); }
}
"#,
    )]);

    assert!(has(&findings, "DS002", "Job"), "findings: {findings:?}");
    assert!(!has(&findings, "DS001", "Job"));
}

#[test]
fn ds002_spares_constructed_class() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Job
{
    public void Tick() { }
}
public class Api
{
    public void Run() { new Job().Tick(); }
}
"#,
    )]);

    assert!(!has(&findings, "DS002", "Job"), "findings: {findings:?}");
}

#[test]
fn ds002_spares_static_abstract_and_attribute_types() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal static class MathUtil
{
    public static int Twice(int n) { return n * 2; }
}
internal abstract class BaseJob
{
    public void Tick() { }
}
internal class MarkerAttribute : Attribute { }
public class Api
{
    public int Run(BaseJob job) { job.Tick(); return MathUtil.Twice(2); }
    [Marker]
    public void Tagged() { }
}
"#,
    )]);

    assert!(!has(&findings, "DS002", "MathUtil"), "findings: {findings:?}");
    assert!(!has(&findings, "DS002", "BaseJob"), "findings: {findings:?}");
    assert!(!has(&findings, "DS002", "MarkerAttribute"), "findings: {findings:?}");
}

#[test]
fn ds002_spares_type_with_derived_types() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Base
{
    public void Tick() { }
}
internal class Derived : Base { }
public class Api
{
    public void Run(Base b) { b.Tick(); var d = new Derived(); }
}
"#,
    )]);

    // Base is constructed through Derived
    assert!(!has(&findings, "DS002", "Base"), "findings: {findings:?}");
}

#[test]
fn ds002_spares_typeof_target() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Plugin
{
    public void Load() { }
}
public class Api
{
    public object Describe(Plugin p) { p.Load(); return typeof(Plugin); }
}
"#,
    )]);

    assert!(!has(&findings, "DS002", "Plugin"), "findings: {findings:?}");
}

// ---- DS003: unused non-public members ----

#[test]
fn ds003_reports_each_member_kind() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Widget
{
    private int counter;
    private void Helper() { }
    private event Action Changed;
    public Widget() { }
    private Widget(int n) { }
}
public class Api { public object K() { return new Widget(); } }
"#,
    )]);

    assert!(has(&findings, "DS003", "counter"), "findings: {findings:?}");
    assert!(has(&findings, "DS003", "Helper"), "findings: {findings:?}");
    assert!(has(&findings, "DS003", "Changed"), "findings: {findings:?}");
}

#[test]
fn ds003_unused_private_constructor_reported() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Widget
{
    public Widget() { }
    private Widget(int n) { }
}
public class Api { public object K() { return new Widget(); } }
"#,
    )]);

    // `new Widget()` marks every same-name constructor conservatively, so
    // the private overload survives; it must not be reported
    assert!(!has(&findings, "DS001", "Widget"));
}

#[test]
fn ds003_getter_used_setter_unused_reports_only_setter() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Model
{
    public int Count { get; set; }
}
public class Api
{
    public int Run()
    {
        var m = new Model();
        return m.Count;
    }
}
"#,
    )]);

    let setter = message_of(&findings, "DS003", "Count").expect("setter finding");
    assert!(setter.contains("set accessor"), "message: {setter}");
    assert!(
        !findings.iter().any(|f| f.message.contains("get accessor")),
        "findings: {findings:?}"
    );
}

#[test]
fn ds003_setter_used_getter_unused_reports_only_getter() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Model
{
    public int Count { get; set; }
}
public class Api
{
    public void Run()
    {
        var m = new Model();
        m.Count = 5;
    }
}
"#,
    )]);

    let getter = message_of(&findings, "DS003", "Count").expect("getter finding");
    assert!(getter.contains("get accessor"), "message: {getter}");
}

#[test]
fn ds003_property_with_both_accessors_used_reports_nothing() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Model
{
    public int Count { get; set; }
}
public class Api
{
    public int Run()
    {
        var m = new Model();
        m.Count = 5;
        return m.Count;
    }
}
"#,
    )]);

    assert!(findings.is_empty(), "findings: {findings:?}");
}

#[test]
fn ds003_compound_assignment_uses_both_accessors() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Model
{
    public int Count { get; set; }
}
public class Api
{
    public void Run()
    {
        var m = new Model();
        m.Count += 1;
    }
}
"#,
    )]);

    assert!(findings.is_empty(), "findings: {findings:?}");
}

#[test]
fn ds003_untouched_property_reported_whole_once() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Model
{
    public int Count { get; set; }
}
public class Api { public object K() { return new Model(); } }
"#,
    )]);

    let count_findings: Vec<_> = findings
        .iter()
        .filter(|f| {
            f.declaration
                .as_ref()
                .map(|d| d.name == "Count")
                .unwrap_or(false)
        })
        .collect();
    assert_eq!(count_findings.len(), 1, "findings: {findings:?}");
    assert!(count_findings[0].message.contains("property"));
}

#[test]
fn ds003_members_of_dead_type_are_subsumed() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Orphan
{
    private int counter;
    private void Helper() { }
}
"#,
    )]);

    assert!(has(&findings, "DS001", "Orphan"));
    assert!(!has(&findings, "DS003", "counter"), "findings: {findings:?}");
    assert!(!has(&findings, "DS003", "Helper"), "findings: {findings:?}");
}

#[test]
fn ds003_rule_can_be_disabled() {
    let mut config = Config::default();
    let mut options = config.rule("DS003");
    options.enabled = false;
    config.rules.insert("DS003".to_string(), options);

    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("Library.cs"),
        "internal class Widget { private void Helper() { } }\npublic class Api { public object K() { return new Widget(); } }\n",
    )
    .expect("write");

    let findings = analyze(dir.path(), &config, false).expect("analysis").findings;
    assert!(!has(&findings, "DS003", "Helper"), "findings: {findings:?}");
}

#[test]
fn findings_are_sorted_by_file_and_line() {
    let findings = run(&[
        ("A.cs", "internal class First { }\ninternal class Second { }\n"),
        ("B.cs", "internal class Third { }\n"),
    ]);

    let positions: Vec<(String, usize)> = findings
        .iter()
        .map(|f| (f.file.to_string_lossy().to_string(), f.line))
        .collect();
    let mut sorted = positions.clone();
    sorted.sort();
    assert_eq!(positions, sorted);
}
