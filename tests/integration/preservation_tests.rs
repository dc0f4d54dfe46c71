//! Reflection-preservation tests
//!
//! Verifies the typeof/nameof asymmetry, the per-category preservation
//! flag matrix (positive and negative for each member category), and the
//! bounded typeof-flow propagation into annotated sinks.

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

fn reported(findings: &[Finding], symbol: &str) -> bool {
    findings.iter().any(|f| {
        f.declaration
            .as_ref()
            .map(|d| d.name == symbol)
            .unwrap_or(false)
    })
}

// ---- typeof / nameof asymmetry ----

#[test]
fn nameof_alone_does_not_prevent_reporting() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Target { }
public class Api
{
    public string Describe() { return nameof(Target); }
}
"#,
    )]);

    assert!(reported(&findings, "Target"), "findings: {findings:?}");
}

#[test]
fn typeof_alone_prevents_reporting() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Target { }
public class Api
{
    public object Describe() { return typeof(Target); }
}
"#,
    )]);

    assert!(!reported(&findings, "Target"), "findings: {findings:?}");
}

#[test]
fn typeof_conservatively_preserves_constructors() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Plugin
{
    public Plugin(int n) { }
}
public class Api
{
    public object Load() { return Activator.CreateInstance(typeof(Plugin), 1); }
}
"#,
    )]);

    assert!(findings.is_empty(), "findings: {findings:?}");
}

#[test]
fn reflection_lookup_by_name_preserves_member() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Handler
{
    private void OnMessage() { }
    private void Unrelated() { }
}
public class Api
{
    public object Bind(Handler h)
    {
        var handler = new Handler();
        return handler.GetType().GetMethod("OnMessage");
    }
}
"#,
    )]);

    assert!(!reported(&findings, "OnMessage"), "findings: {findings:?}");
    assert!(reported(&findings, "Unrelated"), "findings: {findings:?}");
}

// ---- flag category matrix ----

#[test]
fn nonpublic_methods_flag_preserves_exactly_that_category() {
    let findings = run(&[(
        "Library.cs",
        r#"
[DynamicallyAccessedMembers(DynamicallyAccessedMemberTypes.NonPublicMethods)]
internal class Reflected
{
    private void Hidden() { }
    private int hiddenField;
    public void Shown() { }
}
public class Api { public object K() { return new Reflected(); } }
"#,
    )]);

    // NonPublicMethods preserves the private method and nothing else
    assert!(!reported(&findings, "Hidden"), "findings: {findings:?}");
    assert!(reported(&findings, "hiddenField"), "findings: {findings:?}");
    assert!(reported(&findings, "Shown"), "findings: {findings:?}");
}

#[test]
fn nonpublic_fields_flag_preserves_exactly_that_category() {
    let findings = run(&[(
        "Library.cs",
        r#"
[DynamicallyAccessedMembers(DynamicallyAccessedMemberTypes.NonPublicFields)]
internal class Reflected
{
    private int hiddenField;
    private void Hidden() { }
}
public class Api { public object K() { return new Reflected(); } }
"#,
    )]);

    assert!(!reported(&findings, "hiddenField"), "findings: {findings:?}");
    assert!(reported(&findings, "Hidden"), "findings: {findings:?}");
}

#[test]
fn properties_events_and_nested_types_match_their_categories() {
    let findings = run(&[(
        "Library.cs",
        r#"
[DynamicallyAccessedMembers(DynamicallyAccessedMemberTypes.NonPublicProperties | DynamicallyAccessedMemberTypes.NonPublicEvents)]
internal class Reflected
{
    private int Hidden { get; set; }
    private event Action Changed;
    private class Nested { }
}
public class Api { public object K() { return new Reflected(); } }
"#,
    )]);

    assert!(!reported(&findings, "Hidden"), "findings: {findings:?}");
    assert!(!reported(&findings, "Changed"), "findings: {findings:?}");
    // Nested types are not in the flag set
    assert!(reported(&findings, "Nested"), "findings: {findings:?}");
}

#[test]
fn nested_types_flag_preserves_nested_types() {
    let findings = run(&[(
        "Library.cs",
        r#"
[DynamicallyAccessedMembers(DynamicallyAccessedMemberTypes.NonPublicNestedTypes)]
internal class Reflected
{
    private class Nested { }
    private void Hidden() { }
}
public class Api { public object K() { return new Reflected(); } }
"#,
    )]);

    assert!(!reported(&findings, "Nested"), "findings: {findings:?}");
    assert!(reported(&findings, "Hidden"), "findings: {findings:?}");
}

#[test]
fn combined_flags_are_a_union_not_all() {
    let findings = run(&[(
        "Library.cs",
        r#"
[DynamicallyAccessedMembers(DynamicallyAccessedMemberTypes.NonPublicMethods | DynamicallyAccessedMemberTypes.NonPublicFields)]
internal class Reflected
{
    private void Hidden() { }
    private int hiddenField;
    private int HiddenProp { get; set; }
}
public class Api { public object K() { return new Reflected(); } }
"#,
    )]);

    assert!(!reported(&findings, "Hidden"));
    assert!(!reported(&findings, "hiddenField"));
    assert!(reported(&findings, "HiddenProp"), "findings: {findings:?}");
}

#[test]
fn all_flag_preserves_every_category() {
    let findings = run(&[(
        "Library.cs",
        r#"
[DynamicallyAccessedMembers(DynamicallyAccessedMemberTypes.All)]
internal class Reflected
{
    private void Hidden() { }
    private int hiddenField;
    private int HiddenProp { get; set; }
    private class Nested { }
}
public class Api { public object K() { return new Reflected(); } }
"#,
    )]);

    assert!(findings.is_empty(), "findings: {findings:?}");
}

// ---- bounded typeof-flow propagation ----

#[test]
fn typeof_flowing_into_annotated_parameter_preserves_matching_members() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Plugin
{
    private void Configure() { }
    private int state;
}
public class Loader
{
    public static object Make([DynamicallyAccessedMembers(DynamicallyAccessedMemberTypes.NonPublicMethods)] Type type)
    {
        return null;
    }

    public object Boot() { return Make(typeof(Plugin)); }
}
"#,
    )]);

    assert!(!reported(&findings, "Configure"), "findings: {findings:?}");
    // Fields are outside the flagged categories
    assert!(reported(&findings, "state"), "findings: {findings:?}");
}

#[test]
fn typeof_assigned_to_annotated_field_preserves_matching_members() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Plugin
{
    private void Configure() { }
}
public class Registry
{
    [DynamicallyAccessedMembers(DynamicallyAccessedMemberTypes.NonPublicMethods)]
    public Type PluginType;

    public void Register() { PluginType = typeof(Plugin); }
}
"#,
    )]);

    assert!(!reported(&findings, "Configure"), "findings: {findings:?}");
}

#[test]
fn typeof_returned_from_annotated_method_preserves_matching_members() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Plugin
{
    private void Configure() { }
}
public class Provider
{
    [return: DynamicallyAccessedMembers(DynamicallyAccessedMemberTypes.NonPublicMethods)]
    public Type Get() { return typeof(Plugin); }
}
"#,
    )]);

    assert!(!reported(&findings, "Configure"), "findings: {findings:?}");
}

#[test]
fn annotated_generic_argument_preserves_matching_members() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Widget
{
    public Widget() { }
    private void Helper() { }
}
public class Factory
{
    public static object Create<[DynamicallyAccessedMembers(DynamicallyAccessedMemberTypes.NonPublicMethods)] T>()
    {
        return null;
    }

    public object Run() { return Factory.Create<Widget>(); }
}
"#,
    )]);

    assert!(!reported(&findings, "Helper"), "findings: {findings:?}");
}

#[test]
fn typeof_without_annotated_sink_does_not_preserve_members() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Plugin
{
    private void Configure() { }
}
public class Loader
{
    public static object Make(Type type) { return null; }
    public object Boot() { return Make(typeof(Plugin)); }
}
"#,
    )]);

    // The type itself survives typeof, but nothing preserves its members
    assert!(!reported(&findings, "Plugin"), "findings: {findings:?}");
    assert!(reported(&findings, "Configure"), "findings: {findings:?}");
}

#[test]
fn flow_into_a_different_parameter_does_not_preserve() {
    let findings = run(&[(
        "Library.cs",
        r#"
internal class Plugin
{
    private void Configure() { }
}
public class Loader
{
    public static object Make(Type plain, [DynamicallyAccessedMembers(DynamicallyAccessedMemberTypes.NonPublicMethods)] Type annotated)
    {
        return null;
    }

    public object Boot() { return Make(typeof(Plugin), null); }
}
"#,
    )]);

    // typeof flowed into the unannotated first parameter only
    assert!(reported(&findings, "Configure"), "findings: {findings:?}");
}
