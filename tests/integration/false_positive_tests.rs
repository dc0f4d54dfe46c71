//! False-positive suppression tests
//!
//! Code that is used through indirect mechanisms must not be reported:
//! framework attributes, serializers, interop callbacks, designer
//! conventions, protocol methods, interface satisfaction, overrides of
//! invisible bases. The bias is always toward under-reporting.

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

// ---- framework attributes ----

#[test]
fn test_framework_attributes_exempt_members() {
    let findings = run(&[(
        "Tests.cs",
        r#"
internal class CalculatorTests
{
    [Fact]
    private void Adds() { }

    [Theory]
    private void AddsMany(int n) { }

    [Test]
    private void NUnitStyle() { }

    [TestMethod]
    private void MsTestStyle() { }

    private void ReallyUnused() { }
}
public class Holder { public object K() { return new CalculatorTests(); } }
"#,
    )]);

    assert!(!reported(&findings, "Adds"), "findings: {findings:?}");
    assert!(!reported(&findings, "AddsMany"));
    assert!(!reported(&findings, "NUnitStyle"));
    assert!(!reported(&findings, "MsTestStyle"));
    assert!(reported(&findings, "ReallyUnused"), "findings: {findings:?}");
}

#[test]
fn test_fixture_type_attribute_exempts_type_and_members() {
    let findings = run(&[(
        "Tests.cs",
        r#"
[TestFixture]
internal class ParserTests
{
    [Test]
    private void Parses() { }

    private Parser MakeParser() { return new Parser(); }
}
internal class Parser { }
"#,
    )]);

    assert!(!reported(&findings, "ParserTests"), "findings: {findings:?}");
    assert!(!reported(&findings, "MakeParser"));
    assert!(!reported(&findings, "Parser"));
}

#[test]
fn interop_attributes_exempt_members() {
    let findings = run(&[(
        "Native.cs",
        r#"
internal static class NativeCallbacks
{
    [UnmanagedCallersOnly]
    private static void OnSignal(int code) { }

    [DllImport("kernel32.dll")]
    private static extern int GetTickCount();
}
public class Holder { public object K() { return typeof(NativeCallbacks); } }
"#,
    )]);

    assert!(!reported(&findings, "OnSignal"), "findings: {findings:?}");
    assert!(!reported(&findings, "GetTickCount"));
}

#[test]
fn serializer_member_attributes_exempt_members() {
    let findings = run(&[(
        "Dto.cs",
        r#"
internal class OrderDto
{
    [JsonPropertyName("id")]
    public int Id { get; set; }

    [JsonConstructor]
    private OrderDto(int id) { }

    [DataMember]
    private string payload;

    [OnDeserialized]
    private void Rehydrate() { }

    private int scratch;
}
public class Api { public object K(OrderDto dto) { return dto; } }
"#,
    )]);

    assert!(!reported(&findings, "Id"), "findings: {findings:?}");
    assert!(!reported(&findings, "OrderDto"), "findings: {findings:?}");
    assert!(!reported(&findings, "payload"));
    assert!(!reported(&findings, "Rehydrate"));
    assert!(reported(&findings, "scratch"), "findings: {findings:?}");
}

#[test]
fn serializable_type_exempts_fields() {
    let findings = run(&[(
        "State.cs",
        r#"
[Serializable]
internal class SessionState
{
    private int revision;
    private void Unrelated() { }
}
public class Api { public object K() { return new SessionState(); } }
"#,
    )]);

    assert!(!reported(&findings, "revision"), "findings: {findings:?}");
    // [Serializable] only covers fields
    assert!(reported(&findings, "Unrelated"), "findings: {findings:?}");
}

#[test]
fn configured_preserve_attribute_exempts_members() {
    let mut config = Config::default();
    config.preserve_attributes.push("KeepAlive".to_string());

    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("Library.cs"),
        r#"
internal class Widget
{
    [KeepAlive]
    private void Pinned() { }
    private void Loose() { }
}
public class Api { public object K() { return new Widget(); } }
"#,
    )
    .expect("write");

    let findings = analyze(dir.path(), &config, false).expect("analysis").findings;
    assert!(!reported(&findings, "Pinned"), "findings: {findings:?}");
    assert!(reported(&findings, "Loose"));
}

// ---- designer conventions ----

#[test]
fn should_serialize_and_reset_pair_with_property() {
    let findings = run(&[(
        "Settings.cs",
        r#"
internal class Settings
{
    public string Theme { get; set; }

    private bool ShouldSerializeTheme() { return true; }
    private void ResetTheme() { }
}
public class Api
{
    public string K()
    {
        var s = new Settings();
        s.Theme = "dark";
        return s.Theme;
    }
}
"#,
    )]);

    assert!(!reported(&findings, "ShouldSerializeTheme"), "findings: {findings:?}");
    assert!(!reported(&findings, "ResetTheme"));
}

#[test]
fn designer_convention_mismatches_are_reported() {
    let findings = run(&[(
        "Settings.cs",
        r#"
internal class Settings
{
    public string Theme { get; set; }

    private bool ShouldSerializetheme() { return true; }
    private bool ShouldSerializeFont() { return true; }
    private void ResetTheme(int mode) { }
    private static bool ShouldSerializeTheme() { return true; }
}
public class Api
{
    public string K()
    {
        var s = new Settings();
        s.Theme = "dark";
        return s.Theme;
    }
}
"#,
    )]);

    // Case mismatch
    assert!(reported(&findings, "ShouldSerializetheme"), "findings: {findings:?}");
    // No matching property
    assert!(reported(&findings, "ShouldSerializeFont"));
    // Parameters void the convention
    assert!(reported(&findings, "ResetTheme"));
    // Static voids the convention
    assert!(reported(&findings, "ShouldSerializeTheme"));
}

#[test]
fn reset_matching_a_field_not_a_property_is_reported() {
    let findings = run(&[(
        "Settings.cs",
        r#"
internal class Settings
{
    public int Theme;

    private void ResetTheme() { }
}
public class Api
{
    public int K()
    {
        var s = new Settings();
        s.Theme = 3;
        return s.Theme;
    }
}
"#,
    )]);

    assert!(reported(&findings, "ResetTheme"), "findings: {findings:?}");
}

// ---- protocol methods ----

#[test]
fn enumerator_protocol_exempted_when_foreach_exists() {
    let findings = run(&[(
        "Sequence.cs",
        r#"
internal class Sequence
{
    public SequenceEnumerator GetEnumerator() { return new SequenceEnumerator(); }
}
internal class SequenceEnumerator
{
    public bool MoveNext() { return false; }
    public int Current { get { return 0; } }
}
public class Api
{
    public int Sum()
    {
        int total = 0;
        foreach (var item in new Sequence())
        {
            total += item;
        }
        return total;
    }
}
"#,
    )]);

    assert!(!reported(&findings, "GetEnumerator"), "findings: {findings:?}");
    assert!(!reported(&findings, "MoveNext"));
    assert!(!reported(&findings, "Current"));
}

#[test]
fn dispose_exempted_when_using_exists() {
    let findings = run(&[(
        "Resource.cs",
        r#"
internal class Session
{
    public void Dispose() { }
}
public class Api
{
    public void Run()
    {
        using (var s = new Session()) { }
    }
}
"#,
    )]);

    assert!(!reported(&findings, "Dispose"), "findings: {findings:?}");
}

#[test]
fn deconstruct_reported_without_deconstruction_syntax() {
    let findings = run(&[(
        "Point.cs",
        r#"
internal class Point
{
    public void Deconstruct(out int x, out int y) { x = 0; y = 0; }
}
public class Api { public object K() { return new Point(); } }
"#,
    )]);

    assert!(reported(&findings, "Deconstruct"), "findings: {findings:?}");
}

#[test]
fn deconstruct_exempted_when_deconstruction_exists() {
    let findings = run(&[(
        "Point.cs",
        r#"
internal class Point
{
    public void Deconstruct(out int x, out int y) { x = 0; y = 0; }
}
public class Api
{
    public int K()
    {
        var p = new Point();
        int x;
        int y;
        (x, y) = p;
        return x + y;
    }
}
"#,
    )]);

    assert!(!reported(&findings, "Deconstruct"), "findings: {findings:?}");
}

#[test]
fn collection_add_exempted_by_collection_initializer() {
    let findings = run(&[(
        "Bag.cs",
        r#"
internal class Bag
{
    public void Add(int item) { }
}
public class Api
{
    public object K() { return new Bag { 1, 2, 3 }; }
}
"#,
    )]);

    assert!(!reported(&findings, "Add"), "findings: {findings:?}");
}

#[test]
fn used_operator_exempted_unused_operator_reported() {
    let findings = run(&[(
        "Money.cs",
        r#"
internal struct Money
{
    public Money(int cents) { }
    public static Money operator +(Money a, Money b) { return new Money(0); }
    public static Money operator -(Money a, Money b) { return new Money(0); }
}
public class Api
{
    public Money Total()
    {
        var a = new Money(1);
        var b = new Money(2);
        return a + b;
    }
}
"#,
    )]);

    assert!(!reported(&findings, "operator +"), "findings: {findings:?}");
    assert!(reported(&findings, "operator -"), "findings: {findings:?}");
}

#[test]
fn conversion_operator_exempted_when_type_is_used() {
    let findings = run(&[(
        "Money.cs",
        r#"
internal struct Money
{
    public Money(int cents) { }
    public static implicit operator int(Money m) { return 0; }
}
public class Api
{
    public object K() { return new Money(5); }
}
"#,
    )]);

    assert!(
        !findings.iter().any(|f| f
            .declaration
            .as_ref()
            .map(|d| d.name.starts_with("implicit operator"))
            .unwrap_or(false)),
        "findings: {findings:?}"
    );
}

#[test]
fn indexer_exempted_when_element_access_exists() {
    let findings = run(&[(
        "Grid.cs",
        r#"
internal class Grid
{
    public int this[int index]
    {
        get { return 0; }
        set { }
    }
}
public class Api
{
    public int K()
    {
        var g = new Grid();
        g[0] = 1;
        return g[1];
    }
}
"#,
    )]);

    assert!(findings.is_empty(), "findings: {findings:?}");
}

// ---- interface satisfaction and overrides ----

#[test]
fn implementation_of_public_interface_is_exempt() {
    let findings = run(&[(
        "Worker.cs",
        r#"
public interface IRunner { void Run(); }
internal class Worker : IRunner
{
    public void Run() { }
}
public class Api { public object K() { return new Worker(); } }
"#,
    )]);

    assert!(!reported(&findings, "Run"), "findings: {findings:?}");
}

#[test]
fn override_of_external_base_is_exempt() {
    let findings = run(&[(
        "CustomList.cs",
        r#"
internal class CustomList : List<int>
{
    public override string ToString() { return "custom"; }
    private void Helper() { }
}
public class Api { public object K() { return new CustomList(); } }
"#,
    )]);

    assert!(!reported(&findings, "ToString"), "findings: {findings:?}");
    assert!(reported(&findings, "Helper"), "findings: {findings:?}");
}

#[test]
fn explicit_implementation_of_public_interface_is_not_a_candidate() {
    let findings = run(&[(
        "Worker.cs",
        r#"
public interface IRunner { void Run(); }
internal class Worker : IRunner
{
    void IRunner.Run() { }
}
public class Api { public object K() { return new Worker(); } }
"#,
    )]);

    assert!(!reported(&findings, "Run"), "findings: {findings:?}");
}

#[test]
fn event_subscription_counts_as_usage() {
    let findings = run(&[(
        "Events.cs",
        r#"
internal class Emitter
{
    public event Action Fired;
    private void OnFired() { }
}
public class Api
{
    public void Wire()
    {
        var e = new Emitter();
        e.Fired += Handle;
    }

    private void Handle() { }
}
"#,
    )]);

    assert!(!reported(&findings, "Fired"), "findings: {findings:?}");
    // The handler is passed as a method group
    assert!(!reported(&findings, "Handle"), "findings: {findings:?}");
    assert!(reported(&findings, "OnFired"), "findings: {findings:?}");
}

#[test]
fn constructor_chaining_counts_as_usage() {
    let findings = run(&[(
        "Chained.cs",
        r#"
internal class Widget
{
    public Widget() : this(0) { }
    private Widget(int n) { }
}
public class Api { public object K() { return new Widget(); } }
"#,
    )]);

    assert!(findings.is_empty(), "findings: {findings:?}");
}
