//! End-to-end scenarios, driven through the public `run_source` entry
//! point, asserting on the program's captured output and final outcome.

use flux::{CollectingIo, NoLimitTracker, RunOutcome, Source, Value, run_source};
use pretty_assertions::assert_eq;

fn run(src: &str) -> (RunOutcome, String) {
    let source = Source::new("scenario.fx", src);
    let mut io = CollectingIo::new();
    let mut input = CollectingIo::new();
    let tracker = NoLimitTracker::default();
    let (outcome, errors) = run_source(&source, &mut io, &mut input, &tracker);
    assert!(errors.diagnostics().iter().all(|d| d.severity < flux::Severity::Error), "unexpected compile errors: {:?}", errors.diagnostics());
    (outcome.expect("program compiled").expect("no internal abort"), io.output())
}

#[test]
fn hello_world_prints_and_returns_zero() {
    let (outcome, output) = run(r#"def main()->int{ print("hi"); return 0; };"#);
    assert_eq!(output, "hi\n");
    assert!(matches!(outcome, RunOutcome::Completed(Value::Int { value: 0, .. })));
}

#[test]
fn pointer_mutation_through_address_of() {
    let src = r#"def main()->int{ int x=10; int* p=@x; *p += 5; print(i"{}":{x;}); return 0; };"#;
    let (outcome, output) = run(src);
    assert_eq!(output, "15\n");
    assert!(matches!(outcome, RunOutcome::Completed(Value::Int { value: 0, .. })));
}

#[test]
fn object_method_call_interpolates_argument() {
    let src = r#"
        object Greeter{
            def sayHello(string n)->string{ return i"Hello, {}!":{n;}; };
        };
        def main()->int{ print(Greeter.sayHello("Flux")); return 0; };
    "#;
    let (_outcome, output) = run(src);
    assert_eq!(output, "Hello, Flux!\n");
}

#[test]
fn division_by_zero_is_caught() {
    let src = "def main()->int{ int d=0; try{ int q=10/d; } catch(auto e){ print(\"caught\"); } return 0; };";
    let (_outcome, output) = run(src);
    assert_eq!(output, "caught\n");
}

#[test]
fn for_in_range_prints_each_bound() {
    let src = "def main()->int{ for (i in 1..5) { print(i); }; return 0; };";
    let (_outcome, output) = run(src);
    assert_eq!(output, "1\n2\n3\n4\n");
}

#[test]
fn inheritance_dispatches_through_super_and_nested_objects() {
    let src = r#"
        class Animal{
            object Actions{
                def speak()->string{ return i"My name is {} and I am {} years old.":{this.name;this.age;}; };
            };
        };
        class Dog<Animal>{
            string name;
            int age;
            object Attributes{
                def __init(string n, int a)->void{ this.name=n; this.age=a; };
            };
            object Actions<Animal.Actions>{
                def speak()->string{ return i"Woof! {}":{super.Animal.Actions.speak();}; };
            };
        };
        def main()->int{
            Dog myDog = Dog.Attributes("Buddy",5){};
            print(myDog.Actions.speak());
            return 0;
        };
    "#;
    let (_outcome, output) = run(src);
    assert_eq!(output, "Woof! My name is Buddy and I am 5 years old.\n");
}

#[test]
fn unknown_nested_object_qualifier_is_a_name_resolution_error() {
    let src = r#"
        object Greeter{
            def sayHello(string n)->string{ return i"Hello, {}!":{n;}; };
        };
        def main()->int{ print(Greeter.Bogus.sayHello("Flux")); return 0; };
    "#;
    let (outcome, _output) = run(src);
    assert!(matches!(outcome, RunOutcome::UncaughtException(_)));
}
