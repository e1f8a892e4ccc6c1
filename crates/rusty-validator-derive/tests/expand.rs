// Derive expansion cases compiled by trybuild

#[test]
fn derive_pass_cases() {
    let t = trybuild::TestCases::new();
    t.pass("tests/expand/basic.rs");
    t.pass("tests/expand/generic.rs");
    t.pass("tests/expand/keyed_tags.rs");
}
