use amdjs_core::{LoaderConfig, MemorySource, ModuleContainer, Renderer, ScriptValue, Transformer};
use indoc::indoc;
use std::rc::Rc;

fn container() -> ModuleContainer {
    ModuleContainer::new(LoaderConfig::default(), MemorySource::new()).unwrap()
}

fn transformer() -> (ModuleContainer, Rc<Transformer>) {
    let mut container = container();
    let transformer = container.require_as::<Transformer>("JSXTransformer").unwrap();
    (container, transformer)
}

fn transform(source: &str) -> String {
    let (_container, transformer) = transformer();
    transformer.transform(source).unwrap().code
}

/// Evaluates `script` with the rendering library in scope as `React`
fn build(container: &mut ModuleContainer, script: &str) -> ScriptValue {
    let transformer = container.require_as::<Transformer>("JSXTransformer").unwrap();
    transformer.exec(script).unwrap()
}

#[test]
fn test_transform_self_closing_element() {
    insta::assert_snapshot!(transform("<br />"), @r#"React.createElement("br", null)"#);
}

#[test]
fn test_transform_attributes_and_entities() {
    let code = transform(
        r#"var el = <Nav.Item active href="/home" title='Home &amp; away'>Fish &amp; chips {label}</Nav.Item>;"#,
    );
    insta::assert_snapshot!(code, @r#"var el = React.createElement(Nav.Item, {active: true, href: "/home", title: "Home & away"}, "Fish & chips ", label);"#);
}

#[test]
fn test_transform_spread_attributes() {
    insta::assert_snapshot!(
        transform(r#"var el = <div {...props} id="x" />;"#),
        @r#"var el = React.createElement("div", React.__spread({}, props, {id: "x"}));"#
    );
}

#[test]
fn test_transform_nested_elements_in_expressions() {
    let code = transform(
        "var list = <ul>{items.map(function (item) { return <li key={item.id}>{item.name}</li>; })}</ul>;",
    );
    insta::assert_snapshot!(code, @r#"var list = React.createElement("ul", null, items.map(function (item) { return React.createElement("li", {key: item.id}, item.name); }));"#);
}

#[test]
fn test_transform_multiline_text() {
    let code = transform(indoc! {"
        var el = <p>
          first line
          second line
        </p>;"});
    insta::assert_snapshot!(code, @r#"var el = React.createElement("p", null, "first line second line");"#);
}

#[test]
fn test_transform_leaves_comparisons_and_literals_alone() {
    insta::assert_snapshot!(
        transform(r#"var a = x < y, b = <span data-id="1" aria-label={"l"}>{/* comment */}</span>;"#),
        @r#"var a = x < y, b = React.createElement("span", {"data-id": "1", "aria-label": "l"});"#
    );

    let untouched = r#"var s = "<div>"; var r = /<a>/g; var t = `<b>${1}</b>`;"#;
    assert_eq!(transform(untouched), untouched);
}

#[test]
fn test_transform_keeps_line_structure() {
    let source = indoc! {r#"
        define(["react"], function (React) {
          return React.createClass({
            render: function () {
              return <div>Component content</div>;
            }
          });
        });
    "#};
    insta::assert_snapshot!(transform(source), @r#"
    define(["react"], function (React) {
      return React.createClass({
        render: function () {
          return React.createElement("div", null, "Component content");
        }
      });
    });
    "#);
}

#[test]
fn test_transform_errors() {
    let (_container, transformer) = transformer();
    for (source, message) in [
        ("<div>", "Parse Error: Line 1: Expected corresponding JSX closing tag for div"),
        ("<a></b>", "Parse Error: Line 1: Expected corresponding JSX closing tag for a"),
        (
            "var x = <div attr=>;",
            "Parse Error: Line 1: JSX value should be either an expression or a quoted JSX text",
        ),
    ] {
        let err = transformer.transform(source).unwrap_err();
        assert_eq!(err.to_string(), message, "{source}");
    }
}

#[test]
fn test_exec_evaluates_transformed_source() {
    let mut container = container();
    let value = build(&mut container, "var n = <b>{1 + 1}</b>; n.props.children");
    assert_eq!(value.as_number(), Some(2.0));
}

#[test]
fn test_static_markup_escapes_and_styles() {
    let mut container = container();
    let element = build(
        &mut container,
        r#"<div className="a" style={{fontSize: 12, backgroundColor: 'red'}}>{'x < y & "z"'}</div>"#,
    );
    let react = container.require_as::<Renderer>("react").unwrap();
    assert_eq!(
        react.render_to_static_markup(&element).unwrap(),
        r#"<div class="a" style="font-size:12px;background-color:red;">x &lt; y &amp; &quot;z&quot;</div>"#
    );
}

#[test]
fn test_static_markup_void_and_boolean_attributes() {
    let mut container = container();
    let element = build(
        &mut container,
        r#"<p>line<br /><input type="checkbox" checked disabled={false} /></p>"#,
    );
    let react = container.require_as::<Renderer>("react").unwrap();
    assert_eq!(
        react.render_to_static_markup(&element).unwrap(),
        r#"<p>line<br/><input type="checkbox" checked=""/></p>"#
    );
}

#[test]
fn test_create_class_lifecycle() {
    let mut container = container();
    let counter = build(
        &mut container,
        indoc! {"
            React.createClass({
              getInitialState: function () { return {count: this.props.start}; },
              componentWillMount: function () { this.setState({count: this.state.count + 1}); },
              render: function () { return <span>count: {this.state.count}</span>; }
            })
        "},
    );
    let react = container.require_as::<Renderer>("react").unwrap();
    let element = react
        .create_element(&counter, Some(serde_json::json!({"start": 41})), vec![])
        .unwrap();
    assert_eq!(
        react.render_to_static_markup(&element).unwrap(),
        "<span>count: 42</span>"
    );
}

#[test]
fn test_create_element_from_rust() {
    let mut container = container();
    let react = container.require_as::<Renderer>("react").unwrap();
    let first = react
        .create_element("li", Some(serde_json::json!({"key": "a"})), vec!["a".into()])
        .unwrap();
    let second = react
        .create_element("li", Some(serde_json::json!({"key": "b"})), vec!["b".into()])
        .unwrap();
    let pair = build(&mut container, "(function (a, b) { return [a, b]; })");
    let items = pair.call(vec![first.into(), second.into()]).unwrap();
    let element = react.create_element("ul", None, vec![items.into()]).unwrap();

    assert_eq!(
        react.render_to_static_markup(&element).unwrap(),
        "<ul><li>a</li><li>b</li></ul>"
    );
    assert_eq!(
        react.render_to_string(&element).unwrap(),
        "<ul data-reactid=\".0\" data-react-checksum=\"-142664816\"><li data-reactid=\".0.$a\">a</li>\
         <li data-reactid=\".0.$b\">b</li></ul>"
    );
}

#[test]
fn test_render_to_string_wraps_text_siblings() {
    let mut container = container();
    let react = container.require_as::<Renderer>("react").unwrap();
    let element = react
        .create_element("p", None, vec!["one".into(), "two".into()])
        .unwrap();
    assert_eq!(
        react.render_to_string(&element).unwrap(),
        "<p data-reactid=\".0\" data-react-checksum=\"174006097\"><span data-reactid=\".0.0\">one</span>\
         <span data-reactid=\".0.1\">two</span></p>"
    );
}

#[test]
fn test_create_class_from_rust() {
    let mut container = container();
    let spec = build(
        &mut container,
        "({ displayName: 'Emphasis', render: function () { return <em>{this.props.text}</em>; } })",
    );
    let react = container.require_as::<Renderer>("react").unwrap();
    let class = react.create_class(&spec).unwrap();
    assert!(class.is_callable());

    let element = react
        .create_element(&class, Some(serde_json::json!({"text": "hi"})), vec![])
        .unwrap();
    assert_eq!(react.render_to_static_markup(&element).unwrap(), "<em>hi</em>");
}
