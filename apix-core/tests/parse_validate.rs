use apix_core::types::{ParamSource, TypeExpr};
use apix_core::{lint_document, parse_document_str, validate_document, DocumentFormat};

fn minimal_valid_yaml() -> &'static str {
    r#"
version: 1.0.0
baseUrl: /api/
types:
  - name: TestType
    members:
      name: {type: string, required: true}
      age: {type: integer}
      tags: {type: [string], maxLength: 4}
apis:
  - url: /grpc/test
    method: post
    params:
      body:
        name: {type: string, required: true, minLength: 2}
        age: {type: integer}
    forwards:
      - name: user
        service: my-service
        grpc:
          method: GetUser
          paramMapper:
            name: name
        test: {name: wang, $gt: {age: 10}}
        onfail: reject
    returns:
      "200": {type: json, data: TestType}
  - url: /redis/test
    params:
      header:
        token: {type: string, required: true}
    forwards:
      - name: session
        service: redis
        redis: {key: "token|pl.%s"}
    returns:
      "200": {data: TestType}
"#
}

fn messages(input: &str) -> Vec<String> {
    let parsed = parse_document_str(input, DocumentFormat::Auto).unwrap();
    validate_document(&parsed.document)
        .unwrap_err()
        .violations
        .into_iter()
        .map(|v| format!("{}: {}", v.path, v.message))
        .collect()
}

#[test]
fn parse_yaml_and_validate_ok() {
    let parsed = parse_document_str(minimal_valid_yaml(), DocumentFormat::Yaml).unwrap();
    validate_document(&parsed.document).unwrap();

    let doc = parsed.document;
    assert_eq!(doc.types[0].members.keys().collect::<Vec<_>>(), vec!["name", "age", "tags"]);
    assert_eq!(doc.types[0].members["tags"].ty, TypeExpr::array_of("string"));
    assert_eq!(doc.apis[1].http_method().unwrap().as_str(), "GET");
    assert!(doc.apis[1].params.contains_key(&ParamSource::Header));
}

#[test]
fn parse_auto_detects_yaml() {
    let parsed = parse_document_str(minimal_valid_yaml(), DocumentFormat::Auto).unwrap();
    assert_eq!(parsed.format, DocumentFormat::Yaml);
}

#[test]
fn parse_auto_detects_json() {
    let json = r#"{
  "version": "1.0.0",
  "baseUrl": "/api",
  "apis": [
    {
      "url": "/ping",
      "params": { "queries": { "q": { "type": "string" } } },
      "forwards": [
        { "name": "echo", "service": "echo", "grpc": { "method": "Ping", "paramMapper": { "q": "q" } } }
      ],
      "returns": { "200": { "type": "nocontent" } }
    }
  ]
}"#;
    let parsed = parse_document_str(json, DocumentFormat::Auto).unwrap();
    assert_eq!(parsed.format, DocumentFormat::Json);
    validate_document(&parsed.document).unwrap();
}

#[test]
fn empty_input_is_a_parse_error() {
    assert!(parse_document_str("   ", DocumentFormat::Auto).is_err());
}

#[test]
fn schema_errors_are_all_reported() {
    let doc = r#"
version: 1.0.0
baseUrl: /api/
types:
  - name: User
    members:
      name: {type: string}
  - name: User
    members:
      id: {type: integer}
  - members:
      id: {type: integer}
apis:
  - url: /a
    method: fetch
    returns:
      "200": {type: stream}
"#;
    let msgs = messages(doc);
    assert!(msgs.contains(&"$.types[1].name: duplicate type name".to_string()), "{msgs:?}");
    assert!(msgs.contains(&"$.types[2].name: is required".to_string()), "{msgs:?}");
    assert!(msgs.contains(&"$.apis[0].method: invalid method 'fetch'".to_string()), "{msgs:?}");
    assert!(
        msgs.contains(&"$.apis[0].returns.200.type: unsupported return type 'stream'".to_string()),
        "{msgs:?}"
    );
}

#[test]
fn member_types_must_resolve() {
    let doc = r#"
version: 1.0.0
baseUrl: /
types:
  - name: Box
    members:
      inner: {type: Missing}
      grid: {type: [[integer]]}
      count: {type: integer, minLength: 1}
apis:
  - url: /a
    returns:
      "200": {data: Box}
"#;
    let msgs = messages(doc);
    assert!(msgs.contains(&"$.types[0].members.inner.type: unknown type 'Missing'".to_string()), "{msgs:?}");
    assert!(msgs.contains(&"$.types[0].members.grid.type: nested arrays are not supported".to_string()), "{msgs:?}");
    assert!(
        msgs.contains(&"$.types[0].members.count: length constraints only apply to strings and arrays".to_string()),
        "{msgs:?}"
    );
}

#[test]
fn forward_rules_report_unknown_deps_and_references() {
    let doc = r#"
version: 1.0.0
baseUrl: /
apis:
  - url: /a
    params:
      body:
        id: {type: integer}
    forwards:
      - name: first
        service: svc
        grpc:
          method: M
          paramMapper:
            x: other.id
            y: nope
        deps: [ghost]
      - name: first
        service: svc
        redis: {key: id, type: list}
    returns:
      "200": {type: nocontent}
"#;
    let msgs = messages(doc);
    assert!(msgs.contains(&"$.apis[0].forwards[0].deps: unknown dependency 'ghost'".to_string()), "{msgs:?}");
    assert!(
        msgs.contains(
            &"$.apis[0].forwards[0].grpc.paramMapper.x: references forward 'other' which is not listed in deps"
                .to_string()
        ),
        "{msgs:?}"
    );
    assert!(
        msgs.contains(&"$.apis[0].forwards[0].grpc.paramMapper.y: references undeclared parameter 'nope'".to_string()),
        "{msgs:?}"
    );
    assert!(
        msgs.contains(&"$.apis[0].forwards[1].name: must be unique within the forward chain".to_string()),
        "{msgs:?}"
    );
    assert!(msgs.contains(&"$.apis[0].forwards[1].redis.type: must be 'string' or 'hash'".to_string()), "{msgs:?}");
}

#[test]
fn cyclic_forward_chain_is_rejected_at_load() {
    let doc = r#"
version: 1.0.0
baseUrl: /
apis:
  - url: /a
    forwards:
      - name: a
        service: svc
        grpc: {method: M}
        deps: [b]
      - name: b
        service: svc
        grpc: {method: M}
        deps: [a]
    returns:
      "204": {type: nocontent}
"#;
    let msgs = messages(doc);
    assert!(
        msgs.contains(&"$.apis[0].forwards: cyclic dependency among forwards: a, b".to_string()),
        "{msgs:?}"
    );
}

#[test]
fn lint_flags_member_names_shared_across_groups() {
    let doc = r#"
version: 1.0.0
baseUrl: /
apis:
  - url: /a
    method: post
    params:
      header:
        id: {type: string}
      body:
        id: {type: integer}
    returns:
      "204": {type: nocontent}
"#;
    let parsed = parse_document_str(doc, DocumentFormat::Yaml).unwrap();
    validate_document(&parsed.document).unwrap();
    let warnings = lint_document(&parsed.document);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].path, "$.apis[0].params.body.id");
}

#[test]
fn load_document_parses_and_validates() {
    let doc = apix_core::load_document(minimal_valid_yaml()).unwrap();
    assert_eq!(doc.apis.len(), 2);

    let err = apix_core::load_document("version: 1.0.0\nbaseUrl: /\napis: []\n").unwrap_err();
    assert!(matches!(err, apix_core::ApixError::Validation(_)));
}
