//! End-to-end tests for lex → parse → validate → print.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;

use udmf::parser::ParseErrorKind;
use udmf::schema::RegistryBuilder;
use udmf::{
    parse, parse_with, print, print_with, tokenize, validate, validate_with, CancelSource,
    DiagnosticCode, Document, ParseOptions, PrintOptions, SchemaRegistry, Severity, UdmfError,
    ValidationOptions, Value,
};

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read_to_string(path).unwrap()
}

fn ringracers() -> SchemaRegistry {
    SchemaRegistry::builtin("ringracers").unwrap()
}

fn sources() -> Vec<String> {
    vec![
        fixture("ringracers.textmap"),
        "namespace = \"ringracers\"; linedef { id = 0; v1 = 0; v2 = 1; special = 0; }".to_string(),
        "namespace = \"srb2\";".to_string(),
        "namespace = \"zdoom\"; thing { x = -0.0; y = 1e-9; z = 123456789.125; comment = \"tab\\there\"; }".to_string(),
        "NAMESPACE = \"Doom\"; Vertex { X = 0x7FFFFFFFFFFFFFFF; Y = -9223372036854775808; } sector { }".to_string(),
    ]
}

#[test]
fn test_end_to_end_linedef() {
    let source = "namespace = \"ringracers\"; linedef { id = 0; v1 = 0; v2 = 1; special = 0; }";
    let parsed = parse(source).unwrap();
    let (document, diagnostics) = validate(&parsed.document, &ringracers());

    assert_eq!(document.blocks.len(), 1);
    assert!(!diagnostics.has_errors());
    assert_eq!(diagnostics.info_count(), 2);
    assert!(diagnostics.iter().all(|d| d.severity == Severity::Info));

    let text = print(&document).unwrap();
    assert!(text.starts_with("namespace = \"ringracers\";"));
    insta::assert_snapshot!(text, @r#"
namespace = "ringracers";

linedef
{
  id = 0;
  v1 = 0;
  v2 = 1;
  sideback = -1;
  special = 0;
  twosided = false;
}
"#);
}

#[test]
fn test_fixture_canonical_output() {
    let parsed = parse(&fixture("ringracers.textmap")).unwrap();
    let (document, diagnostics) = validate(&parsed.document, &ringracers());

    assert_eq!(
        diagnostics.codes(),
        vec![
            DiagnosticCode::DefaultInjected,
            DiagnosticCode::DefaultInjected,
            DiagnosticCode::UnknownField,
        ]
    );

    insta::assert_snapshot!(print(&document).unwrap(), @r#"
namespace = "ringracers";
version = 2;

vertex
{
  x = 0.0;
  y = 0.0;
}

vertex
{
  x = 256.0;
  y = 0.0;
}

vertex
{
  x = 256;
  y = -128.5;
}

vertex
{
  x = 64;
  y = 150.0;
}

linedef
{
  id = 0;
  v1 = 0;
  v2 = 1;
  sidefront = 0;
  sideback = -1;
  special = 0;
  twosided = false;
  blocking = true;
}

linedef
{
  id = 1;
  v1 = 1;
  v2 = 2;
  sidefront = 1;
  sideback = -1;
  special = 500;
  arg0 = 12;
  twosided = false;
}

sidedef
{
  texturemiddle = "GFZROCK";
  sector = 0;
}

sidedef
{
  offsetx = 16;
  sector = 0;
}

sector
{
  heightfloor = 0;
  heightceiling = 256;
  texturefloor = "GFZFLR01";
  textureceiling = "F_SKY1";
  lightlevel = 255;
  comment = "start area";
}

thing
{
  x = 128.0;
  y = 64.0;
  angle = 90;
  type = 1;
  arg0 = 3;
  stringarg0 = "spawn \"A\"";
}
"#);
}

#[test]
fn test_override_layer_from_file() {
    let layer = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/override.yaml");
    let mut builder = RegistryBuilder::new();
    builder.add_builtin("ringracers").unwrap();
    builder.add_file(&layer).unwrap();
    let registry = builder.build().unwrap();

    let parsed = parse(&fixture("ringracers.textmap")).unwrap();
    let (_, diagnostics) = validate(&parsed.document, &registry);

    assert_eq!(
        diagnostics.codes(),
        vec![DiagnosticCode::DefaultInjected, DiagnosticCode::DefaultInjected]
    );
}

#[test]
fn test_round_trip() {
    for source in sources() {
        let document = parse(&source).unwrap().document;
        let reparsed = parse(&print(&document).unwrap()).unwrap().document;
        assert_eq!(reparsed, document, "round trip of {:?}", source);
    }
}

#[test]
fn test_round_trip_after_validation() {
    let registry = ringracers();
    for source in sources() {
        let document = parse(&source).unwrap().document;
        let (validated, _) = validate(&document, &registry);
        let reparsed = parse(&print(&validated).unwrap()).unwrap().document;
        assert_eq!(&reparsed, validated.document());
    }
}

#[test]
fn test_print_is_idempotent() {
    for source in sources() {
        let first = print(&parse(&source).unwrap().document).unwrap();
        let second = print(&parse(&first).unwrap().document).unwrap();
        assert_eq!(second, first);
    }
}

#[test]
fn test_permissive_partial_document_round_trips() {
    let source = "namespace = \"ringracers\";\nlinedef { id = ; v1 = 0; }\nvertex { x = 1.0 }\nsector { lightlevel = 200; }";
    let output = parse_with(source, &ParseOptions::permissive()).unwrap();
    assert_eq!(output.diagnostics.len(), 2);

    let reparsed = parse(&print(&output.document).unwrap()).unwrap().document;
    assert_eq!(reparsed, output.document);
}

#[test]
fn test_default_injection() {
    let source =
        "namespace = \"ringracers\"; sector { texturefloor = \"A\"; textureceiling = \"B\"; }";
    let document = parse(source).unwrap().document;
    let (validated, diagnostics) = validate(&document, &ringracers());

    assert_eq!(diagnostics.error_count(), 0);
    assert_eq!(diagnostics.info_count(), 3);
    let sector = &validated.blocks[0];
    assert_eq!(sector.get("heightfloor"), Some(&Value::Integer(0)));
    assert_eq!(sector.get("lightlevel"), Some(&Value::Integer(160)));
}

#[test]
fn test_opt_out_transparency() {
    let source = "namespace = \"ringracers\";\nthing { x = 0.0; y = 0.0; type = 1; flip = true; }\nvertex { x = 0.0; y = 0.0; flip = true; }";
    let document = parse(source).unwrap().document;
    let (validated, diagnostics) = validate(&document, &ringracers());

    assert_eq!(validated.blocks[0].get("flip"), Some(&Value::Boolean(true)));
    assert_eq!(validated.blocks[1].get("flip"), Some(&Value::Boolean(true)));

    assert_eq!(diagnostics.len(), 1);
    let warning = diagnostics.iter().next().unwrap();
    assert_eq!(warning.code, DiagnosticCode::UnknownField);
    assert_eq!(warning.severity, Severity::Warning);
    assert_eq!(&source[warning.span.start.offset..warning.span.end.offset], "flip = true;");
    assert_eq!((warning.span.line(), warning.span.column()), (3, 28));
}

#[test]
fn test_duplicate_key_policy() {
    let source = "namespace = \"ringracers\"; linedef { id = 0; id = 1; }";
    let document = parse(source).unwrap().document;
    let registry = ringracers();

    let (strict, diagnostics) = validate(&document, &registry);
    let duplicates: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.code == DiagnosticCode::DuplicateField)
        .collect();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].severity, Severity::Error);
    assert_eq!(duplicates[0].related, Some(document.blocks[0].fields[0].span));
    assert_eq!(duplicates[0].span, document.blocks[0].fields[1].span);
    assert_eq!(strict.blocks[0].get("id"), Some(&Value::Integer(0)));

    let (permissive, diagnostics) =
        validate_with(&document, &registry, &ValidationOptions::permissive()).unwrap();
    assert!(diagnostics.iter().all(|d| d.code != DiagnosticCode::DuplicateField));
    assert_eq!(permissive.blocks[0].get("id"), Some(&Value::Integer(1)));
}

#[test]
fn test_missing_value_error() {
    let source = "linedef { id = ; }";
    let error = match parse_with(source, &ParseOptions::permissive()) {
        Ok(output) => output
            .diagnostics
            .into_iter()
            .find(|d| d.kind == ParseErrorKind::MissingValue)
            .unwrap(),
        Err(other) => panic!("unexpected failure {:?}", other),
    };

    assert_eq!(error.kind.code(), "MissingValue");
    assert_eq!(error.span.start.offset, source.find(';').unwrap());
    assert_eq!(error.span.end.offset, source.find(';').unwrap() + 1);
}

#[test]
fn test_concurrent_pipelines_share_registry() {
    let registry = Arc::new(ringracers());
    let source = Arc::new(fixture("ringracers.textmap"));
    let expected = {
        let (doc, _) = validate(&parse(&source).unwrap().document, &registry);
        print(&doc).unwrap()
    };

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let source = Arc::clone(&source);
            thread::spawn(move || {
                let parsed = parse(&source).unwrap();
                let (doc, _) = validate(&parsed.document, &registry);
                print(&doc).unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn test_every_stage_honours_cancellation() {
    let cancel = CancelSource::new();
    cancel.cancel();
    let source = fixture("ringracers.textmap");
    let document = parse(&source).unwrap().document;

    assert!(matches!(tokenize(&source, Some(&cancel.token())), Err(UdmfError::Cancelled)));
    assert!(matches!(
        parse_with(&source, &ParseOptions::permissive().with_cancel(cancel.token())),
        Err(UdmfError::Cancelled)
    ));
    assert!(matches!(
        validate_with(
            &document,
            &ringracers(),
            &ValidationOptions::default().with_cancel(cancel.token())
        ),
        Err(UdmfError::Cancelled)
    ));
    assert!(matches!(
        print_with(&document, &PrintOptions { cancel: Some(cancel.token()) }),
        Err(UdmfError::Cancelled)
    ));
}

#[test]
fn test_functional_edits_leave_original() {
    let document = parse("namespace = \"ringracers\"; vertex { x = 0.0; y = 0.0; }")
        .unwrap()
        .document;
    let (id, _) = document.blocks_of_kind("vertex").next().unwrap();

    let moved = document.with_field(id, "x", 32.0);
    let removed: Document = moved.without_block(id);

    assert_eq!(document.blocks[0].get("x"), Some(&Value::Float(0.0)));
    assert_eq!(moved.blocks[0].get("x"), Some(&Value::Float(32.0)));
    assert!(removed.is_empty());
}
