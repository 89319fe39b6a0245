//! Schema pile integration tests
//!
//! Piles are built from the catalogs and schemas under `tests/data`.

use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use url::Url;
use xsdpile::{Architecture, Kind, NamespaceKinds, PrefixMap, SchemaPile, SchemaPileBuilder, UtilityKind};

const GOOD: &str = "http://example.com/goodXsTest/";
const IMPORTED_A: &str = "http://example.com/importedA/";
const IMPORTED_B: &str = "http://example.com/importedB/";
const EXTENSION: &str = "http://example.com/extension/";

fn data_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("data");
    path
}

fn data_path(relative: &str) -> String {
    data_dir().join(relative).to_string_lossy().to_string()
}

fn data_uri(relative: &str) -> String {
    let canonical = fs::canonicalize(data_dir().join(relative)).unwrap();
    Url::from_file_path(canonical).unwrap().to_string()
}

fn dir_uri(relative: &str) -> String {
    let canonical = fs::canonicalize(data_dir().join(relative)).unwrap();
    Url::from_directory_path(canonical).unwrap().to_string()
}

fn build_err(args: &[&str]) -> String {
    SchemaPile::from_args(args).unwrap_err().to_string()
}

// ============================================================================
// Successful builds
// ============================================================================

#[test]
fn test_catalog_and_namespace() {
    let cat1 = data_path("cat1.xml");
    let pile = SchemaPile::from_args(&[cat1.as_str(), GOOD]).unwrap();

    assert_eq!(pile.pile_root(), Some(dir_uri("").as_str()));
    assert_eq!(pile.initial_catalogs(), [data_uri("cat1.xml")]);
    assert_eq!(pile.initial_namespaces(), [GOOD.to_string()]);
    assert_eq!(pile.initial_schema_docs(), [data_uri("good/goodXsTest.xsd")]);

    assert_eq!(pile.schema_namespaces(), vec![GOOD, IMPORTED_A, IMPORTED_B]);
    assert_eq!(pile.schema_document(GOOD).unwrap().uri(), data_uri("good/goodXsTest.xsd"));
    assert_eq!(pile.schema_document(IMPORTED_A).unwrap().uri(), data_uri("imported/a.xsd"));
    // importedB has no catalog entry; its absolute hint goes through rewriteSystem
    assert_eq!(pile.schema_document(IMPORTED_B).unwrap().uri(), data_uri("imported/b.xsd"));

    let included: Vec<&str> = pile.included_documents().map(|d| d.uri()).collect();
    assert_eq!(included, vec![data_uri("good/goodXsTest-part.xsd")]);

    assert!(pile.messages().is_empty(), "{:?}", pile.messages());
    assert!(pile.validator_messages().is_empty(), "{:?}", pile.validator_messages());
}

#[test]
fn test_single_schema_file() {
    let single = data_path("standalone/single.xsd");
    let pile = SchemaPile::from_args(&[single]).unwrap();
    assert_eq!(pile.schema_namespaces(), vec!["http://example.com/single/"]);
    assert_eq!(pile.pile_root(), Some(dir_uri("standalone").as_str()));
    assert!(pile.initial_catalogs().is_empty());
    assert!(pile.resolver().all_catalogs().is_empty());
}

#[test]
fn test_schema_file_as_file_uri() {
    let pile = SchemaPile::from_args(&[data_uri("standalone/single.xsd")]).unwrap();
    assert_eq!(pile.schema_namespaces(), vec!["http://example.com/single/"]);
}

#[test]
fn test_transitive_problems_are_diagnostics() {
    let cat1 = data_path("cat1.xml");
    let pile = SchemaPile::from_args(&[cat1.as_str(), EXTENSION]).unwrap();

    assert_eq!(pile.schema_namespaces(), vec![EXTENSION, GOOD, IMPORTED_A, IMPORTED_B]);

    let messages = pile.messages();
    assert_eq!(messages.len(), 3, "{:?}", messages);
    assert!(messages[0].contains("http://example.com/remote-resource/"));
    assert!(messages[0].contains("not a local URI"));
    assert!(messages[1].contains("cannot find the file"));
    assert!(messages[2].contains("Can't resolve imported namespace urn:example:unmapped"));

    assert_eq!(pile.validator_messages().len(), 3);
    assert!(pile.validator_messages().iter().all(|m| m.contains("has no schema document")));
}

#[test]
fn test_bad_catalog_chain_still_builds() {
    let catalog = data_path("bad-catalog/catalog.xml");
    let pile = SchemaPile::from_args(&[catalog.as_str(), "http://example.com/single/"]).unwrap();
    assert_eq!(pile.schema_namespaces(), vec!["http://example.com/single/"]);
    assert_eq!(pile.messages().len(), 2);
    assert_eq!(pile.pile_root(), Some(dir_uri("bad-catalog").as_str()));
}

#[test]
fn test_build_is_deterministic() {
    let cat1 = data_path("cat1.xml");
    let args = [cat1.as_str(), EXTENSION];
    let first = SchemaPile::from_args(&args).unwrap();
    let second = SchemaPile::from_args(&args).unwrap();
    assert_eq!(first.schema_namespaces(), second.schema_namespaces());
    assert_eq!(first.messages(), second.messages());
    assert_eq!(first.validator_messages(), second.validator_messages());
    assert_eq!(first.resolver().all_resolutions(), second.resolver().all_resolutions());
}

// ============================================================================
// Fatal errors on initial inputs
// ============================================================================

#[test]
fn test_remote_namespace_argument() {
    let err = build_err(&[&data_path("cat1.xml"), "http://example.com/remote-resource/"]);
    assert!(err.contains("not a local URI"), "{}", err);
}

#[test]
fn test_wrong_target_namespace() {
    let err = build_err(&[&data_path("cat1.xml"), "http://example.com/wrongNamespace/"]);
    assert!(err.contains("wrong target namespace"), "{}", err);
    assert!(err.contains("http://example.com/somethingElse/"), "{}", err);
}

#[test]
fn test_unmapped_namespace_argument() {
    let err = build_err(&[&data_path("cat1.xml"), "urn:example:unmapped"]);
    assert!(err.contains("Can't resolve"), "{}", err);
}

#[test]
fn test_namespace_argument_needs_a_catalog() {
    let err = build_err(&[GOOD]);
    assert!(err.contains("Can't resolve"), "{}", err);
}

#[test]
fn test_mapped_file_missing() {
    let err = build_err(&[&data_path("cat1.xml"), "http://example.com/missingFile/"]);
    assert!(err.contains("cannot find the file"), "{}", err);
}

#[test]
fn test_mapped_file_not_a_schema() {
    let err = build_err(&[&data_path("cat1.xml"), "http://example.com/notSchema/"]);
    assert!(err.contains("not a schema document"), "{}", err);
}

#[test]
fn test_file_argument_not_schema_or_catalog() {
    let err = build_err(&[&data_path("standalone/not-schema.xml")]);
    assert!(err.contains("not a schema document or XML catalog"), "{}", err);
}

#[test]
fn test_file_argument_missing() {
    let err = build_err(&[&data_path("standalone/absent.xsd")]);
    assert!(err.contains("cannot find the file"), "{}", err);
}

#[test]
fn test_file_uri_with_hostname() {
    let err = build_err(&["file://example.com/schemas/a.xsd"]);
    assert!(err.contains("A hostname is not allowed"), "{}", err);
}

// ============================================================================
// Classification and prefixes
// ============================================================================

#[test]
fn test_classify_registers_conformant_extensions() {
    let pile = SchemaPile::from_args(&[data_path("cat1.xml").as_str(), EXTENSION]).unwrap();
    let mut kinds = NamespaceKinds::new();
    kinds.set(GOOD, Architecture::Niem5, Kind::Domain, UtilityKind::NotUtility, "5.0");

    let registered = pile.classify(&mut kinds);
    assert_eq!(registered, vec![EXTENSION.to_string()]);
    assert_eq!(kinds.kind(EXTENSION), Kind::Extension);
    assert_eq!(kinds.architecture(EXTENSION), Architecture::Niem6);
    assert_eq!(kinds.version(EXTENSION), "6.0");
    // explicit records are left alone
    assert_eq!(kinds.kind(GOOD), Kind::Domain);
    assert_eq!(kinds.kind(IMPORTED_A), Kind::Unrecognized);
}

#[test]
fn test_assign_prefixes() {
    let pile = SchemaPile::from_args(&[data_path("cat1.xml").as_str(), GOOD]).unwrap();
    let mut prefixes = PrefixMap::new();
    let assigned = pile.assign_prefixes(&mut prefixes);
    assert_eq!(
        assigned,
        vec![
            (GOOD.to_string(), "good".to_string()),
            (IMPORTED_A.to_string(), "ia".to_string()),
            (IMPORTED_B.to_string(), "ib".to_string()),
        ]
    );
    assert_eq!(prefixes.get_uri("ia"), Some(IMPORTED_A));
    // a second pass changes nothing
    assert_eq!(pile.assign_prefixes(&mut prefixes), assigned);
}

#[test]
fn test_report_json() {
    let pile = SchemaPileBuilder::new()
        .build(&[data_path("cat1.xml").as_str(), EXTENSION])
        .unwrap();
    let mut kinds = NamespaceKinds::new();
    pile.classify(&mut kinds);

    let report = pile.to_report(&kinds);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["pileRoot"], dir_uri(""));
    assert_eq!(json["catalogs"].as_array().unwrap().len(), 3);
    assert_eq!(json["namespaces"][0]["uri"], EXTENSION);
    assert_eq!(json["namespaces"][0]["kind"], "EXTENSION");
    assert_eq!(json["namespaces"][0]["architecture"], "NIEM6");
    assert_eq!(json["messages"].as_array().unwrap().len(), 3);
    assert_eq!(json["resolutions"]["urn:example:unmapped"], "NO MAP");
}
