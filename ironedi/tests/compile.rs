use ironedi::compiler::InterchangeFlavour;
use ironedi::{Bean, CompileReport, Executor, compile_from_xml};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const DEFINITIONS: &str = r#"<edimap>
    <description name="__modelset_definitions" version="local"/>
    <delimiters segment="'" field="+" component=":" escape="?"/>
    <segments xmltag="Definitions">
        <segment segcode="NAD" xmltag="NameAndAddress" truncatable="true">
            <field xmltag="qualifier" required="true"/>
            <field xmltag="partyId"/>
            <field xmltag="name"/>
        </segment>
    </segments>
</edimap>"#;

const MANIFEST: &str = r#"
[interchange]
type = "UNEDIFACT"
version = "D03B"

[[models]]
path = "definitions.xml"

[[models]]
path = "orders.xml"

[[models]]
path = "invoic.xml"
"#;

fn message(name: &str, root: &str, code: &str) -> String {
    format!(
        r#"<edimap>
    <import resource="definitions.xml" namespace="def"/>
    <description name="{name}" version="D03B"/>
    <delimiters segment="'" field="+" component=":" escape="?"/>
    <segments xmltag="{root}">
        <segment segcode="{code}" xmltag="header">
            <field xmltag="number" required="true"/>
        </segment>
        <segment segref="def:NAD" maxOccurs="5"/>
    </segments>
</edimap>"#
    )
}

fn write_schemas(dir: &Path) {
    fs::write(dir.join("definitions.xml"), DEFINITIONS).unwrap();
    fs::write(dir.join("orders.xml"), message("ORDERS", "Order", "BGM")).unwrap();
    fs::write(dir.join("invoic.xml"), message("INVOIC", "Invoice", "INV")).unwrap();
    fs::write(dir.join("d03b.toml"), MANIFEST).unwrap();
}

fn run(schemas: &Path, out: &Path, messages: Option<&str>) -> CompileReport {
    let mut builder = Executor::builder()
        .schema("d03b.toml")
        .base_dir(schemas)
        .destination(out)
        .namespace("com.acme.d03b");
    if let Some(messages) = messages {
        builder = builder.messages(messages);
    }
    builder.build().unwrap().execute().unwrap()
}

fn files(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else {
                found.push(path.strip_prefix(root).unwrap().to_path_buf());
            }
        }
    }
    found.sort();
    found
}

#[test]
fn test_end_to_end_encode() {
    let model = compile_from_xml(
        r#"<edimap>
            <description name="PARTIES" version="1"/>
            <delimiters segment="'" field="+" component=":" escape="?"/>
            <segments xmltag="Parties">
                <segment segcode="NAD" xmltag="nameAndAddress">
                    <field xmltag="mandatory" required="true"/>
                    <field xmltag="optional" truncatable="true">
                        <component xmltag="optional1"/>
                        <component xmltag="optional2"/>
                    </field>
                </segment>
            </segments>
        </edimap>"#,
        "com.acme.parties",
    )
    .unwrap();

    let bean = Bean::new().with(
        "name_and_address",
        Bean::new()
            .with("mandatory", "MANDATORY")
            .with("optional", Bean::new().with("optional1", "OPTIONAL1")),
    );
    assert_eq!(model.encode_to_string(&bean).unwrap(), "NAD+MANDATORY+OPTIONAL1'");
}

#[test]
fn test_interchange_run() {
    let schemas = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_schemas(schemas.path());

    let report = run(schemas.path(), out.path(), None);

    let base = out.path().join("com").join("acme").join("d03b");
    assert_eq!(
        fs::read_to_string(base.join("classes.lst")).unwrap(),
        "com.acme.d03b.orders.Order\ncom.acme.d03b.invoic.Invoice\n"
    );
    assert!(base.join("common").join("types.json").is_file());
    assert!(!base.join("common").join("binding-config.json").exists());
    assert!(base.join("orders").join("binding-config.json").is_file());
    assert!(!base.join("orders").join("codec-config.json").exists());
    assert!(!base.join("orders").join("OrderFactory.json").exists());
    for file in ["message-bindings.json", "interchange-bindings.json", "D03BInterchangeFactory.json"] {
        assert!(base.join(file).is_file(), "{file} missing");
    }

    let factory = report.interchange.as_ref().unwrap();
    assert_eq!(factory.flavour(), InterchangeFlavour::UnEdifact);
    assert_eq!(
        factory.binding_path("INVOIC"),
        Some("/com/acme/d03b/invoic/binding-config.json")
    );

    let orders = factory.codec("ORDERS").unwrap();
    let bean = Bean::new()
        .with("header", Bean::new().with("number", "128576"))
        .with(
            "name_and_address",
            vec![
                Bean::new()
                    .with("qualifier", "BY")
                    .with("party_id", "5412345000176"),
                Bean::new().with("qualifier", "SU").with("name", "ACME"),
            ],
        );
    assert_eq!(
        orders.encode_to_string(&bean).unwrap(),
        "BGM+128576'NAD+BY+5412345000176'NAD+SU++ACME'"
    );
}

#[test]
fn test_shared_type_identity() {
    let schemas = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_schemas(schemas.path());

    let report = run(schemas.path(), out.path(), None);
    let party_type = |name: &str| {
        let model = report.model(name).unwrap();
        Arc::clone(
            model
                .root
                .property("name_and_address")
                .unwrap()
                .bean_type()
                .unwrap(),
        )
    };

    let orders = party_type("ORDERS");
    let invoic = party_type("INVOIC");
    assert!(Arc::ptr_eq(&orders, &invoic));
    assert_eq!(orders.fqn(), "com.acme.d03b.common.NameAndAddress");

    let definitions = report.model("__modelset_definitions").unwrap();
    assert!(definitions.types.iter().any(|t| Arc::ptr_eq(t, &orders)));
    assert!(!report.model("ORDERS").unwrap().types.iter().any(|t| Arc::ptr_eq(t, &orders)));
}

#[test]
fn test_message_filter() {
    let schemas = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_schemas(schemas.path());

    let report = run(schemas.path(), out.path(), Some("ORDERS"));

    let base = out.path().join("com").join("acme").join("d03b");
    assert!(base.join("common").join("types.json").is_file());
    assert!(base.join("orders").join("types.json").is_file());
    assert!(!base.join("invoic").exists());
    assert!(report.model("INVOIC").is_none());
    assert_eq!(
        fs::read_to_string(base.join("classes.lst")).unwrap(),
        "com.acme.d03b.orders.Order\n"
    );

    let factory = report.interchange.unwrap();
    assert_eq!(factory.message_names().collect::<Vec<_>>(), vec!["ORDERS"]);
}

#[test]
fn test_compilation_is_deterministic() {
    let schemas = TempDir::new().unwrap();
    write_schemas(schemas.path());
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();

    run(schemas.path(), first.path(), None);
    run(schemas.path(), second.path(), None);

    let first_files = files(first.path());
    assert_eq!(first_files, files(second.path()));
    assert!(!first_files.is_empty());
    for file in &first_files {
        assert_eq!(
            fs::read(first.path().join(file)).unwrap(),
            fs::read(second.path().join(file)).unwrap(),
            "{} differs",
            file.display()
        );
    }
}

#[test]
fn test_truncation_and_padding() {
    let model = compile_from_xml(
        r#"<edimap>
            <description name="PADDING" version="1"/>
            <delimiters segment="'" field="+" component=":" escape="?"/>
            <segments xmltag="Message">
                <segment segcode="ABC" xmltag="abc" truncatable="true">
                    <field xmltag="a"/>
                    <field xmltag="b"/>
                    <field xmltag="c"/>
                </segment>
                <segment segcode="REF" xmltag="reference">
                    <field xmltag="kind"/>
                    <field xmltag="ids" maxOccurs="3"/>
                </segment>
            </segments>
        </edimap>"#,
        "com.acme.padding",
    )
    .unwrap();

    let only_a = Bean::new().with("abc", Bean::new().with("a", "A"));
    assert_eq!(model.encode_to_string(&only_a).unwrap(), "ABC+A'");

    let only_c = Bean::new().with("abc", Bean::new().with("c", "C"));
    assert_eq!(model.encode_to_string(&only_c).unwrap(), "ABC+++C'");

    let empty_ids = Bean::new().with("reference", Bean::new().with("kind", "ON"));
    assert_eq!(model.encode_to_string(&empty_ids).unwrap(), "REF+ON+++'");

    let two_ids = Bean::new().with(
        "reference",
        Bean::new().with("kind", "ON").with("ids", vec!["1", "2"]),
    );
    assert_eq!(model.encode_to_string(&two_ids).unwrap(), "REF+ON+1+2+'");
}
