//! Schema document (`edimap`) parser.
//!
//! Parsing happens in two phases. [`parse_edimap`] reads the XML into an
//! [`EdimapDocument`] (header declarations plus an element tree), then
//! [`EdimapDocument::build`] turns the element tree into schema nodes once
//! the documents it imports are available for `segref` resolution.

use crate::error::ParseError;
use crate::model::{Description, InterchangeProperties, SchemaModel};
use crate::types::{Container, ContainerKind, Occurs, SchemaChild, SchemaNode, ValueNode};
use ironedi_core::{DataType, DelimiterType, Delimiters, EncoderConfig};
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::sync::Arc;

/// Element of a parsed XML document.
#[derive(Debug, Clone, Default)]
pub struct Element {
    /// Local element name (namespace prefix removed).
    pub name: String,
    /// Attributes in document order, values unescaped.
    pub attributes: Vec<(String, String)>,
    /// Child elements.
    pub children: Vec<Element>,
    /// Concatenated text content.
    pub text: String,
}

impl Element {
    /// Returns an attribute value.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns a required attribute value.
    ///
    /// # Errors
    /// Returns [`ParseError::MissingAttribute`] if it is absent.
    pub fn required_attr(&self, name: &str) -> Result<&str, ParseError> {
        self.attr(name)
            .ok_or_else(|| ParseError::missing_attr(&self.name, name))
    }

    /// Returns the first child with the given name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Import declaration of a schema document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Location of the imported document, relative to the importing one.
    pub resource: String,
    /// Prefix used by `segref` attributes to address the imported segments.
    pub namespace: String,
}

/// Parsed but not yet built schema document.
#[derive(Debug, Clone)]
pub struct EdimapDocument {
    /// Model description.
    pub description: Description,
    /// Declared delimiters.
    pub delimiters: Delimiters,
    /// Declared imports, in document order.
    pub imports: Vec<Import>,
    /// Interchange properties, if declared.
    pub interchange: Option<InterchangeProperties>,
    segments: Element,
}

/// Reads an XML document into an element tree.
///
/// # Errors
/// Returns `ParseError` if the XML is malformed.
pub fn read_element_tree(xml: &str) -> Result<Element, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                stack.push(start_element(e)?);
            }
            Ok(Event::Empty(ref e)) => {
                let element = start_element(e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ParseError::structure("unbalanced end tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(ref t)) => {
                if let Some(top) = stack.last_mut() {
                    let raw = std::str::from_utf8(t.as_ref())?;
                    let text = unescape(raw).map_err(|_| ParseError::structure("bad escape in text"))?;
                    top.text.push_str(text.trim());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(ParseError::structure("unexpected end of document"));
    }
    root.ok_or_else(|| ParseError::structure("empty document"))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(ParseError::structure("multiple root elements")),
    }
    Ok(())
}

/// Reads the name and attributes of an element start tag.
fn start_element(e: &BytesStart<'_>) -> Result<Element, ParseError> {
    let name = std::str::from_utf8(e.local_name().as_ref())?.to_string();
    let mut attributes = Vec::new();

    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref())?;
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        let raw = std::str::from_utf8(&attr.value)?;
        let value = unescape(raw).map_err(|_| ParseError::invalid_attr(&name, key, raw))?;
        attributes.push((key.to_string(), value.into_owned()));
    }

    Ok(Element {
        name,
        attributes,
        ..Element::default()
    })
}

/// Parses a schema document.
///
/// # Arguments
/// * `xml` - Document content
///
/// # Errors
/// Returns `ParseError` if the XML is malformed or is not an `edimap`
/// document.
pub fn parse_edimap(xml: &str) -> Result<EdimapDocument, ParseError> {
    let root = read_element_tree(xml)?;
    if root.name != "edimap" {
        return Err(ParseError::structure(format!(
            "expected 'edimap' root element, found '{}'",
            root.name
        )));
    }

    let mut description = None;
    let mut delimiters = Delimiters::default();
    let mut imports = Vec::new();
    let mut interchange = None;
    let mut segments = None;

    for child in root.children {
        match child.name.as_str() {
            "import" => imports.push(Import {
                resource: child.required_attr("resource")?.to_string(),
                namespace: child.required_attr("namespace")?.to_string(),
            }),
            "description" => {
                description = Some(Description::new(
                    child.required_attr("name")?,
                    child.required_attr("version")?,
                ));
            }
            "delimiters" => delimiters = parse_delimiters(&child)?,
            "interchange" => {
                interchange = Some(InterchangeProperties::new(
                    child.required_attr("type")?,
                    child.required_attr("version")?,
                ));
            }
            "segments" => segments = Some(child),
            "documentation" => {}
            other => return Err(ParseError::unknown_element(other, "edimap")),
        }
    }

    Ok(EdimapDocument {
        description: description
            .ok_or_else(|| ParseError::structure("missing 'description' element"))?,
        delimiters,
        imports,
        interchange,
        segments: segments.ok_or_else(|| ParseError::structure("missing 'segments' element"))?,
    })
}

/// Parses a `delimiters` element.
///
/// Levels not declared stay unused; only the decimal separator defaults
/// to `.`.
fn parse_delimiters(element: &Element) -> Result<Delimiters, ParseError> {
    let mut delimiters = Delimiters {
        segment: String::new(),
        field: String::new(),
        field_repeat: String::new(),
        component: String::new(),
        sub_component: String::new(),
        decimal_separator: ".".to_string(),
        escape: None,
    };

    for (key, value) in &element.attributes {
        if key == "escape" {
            delimiters = delimiters.with_escape(Some(value.clone()));
            continue;
        }
        let level: DelimiterType = key.parse()?;
        delimiters.set(level, value.as_str());
    }

    if delimiters.segment.is_empty() || delimiters.field.is_empty() {
        return Err(ParseError::structure(
            "delimiters must declare 'segment' and 'field'",
        ));
    }
    Ok(delimiters)
}

impl EdimapDocument {
    /// Builds the schema model.
    ///
    /// `imported` maps each import namespace to the root node of the built
    /// imported model. Segment references resolve to the imported node
    /// itself, not a copy.
    ///
    /// # Errors
    /// Returns `ParseError` for unknown elements, invalid attributes or
    /// unresolved segment references.
    pub fn build(
        &self,
        imported: &HashMap<String, Arc<SchemaNode>>,
    ) -> Result<SchemaModel, ParseError> {
        let name = self.segments.required_attr("xmltag")?;
        let mut root = Container::new(name, ContainerKind::SegmentGroup);
        for element in &self.segments.children {
            match element.name.as_str() {
                "documentation" => root.documentation = Some(element.text.clone()),
                _ => root.segments.push(build_segment_child(element, imported)?),
            }
        }

        Ok(SchemaModel::new(
            self.description.clone(),
            self.delimiters.clone(),
            root.into(),
        ))
    }
}

/// Parses and builds a document that has no imports.
///
/// # Errors
/// Returns `ParseError` if parsing or building fails.
pub fn parse_model(xml: &str) -> Result<SchemaModel, ParseError> {
    parse_edimap(xml)?.build(&HashMap::new())
}

fn build_segment_child(
    element: &Element,
    imported: &HashMap<String, Arc<SchemaNode>>,
) -> Result<SchemaChild, ParseError> {
    let occurs = parse_occurs(element, 1)?;

    match element.name.as_str() {
        "segment" => {
            if let Some(reference) = element.attr("segref") {
                return Ok(SchemaChild::new(occurs, resolve_segref(reference, imported)?));
            }

            let mut segment = Container::segment(
                element.required_attr("xmltag")?,
                element.required_attr("segcode")?,
            );
            segment.truncatable = parse_flag(element, "truncatable")?;

            for child in &element.children {
                match child.name.as_str() {
                    "field" => segment.children.push(build_field(child)?),
                    "segment" | "segmentGroup" => {
                        segment.segments.push(build_segment_child(child, imported)?);
                    }
                    "documentation" => segment.documentation = Some(child.text.clone()),
                    other => return Err(ParseError::unknown_element(other, "segment")),
                }
            }
            Ok(SchemaChild::new(occurs, segment))
        }
        "segmentGroup" => {
            let mut group = Container::new(
                element.required_attr("xmltag")?,
                ContainerKind::SegmentGroup,
            );
            for child in &element.children {
                match child.name.as_str() {
                    "documentation" => group.documentation = Some(child.text.clone()),
                    _ => group.segments.push(build_segment_child(child, imported)?),
                }
            }
            Ok(SchemaChild::new(occurs, group))
        }
        other => Err(ParseError::unknown_element(other, "segments")),
    }
}

fn resolve_segref(
    reference: &str,
    imported: &HashMap<String, Arc<SchemaNode>>,
) -> Result<Arc<SchemaNode>, ParseError> {
    let unresolved = || ParseError::UnresolvedReference {
        reference: reference.to_string(),
    };
    let (namespace, code) = reference.split_once(':').ok_or_else(unresolved)?;
    imported
        .get(namespace)
        .and_then(|root| root.as_container())
        .and_then(|root| root.find_segment(code))
        .cloned()
        .ok_or_else(unresolved)
}

fn build_field(element: &Element) -> Result<SchemaChild, ParseError> {
    build_delimited(element, DelimiterType::Field, ContainerKind::Field, "component")
}

fn build_component(element: &Element) -> Result<SchemaChild, ParseError> {
    build_delimited(
        element,
        DelimiterType::Component,
        ContainerKind::Component,
        "sub-component",
    )
}

/// Builds a field or component: a composite container when it has
/// children, a value leaf otherwise.
fn build_delimited(
    element: &Element,
    level: DelimiterType,
    kind: ContainerKind,
    child_name: &str,
) -> Result<SchemaChild, ParseError> {
    let default_min = u32::from(parse_flag(element, "required")?);
    let occurs = parse_occurs(element, default_min)?;
    let name = element.required_attr("xmltag")?;

    let parts: Vec<&Element> = element
        .children
        .iter()
        .filter(|c| c.name != "documentation")
        .collect();

    if parts.is_empty() {
        return Ok(SchemaChild::new(occurs, build_value(element, level)?));
    }

    let mut composite = Container::new(name, kind);
    composite.truncatable = parse_flag(element, "truncatable")?;
    for part in parts {
        if part.name != child_name {
            return Err(ParseError::unknown_element(&part.name, &element.name));
        }
        let child = match kind {
            ContainerKind::Field => build_component(part)?,
            _ => {
                let min = u32::from(parse_flag(part, "required")?);
                SchemaChild::new(
                    parse_occurs(part, min)?,
                    build_value(part, DelimiterType::SubComponent)?,
                )
            }
        };
        composite.children.push(child);
    }
    Ok(SchemaChild::new(occurs, composite))
}

fn build_value(element: &Element, level: DelimiterType) -> Result<ValueNode, ParseError> {
    let mut value = ValueNode::new(element.required_attr("xmltag")?, level);
    if let Some(data_type) = element.attr("dataType") {
        let data_type: DataType = data_type.parse()?;
        let parameters = match element.attr("dataTypeParameters") {
            Some(list) => EncoderConfig::parse(list)?,
            None => EncoderConfig::new(),
        };
        value = value.with_encoder(data_type, parameters);
    }
    Ok(value)
}

fn parse_occurs(element: &Element, default_min: u32) -> Result<Occurs, ParseError> {
    let min = match element.attr("minOccurs") {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ParseError::invalid_attr(&element.name, "minOccurs", raw))?,
        None => default_min,
    };
    let max = match element.attr("maxOccurs") {
        Some(raw) => Occurs::parse_max(raw)
            .ok_or_else(|| ParseError::invalid_attr(&element.name, "maxOccurs", raw))?,
        None => Some(1),
    };
    Ok(Occurs::new(min, max))
}

fn parse_flag(element: &Element, name: &str) -> Result<bool, ParseError> {
    match element.attr(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ParseError::invalid_attr(&element.name, name, raw)),
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironedi_core::Error as CoreError;

    const ORDERS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<medi:edimap xmlns:medi="http://www.milyn.org/schema/edi-message-mapping-1.5.xsd">
    <medi:description name="ORDERS" version="D03B"/>
    <medi:delimiters segment="'&#10;" field="+" component=":" field-repeat="*" escape="?"/>
    <medi:segments xmltag="Order">
        <medi:segment segcode="BGM" xmltag="header">
            <medi:field xmltag="documentName" required="true"/>
            <medi:field xmltag="documentNumber" dataType="Integer" dataTypeParameters="width=6"/>
        </medi:segment>
        <medi:segmentGroup xmltag="parties" maxOccurs="-1">
            <medi:segment segcode="NAD" xmltag="party" truncatable="true">
                <medi:field xmltag="qualifier" required="true"/>
                <medi:field xmltag="partyId" truncatable="true">
                    <medi:component xmltag="id" required="true"/>
                    <medi:component xmltag="agency">
                        <medi:sub-component xmltag="code"/>
                        <medi:sub-component xmltag="list"/>
                    </medi:component>
                </medi:field>
                <medi:field xmltag="reference" maxOccurs="3"/>
            </medi:segment>
        </medi:segmentGroup>
    </medi:segments>
</medi:edimap>"#;

    #[test]
    fn test_parse_header() {
        let doc = parse_edimap(ORDERS).unwrap();
        assert_eq!(doc.description, Description::new("ORDERS", "D03B"));
        assert_eq!(doc.delimiters.segment, "'\n");
        assert_eq!(doc.delimiters.field, "+");
        assert_eq!(doc.delimiters.sub_component, "");
        assert_eq!(doc.delimiters.escape.as_deref(), Some("?"));
        assert!(doc.imports.is_empty());
        assert!(doc.interchange.is_none());
    }

    #[test]
    fn test_build_tree() {
        let model = parse_model(ORDERS).unwrap();
        let root = model.root.as_container().unwrap();
        assert_eq!(root.name, "Order");
        assert_eq!(root.segments.len(), 2);

        let header = root.segments[0].node.as_container().unwrap();
        assert_eq!(header.code.as_deref(), Some("BGM"));
        assert_eq!(header.children[0].occurs, Occurs::REQUIRED);
        assert_eq!(header.children[1].occurs, Occurs::OPTIONAL);
        let number = header.children[1].node.as_value().unwrap();
        assert_eq!(number.data_type, Some(DataType::Integer));
        assert_eq!(number.parameters.get("width"), Some("6"));

        let parties = &root.segments[1];
        assert_eq!(parties.occurs, Occurs::new(1, None));
        let nad = parties.node.as_container().unwrap().segments[0]
            .node
            .as_container()
            .unwrap();
        assert!(nad.truncatable);
        let party_id = nad.children[1].node.as_container().unwrap();
        assert_eq!(party_id.kind, ContainerKind::Field);
        assert!(party_id.truncatable);
        let agency = party_id.children[1].node.as_container().unwrap();
        assert_eq!(agency.kind, ContainerKind::Component);
        assert_eq!(agency.children[0].node.level(), DelimiterType::SubComponent);
        assert_eq!(nad.children[2].occurs, Occurs::new(0, Some(3)));
    }

    #[test]
    fn test_segref_resolves_to_imported_node() {
        let defs = parse_model(
            r#"<edimap>
                <description name="__modelset_definitions" version="local"/>
                <segments xmltag="Definitions">
                    <segment segcode="NAD" xmltag="NameAndAddress">
                        <field xmltag="qualifier"/>
                    </segment>
                </segments>
            </edimap>"#,
        )
        .unwrap();

        let doc = parse_edimap(
            r#"<edimap>
                <import resource="defs.xml" namespace="def"/>
                <description name="INVOIC" version="D03B"/>
                <segments xmltag="Invoice">
                    <segment segref="def:NAD" minOccurs="0" maxOccurs="9"/>
                </segments>
            </edimap>"#,
        )
        .unwrap();
        assert_eq!(
            doc.imports,
            vec![Import {
                resource: "defs.xml".to_string(),
                namespace: "def".to_string()
            }]
        );

        let imported = HashMap::from([("def".to_string(), Arc::clone(&defs.root))]);
        let model = doc.build(&imported).unwrap();
        let child = &model.root.as_container().unwrap().segments[0];
        let shared = defs.root.as_container().unwrap().find_segment("NAD").unwrap();

        assert!(Arc::ptr_eq(&child.node, shared));
        assert_eq!(child.occurs, Occurs::new(0, Some(9)));

        let err = doc.build(&HashMap::new()).unwrap_err();
        assert!(matches!(err, ParseError::UnresolvedReference { reference } if reference == "def:NAD"));
    }

    #[test]
    fn test_unknown_delimiter_kind() {
        let err = parse_edimap(
            r#"<edimap><description name="A" version="1"/>
               <delimiters segment="'" field="+" record="|"/>
               <segments xmltag="A"/></edimap>"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ParseError::Core(CoreError::UnsupportedDelimiter { name }) if name == "record"
        ));
    }

    #[test]
    fn test_unknown_element() {
        let err = parse_model(
            r#"<edimap><description name="A" version="1"/>
               <segments xmltag="A"><segment segcode="X" xmltag="x"><bogus/></segment></segments>
               </edimap>"#,
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::UnknownElement { element, .. } if element == "bogus"));
    }

    #[test]
    fn test_invalid_attributes() {
        let err = parse_model(
            r#"<edimap><description name="A" version="1"/>
               <segments xmltag="A"><segment segcode="X" xmltag="x" maxOccurs="many"/></segments>
               </edimap>"#,
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::InvalidAttribute { attribute, .. } if attribute == "maxOccurs"));

        let err = parse_model(
            r#"<edimap><description name="A" version="1"/>
               <segments xmltag="A"><segment segcode="X" xmltag="x">
               <field xmltag="f" dataType="Blob"/></segment></segments></edimap>"#,
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::Core(CoreError::UnknownDataType { .. })));
    }

    #[test]
    fn test_missing_description() {
        let err = parse_edimap(r#"<edimap><segments xmltag="A"/></edimap>"#).unwrap_err();
        assert!(matches!(err, ParseError::InvalidStructure { .. }));

        let err = parse_edimap("<other/>").unwrap_err();
        assert!(matches!(err, ParseError::InvalidStructure { .. }));
    }

    #[test]
    fn test_interchange_declaration() {
        let doc = parse_edimap(
            r#"<edimap>
                <description name="__modelset_definitions" version="local"/>
                <interchange type="UNEDIFACT" version="D03B"/>
                <segments xmltag="Definitions"/>
            </edimap>"#,
        )
        .unwrap();
        assert_eq!(
            doc.interchange,
            Some(InterchangeProperties::new("UNEDIFACT", "D03B"))
        );
        assert_eq!(doc.delimiters, Delimiters::edifact());
    }
}
