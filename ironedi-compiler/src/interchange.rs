//! Interchange assembly.
//!
//! When a model set is interchange-capable, message models are compiled
//! without their own codec configuration and root factory. Assembly then
//! renders the interchange-wide aggregates and one factory whose flavour
//! depends on the interchange type.

use crate::artifacts::{ArtifactWriter, Context, Template};
use crate::compiler::ClassModel;
use crate::error::CompileError;
use ironedi_schema::InterchangeProperties;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Message recorded for interchange assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDescriptor {
    /// Message name.
    pub name: String,
    /// Logical path of the message's binding configuration.
    pub binding_path: String,
    /// Fully qualified root type.
    pub root_type: String,
}

/// Interchange factory flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterchangeFlavour {
    /// UN/EDIFACT interchanges.
    UnEdifact,
    /// ANSI X12 interchanges.
    X12,
}

impl InterchangeFlavour {
    /// Returns the interchange type name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::UnEdifact => "UNEDIFACT",
            Self::X12 => "X12",
        }
    }

    /// Returns the envelope segment codes, outermost first.
    #[must_use]
    pub const fn envelope(&self) -> &'static [&'static str] {
        match self {
            Self::UnEdifact => &["UNB", "UNG", "UNH"],
            Self::X12 => &["ISA", "GS", "ST"],
        }
    }
}

impl fmt::Display for InterchangeFlavour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InterchangeFlavour {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNEDIFACT" => Ok(Self::UnEdifact),
            "X12" => Ok(Self::X12),
            _ => Err(CompileError::UnknownInterchangeType {
                name: s.to_string(),
            }),
        }
    }
}

/// Message-name lookup of an assembled interchange.
#[derive(Debug, Clone)]
pub struct InterchangeFactory {
    flavour: InterchangeFlavour,
    version: String,
    name: String,
    messages: BTreeMap<String, (MessageDescriptor, Arc<ClassModel>)>,
}

impl InterchangeFactory {
    /// Returns the factory flavour.
    #[must_use]
    pub fn flavour(&self) -> InterchangeFlavour {
        self.flavour
    }

    /// Returns the message directory version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the factory name, e.g. `D03BInterchangeFactory`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the binding path of a message.
    #[must_use]
    pub fn binding_path(&self, message: &str) -> Option<&str> {
        self.messages
            .get(message)
            .map(|(descriptor, _)| descriptor.binding_path.as_str())
    }

    /// Returns the compiled codec of a message.
    #[must_use]
    pub fn codec(&self, message: &str) -> Option<&Arc<ClassModel>> {
        self.messages.get(message).map(|(_, model)| model)
    }

    /// Iterates message names in sorted order.
    pub fn message_names(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }
}

/// Assembles interchange artifacts from recorded messages.
#[derive(Debug)]
pub struct InterchangeAssembly<'a> {
    properties: &'a InterchangeProperties,
    namespace: &'a str,
    messages: Vec<(MessageDescriptor, Arc<ClassModel>)>,
}

impl<'a> InterchangeAssembly<'a> {
    /// Creates an assembly for a base namespace.
    #[must_use]
    pub fn new(properties: &'a InterchangeProperties, namespace: &'a str) -> Self {
        Self {
            properties,
            namespace,
            messages: Vec::new(),
        }
    }

    /// Records a compiled message.
    pub fn record(&mut self, descriptor: MessageDescriptor, model: Arc<ClassModel>) {
        self.messages.push((descriptor, model));
    }

    /// Returns the number of recorded messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if no message was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Renders the interchange artifacts into the base namespace directory
    /// and returns the factory.
    ///
    /// # Errors
    /// Returns [`CompileError::UnknownInterchangeType`] for an interchange
    /// type without a factory flavour, or an artifact write error.
    pub fn assemble(
        self,
        writer: &ArtifactWriter,
    ) -> Result<(InterchangeFactory, Vec<PathBuf>), CompileError> {
        let flavour: InterchangeFlavour = self.properties.interchange_type.parse()?;
        let set = self
            .namespace
            .rsplit('.')
            .next()
            .unwrap_or(self.namespace)
            .to_uppercase();
        let name = format!("{set}InterchangeFactory");
        let mut written = Vec::new();

        let descriptors: Vec<_> = self.messages.iter().map(|(d, _)| d).collect();
        let context = Context::from([("messages", serde_json::to_value(&descriptors)?)]);
        written.push(writer.render(
            Template::MessageBindings,
            &context,
            self.namespace,
            "message-bindings.json",
        )?);

        let names: Vec<&str> = descriptors.iter().map(|d| d.name.as_str()).collect();
        let context = Context::from([
            ("type", json!(flavour.name())),
            ("version", json!(self.properties.version)),
            ("envelope", json!(flavour.envelope())),
            ("messages", json!(names)),
        ]);
        written.push(writer.render(
            Template::InterchangeBindings,
            &context,
            self.namespace,
            "interchange-bindings.json",
        )?);

        let lookup: BTreeMap<_, _> = descriptors
            .iter()
            .map(|d| (d.name.as_str(), d.binding_path.as_str()))
            .collect();
        let context = Context::from([
            ("flavour", json!(flavour.name())),
            ("class", json!(format!("{}.{name}", self.namespace))),
            ("messages", json!(lookup)),
        ]);
        written.push(writer.render(
            Template::InterchangeFactory,
            &context,
            self.namespace,
            &format!("{name}.json"),
        )?);

        tracing::info!(
            "Assembled {} interchange {} with {} messages",
            flavour,
            name,
            self.messages.len()
        );

        let factory = InterchangeFactory {
            flavour,
            version: self.properties.version.clone(),
            name,
            messages: self
                .messages
                .into_iter()
                .map(|(d, m)| (d.name.clone(), (d, m)))
                .collect(),
        };
        Ok((factory, written))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::binding_path;
    use crate::compiler::{ClassModelCompiler, CompileOptions};
    use crate::registry::ClassRegistry;
    use ironedi_schema::parse_model;
    use std::fs;
    use tempfile::TempDir;

    fn message(name: &str, namespace: &str) -> (MessageDescriptor, Arc<ClassModel>) {
        let xml = format!(
            r#"<edimap><description name="{name}" version="D03B"/>
               <segments xmltag="{name}Message">
                 <segment segcode="BGM" xmltag="header"><field xmltag="number"/></segment>
               </segments></edimap>"#
        );
        let model = ClassModelCompiler::new(namespace)
            .options(CompileOptions::INTERCHANGE_MESSAGE)
            .compile(&parse_model(&xml).unwrap(), &mut ClassRegistry::new())
            .unwrap();
        let descriptor = MessageDescriptor {
            name: name.to_string(),
            binding_path: binding_path(namespace),
            root_type: model.root.fqn(),
        };
        (descriptor, Arc::new(model))
    }

    #[test]
    fn test_flavour_from_str() {
        assert_eq!("UNEDIFACT".parse::<InterchangeFlavour>().unwrap(), InterchangeFlavour::UnEdifact);
        assert_eq!("X12".parse::<InterchangeFlavour>().unwrap(), InterchangeFlavour::X12);
        let err = "HL7".parse::<InterchangeFlavour>().unwrap_err();
        assert!(matches!(err, CompileError::UnknownInterchangeType { name } if name == "HL7"));
    }

    #[test]
    fn test_assemble() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path());
        let properties = InterchangeProperties::new("UNEDIFACT", "D03B");

        let mut assembly = InterchangeAssembly::new(&properties, "com.acme.d03b");
        let (descriptor, model) = message("ORDERS", "com.acme.d03b.orders");
        assembly.record(descriptor, model);
        let (descriptor, model) = message("INVOIC", "com.acme.d03b.invoic");
        assembly.record(descriptor, model);
        assert_eq!(assembly.len(), 2);

        let (factory, written) = assembly.assemble(&writer).unwrap();
        assert_eq!(written.len(), 3);
        assert_eq!(factory.name(), "D03BInterchangeFactory");
        assert_eq!(factory.flavour(), InterchangeFlavour::UnEdifact);
        assert_eq!(
            factory.binding_path("ORDERS"),
            Some("/com/acme/d03b/orders/binding-config.json")
        );
        assert_eq!(factory.message_names().collect::<Vec<_>>(), vec!["INVOIC", "ORDERS"]);
        assert!(factory.binding_path("DESADV").is_none());

        let codec = factory.codec("ORDERS").unwrap();
        assert_eq!(codec.root.fqn(), "com.acme.d03b.orders.ORDERSMessage");

        let ns_dir = dir.path().join("com").join("acme").join("d03b");
        let text = fs::read_to_string(ns_dir.join("D03BInterchangeFactory.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["class"], "com.acme.d03b.D03BInterchangeFactory");
        assert_eq!(json["messages"]["INVOIC"], "/com/acme/d03b/invoic/binding-config.json");

        let bindings: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(ns_dir.join("interchange-bindings.json")).unwrap())
                .unwrap();
        assert_eq!(bindings["envelope"][0], "UNB");
        assert_eq!(bindings["messages"][1], "INVOIC");
    }

    #[test]
    fn test_unknown_type_is_fatal() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path());
        let properties = InterchangeProperties::new("TRADACOMS", "1");
        let mut assembly = InterchangeAssembly::new(&properties, "com.acme");
        let (descriptor, model) = message("ORDERS", "com.acme.orders");
        assembly.record(descriptor, model);

        let err = assembly.assemble(&writer).unwrap_err();
        assert!(matches!(err, CompileError::UnknownInterchangeType { .. }));
        assert!(!dir.path().join("com").exists());
    }
}
