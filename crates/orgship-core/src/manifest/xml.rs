//! Manifest XML serialization.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::PackageManifest;
use crate::error::Result;

/// Namespace of the metadata package schema.
pub const METADATA_NAMESPACE: &str = "http://soap.sforce.com/2006/04/metadata";

impl PackageManifest {
    /// Serialize to package XML for the given API version.
    pub fn to_xml(&self, api_version: &str) -> Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        let mut package = BytesStart::new("Package");
        package.push_attribute(("xmlns", METADATA_NAMESPACE));
        writer.write_event(Event::Start(package))?;

        for (name, members) in &self.types {
            if members.is_empty() {
                continue;
            }
            writer.write_event(Event::Start(BytesStart::new("types")))?;
            for member in members {
                text_element(&mut writer, "members", member)?;
            }
            text_element(&mut writer, "name", name)?;
            writer.write_event(Event::End(BytesEnd::new("types")))?;
        }

        text_element(&mut writer, "version", api_version)?;
        writer.write_event(Event::End(BytesEnd::new("Package")))?;

        let mut xml = writer.into_inner();
        xml.push(b'\n');
        Ok(xml)
    }
}

fn text_element(writer: &mut Writer<Vec<u8>>, tag: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Classifier;

    #[test]
    fn writes_sorted_types_and_version() {
        let c = Classifier::new("src");
        let entities: Vec<_> = ["src/triggers/T.trigger", "src/classes/B.cls", "src/classes/A.cls"]
            .iter()
            .map(|p| c.classify(p).unwrap())
            .collect();
        let xml = PackageManifest::build(&entities, false).to_xml("58.0").unwrap();
        let xml = String::from_utf8(xml).unwrap();

        let expected = r#"<?xml version="1.0" encoding="UTF-8"?>
<Package xmlns="http://soap.sforce.com/2006/04/metadata">
    <types>
        <members>A</members>
        <members>B</members>
        <name>ApexClass</name>
    </types>
    <types>
        <members>T</members>
        <name>ApexTrigger</name>
    </types>
    <version>58.0</version>
</Package>
"#;
        assert_eq!(xml, expected);
    }

    #[test]
    fn empty_manifest_has_only_version() {
        let xml = PackageManifest::empty().to_xml("58.0").unwrap();
        let xml = String::from_utf8(xml).unwrap();
        assert!(!xml.contains("<types>"));
        assert!(xml.contains("<version>58.0</version>"));
    }

    #[test]
    fn member_names_are_escaped() {
        let c = Classifier::new("src");
        let entity = c.classify("src/documents/R&D/plan.txt").unwrap();
        let xml = PackageManifest::build([&entity], false).to_xml("58.0").unwrap();
        assert!(String::from_utf8(xml).unwrap().contains("<members>R&amp;D/plan.txt</members>"));
    }
}
