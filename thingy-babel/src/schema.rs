//! The configuration schema
//!
//!     [CONFIGURATION_XSD] is the schema handed to external editors. [validate] checks the same
//!     content model directly on an [Element] tree:
//!
//!         config   := file*
//!         file     := @src (key | value | group | comment | include)*
//!         key      := @id NMTOKEN, exactly one of (value | group)
//!         group    := (key | value | group | comment | include)*
//!         value    := text, @quote in {single, double, none}
//!         comment  := text, @trailing boolean
//!         include  := @src, text
//!
//!     Whitespace between elements is allowed everywhere. Errors name the offending element
//!     by path, e.g. `/config/file[1]/key[3]`.

use crate::dom::{Element, XmlNode};
use crate::error::XmlError;
use thingy_parser::thingy::is_key_name;

pub const CONFIGURATION_XSD: &str = include_str!("../schema/configuration.xsd");

pub const CONFIG: &str = "config";
pub const FILE: &str = "file";
pub const KEY: &str = "key";
pub const VALUE: &str = "value";
pub const GROUP: &str = "group";
pub const COMMENT: &str = "comment";
pub const INCLUDE: &str = "include";

const ITEMS: [&str; 5] = [KEY, VALUE, GROUP, COMMENT, INCLUDE];
const KEY_CHILDREN: [&str; 2] = [VALUE, GROUP];
const QUOTES: [&str; 3] = ["single", "double", "none"];
const BOOLEANS: [&str; 4] = ["true", "false", "1", "0"];

/// Required and optional attributes per element
const ATTRIBUTES: [(&str, &[&str], &[&str]); 7] = [
    (CONFIG, &[], &[]),
    (FILE, &["src"], &[]),
    (KEY, &["id"], &[]),
    (VALUE, &[], &["quote"]),
    (GROUP, &[], &[]),
    (COMMENT, &[], &["trailing"]),
    (INCLUDE, &["src"], &[]),
];

/// Check `root` against the configuration schema.
pub fn validate(root: &Element) -> Result<(), XmlError> {
    let path = format!("/{}", root.name);
    if root.name != CONFIG {
        return Err(XmlError::validation(&path, "root element must be <config>"));
    }
    check_attributes(root, &path)?;
    for (element, child_path) in element_children(root, &path, &[FILE])? {
        validate_container(element, &child_path)?;
    }
    Ok(())
}

/// Whether `token` is an XML NMTOKEN, i.e. usable as a key id. This is the scanner's key
/// alphabet.
pub fn is_nmtoken(token: &str) -> bool {
    is_key_name(token)
}

fn validate_container(element: &Element, path: &str) -> Result<(), XmlError> {
    check_attributes(element, path)?;
    for (child, child_path) in element_children(element, path, &ITEMS)? {
        validate_item(child, &child_path)?;
    }
    Ok(())
}

fn validate_item(element: &Element, path: &str) -> Result<(), XmlError> {
    match element.name.as_str() {
        KEY => {
            check_attributes(element, path)?;
            let id = element.attribute("id").unwrap_or_default();
            if !is_nmtoken(id) {
                return Err(XmlError::validation(
                    path,
                    format!("id '{id}' is not an NMTOKEN"),
                ));
            }
            let children = element_children(element, path, &KEY_CHILDREN)?;
            match children.as_slice() {
                [(child, child_path)] => validate_item(child, child_path),
                _ => Err(XmlError::validation(
                    path,
                    format!("<key> needs exactly one <value> or <group>, found {}", children.len()),
                )),
            }
        }
        GROUP => validate_container(element, path),
        VALUE => {
            check_attributes(element, path)?;
            check_enum(element, path, "quote", &QUOTES)?;
            check_text_only(element, path)
        }
        COMMENT => {
            check_attributes(element, path)?;
            check_enum(element, path, "trailing", &BOOLEANS)?;
            check_text_only(element, path)
        }
        INCLUDE => {
            check_attributes(element, path)?;
            check_text_only(element, path)
        }
        other => Err(XmlError::validation(path, format!("unexpected <{other}>"))),
    }
}

/// Child elements with their paths. Non-whitespace text is rejected.
fn element_children<'a>(
    element: &'a Element,
    path: &str,
    allowed: &[&str],
) -> Result<Vec<(&'a Element, String)>, XmlError> {
    let mut seen: Vec<(&str, usize)> = Vec::new();
    let mut children = Vec::new();
    for child in &element.children {
        match child {
            XmlNode::Text(text) if text.trim().is_empty() => {}
            XmlNode::Text(_) => {
                return Err(XmlError::validation(
                    path,
                    format!("<{}> cannot contain text", element.name),
                ))
            }
            XmlNode::Element(child) => {
                if !allowed.contains(&child.name.as_str()) {
                    return Err(XmlError::validation(
                        path,
                        format!("<{}> is not allowed in <{}>", child.name, element.name),
                    ));
                }
                let index = match seen.iter_mut().find(|(name, _)| *name == child.name) {
                    Some((_, count)) => {
                        *count += 1;
                        *count
                    }
                    None => {
                        seen.push((child.name.as_str(), 1));
                        1
                    }
                };
                children.push((child, format!("{path}/{}[{index}]", child.name)));
            }
        }
    }
    Ok(children)
}

fn check_attributes(element: &Element, path: &str) -> Result<(), XmlError> {
    let (required, optional) = ATTRIBUTES
        .iter()
        .find(|(name, _, _)| *name == element.name)
        .map_or((&[][..], &[][..]), |(_, required, optional)| (*required, *optional));
    for name in required {
        if element.attribute(name).is_none() {
            return Err(XmlError::validation(
                path,
                format!("missing attribute '{name}'"),
            ));
        }
    }
    for (name, _) in &element.attributes {
        let known = required.contains(&name.as_str()) || optional.contains(&name.as_str());
        if !known && !name.starts_with("xmlns") {
            return Err(XmlError::validation(
                path,
                format!("unknown attribute '{name}'"),
            ));
        }
    }
    Ok(())
}

fn check_enum(element: &Element, path: &str, name: &str, allowed: &[&str]) -> Result<(), XmlError> {
    match element.attribute(name) {
        Some(value) if !allowed.contains(&value) => Err(XmlError::validation(
            path,
            format!("'{value}' is not a valid {name}"),
        )),
        _ => Ok(()),
    }
}

fn check_text_only(element: &Element, path: &str) -> Result<(), XmlError> {
    match element.elements().next() {
        Some(child) => Err(XmlError::validation(
            path,
            format!("<{}> cannot contain <{}>", element.name, child.name),
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn check(xml: &str) -> Result<(), XmlError> {
        validate(&Element::parse(xml).unwrap())
    }

    fn violation_path(xml: &str) -> String {
        match check(xml) {
            Err(XmlError::Validation { path, .. }) => path,
            other => panic!("expected a violation, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_document() {
        check(
            r#"<config>
                 <file src="file:///a.conf">
                   <key id="A"><value quote="single">x</value></key>
                   <comment trailing="true"># note</comment>
                   <key id="L"><group><value>a</value><value quote="none">b</value></group></key>
                   <group><key id="T"><value>t</value></key><include src="file:///b.conf">b.conf</include></group>
                   <include src="file:///b.conf">b.conf</include>
                 </file>
                 <file src="file:///b.conf"/>
               </config>"#,
        )
        .unwrap();
    }

    #[rstest]
    #[case("<conf/>", "/conf")]
    #[case("<config><key id='A'/></config>", "/config")]
    #[case("<config><file/></config>", "/config/file[1]")]
    #[case("<config><file src='a'/><file src='b'>text</file></config>", "/config/file[2]")]
    #[case("<config><file src='a'><value/><key id='A'/></file></config>", "/config/file[1]/key[1]")]
    #[case(
        "<config><file src='a'><key id='A'><value/></key><key id='B'><value/><value/></key></file></config>",
        "/config/file[1]/key[2]"
    )]
    #[case("<config><file src='a'><key id='a b'><value/></key></file></config>", "/config/file[1]/key[1]")]
    #[case("<config><file src='a'><value quote='back'/></file></config>", "/config/file[1]/value[1]")]
    #[case("<config><file src='a'><value><group/></value></file></config>", "/config/file[1]/value[1]")]
    #[case("<config><file src='a'><include>x</include></file></config>", "/config/file[1]/include[1]")]
    #[case("<config><file src='a'><comment trailing='yes'/></file></config>", "/config/file[1]/comment[1]")]
    #[case("<config><file src='a' extra='1'/></config>", "/config/file[1]")]
    fn test_violations_are_located(#[case] xml: &str, #[case] path: &str) {
        assert_eq!(violation_path(xml), path);
    }

    #[test]
    fn test_nmtoken() {
        assert!(is_nmtoken("Dialog1"));
        assert!(is_nmtoken("ä.b-c_d:e"));
        assert!(is_nmtoken("1abc"));
        assert!(!is_nmtoken(""));
        assert!(!is_nmtoken("a%b"));
    }

    fn descendants(element: &Element) -> Vec<&Element> {
        let mut all = Vec::new();
        for child in element.elements() {
            all.push(child);
            all.extend(descendants(child));
        }
        all
    }

    /// Names given by the `attribute` of every `xs:` element called `kind` below `element`
    fn declared<'a>(element: &'a Element, kind: &str, attribute: &str) -> Vec<&'a str> {
        descendants(element)
            .into_iter()
            .filter(|e| e.name == format!("xs:{kind}"))
            .filter_map(|e| e.attribute(attribute))
            .collect()
    }

    fn names(attributes: Vec<&Element>) -> Vec<&str> {
        attributes
            .into_iter()
            .filter_map(|e| e.attribute("name"))
            .collect()
    }

    /// The type definition behind the first declaration of element `name`
    fn type_of<'a>(xsd: &'a Element, name: &str) -> &'a Element {
        let all = descendants(xsd);
        let declaration = all
            .iter()
            .copied()
            .find(|e| e.name == "xs:element" && e.attribute("name") == Some(name))
            .unwrap_or_else(|| panic!("<{name}> is not declared"));
        match declaration.attribute("type") {
            Some(ty) => all
                .iter()
                .copied()
                .find(|e| e.name == "xs:complexType" && e.attribute("name") == Some(ty))
                .unwrap_or_else(|| panic!("type {ty} is not defined")),
            None => declaration,
        }
    }

    #[test]
    fn test_validator_matches_the_shipped_schema() {
        let xsd = Element::parse(CONFIGURATION_XSD).unwrap();

        let mut elements = declared(&xsd, "element", "name");
        elements.sort_unstable();
        elements.dedup();
        let mut known: Vec<&str> = ATTRIBUTES.iter().map(|(name, _, _)| *name).collect();
        known.sort_unstable();
        assert_eq!(elements, known);

        for (name, required, optional) in ATTRIBUTES {
            let ty = type_of(&xsd, name);
            let (declared_required, declared_optional): (Vec<&Element>, Vec<&Element>) =
                descendants(ty)
                    .into_iter()
                    .filter(|e| e.name == "xs:attribute")
                    .partition(|e| e.attribute("use") == Some("required"));
            assert_eq!(names(declared_required), required, "{name}");
            assert_eq!(names(declared_optional), optional, "{name}");
        }

        assert_eq!(declared(type_of(&xsd, CONFIG), "element", "name"), [FILE]);
        assert_eq!(declared(type_of(&xsd, KEY), "element", "name"), KEY_CHILDREN);
        let item = descendants(&xsd)
            .into_iter()
            .find(|e| e.name == "xs:group" && e.attribute("name") == Some("item"))
            .unwrap();
        assert_eq!(declared(item, "element", "name"), ITEMS);
        assert_eq!(declared(type_of(&xsd, VALUE), "enumeration", "value"), QUOTES);
        assert_eq!(
            declared(type_of(&xsd, KEY), "attribute", "type"),
            ["xs:NMTOKEN"]
        );
    }
}
