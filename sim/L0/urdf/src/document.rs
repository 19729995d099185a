//! In-place editing of URDF documents.
//!
//! The typed model in [`crate::types`] is read-only. Writing repaired
//! inertial data back goes through [`UrdfDocument`], which streams the
//! original XML from a reader into a writer and touches only the
//! `<inertial>` elements named by an [`InertialEdit`]. Everything else,
//! including comments and formatting, is passed through unchanged.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use nalgebra::Vector3;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Result, UrdfError};
use crate::parser::{get_attribute_opt, parse_urdf_str};
use crate::types::{UrdfInertia, UrdfRobot};

/// Significant digits used when writing numbers back into a document.
pub const WRITE_PRECISION: usize = 9;

/// Replacement inertial frame and tensor for one link.
#[derive(Debug, Clone, PartialEq)]
pub struct InertialEdit {
    /// Name of the link to edit.
    pub link: String,
    /// New `<origin xyz>` of the inertial frame; `rpy` is reset to zero.
    pub center_of_mass: Vector3<f64>,
    /// New tensor entries, expressed in the link frame.
    pub inertia: UrdfInertia,
}

/// Raw URDF text with targeted inertial editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrdfDocument {
    xml: String,
}

impl UrdfDocument {
    /// Wrap URDF text.
    #[must_use]
    pub fn new(xml: impl Into<String>) -> Self {
        Self { xml: xml.into() }
    }

    /// Read a document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`UrdfError::Io`] if the file cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(fs::read_to_string(path)?))
    }

    /// The document text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.xml
    }

    /// Parse the document into the typed model.
    ///
    /// # Errors
    ///
    /// See [`parse_urdf_str`].
    pub fn parse(&self) -> Result<UrdfRobot> {
        parse_urdf_str(&self.xml)
    }

    /// Mass recorded in the first `<inertial><mass value>` of a top-level
    /// link.
    ///
    /// Returns `Ok(None)` when the link exists but has no inertial block,
    /// no mass element, or a value that is not a number.
    ///
    /// # Errors
    ///
    /// Returns [`UrdfError::LinkNotFound`] if no top-level `<link>` has this
    /// name, or [`UrdfError::XmlParse`] if the XML is malformed.
    pub fn link_mass(&self, link: &str) -> Result<Option<f64>> {
        let mut reader = Reader::from_str(&self.xml);
        let mut depth = 0usize;
        let mut link_depth: Option<usize> = None;
        let mut inertial_depth: Option<usize> = None;
        let mut inertial_seen = false;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| UrdfError::XmlParse(e.to_string()))?;
            let (e, is_start) = match &event {
                Event::Start(e) => (e, true),
                Event::Empty(e) => (e, false),
                Event::End(_) => {
                    if link_depth == Some(depth) {
                        return Ok(None);
                    }
                    if inertial_depth == Some(depth) {
                        inertial_depth = None;
                    }
                    depth = depth.saturating_sub(1);
                    continue;
                }
                Event::Eof => break,
                _ => continue,
            };

            let elem_depth = depth + 1;
            if is_start {
                depth = elem_depth;
            }

            match link_depth {
                None => {
                    if is_link_named(e, elem_depth, link) {
                        if !is_start {
                            return Ok(None);
                        }
                        link_depth = Some(elem_depth);
                    }
                }
                Some(ld) => {
                    if inertial_depth.is_none()
                        && !inertial_seen
                        && elem_depth == ld + 1
                        && e.name().as_ref() == b"inertial"
                    {
                        inertial_seen = true;
                        if is_start {
                            inertial_depth = Some(elem_depth);
                        }
                    } else if inertial_depth.is_some_and(|id| elem_depth == id + 1)
                        && e.name().as_ref() == b"mass"
                    {
                        return Ok(get_attribute_opt(e, "value").and_then(|v| v.trim().parse().ok()));
                    }
                }
            }
        }

        Err(UrdfError::LinkNotFound(link.to_string()))
    }

    /// Apply inertial edits and return the new document text.
    ///
    /// For each edited link the first `<inertial>` gets its `<origin>` set
    /// to the new center of mass with zero rotation and its `<inertia>`
    /// attributes replaced. Missing `<inertial>`, `<origin>` or `<inertia>`
    /// elements are created. Mass and any other attributes are kept. The
    /// output always starts with an XML declaration.
    ///
    /// # Errors
    ///
    /// Returns [`UrdfError::LinkNotFound`] if an edit names a link that is
    /// not a top-level `<link>` of the document, and XML errors if reading
    /// or writing fails.
    pub fn apply(&self, edits: &[InertialEdit]) -> Result<String> {
        let mut pending: HashMap<&str, &InertialEdit> = HashMap::new();
        for edit in edits {
            pending.entry(edit.link.as_str()).or_insert(edit);
        }

        let mut reader = Reader::from_str(&self.xml);
        let mut writer = Writer::new(Vec::new());
        let mut depth = 0usize;
        let mut link: Option<LinkScope<'_>> = None;
        let mut inertial: Option<InertialScope> = None;
        let mut wrote_decl = false;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| UrdfError::XmlParse(e.to_string()))?;

            if !wrote_decl {
                wrote_decl = true;
                if !matches!(event, Event::Decl(_)) {
                    write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
                    write(&mut writer, Event::Text(BytesText::new("\n")))?;
                }
            }

            match event {
                Event::Start(e) => {
                    depth += 1;
                    if let Some(edit) = claim_link(&e, depth, link.is_none(), &mut pending) {
                        link = Some(LinkScope {
                            edit,
                            depth,
                            inertial_seen: false,
                        });
                        write(&mut writer, Event::Start(e))?;
                    } else if let Some(scope) = link
                        .as_mut()
                        .filter(|s| s.opens_inertial(&e, depth))
                    {
                        scope.inertial_seen = true;
                        inertial = Some(InertialScope {
                            depth,
                            origin_done: false,
                            inertia_done: false,
                        });
                        write(&mut writer, Event::Start(e))?;
                    } else if let (Some(scope), Some(l)) = (inertial.as_mut(), link.as_ref()) {
                        let replaced = scope.rewrite_child(&e, depth, l.edit);
                        write(&mut writer, Event::Start(replaced.unwrap_or(e)))?;
                    } else {
                        write(&mut writer, Event::Start(e))?;
                    }
                }
                Event::Empty(e) => {
                    let elem_depth = depth + 1;
                    if let Some(edit) = claim_link(&e, elem_depth, link.is_none(), &mut pending) {
                        let end = BytesEnd::new(element_name(&e)?.to_string());
                        write(&mut writer, Event::Start(e))?;
                        write_inertial_block(&mut writer, edit)?;
                        write(&mut writer, Event::End(end))?;
                    } else if let Some(scope) = link
                        .as_mut()
                        .filter(|s| s.opens_inertial(&e, elem_depth))
                    {
                        scope.inertial_seen = true;
                        write_inertial_block(&mut writer, scope.edit)?;
                    } else if let (Some(scope), Some(l)) = (inertial.as_mut(), link.as_ref()) {
                        let replaced = scope.rewrite_child(&e, elem_depth, l.edit);
                        write(&mut writer, Event::Empty(replaced.unwrap_or(e)))?;
                    } else {
                        write(&mut writer, Event::Empty(e))?;
                    }
                }
                Event::End(e) => {
                    if let Some(scope) = inertial.take_if(|s| s.depth == depth) {
                        if let Some(l) = link.as_ref() {
                            scope.write_missing(&mut writer, l.edit)?;
                        }
                    }
                    if let Some(scope) = link.take_if(|s| s.depth == depth) {
                        if !scope.inertial_seen {
                            write_inertial_block(&mut writer, scope.edit)?;
                        }
                    }
                    write(&mut writer, Event::End(e))?;
                    depth = depth.saturating_sub(1);
                }
                Event::Eof => break,
                other => write(&mut writer, other)?,
            }
        }

        if let Some(missing) = edits.iter().find(|e| pending.contains_key(e.link.as_str())) {
            return Err(UrdfError::LinkNotFound(missing.link.clone()));
        }

        String::from_utf8(writer.into_inner()).map_err(|e| UrdfError::XmlWrite(e.to_string()))
    }
}

/// The edited link currently being streamed.
struct LinkScope<'a> {
    edit: &'a InertialEdit,
    depth: usize,
    inertial_seen: bool,
}

impl LinkScope<'_> {
    fn opens_inertial(&self, e: &BytesStart, elem_depth: usize) -> bool {
        !self.inertial_seen && elem_depth == self.depth + 1 && e.name().as_ref() == b"inertial"
    }
}

/// The edited `<inertial>` currently being streamed.
struct InertialScope {
    depth: usize,
    origin_done: bool,
    inertia_done: bool,
}

impl InertialScope {
    /// Replacement for a direct `<origin>` or `<inertia>` child, first only.
    fn rewrite_child(
        &mut self,
        e: &BytesStart,
        elem_depth: usize,
        edit: &InertialEdit,
    ) -> Option<BytesStart<'static>> {
        if elem_depth != self.depth + 1 {
            return None;
        }
        match e.name().as_ref() {
            b"origin" if !self.origin_done => {
                self.origin_done = true;
                Some(with_attributes(e, &origin_attributes(edit)))
            }
            b"inertia" if !self.inertia_done => {
                self.inertia_done = true;
                Some(with_attributes(e, &inertia_attributes(&edit.inertia)))
            }
            _ => None,
        }
    }

    fn write_missing(&self, writer: &mut Writer<Vec<u8>>, edit: &InertialEdit) -> Result<()> {
        if !self.origin_done {
            write(writer, Event::Empty(new_element("origin", &origin_attributes(edit))))?;
        }
        if !self.inertia_done {
            write(
                writer,
                Event::Empty(new_element("inertia", &inertia_attributes(&edit.inertia))),
            )?;
        }
        Ok(())
    }
}

/// Take ownership of the pending edit for a top-level `<link>` start.
fn claim_link<'a>(
    e: &BytesStart,
    elem_depth: usize,
    idle: bool,
    pending: &mut HashMap<&str, &'a InertialEdit>,
) -> Option<&'a InertialEdit> {
    if !idle || elem_depth != 2 || e.name().as_ref() != b"link" {
        return None;
    }
    let name = get_attribute_opt(e, "name")?;
    pending.remove(name.as_str())
}

fn is_link_named(e: &BytesStart, elem_depth: usize, link: &str) -> bool {
    elem_depth == 2
        && e.name().as_ref() == b"link"
        && get_attribute_opt(e, "name").as_deref() == Some(link)
}

fn origin_attributes(edit: &InertialEdit) -> Vec<(&'static str, String)> {
    let c = &edit.center_of_mass;
    vec![
        (
            "xyz",
            format!(
                "{} {} {}",
                format_significant(c.x, WRITE_PRECISION),
                format_significant(c.y, WRITE_PRECISION),
                format_significant(c.z, WRITE_PRECISION)
            ),
        ),
        ("rpy", "0 0 0".to_string()),
    ]
}

fn inertia_attributes(inertia: &UrdfInertia) -> Vec<(&'static str, String)> {
    ["ixx", "ixy", "ixz", "iyy", "iyz", "izz"]
        .into_iter()
        .zip(inertia.entries())
        .map(|(key, value)| (key, format_significant(value, WRITE_PRECISION)))
        .collect()
}

/// Copy `e`, overwriting the listed attributes in place and appending the
/// ones it did not have.
fn with_attributes(e: &BytesStart, replacements: &[(&'static str, String)]) -> BytesStart<'static> {
    let original: Vec<(Vec<u8>, Vec<u8>)> = e
        .attributes()
        .flatten()
        .map(|a| (a.key.as_ref().to_vec(), a.value.into_owned()))
        .collect();

    let mut elem = e.clone().into_owned();
    elem.clear_attributes();

    for (key, raw) in &original {
        match replacements.iter().find(|(k, _)| k.as_bytes() == key.as_slice()) {
            Some((k, v)) => {
                elem.push_attribute((*k, v.as_str()));
            }
            None => {
                elem.push_attribute((key.as_slice(), raw.as_slice()));
            }
        }
    }
    for (k, v) in replacements {
        if !original.iter().any(|(key, _)| key.as_slice() == k.as_bytes()) {
            elem.push_attribute((*k, v.as_str()));
        }
    }

    elem
}

fn new_element(name: &'static str, attributes: &[(&'static str, String)]) -> BytesStart<'static> {
    let mut elem = BytesStart::new(name);
    for (k, v) in attributes {
        elem.push_attribute((*k, v.as_str()));
    }
    elem
}

fn write_inertial_block(writer: &mut Writer<Vec<u8>>, edit: &InertialEdit) -> Result<()> {
    write(writer, Event::Start(BytesStart::new("inertial")))?;
    write(writer, Event::Empty(new_element("origin", &origin_attributes(edit))))?;
    write(
        writer,
        Event::Empty(new_element("inertia", &inertia_attributes(&edit.inertia))),
    )?;
    write(writer, Event::End(BytesEnd::new("inertial")))
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| UrdfError::XmlWrite(e.to_string()))
}

fn element_name<'a>(e: &'a BytesStart<'_>) -> Result<&'a str> {
    std::str::from_utf8(e.name().into_inner()).map_err(|e| UrdfError::XmlParse(e.to_string()))
}

// ============================================================================
// Number formatting
// ============================================================================

/// Format `value` with `digits` significant digits, like C's `%.{digits}g`.
///
/// Fixed notation is used when the decimal exponent lies in
/// `-4..digits`, scientific notation (`1e-05`) otherwise. Trailing zeros
/// are removed in both forms.
#[must_use]
pub fn format_significant(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let digits = digits.max(1);
    // Rounding to `digits` significant places can bump the exponent, so read
    // it back from the scientific rendering.
    let sci = format!("{:.*e}", digits - 1, value);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= digits as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exp.unsigned_abs())
    } else {
        let precision = usize::try_from(digits as i32 - 1 - exp).unwrap_or(0);
        trim_fraction(&format!("{value:.precision$}")).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
