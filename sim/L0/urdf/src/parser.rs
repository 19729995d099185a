//! URDF XML parser.
//!
//! Streams the document with `quick-xml` and builds the typed model. A
//! malformed `<visual>` or `<collision>` entry is dropped with a warning so
//! that one bad shape does not hide the rest of the robot; a malformed
//! `<inertial>` fails the whole parse because the analysis depends on it.

use std::fs;
use std::io::BufRead;
use std::path::Path;

use nalgebra::Vector3;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, warn};

use crate::error::{Result, UrdfError};
use crate::types::{
    UrdfCollision, UrdfGeometry, UrdfInertia, UrdfInertial, UrdfJoint, UrdfJointDynamics,
    UrdfJointLimit, UrdfJointType, UrdfLink, UrdfOrigin, UrdfRobot, UrdfVisual,
};

/// Build a [`UrdfRobot`] from URDF text.
///
/// A `<robot>` without a `name` gets an empty name.
///
/// # Errors
///
/// Fails on malformed XML, a missing `<robot>` element, an unparsable
/// `<mass>` or `<inertia>` value, or a joint without parent or child.
pub fn parse_urdf_str(xml: &str) -> Result<UrdfRobot> {
    parse_document(xml, "")
}

/// Read `path` and parse it like [`parse_urdf_str`]. An unnamed robot is
/// named after the file stem.
///
/// # Errors
///
/// Fails when the file cannot be read or does not parse.
pub fn load_urdf_file(path: impl AsRef<Path>) -> Result<UrdfRobot> {
    let path = path.as_ref();
    let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let robot = parse_document(&fs::read_to_string(path)?, &stem)?;
    debug!(
        path = %path.display(),
        links = robot.links.len(),
        joints = robot.joints.len(),
        "loaded URDF"
    );
    Ok(robot)
}

fn parse_document(xml: &str, default_name: &str) -> Result<UrdfRobot> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut robot = None;
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) if e.name().as_ref() == b"robot" => {
                robot = Some(parse_robot(&mut reader, &e, default_name)?);
            }
            Event::Empty(e) if e.name().as_ref() == b"robot" => {
                robot = Some(UrdfRobot::new(robot_name(&e, default_name)));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    robot.ok_or_else(|| UrdfError::missing_element("robot", "URDF document"))
}

// ============================================================================
// Event plumbing
// ============================================================================

fn xml_error(err: quick_xml::Error) -> UrdfError {
    UrdfError::XmlParse(err.to_string())
}

/// Next event inside `<tag>`. End of input before the closing tag is an
/// error.
fn next_event<'b, R: BufRead>(
    reader: &mut Reader<R>,
    buf: &'b mut Vec<u8>,
    tag: &str,
) -> Result<Event<'b>> {
    buf.clear();
    match reader.read_event_into(buf).map_err(xml_error)? {
        Event::Eof => Err(UrdfError::XmlParse(format!(
            "document ends inside <{tag}>"
        ))),
        event => Ok(event),
    }
}

fn closes(event: &Event, tag: &str) -> bool {
    matches!(event, Event::End(e) if e.name().as_ref() == tag.as_bytes())
}

/// Consume everything up to and including the end tag of `name`.
fn skip_element<R: BufRead>(reader: &mut Reader<R>, name: &[u8]) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 1_usize;
    while depth > 0 {
        buf.clear();
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) if e.name().as_ref() == name => depth += 1,
            Event::End(e) if e.name().as_ref() == name => depth -= 1,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(())
}

// ============================================================================
// Elements
// ============================================================================

fn robot_name(e: &BytesStart, default_name: &str) -> String {
    get_attribute_opt(e, "name").unwrap_or_else(|| default_name.to_string())
}

fn parse_robot<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    default_name: &str,
) -> Result<UrdfRobot> {
    let mut robot = UrdfRobot::new(robot_name(start, default_name));
    let mut buf = Vec::new();

    loop {
        let event = next_event(reader, &mut buf, "robot")?;
        match &event {
            Event::Start(e) => match e.name().as_ref() {
                b"link" => robot.links.push(parse_link(reader, e)?),
                b"joint" => robot.joints.push(parse_joint(reader, e)?),
                // material, gazebo, transmission, ...
                other => skip_element(reader, other)?,
            },
            Event::Empty(e) if e.name().as_ref() == b"link" => {
                robot.links.push(UrdfLink::new(get_attribute(e, "name")?));
            }
            _ if closes(&event, "robot") => return Ok(robot),
            _ => {}
        }
    }
}

fn parse_link<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<UrdfLink> {
    let mut link = UrdfLink::new(get_attribute(start, "name")?);
    let mut seen_inertial = false;
    let mut buf = Vec::new();

    loop {
        let event = next_event(reader, &mut buf, "link")?;
        match &event {
            Event::Start(e) => match e.name().as_ref() {
                b"inertial" => {
                    let inertial = parse_inertial(reader, &link.name)?;
                    // only the first <inertial> counts
                    if !seen_inertial {
                        link.inertial = inertial;
                        seen_inertial = true;
                    }
                }
                b"visual" => match parse_shape_entry(reader, "visual") {
                    Ok(entry) => link.visuals.push(UrdfVisual {
                        name: get_attribute_opt(e, "name"),
                        origin: entry.origin,
                        geometry: entry.geometry,
                        material: entry.material,
                    }),
                    Err(err) => warn!(link = %link.name, "dropping visual: {err}"),
                },
                b"collision" => match parse_shape_entry(reader, "collision") {
                    Ok(entry) => link.collisions.push(UrdfCollision {
                        name: get_attribute_opt(e, "name"),
                        origin: entry.origin,
                        geometry: entry.geometry,
                    }),
                    Err(err) => warn!(link = %link.name, "dropping collision: {err}"),
                },
                other => skip_element(reader, other)?,
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"inertial" => seen_inertial = true,
                b"visual" | b"collision" => {
                    warn!(link = %link.name, "dropping shape entry without geometry");
                }
                _ => {}
            },
            _ if closes(&event, "link") => return Ok(link),
            _ => {}
        }
    }
}

/// Parse an `<inertial>` body.
///
/// Returns `None` when either `<mass>` or `<inertia>` is absent: a partial
/// block carries no usable tensor and is treated like a missing one.
fn parse_inertial<R: BufRead>(
    reader: &mut Reader<R>,
    link_name: &str,
) -> Result<Option<UrdfInertial>> {
    let mut origin = None;
    let mut mass = None;
    let mut inertia = None;
    let mut buf = Vec::new();

    loop {
        let event = next_event(reader, &mut buf, "inertial")?;
        if closes(&event, "inertial") {
            break;
        }
        let (Event::Start(e) | Event::Empty(e)) = &event else {
            continue;
        };
        match e.name().as_ref() {
            b"origin" if origin.is_none() => origin = Some(parse_origin(e)?),
            b"mass" if mass.is_none() => mass = Some(parse_mass(e)?),
            b"inertia" if inertia.is_none() => inertia = Some(parse_inertia_element(e)?),
            _ => {}
        }
    }

    if let (Some(mass), Some(inertia)) = (mass, inertia) {
        return Ok(Some(
            UrdfInertial::new(mass, inertia).with_origin(origin.unwrap_or_default()),
        ));
    }
    debug!(
        link = link_name,
        has_mass = mass.is_some(),
        has_inertia = inertia.is_some(),
        "incomplete <inertial> ignored"
    );
    Ok(None)
}

fn parse_origin(e: &BytesStart) -> Result<UrdfOrigin> {
    let vector = |name: &str| {
        get_attribute_opt(e, name)
            .map_or_else(|| Ok(Vector3::zeros()), |raw| parse_vector3(&raw))
    };
    Ok(UrdfOrigin::new(vector("xyz")?, vector("rpy")?))
}

/// Parse `<mass value=".."/>`. `nan` and `inf` are accepted as numbers; the
/// plausibility checks decide what to make of them.
fn parse_mass(e: &BytesStart) -> Result<f64> {
    required_float(e, "value", "mass")
}

/// Absent entries are zero; a present entry must be a number.
fn parse_inertia_element(e: &BytesStart) -> Result<UrdfInertia> {
    let entry = |name: &'static str| optional_float(e, name, "inertia");
    Ok(UrdfInertia::new(
        entry("ixx")?,
        entry("ixy")?,
        entry("ixz")?,
        entry("iyy")?,
        entry("iyz")?,
        entry("izz")?,
    ))
}

/// The parts shared by `<visual>` and `<collision>`.
struct ShapeEntry {
    origin: UrdfOrigin,
    geometry: UrdfGeometry,
    material: Option<String>,
}

/// Parse the body of a `<visual>` or `<collision>` element.
///
/// The element is always read to its end tag, even when a child is
/// malformed, so the caller can drop the entry and keep parsing the link.
fn parse_shape_entry<R: BufRead>(reader: &mut Reader<R>, tag: &str) -> Result<ShapeEntry> {
    let mut origin: Result<UrdfOrigin> = Ok(UrdfOrigin::default());
    let mut geometry: Option<Result<UrdfGeometry>> = None;
    let mut material = None;
    let mut buf = Vec::new();

    loop {
        let event = next_event(reader, &mut buf, tag)?;
        match &event {
            Event::Start(e) => match e.name().as_ref() {
                b"origin" => origin = parse_origin(e),
                b"geometry" => geometry = Some(parse_geometry(reader)),
                name => {
                    if name == b"material" {
                        material = get_attribute_opt(e, "name");
                    }
                    skip_element(reader, name)?;
                }
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"origin" => origin = parse_origin(e),
                b"geometry" => geometry = Some(Ok(UrdfGeometry::Unknown)),
                b"material" => material = get_attribute_opt(e, "name"),
                _ => {}
            },
            _ if closes(&event, tag) => break,
            _ => {}
        }
    }

    let geometry = geometry.ok_or_else(|| UrdfError::missing_element("geometry", tag))??;
    Ok(ShapeEntry {
        origin: origin?,
        geometry,
        material,
    })
}

/// Parse the body of a `<geometry>` element.
///
/// The first recognized shape wins; a geometry with no recognized shape is
/// [`UrdfGeometry::Unknown`]. Attribute errors are reported after the
/// element has been fully consumed.
fn parse_geometry<R: BufRead>(reader: &mut Reader<R>) -> Result<UrdfGeometry> {
    let mut buf = Vec::new();
    let mut geometry: Option<Result<UrdfGeometry>> = None;

    loop {
        let event = next_event(reader, &mut buf, "geometry")?;
        match &event {
            Event::Start(e) | Event::Empty(e) if geometry.is_none() => geometry = parse_shape(e),
            _ if closes(&event, "geometry") => break,
            _ => {}
        }
    }

    geometry.unwrap_or(Ok(UrdfGeometry::Unknown))
}

/// Parse one shape element, or `None` if the element is not a shape.
fn parse_shape(e: &BytesStart) -> Option<Result<UrdfGeometry>> {
    let shape = match e.name().as_ref() {
        b"box" => get_attribute(e, "size")
            .and_then(|size| parse_vector3(&size))
            .map(|size| UrdfGeometry::Box { size }),
        b"cylinder" => required_float(e, "radius", "cylinder").and_then(|radius| {
            required_float(e, "length", "cylinder")
                .map(|length| UrdfGeometry::Cylinder { radius, length })
        }),
        b"sphere" => {
            required_float(e, "radius", "sphere").map(|radius| UrdfGeometry::Sphere { radius })
        }
        b"mesh" => get_attribute(e, "filename").and_then(|filename| {
            let scale = get_attribute_opt(e, "scale")
                .map(|s| parse_vector3(&s))
                .transpose()?;
            Ok(UrdfGeometry::Mesh { filename, scale })
        }),
        _ => return None,
    };
    Some(shape)
}

fn parse_joint<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<UrdfJoint> {
    let name = get_attribute(start, "name")?;
    let joint_type = get_attribute_opt(start, "type")
        .map(|kind| UrdfJointType::from_attribute(&kind))
        .unwrap_or_default();
    if let UrdfJointType::Other(kind) = &joint_type {
        warn!(joint = %name, "unrecognized joint type '{kind}' kept as is");
    }

    let mut parent = None;
    let mut child = None;
    let mut origin = UrdfOrigin::default();
    let mut axis = Vector3::z();
    let mut limit = None;
    let mut dynamics = None;
    let mut buf = Vec::new();

    loop {
        let event = next_event(reader, &mut buf, "joint")?;
        if closes(&event, "joint") {
            break;
        }
        let (Event::Start(e) | Event::Empty(e)) = &event else {
            continue;
        };
        match e.name().as_ref() {
            b"parent" => parent = Some(get_attribute(e, "link")?),
            b"child" => child = Some(get_attribute(e, "link")?),
            b"origin" => origin = parse_origin(e)?,
            b"axis" => {
                if let Some(xyz) = get_attribute_opt(e, "xyz") {
                    axis = parse_vector3(&xyz)?;
                }
            }
            b"limit" => {
                limit = Some(UrdfJointLimit {
                    lower: float_or_zero(e, "lower"),
                    upper: float_or_zero(e, "upper"),
                    effort: float_or_zero(e, "effort"),
                    velocity: float_or_zero(e, "velocity"),
                });
            }
            b"dynamics" => {
                dynamics = Some(UrdfJointDynamics {
                    damping: float_or_zero(e, "damping"),
                    friction: float_or_zero(e, "friction"),
                });
            }
            _ => {}
        }
    }

    let context = || format!("joint '{name}'");
    let parent = parent.ok_or_else(|| UrdfError::missing_element("parent", context()))?;
    let child = child.ok_or_else(|| UrdfError::missing_element("child", context()))?;

    let mut joint = UrdfJoint::new(name, joint_type, parent, child)
        .with_origin(origin)
        .with_axis(axis);
    joint.limit = limit;
    joint.dynamics = dynamics;
    Ok(joint)
}

// ============================================================================
// Attributes
// ============================================================================

/// Value of a required attribute.
fn get_attribute(e: &BytesStart, name: &'static str) -> Result<String> {
    get_attribute_opt(e, name).ok_or_else(|| {
        UrdfError::missing_attribute(name, String::from_utf8_lossy(e.name().as_ref()))
    })
}

/// Unescaped value of an attribute, if present.
pub(crate) fn get_attribute_opt(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name.as_bytes())
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

fn float_or_zero(e: &BytesStart, name: &str) -> f64 {
    get_attribute_opt(e, name)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0.0)
}

fn required_float(e: &BytesStart, name: &'static str, element: &str) -> Result<f64> {
    parse_float(&get_attribute(e, name)?, name, element)
}

fn optional_float(e: &BytesStart, name: &'static str, element: &str) -> Result<f64> {
    get_attribute_opt(e, name).map_or(Ok(0.0), |raw| parse_float(&raw, name, element))
}

fn parse_float(raw: &str, name: &'static str, element: &str) -> Result<f64> {
    raw.trim()
        .parse()
        .map_err(|_| UrdfError::invalid_attribute(name, element, format!("'{raw}' is not a number")))
}

/// Three whitespace-separated numbers.
fn parse_vector3(s: &str) -> Result<Vector3<f64>> {
    let mut values = s.split_whitespace().map(str::parse::<f64>);
    match (values.next(), values.next(), values.next(), values.next()) {
        (Some(Ok(x)), Some(Ok(y)), Some(Ok(z)), None) => Ok(Vector3::new(x, y, z)),
        _ => Err(UrdfError::XmlParse(format!(
            "expected three numbers, found '{s}'"
        ))),
    }
}
